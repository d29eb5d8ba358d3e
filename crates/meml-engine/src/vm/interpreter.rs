//! Tree-walking evaluator
//!
//! The same evaluator runs type annotations at check time and programs at
//! run time. It only sees checked code, so most of its failure paths are
//! unreachable for well-typed input; they still report errors instead of
//! panicking.

use crate::parser::ast::{Callee, Expr, ExprKind};
use crate::stack;
use crate::parser::interner::{Interner, Symbol};
use crate::parser::types::{Ty, TypeContext};
use crate::vm::elim::{self, Deferred, Effect};
use crate::vm::error::VmError;
use crate::vm::globals::{GlobalSlot, Globals, MethodTable};
use crate::vm::host::{expect_arity, invalid_argument, HostContext, HostPrimitives, HostValue};
use crate::vm::value::{Builtin, Closure, Env, Value};
use std::cell::RefCell;
use std::cmp::Ordering;
use std::rc::Rc;

/// Default limit on nested function calls.
pub const DEFAULT_MAX_CALL_DEPTH: usize = 4096;

/// Evaluator over one session's state.
pub struct Interpreter<'a> {
    globals: &'a mut Globals,
    host: &'a mut dyn HostPrimitives,
    interner: &'a Interner,
    types: &'a TypeContext,
    methods: &'a MethodTable,
    depth: usize,
    max_depth: usize,
}

impl<'a> Interpreter<'a> {
    /// Create an evaluator.
    pub fn new(
        globals: &'a mut Globals,
        host: &'a mut dyn HostPrimitives,
        interner: &'a Interner,
        types: &'a TypeContext,
        methods: &'a MethodTable,
    ) -> Self {
        Self {
            globals,
            host,
            interner,
            types,
            methods,
            depth: 0,
            max_depth: DEFAULT_MAX_CALL_DEPTH,
        }
    }

    /// Override the call depth limit.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Value of a global, running its initializer on first use.
    pub fn global(&mut self, name: Symbol) -> Result<Value, VmError> {
        match self.globals.slot(name) {
            Some(GlobalSlot::Ready(value)) => Ok(value.clone()),
            Some(GlobalSlot::Evaluating(_)) => Err(VmError::CyclicInitialization {
                name: self.interner.resolve(name).to_string(),
            }),
            Some(GlobalSlot::Pending(init)) => {
                let init = init.clone();
                self.globals.set_slot(name, GlobalSlot::Evaluating(init.clone()));
                match self.eval(&init, &Env::empty()) {
                    Ok(value) => {
                        self.globals.set_slot(name, GlobalSlot::Ready(value.clone()));
                        Ok(value)
                    }
                    Err(err) => {
                        self.globals.set_slot(name, GlobalSlot::Pending(init));
                        Err(err)
                    }
                }
            }
            None => Err(VmError::UndefinedGlobal {
                name: self.interner.resolve(name).to_string(),
            }),
        }
    }

    /// Evaluate an expression.
    pub fn eval(&mut self, expr: &Expr, env: &Env) -> Result<Value, VmError> {
        stack::grow(|| self.eval_expr(expr, env))
    }

    fn eval_expr(&mut self, expr: &Expr, env: &Env) -> Result<Value, VmError> {
        match &expr.kind {
            ExprKind::Int(n) => Ok(Value::Int(*n)),
            ExprKind::Str(text) => Ok(Value::string(self.interner.resolve(*text))),
            ExprKind::Var(name) => match env.lookup(*name) {
                Some(value) => Ok(value.clone()),
                None => self.global(*name),
            },
            ExprKind::Array(items) => {
                let values = self.eval_all(items, env)?;
                Ok(Value::array(values))
            }
            ExprKind::Any => Ok(Value::Type(Ty::Any)),
            ExprKind::Arrow { domain, codomain } => {
                let domain = domain
                    .iter()
                    .map(|d| self.eval_type(d, env))
                    .collect::<Result<Vec<_>, _>>()?;
                let codomain = self.eval_type(codomain, env)?;
                Ok(Value::Type(Ty::arrow(domain, codomain)))
            }
            ExprKind::Native { name, args } => {
                let args = self.eval_all(args, env)?;
                self.call_native(*name, args)
            }
            ExprKind::Call {
                callee,
                args,
                lambdas,
            } => {
                let (function, mut values) = match callee {
                    Callee::Function(function) => {
                        let function = self.eval(function, env)?;
                        (function, Vec::with_capacity(args.len() + lambdas.len()))
                    }
                    Callee::Method { receiver, name } => {
                        let receiver = self.eval(receiver, env)?;
                        let target = self.methods.target(expr).ok_or_else(|| {
                            VmError::UnresolvedMethod {
                                name: self.interner.resolve(*name).to_string(),
                            }
                        })?;
                        (self.global(target)?, vec![receiver])
                    }
                };
                for arg in args {
                    values.push(self.eval(arg, env)?);
                }
                for lambda in lambdas {
                    values.push(Value::Closure(Rc::new(Closure {
                        params: lambda.params.clone(),
                        body: lambda.body.clone(),
                        env: env.clone(),
                        name: None,
                    })));
                }
                self.apply(function, values)
            }
        }
    }

    fn eval_all(&mut self, exprs: &[Expr], env: &Env) -> Result<Vec<Value>, VmError> {
        exprs.iter().map(|e| self.eval(e, env)).collect()
    }

    /// Evaluate an expression that must produce a type.
    pub fn eval_type(&mut self, expr: &Expr, env: &Env) -> Result<Ty, VmError> {
        match self.eval(expr, env)? {
            Value::Type(ty) => Ok(ty),
            other => Err(VmError::UnexpectedValue {
                expected: "type",
                found: other.kind_name(),
            }),
        }
    }

    /// Apply a function value to arguments.
    pub fn apply(&mut self, function: Value, args: Vec<Value>) -> Result<Value, VmError> {
        match function {
            Value::Closure(closure) => {
                check_arity(closure.params.len(), args.len())?;
                if self.depth >= self.max_depth {
                    return Err(VmError::StackOverflow {
                        limit: self.max_depth,
                    });
                }
                let env = closure
                    .params
                    .iter()
                    .zip(args)
                    .fold(closure.env.clone(), |env, (param, arg)| env.bind(*param, arg));

                self.depth += 1;
                let result = self.eval(&closure.body, &env);
                self.depth -= 1;
                result
            }
            Value::Builtin(Builtin::Constructor {
                variant,
                tag,
                arity,
            }) => {
                check_arity(arity, args.len())?;
                Ok(Value::variant(variant, tag, args))
            }
            Value::Builtin(Builtin::Eliminator { variant }) => {
                let mut args = args.into_iter();
                let scrutinee = args.next().ok_or(VmError::ArityMismatch {
                    expected: 1,
                    found: 0,
                })?;
                let value = match scrutinee {
                    Value::Variant(value) => value,
                    other => {
                        return Err(VmError::UnexpectedValue {
                            expected: "variant",
                            found: other.kind_name(),
                        })
                    }
                };
                let branch = elim::eliminate(self.types.variant(variant), &value, args.collect())?;
                self.resume(Deferred::Branch(branch))
            }
            Value::Builtin(Builtin::TypeConstructor { name, arity }) => {
                check_arity(arity, args.len())?;
                let args = args
                    .into_iter()
                    .map(|arg| match arg {
                        Value::Type(ty) => Ok(ty),
                        other => Err(VmError::UnexpectedValue {
                            expected: "type",
                            found: other.kind_name(),
                        }),
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Value::Type(Ty::cons(name, args)))
            }
            other => Err(VmError::NotCallable {
                found: other.kind_name(),
            }),
        }
    }

    /// Run a one-shot computation to completion.
    pub fn resume(&mut self, deferred: Deferred<Value>) -> Result<Value, VmError> {
        match deferred {
            Deferred::Branch(branch) => branch.resume(|handler, fields| self.apply(handler, fields)),
            Deferred::Effect(effect) => {
                effect.resume(|name, args| self.call_host(name, &args))?;
                self.unit()
            }
        }
    }

    // ========================================================================
    // Primitives
    // ========================================================================

    fn call_native(&mut self, name: Symbol, args: Vec<Value>) -> Result<Value, VmError> {
        let interner = self.interner;
        let name = interner.resolve(name);
        if let Some(value) = self.intrinsic(name, &args)? {
            return Ok(value);
        }
        if self.host.is_effect(name) {
            return self.resume(Deferred::Effect(Effect::new(name, args)));
        }
        self.call_host(name, &args)
    }

    fn call_host(&mut self, name: &str, args: &[Value]) -> Result<Value, VmError> {
        let cx = HostContext {
            interner: self.interner,
            types: self.types,
        };
        let result = self.host.call(name, args, &cx)?;
        self.convert(result)
    }

    /// Turn a host answer into a runtime value.
    fn convert(&self, result: HostValue) -> Result<Value, VmError> {
        let core = self.types.core();
        match result {
            HostValue::Value(value) => Ok(value),
            HostValue::Bool(b) => {
                self.core_variant(core.bool, if b { core.true_ } else { core.false_ })
            }
            HostValue::Ordering(ordering) => {
                let ctor = match ordering {
                    Ordering::Less => core.lt,
                    Ordering::Equal => core.eq,
                    Ordering::Greater => core.gt,
                };
                self.core_variant(core.ordering, ctor)
            }
            HostValue::Unit => self.unit(),
        }
    }

    fn unit(&self) -> Result<Value, VmError> {
        let core = self.types.core();
        self.core_variant(core.unit, core.unit)
    }

    fn core_variant(&self, class: Symbol, ctor: Symbol) -> Result<Value, VmError> {
        let missing = || VmError::MissingCoreType {
            name: format!(
                "{}/{}",
                self.interner.resolve(class),
                self.interner.resolve(ctor)
            ),
        };
        let id = self.types.lookup(class).ok_or_else(missing)?;
        let tag = self.types.constructor_index(id, ctor).ok_or_else(missing)?;
        Ok(Value::variant(id, tag, Vec::new()))
    }

    /// Read an `Ordering` variant back.
    fn ordering_of(&self, value: &Value) -> Result<Ordering, VmError> {
        let core = self.types.core();
        if let Value::Variant(v) = value {
            if self.types.lookup(core.ordering) == Some(v.variant) {
                let ctor = self.types.variant(v.variant).constructors.get(v.tag).map(|c| c.name);
                if ctor == Some(core.lt) {
                    return Ok(Ordering::Less);
                } else if ctor == Some(core.eq) {
                    return Ok(Ordering::Equal);
                } else if ctor == Some(core.gt) {
                    return Ok(Ordering::Greater);
                }
            }
        }
        Err(VmError::UnexpectedValue {
            expected: "ordering",
            found: value.kind_name(),
        })
    }

    /// Primitives the core implements itself.
    fn intrinsic(&mut self, name: &str, args: &[Value]) -> Result<Option<Value>, VmError> {
        let value = match name {
            "cell-new" => {
                expect_arity(name, args, 1)?;
                Value::Cell(Rc::new(RefCell::new(args[0].clone())))
            }
            "cell-get" => {
                expect_arity(name, args, 1)?;
                match &args[0] {
                    Value::Cell(cell) => cell.borrow().clone(),
                    other => return Err(invalid_argument(name, "box", other).into()),
                }
            }
            "cell-set" => {
                expect_arity(name, args, 2)?;
                match &args[0] {
                    Value::Cell(cell) => *cell.borrow_mut() = args[1].clone(),
                    other => return Err(invalid_argument(name, "box", other).into()),
                }
                self.unit()?
            }
            "type-name" => {
                expect_arity(name, args, 1)?;
                match &args[0] {
                    Value::Type(ty) => Value::string(&ty.display(self.interner).to_string()),
                    other => return Err(invalid_argument(name, "type", other).into()),
                }
            }
            "type-eq" => {
                expect_arity(name, args, 2)?;
                let equal = type_arg(name, &args[0])? == type_arg(name, &args[1])?;
                self.convert(HostValue::Bool(equal))?
            }
            "type-cmp" => {
                expect_arity(name, args, 2)?;
                let left = type_arg(name, &args[0])?.display(self.interner).to_string();
                let right = type_arg(name, &args[1])?.display(self.interner).to_string();
                self.convert(HostValue::Ordering(left.cmp(&right)))?
            }
            "tuple-type" => {
                expect_arity(name, args, 1)?;
                let items = array_arg(name, &args[0])?;
                let members = items
                    .iter()
                    .map(|item| match item {
                        Value::Type(ty) => Ok(ty.clone()),
                        other => Err(invalid_argument(name, "type", other)),
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Value::Type(self.types.tuple_type(&members)?)
            }
            "array-length" => {
                expect_arity(name, args, 1)?;
                Value::Int(array_arg(name, &args[0])?.len() as i64)
            }
            "array-get" => {
                expect_arity(name, args, 2)?;
                let items = array_arg(name, &args[0])?;
                let index = int_arg(name, &args[1])?;
                usize::try_from(index)
                    .ok()
                    .and_then(|i| items.get(i))
                    .cloned()
                    .ok_or(VmError::IndexOutOfBounds {
                        index,
                        len: items.len(),
                    })?
            }
            "array-push" => {
                expect_arity(name, args, 2)?;
                let items = array_arg(name, &args[0])?;
                let mut pushed = Vec::with_capacity(items.len() + 1);
                pushed.extend(items.iter().cloned());
                pushed.push(args[1].clone());
                Value::array(pushed)
            }
            "array-slice" => {
                expect_arity(name, args, 3)?;
                let items = array_arg(name, &args[0])?;
                let clamp = |n: i64| n.clamp(0, items.len() as i64) as usize;
                let start = clamp(int_arg(name, &args[1])?);
                let end = clamp(int_arg(name, &args[2])?).max(start);
                Value::array(items[start..end].to_vec())
            }
            "array-sorted" => {
                expect_arity(name, args, 2)?;
                let items = array_arg(name, &args[0])?;
                self.sorted(items, &args[1])?
            }
            _ => return Ok(None),
        };
        Ok(Some(value))
    }

    /// Stable insertion sort driven by a source comparator.
    fn sorted(&mut self, items: &[Value], compare: &Value) -> Result<Value, VmError> {
        let mut out: Vec<Value> = Vec::with_capacity(items.len());
        for item in items {
            let mut at = out.len();
            while at > 0 {
                let answer = self.apply(compare.clone(), vec![out[at - 1].clone(), item.clone()])?;
                if self.ordering_of(&answer)? == Ordering::Greater {
                    at -= 1;
                } else {
                    break;
                }
            }
            out.insert(at, item.clone());
        }
        Ok(Value::array(out))
    }
}

fn check_arity(expected: usize, found: usize) -> Result<(), VmError> {
    if expected == found {
        Ok(())
    } else {
        Err(VmError::ArityMismatch { expected, found })
    }
}

fn array_arg<'v>(name: &str, value: &'v Value) -> Result<&'v [Value], VmError> {
    match value {
        Value::Array(items) => Ok(&items[..]),
        other => Err(invalid_argument(name, "array", other).into()),
    }
}

fn type_arg<'v>(name: &str, value: &'v Value) -> Result<&'v Ty, VmError> {
    match value {
        Value::Type(ty) => Ok(ty),
        other => Err(invalid_argument(name, "type", other).into()),
    }
}

fn int_arg(name: &str, value: &Value) -> Result<i64, VmError> {
    match value {
        Value::Int(n) => Ok(*n),
        other => Err(invalid_argument(name, "integer", other).into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::ast::Lambda;
    use crate::parser::token::Span;
    use crate::parser::types::Constructor;
    use crate::vm::host::StandardHost;

    struct Fixture {
        interner: Interner,
        types: TypeContext,
        globals: Globals,
        methods: MethodTable,
        host: StandardHost,
    }

    impl Fixture {
        fn new() -> Self {
            let mut interner = Interner::new();
            let mut types = TypeContext::new(&mut interner);
            let core = *types.core();
            for (class, ctors) in [
                (core.bool, vec![core.false_, core.true_]),
                (core.ordering, vec![core.lt, core.eq, core.gt]),
                (core.unit, vec![core.unit]),
            ] {
                let ctors = ctors
                    .into_iter()
                    .map(|name| Constructor { name, fields: vec![] })
                    .collect();
                types.declare_variant(class, vec![], ctors, &interner).unwrap();
            }
            Self {
                interner,
                types,
                globals: Globals::new(),
                methods: MethodTable::new(),
                host: StandardHost::new(),
            }
        }

        fn interp(&mut self) -> Interpreter<'_> {
            Interpreter::new(
                &mut self.globals,
                &mut self.host,
                &self.interner,
                &self.types,
                &self.methods,
            )
        }
    }

    fn expr(kind: ExprKind) -> Expr {
        Expr::new(kind, Span::default())
    }

    fn native(interner: &mut Interner, name: &str, args: Vec<Expr>) -> Expr {
        let name = interner.intern(name);
        expr(ExprKind::Native { name, args })
    }

    #[test]
    fn test_host_bool_becomes_variant() {
        let mut fx = Fixture::new();
        let call = native(
            &mut fx.interner,
            "int-lt",
            vec![expr(ExprKind::Int(1)), expr(ExprKind::Int(2))],
        );
        let value = fx.interp().eval(&call, &Env::empty()).unwrap();
        let bool_ = fx.types.lookup(fx.types.core().bool).unwrap();
        assert_eq!(value, Value::variant(bool_, 1, vec![]));
    }

    #[test]
    fn test_missing_core_type() {
        let mut interner = Interner::new();
        let types = TypeContext::new(&mut interner);
        let mut globals = Globals::new();
        let methods = MethodTable::new();
        let mut host = StandardHost::new();
        let call = native(
            &mut interner,
            "int-eq",
            vec![expr(ExprKind::Int(1)), expr(ExprKind::Int(1))],
        );
        let err = Interpreter::new(&mut globals, &mut host, &interner, &types, &methods)
            .eval(&call, &Env::empty())
            .unwrap_err();
        assert_eq!(
            err,
            VmError::MissingCoreType {
                name: "Bool/True".to_string()
            }
        );
    }

    #[test]
    fn test_print_is_deferred_effect_returning_unit() {
        let mut fx = Fixture::new();
        let text = fx.interner.intern("hello");
        let call = native(&mut fx.interner, "print", vec![expr(ExprKind::Str(text))]);
        let value = fx.interp().eval(&call, &Env::empty()).unwrap();
        let unit = fx.types.lookup(fx.types.core().unit).unwrap();
        assert_eq!(value, Value::variant(unit, 0, vec![]));
        assert_eq!(fx.host.transcript().lines(), vec!["hello".to_string()]);
    }

    #[test]
    fn test_cells_are_shared() {
        let mut fx = Fixture::new();
        let cell = fx.interner.intern("c");
        let new = native(&mut fx.interner, "cell-new", vec![expr(ExprKind::Int(1))]);
        let value = fx.interp().eval(&new, &Env::empty()).unwrap();
        let env = Env::empty().bind(cell, value);

        let set = native(
            &mut fx.interner,
            "cell-set",
            vec![expr(ExprKind::Var(cell)), expr(ExprKind::Int(5))],
        );
        let get = native(&mut fx.interner, "cell-get", vec![expr(ExprKind::Var(cell))]);
        let mut interp = fx.interp();
        interp.eval(&set, &env).unwrap();
        assert_eq!(interp.eval(&get, &env).unwrap(), Value::Int(5));
    }

    #[test]
    fn test_arrays_are_persistent() {
        let mut fx = Fixture::new();
        let xs = fx.interner.intern("xs");
        let original = Value::array(vec![Value::Int(1)]);
        let env = Env::empty().bind(xs, original.clone());
        let push = native(
            &mut fx.interner,
            "array-push",
            vec![expr(ExprKind::Var(xs)), expr(ExprKind::Int(2))],
        );
        let pushed = fx.interp().eval(&push, &env).unwrap();
        assert_eq!(pushed, Value::array(vec![Value::Int(1), Value::Int(2)]));
        assert_eq!(env.lookup(xs), Some(&original));
    }

    #[test]
    fn test_array_slice_clamps() {
        let mut fx = Fixture::new();
        let xs = fx.interner.intern("xs");
        let env = Env::empty().bind(
            xs,
            Value::array(vec![Value::Int(1), Value::Int(2), Value::Int(3)]),
        );
        let slice = native(
            &mut fx.interner,
            "array-slice",
            vec![expr(ExprKind::Var(xs)), expr(ExprKind::Int(1)), expr(ExprKind::Int(10))],
        );
        assert_eq!(
            fx.interp().eval(&slice, &env).unwrap(),
            Value::array(vec![Value::Int(2), Value::Int(3)])
        );
    }

    #[test]
    fn test_sorted_is_stable() {
        let mut fx = Fixture::new();
        let a = fx.interner.intern("a");
        let b = fx.interner.intern("b");
        let xs = fx.interner.intern("xs");
        // Compare integers by their value modulo 10.
        let rem = |interner: &mut Interner, var: Symbol| {
            native(interner, "int-rem", vec![expr(ExprKind::Var(var)), expr(ExprKind::Int(10))])
        };
        let left = rem(&mut fx.interner, a);
        let right = rem(&mut fx.interner, b);
        let body = native(&mut fx.interner, "int-cmp", vec![left, right]);
        let compare = Value::Closure(Rc::new(Closure {
            params: vec![a, b],
            body: Rc::new(body),
            env: Env::empty(),
            name: None,
        }));
        let cmp = fx.interner.intern("cmp");
        let env = Env::empty()
            .bind(
                xs,
                Value::array(vec![Value::Int(21), Value::Int(3), Value::Int(11), Value::Int(2)]),
            )
            .bind(cmp, compare);
        let sort = native(
            &mut fx.interner,
            "array-sorted",
            vec![expr(ExprKind::Var(xs)), expr(ExprKind::Var(cmp))],
        );
        assert_eq!(
            fx.interp().eval(&sort, &env).unwrap(),
            Value::array(vec![Value::Int(21), Value::Int(11), Value::Int(2), Value::Int(3)])
        );
    }

    #[test]
    fn test_tuple_type_intrinsic() {
        let mut fx = Fixture::new();
        let core = *fx.types.core();
        let ts = fx.interner.intern("ts");
        let env = Env::empty().bind(
            ts,
            Value::array(vec![
                Value::Type(Ty::named(core.int)),
                Value::Type(Ty::named(core.string)),
            ]),
        );
        let call = native(&mut fx.interner, "tuple-type", vec![expr(ExprKind::Var(ts))]);
        let value = fx.interp().eval(&call, &env).unwrap();
        assert_eq!(
            value,
            Value::Type(Ty::cons(core.pair, vec![Ty::named(core.int), Ty::named(core.string)]))
        );

        let empty = fx.interner.intern("empty");
        let env = Env::empty().bind(empty, Value::array(vec![]));
        let call = native(&mut fx.interner, "tuple-type", vec![expr(ExprKind::Var(empty))]);
        assert_eq!(
            fx.interp().eval(&call, &env).unwrap_err(),
            VmError::Type(crate::parser::types::TypeError::EmptyTupleType)
        );
    }

    #[test]
    fn test_type_equality_is_structural() {
        let mut fx = Fixture::new();
        let core = *fx.types.core();
        let pair = |a, b| Ty::cons(core.pair, vec![Ty::named(a), Ty::named(b)]);
        let (x, y) = (fx.interner.intern("x"), fx.interner.intern("y"));
        let bool_ = fx.types.lookup(core.bool).unwrap();
        let ordering = fx.types.lookup(core.ordering).unwrap();

        let env = Env::empty()
            .bind(x, Value::Type(pair(core.int, core.string)))
            .bind(y, Value::Type(pair(core.int, core.string)));
        let args = || vec![expr(ExprKind::Var(x)), expr(ExprKind::Var(y))];
        let eq = native(&mut fx.interner, "type-eq", args());
        assert_eq!(fx.interp().eval(&eq, &env).unwrap(), Value::variant(bool_, 1, vec![]));

        let env = env.bind(y, Value::Type(pair(core.string, core.int)));
        assert_eq!(fx.interp().eval(&eq, &env).unwrap(), Value::variant(bool_, 0, vec![]));

        // "Pair(Int String)" sorts before "Pair(String Int)"
        let cmp = native(&mut fx.interner, "type-cmp", args());
        assert_eq!(
            fx.interp().eval(&cmp, &env).unwrap(),
            Value::variant(ordering, 0, vec![])
        );
    }

    #[test]
    fn test_lazy_global_cycle_detected() {
        let mut fx = Fixture::new();
        let x = fx.interner.intern("x");
        fx.globals.define_lazy(x, Rc::new(expr(ExprKind::Var(x))));
        let err = fx.interp().global(x).unwrap_err();
        assert_eq!(
            err,
            VmError::CyclicInitialization {
                name: "x".to_string()
            }
        );
    }

    #[test]
    fn test_lazy_global_memoized() {
        let mut fx = Fixture::new();
        let x = fx.interner.intern("x");
        fx.globals.define_lazy(x, Rc::new(expr(ExprKind::Int(3))));
        assert_eq!(fx.interp().global(x).unwrap(), Value::Int(3));
        assert!(matches!(fx.globals.slot(x), Some(GlobalSlot::Ready(Value::Int(3)))));
    }

    #[test]
    fn test_eliminator_runs_selected_lambda() {
        let mut fx = Fixture::new();
        let core = *fx.types.core();
        let bool_ = fx.types.lookup(core.bool).unwrap();
        let elim = fx.interner.intern("Bool/elim");
        fx.globals.define(elim, Value::Builtin(Builtin::Eliminator { variant: bool_ }));
        let b = fx.interner.intern("b");
        let env = Env::empty().bind(b, Value::variant(bool_, 1, vec![]));

        let call = expr(ExprKind::Call {
            callee: Callee::Function(Box::new(expr(ExprKind::Var(elim)))),
            args: vec![expr(ExprKind::Var(b))],
            lambdas: vec![
                Lambda {
                    params: vec![],
                    body: Rc::new(expr(ExprKind::Int(0))),
                    span: Span::default(),
                },
                Lambda {
                    params: vec![],
                    body: Rc::new(expr(ExprKind::Int(1))),
                    span: Span::default(),
                },
            ],
        });
        assert_eq!(fx.interp().eval(&call, &env).unwrap(), Value::Int(1));
    }

    #[test]
    fn test_call_depth_limit() {
        let mut fx = Fixture::new();
        let f = fx.interner.intern("f");
        let body = Expr::call(expr(ExprKind::Var(f)), vec![], Span::default());
        fx.globals.define(
            f,
            Value::Closure(Rc::new(Closure {
                params: vec![],
                body: Rc::new(body),
                env: Env::empty(),
                name: Some(f),
            })),
        );
        let call = Expr::call(expr(ExprKind::Var(f)), vec![], Span::default());
        let err = fx
            .interp()
            .with_max_depth(16)
            .eval(&call, &Env::empty())
            .unwrap_err();
        assert_eq!(err, VmError::StackOverflow { limit: 16 });
    }
}
