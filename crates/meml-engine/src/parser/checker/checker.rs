//! Type checker implementation
//!
//! Checks one declaration at a time, in source order, against everything
//! declared before it. Expressions are inferred bottom-up and checked
//! against expected types by unification. Annotations are ordinary
//! expressions: they are checked against `Type` and then evaluated.

use super::error::CheckError;
use super::symbols::{GlobalSymbol, Scheme, SymbolKind};
use super::unify::Existentials;
use crate::environment::Environment;
use crate::parser::ast::{Callee, ClassDecl, Expr, ExprKind, FunDecl, Item, ItemKind, Lambda, LetDecl};
use crate::parser::interner::Symbol;
use crate::parser::token::Span;
use crate::parser::types::{Constructor, CoreNames, Ty, TypeError};
use crate::stack;
use crate::vm::{Builtin, Closure, Env, Value};
use rustc_hash::{FxHashMap, FxHashSet};
use std::rc::Rc;

/// Checker settings.
#[derive(Debug, Clone, Copy, Default)]
pub struct CheckerOptions {
    /// Emit a `trace` event per typing judgement
    pub trace_typing: bool,
}

/// Type checker over an [`Environment`].
pub struct TypeChecker<'a> {
    env: &'a mut Environment,
    options: CheckerOptions,
    core: CoreNames,

    /// Generic parameters of the current declaration
    universals: Vec<Symbol>,

    /// Parameters and lambda binders in scope, innermost last
    locals: Vec<(Symbol, Ty)>,

    /// Unification variables of the current declaration
    exists: Existentials,

    /// Globals added by the current declaration, for rollback
    added: Vec<Symbol>,

    /// Annotations evaluated so far
    normalizations: usize,

    /// Functions of the current source not yet declared, by global name
    pending: FxHashMap<Symbol, Rc<Item>>,

    /// Functions whose signature a forward reference declared before their turn
    forwarded: FxHashSet<Symbol>,
}

impl<'a> TypeChecker<'a> {
    /// Create a checker.
    pub fn new(env: &'a mut Environment) -> Self {
        let core = *env.types.core();
        Self {
            env,
            options: CheckerOptions::default(),
            core,
            universals: Vec::new(),
            locals: Vec::new(),
            exists: Existentials::new(),
            added: Vec::new(),
            normalizations: 0,
            pending: FxHashMap::default(),
            forwarded: FxHashSet::default(),
        }
    }

    /// Replace the settings.
    pub fn with_options(mut self, options: CheckerOptions) -> Self {
        self.options = options;
        self
    }

    /// Number of annotations evaluated
    pub fn normalizations(&self) -> usize {
        self.normalizations
    }

    /// The environment being checked against
    pub fn environment(&mut self) -> &mut Environment {
        self.env
    }

    // ========================================================================
    // Declarations
    // ========================================================================

    /// Make the functions of `items` visible to the declarations before them.
    ///
    /// A reference to one of them declares its signature on the spot; its
    /// body is still checked in source order. Directed declarations are
    /// never visible ahead of their turn.
    pub fn expect_forward(&mut self, items: &[Rc<Item>]) {
        for item in items {
            let ItemKind::Fun(decl) = &item.kind else {
                continue;
            };
            if item.directive.is_some() {
                continue;
            }
            let name = if decl.is_method {
                match decl.params.first().and_then(|p| p.annotation.head_name()) {
                    Some(owner) => self.qualify(owner, decl.name),
                    None => continue,
                }
            } else {
                decl.name
            };
            self.pending.entry(name).or_insert_with(|| Rc::clone(item));
        }
    }

    /// Unregister functions declared ahead of a turn that never came.
    pub fn discard_forward(&mut self) {
        self.pending.clear();
        for name in self.forwarded.drain() {
            self.env.symbols.remove_last(name);
            self.env.globals.remove(name);
        }
    }

    /// Check a declaration and register what it declares.
    ///
    /// On failure nothing the declaration added stays registered.
    pub fn check_item(&mut self, item: &Item) -> Result<(), CheckError> {
        match self.check_uncommitted(item) {
            Ok(()) => {
                self.commit(item);
                Ok(())
            }
            Err(err) => {
                self.rollback();
                Err(err)
            }
        }
    }

    /// Check a declaration, leaving what it added pending until
    /// [`commit`](Self::commit) or [`rollback`](Self::rollback).
    pub(super) fn check_uncommitted(&mut self, item: &Item) -> Result<(), CheckError> {
        self.reset();
        let result = match &item.kind {
            ItemKind::Class(decl) => self.check_class(decl, item.span),
            ItemKind::Let(decl) => self.check_let(decl, item.span),
            ItemKind::Fun(decl) => self.check_fun(decl, item.span),
            // Entered into the operator table by the parser.
            ItemKind::Infix(_) => Ok(()),
        };
        self.universals.clear();
        self.locals.clear();
        result
    }

    pub(super) fn commit(&mut self, item: &Item) {
        if let Some(name) = item.declared_name() {
            tracing::debug!(
                name = self.env.interner.resolve(name),
                globals = self.added.len(),
                "checked declaration"
            );
        }
        self.added.clear();
    }

    /// Unregister everything the pending declaration added.
    pub(super) fn rollback(&mut self) {
        while let Some(name) = self.added.pop() {
            self.env.symbols.remove_last(name);
            self.env.globals.remove(name);
        }
    }

    fn reset(&mut self) {
        self.universals.clear();
        self.locals.clear();
        self.exists.clear();
        self.added.clear();
    }

    fn check_class(&mut self, decl: &ClassDecl, span: Span) -> Result<(), CheckError> {
        let name = decl.name;
        if self.env.types.contains(name) {
            return Err(CheckError::Declaration {
                error: TypeError::DuplicateType {
                    name: self.text(name).to_string(),
                },
                span,
            });
        }
        self.reserve(name, span)?;

        // The class itself, so that fields can mention it.
        let type_ty = self.core.type_ty();
        let arity = decl.generics.len();
        let (scheme, value) = if arity == 0 {
            (Scheme::mono(type_ty), Value::Type(Ty::named(name)))
        } else {
            (
                Scheme::mono(Ty::arrow(vec![type_ty.clone(); arity], type_ty)),
                Value::Builtin(Builtin::TypeConstructor { name, arity }),
            )
        };
        self.declare(name, SymbolKind::TypeConstructor, scheme, value, span)?;

        self.universals = decl.generics.clone();
        let mut constructors = Vec::with_capacity(decl.constructors.len());
        for ctor in &decl.constructors {
            let fields = ctor
                .fields
                .iter()
                .map(|field| self.normalize(field))
                .collect::<Result<Vec<_>, _>>()?;
            constructors.push(Constructor {
                name: ctor.name,
                fields,
            });
        }

        let elim = self.qualify(name, self.core.elim);
        let qualified: Vec<Symbol> = decl
            .constructors
            .iter()
            .map(|ctor| self.qualify(name, ctor.name))
            .collect();
        for (global, ctor) in qualified.iter().zip(&decl.constructors) {
            if *global == elim {
                return Err(CheckError::DuplicateSymbol {
                    name: self.text(*global).to_string(),
                    span: ctor.span,
                    original: ctor.span,
                });
            }
            self.reserve(*global, ctor.span)?;
        }
        self.reserve(elim, span)?;

        let id = self
            .env
            .types
            .declare_variant(name, decl.generics.clone(), constructors, &self.env.interner)
            .map_err(|error| CheckError::Declaration { error, span })?;
        let class = self.env.types.variant(id).clone();
        let self_ty = class.self_type();

        for (tag, (ctor, global)) in class.constructors.iter().zip(qualified).enumerate() {
            let scheme = Scheme {
                generics: decl.generics.clone(),
                ty: Ty::arrow(ctor.fields.clone(), self_ty.clone()),
            };
            let value = Value::Builtin(Builtin::Constructor {
                variant: id,
                tag,
                arity: ctor.fields.len(),
            });
            self.declare(global, SymbolKind::Constructor, scheme, value, span)?;
        }

        // [C(gs) [fields..]R ...]R with R distinct from every generic
        let result = Ty::Rigid(self.result_variable(&decl.generics));
        let mut domain = vec![self_ty];
        domain.extend(
            class
                .constructors
                .iter()
                .map(|ctor| Ty::arrow(ctor.fields.clone(), result.clone())),
        );
        let mut generics = decl.generics.clone();
        if let Ty::Rigid(r) = result {
            generics.push(r);
        }
        let scheme = Scheme {
            generics,
            ty: Ty::arrow(domain, result),
        };
        self.declare(
            elim,
            SymbolKind::Eliminator,
            scheme,
            Value::Builtin(Builtin::Eliminator { variant: id }),
            span,
        )
    }

    fn check_let(&mut self, decl: &LetDecl, span: Span) -> Result<(), CheckError> {
        self.reserve(decl.name, span)?;
        let ty = self.normalize(&decl.annotation)?;
        self.check(&decl.value, &ty)?;

        self.declare_symbol(decl.name, SymbolKind::Value, Scheme::mono(ty), span)?;
        self.env.globals.define_lazy(decl.name, decl.value.clone());
        Ok(())
    }

    fn check_fun(&mut self, decl: &FunDecl, span: Span) -> Result<(), CheckError> {
        let name = self.fun_name(decl, span)?;
        self.pending.remove(&name);

        let codomain = if self.forwarded.remove(&name) {
            self.added.push(name);
            self.signature(decl)?.1
        } else {
            self.reserve(name, span)?;
            let (domain, codomain) = self.signature(decl)?;
            // Registered before the body is checked so that it may recurse.
            self.register_fun(name, decl, domain, codomain.clone(), span)?;
            codomain
        };

        self.check(&decl.body, &codomain)
    }

    fn fun_name(&mut self, decl: &FunDecl, span: Span) -> Result<Symbol, CheckError> {
        if decl.is_method {
            self.method_name(decl, span)
        } else {
            Ok(decl.name)
        }
    }

    /// Normalized parameter and return types, with the parameters in scope.
    fn signature(&mut self, decl: &FunDecl) -> Result<(Vec<Ty>, Ty), CheckError> {
        self.universals = decl.generics.clone();
        let mut domain = Vec::with_capacity(decl.params.len());
        for param in &decl.params {
            let ty = self.normalize(&param.annotation)?;
            self.locals.push((param.name, ty.clone()));
            domain.push(ty);
        }
        let codomain = self.normalize(&decl.return_type)?;
        Ok((domain, codomain))
    }

    fn register_fun(
        &mut self,
        name: Symbol,
        decl: &FunDecl,
        domain: Vec<Ty>,
        codomain: Ty,
        span: Span,
    ) -> Result<(), CheckError> {
        let kind = if decl.is_method {
            SymbolKind::Method
        } else {
            SymbolKind::Function
        };
        let scheme = Scheme {
            generics: decl.generics.clone(),
            ty: Ty::arrow(domain, codomain),
        };
        let closure = Value::Closure(Rc::new(Closure {
            params: decl.params.iter().map(|p| p.name).collect(),
            body: decl.body.clone(),
            env: Env::empty(),
            name: Some(name),
        }));
        self.declare(name, kind, scheme, closure, span)
    }

    /// Declare the signature of the pending function `name`, if there is one.
    ///
    /// The declaration being checked keeps its scope, and does not own the
    /// registration: rolling it back leaves the function declared.
    fn declare_forward(&mut self, name: Symbol) -> Result<bool, CheckError> {
        let Some(item) = self.pending.remove(&name) else {
            return Ok(false);
        };
        let ItemKind::Fun(decl) = &item.kind else {
            return Ok(false);
        };

        let universals = std::mem::take(&mut self.universals);
        let locals = std::mem::take(&mut self.locals);
        let mark = self.added.len();
        let result = self.fun_name(decl, item.span).and_then(|declared| {
            let (domain, codomain) = self.signature(decl)?;
            self.register_fun(declared, decl, domain, codomain, item.span)
        });
        self.universals = universals;
        self.locals = locals;
        self.added.truncate(mark);
        result?;

        tracing::debug!(name = self.text(name), "declared ahead of its turn");
        self.forwarded.insert(name);
        Ok(true)
    }

    /// `Class/name` for `fun .name(self:Class(..) ...)`.
    fn method_name(&mut self, decl: &FunDecl, span: Span) -> Result<Symbol, CheckError> {
        let receiver = decl.params.first().ok_or_else(|| CheckError::InvalidMethodReceiver {
            found: "no parameters".to_string(),
            span,
        })?;
        match receiver.annotation.head_name() {
            Some(owner) if self.env.types.contains(owner) => Ok(self.qualify(owner, decl.name)),
            Some(owner) => Err(CheckError::InvalidMethodReceiver {
                found: self.text(owner).to_string(),
                span: receiver.annotation.span,
            }),
            None => Err(CheckError::InvalidMethodReceiver {
                found: "a non-class type".to_string(),
                span: receiver.annotation.span,
            }),
        }
    }

    /// `R`, or `R0`, `R1`... if the class already uses that name.
    fn result_variable(&mut self, generics: &[Symbol]) -> Symbol {
        let hint = self.core.result_hint;
        if !generics.contains(&hint) {
            return hint;
        }
        let mut n = 0usize;
        loop {
            let candidate = self.env.interner.intern(&format!("R{}", n));
            if !generics.contains(&candidate) {
                return candidate;
            }
            n += 1;
        }
    }

    // ========================================================================
    // Registration
    // ========================================================================

    fn reserve(&self, name: Symbol, span: Span) -> Result<(), CheckError> {
        match self.env.symbols.lookup(name) {
            Some(existing) => Err(CheckError::DuplicateSymbol {
                name: self.text(name).to_string(),
                span,
                original: existing.span,
            }),
            None => Ok(()),
        }
    }

    fn declare_symbol(
        &mut self,
        name: Symbol,
        kind: SymbolKind,
        scheme: Scheme,
        span: Span,
    ) -> Result<(), CheckError> {
        let symbol = GlobalSymbol {
            name,
            kind,
            scheme,
            span,
        };
        if let Err(existing) = self.env.symbols.insert(symbol) {
            let original = existing.span;
            return Err(CheckError::DuplicateSymbol {
                name: self.text(name).to_string(),
                span,
                original,
            });
        }
        self.added.push(name);
        Ok(())
    }

    fn declare(
        &mut self,
        name: Symbol,
        kind: SymbolKind,
        scheme: Scheme,
        value: Value,
        span: Span,
    ) -> Result<(), CheckError> {
        self.declare_symbol(name, kind, scheme, span)?;
        self.env.globals.define(name, value);
        Ok(())
    }

    // ========================================================================
    // Annotations
    // ========================================================================

    /// Check `expr` against `Type` and evaluate it to the type it denotes.
    ///
    /// Generic parameters in scope evaluate to themselves, as rigid types.
    pub fn normalize(&mut self, expr: &Expr) -> Result<Ty, CheckError> {
        let type_ty = self.core.type_ty();
        self.check(expr, &type_ty)?;

        let env = self
            .universals
            .iter()
            .fold(Env::empty(), |env, u| env.bind(*u, Value::Type(Ty::Rigid(*u))));
        let value = self
            .env
            .interpreter()
            .eval(expr, &env)
            .map_err(|error| CheckError::Evaluation {
                error,
                span: expr.span,
            })?;
        self.normalizations += 1;

        match value {
            Value::Type(ty) => Ok(ty),
            other => Err(CheckError::NotAType {
                found: other
                    .display(&self.env.interner, &self.env.types)
                    .to_string(),
                span: expr.span,
            }),
        }
    }

    // ========================================================================
    // Expressions
    // ========================================================================

    /// Infer the type of a standalone expression, outside any declaration.
    pub fn infer_expression(&mut self, expr: &Expr) -> Result<Ty, CheckError> {
        self.reset();
        let ty = self.infer(expr)?;
        Ok(self.exists.substitute(&ty))
    }

    /// Check `expr` against `expected`.
    pub fn check(&mut self, expr: &Expr, expected: &Ty) -> Result<(), CheckError> {
        if let ExprKind::Native { args, .. } = &expr.kind {
            for arg in args {
                self.infer(arg)?;
            }
            return Ok(());
        }
        let got = self.infer(expr)?;
        self.subtype(&got, expected, expr.span)
    }

    /// Require `got` to be usable where `expected` is.
    fn subtype(&mut self, got: &Ty, expected: &Ty, span: Span) -> Result<(), CheckError> {
        let got = self.exists.substitute(got);
        let expected = self.exists.substitute(expected);
        if self.options.trace_typing {
            tracing::trace!(
                line = span.line,
                column = span.column,
                got = %self.show(&got),
                expected = %self.show(&expected),
                "unify"
            );
        }
        self.exists
            .unify(&got, &expected)
            .map_err(|_| CheckError::SubtypeError {
                got: self.show(&got),
                expected: self.show(&expected),
                span,
            })
    }

    fn infer(&mut self, expr: &Expr) -> Result<Ty, CheckError> {
        stack::grow(|| self.infer_expr(expr))
    }

    fn infer_expr(&mut self, expr: &Expr) -> Result<Ty, CheckError> {
        let type_ty = self.core.type_ty();
        let ty = match &expr.kind {
            ExprKind::Int(_) => Ty::named(self.core.int),
            ExprKind::Str(_) => Ty::named(self.core.string),
            ExprKind::Var(name) => self.lookup(*name, expr.span)?,
            ExprKind::Array(items) => match items.split_first() {
                None => {
                    let element = self.exists.fresh(self.core.element_hint);
                    self.core.array_of(element)
                }
                Some((first, rest)) => {
                    let element = self.infer(first)?;
                    for item in rest {
                        self.check(item, &element)?;
                    }
                    self.core.array_of(self.exists.substitute(&element))
                }
            },
            ExprKind::Any => type_ty,
            ExprKind::Arrow { domain, codomain } => {
                for ty in domain {
                    self.check(ty, &type_ty)?;
                }
                self.check(codomain, &type_ty)?;
                type_ty
            }
            ExprKind::Native { args, .. } => {
                for arg in args {
                    self.infer(arg)?;
                }
                Ty::Any
            }
            ExprKind::Call {
                callee,
                args,
                lambdas,
            } => self.infer_call(expr, callee, args, lambdas)?,
        };

        if self.options.trace_typing {
            tracing::trace!(
                line = expr.span.line,
                column = expr.span.column,
                ty = %self.show(&ty),
                "infer"
            );
        }
        Ok(ty)
    }

    fn lookup(&mut self, name: Symbol, span: Span) -> Result<Ty, CheckError> {
        if self.universals.contains(&name) {
            return Ok(self.core.type_ty());
        }
        if let Some((_, ty)) = self.locals.iter().rev().find(|(local, _)| *local == name) {
            return Ok(ty.clone());
        }
        if let Some(global) = self.env.symbols.lookup(name) {
            let scheme = global.scheme.clone();
            return Ok(self.exists.instantiate(&scheme));
        }
        if self.declare_forward(name)? {
            return self.lookup(name, span);
        }

        let text = self.text(name);
        if let Some((owner, member)) = text.split_once('/') {
            let declared = self
                .env
                .interner
                .get(owner)
                .is_some_and(|owner| self.env.types.contains(owner));
            if declared {
                return Err(CheckError::UnknownConstructor {
                    ty: owner.to_string(),
                    constructor: member.to_string(),
                    span,
                });
            }
        }
        Err(CheckError::UndefinedVariable {
            name: text.to_string(),
            span,
        })
    }

    fn infer_call(
        &mut self,
        call: &Expr,
        callee: &Callee,
        args: &[Expr],
        lambdas: &[Lambda],
    ) -> Result<Ty, CheckError> {
        let (callee_ty, receivers) = match callee {
            Callee::Function(function) => (self.infer(function)?, 0),
            Callee::Method { receiver, name } => (self.resolve_method(call, receiver, *name)?, 1),
        };
        let supplied = args.len() + lambdas.len();

        let (domain, codomain) = match self.exists.substitute(&callee_ty) {
            Ty::Arrow { domain, codomain } => (domain, *codomain),
            Ty::Exist(id) => {
                let (domain, codomain) = self.fresh_arrow(supplied);
                let arrow = Ty::arrow(domain.clone(), codomain.clone());
                self.exists
                    .solve(id, arrow)
                    .map_err(|_| CheckError::NotCallable {
                        ty: self.show(&Ty::Exist(id)),
                        span: call.span,
                    })?;
                (domain, codomain)
            }
            Ty::Any => {
                for arg in args {
                    self.infer(arg)?;
                }
                for lambda in lambdas {
                    self.check_lambda(lambda, &Ty::Any)?;
                }
                return Ok(Ty::Any);
            }
            other => {
                return Err(CheckError::NotCallable {
                    ty: self.show(&other),
                    span: call.span,
                })
            }
        };

        if receivers + supplied != domain.len() {
            return Err(CheckError::ArityMismatch {
                expected: domain.len().saturating_sub(receivers),
                found: supplied,
                span: call.span,
            });
        }
        let (positional, handlers) = domain[receivers..].split_at(args.len());
        for (arg, param) in args.iter().zip(positional) {
            self.check(arg, param)?;
        }
        for (lambda, param) in lambdas.iter().zip(handlers) {
            self.check_lambda(lambda, param)?;
        }
        Ok(self.exists.substitute(&codomain))
    }

    /// Type `receiver.name` as `Class/name` and record the resolution.
    fn resolve_method(&mut self, call: &Expr, receiver: &Expr, name: Symbol) -> Result<Ty, CheckError> {
        let receiver_ty = self.infer(receiver)?;
        let receiver_ty = self.exists.substitute(&receiver_ty);
        let owner = match &receiver_ty {
            Ty::Cons { name, .. } => *name,
            other => {
                return Err(CheckError::InvalidMethodReceiver {
                    found: self.show(other),
                    span: receiver.span,
                })
            }
        };

        let target = self.qualify(owner, name);
        let mut scheme = self.env.symbols.lookup(target).map(|global| global.scheme.clone());
        if scheme.is_none() && self.declare_forward(target)? {
            scheme = self.env.symbols.lookup(target).map(|global| global.scheme.clone());
        }
        let scheme = match scheme {
            Some(scheme) => scheme,
            None => {
                return Err(CheckError::MethodNotFound {
                    method: self.text(name).to_string(),
                    receiver: self.show(&receiver_ty),
                    span: call.span,
                })
            }
        };
        let ty = self.exists.instantiate(&scheme);
        let first = match &ty {
            Ty::Arrow { domain, .. } if !domain.is_empty() => domain[0].clone(),
            other => {
                return Err(CheckError::NotCallable {
                    ty: self.show(other),
                    span: call.span,
                })
            }
        };
        self.subtype(&receiver_ty, &first, receiver.span)?;
        self.env.methods.record(call, target);
        Ok(ty)
    }

    fn check_lambda(&mut self, lambda: &Lambda, expected: &Ty) -> Result<(), CheckError> {
        let arity = lambda.params.len();
        let (domain, codomain) = match self.exists.substitute(expected) {
            Ty::Exist(id) => {
                let (domain, codomain) = self.fresh_arrow(arity);
                let arrow = Ty::arrow(domain.clone(), codomain.clone());
                self.exists
                    .solve(id, arrow)
                    .map_err(|_| CheckError::UnexpectedLambda {
                        expected: self.show(&Ty::Exist(id)),
                        span: lambda.span,
                    })?;
                (domain, codomain)
            }
            Ty::Arrow { domain, codomain } => {
                if domain.len() != arity {
                    return Err(CheckError::ArityMismatch {
                        expected: domain.len(),
                        found: arity,
                        span: lambda.span,
                    });
                }
                (domain, *codomain)
            }
            Ty::Any => (vec![Ty::Any; arity], Ty::Any),
            other => {
                return Err(CheckError::UnexpectedLambda {
                    expected: self.show(&other),
                    span: lambda.span,
                })
            }
        };

        let depth = self.locals.len();
        self.locals.extend(lambda.params.iter().copied().zip(domain));
        let result = self.check(&lambda.body, &codomain);
        self.locals.truncate(depth);
        result
    }

    fn fresh_arrow(&mut self, arity: usize) -> (Vec<Ty>, Ty) {
        let domain = (0..arity)
            .map(|_| self.exists.fresh(self.core.param_hint))
            .collect();
        let codomain = self.exists.fresh(self.core.codomain_hint);
        (domain, codomain)
    }

    // ========================================================================
    // Names
    // ========================================================================

    fn text(&self, name: Symbol) -> &str {
        self.env.interner.resolve(name)
    }

    fn qualify(&mut self, owner: Symbol, member: Symbol) -> Symbol {
        let member = self.env.interner.resolve(member).to_string();
        self.env.interner.qualify(owner, &member)
    }

    /// Display a type, substituting solved variables first.
    pub fn show(&self, ty: &Ty) -> String {
        self.exists
            .substitute(ty)
            .display(&self.env.interner)
            .to_string()
    }
}
