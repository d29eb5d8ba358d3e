//! Runtime values and environments
//!
//! Values are reference counted and, apart from [`Value::Cell`], immutable.
//! Arrays are persistent: `array-push` returns a new array and leaves the
//! original untouched.

use crate::parser::ast::Expr;
use crate::parser::interner::{Interner, Symbol};
use crate::parser::types::{Ty, TypeContext, VariantId};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// A runtime value.
#[derive(Debug, Clone)]
pub enum Value {
    /// Machine integer
    Int(i64),
    /// Immutable string
    Str(Rc<str>),
    /// First-class type
    Type(Ty),
    /// Instance of a declared class
    Variant(Rc<VariantValue>),
    /// Persistent array
    Array(Rc<[Value]>),
    /// The single mutable cell behind `Box`
    Cell(Rc<RefCell<Value>>),
    /// Lambda or declared function
    Closure(Rc<Closure>),
    /// Constructor, eliminator or type constructor of a class
    Builtin(Builtin),
}

/// Tagged instance of a class.
#[derive(Debug, Clone, PartialEq)]
pub struct VariantValue {
    /// Class identity
    pub variant: VariantId,
    /// Constructor index
    pub tag: usize,
    /// Field values in declaration order
    pub fields: Vec<Value>,
}

/// A function value closing over its defining environment.
pub struct Closure {
    /// Parameter names
    pub params: Vec<Symbol>,
    /// Body
    pub body: Rc<Expr>,
    /// Captured environment
    pub env: Env,
    /// Global name for declared functions
    pub name: Option<Symbol>,
}

impl fmt::Debug for Closure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Closure")
            .field("params", &self.params)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Functions generated by a `class` declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    /// `C/K`
    Constructor {
        /// Class
        variant: VariantId,
        /// Constructor index
        tag: usize,
        /// Field count
        arity: usize,
    },
    /// `C/elim`
    Eliminator {
        /// Class
        variant: VariantId,
    },
    /// `C` of a generic class, applied to type arguments
    TypeConstructor {
        /// Class name
        name: Symbol,
        /// Generic parameter count
        arity: usize,
    },
}

impl Value {
    /// Build a string value
    pub fn string(text: &str) -> Value {
        Value::Str(Rc::from(text))
    }

    /// Build an array value
    pub fn array(items: Vec<Value>) -> Value {
        Value::Array(Rc::from(items))
    }

    /// Build a variant value
    pub fn variant(variant: VariantId, tag: usize, fields: Vec<Value>) -> Value {
        Value::Variant(Rc::new(VariantValue {
            variant,
            tag,
            fields,
        }))
    }

    /// Short name of the value's kind, for error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "integer",
            Value::Str(_) => "string",
            Value::Type(_) => "type",
            Value::Variant(_) => "variant",
            Value::Array(_) => "array",
            Value::Cell(_) => "box",
            Value::Closure(_) => "function",
            Value::Builtin(_) => "builtin",
        }
    }

    /// Check whether the value can be applied
    pub fn is_callable(&self) -> bool {
        matches!(self, Value::Closure(_) | Value::Builtin(_))
    }

    /// Render with names resolved.
    pub fn display<'a>(&'a self, interner: &'a Interner, types: &'a TypeContext) -> ValueDisplay<'a> {
        ValueDisplay {
            value: self,
            interner,
            types,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Type(a), Value::Type(b)) => a == b,
            (Value::Variant(a), Value::Variant(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Cell(a), Value::Cell(b)) => Rc::ptr_eq(a, b),
            (Value::Closure(a), Value::Closure(b)) => Rc::ptr_eq(a, b),
            (Value::Builtin(a), Value::Builtin(b)) => a == b,
            _ => false,
        }
    }
}

/// [`fmt::Display`] adapter returned by [`Value::display`].
pub struct ValueDisplay<'a> {
    value: &'a Value,
    interner: &'a Interner,
    types: &'a TypeContext,
}

impl<'a> ValueDisplay<'a> {
    fn nested(&self, value: &'a Value) -> ValueDisplay<'a> {
        ValueDisplay {
            value,
            interner: self.interner,
            types: self.types,
        }
    }

    fn write_all(&self, f: &mut fmt::Formatter<'_>, values: &'a [Value]) -> fmt::Result {
        for (i, value) in values.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{}", self.nested(value))?;
        }
        Ok(())
    }
}

impl fmt::Display for ValueDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.value {
            Value::Int(n) => write!(f, "{}", n),
            Value::Str(s) => write!(f, "{}", s),
            Value::Type(ty) => write!(f, "{}", ty.display(self.interner)),
            Value::Variant(v) => {
                let class = self.types.variant(v.variant);
                let ctor = class
                    .constructors
                    .get(v.tag)
                    .map(|c| self.interner.resolve(c.name))
                    .unwrap_or("?");
                write!(f, "{}/{}(", self.interner.resolve(class.name), ctor)?;
                self.write_all(f, &v.fields)?;
                write!(f, ")")
            }
            Value::Array(items) => {
                write!(f, "@[")?;
                self.write_all(f, items)?;
                write!(f, "]")
            }
            Value::Cell(cell) => {
                let inner = cell.borrow().clone();
                let shown = ValueDisplay {
                    value: &inner,
                    interner: self.interner,
                    types: self.types,
                };
                write!(f, "Box({})", shown)
            }
            Value::Closure(closure) => match closure.name {
                Some(name) => write!(f, "<fun {}>", self.interner.resolve(name)),
                None => write!(f, "<fun>"),
            },
            Value::Builtin(Builtin::Constructor { variant, tag, .. }) => {
                let class = self.types.variant(*variant);
                let ctor = class
                    .constructors
                    .get(*tag)
                    .map(|c| self.interner.resolve(c.name))
                    .unwrap_or("?");
                write!(f, "<constructor {}/{}>", self.interner.resolve(class.name), ctor)
            }
            Value::Builtin(Builtin::Eliminator { variant }) => {
                let class = self.types.variant(*variant);
                write!(f, "<eliminator {}>", self.interner.resolve(class.name))
            }
            Value::Builtin(Builtin::TypeConstructor { name, .. }) => {
                write!(f, "<type constructor {}>", self.interner.resolve(*name))
            }
        }
    }
}

// ============================================================================
// Environments
// ============================================================================

/// Persistent linked scope of local bindings.
///
/// Extending an environment never changes it, so closures can capture it
/// by cloning the head pointer.
#[derive(Debug, Clone, Default)]
pub struct Env(Option<Rc<Frame>>);

#[derive(Debug)]
struct Frame {
    name: Symbol,
    value: Value,
    parent: Env,
}

impl Env {
    /// The empty environment.
    pub fn empty() -> Self {
        Env(None)
    }

    /// A new environment with `name` bound in front of `self`.
    pub fn bind(&self, name: Symbol, value: Value) -> Env {
        Env(Some(Rc::new(Frame {
            name,
            value,
            parent: self.clone(),
        })))
    }

    /// Innermost binding of `name`.
    pub fn lookup(&self, name: Symbol) -> Option<&Value> {
        let mut current = self;
        while let Some(frame) = &current.0 {
            if frame.name == name {
                return Some(&frame.value);
            }
            current = &frame.parent;
        }
        None
    }

    /// Check if no name is bound
    pub fn is_empty(&self) -> bool {
        self.0.is_none()
    }
}
