//! Host primitives reached through `native "name"(args)`.
//!
//! The core knows primitives only by name. A host answers with a
//! [`HostValue`]; booleans, orderings and unit are turned into the prelude's
//! `Bool`, `Ordering` and `Unit` variants by the evaluator, so source code
//! eliminates them like any other class.

use crate::parser::interner::Interner;
use crate::parser::types::TypeContext;
use crate::vm::value::Value;
use std::cell::RefCell;
use std::cmp::Ordering;
use std::rc::Rc;
use thiserror::Error;

/// Result of a host primitive.
#[derive(Debug, Clone, PartialEq)]
pub enum HostValue {
    /// Already a runtime value
    Value(Value),
    /// Becomes `Bool/False` or `Bool/True`
    Bool(bool),
    /// Becomes `Ordering/Lt`, `Ordering/Eq` or `Ordering/Gt`
    Ordering(Ordering),
    /// Becomes `Unit/Unit`
    Unit,
}

/// Failures raised by host primitives.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HostError {
    /// No primitive with this name
    #[error("unknown primitive `{name}'")]
    UnknownPrimitive {
        /// Primitive name
        name: String,
    },

    /// Wrong number of arguments
    #[error("primitive `{name}' expects {expected} arguments, got {found}")]
    ArityMismatch {
        /// Primitive name
        name: String,
        /// Expected count
        expected: usize,
        /// Supplied count
        found: usize,
    },

    /// Argument of the wrong kind
    #[error("primitive `{name}': expected {expected}, got {found}")]
    InvalidArgument {
        /// Primitive name
        name: String,
        /// Expected kind
        expected: &'static str,
        /// Supplied kind
        found: &'static str,
    },

    /// Integer division or remainder by zero
    #[error("division by zero")]
    DivisionByZero,

    /// Integer overflow
    #[error("integer overflow in `{name}'")]
    Overflow {
        /// Primitive name
        name: String,
    },

    /// Error raised by the program itself
    #[error("{message}")]
    Raised {
        /// Rendered message
        message: String,
    },
}

/// Read-only session state a primitive may use to render values.
pub struct HostContext<'a> {
    /// Session interner
    pub interner: &'a Interner,
    /// Declared classes
    pub types: &'a TypeContext,
}

impl HostContext<'_> {
    /// Render a value the way `print` shows it.
    pub fn render(&self, value: &Value) -> String {
        value.display(self.interner, self.types).to_string()
    }
}

/// A set of named primitives.
pub trait HostPrimitives {
    /// Call primitive `name`.
    fn call(&mut self, name: &str, args: &[Value], cx: &HostContext<'_>) -> Result<HostValue, HostError>;

    /// Whether `name` is performed for its effect and yields `Unit`.
    ///
    /// Effect calls are deferred and performed exactly once when resumed.
    fn is_effect(&self, _name: &str) -> bool {
        false
    }
}

/// Lines printed by a [`StandardHost`].
///
/// A cheap handle: clones share the same lines, so the owner of a session
/// can keep one while the host itself is boxed away.
#[derive(Debug, Default, Clone)]
pub struct Transcript(Rc<RefCell<Vec<String>>>);

impl Transcript {
    /// Lines printed so far
    pub fn lines(&self) -> Vec<String> {
        self.0.borrow().clone()
    }

    /// Take the printed lines, leaving the transcript empty
    pub fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.0.borrow_mut())
    }

    fn push(&self, line: String) {
        self.0.borrow_mut().push(line);
    }
}

/// Reference host: integer and string primitives, plus `print` and `error`.
///
/// `print` appends to a [`Transcript`] and, if enabled, also writes to
/// standard output.
#[derive(Debug, Default, Clone)]
pub struct StandardHost {
    transcript: Transcript,
    echo: bool,
}

impl StandardHost {
    /// Host with a silent transcript
    pub fn new() -> Self {
        Self::default()
    }

    /// Also write printed lines to standard output.
    pub fn with_echo(mut self, echo: bool) -> Self {
        self.echo = echo;
        self
    }

    /// Handle on the printed lines
    pub fn transcript(&self) -> Transcript {
        self.transcript.clone()
    }
}

pub(crate) fn expect_arity(name: &str, args: &[Value], expected: usize) -> Result<(), HostError> {
    if args.len() == expected {
        Ok(())
    } else {
        Err(HostError::ArityMismatch {
            name: name.to_string(),
            expected,
            found: args.len(),
        })
    }
}

pub(crate) fn invalid_argument(name: &str, expected: &'static str, found: &Value) -> HostError {
    HostError::InvalidArgument {
        name: name.to_string(),
        expected,
        found: found.kind_name(),
    }
}

fn int_pair(name: &str, args: &[Value]) -> Result<(i64, i64), HostError> {
    expect_arity(name, args, 2)?;
    match (&args[0], &args[1]) {
        (Value::Int(a), Value::Int(b)) => Ok((*a, *b)),
        (Value::Int(_), other) | (other, _) => Err(invalid_argument(name, "integer", other)),
    }
}

fn str_pair<'v>(name: &str, args: &'v [Value]) -> Result<(&'v str, &'v str), HostError> {
    expect_arity(name, args, 2)?;
    match (&args[0], &args[1]) {
        (Value::Str(a), Value::Str(b)) => Ok((&**a, &**b)),
        (Value::Str(_), other) | (other, _) => Err(invalid_argument(name, "string", other)),
    }
}

fn checked(name: &str, result: Option<i64>) -> Result<HostValue, HostError> {
    result.map(|n| HostValue::Value(Value::Int(n))).ok_or_else(|| HostError::Overflow {
        name: name.to_string(),
    })
}

impl HostPrimitives for StandardHost {
    fn call(&mut self, name: &str, args: &[Value], cx: &HostContext<'_>) -> Result<HostValue, HostError> {
        match name {
            "int-add" => {
                let (a, b) = int_pair(name, args)?;
                checked(name, a.checked_add(b))
            }
            "int-sub" => {
                let (a, b) = int_pair(name, args)?;
                checked(name, a.checked_sub(b))
            }
            "int-mul" => {
                let (a, b) = int_pair(name, args)?;
                checked(name, a.checked_mul(b))
            }
            "int-div" | "int-rem" => {
                let (a, b) = int_pair(name, args)?;
                if b == 0 {
                    return Err(HostError::DivisionByZero);
                }
                if name == "int-div" {
                    checked(name, a.checked_div(b))
                } else {
                    checked(name, a.checked_rem(b))
                }
            }
            "int-lt" => {
                let (a, b) = int_pair(name, args)?;
                Ok(HostValue::Bool(a < b))
            }
            "int-eq" => {
                let (a, b) = int_pair(name, args)?;
                Ok(HostValue::Bool(a == b))
            }
            "int-cmp" => {
                let (a, b) = int_pair(name, args)?;
                Ok(HostValue::Ordering(a.cmp(&b)))
            }
            "str-lt" => {
                let (a, b) = str_pair(name, args)?;
                Ok(HostValue::Bool(a < b))
            }
            "str-eq" => {
                let (a, b) = str_pair(name, args)?;
                Ok(HostValue::Bool(a == b))
            }
            "str-cmp" => {
                let (a, b) = str_pair(name, args)?;
                Ok(HostValue::Ordering(a.cmp(b)))
            }
            "str-concat" => {
                let (a, b) = str_pair(name, args)?;
                Ok(HostValue::Value(Value::string(&format!("{}{}", a, b))))
            }
            "print" => {
                expect_arity(name, args, 1)?;
                let line = cx.render(&args[0]);
                if self.echo {
                    println!("{}", line);
                }
                self.transcript.push(line);
                Ok(HostValue::Unit)
            }
            "error" => {
                expect_arity(name, args, 1)?;
                Err(HostError::Raised {
                    message: cx.render(&args[0]),
                })
            }
            _ => Err(HostError::UnknownPrimitive {
                name: name.to_string(),
            }),
        }
    }

    fn is_effect(&self, name: &str) -> bool {
        name == "print"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(host: &mut StandardHost, name: &str, args: &[Value]) -> Result<HostValue, HostError> {
        let mut interner = Interner::new();
        let types = TypeContext::new(&mut interner);
        let cx = HostContext {
            interner: &interner,
            types: &types,
        };
        host.call(name, args, &cx)
    }

    #[test]
    fn test_integer_primitives() {
        let mut host = StandardHost::new();
        assert_eq!(
            call(&mut host, "int-add", &[Value::Int(2), Value::Int(3)]),
            Ok(HostValue::Value(Value::Int(5)))
        );
        assert_eq!(
            call(&mut host, "int-cmp", &[Value::Int(2), Value::Int(3)]),
            Ok(HostValue::Ordering(Ordering::Less))
        );
        assert_eq!(
            call(&mut host, "int-div", &[Value::Int(1), Value::Int(0)]),
            Err(HostError::DivisionByZero)
        );
        assert!(matches!(
            call(&mut host, "int-add", &[Value::Int(i64::MAX), Value::Int(1)]),
            Err(HostError::Overflow { .. })
        ));
    }

    #[test]
    fn test_string_primitives() {
        let mut host = StandardHost::new();
        assert_eq!(
            call(&mut host, "str-lt", &[Value::string("a"), Value::string("b")]),
            Ok(HostValue::Bool(true))
        );
        assert_eq!(
            call(&mut host, "str-concat", &[Value::string("a"), Value::string("b")]),
            Ok(HostValue::Value(Value::string("ab")))
        );
        assert!(matches!(
            call(&mut host, "str-eq", &[Value::string("a"), Value::Int(1)]),
            Err(HostError::InvalidArgument { expected: "string", found: "integer", .. })
        ));
    }

    #[test]
    fn test_print_records_transcript() {
        let mut host = StandardHost::new();
        assert_eq!(call(&mut host, "print", &[Value::Int(42)]), Ok(HostValue::Unit));
        assert_eq!(host.transcript().lines(), vec!["42".to_string()]);
        assert!(host.is_effect("print"));
        assert!(!host.is_effect("int-add"));
    }

    #[test]
    fn test_error_and_unknown() {
        let mut host = StandardHost::new();
        assert_eq!(
            call(&mut host, "error", &[Value::string("boom")]),
            Err(HostError::Raised { message: "boom".to_string() })
        );
        assert_eq!(
            call(&mut host, "launch", &[]),
            Err(HostError::UnknownPrimitive { name: "launch".to_string() })
        );
    }
}
