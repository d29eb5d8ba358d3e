//! Variant elimination.
//!
//! An eliminator takes a value of class `C` and one handler per constructor
//! of `C`. Elimination picks the handler for the value's constructor and
//! returns it, together with the constructor's fields, as a [`Suspended`]
//! computation. Resuming it runs that handler and nothing else; resuming
//! consumes the suspension, so it can run at most once, and dropping it runs
//! no handler at all.
//!
//! Host effects go through the same discipline as a [`Deferred::Effect`]:
//! the primitive call is captured and performed when, and only when, the
//! computation is resumed.

use crate::parser::types::VariantType;
use crate::vm::error::plural;
use crate::vm::value::{Value, VariantValue};
use thiserror::Error;

/// Elimination failures. The checker rules all of them out for checked
/// programs.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ElimError {
    /// Handler count differs from the constructor count
    #[error("eliminator expects {expected} handler{}, got {found}", plural(.expected))]
    ArityMismatch {
        /// Constructor count
        expected: usize,
        /// Handlers supplied
        found: usize,
    },

    /// The value's tag names no constructor of the class
    #[error("no constructor with tag {tag} in class #{class}")]
    UnknownConstructor {
        /// Class index
        class: u32,
        /// Offending tag
        tag: usize,
    },

    /// The value belongs to another class
    #[error("value of another class passed to the eliminator of class #{class}")]
    ForeignVariant {
        /// Class index
        class: u32,
    },
}

/// A selected handler waiting to run.
#[must_use = "a suspended branch does nothing unless resumed"]
#[derive(Debug)]
pub struct Suspended<H> {
    handler: H,
    fields: Vec<Value>,
    tag: usize,
}

impl<H> Suspended<H> {
    /// Constructor index that selected this branch
    pub fn tag(&self) -> usize {
        self.tag
    }

    /// Run the handler with the constructor's fields.
    pub fn resume<R>(self, run: impl FnOnce(H, Vec<Value>) -> R) -> R {
        run(self.handler, self.fields)
    }
}

/// A captured host effect waiting to be performed.
#[must_use = "a deferred effect does nothing unless resumed"]
#[derive(Debug)]
pub struct Effect {
    primitive: String,
    args: Vec<Value>,
}

impl Effect {
    /// Capture a call of `primitive`.
    pub fn new(primitive: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            primitive: primitive.into(),
            args,
        }
    }

    /// Primitive name
    pub fn primitive(&self) -> &str {
        &self.primitive
    }

    /// Perform the effect.
    pub fn resume<R>(self, run: impl FnOnce(&str, Vec<Value>) -> R) -> R {
        run(&self.primitive, self.args)
    }
}

/// The one-shot computations the evaluator produces.
#[derive(Debug)]
pub enum Deferred<H> {
    /// Handler chosen by an eliminator
    Branch(Suspended<H>),
    /// `Unit`-returning host effect
    Effect(Effect),
}

/// Select the handler for `value` among `handlers`.
///
/// `handlers` are in constructor order. The handlers that are not selected
/// are dropped unrun.
pub fn eliminate<H>(
    class: &VariantType,
    value: &VariantValue,
    handlers: Vec<H>,
) -> Result<Suspended<H>, ElimError> {
    if value.variant != class.id {
        return Err(ElimError::ForeignVariant {
            class: class.id.as_u32(),
        });
    }
    if handlers.len() != class.constructors.len() {
        return Err(ElimError::ArityMismatch {
            expected: class.constructors.len(),
            found: handlers.len(),
        });
    }
    let handler = handlers
        .into_iter()
        .nth(value.tag)
        .ok_or(ElimError::UnknownConstructor {
            class: class.id.as_u32(),
            tag: value.tag,
        })?;

    Ok(Suspended {
        handler,
        fields: value.fields.clone(),
        tag: value.tag,
    })
}
