//! Evaluation errors

use crate::parser::types::TypeError;
use crate::vm::elim::ElimError;
use crate::vm::host::HostError;
use thiserror::Error;

/// Errors raised while evaluating an expression.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VmError {
    /// Global read before any declaration of it
    #[error("undefined global `{name}'")]
    UndefinedGlobal {
        /// Global name
        name: String,
    },

    /// Global read while its own initializer runs
    #[error("global `{name}' depends on its own value")]
    CyclicInitialization {
        /// Global name
        name: String,
    },

    /// Applied something that is not a function
    #[error("cannot call a {found}")]
    NotCallable {
        /// Kind of the callee
        found: &'static str,
    },

    /// Function applied to the wrong number of arguments
    #[error("expected {expected} argument{}, got {found}", plural(.expected))]
    ArityMismatch {
        /// Parameter count
        expected: usize,
        /// Supplied count
        found: usize,
    },

    /// Value of an unexpected kind
    #[error("expected a {expected}, got a {found}")]
    UnexpectedValue {
        /// Expected kind
        expected: &'static str,
        /// Actual kind
        found: &'static str,
    },

    /// Method call the checker never resolved
    #[error("method call `.{name}' was not resolved")]
    UnresolvedMethod {
        /// Method name
        name: String,
    },

    /// A class the engine converts host results into is not declared
    #[error("core type `{name}' is not declared")]
    MissingCoreType {
        /// Class or constructor name
        name: String,
    },

    /// Call depth limit reached
    #[error("call depth exceeded {limit}")]
    StackOverflow {
        /// Configured limit
        limit: usize,
    },

    /// Array index outside the array
    #[error("index {index} out of bounds for length {len}")]
    IndexOutOfBounds {
        /// Requested index
        index: i64,
        /// Array length
        len: usize,
    },

    /// Elimination failure
    #[error(transparent)]
    Elim(#[from] ElimError),

    /// Host primitive failure
    #[error(transparent)]
    Host(#[from] HostError),

    /// Type construction failure
    #[error(transparent)]
    Type(#[from] TypeError),
}

pub(crate) fn plural(count: &usize) -> &'static str {
    if *count == 1 {
        ""
    } else {
        "s"
    }
}
