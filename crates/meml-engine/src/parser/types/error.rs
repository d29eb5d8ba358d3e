//! Type model errors

use thiserror::Error;

/// Errors raised while declaring or building types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TypeError {
    /// A class with this name already exists
    #[error("type `{name}' is already declared")]
    DuplicateType {
        /// Class name
        name: String,
    },

    /// Two constructors of one class share a name
    #[error("constructor `{constructor}' is declared twice in `{ty}'")]
    DuplicateConstructor {
        /// Class name
        ty: String,
        /// Constructor name
        constructor: String,
    },

    /// `tuple-type` applied to no types
    #[error("cannot build a tuple type from no types")]
    EmptyTupleType,
}
