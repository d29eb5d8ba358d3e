//! Type value model.
//!
//! Classes are registered in a [`TypeContext`]; types themselves are plain
//! [`Ty`] values that the checker compares and the evaluator passes around
//! as first-class data.

pub mod context;
pub mod error;
pub mod ty;

pub use context::{sort_by_name, type_name, Constructor, CoreNames, TypeContext, VariantId, VariantType};
pub use error::TypeError;
pub use ty::{ExistId, Ty, TyDisplay};
