//! Structural type checker
//!
//! This module provides:
//! - The global symbol table of type schemes
//! - Existential variables and unification
//! - Bidirectional checking of declarations and expressions
//! - Compile-time evaluation of type annotations
//! - `@Fails` expected-failure directives
//! - Diagnostics for every error the engine reports
//!
//! # Usage
//!
//! ```ignore
//! use meml_engine::environment::Environment;
//! use meml_engine::parser::checker::TypeChecker;
//! use meml_engine::vm::StandardHost;
//!
//! let mut env = Environment::new(Box::new(StandardHost::new()));
//! let items = /* parse with env.interner and env.operators */;
//!
//! let mut checker = TypeChecker::new(&mut env);
//! for item in &items {
//!     checker.check_directed(item)?;
//! }
//! ```

pub mod symbols;
pub mod unify;
#[allow(clippy::module_inception)]
pub mod checker;
pub mod error;
pub mod diagnostic;
pub mod harness;

pub use symbols::{GlobalSymbol, Scheme, SymbolKind, SymbolTable};
pub use unify::{Existentials, Mismatch};
pub use checker::{CheckerOptions, TypeChecker};
pub use error::CheckError;
pub use diagnostic::{create_files, error_code, Diagnostic, ErrorCode, JsonDiagnostic, JsonLabel};
pub use harness::{expected_message, FixtureReport, Outcome};
