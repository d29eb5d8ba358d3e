//! Meml Language Engine
//!
//! This crate provides the kernel of the meml expression language:
//! - **Parser**: Lexer, user-extensible operator grammar, variant type model
//!   and structural type checker (`parser` module)
//! - **VM**: Runtime values, one-shot variant elimination, host primitives
//!   and the evaluator shared by compile time and run time (`vm` module)
//! - **Session**: One compilation unit with its prelude (`session` module)
//!
//! # Example
//!
//! ```rust,ignore
//! use meml_engine::Session;
//!
//! let mut session = Session::new()?;
//! session.load(r#"
//!     let n: Int = 1 + 2
//!     fun main(): Unit = write(n)
//! "#)?;
//! session.run_main()?;
//! assert_eq!(session.output(), vec!["3".to_string()]);
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

// ============================================================================
// Core Modules
// ============================================================================

/// Parser module: Lexer, parser, types, and type checker
pub mod parser;

/// VM module: Values, elimination, host primitives, and evaluator
pub mod vm;

/// Declaration state shared by the checker and the evaluator
pub mod environment;

/// Session configuration
pub mod config;

/// Compilation sessions
pub mod session;

/// Crate-level error type
pub mod error;

mod stack;

// ============================================================================
// Re-exports
// ============================================================================

pub use config::{ConfigError, SessionConfig};
pub use environment::Environment;
pub use error::Error;
pub use session::{Session, PRELUDE};

pub use parser::{
    Associativity, CheckError, Diagnostic, Interner, OperatorTable, ParseError, Parser, Precedence,
    Span, Symbol, Ty, TypeChecker, TypeContext, TypeError,
};
pub use vm::{
    eliminate, Deferred, ElimError, HostPrimitives, HostValue, Interpreter, StandardHost,
    Suspended, Value, VmError,
};
