//! Front end and static semantics of meml.
//!
//! Lexing, parsing (including the user-extensible operator table), the type
//! model and the type checker.
//!
//! # Example
//!
//! ```ignore
//! use meml_engine::parser::{Interner, OperatorTable, Parser};
//!
//! let mut interner = Interner::new();
//! let mut operators = OperatorTable::new();
//! let source = r#"
//!     infix left at 75. "+" = ".add"
//!     let two: Int = 1 + 1
//! "#;
//!
//! let items = Parser::new(source, &mut interner, &mut operators)
//!     .expect("lexes")
//!     .parse()
//!     .expect("parses");
//! assert_eq!(items.len(), 2);
//! ```

pub mod token;
pub mod lexer;
pub mod ast;
pub mod parser;
pub mod interner;
pub mod operators;

pub mod types;

pub mod checker;

pub use token::{Span, Token};
pub use lexer::{LexError, Lexer};
pub use parser::{ParseError, ParseErrorKind, Parser};
pub use interner::{Interner, Symbol};
pub use operators::{Associativity, OperatorEntry, OperatorTable, OperatorTarget, Precedence};

pub use types::{CoreNames, Ty, TypeContext, TypeError, VariantId};

pub use checker::{CheckError, Diagnostic, TypeChecker};
