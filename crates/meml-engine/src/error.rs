//! Crate-level error type

use crate::config::ConfigError;
use crate::parser::checker::{CheckError, Diagnostic};
use crate::parser::lexer::LexError;
use crate::parser::parser::ParseError;
use crate::vm::VmError;
use thiserror::Error;

/// Any error a [`Session`](crate::session::Session) can report.
#[derive(Debug, Error)]
pub enum Error {
    /// The source did not lex
    #[error("{}", lex_messages(.0))]
    Lex(Vec<LexError>),

    /// The source did not parse
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// A declaration or expression did not check
    #[error(transparent)]
    Check(#[from] CheckError),

    /// Evaluation failed
    #[error(transparent)]
    Runtime(#[from] VmError),

    /// The configuration is invalid
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl From<Vec<LexError>> for Error {
    fn from(errors: Vec<LexError>) -> Self {
        Error::Lex(errors)
    }
}

impl Error {
    /// Diagnostics for this error, labelled against file `file_id`.
    pub fn diagnostics(&self, file_id: usize) -> Vec<Diagnostic> {
        match self {
            Error::Lex(errors) => errors
                .iter()
                .map(|e| Diagnostic::from_lex_error(e, file_id))
                .collect(),
            Error::Parse(e) => vec![Diagnostic::from_parse_error(e, file_id)],
            Error::Check(e) => vec![Diagnostic::from_check_error(e, file_id)],
            Error::Runtime(e) => vec![Diagnostic::from_vm_error(e)],
            Error::Config(e) => vec![Diagnostic::error(e.to_string())],
        }
    }
}

fn lex_messages(errors: &[LexError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}
