//! Error types for type checking
//!
//! Messages are part of the language: `@Fails(error: ...)` directives
//! compare against them verbatim.

use crate::parser::token::Span;
use crate::parser::types::TypeError;
use crate::vm::VmError;
use thiserror::Error;

/// Errors that can occur while checking a declaration
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CheckError {
    /// The type found is not compatible with the type required
    #[error("`{got}' is not a subtype of `{expected}'")]
    SubtypeError {
        /// Type found
        got: String,
        /// Type required
        expected: String,
        /// Location of the offending expression
        span: Span,
    },

    /// Argument or lambda parameter count does not match
    #[error("expected {expected} {}, found {found}", arguments(.expected))]
    ArityMismatch {
        /// Count required
        expected: usize,
        /// Count supplied
        found: usize,
        /// Location of the call or lambda
        span: Span,
    },

    /// `C/K` where class `C` has no constructor or member `K`
    #[error("`{ty}' has no constructor `{constructor}'")]
    UnknownConstructor {
        /// Class name
        ty: String,
        /// Missing member
        constructor: String,
        /// Location of the reference
        span: Span,
    },

    /// Name not declared
    #[error("undefined variable `{name}'")]
    UndefinedVariable {
        /// Name as written
        name: String,
        /// Location of the reference
        span: Span,
    },

    /// No method of that name on the receiver's class
    #[error("no method `{method}' on `{receiver}'")]
    MethodNotFound {
        /// Method name
        method: String,
        /// Receiver type
        receiver: String,
        /// Location of the call
        span: Span,
    },

    /// Method receiver is not an instance of a class
    #[error("cannot call a method on `{found}'")]
    InvalidMethodReceiver {
        /// Receiver type or annotation
        found: String,
        /// Location
        span: Span,
    },

    /// Called something that is not a function
    #[error("`{ty}' is not a function")]
    NotCallable {
        /// Callee type
        ty: String,
        /// Location of the call
        span: Span,
    },

    /// Lambda where a non-function value is required
    #[error("a lambda cannot have type `{expected}'")]
    UnexpectedLambda {
        /// Type required
        expected: String,
        /// Location of the lambda
        span: Span,
    },

    /// Annotation did not evaluate to a type
    #[error("expected a type, found {found}")]
    NotAType {
        /// Rendered value
        found: String,
        /// Location of the annotation
        span: Span,
    },

    /// Global name declared twice
    #[error("`{name}' is already declared")]
    DuplicateSymbol {
        /// Qualified name
        name: String,
        /// Location of the second declaration
        span: Span,
        /// Location of the first declaration
        original: Span,
    },

    /// Class registration failed
    #[error("{error}")]
    Declaration {
        /// Underlying error
        error: TypeError,
        /// Location of the class
        span: Span,
    },

    /// Evaluating an annotation failed
    #[error("{error}")]
    Evaluation {
        /// Underlying error
        error: VmError,
        /// Location of the annotation
        span: Span,
    },

    /// `@Fails` on a declaration that checks
    #[error("expected failure `{expected}', but the declaration checks")]
    UnexpectedSuccess {
        /// Directive text
        expected: String,
        /// Location of the directive
        span: Span,
    },

    /// `@Fails` on a declaration that fails differently
    #[error("expected failure `{expected}', found `{found}'")]
    WrongDiagnostic {
        /// Directive text
        expected: String,
        /// Actual message
        found: String,
        /// Location of the directive
        span: Span,
    },
}

fn arguments(count: &usize) -> &'static str {
    if *count == 1 {
        "argument"
    } else {
        "arguments"
    }
}

impl CheckError {
    /// Primary location
    pub fn span(&self) -> Span {
        match self {
            CheckError::SubtypeError { span, .. }
            | CheckError::ArityMismatch { span, .. }
            | CheckError::UnknownConstructor { span, .. }
            | CheckError::UndefinedVariable { span, .. }
            | CheckError::MethodNotFound { span, .. }
            | CheckError::InvalidMethodReceiver { span, .. }
            | CheckError::NotCallable { span, .. }
            | CheckError::UnexpectedLambda { span, .. }
            | CheckError::NotAType { span, .. }
            | CheckError::DuplicateSymbol { span, .. }
            | CheckError::Declaration { span, .. }
            | CheckError::Evaluation { span, .. }
            | CheckError::UnexpectedSuccess { span, .. }
            | CheckError::WrongDiagnostic { span, .. } => *span,
        }
    }

    /// Whether this is a fixture protocol failure rather than a type error
    pub fn is_harness_failure(&self) -> bool {
        matches!(
            self,
            CheckError::UnexpectedSuccess { .. } | CheckError::WrongDiagnostic { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subtype_message() {
        let err = CheckError::SubtypeError {
            got: "Int".to_string(),
            expected: "String".to_string(),
            span: Span::default(),
        };
        assert_eq!(err.to_string(), "`Int' is not a subtype of `String'");
    }

    #[test]
    fn test_arity_message_counts_arguments() {
        let one = CheckError::ArityMismatch {
            expected: 1,
            found: 2,
            span: Span::default(),
        };
        assert_eq!(one.to_string(), "expected 1 argument, found 2");

        let three = CheckError::ArityMismatch {
            expected: 3,
            found: 1,
            span: Span::default(),
        };
        assert_eq!(three.to_string(), "expected 3 arguments, found 1");
    }

    #[test]
    fn test_declaration_message_is_transparent() {
        let err = CheckError::Declaration {
            error: TypeError::EmptyTupleType,
            span: Span::new(3, 9, 1, 4),
        };
        assert_eq!(err.to_string(), TypeError::EmptyTupleType.to_string());
        assert_eq!(err.span(), Span::new(3, 9, 1, 4));
    }
}
