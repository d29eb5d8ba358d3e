//! Parse error types and error reporting

use crate::parser::operators::Associativity;
use crate::parser::token::{Span, Token};
use std::fmt;

/// A parse error with location and contextual information.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    /// The kind of error that occurred
    pub kind: ParseErrorKind,

    /// Source location of the error
    pub span: Span,

    /// Human-readable error message
    pub message: String,

    /// Optional suggestion for fixing the error
    pub suggestion: Option<String>,
}

/// The kind of parse error.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseErrorKind {
    /// Unexpected token found
    UnexpectedToken {
        /// Tokens that would have been accepted
        expected: Vec<Token>,
        /// Token that was found
        found: Token,
    },

    /// Unexpected end of file
    UnexpectedEof {
        /// Tokens that would have been accepted
        expected: Vec<Token>,
    },

    /// Invalid syntax
    InvalidSyntax {
        /// What is wrong
        reason: String,
    },

    /// Operator symbol used in expression position before any declaration of it
    UnknownOperator {
        /// Operator text
        symbol: String,
    },

    /// Operator symbol declared twice
    DuplicateOperator {
        /// Operator text
        symbol: String,
    },

    /// Two non-associative operators of one level chained
    NonAssociative {
        /// Operator text of the second use
        symbol: String,
    },

    /// Operators of one level with different associativity chained
    AssociativityConflict {
        /// Operator on the left
        left: String,
        /// Operator on the right
        right: String,
    },

    /// Malformed precedence literal
    InvalidPrecedence {
        /// Literal as written
        text: String,
    },

    /// Directive other than `@Fails`, or on an item that cannot carry it
    InvalidDirective {
        /// Directive name
        name: String,
    },

    /// Parser exceeded depth limit
    ParserLimitExceeded {
        /// What limit was hit
        message: String,
    },
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Parse error at {}:{}: {}",
            self.span.line, self.span.column, self.message
        )?;

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\n  Suggestion: {}", suggestion)?;
        }

        Ok(())
    }
}

impl std::error::Error for ParseError {}

impl ParseError {
    fn new(kind: ParseErrorKind, span: Span, message: String) -> Self {
        Self {
            kind,
            span,
            message,
            suggestion: None,
        }
    }

    /// Create an "unexpected token" error.
    pub fn unexpected_token(expected: Vec<Token>, found: Token, span: Span) -> Self {
        let message = match expected.as_slice() {
            [] => format!("Unexpected {}", found),
            [one] => format!("Expected {}, found {}", one, found),
            many => {
                let names: Vec<String> = many.iter().map(|t| t.to_string()).collect();
                format!("Expected one of {}, found {}", names.join(", "), found)
            }
        };
        Self::new(ParseErrorKind::UnexpectedToken { expected, found }, span, message)
    }

    /// Create an "unexpected EOF" error.
    pub fn unexpected_eof(expected: Vec<Token>, span: Span) -> Self {
        let message = match expected.as_slice() {
            [one] => format!("Unexpected end of file, expected {}", one),
            _ => "Unexpected end of file".to_string(),
        };
        Self::new(ParseErrorKind::UnexpectedEof { expected }, span, message)
    }

    /// Create an "invalid syntax" error.
    pub fn invalid_syntax(reason: impl Into<String>, span: Span) -> Self {
        let reason = reason.into();
        let message = format!("Invalid syntax: {}", reason);
        Self::new(ParseErrorKind::InvalidSyntax { reason }, span, message)
    }

    /// Create an "unknown operator" error.
    pub fn unknown_operator(symbol: impl Into<String>, span: Span) -> Self {
        let symbol = symbol.into();
        let message = format!("operator `{}' is not declared", symbol);
        Self::new(ParseErrorKind::UnknownOperator { symbol }, span, message)
            .with_suggestion("declare it with `infix` before its first use")
    }

    /// Create a "duplicate operator" error.
    pub fn duplicate_operator(symbol: impl Into<String>, span: Span) -> Self {
        let symbol = symbol.into();
        let message = format!("operator `{}' is already declared", symbol);
        Self::new(ParseErrorKind::DuplicateOperator { symbol }, span, message)
    }

    /// Create a "non-associative operator chained" error.
    pub fn non_associative(symbol: impl Into<String>, span: Span) -> Self {
        let symbol = symbol.into();
        let message = format!("operator `{}' is non-associative and cannot be chained", symbol);
        Self::new(ParseErrorKind::NonAssociative { symbol }, span, message)
            .with_suggestion("add parentheses")
    }

    /// Create an "associativity conflict" error.
    pub fn associativity_conflict(
        left: (String, Associativity),
        right: (String, Associativity),
        span: Span,
    ) -> Self {
        let message = format!(
            "operators `{}' ({}) and `{}' ({}) share a precedence level",
            left.0, left.1, right.0, right.1
        );
        Self::new(
            ParseErrorKind::AssociativityConflict {
                left: left.0,
                right: right.0,
            },
            span,
            message,
        )
        .with_suggestion("add parentheses")
    }

    /// Create an "invalid precedence" error.
    pub fn invalid_precedence(text: impl Into<String>, span: Span) -> Self {
        let text = text.into();
        let message = format!("invalid precedence `{}'", text);
        Self::new(ParseErrorKind::InvalidPrecedence { text }, span, message)
            .with_suggestion("write a number with a point, such as `100.` or `.5`")
    }

    /// Create an "invalid directive" error.
    pub fn invalid_directive(name: impl Into<String>, reason: &str, span: Span) -> Self {
        let name = name.into();
        let message = format!("directive `@{}' {}", name, reason);
        Self::new(ParseErrorKind::InvalidDirective { name }, span, message)
    }

    /// Create a "parser limit exceeded" error.
    pub fn parser_limit_exceeded(message: impl Into<String>, span: Span) -> Self {
        let message = message.into();
        let text = format!("Parser limit exceeded: {}", message);
        Self::new(ParseErrorKind::ParserLimitExceeded { message }, span, text)
    }

    /// Add a suggestion to this error.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}
