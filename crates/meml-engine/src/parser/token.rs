//! Token definitions for the meml lexer.

use crate::parser::interner::Symbol;
use std::fmt;

/// Token type produced by the lexer.
///
/// Keywords are not separate tokens: `class`, `let`, `fun` and friends are
/// plain identifiers that only the item parser treats specially, so that
/// `let(x) λ y. ...` and `fun λ x. ...` remain ordinary calls.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Identifier, may contain `-` and `/` (`Bool/True`, `-check-id`, `-1`)
    Identifier(Symbol),
    /// Run of operator characters (`+`, `<=>`, `;`)
    Operator(Symbol),
    /// Unsigned integer literal
    IntLiteral(i64),
    /// String literal with escapes resolved
    StringLiteral(Symbol),
    /// Declaration directive `@Name(text)`
    Directive {
        /// Directive name (`Fails`)
        name: Symbol,
        /// Raw text between the parentheses
        text: String,
    },

    /// `(`
    LeftParen,
    /// `)`
    RightParen,
    /// `[`
    LeftBracket,
    /// `]`
    RightBracket,
    /// `{`
    LeftBrace,
    /// `}`
    RightBrace,
    /// `@[`
    ArrayOpen,
    /// `@any`
    AnyType,
    /// `.`
    Dot,
    /// `:`
    Colon,
    /// `'`
    Tick,
    /// `λ`
    Lambda,
    /// `=` on its own
    Equal,
    /// `|` on its own
    Pipe,

    /// End of input
    Eof,
}

impl Token {
    /// Check if this token could start an operand.
    pub fn starts_operand(&self) -> bool {
        matches!(
            self,
            Token::Identifier(_)
                | Token::IntLiteral(_)
                | Token::StringLiteral(_)
                | Token::LeftParen
                | Token::LeftBracket
                | Token::ArrayOpen
                | Token::AnyType
        )
    }

    /// Check if this token opens a trailing lambda.
    pub fn opens_lambda(&self) -> bool {
        matches!(self, Token::Lambda | Token::LeftBrace)
    }
}

/// Source location information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    /// Byte offset of the first character
    pub start: usize,
    /// Byte offset one past the last character
    pub end: usize,
    /// 1-based line
    pub line: u32,
    /// 1-based column
    pub column: u32,
}

impl Span {
    /// Create a new span.
    pub fn new(start: usize, end: usize, line: u32, column: u32) -> Self {
        Self {
            start,
            end,
            line,
            column,
        }
    }

    /// Length in bytes.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Check if the span covers no bytes.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Slice the covered text out of `source`.
    pub fn slice<'a>(&self, source: &'a str) -> &'a str {
        &source[self.start..self.end]
    }

    /// Smallest span covering both `self` and `other`.
    pub fn merge(&self, other: &Span) -> Span {
        let (line, column) = if self.start <= other.start {
            (self.line, self.column)
        } else {
            (other.line, other.column)
        };
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
            line,
            column,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Identifier(_) => write!(f, "identifier"),
            Token::Operator(_) => write!(f, "operator"),
            Token::IntLiteral(n) => write!(f, "{}", n),
            Token::StringLiteral(_) => write!(f, "string literal"),
            Token::Directive { .. } => write!(f, "directive"),
            Token::LeftParen => write!(f, "("),
            Token::RightParen => write!(f, ")"),
            Token::LeftBracket => write!(f, "["),
            Token::RightBracket => write!(f, "]"),
            Token::LeftBrace => write!(f, "{{"),
            Token::RightBrace => write!(f, "}}"),
            Token::ArrayOpen => write!(f, "@["),
            Token::AnyType => write!(f, "@any"),
            Token::Dot => write!(f, "."),
            Token::Colon => write!(f, ":"),
            Token::Tick => write!(f, "'"),
            Token::Lambda => write!(f, "λ"),
            Token::Equal => write!(f, "="),
            Token::Pipe => write!(f, "|"),
            Token::Eof => write!(f, "end of file"),
        }
    }
}
