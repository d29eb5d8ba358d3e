//! Lexer for meml source.
//!
//! Whitespace and `#` comments are skipped by a manual loop that tracks
//! line and column; every other token is recognised by logos.

use crate::parser::interner::Interner;
use crate::parser::token::{Span, Token};
use logos::Logos;

/// Logos-based token enum for lexing.
///
/// Converted to [`Token`] after lexing so that names can be interned.
#[derive(Logos, Debug, Clone, PartialEq)]
enum LogosToken {
    // Identifiers may carry `-` and `/` anywhere after the first character, and
    // may start with `-` when a letter or digit follows (`-1`, `-check-id`).
    #[regex(r"[A-Za-z_][A-Za-z0-9_\-/]*")]
    #[regex(r"-[A-Za-z0-9][A-Za-z0-9_\-/]*")]
    Identifier,

    #[regex(r"[!$%&*+\-/<=>?^~;,|]+")]
    Operator,

    #[regex(r"[0-9]+", parse_int)]
    IntLiteral(i64),

    #[regex(r#""([^"\\]|\\.)*""#, strip_quotes)]
    StringLiteral(String),

    // @Fails(error: `A' is not a subtype of `B')
    #[regex(r"@[A-Za-z][A-Za-z0-9_\-]*\([^)]*\)", parse_directive)]
    Directive((String, String)),

    #[token("@[")]
    ArrayOpen,

    #[token("@any")]
    AnyType,

    #[token("(")]
    LeftParen,

    #[token(")")]
    RightParen,

    #[token("[")]
    LeftBracket,

    #[token("]")]
    RightBracket,

    #[token("{")]
    LeftBrace,

    #[token("}")]
    RightBrace,

    #[token(".")]
    Dot,

    #[token(":")]
    Colon,

    #[token("'")]
    Tick,

    #[token("λ")]
    Lambda,
}

fn parse_int(lex: &mut logos::Lexer<'_, LogosToken>) -> Option<i64> {
    lex.slice().parse().ok()
}

fn strip_quotes(lex: &mut logos::Lexer<'_, LogosToken>) -> Option<String> {
    let s = lex.slice();
    Some(s[1..s.len() - 1].to_string())
}

fn parse_directive(lex: &mut logos::Lexer<'_, LogosToken>) -> Option<(String, String)> {
    let s = &lex.slice()[1..];
    let open = s.find('(')?;
    let name = s[..open].to_string();
    let text = s[open + 1..s.len() - 1].trim().to_string();
    Some((name, text))
}

fn unescape_string(s: &str) -> Result<String, String> {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            result.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => result.push('\n'),
            Some('t') => result.push('\t'),
            Some('r') => result.push('\r'),
            Some('0') => result.push('\0'),
            Some('\\') => result.push('\\'),
            Some('"') => result.push('"'),
            Some(other) => return Err(format!("\\{}", other)),
            None => return Err("\\".to_string()),
        }
    }

    Ok(result)
}

/// Main lexer structure.
pub struct Lexer<'a> {
    source: &'a str,
    tokens: Vec<(Token, Span)>,
    errors: Vec<LexError>,
    interner: &'a mut Interner,
}

/// Lexer error types.
#[derive(Debug, Clone, PartialEq)]
pub enum LexError {
    /// A character no token starts with
    UnexpectedCharacter {
        /// The offending character
        char: char,
        /// Location
        span: Span,
    },
    /// `"` without a closing quote
    UnterminatedString {
        /// Location of the opening quote
        span: Span,
    },
    /// `#{` without a closing `}`
    UnterminatedComment {
        /// Location of the opening `#{`
        span: Span,
    },
    /// Integer literal that does not fit in 64 bits
    InvalidNumber {
        /// Literal text
        text: String,
        /// Location
        span: Span,
    },
    /// Unknown `\` escape in a string literal
    InvalidEscape {
        /// The escape as written
        escape: String,
        /// Location of the literal
        span: Span,
    },
}

impl<'a> Lexer<'a> {
    /// Create a lexer that interns names into a session-wide interner.
    pub fn new(source: &'a str, interner: &'a mut Interner) -> Self {
        Self {
            source,
            tokens: Vec::new(),
            errors: Vec::new(),
            interner,
        }
    }

    /// Format all errors with source context
    pub fn format_errors(errors: &[LexError], source: &str) -> String {
        errors
            .iter()
            .map(|e| e.format_with_source(source))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Tokenize the whole source. The last token is always [`Token::Eof`].
    pub fn tokenize(mut self) -> Result<Vec<(Token, Span)>, Vec<LexError>> {
        let mut pos = 0;
        let mut line = 1u32;
        let mut column = 1u32;

        while pos < self.source.len() {
            let bytes = self.source.as_bytes();
            while pos < bytes.len() {
                match bytes[pos] {
                    b' ' | b'\t' | b'\r' => {
                        column += 1;
                        pos += 1;
                    }
                    b'\n' => {
                        line += 1;
                        column = 1;
                        pos += 1;
                    }
                    b'#' if bytes.get(pos + 1) == Some(&b'{') => {
                        let start = Span::new(pos, pos + 2, line, column);
                        let mut depth = 0usize;
                        let mut closed = false;
                        while pos < bytes.len() {
                            if bytes[pos] == b'#' && bytes.get(pos + 1) == Some(&b'{') {
                                depth += 1;
                                pos += 2;
                                column += 2;
                                continue;
                            }
                            if bytes[pos] == b'}' {
                                depth -= 1;
                                pos += 1;
                                column += 1;
                                if depth == 0 {
                                    closed = true;
                                    break;
                                }
                                continue;
                            }
                            if bytes[pos] == b'\n' {
                                line += 1;
                                column = 1;
                            } else if !is_continuation_byte(bytes[pos]) {
                                column += 1;
                            }
                            pos += 1;
                        }
                        if !closed {
                            self.errors.push(LexError::UnterminatedComment { span: start });
                        }
                    }
                    b'#' => {
                        while pos < bytes.len() && bytes[pos] != b'\n' {
                            if !is_continuation_byte(bytes[pos]) {
                                column += 1;
                            }
                            pos += 1;
                        }
                    }
                    _ => break,
                }
            }

            if pos >= self.source.len() {
                break;
            }

            let mut logos_lexer = LogosToken::lexer(&self.source[pos..]);

            let Some(token_result) = logos_lexer.next() else {
                break;
            };
            let range = logos_lexer.span();
            let abs_start = pos + range.start;
            let abs_end = pos + range.end;
            let span = Span::new(abs_start, abs_end, line, column);

            match token_result {
                Ok(logos_token) => {
                    if let Some(token) = self.convert_token(logos_token, span) {
                        self.tokens.push((token, span));
                    }
                }
                Err(()) => {
                    let text = &self.source[abs_start..abs_end];
                    let char = text.chars().next().unwrap_or('\0');
                    let error = if char == '"' {
                        LexError::UnterminatedString { span }
                    } else if char.is_ascii_digit() {
                        LexError::InvalidNumber {
                            text: text.to_string(),
                            span,
                        }
                    } else {
                        LexError::UnexpectedCharacter { char, span }
                    };
                    self.errors.push(error);
                }
            }

            for c in self.source[abs_start..abs_end].chars() {
                if c == '\n' {
                    line += 1;
                    column = 1;
                } else {
                    column += 1;
                }
            }

            pos = abs_end;
        }

        let eof_span = Span::new(self.source.len(), self.source.len(), line, column);
        self.tokens.push((Token::Eof, eof_span));

        if self.errors.is_empty() {
            Ok(self.tokens)
        } else {
            Err(self.errors)
        }
    }

    fn convert_token(&mut self, logos_token: LogosToken, span: Span) -> Option<Token> {
        let token = match logos_token {
            LogosToken::Identifier => Token::Identifier(self.interner.intern(span.slice(self.source))),
            LogosToken::Operator => match span.slice(self.source) {
                "=" => Token::Equal,
                "|" => Token::Pipe,
                op => Token::Operator(self.interner.intern(op)),
            },
            LogosToken::IntLiteral(n) => Token::IntLiteral(n),
            LogosToken::StringLiteral(raw) => match unescape_string(&raw) {
                Ok(s) => Token::StringLiteral(self.interner.intern(&s)),
                Err(escape) => {
                    self.errors.push(LexError::InvalidEscape { escape, span });
                    return None;
                }
            },
            LogosToken::Directive((name, text)) => Token::Directive {
                name: self.interner.intern(&name),
                text,
            },
            LogosToken::ArrayOpen => Token::ArrayOpen,
            LogosToken::AnyType => Token::AnyType,
            LogosToken::LeftParen => Token::LeftParen,
            LogosToken::RightParen => Token::RightParen,
            LogosToken::LeftBracket => Token::LeftBracket,
            LogosToken::RightBracket => Token::RightBracket,
            LogosToken::LeftBrace => Token::LeftBrace,
            LogosToken::RightBrace => Token::RightBrace,
            LogosToken::Dot => Token::Dot,
            LogosToken::Colon => Token::Colon,
            LogosToken::Tick => Token::Tick,
            LogosToken::Lambda => Token::Lambda,
        };
        Some(token)
    }
}

fn is_continuation_byte(b: u8) -> bool {
    (b & 0xC0) == 0x80
}

impl LexError {
    /// Get the span of this error
    pub fn span(&self) -> &Span {
        match self {
            LexError::UnexpectedCharacter { span, .. }
            | LexError::UnterminatedString { span }
            | LexError::UnterminatedComment { span }
            | LexError::InvalidNumber { span, .. }
            | LexError::InvalidEscape { span, .. } => span,
        }
    }

    /// Get a description of this error
    pub fn description(&self) -> String {
        match self {
            LexError::UnexpectedCharacter { char, .. } => {
                format!("Unexpected character '{}'", char)
            }
            LexError::UnterminatedString { .. } => "Unterminated string literal".to_string(),
            LexError::UnterminatedComment { .. } => "Unterminated block comment".to_string(),
            LexError::InvalidNumber { text, .. } => format!("Invalid number '{}'", text),
            LexError::InvalidEscape { escape, .. } => {
                format!("Invalid escape sequence '{}'", escape)
            }
        }
    }

    /// Get a hint for fixing this error
    pub fn hint(&self) -> Option<String> {
        match self {
            LexError::UnterminatedString { .. } => {
                Some("Add a closing quote to terminate the string".to_string())
            }
            LexError::UnterminatedComment { .. } => {
                Some("Close the comment with a matching `}`".to_string())
            }
            LexError::InvalidEscape { .. } => {
                Some("Valid escape sequences are: \\n \\r \\t \\0 \\\\ \\\"".to_string())
            }
            _ => None,
        }
    }

    /// Format the error with source context
    pub fn format_with_source(&self, source: &str) -> String {
        let span = self.span();
        let mut result = format!(
            "Error at {}:{}: {}\n",
            span.line,
            span.column,
            self.description()
        );

        if let Some(error_line) = source.lines().nth((span.line - 1) as usize) {
            result.push_str("  |\n");
            result.push_str(&format!("{:3} | {}\n", span.line, error_line));
            result.push_str(&format!(
                "  | {}^\n",
                " ".repeat(span.column.saturating_sub(1) as usize)
            ));
        }

        if let Some(hint) = self.hint() {
            result.push_str(&format!("\nHint: {}\n", hint));
        }

        result
    }
}

impl std::fmt::Display for LexError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} at {}:{}",
            self.description(),
            self.span().line,
            self.span().column
        )
    }
}

impl std::error::Error for LexError {}
