//! Recursive-descent parser for meml.
//!
//! Infix expressions are parsed by precedence climbing over the session's
//! [`OperatorTable`]. `infix` items are entered into the table the moment they
//! are parsed, so an operator is usable exactly from the next item onwards.

mod error;
pub mod expr;
pub mod item;

pub use error::{ParseError, ParseErrorKind};

use crate::parser::ast::Item;
use crate::parser::interner::{Interner, Symbol};
use crate::parser::lexer::{LexError, Lexer};
use crate::parser::operators::OperatorTable;
use crate::parser::token::{Span, Token};

/// Default nesting limit for expressions.
pub const MAX_PARSE_DEPTH: usize = 256;

/// Contextual keywords and fixed names, interned once per parser.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Keywords {
    pub class: Symbol,
    pub end: Symbol,
    pub let_: Symbol,
    pub fun: Symbol,
    pub infix: Symbol,
    pub left: Symbol,
    pub right: Symbol,
    pub at: Symbol,
    pub native: Symbol,
    pub fails: Symbol,
    pub pair_new: Symbol,
}

impl Keywords {
    fn new(interner: &mut Interner) -> Self {
        Self {
            class: interner.intern("class"),
            end: interner.intern("end"),
            let_: interner.intern("let"),
            fun: interner.intern("fun"),
            infix: interner.intern("infix"),
            left: interner.intern("left"),
            right: interner.intern("right"),
            at: interner.intern("at"),
            native: interner.intern("native"),
            fails: interner.intern("Fails"),
            pair_new: interner.intern("Pair/New"),
        }
    }
}

/// Parser state.
pub struct Parser<'a> {
    source: &'a str,
    tokens: Vec<(Token, Span)>,
    pos: usize,
    pub(crate) depth: usize,
    pub(crate) max_depth: usize,
    pub(crate) interner: &'a mut Interner,
    pub(crate) operators: &'a mut OperatorTable,
    pub(crate) keywords: Keywords,
}

impl<'a> Parser<'a> {
    /// Lex `source` and prepare to parse it.
    pub fn new(
        source: &'a str,
        interner: &'a mut Interner,
        operators: &'a mut OperatorTable,
    ) -> Result<Self, Vec<LexError>> {
        let tokens = Lexer::new(source, &mut *interner).tokenize()?;
        let keywords = Keywords::new(interner);
        Ok(Self {
            source,
            tokens,
            pos: 0,
            depth: 0,
            max_depth: MAX_PARSE_DEPTH,
            interner,
            operators,
            keywords,
        })
    }

    /// Override the expression nesting limit.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Parse every item. Stops at the first error.
    pub fn parse(mut self) -> Result<Vec<Item>, ParseError> {
        let mut items = Vec::new();
        while !self.at_eof() {
            items.push(item::parse_item(&mut self)?);
        }
        Ok(items)
    }

    /// Parse a single expression spanning the whole input.
    pub fn parse_standalone_expression(mut self) -> Result<crate::parser::ast::Expr, ParseError> {
        let expr = expr::parse_expression(&mut self)?;
        if !self.at_eof() {
            return Err(self.unexpected_token(vec![Token::Eof]));
        }
        Ok(expr)
    }

    // ========================================================================
    // Token navigation
    // ========================================================================

    /// Get the current token
    pub(crate) fn current(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)].0
    }

    /// Get the current token's span
    pub(crate) fn current_span(&self) -> Span {
        self.tokens[self.pos.min(self.tokens.len() - 1)].1
    }

    /// Look ahead `n` tokens
    pub(crate) fn peek_nth(&self, n: usize) -> &Token {
        let index = (self.pos + n).min(self.tokens.len() - 1);
        &self.tokens[index].0
    }

    /// Span of the most recently consumed token
    pub(crate) fn previous_span(&self) -> Span {
        if self.pos == 0 {
            self.current_span()
        } else {
            self.tokens[(self.pos - 1).min(self.tokens.len() - 1)].1
        }
    }

    /// Advance to the next token and return the consumed one
    pub(crate) fn advance(&mut self) -> Token {
        let token = self.current().clone();
        if !self.at_eof() {
            self.pos += 1;
        }
        token
    }

    /// Check if the current token has the same kind as `token`
    pub(crate) fn check(&self, token: &Token) -> bool {
        std::mem::discriminant(self.current()) == std::mem::discriminant(token)
    }

    /// Check if at end of file
    pub(crate) fn at_eof(&self) -> bool {
        matches!(self.current(), Token::Eof)
    }

    /// Check whether the current token is the identifier `word`
    pub(crate) fn check_word(&self, word: Symbol) -> bool {
        matches!(self.current(), Token::Identifier(sym) if *sym == word)
    }

    /// Consume the identifier `word` if it is next
    pub(crate) fn eat_word(&mut self, word: Symbol) -> bool {
        if self.check_word(word) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Consume `token` if it is next
    pub(crate) fn eat(&mut self, token: &Token) -> bool {
        if self.check(token) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Expect a specific token kind and consume it
    pub(crate) fn expect(&mut self, token: Token) -> Result<Span, ParseError> {
        if self.check(&token) {
            let span = self.current_span();
            self.advance();
            Ok(span)
        } else {
            Err(self.unexpected_token(vec![token]))
        }
    }

    /// Expect the contextual keyword `word`
    pub(crate) fn expect_word(&mut self, word: Symbol) -> Result<Span, ParseError> {
        if self.check_word(word) {
            let span = self.current_span();
            self.advance();
            Ok(span)
        } else {
            let found = self.current().clone();
            let text = self.interner.resolve(word).to_string();
            Err(ParseError::unexpected_token(vec![], found, self.current_span())
                .with_suggestion(format!("expected `{}'", text)))
        }
    }

    /// Expect an identifier and return its symbol
    pub(crate) fn expect_identifier(&mut self) -> Result<(Symbol, Span), ParseError> {
        match self.current() {
            Token::Identifier(sym) => {
                let sym = *sym;
                let span = self.current_span();
                self.advance();
                Ok((sym, span))
            }
            _ => Err(self.unexpected_token(vec![Token::Identifier(self.keywords.end)])),
        }
    }

    /// Build an "unexpected token" error at the current position
    pub(crate) fn unexpected_token(&self, expected: Vec<Token>) -> ParseError {
        let span = self.current_span();
        if self.at_eof() {
            ParseError::unexpected_eof(expected, span)
        } else {
            ParseError::unexpected_token(expected, self.current().clone(), span)
        }
    }

    /// Resolve a symbol for error messages
    pub(crate) fn text(&self, sym: Symbol) -> String {
        self.interner.resolve(sym).to_string()
    }

    /// The source text
    pub(crate) fn source(&self) -> &'a str {
        self.source
    }

    // ========================================================================
    // Depth guard
    // ========================================================================

    /// Enter one level of expression nesting
    pub(crate) fn enter(&mut self) -> Result<(), ParseError> {
        self.depth += 1;
        if self.depth > self.max_depth {
            return Err(ParseError::parser_limit_exceeded(
                format!("expression nesting deeper than {}", self.max_depth),
                self.current_span(),
            ));
        }
        Ok(())
    }

    /// Leave one level of expression nesting
    pub(crate) fn leave(&mut self) {
        self.depth -= 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_source_parses() {
        let mut interner = Interner::new();
        let mut operators = OperatorTable::new();
        let items = Parser::new("# nothing here\n", &mut interner, &mut operators)
            .unwrap()
            .parse()
            .unwrap();
        assert!(items.is_empty());
    }

    #[test]
    fn test_lex_errors_surface_from_new() {
        let mut interner = Interner::new();
        let mut operators = OperatorTable::new();
        let result = Parser::new("let x: Int = `", &mut interner, &mut operators);
        assert!(result.is_err());
    }
}
