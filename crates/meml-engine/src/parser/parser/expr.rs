//! Expression parsing
//!
//! Operands are literals, names, `@[...]` arrays, `(...)` tuples, `[A]B`
//! arrow types, `@any` and `native "name"(...)` escapes, each followed by any
//! number of calls, method calls and trailing lambdas. Operands are joined by
//! declared infix operators using precedence climbing.

use super::{ParseError, Parser};
use crate::parser::ast::{Callee, Expr, ExprKind, Lambda};
use crate::parser::interner::Symbol;
use crate::parser::operators::{Associativity, OperatorEntry, OperatorTarget};
use crate::parser::token::{Span, Token};
use crate::stack;
use std::cmp::Ordering;
use std::rc::Rc;

/// Parse an expression.
pub fn parse_expression(parser: &mut Parser<'_>) -> Result<Expr, ParseError> {
    parse_climb(parser, None)
}

/// Parse operands and operators binding tighter than `context`, the operator
/// whose right operand is being parsed.
fn parse_climb(
    parser: &mut Parser<'_>,
    context: Option<OperatorEntry>,
) -> Result<Expr, ParseError> {
    parser.enter()?;
    let result = stack::grow(|| climb(parser, context));
    parser.leave();
    result
}

fn climb(parser: &mut Parser<'_>, context: Option<OperatorEntry>) -> Result<Expr, ParseError> {
    let mut lhs = parse_operand(parser)?;

    while let Some((op, op_span)) = peek_operator(parser)? {
        if let Some(outer) = context {
            match op.precedence.cmp(&outer.precedence) {
                Ordering::Less => break,
                Ordering::Equal => {
                    if op.associativity != outer.associativity {
                        return Err(ParseError::associativity_conflict(
                            (parser.text(outer.symbol), outer.associativity),
                            (parser.text(op.symbol), op.associativity),
                            op_span,
                        ));
                    }
                    match op.associativity {
                        Associativity::None => {
                            return Err(ParseError::non_associative(parser.text(op.symbol), op_span))
                        }
                        Associativity::Left => break,
                        Associativity::Right => {}
                    }
                }
                Ordering::Greater => {}
            }
        }

        parser.advance();
        let rhs = parse_climb(parser, Some(op))?;
        lhs = desugar_infix(op, lhs, rhs, op_span);
    }

    Ok(lhs)
}

/// The declared operator at the current position, if any.
///
/// An operator-character token that was never declared is an error rather
/// than the end of the expression; an identifier only counts when it was
/// declared as a word operator.
fn peek_operator(parser: &Parser<'_>) -> Result<Option<(OperatorEntry, Span)>, ParseError> {
    let span = parser.current_span();
    match parser.current() {
        Token::Operator(sym) => match parser.operators.lookup(*sym) {
            Some(entry) => Ok(Some((*entry, span))),
            None => Err(ParseError::unknown_operator(parser.text(*sym), span)),
        },
        Token::Identifier(sym) => Ok(parser.operators.lookup(*sym).map(|entry| (*entry, span))),
        _ => Ok(None),
    }
}

/// `a SYM b` becomes `target(a b)` or `a.target(b)`.
fn desugar_infix(op: OperatorEntry, lhs: Expr, rhs: Expr, op_span: Span) -> Expr {
    let span = lhs.span.merge(&rhs.span);
    match op.target {
        OperatorTarget::Function(target) => {
            Expr::call(Expr::new(ExprKind::Var(target), op_span), vec![lhs, rhs], span)
        }
        OperatorTarget::Method(name) => Expr::method_call(lhs, name, vec![rhs], span),
    }
}

/// Parse one operand with its postfix calls.
pub fn parse_operand(parser: &mut Parser<'_>) -> Result<Expr, ParseError> {
    let start = parser.current_span();
    let expr = match parser.current().clone() {
        Token::IntLiteral(n) => {
            parser.advance();
            Expr::new(ExprKind::Int(n), start)
        }
        Token::StringLiteral(s) => {
            parser.advance();
            Expr::new(ExprKind::Str(s), start)
        }
        Token::AnyType => {
            parser.advance();
            return Ok(Expr::new(ExprKind::Any, start));
        }
        Token::LeftBracket => return parse_arrow(parser),
        Token::ArrayOpen => parse_array(parser)?,
        Token::LeftParen => parse_tuple(parser)?,
        Token::Identifier(sym)
            if sym == parser.keywords.native
                && matches!(parser.peek_nth(1), Token::StringLiteral(_)) =>
        {
            parse_native(parser)?
        }
        Token::Identifier(sym) => {
            parser.advance();
            Expr::new(ExprKind::Var(sym), start)
        }
        Token::Eof => return Err(parser.unexpected_token(vec![])),
        Token::Operator(sym) if parser.operators.lookup(sym).is_none() => {
            return Err(ParseError::unknown_operator(parser.text(sym), start))
        }
        other => {
            return Err(ParseError::invalid_syntax(
                format!("expected an expression, found {}", other),
                start,
            ))
        }
    };
    parse_postfix(parser, expr)
}

/// Calls, method calls and trailing lambdas after an operand.
fn parse_postfix(parser: &mut Parser<'_>, mut expr: Expr) -> Result<Expr, ParseError> {
    loop {
        let mut method = None;
        if parser.check(&Token::Dot) {
            parser.advance();
            let (name, _) = parser.expect_identifier()?;
            method = Some(name);
        }

        let opens_call = parser.check(&Token::LeftParen) || parser.current().opens_lambda();
        if !opens_call {
            if method.is_some() {
                return Err(ParseError::invalid_syntax(
                    "missing arguments after method name",
                    parser.current_span(),
                )
                .with_suggestion("call it with `()`"));
            }
            return Ok(expr);
        }

        let mut args = Vec::new();
        if parser.eat(&Token::LeftParen) {
            while !parser.eat(&Token::RightParen) {
                if parser.at_eof() {
                    return Err(parser.unexpected_token(vec![Token::RightParen]));
                }
                args.push(parse_expression(parser)?);
            }
        }

        let mut lambdas = Vec::new();
        while parser.current().opens_lambda() {
            lambdas.push(parse_lambda(parser)?);
        }

        let span = expr.span.merge(&parser.previous_span());
        let callee = match method {
            Some(name) => Callee::Method {
                receiver: Box::new(expr),
                name,
            },
            None => Callee::Function(Box::new(expr)),
        };
        expr = Expr::new(
            ExprKind::Call {
                callee,
                args,
                lambdas,
            },
            span,
        );
    }
}

/// `λ x y. body` or `{ x y. body }`
fn parse_lambda(parser: &mut Parser<'_>) -> Result<Lambda, ParseError> {
    let start = parser.current_span();
    let braced = parser.check(&Token::LeftBrace);
    parser.advance();

    let mut params = Vec::new();
    while !parser.eat(&Token::Dot) {
        params.push(parse_binder(parser)?.0);
    }

    let body = parse_expression(parser)?;
    if braced {
        parser.expect(Token::RightBrace)?;
    }

    Ok(Lambda {
        params,
        body: Rc::new(body),
        span: start.merge(&parser.previous_span()),
    })
}

/// A bound name: an identifier, or `-` for a value that is ignored.
pub(crate) fn parse_binder(parser: &mut Parser<'_>) -> Result<(Symbol, Span), ParseError> {
    let span = parser.current_span();
    match parser.current() {
        Token::Identifier(sym) => {
            let sym = *sym;
            parser.advance();
            Ok((sym, span))
        }
        Token::Operator(sym) if parser.interner.resolve(*sym) == "-" => {
            let sym = *sym;
            parser.advance();
            Ok((sym, span))
        }
        _ => Err(parser
            .unexpected_token(vec![])
            .with_suggestion("expected a name or `-`")),
    }
}

/// `@[a b c]`
fn parse_array(parser: &mut Parser<'_>) -> Result<Expr, ParseError> {
    let start = parser.expect(Token::ArrayOpen)?;
    let mut elements = Vec::new();
    while !parser.eat(&Token::RightBracket) {
        if parser.at_eof() {
            return Err(parser.unexpected_token(vec![Token::RightBracket]));
        }
        elements.push(parse_expression(parser)?);
    }
    Ok(Expr::new(
        ExprKind::Array(elements),
        start.merge(&parser.previous_span()),
    ))
}

/// `(a)` is `a`; `(a b c)` is `Pair/New(a Pair/New(b c))`.
fn parse_tuple(parser: &mut Parser<'_>) -> Result<Expr, ParseError> {
    let start = parser.expect(Token::LeftParen)?;
    let mut members = Vec::new();
    while !parser.eat(&Token::RightParen) {
        if parser.at_eof() {
            return Err(parser.unexpected_token(vec![Token::RightParen]));
        }
        members.push(parse_expression(parser)?);
    }
    let span = start.merge(&parser.previous_span());

    let Some(mut acc) = members.pop() else {
        return Err(ParseError::invalid_syntax("empty parentheses", span)
            .with_suggestion("a tuple needs at least one member"));
    };
    let pair_new = parser.keywords.pair_new;
    while let Some(member) = members.pop() {
        let callee = Expr::new(ExprKind::Var(pair_new), span);
        acc = Expr::call(callee, vec![member, acc], span);
    }
    Ok(acc)
}

/// `[A B]C`
fn parse_arrow(parser: &mut Parser<'_>) -> Result<Expr, ParseError> {
    let start = parser.expect(Token::LeftBracket)?;
    let mut domain = Vec::new();
    while !parser.eat(&Token::RightBracket) {
        if parser.at_eof() {
            return Err(parser.unexpected_token(vec![Token::RightBracket]));
        }
        domain.push(parse_expression(parser)?);
    }
    let codomain = parse_expression(parser)?;
    let span = start.merge(&codomain.span);
    Ok(Expr::new(
        ExprKind::Arrow {
            domain,
            codomain: Box::new(codomain),
        },
        span,
    ))
}

/// `native "name"(args)`
fn parse_native(parser: &mut Parser<'_>) -> Result<Expr, ParseError> {
    let start = parser.current_span();
    parser.advance();
    let name = match parser.advance() {
        Token::StringLiteral(name) => name,
        _ => return Err(ParseError::invalid_syntax("expected primitive name", start)),
    };
    parser.expect(Token::LeftParen)?;
    let mut args = Vec::new();
    while !parser.eat(&Token::RightParen) {
        if parser.at_eof() {
            return Err(parser.unexpected_token(vec![Token::RightParen]));
        }
        args.push(parse_expression(parser)?);
    }
    Ok(Expr::new(
        ExprKind::Native { name, args },
        start.merge(&parser.previous_span()),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::interner::Interner;
    use crate::parser::operators::{OperatorTable, Precedence};
    use crate::parser::parser::ParseErrorKind;

    fn declare(
        interner: &mut Interner,
        table: &mut OperatorTable,
        text: &str,
        level: f64,
        associativity: Associativity,
        target: &str,
    ) {
        let entry = OperatorEntry {
            symbol: interner.intern(text),
            precedence: Precedence::new(level).unwrap(),
            associativity,
            target: OperatorTarget::Function(interner.intern(target)),
        };
        table.declare(entry, text).unwrap();
    }

    /// Render an expression as fully parenthesised calls.
    fn show(interner: &Interner, expr: &Expr) -> String {
        match &expr.kind {
            ExprKind::Int(n) => n.to_string(),
            ExprKind::Str(s) => format!("{:?}", interner.resolve(*s)),
            ExprKind::Var(v) => interner.resolve(*v).to_string(),
            ExprKind::Any => "@any".to_string(),
            ExprKind::Array(xs) => format!(
                "@[{}]",
                xs.iter().map(|x| show(interner, x)).collect::<Vec<_>>().join(" ")
            ),
            ExprKind::Arrow { domain, codomain } => format!(
                "[{}]{}",
                domain.iter().map(|x| show(interner, x)).collect::<Vec<_>>().join(" "),
                show(interner, codomain)
            ),
            ExprKind::Native { name, args } => format!(
                "native {:?}({})",
                interner.resolve(*name),
                args.iter().map(|x| show(interner, x)).collect::<Vec<_>>().join(" ")
            ),
            ExprKind::Call {
                callee,
                args,
                lambdas,
            } => {
                let head = match callee {
                    Callee::Function(f) => show(interner, f),
                    Callee::Method { receiver, name } => {
                        format!("{}.{}", show(interner, receiver), interner.resolve(*name))
                    }
                };
                let mut out = format!(
                    "{}({})",
                    head,
                    args.iter().map(|x| show(interner, x)).collect::<Vec<_>>().join(" ")
                );
                for lambda in lambdas {
                    let params: Vec<&str> =
                        lambda.params.iter().map(|p| interner.resolve(*p)).collect();
                    out.push_str(&format!(
                        " {{ {}. {} }}",
                        params.join(" "),
                        show(interner, &lambda.body)
                    ));
                }
                out
            }
        }
    }

    fn parse_with(
        source: &str,
        setup: impl FnOnce(&mut Interner, &mut OperatorTable),
    ) -> Result<String, ParseError> {
        let mut interner = Interner::new();
        let mut table = OperatorTable::new();
        setup(&mut interner, &mut table);
        let expr = Parser::new(source, &mut interner, &mut table)
            .unwrap()
            .parse_standalone_expression()?;
        Ok(show(&interner, &expr))
    }

    fn arithmetic(interner: &mut Interner, table: &mut OperatorTable) {
        declare(interner, table, "*", 100.0, Associativity::Left, "mul");
        declare(interner, table, "+", 75.0, Associativity::Left, "add");
        declare(interner, table, "-", 75.0, Associativity::Left, "sub");
        declare(interner, table, "==", 50.0, Associativity::None, "eq");
        declare(interner, table, "^", 110.0, Associativity::Right, "pow");
        declare(interner, table, "as", 0.0, Associativity::Right, "let");
    }

    #[test]
    fn test_precedence_levels() {
        let out = parse_with("1 + 2 * 3", arithmetic).unwrap();
        assert_eq!(out, "add(1 mul(2 3))");
        let out = parse_with("1 * 2 + 3", arithmetic).unwrap();
        assert_eq!(out, "add(mul(1 2) 3)");
    }

    #[test]
    fn test_left_and_right_grouping() {
        assert_eq!(parse_with("1 - 2 + 3", arithmetic).unwrap(), "add(sub(1 2) 3)");
        assert_eq!(parse_with("1 ^ 2 ^ 3", arithmetic).unwrap(), "pow(1 pow(2 3))");
    }

    #[test]
    fn test_non_associative_chain_is_error() {
        let err = parse_with("1 == 2 == 3", arithmetic).unwrap_err();
        assert!(matches!(err.kind, ParseErrorKind::NonAssociative { .. }));
        assert_eq!(parse_with("1 + 1 == 2", arithmetic).unwrap(), "eq(add(1 1) 2)");
    }

    #[test]
    fn test_associativity_conflict_is_error() {
        let err = parse_with("1 + 2 ~ 3", |interner, table| {
            arithmetic(interner, table);
            declare(interner, table, "~", 75.0, Associativity::Right, "tilde");
        })
        .unwrap_err();
        assert!(matches!(err.kind, ParseErrorKind::AssociativityConflict { .. }));
    }

    #[test]
    fn test_unknown_operator() {
        let err = parse_with("1 ~ 2", arithmetic).unwrap_err();
        assert_eq!(
            err.kind,
            ParseErrorKind::UnknownOperator {
                symbol: "~".to_string()
            }
        );
    }

    #[test]
    fn test_unknown_operator_in_operand_position() {
        let err = parse_with("~ 1", arithmetic).unwrap_err();
        assert_eq!(
            err.kind,
            ParseErrorKind::UnknownOperator {
                symbol: "~".to_string()
            }
        );

        // Declared, but there is no prefix form.
        let err = parse_with("+ 1", arithmetic).unwrap_err();
        assert!(matches!(err.kind, ParseErrorKind::InvalidSyntax { .. }));
    }

    #[test]
    fn test_word_operator() {
        let out = parse_with("x as f", arithmetic).unwrap();
        assert_eq!(out, "let(x f)");
    }

    #[test]
    fn test_method_operator_target() {
        let out = parse_with("1 <=> 2", |interner, table| {
            let entry = OperatorEntry {
                symbol: interner.intern("<=>"),
                precedence: Precedence::new(60.0).unwrap(),
                associativity: Associativity::None,
                target: OperatorTarget::Method(interner.intern("cmp")),
            };
            table.declare(entry, "<=>").unwrap();
        })
        .unwrap();
        assert_eq!(out, "1.cmp(2)");
    }

    #[test]
    fn test_tuple_elaboration() {
        assert_eq!(
            parse_with("(1 \"\" x)", |_, _| {}).unwrap(),
            "Pair/New(1 Pair/New(\"\" x))"
        );
        assert_eq!(parse_with("(((1)))", |_, _| {}).unwrap(), "1");
        let err = parse_with("()", |_, _| {}).unwrap_err();
        assert!(matches!(err.kind, ParseErrorKind::InvalidSyntax { .. }));
    }

    #[test]
    fn test_calls_methods_and_trailing_lambdas() {
        let out = parse_with("Bool/elim(b) { . x } { . y }", |_, _| {}).unwrap();
        assert_eq!(out, "Bool/elim(b) { . x } { . y }");

        let out = parse_with("xs.init().map λ init. (init y)", |_, _| {}).unwrap();
        assert_eq!(out, "xs.init().map() { init. Pair/New(init y) }");

        let out = parse_with("let(write(a)) λ-. b", |_, _| {}).unwrap();
        assert_eq!(out, "let(write(a)) { -. b }");
    }

    #[test]
    fn test_types_as_expressions() {
        let out = parse_with("[Option(Int) []String [Int]String] String", |_, _| {}).unwrap();
        assert_eq!(out, "[Option(Int) []String [Int]String]String");
        assert_eq!(parse_with("@[Int String]", |_, _| {}).unwrap(), "@[Int String]");
        assert_eq!(parse_with("@any", |_, _| {}).unwrap(), "@any");
    }

    #[test]
    fn test_native_escape() {
        let out = parse_with("native \"int-add\"(x y)", |_, _| {}).unwrap();
        assert_eq!(out, "native \"int-add\"(x y)");
    }

    #[test]
    fn test_method_without_arguments_is_error() {
        let err = parse_with("x.name", |_, _| {}).unwrap_err();
        assert!(matches!(err.kind, ParseErrorKind::InvalidSyntax { .. }));
    }

    #[test]
    fn test_depth_limit() {
        let mut interner = Interner::new();
        let mut table = OperatorTable::new();
        let source = format!("{}1{}", "(".repeat(40), ")".repeat(40));
        let err = Parser::new(&source, &mut interner, &mut table)
            .unwrap()
            .with_max_depth(16)
            .parse_standalone_expression()
            .unwrap_err();
        assert!(matches!(err.kind, ParseErrorKind::ParserLimitExceeded { .. }));
    }
}
