//! Item parsing: `class`, `let`, `fun` and `infix` declarations.

use super::expr::{parse_binder, parse_expression};
use super::{ParseError, Parser};
use crate::parser::ast::{
    ClassDecl, ConstructorDecl, Directive, FunDecl, InfixDecl, Item, ItemKind, LetDecl, Param,
};
use crate::parser::interner::Symbol;
use crate::parser::operators::{
    Associativity, OperatorEntry, OperatorError, OperatorTarget, Precedence,
};
use crate::parser::token::Token;
use std::rc::Rc;

/// Parse one item, including a directive written before it.
pub fn parse_item(parser: &mut Parser<'_>) -> Result<Item, ParseError> {
    let directive = parse_directive(parser)?;
    let start = parser.current_span();
    let keywords = parser.keywords;

    let kind = if parser.eat_word(keywords.class) {
        ItemKind::Class(parse_class(parser)?)
    } else if parser.eat_word(keywords.let_) {
        ItemKind::Let(parse_let(parser)?)
    } else if parser.eat_word(keywords.fun) {
        ItemKind::Fun(parse_fun(parser)?)
    } else if parser.eat_word(keywords.infix) {
        ItemKind::Infix(parse_infix(parser)?)
    } else {
        return Err(parser
            .unexpected_token(vec![])
            .with_suggestion("expected `class`, `let`, `fun` or `infix`"));
    };

    if let Some(directive) = &directive {
        if !matches!(kind, ItemKind::Let(_) | ItemKind::Fun(_)) {
            return Err(ParseError::invalid_directive(
                parser.text(directive.name),
                "can only precede `let` or `fun`",
                directive.span,
            ));
        }
    }

    Ok(Item {
        kind,
        directive,
        span: start.merge(&parser.previous_span()),
    })
}

fn parse_directive(parser: &mut Parser<'_>) -> Result<Option<Directive>, ParseError> {
    let span = parser.current_span();
    let Token::Directive { name, text } = parser.current().clone() else {
        return Ok(None);
    };
    parser.advance();
    if name != parser.keywords.fails {
        return Err(ParseError::invalid_directive(
            parser.text(name),
            "is not supported",
            span,
        )
        .with_suggestion("the only directive is `@Fails(error: message)`"));
    }
    Ok(Some(Directive { name, text, span }))
}

/// `class Name 'A 'B | Ctor(T1 T2) ... end`
fn parse_class(parser: &mut Parser<'_>) -> Result<ClassDecl, ParseError> {
    let (name, _) = parser.expect_identifier()?;
    let generics = parse_generics(parser)?;

    let mut constructors = Vec::new();
    let end = parser.keywords.end;
    while !parser.eat_word(end) {
        let start = parser.expect(Token::Pipe)?;
        let (ctor, _) = parser.expect_identifier()?;
        parser.expect(Token::LeftParen)?;
        let mut fields = Vec::new();
        while !parser.eat(&Token::RightParen) {
            if parser.at_eof() {
                return Err(parser.unexpected_token(vec![Token::RightParen]));
            }
            fields.push(parse_expression(parser)?);
        }
        constructors.push(ConstructorDecl {
            name: ctor,
            fields,
            span: start.merge(&parser.previous_span()),
        });
    }

    Ok(ClassDecl {
        name,
        generics,
        constructors,
    })
}

/// `let name: T = e`
fn parse_let(parser: &mut Parser<'_>) -> Result<LetDecl, ParseError> {
    let (name, _) = parser.expect_identifier()?;
    parser.expect(Token::Colon)?;
    let annotation = parse_expression(parser)?;
    parser.expect(Token::Equal)?;
    let value = parse_expression(parser)?;
    Ok(LetDecl {
        name,
        annotation,
        value: Rc::new(value),
    })
}

/// `fun name('A x:A): R = e` and `fun .name(self:C): R = e`
fn parse_fun(parser: &mut Parser<'_>) -> Result<FunDecl, ParseError> {
    let is_method = parser.eat(&Token::Dot);
    let (name, name_span) = parser.expect_identifier()?;
    parser.expect(Token::LeftParen)?;
    let generics = parse_generics(parser)?;

    let mut params = Vec::new();
    while !parser.eat(&Token::RightParen) {
        let (param, span) = parse_binder(parser)?;
        parser.expect(Token::Colon)?;
        let annotation = parse_expression(parser)?;
        params.push(Param {
            name: param,
            span: span.merge(&annotation.span),
            annotation,
        });
    }
    if is_method && params.is_empty() {
        return Err(ParseError::invalid_syntax(
            "a method needs a receiver parameter",
            name_span,
        ));
    }

    parser.expect(Token::Colon)?;
    let return_type = parse_expression(parser)?;
    parser.expect(Token::Equal)?;
    let body = parse_expression(parser)?;

    Ok(FunDecl {
        name,
        is_method,
        generics,
        params,
        return_type,
        body: Rc::new(body),
    })
}

/// `'A 'B ...`
fn parse_generics(parser: &mut Parser<'_>) -> Result<Vec<Symbol>, ParseError> {
    let mut generics = Vec::new();
    while parser.eat(&Token::Tick) {
        generics.push(parser.expect_identifier()?.0);
    }
    Ok(generics)
}

/// `infix [left|right] at <precedence> "SYM" = "target"`
///
/// The operator is entered into the table here, so it is visible to every
/// item parsed after this one.
fn parse_infix(parser: &mut Parser<'_>) -> Result<InfixDecl, ParseError> {
    let keywords = parser.keywords;
    let associativity = if parser.eat_word(keywords.left) {
        Associativity::Left
    } else if parser.eat_word(keywords.right) {
        Associativity::Right
    } else {
        Associativity::None
    };
    parser.expect_word(keywords.at)?;
    let precedence = parse_precedence(parser)?;

    let symbol_span = parser.current_span();
    let symbol = expect_string(parser)?;
    parser.expect(Token::Equal)?;
    let target_span = parser.current_span();
    let target_sym = expect_string(parser)?;
    let target_text = parser.text(target_sym);

    let target = match target_text.strip_prefix('.') {
        Some(method) if !method.is_empty() => {
            OperatorTarget::Method(parser.interner.intern(method))
        }
        None if !target_text.is_empty() => {
            OperatorTarget::Function(parser.interner.intern(&target_text))
        }
        _ => {
            return Err(ParseError::invalid_syntax(
                "operator target must name a function or `.method`",
                target_span,
            ))
        }
    };

    let entry = OperatorEntry {
        symbol,
        precedence,
        associativity,
        target,
    };
    let text = parser.text(symbol);
    parser.operators.declare(entry, &text).map_err(|err| match err {
        OperatorError::DuplicateOperator { symbol } => {
            ParseError::duplicate_operator(symbol, symbol_span)
        }
        OperatorError::InvalidSymbol { .. } => {
            ParseError::invalid_syntax(err.to_string(), symbol_span)
        }
    })?;
    tracing::debug!(symbol = %text, precedence = %precedence, %associativity, "declared operator");

    Ok(InfixDecl {
        symbol,
        precedence,
        associativity,
        target,
    })
}

fn expect_string(parser: &mut Parser<'_>) -> Result<Symbol, ParseError> {
    match parser.current() {
        Token::StringLiteral(sym) => {
            let sym = *sym;
            parser.advance();
            Ok(sym)
        }
        _ => Err(parser.unexpected_token(vec![Token::StringLiteral(parser.keywords.end)])),
    }
}

/// A precedence literal: `100.`, `.0`, `62.5`, `-1.`
///
/// The point is mandatory. Digits after the point are read from the source
/// text so leading zeros survive.
fn parse_precedence(parser: &mut Parser<'_>) -> Result<Precedence, ParseError> {
    let start = parser.current_span();
    let mut text = String::new();

    match parser.current().clone() {
        Token::Operator(sym) if parser.text(sym) == "-" => {
            text.push('-');
            parser.advance();
            if matches!(parser.current(), Token::IntLiteral(_)) {
                text.push_str(parser.current_span().slice(parser.source()));
                parser.advance();
            }
        }
        Token::Identifier(sym) => {
            // `-1.` lexes as the identifier `-1` followed by a dot
            let word = parser.text(sym);
            let digits = word.strip_prefix('-').unwrap_or("");
            if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
                return Err(ParseError::invalid_precedence(word, start));
            }
            text.push_str(&word);
            parser.advance();
        }
        Token::IntLiteral(_) => {
            text.push_str(start.slice(parser.source()));
            parser.advance();
        }
        _ => {}
    }

    let dot = parser.current_span();
    if !parser.eat(&Token::Dot) {
        let found = parser.current_span().slice(parser.source()).to_string();
        return Err(ParseError::invalid_precedence(text + &found, start));
    }
    text.push('.');

    let fraction = parser.current_span();
    if matches!(parser.current(), Token::IntLiteral(_)) && fraction.start == dot.end {
        text.push_str(fraction.slice(parser.source()));
        parser.advance();
    }

    let span = start.merge(&parser.previous_span());
    let digits = text.trim_start_matches('-');
    if digits == "." {
        return Err(ParseError::invalid_precedence(text, span));
    }
    text.parse::<f64>()
        .ok()
        .and_then(Precedence::new)
        .ok_or_else(|| ParseError::invalid_precedence(text, span))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::ast::{Callee, ExprKind};
    use crate::parser::interner::Interner;
    use crate::parser::operators::OperatorTable;
    use crate::parser::parser::ParseErrorKind;

    fn parse(source: &str) -> Result<(Vec<Item>, Interner, OperatorTable), ParseError> {
        let mut interner = Interner::new();
        let mut table = OperatorTable::new();
        let items = Parser::new(source, &mut interner, &mut table).unwrap().parse()?;
        Ok((items, interner, table))
    }

    #[test]
    fn test_class_declaration() {
        let (items, interner, _) = parse("class Option 'A\n| None()\n| Some(A)\nend").unwrap();
        let ItemKind::Class(class) = &items[0].kind else {
            panic!("Expected class, got {:?}", items[0].kind);
        };
        assert_eq!(interner.resolve(class.name), "Option");
        assert_eq!(class.generics.len(), 1);
        assert_eq!(class.constructors.len(), 2);
        assert_eq!(interner.resolve(class.constructors[1].name), "Some");
        assert_eq!(class.constructors[1].fields.len(), 1);
    }

    #[test]
    fn test_opaque_class() {
        let (items, _, _) = parse("class Int end").unwrap();
        let ItemKind::Class(class) = &items[0].kind else {
            panic!("Expected class");
        };
        assert!(class.constructors.is_empty());
    }

    #[test]
    fn test_fun_with_generics_and_ignored_param() {
        let (items, interner, _) = parse("fun seq('A -:@any other:A): A = other").unwrap();
        let ItemKind::Fun(fun) = &items[0].kind else {
            panic!("Expected fun");
        };
        assert!(!fun.is_method);
        assert_eq!(fun.generics.len(), 1);
        assert_eq!(interner.resolve(fun.params[0].name), "-");
        assert_eq!(fun.params[0].annotation.kind, ExprKind::Any);
    }

    #[test]
    fn test_method_declaration() {
        let (items, interner, _) =
            parse("fun .get('A self:Box(A)): A = native \"cell-get\"(self)").unwrap();
        let ItemKind::Fun(fun) = &items[0].kind else {
            panic!("Expected fun");
        };
        assert!(fun.is_method);
        let head = fun.params[0].annotation.head_name().unwrap();
        assert_eq!(interner.resolve(head), "Box");
    }

    #[test]
    fn test_directive_attaches_to_fun() {
        let (items, _, _) =
            parse("@Fails(error: `A' is not a subtype of `B')\nfun f('A 'B x:A): B = x").unwrap();
        let directive = items[0].directive.as_ref().unwrap();
        assert_eq!(directive.text, "error: `A' is not a subtype of `B'");
    }

    #[test]
    fn test_unknown_directive() {
        let err = parse("@Skip(later)\nfun f(): Int = 1").unwrap_err();
        assert!(matches!(err.kind, ParseErrorKind::InvalidDirective { .. }));
    }

    #[test]
    fn test_infix_declarations_and_precedence_literals() {
        let source = r#"
            infix left at 100. "*" = ".mul"
            infix right at .0 ";" = "seq"
            infix at 62.05 "<=>" = ".cmp"
            infix at -1. "~" = "tilde"
            infix at -.5 "~~" = "tilde"
        "#;
        let (items, interner, table) = parse(source).unwrap();
        assert_eq!(items.len(), 5);
        assert_eq!(table.len(), 5);

        let level = |text: &str| table.lookup(interner.get(text).unwrap()).unwrap().precedence.value();
        assert_eq!(level("*"), 100.0);
        assert_eq!(level(";"), 0.0);
        assert_eq!(level("<=>"), 62.05);
        assert_eq!(level("~"), -1.0);
        assert_eq!(level("~~"), -0.5);

        let semi = table.lookup(interner.get(";").unwrap()).unwrap();
        assert_eq!(semi.associativity, Associativity::Right);
        assert_eq!(semi.target, OperatorTarget::Function(interner.get("seq").unwrap()));
        let star = table.lookup(interner.get("*").unwrap()).unwrap();
        assert_eq!(star.target, OperatorTarget::Method(interner.get("mul").unwrap()));
    }

    #[test]
    fn test_precedence_requires_point() {
        let err = parse(r#"infix at 5 "~" = "f""#).unwrap_err();
        assert!(matches!(err.kind, ParseErrorKind::InvalidPrecedence { .. }));
    }

    #[test]
    fn test_operator_visible_only_after_declaration() {
        let err = parse("let x: Int = 1 ~ 2\ninfix at 1. \"~\" = \"f\"").unwrap_err();
        assert!(matches!(err.kind, ParseErrorKind::UnknownOperator { .. }));

        let (items, interner, _) = parse("infix at 1. \"~\" = \"f\"\nlet x: Int = 1 ~ 2").unwrap();
        let ItemKind::Let(decl) = &items[1].kind else {
            panic!("Expected let");
        };
        let ExprKind::Call { callee: Callee::Function(f), args, .. } = &decl.value.kind else {
            panic!("Expected call, got {:?}", decl.value.kind);
        };
        assert_eq!(f.as_var().map(|s| interner.resolve(s)), Some("f"));
        assert_eq!(args.len(), 2);
    }

    #[test]
    fn test_duplicate_operator() {
        let err = parse("infix at 1. \"~\" = \"f\"\ninfix at 2. \"~\" = \"g\"").unwrap_err();
        assert_eq!(
            err.kind,
            ParseErrorKind::DuplicateOperator {
                symbol: "~".to_string()
            }
        );
    }

    #[test]
    fn test_reserved_operator_symbol() {
        let err = parse("infix at 1. \"=\" = \"f\"").unwrap_err();
        assert!(matches!(err.kind, ParseErrorKind::InvalidSyntax { .. }));
    }

    #[test]
    fn test_items_follow_each_other_without_separators() {
        let source = "fun foo(): String = \"\"\nlet -check-tuple2: Int = (((1)))\nlet -check-let1: Type = Int";
        let (items, _, _) = parse(source).unwrap();
        assert_eq!(items.len(), 3);
    }
}
