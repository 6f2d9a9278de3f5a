use tern_evaluator::Span;

use super::{
    ast::{BinaryOperator, ExpressionKind, Module},
    parse, Expected, ParseError, Parser,
};
use crate::{
    lexer::{lex, token::Symbol},
    source::SourceFiles,
};

/// Lexes a source stream
/// and creates a parser using the resulting tokens.
macro_rules! parser {
    ($src:expr) => {{
        let source = SourceFiles::new().add("test.tern", $src);
        let tokens = lex(source.text()).expect("Expected a successful lex");
        Parser::new(tokens, source)
    }};
}

fn parse_str(src: &str) -> Result<Module, ParseError> {
    let source = SourceFiles::new().add("test.tern", src);
    let tokens = lex(source.text()).expect("Expected a successful lex");
    parse(tokens, &source)
}

/// Renders the value of the only declaration with explicit parentheses.
fn value_of(src: &str) -> String {
    let module = parse_str(src).expect("Expected a successful parse");
    assert_eq!(module.declarations.len(), 1);
    module.declarations[0].value.to_string()
}

#[test]
fn eat_symbol() {
    let mut parser = parser!("=");

    assert!(parser.eat(Expected::Symbol(Symbol::Semicolon)).is_none());
    // Shouldn't have eaten our token
    assert_eq!(parser.tokens.len(), 1);
    assert!(parser.eat(Expected::Symbol(Symbol::Equals)).is_some());
    assert_eq!(parser.tokens.len(), 0);
    assert!(parser.eat(Expected::Symbol(Symbol::Equals)).is_none());
}

#[test]
fn let_is_not_an_identifier() {
    let mut parser = parser!("let");

    assert!(!parser.check_next(Expected::Ident));
    assert!(parser.check_next(Expected::Let));
}

#[test]
fn unexpected_token_lists_what_was_expected() {
    let mut parser = parser!("let x + 1;");

    parser.bump();
    parser.bump();
    parser.check_next(Expected::Symbol(Symbol::Equals));
    let err = parser.unexpected();

    assert!(matches!(err, ParseError::UnexpectedToken { span, .. } if span == Span::new(6, 1)));
    assert_eq!(err.to_string(), "unexpected token `+`");
    assert_eq!(err.expected_note().as_deref(), Some("expected `=`"));
    // Should be cleared by `unexpected`
    assert!(parser.expected_items.is_empty());
}

#[test]
fn unexpected_eof_points_at_the_last_character() {
    let err = parse_str("let x = 1").expect_err("Expected a failed parse");

    assert!(matches!(err, ParseError::UnexpectedEof { .. }));
    assert_eq!(err.span(), Span::new(8, 1));
    assert_eq!(err.expected_note().as_deref(), Some("expected an operator, `;`"));
}

#[test]
fn missing_expression() {
    let err = parse_str("let x = ;").expect_err("Expected a failed parse");

    assert_eq!(err.to_string(), "unexpected token `;`");
    assert_eq!(err.expected_note().as_deref(), Some("expected an expression"));
}

#[test]
fn empty_module() {
    let module = parse_str("// nothing here\n").expect("Expected a successful parse");
    assert!(module.declarations.is_empty());
}

#[test]
fn declarations() {
    let module = parse_str("let a = 1;\nlet b = a;").expect("Expected a successful parse");
    let names: Vec<_> = module.declarations.iter().map(|decl| &*decl.name).collect();

    assert_eq!(names, ["a", "b"]);
    assert_eq!(module.declarations[1].name_span, Span::new(15, 1));
    assert_eq!(module.declarations[1].span, Span::new(11, 10));
    assert_eq!(module.find("b"), Some(&module.declarations[1]));
    assert!(module.find("c").is_none());
}

#[test]
fn precedence() {
    assert_eq!(value_of("let x = 1 + 2 * 3;"), "(1 + (2 * 3))");
    assert_eq!(value_of("let x = (1 + 2) * 3;"), "((1 + 2) * 3)");
    assert_eq!(value_of("let x = 1 - 2 - 3;"), "((1 - 2) - 3)");
    assert_eq!(value_of("let x = -a * b;"), "((-a) * b)");
    assert_eq!(value_of("let x = - -1;"), "(-(-1))");
}

#[test]
fn parenthesized_expressions_cover_their_parentheses() {
    let module = parse_str("let x = (1 + 2);").expect("Expected a successful parse");
    let value = &module.declarations[0].value;

    assert_eq!(value.span, Span::new(8, 7));
    assert!(matches!(
        value.kind,
        ExpressionKind::BinaryOperation(_, BinaryOperator::Add, _)
    ));
}

#[test]
fn declarations_are_distinct_by_address() {
    let module = parse_str("let a = 1;\nlet a = 1;").expect("Expected a successful parse");
    assert_ne!(module.declarations[0], module.declarations[1]);
    assert_eq!(module.declarations[0], module.declarations[0].clone());
}
