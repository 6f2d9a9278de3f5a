pub mod ast;
mod expected;

#[cfg(test)]
mod tests;

use std::{iter::Peekable, vec};
use tern_evaluator::Span;
use thiserror::Error;

pub use self::expected::Expected;
use self::ast::*;
use crate::{
    lexer::token::{Symbol, Token, TokenKind},
    source::SourceFileRef,
};

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("unexpected token `{found}`")]
    UnexpectedToken {
        found: TokenKind,
        span: Span,
        expected: Vec<Expected>,
    },
    #[error("unexpected end of file")]
    UnexpectedEof { span: Span, expected: Vec<Expected> },
}

impl ParseError {
    pub fn span(&self) -> Span {
        match self {
            ParseError::UnexpectedToken { span, .. } | ParseError::UnexpectedEof { span, .. } => {
                *span
            },
        }
    }

    /// A note of the form `expected `;`, an operator`, if the parser knew
    /// what it wanted.
    pub fn expected_note(&self) -> Option<String> {
        let expected = match self {
            ParseError::UnexpectedToken { expected, .. }
            | ParseError::UnexpectedEof { expected, .. } => expected,
        };

        if expected.is_empty() {
            return None;
        }

        let expected_string = expected
            .iter()
            .map(|x| x.to_string())
            .collect::<Vec<String>>()
            .join(", ");

        Some(format!("expected {}", expected_string))
    }
}

/// Holds the parser's state.
struct Parser {
    tokens: Peekable<vec::IntoIter<Token>>,
    /// Everything that would have been accepted at the current token, in
    /// the order it was tried, for diagnostics such as
    /// `expected `=`, found `+``.
    expected_items: Vec<Expected>,
    source: SourceFileRef,
}

impl Parser {
    fn new(tokens: Vec<Token>, source: SourceFileRef) -> Self {
        Self {
            tokens: tokens.into_iter().peekable(),
            expected_items: Vec::new(),
            source,
        }
    }

    /// Get the next token, forgetting what was expected of the last one.
    fn bump(&mut self) -> Option<Token> {
        self.expected_items.clear();
        self.tokens.next()
    }

    /// Produces the error for whatever is next (possibly the end of the
    /// file) and skips it.
    fn unexpected(&mut self) -> ParseError {
        let expected = std::mem::take(&mut self.expected_items);

        match self.bump() {
            Some(token) => ParseError::UnexpectedToken {
                found: token.kind,
                span: token.span,
                expected,
            },

            None => ParseError::UnexpectedEof {
                span: self.source.eof_span(),
                expected,
            },
        }
    }

    /// Checks if the next token matches this expectation.
    fn check_next(&mut self, expected: Expected) -> bool {
        if !self.expected_items.contains(&expected) {
            self.expected_items.push(expected);
        }

        match self.tokens.peek() {
            Some(Token { kind, .. }) => expected.matches(kind),
            None => false,
        }
    }

    /// Eats the next token if it matches `expected`.
    fn eat(&mut self, expected: Expected) -> Option<Token> {
        if self.check_next(expected) {
            self.bump()
        } else {
            None
        }
    }

    fn expect_item(&mut self, expected: Expected) -> Result<Token, ParseError> {
        match self.eat(expected) {
            Some(token) => Ok(token),
            None => Err(self.unexpected()),
        }
    }

    /// The entry point for the parser.
    fn parse_module(&mut self) -> Result<Module, ParseError> {
        let mut declarations = Vec::new();

        loop {
            if self.check_next(Expected::Let) {
                declarations.push(DeclRef::new(self.parse_declaration()?));
            } else {
                match self.tokens.peek() {
                    Some(_) => return Err(self.unexpected()),

                    // Reached EOF
                    None => break,
                }
            }
        }

        Ok(Module { declarations })
    }

    fn parse_declaration(&mut self) -> Result<Declaration, ParseError> {
        let mut span = self.expect_item(Expected::Let)?.span;

        let (name, name_span) = match self.expect_item(Expected::Ident)? {
            Token {
                kind: TokenKind::IdentOrKeyword(ident),
                span,
            } => (ident, span),

            _ => unreachable!(),
        };

        self.expect_item(Expected::Symbol(Symbol::Equals))?;
        let value = self.parse_expression(0)?;

        let semicolon_span = self.expect_item(Expected::Symbol(Symbol::Semicolon))?.span;
        span.grow_to_contain(&semicolon_span);

        Ok(Declaration {
            source: self.source.clone(),
            name: name.into(),
            name_span,
            value,
            span,
        })
    }

    /// Parses an expression whose operators bind at least as tightly as
    /// `min_bind_power`. Whatever follows the expression is left alone.
    fn parse_expression(&mut self, min_bind_power: u8) -> Result<Expression, ParseError> {
        if !self.check_next(Expected::Expression) {
            return Err(self.unexpected());
        }

        let token = match self.bump() {
            Some(token) => token,
            None => unreachable!(),
        };

        let mut res = match token.kind {
            TokenKind::Integer(value) => {
                Expression::new(ExpressionKind::Integer(value), token.span)
            },

            TokenKind::IdentOrKeyword(ident) => {
                Expression::new(ExpressionKind::Identifier(ident.into()), token.span)
            },

            TokenKind::Symbol(Symbol::OpenParen) => {
                let mut expr = self.parse_expression(0)?;
                let close_paren = self.expect_item(Expected::Symbol(Symbol::CloseParen))?;

                // The parentheses belong to the expression
                let mut span = token.span;
                span.grow_to_contain(&close_paren.span);
                expr.span = span;
                expr
            },

            TokenKind::Symbol(Symbol::Minus) => {
                let op = UnaryOperator::Negative;
                let bind_power = self.bind_power_for_unary_op(&op);
                let expr = self.parse_expression(bind_power)?;

                let mut span = token.span;
                span.grow_to_contain(&expr.span);
                Expression::new(ExpressionKind::UnaryOperation(op, Box::new(expr)), span)
            },

            _ => unreachable!(),
        };

        while self.check_next(Expected::Operator) {
            let operator = match self.tokens.peek() {
                Some(token) => Self::token_as_binary_op(&token.kind),
                None => None,
            };

            let operator = match operator {
                Some(res) => res,
                None => break,
            };

            let (left_bind_power, right_bind_power) = self.bind_power_for_binop(&operator);

            if left_bind_power < min_bind_power {
                break;
            }

            self.bump();
            let rhs = self.parse_expression(right_bind_power)?;

            let mut span = res.span;
            span.grow_to_contain(&rhs.span);

            res = Expression::new(
                ExpressionKind::BinaryOperation(Box::new(res), operator, Box::new(rhs)),
                span,
            );
        }

        Ok(res)
    }

    fn token_as_binary_op(token_kind: &TokenKind) -> Option<BinaryOperator> {
        match token_kind {
            TokenKind::Symbol(Symbol::Plus) => Some(BinaryOperator::Add),
            TokenKind::Symbol(Symbol::Minus) => Some(BinaryOperator::Subtract),
            TokenKind::Symbol(Symbol::Star) => Some(BinaryOperator::Multiply),
            _ => None,
        }
    }

    /// Returns `(left_power, right_power)` for a given binary operator.
    /// Higher powers bind tighter; eg. something with power `(1, 2)`
    /// binds tighter to the right (ie. is left associative), while
    /// something with power `(3, 4)` would take precedence over the
    /// thing with power `(1, 2)`.
    ///
    /// For more information, see [this article] about Pratt parsing.
    ///
    /// [this article]: https://matklad.github.io/2020/04/13/simple-but-powerful-pratt-parsing.html
    fn bind_power_for_binop(&self, operator: &BinaryOperator) -> (u8, u8) {
        match operator {
            BinaryOperator::Add | BinaryOperator::Subtract => (17, 18),
            BinaryOperator::Multiply => (19, 20),
        }
    }

    fn bind_power_for_unary_op(&self, operator: &UnaryOperator) -> u8 {
        match operator {
            UnaryOperator::Negative => 23,
        }
    }
}

/// Parse the given `Vec` of `Token`s lexed from `source`.
pub fn parse(tokens: Vec<Token>, source: &SourceFileRef) -> Result<Module, ParseError> {
    let mut parser = Parser::new(tokens, source.clone());
    parser.parse_module()
}
