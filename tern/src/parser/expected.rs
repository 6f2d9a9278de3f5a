use std::fmt;

use crate::lexer::token::{Symbol, TokenKind};

/// Something the parser would have accepted at a given point.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Expected {
    Let,
    Ident,
    Symbol(Symbol),
    Expression,
    Operator,
}

impl Expected {
    pub fn matches(&self, kind: &TokenKind) -> bool {
        match (self, kind) {
            (Expected::Let, TokenKind::IdentOrKeyword(ident)) => ident == "let",
            (Expected::Ident, TokenKind::IdentOrKeyword(ident)) => ident != "let",
            (Expected::Symbol(expected), TokenKind::Symbol(symbol)) => expected == symbol,

            (Expected::Expression, TokenKind::Integer(_)) => true,
            (Expected::Expression, TokenKind::Symbol(Symbol::OpenParen | Symbol::Minus)) => true,
            (Expected::Expression, kind) => Expected::Ident.matches(kind),

            (
                Expected::Operator,
                TokenKind::Symbol(Symbol::Plus | Symbol::Minus | Symbol::Star),
            ) => true,

            _ => false,
        }
    }
}

impl fmt::Display for Expected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expected::Let => write!(f, "`let`"),
            Expected::Ident => write!(f, "an identifier"),
            Expected::Symbol(symbol) => write!(f, "`{}`", symbol),
            Expected::Expression => write!(f, "an expression"),
            Expected::Operator => write!(f, "an operator"),
        }
    }
}
