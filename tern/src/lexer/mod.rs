pub mod token;


use std::{
    iter::{Enumerate, Peekable},
    num::ParseIntError,
    str::Chars,
};
use tern_evaluator::Span;
use thiserror::Error;

use self::token::{Symbol, Token, TokenKind};

type CharStream<'a> = Peekable<Enumerate<Chars<'a>>>;

/// Signals an error encountered during lexing.
///
/// Spans count characters, not bytes.
#[derive(Debug, Error)]
pub enum LexError {
    #[error("unexpected character `{0}`")]
    UnexpectedChar(char, usize),
    #[error("could not parse {0} as an integer")]
    CouldntParseInt(String, usize, #[source] ParseIntError),
}

impl LexError {
    pub fn span(&self) -> Span {
        match self {
            LexError::UnexpectedChar(_, start) => Span::new(*start, 1),
            LexError::CouldntParseInt(num_str, start, _) => Span::new(*start, num_str.len()),
        }
    }
}

/// Keeps the lexer state during lexing.
struct Lexer<'src> {
    chars: CharStream<'src>,
}

impl<'src> Lexer<'src> {
    fn new(source: &'src str) -> Self {
        Self {
            chars: source.chars().enumerate().peekable(),
        }
    }

    /// Returns a token composed of just the current character.
    fn one_char_token(&mut self, start: usize, kind: TokenKind) -> Token {
        self.chars.next();
        Token::new(kind, Span::new(start, 1))
    }

    /// Try and yield the token that best fits the input.
    /// Returns Ok(Some(...)) if a token was lexed,
    /// Ok(None) if the source stream was exhausted,
    /// or Err(...) if an error occurred.
    fn lex_one_token(&mut self) -> Result<Option<Token>, LexError> {
        let (idx, c) = match self.chars.peek() {
            Some(&(idx, c)) => (idx, c),
            None => return Ok(None),
        };

        let token = match c {
            'A'..='Z' | 'a'..='z' | '_' => self.consume_ident_or_keyword(idx),
            '0'..='9' => self.consume_number(idx)?,

            '=' => self.one_char_token(idx, TokenKind::Symbol(Symbol::Equals)),
            ';' => self.one_char_token(idx, TokenKind::Symbol(Symbol::Semicolon)),
            '+' => self.one_char_token(idx, TokenKind::Symbol(Symbol::Plus)),
            '-' => self.one_char_token(idx, TokenKind::Symbol(Symbol::Minus)),
            '*' => self.one_char_token(idx, TokenKind::Symbol(Symbol::Star)),
            '(' => self.one_char_token(idx, TokenKind::Symbol(Symbol::OpenParen)),
            ')' => self.one_char_token(idx, TokenKind::Symbol(Symbol::CloseParen)),

            '/' => {
                self.chars.next();

                match self.chars.peek() {
                    Some((_, '/')) => {
                        while self
                            .chars
                            .next_if(|(_, c)| *c != '\n' && *c != '\r')
                            .is_some()
                        {}

                        Token::new(TokenKind::Whitespace, Span::new(idx, 1))
                    },

                    // There is no division
                    _ => return Err(LexError::UnexpectedChar('/', idx)),
                }
            },

            c if c.is_whitespace() => self.one_char_token(idx, TokenKind::Whitespace),

            _ => return Err(LexError::UnexpectedChar(c, idx)),
        };

        Ok(Some(token))
    }

    /// Take every character that could be considered part of an identifier
    /// and produce an `IdentOrKeyword` token.
    fn consume_ident_or_keyword(&mut self, start: usize) -> Token {
        let mut res = String::new();

        while let Some((_, c)) = self
            .chars
            .next_if(|(_, c)| matches!(c, 'A'..='Z' | 'a'..='z' | '_' | '0'..='9'))
        {
            res.push(c);
        }

        let span = Span::new(start, res.len());
        Token::new(TokenKind::IdentOrKeyword(res), span)
    }

    fn consume_number(&mut self, start: usize) -> Result<Token, LexError> {
        let mut num_str = String::new();

        while let Some((_, c)) = self.chars.next_if(|(_, c)| c.is_ascii_digit()) {
            num_str.push(c);
        }

        match num_str.parse::<i64>() {
            Ok(value) => {
                let span = Span::new(start, num_str.len());
                Ok(Token::new(TokenKind::Integer(value), span))
            },

            Err(err) => Err(LexError::CouldntParseInt(num_str, start, err)),
        }
    }
}

/// Turn a source stream into a `Vec` of `Token`s
pub fn lex(source: &str) -> Result<Vec<Token>, LexError> {
    let mut lexer = Lexer::new(source);
    let mut res = Vec::new();

    while let Some(token) = lexer.lex_one_token()? {
        if token.kind != TokenKind::Whitespace {
            res.push(token);
        }
    }

    Ok(res)
}
