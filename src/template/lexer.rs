//! Lexer for the inside of `{{ ... }}` expressions using logos

use std::fmt;

use logos::Logos;

use crate::error::Span;

/// Expression tokens
///
/// Only `Ident` and `Dot` form valid paths. The rest are lexed so that filter,
/// call and literal syntax is reported as "unexpected '|'" rather than as an
/// unknown character.
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\n\r]+")]
pub enum Token {
    #[token(".")]
    Dot,
    #[token("|")]
    Pipe,
    #[token(",")]
    Comma,
    #[token("(")]
    ParenOpen,
    #[token(")")]
    ParenClose,
    #[token("[")]
    BracketOpen,
    #[token("]")]
    BracketClose,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,

    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*", |lex| lex.slice().to_string())]
    Ident(String),

    #[regex(r#""([^"\\]|\\.)*"|'([^'\\]|\\.)*'"#, |lex| {
        let s = lex.slice();
        s[1..s.len() - 1].to_string()
    })]
    String(String),

    #[regex(r"[0-9]+(\.[0-9]+)?", |lex| lex.slice().parse::<f64>().ok())]
    Number(f64),
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Dot => f.write_str("'.'"),
            Token::Pipe => f.write_str("'|'"),
            Token::Comma => f.write_str("','"),
            Token::ParenOpen => f.write_str("'('"),
            Token::ParenClose => f.write_str("')'"),
            Token::BracketOpen => f.write_str("'['"),
            Token::BracketClose => f.write_str("']'"),
            Token::Plus => f.write_str("'+'"),
            Token::Minus => f.write_str("'-'"),
            Token::Ident(name) => write!(f, "identifier '{}'", name),
            Token::String(s) => write!(f, "string \"{}\"", s),
            Token::Number(n) => write!(f, "number {}", n),
        }
    }
}

/// Lex an expression, shifting every span by `offset`
///
/// Returns the span of the first unrecognised character on failure.
pub fn lex(input: &str, offset: usize) -> Result<Vec<(Token, Span)>, Span> {
    Token::lexer(input)
        .spanned()
        .map(|(tok, span)| {
            let span = span.start + offset..span.end + offset;
            match tok {
                Ok(tok) => Ok((tok, span)),
                Err(()) => Err(span),
            }
        })
        .collect()
}
