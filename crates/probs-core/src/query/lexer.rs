use logos::Logos;
use probs_common::QueryError;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"[ \t\r\n]+")]
pub enum TokenKind {
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token(",")]
    Comma,
    #[token("|")]
    Pipe,
    #[token("~")]
    Tilde,
    #[token("=")]
    Eq,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,

    // Recognised only to be rejected with a clear message.
    #[token("^")]
    Caret,
    #[token("**")]
    StarStar,

    #[regex(r"[0-9]+(\.[0-9]*)?([eE][+-]?[0-9]+)?")]
    #[regex(r"\.[0-9]+([eE][+-]?[0-9]+)?")]
    Number,

    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*")]
    Ident,

    Eof,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::LParen => write!(f, "("),
            TokenKind::RParen => write!(f, ")"),
            TokenKind::Comma => write!(f, ","),
            TokenKind::Pipe => write!(f, "|"),
            TokenKind::Tilde => write!(f, "~"),
            TokenKind::Eq => write!(f, "="),
            TokenKind::Plus => write!(f, "+"),
            TokenKind::Minus => write!(f, "-"),
            TokenKind::Star => write!(f, "*"),
            TokenKind::Slash => write!(f, "/"),
            TokenKind::Caret => write!(f, "^"),
            TokenKind::StarStar => write!(f, "**"),
            TokenKind::Number => write!(f, "number"),
            TokenKind::Ident => write!(f, "name"),
            TokenKind::Eof => write!(f, "end of input"),
        }
    }
}

/// Tokenize a query. The result always ends with an `Eof` token.
pub fn lex(source: &str) -> Result<Vec<Token>, QueryError> {
    let mut tokens = Vec::new();
    let mut lexer = TokenKind::lexer(source);

    while let Some(result) = lexer.next() {
        let span = lexer.span();
        match result {
            Ok(kind) => tokens.push(Token {
                kind,
                span: Span::new(span.start, span.end),
                text: lexer.slice().to_string(),
            }),
            Err(()) => {
                return Err(QueryError::Syntax {
                    position: span.start,
                    message: format!("unexpected character '{}'", lexer.slice()),
                })
            }
        }
    }

    tokens.push(Token {
        kind: TokenKind::Eof,
        span: Span::new(source.len(), source.len()),
        text: String::new(),
    });

    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        lex(src).unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn probability_term() {
        use TokenKind::*;
        assert_eq!(
            kinds("P(A, ~B | C=1)"),
            vec![
                Ident, LParen, Ident, Comma, Tilde, Ident, Pipe, Ident, Eq, Number, RParen, Eof
            ]
        );
    }

    #[test]
    fn numbers() {
        let tokens = lex("0.5 1e-3 .25 2").unwrap();
        let texts: Vec<&str> = tokens.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["0.5", "1e-3", ".25", "2", ""]);
        assert!(tokens[..4].iter().all(|t| t.kind == TokenKind::Number));
    }

    #[test]
    fn exponent_operators_are_tokens() {
        assert_eq!(
            kinds("2 ** 3 ^ 4"),
            vec![
                TokenKind::Number,
                TokenKind::StarStar,
                TokenKind::Number,
                TokenKind::Caret,
                TokenKind::Number,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn spans_point_into_source() {
        let tokens = lex("  P(Rain)").unwrap();
        assert_eq!(tokens[0].span, Span::new(2, 3));
        assert_eq!(tokens[2].text, "Rain");
    }

    #[test]
    fn unknown_character_is_syntax_error() {
        let err = lex("P(A) & P(B)").unwrap_err();
        assert!(matches!(err, QueryError::Syntax { position: 5, .. }));
    }
}
