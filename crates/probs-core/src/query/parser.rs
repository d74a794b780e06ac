//! Recursive-descent parser for the query language.
//!
//! ```text
//! query     := predicate | expr
//! predicate := IsIndep '(' name ',' name ')'
//!            | IsCondIndep '(' name ',' name '|' name ')'
//! expr      := term (('+' | '-') term)*
//! term      := unary (('*' | '/') unary)*
//! unary     := ('-' | '+') unary | primary
//! primary   := number | '(' expr ')' | prob
//! prob      := 'P' '(' specs ('|' specs)? ')'
//! specs     := spec (',' spec)*
//! spec      := ('~' name | '~' '(' name ')' | 'Not' '(' name ')' | name) ('=' state)?
//! ```

use probs_common::QueryError;

use super::ast::{BinOp, Expr, VarSpec};
use super::lexer::{lex, Token, TokenKind};

const PROBABILITY: &str = "P";
const NOT: &str = "Not";
const IS_INDEP: &str = "IsIndep";
const IS_COND_INDEP: &str = "IsCondIndep";

type ParseResult<T> = Result<T, QueryError>;

/// Parse query text into a name-level syntax tree.
pub fn parse_query(source: &str) -> Result<Expr, QueryError> {
    let tokens = lex(source)?;
    let mut parser = Parser::new(tokens);
    parser.parse_query()
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0 }
    }

    // --- Token access helpers ---

    fn peek(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek_kind(&self) -> TokenKind {
        self.peek().kind
    }

    fn peek_kind_at(&self, offset: usize) -> TokenKind {
        self.tokens
            .get(self.pos + offset)
            .map(|t| t.kind)
            .unwrap_or(TokenKind::Eof)
    }

    fn advance(&mut self) -> Token {
        let tok = self.peek().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        tok
    }

    fn expect(&mut self, kind: TokenKind, expected: &str) -> ParseResult<Token> {
        if self.peek_kind() == kind {
            Ok(self.advance())
        } else {
            Err(self.unexpected(expected))
        }
    }

    fn at_call(&self, keyword: &str) -> bool {
        let tok = self.peek();
        tok.kind == TokenKind::Ident
            && tok.text == keyword
            && self.peek_kind_at(1) == TokenKind::LParen
    }

    fn error(&self, position: usize, message: impl Into<String>) -> QueryError {
        QueryError::Syntax {
            position,
            message: message.into(),
        }
    }

    fn unexpected(&self, expected: &str) -> QueryError {
        let tok = self.peek();
        match tok.kind {
            TokenKind::Caret | TokenKind::StarStar => self.exponent_error(),
            TokenKind::Eof => self.error(
                tok.span.start,
                format!("expected {}, found end of input", expected),
            ),
            _ => self.error(
                tok.span.start,
                format!("expected {}, found '{}'", expected, tok.text),
            ),
        }
    }

    fn exponent_error(&self) -> QueryError {
        self.error(
            self.peek().span.start,
            "exponentiation ('^' or '**') is not supported",
        )
    }

    // --- Grammar ---

    fn parse_query(&mut self) -> ParseResult<Expr> {
        let expr = if self.at_call(IS_INDEP) || self.at_call(IS_COND_INDEP) {
            self.parse_predicate()?
        } else {
            self.parse_expr()?
        };
        if self.peek_kind() != TokenKind::Eof {
            return Err(self.unexpected("an operator or end of input"));
        }
        Ok(expr)
    }

    fn parse_predicate(&mut self) -> ParseResult<Expr> {
        let keyword = self.advance();
        self.expect(TokenKind::LParen, "'('")?;
        let a = self.parse_bare_name()?;
        self.expect(TokenKind::Comma, "','")?;
        let b = self.parse_bare_name()?;

        if keyword.text == IS_INDEP {
            self.expect(TokenKind::RParen, "')'")?;
            return Ok(Expr::Independence { a, b });
        }

        self.expect(TokenKind::Pipe, "'|'")?;
        let given = self.parse_bare_name()?;
        self.expect(TokenKind::RParen, "')'")?;
        Ok(Expr::CondIndependence { a, b, given })
    }

    /// A plain variable name, as independence predicates require.
    fn parse_bare_name(&mut self) -> ParseResult<String> {
        if self.peek_kind() == TokenKind::Tilde || self.at_call(NOT) {
            return Err(self.error(
                self.peek().span.start,
                "independence predicates take plain variable names",
            ));
        }
        let name = self.expect(TokenKind::Ident, "a variable name")?;
        if self.peek_kind() == TokenKind::Eq {
            return Err(self.error(
                self.peek().span.start,
                "independence predicates take plain variable names",
            ));
        }
        Ok(name.text)
    }

    fn parse_expr(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_term()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::Plus => BinOp::Add,
                TokenKind::Minus => BinOp::Sub,
                _ => break,
            };
            self.advance();
            let right = self.parse_term()?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_term(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::Star => BinOp::Mul,
                TokenKind::Slash => BinOp::Div,
                TokenKind::Caret | TokenKind::StarStar => return Err(self.exponent_error()),
                _ => break,
            };
            self.advance();
            let right = self.parse_unary()?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> ParseResult<Expr> {
        match self.peek_kind() {
            TokenKind::Minus => {
                self.advance();
                Ok(Expr::Negate(Box::new(self.parse_unary()?)))
            }
            TokenKind::Plus => {
                self.advance();
                self.parse_unary()
            }
            _ => self.parse_primary(),
        }
    }

    fn parse_primary(&mut self) -> ParseResult<Expr> {
        let tok = self.peek().clone();
        match tok.kind {
            TokenKind::Number => {
                self.advance();
                tok.text
                    .parse::<f64>()
                    .map(Expr::Number)
                    .map_err(|_| self.error(tok.span.start, format!("invalid number '{}'", tok.text)))
            }
            TokenKind::LParen => {
                self.advance();
                let inner = self.parse_expr()?;
                self.expect(TokenKind::RParen, "')'")?;
                Ok(inner)
            }
            TokenKind::Ident if self.at_call(PROBABILITY) => self.parse_probability(),
            TokenKind::Ident if tok.text == IS_INDEP || tok.text == IS_COND_INDEP => Err(self.error(
                tok.span.start,
                "independence predicates cannot be combined with arithmetic",
            )),
            TokenKind::Ident => Err(self.error(
                tok.span.start,
                format!(
                    "unexpected name '{}'; variables may only appear inside P(...)",
                    tok.text
                ),
            )),
            _ => Err(self.unexpected("a number, '(' or P(...)")),
        }
    }

    fn parse_probability(&mut self) -> ParseResult<Expr> {
        self.advance();
        self.expect(TokenKind::LParen, "'('")?;
        let targets = self.parse_spec_list()?;
        let conditions = if self.peek_kind() == TokenKind::Pipe {
            self.advance();
            self.parse_spec_list()?
        } else {
            Vec::new()
        };
        self.expect(TokenKind::RParen, "')'")?;
        Ok(Expr::Probability {
            targets,
            conditions,
        })
    }

    fn parse_spec_list(&mut self) -> ParseResult<Vec<VarSpec>> {
        let mut specs = vec![self.parse_spec()?];
        while self.peek_kind() == TokenKind::Comma {
            self.advance();
            specs.push(self.parse_spec()?);
        }
        Ok(specs)
    }

    fn parse_spec(&mut self) -> ParseResult<VarSpec> {
        let (name, negated) = if self.peek_kind() == TokenKind::Tilde {
            self.advance();
            if self.peek_kind() == TokenKind::LParen {
                self.advance();
                let name = self.expect(TokenKind::Ident, "a variable name")?;
                self.expect(TokenKind::RParen, "')'")?;
                (name, true)
            } else {
                (self.expect(TokenKind::Ident, "a variable name")?, true)
            }
        } else if self.at_call(NOT) {
            self.advance();
            self.advance();
            let name = self.expect(TokenKind::Ident, "a variable name")?;
            self.expect(TokenKind::RParen, "')'")?;
            (name, true)
        } else {
            (self.expect(TokenKind::Ident, "a variable name")?, false)
        };

        let state = if self.peek_kind() == TokenKind::Eq {
            self.advance();
            match self.peek_kind() {
                TokenKind::Ident | TokenKind::Number => Some(self.advance().text),
                _ => return Err(self.unexpected("a state after '='")),
            }
        } else {
            None
        };

        Ok(VarSpec {
            name: name.text,
            negated,
            state,
            position: name.span.start,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(name: &str, negated: bool, state: Option<&str>, position: usize) -> VarSpec {
        VarSpec {
            name: name.to_string(),
            negated,
            state: state.map(str::to_string),
            position,
        }
    }

    fn syntax_message(src: &str) -> String {
        match parse_query(src).unwrap_err() {
            QueryError::Syntax { message, .. } => message,
            other => panic!("expected syntax error, got {other:?}"),
        }
    }

    #[test]
    fn conditional_term() {
        let expr = parse_query("P(A, ~B | C=1)").unwrap();
        assert_eq!(
            expr,
            Expr::Probability {
                targets: vec![spec("A", false, None, 2), spec("B", true, None, 6)],
                conditions: vec![spec("C", false, Some("1"), 10)],
            }
        );
    }

    #[test]
    fn negation_forms_agree() {
        for src in ["P(~Rain)", "P(~(Rain))", "P(Not(Rain))"] {
            match parse_query(src).unwrap() {
                Expr::Probability { targets, .. } => {
                    assert_eq!(targets.len(), 1);
                    assert!(targets[0].negated);
                    assert_eq!(targets[0].name, "Rain");
                }
                other => panic!("unexpected {other:?}"),
            }
        }
    }

    #[test]
    fn labels_as_states() {
        match parse_query("P(Traffic=Heavy | Weather=Sunny)").unwrap() {
            Expr::Probability {
                targets,
                conditions,
            } => {
                assert_eq!(targets[0].state.as_deref(), Some("Heavy"));
                assert_eq!(conditions[0].state.as_deref(), Some("Sunny"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn precedence_and_associativity() {
        // 1 - 2 - 3 * 4 == (1 - 2) - (3 * 4)
        let expr = parse_query("1 - 2 - 3 * 4").unwrap();
        let expected = Expr::Binary {
            op: BinOp::Sub,
            left: Box::new(Expr::Binary {
                op: BinOp::Sub,
                left: Box::new(Expr::Number(1.0)),
                right: Box::new(Expr::Number(2.0)),
            }),
            right: Box::new(Expr::Binary {
                op: BinOp::Mul,
                left: Box::new(Expr::Number(3.0)),
                right: Box::new(Expr::Number(4.0)),
            }),
        };
        assert_eq!(expr, expected);
    }

    #[test]
    fn unary_signs() {
        assert_eq!(
            parse_query("-+0.5").unwrap(),
            Expr::Negate(Box::new(Expr::Number(0.5)))
        );
        assert_eq!(parse_query("1e-1").unwrap(), Expr::Number(0.1));
    }

    #[test]
    fn predicates() {
        assert_eq!(
            parse_query("IsIndep(A, B)").unwrap(),
            Expr::Independence {
                a: "A".into(),
                b: "B".into()
            }
        );
        assert_eq!(
            parse_query("IsCondIndep(A, B | C)").unwrap(),
            Expr::CondIndependence {
                a: "A".into(),
                b: "B".into(),
                given: "C".into()
            }
        );
    }

    #[test]
    fn predicates_reject_value_forms() {
        assert!(syntax_message("IsIndep(~A, B)").contains("plain variable names"));
        assert!(syntax_message("IsIndep(A=1, B)").contains("plain variable names"));
        assert!(syntax_message("IsIndep(Not(A), B)").contains("plain variable names"));
        assert!(syntax_message("1 + IsIndep(A, B)").contains("cannot be combined"));
        assert!(syntax_message("IsIndep(A, B) + 1").contains("expected an operator"));
    }

    #[test]
    fn exponentiation_is_named() {
        assert!(syntax_message("P(A) ^ 2").contains("exponentiation"));
        assert!(syntax_message("P(A) ** 2").contains("exponentiation"));
    }

    #[test]
    fn malformed_punctuation() {
        assert!(syntax_message("P(A").contains("end of input"));
        assert!(syntax_message("(0.5").contains("')'"));
        assert!(syntax_message("0.5)").contains("')'"));
        assert!(syntax_message("P()").contains("variable name"));
        assert!(syntax_message("P(A,)").contains("variable name"));
        assert!(syntax_message("P(A=)").contains("state"));
        assert!(syntax_message("").contains("end of input"));
        assert!(syntax_message("A + 1").contains("inside P(...)"));
    }

    #[test]
    fn syntax_position_points_at_offender() {
        let err = parse_query("P(A) + * 2").unwrap_err();
        assert_eq!(
            err,
            QueryError::Syntax {
                position: 7,
                message: "expected a number, '(' or P(...), found '*'".to_string()
            }
        );
    }
}
