//! Precedence-climbing parser for dependency expressions.

use phorm_core::value::FieldValue;

use crate::lexer::{Spanned, Token, lex};
use crate::types::{BinaryOp, Expr, ExprError, UnaryOp};

/// Maximum nesting depth before a parse is rejected. Stored expressions
/// are attacker-adjacent input; without a cap a long run of `(` or `-`
/// would recurse until the stack overflows.
const MAX_DEPTH: usize = 64;

/// Parses an expression string into an AST.
pub fn parse(src: &str) -> Result<Expr, ExprError> {
    let tokens = lex(src)?;
    let mut parser = Parser {
        tokens,
        index: 0,
        end: src.len(),
    };
    let expr = parser.parse_expr(0, 0)?;
    if let Some(spanned) = parser.peek_spanned() {
        return Err(ExprError::syntax(
            spanned.pos,
            format!("unexpected trailing token: {:?}", spanned.token),
        ));
    }
    Ok(expr)
}

struct Parser {
    tokens: Vec<Spanned>,
    index: usize,
    /// Byte length of the source, used as the error offset at end of input.
    end: usize,
}

impl Parser {
    fn peek_spanned(&self) -> Option<&Spanned> {
        self.tokens.get(self.index)
    }

    fn peek(&self) -> Option<&Token> {
        self.peek_spanned().map(|s| &s.token)
    }

    fn pos(&self) -> usize {
        self.peek_spanned().map(|s| s.pos).unwrap_or(self.end)
    }

    fn advance(&mut self) -> Option<Spanned> {
        let spanned = self.tokens.get(self.index).cloned();
        if spanned.is_some() {
            self.index += 1;
        }
        spanned
    }

    fn expect(&mut self, expected: &Token, what: &str) -> Result<(), ExprError> {
        match self.peek() {
            Some(token) if token == expected => {
                self.index += 1;
                Ok(())
            }
            _ => Err(ExprError::syntax(self.pos(), format!("expected {what}"))),
        }
    }

    fn check_depth(&self, depth: usize) -> Result<(), ExprError> {
        if depth > MAX_DEPTH {
            return Err(ExprError::syntax(self.pos(), "expression nests too deeply"));
        }
        Ok(())
    }

    fn parse_expr(&mut self, min_precedence: u8, depth: usize) -> Result<Expr, ExprError> {
        self.check_depth(depth)?;
        let mut lhs = self.parse_unary(depth)?;

        while let Some(op) = self.peek().and_then(binary_op) {
            let precedence = op.precedence();
            if precedence < min_precedence {
                break;
            }
            self.index += 1;
            // Left-associative: the right side must bind strictly tighter.
            let rhs = self.parse_expr(precedence + 1, depth + 1)?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }

        Ok(lhs)
    }

    fn parse_unary(&mut self, depth: usize) -> Result<Expr, ExprError> {
        self.check_depth(depth)?;
        match self.peek() {
            Some(Token::Minus) => {
                self.index += 1;
                Ok(Expr::Unary {
                    op: UnaryOp::Neg,
                    operand: Box::new(self.parse_unary(depth + 1)?),
                })
            }
            Some(Token::Bang) => {
                self.index += 1;
                Ok(Expr::Unary {
                    op: UnaryOp::Not,
                    operand: Box::new(self.parse_unary(depth + 1)?),
                })
            }
            _ => self.parse_primary(depth),
        }
    }

    fn parse_primary(&mut self, depth: usize) -> Result<Expr, ExprError> {
        let pos = self.pos();
        let Some(spanned) = self.advance() else {
            return Err(ExprError::syntax(pos, "unexpected end of expression"));
        };

        match spanned.token {
            Token::Int(i) => Ok(Expr::Literal(FieldValue::Int(i))),
            Token::Float(f) => Ok(Expr::Literal(FieldValue::from_f64(f))),
            Token::Str(s) => Ok(Expr::Literal(FieldValue::Text(s))),
            Token::True => Ok(Expr::Literal(FieldValue::Bool(true))),
            Token::False => Ok(Expr::Literal(FieldValue::Bool(false))),
            Token::Null => Ok(Expr::Literal(FieldValue::Null)),
            Token::LParen => {
                let inner = self.parse_expr(0, depth + 1)?;
                self.expect(&Token::RParen, "closing parenthesis")?;
                Ok(inner)
            }
            Token::Ident(name) => {
                if self.peek() == Some(&Token::Dot) {
                    self.index += 1;
                    let field_pos = self.pos();
                    match self.advance() {
                        Some(Spanned {
                            token: Token::Ident(field),
                            ..
                        }) => Ok(Expr::Member {
                            object: name,
                            field,
                        }),
                        _ => Err(ExprError::syntax(field_pos, "expected field name after '.'")),
                    }
                } else {
                    Ok(Expr::Var(name))
                }
            }
            other => Err(ExprError::syntax(
                spanned.pos,
                format!("unexpected token: {other:?}"),
            )),
        }
    }
}

fn binary_op(token: &Token) -> Option<BinaryOp> {
    match token {
        Token::Plus => Some(BinaryOp::Add),
        Token::Minus => Some(BinaryOp::Sub),
        Token::Star => Some(BinaryOp::Mul),
        Token::Slash => Some(BinaryOp::Div),
        Token::Percent => Some(BinaryOp::Rem),
        Token::EqEq => Some(BinaryOp::Eq),
        Token::BangEq => Some(BinaryOp::Ne),
        Token::Lt => Some(BinaryOp::Lt),
        Token::Le => Some(BinaryOp::Le),
        Token::Gt => Some(BinaryOp::Gt),
        Token::Ge => Some(BinaryOp::Ge),
        Token::AndAnd => Some(BinaryOp::And),
        Token::OrOr => Some(BinaryOp::Or),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn precedence_mul_over_add() {
        let expr = parse("1 + 2 * 3").unwrap();
        // 1 + (2 * 3)
        match expr {
            Expr::Binary {
                op: BinaryOp::Add,
                rhs,
                ..
            } => assert!(matches!(
                *rhs,
                Expr::Binary {
                    op: BinaryOp::Mul,
                    ..
                }
            )),
            other => panic!("unexpected tree: {other:?}"),
        }
    }

    #[test]
    fn comparison_over_logic() {
        let expr = parse("a.x > 1 && b.y < 2").unwrap();
        assert!(matches!(
            expr,
            Expr::Binary {
                op: BinaryOp::And,
                ..
            }
        ));
    }

    #[test]
    fn member_access() {
        assert_eq!(
            parse("formA.qty").unwrap(),
            Expr::Member {
                object: "formA".into(),
                field: "qty".into()
            }
        );
    }

    #[test]
    fn parens_override_precedence() {
        let expr = parse("(1 + 2) * 3").unwrap();
        assert!(matches!(
            expr,
            Expr::Binary {
                op: BinaryOp::Mul,
                ..
            }
        ));
    }

    #[test]
    fn unary_chains() {
        assert!(parse("!!value").is_ok());
        assert!(parse("--3").is_ok());
    }

    #[test]
    fn malformed_input_is_rejected_not_panicked() {
        for src in ["", "1 +", "a.", "(1", "1 2", "a .. b", "*", "==", "a.b.c"] {
            assert!(parse(src).is_err(), "{src:?} should fail");
        }
    }

    #[test]
    fn pathological_nesting_is_rejected_not_overflowed() {
        let deep = format!("{}1{}", "(".repeat(20_000), ")".repeat(20_000));
        assert!(parse(&deep).is_err());
        assert!(parse(&format!("{}1", "-".repeat(20_000))).is_err());
        assert!(parse(&format!("{}x", "!".repeat(20_000))).is_err());

        // Ordinary nesting stays well inside the cap.
        let shallow = format!("{}1 + 2{}", "(".repeat(30), ")".repeat(30));
        assert!(parse(&shallow).is_ok());
    }
}
