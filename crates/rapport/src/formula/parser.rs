//! Recursive-descent parser for the formula grammar.
//!
//! ```text
//! expr    := term (('+' | '-') term)*
//! term    := unary (('*' | '/') unary)*
//! unary   := '-' unary | primary
//! primary := NUMBER | operand | '(' expr ')'
//! operand := IDENT | '[' name ']'
//! ```

use super::ast::{BinaryOp, Expr, Operand};
use super::error::FormulaError;
use super::lexer::{Token, TokenKind};

/// Maximum nesting of parentheses and unary minus.
pub const MAX_DEPTH: usize = 64;

pub struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    depth: usize,
    left: &'a str,
    right: &'a str,
}

impl<'a> Parser<'a> {
    pub fn new(tokens: &'a [Token], left: &'a str, right: &'a str) -> Self {
        Self {
            tokens,
            pos: 0,
            depth: 0,
            left,
            right,
        }
    }

    /// Parse the whole token stream as one expression.
    pub fn parse(mut self) -> Result<Expr, FormulaError> {
        let expr = self.expr()?;
        match self.tokens.get(self.pos) {
            None => Ok(expr),
            Some(token) => Err(FormulaError::UnexpectedToken {
                found: token.kind.describe(),
                expected: "an operator or end of formula",
                position: token.position,
            }),
        }
    }

    fn peek(&self) -> Option<&TokenKind> {
        self.tokens.get(self.pos).map(|t| &t.kind)
    }

    fn expr(&mut self) -> Result<Expr, FormulaError> {
        let mut lhs = self.term()?;
        while let Some(op) = match self.peek() {
            Some(TokenKind::Plus) => Some(BinaryOp::Add),
            Some(TokenKind::Minus) => Some(BinaryOp::Sub),
            _ => None,
        } {
            self.pos += 1;
            let rhs = self.term()?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    fn term(&mut self) -> Result<Expr, FormulaError> {
        let mut lhs = self.unary()?;
        while let Some(op) = match self.peek() {
            Some(TokenKind::Star) => Some(BinaryOp::Mul),
            Some(TokenKind::Slash) => Some(BinaryOp::Div),
            _ => None,
        } {
            self.pos += 1;
            let rhs = self.unary()?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    fn unary(&mut self) -> Result<Expr, FormulaError> {
        if matches!(self.peek(), Some(TokenKind::Minus)) {
            self.pos += 1;
            self.enter()?;
            let inner = self.unary()?;
            self.depth -= 1;
            return Ok(Expr::Neg(Box::new(inner)));
        }
        self.primary()
    }

    fn primary(&mut self) -> Result<Expr, FormulaError> {
        let tokens = self.tokens;
        let Some(token) = tokens.get(self.pos) else {
            return Err(FormulaError::UnexpectedEnd {
                expected: "a number, operand or '('",
            });
        };
        self.pos += 1;

        match &token.kind {
            TokenKind::Number(n) => Ok(Expr::Literal(*n)),
            TokenKind::Ident(name) | TokenKind::Reference(name) => {
                self.resolve(name).map(Expr::Operand)
            }
            TokenKind::LParen => {
                self.enter()?;
                let inner = self.expr()?;
                self.depth -= 1;
                match tokens.get(self.pos) {
                    Some(Token {
                        kind: TokenKind::RParen,
                        ..
                    }) => {
                        self.pos += 1;
                        Ok(inner)
                    }
                    Some(other) => Err(FormulaError::UnexpectedToken {
                        found: other.kind.describe(),
                        expected: "')'",
                        position: other.position,
                    }),
                    None => Err(FormulaError::UnexpectedEnd { expected: "')'" }),
                }
            }
            other => Err(FormulaError::UnexpectedToken {
                found: other.describe(),
                expected: "a number, operand or '('",
                position: token.position,
            }),
        }
    }

    fn enter(&mut self) -> Result<(), FormulaError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(FormulaError::TooDeep(MAX_DEPTH));
        }
        Ok(())
    }

    /// Field names win over the positional `a`/`b` names.
    fn resolve(&self, name: &str) -> Result<Operand, FormulaError> {
        if name == self.left {
            Ok(Operand::Left)
        } else if name == self.right {
            Ok(Operand::Right)
        } else if name.eq_ignore_ascii_case(self.left) {
            Ok(Operand::Left)
        } else if name.eq_ignore_ascii_case(self.right) {
            Ok(Operand::Right)
        } else if name.eq_ignore_ascii_case("a") {
            Ok(Operand::Left)
        } else if name.eq_ignore_ascii_case("b") {
            Ok(Operand::Right)
        } else {
            Err(FormulaError::UnknownOperand(name.to_string()))
        }
    }
}
