//! Recursive-descent parser producing an expression tree.
//!
//! ```text
//! expr    := term (('+' | '-') term)*
//! term    := factor (('*' | '/') factor)*
//! factor  := '-' factor | '(' expr ')' | number | identifier
//! ```

use rust_decimal::Decimal;

use super::EvaluationError;
use super::lexer::{Spanned, Token, tokenize};

/// Nesting limit for parentheses and unary minus.
pub const MAX_DEPTH: usize = 128;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Number(Decimal),
    Variable { name: String, position: usize },
    Negate(Box<Expr>),
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
}

struct Parser {
    tokens: Vec<Spanned>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> &Spanned {
        // tokenize() always terminates the stream with Eof, and advance()
        // never moves past it.
        self.tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .unwrap_or(&EOF)
    }

    fn advance(&mut self) -> Spanned {
        let current = self.peek().clone();
        if current.token != Token::Eof {
            self.pos += 1;
        }
        current
    }

    fn unexpected(spanned: &Spanned) -> EvaluationError {
        match spanned.token {
            Token::Eof => EvaluationError::UnexpectedEnd,
            _ => EvaluationError::UnexpectedToken {
                position: spanned.position,
            },
        }
    }

    fn descend(&mut self, position: usize) -> Result<(), EvaluationError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(EvaluationError::NestingTooDeep { position });
        }
        Ok(())
    }

    fn parse_expr(&mut self) -> Result<Expr, EvaluationError> {
        let mut lhs = self.parse_term()?;
        loop {
            let op = match self.peek().token {
                Token::Plus => BinaryOp::Add,
                Token::Minus => BinaryOp::Sub,
                _ => return Ok(lhs),
            };
            self.advance();
            let rhs = self.parse_term()?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
    }

    fn parse_term(&mut self) -> Result<Expr, EvaluationError> {
        let mut lhs = self.parse_factor()?;
        loop {
            let op = match self.peek().token {
                Token::Star => BinaryOp::Mul,
                Token::Slash => BinaryOp::Div,
                _ => return Ok(lhs),
            };
            self.advance();
            let rhs = self.parse_factor()?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
    }

    fn parse_factor(&mut self) -> Result<Expr, EvaluationError> {
        let spanned = self.advance();
        match spanned.token {
            Token::Minus => {
                self.descend(spanned.position)?;
                let inner = self.parse_factor()?;
                self.depth -= 1;
                Ok(Expr::Negate(Box::new(inner)))
            }
            Token::LParen => {
                self.descend(spanned.position)?;
                let inner = self.parse_expr()?;
                let close = self.advance();
                if close.token != Token::RParen {
                    return Err(Self::unexpected(&close));
                }
                self.depth -= 1;
                Ok(inner)
            }
            Token::Number(value) => Ok(Expr::Number(value)),
            Token::Ident(name) => Ok(Expr::Variable {
                name,
                position: spanned.position,
            }),
            _ => Err(Self::unexpected(&spanned)),
        }
    }
}

static EOF: Spanned = Spanned {
    token: Token::Eof,
    position: 0,
};

/// Parse a complete formula.
///
/// # Errors
///
/// Returns the tokenizer's error for characters outside the grammar,
/// [`EvaluationError::UnexpectedToken`] / [`EvaluationError::UnexpectedEnd`]
/// for misplaced or missing tokens, and [`EvaluationError::NestingTooDeep`]
/// past [`MAX_DEPTH`].
pub fn parse(src: &str) -> Result<Expr, EvaluationError> {
    let mut parser = Parser {
        tokens: tokenize(src)?,
        pos: 0,
        depth: 0,
    };
    let expr = parser.parse_expr()?;
    let trailing = parser.advance();
    if trailing.token != Token::Eof {
        return Err(Parser::unexpected(&trailing));
    }
    Ok(expr)
}
