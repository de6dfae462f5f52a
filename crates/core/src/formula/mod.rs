//! Pricing formula evaluation.
//!
//! Formulas are plain arithmetic over field names, `basePrice` and decimal
//! literals. They are tokenized, parsed into an [`Expr`] tree and interpreted
//! against a caller-supplied variable map. Nothing outside that map is
//! reachable from a formula.
//!
//! ```
//! use std::collections::BTreeMap;
//!
//! use bonimi_core::formula::evaluate;
//! use rust_decimal::Decimal;
//!
//! let mut vars = BTreeMap::new();
//! vars.insert("basePrice".to_owned(), Decimal::from(100));
//! vars.insert("length".to_owned(), Decimal::from(50));
//! vars.insert("width".to_owned(), Decimal::from(30));
//!
//! let price = evaluate("basePrice + length * width * 0.01", &vars).unwrap();
//! assert_eq!(price, Decimal::from(115));
//! ```

pub mod lexer;
pub mod parser;

use std::collections::{BTreeMap, BTreeSet};

use rust_decimal::{Decimal, RoundingStrategy};
use thiserror::Error;

pub use parser::{BinaryOp, Expr};

/// Variable bindings for a single evaluation.
pub type Variables = BTreeMap<String, Decimal>;

/// Decimal places kept in an evaluated price.
pub const PRICE_SCALE: u32 = 2;

/// Errors raised while parsing or evaluating a formula.
///
/// These point at a broken admin-authored formula, not at shopper input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvaluationError {
    /// The formula references a name missing from the variable map.
    #[error("formula references unbound variable `{0}`")]
    UnboundVariable(String),

    /// A character outside the formula grammar.
    #[error("syntax error at position {position}")]
    Syntax { position: usize },

    /// A token that is valid on its own but not where it appears.
    #[error("unexpected token at position {position}")]
    UnexpectedToken { position: usize },

    /// The formula ended where an operand or `)` was required.
    #[error("unexpected end of formula")]
    UnexpectedEnd,

    /// A numeric literal that does not fit in a decimal.
    #[error("number at position {position} is out of range")]
    InvalidNumber { position: usize },

    /// Parentheses or unary minus nested too deeply.
    #[error("formula nested too deeply at position {position}")]
    NestingTooDeep { position: usize },

    /// The divisor evaluated to zero.
    #[error("division by zero")]
    DivisionByZero,

    /// An intermediate result left the decimal range.
    #[error("arithmetic overflow")]
    Overflow,
}

/// A parsed formula, reusable across evaluations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Formula {
    source: String,
    expr: Expr,
}

impl Formula {
    /// Parse `source` into a formula.
    ///
    /// # Errors
    ///
    /// Returns a syntax-level [`EvaluationError`] when the text does not match
    /// the grammar.
    pub fn parse(source: &str) -> Result<Self, EvaluationError> {
        Ok(Self {
            source: source.to_owned(),
            expr: parser::parse(source)?,
        })
    }

    /// The original formula text.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The parsed expression tree.
    #[must_use]
    pub const fn expr(&self) -> &Expr {
        &self.expr
    }

    /// Every distinct variable name the formula references.
    #[must_use]
    pub fn variables(&self) -> BTreeSet<&str> {
        let mut names = BTreeSet::new();
        collect_variables(&self.expr, &mut names);
        names
    }

    /// Evaluate against `variables` and round to [`PRICE_SCALE`] places.
    ///
    /// # Errors
    ///
    /// Returns [`EvaluationError::UnboundVariable`],
    /// [`EvaluationError::DivisionByZero`] or [`EvaluationError::Overflow`].
    pub fn evaluate(&self, variables: &Variables) -> Result<Decimal, EvaluationError> {
        let raw = eval_expr(&self.expr, variables)?;
        let rounded = round_price(raw);
        tracing::debug!(formula = %self.source, %raw, %rounded, "formula evaluated");
        Ok(rounded)
    }
}

/// Parse and evaluate `formula` in one step.
///
/// # Errors
///
/// See [`Formula::parse`] and [`Formula::evaluate`].
pub fn evaluate(formula: &str, variables: &Variables) -> Result<Decimal, EvaluationError> {
    Formula::parse(formula)?.evaluate(variables)
}

/// Round to two decimal places, halves away from zero.
#[must_use]
pub fn round_price(value: Decimal) -> Decimal {
    let rounded = value.round_dp_with_strategy(PRICE_SCALE, RoundingStrategy::MidpointAwayFromZero);
    // -0.00 and 0.00 compare equal but print differently
    if rounded.is_zero() {
        Decimal::ZERO
    } else {
        rounded
    }
}

fn eval_expr(expr: &Expr, variables: &Variables) -> Result<Decimal, EvaluationError> {
    match expr {
        Expr::Number(value) => Ok(*value),
        Expr::Variable { name, .. } => variables
            .get(name)
            .copied()
            .ok_or_else(|| EvaluationError::UnboundVariable(name.clone())),
        Expr::Negate(inner) => Ok(-eval_expr(inner, variables)?),
        Expr::Binary { op, lhs, rhs } => {
            let lhs = eval_expr(lhs, variables)?;
            let rhs = eval_expr(rhs, variables)?;
            match op {
                BinaryOp::Add => lhs.checked_add(rhs).ok_or(EvaluationError::Overflow),
                BinaryOp::Sub => lhs.checked_sub(rhs).ok_or(EvaluationError::Overflow),
                BinaryOp::Mul => lhs.checked_mul(rhs).ok_or(EvaluationError::Overflow),
                BinaryOp::Div => {
                    if rhs.is_zero() {
                        return Err(EvaluationError::DivisionByZero);
                    }
                    lhs.checked_div(rhs).ok_or(EvaluationError::Overflow)
                }
            }
        }
    }
}

fn collect_variables<'a>(expr: &'a Expr, names: &mut BTreeSet<&'a str>) {
    match expr {
        Expr::Number(_) => {}
        Expr::Variable { name, .. } => {
            names.insert(name.as_str());
        }
        Expr::Negate(inner) => collect_variables(inner, names),
        Expr::Binary { lhs, rhs, .. } => {
            collect_variables(lhs, names);
            collect_variables(rhs, names);
        }
    }
}
