use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

use super::{ResolveError, ValidationErrors, resolve_variables};
use crate::formula::{EvaluationError, Formula, Variables, round_price};
use crate::model::{Calculator, Inputs};
use crate::types::{CurrencyCode, Price};

/// Failure to price a submission.
///
/// Validation failures are the shopper's to fix; evaluation failures mean
/// the calculator itself is broken.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuoteError {
    #[error("invalid input: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("formula error: {0}")]
    Evaluation(#[from] EvaluationError),
}

impl From<ResolveError> for QuoteError {
    fn from(err: ResolveError) -> Self {
        match err {
            ResolveError::Invalid(errors) => Self::Validation(errors),
            ResolveError::Overflow => Self::Evaluation(EvaluationError::Overflow),
        }
    }
}

/// A priced submission together with the bindings that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub price: Decimal,
    pub base_price: Decimal,
    pub variables: Variables,
    /// Whether the minimum price raised the evaluated result.
    pub clamped: bool,
}

impl Quote {
    /// The quoted price in `currency`.
    #[must_use]
    pub const fn price_in(&self, currency: CurrencyCode) -> Price {
        Price::new(self.price, currency)
    }
}

/// Resolve, evaluate and apply the calculator's minimum price.
///
/// # Errors
///
/// Returns [`QuoteError::Validation`] when the inputs are rejected and
/// [`QuoteError::Evaluation`] when the formula cannot be evaluated against
/// them or the rule-adjusted base price overflows.
pub fn quote(
    calculator: &Calculator,
    inputs: &Inputs,
    base_price_override: Option<Decimal>,
) -> Result<Quote, QuoteError> {
    let resolved = resolve_variables(calculator, inputs, base_price_override)?;
    let formula = Formula::parse(&calculator.formula)?;
    let evaluated = formula.evaluate(&resolved.variables)?;

    let (price, clamped) = match calculator.minimum_price {
        Some(minimum) if evaluated < minimum => {
            tracing::warn!(
                calculator = %calculator.name,
                %evaluated,
                %minimum,
                "quote raised to minimum price"
            );
            (round_price(minimum), true)
        }
        _ => (evaluated, false),
    };

    tracing::debug!(calculator = %calculator.name, %price, "quote computed");
    Ok(Quote {
        price,
        base_price: resolved.base_price,
        variables: resolved.variables,
        clamped,
    })
}
