//! Price a calculator against a set of shopper inputs.

use std::io::Write;
use std::path::Path;

use bonimi_core::{Calculator, CurrencyCode, Inputs, QuoteError, ValidationReason, quote};
use rust_decimal::Decimal;
use tracing::{error, info};

use super::{CliError, load_calculator, load_inputs};

/// Options for the `quote` command.
#[derive(Debug, Clone, Copy, Default)]
pub struct QuoteOptions {
    /// Replaces the calculator's own base price.
    pub base_price: Option<Decimal>,
    pub currency: CurrencyCode,
    /// Print the full quote as JSON instead of the formatted price.
    pub json: bool,
}

/// Load a calculator and inputs from disk and print the quote.
///
/// # Errors
///
/// Returns `CliError` if either file cannot be loaded, the inputs are
/// rejected, or the formula fails.
pub fn run(
    calculator: &Path,
    inputs: &Path,
    options: QuoteOptions,
    out: &mut impl Write,
) -> Result<(), CliError> {
    let calculator = load_calculator(calculator)?;
    let inputs = load_inputs(inputs)?;
    write_quote(&calculator, &inputs, options, out)
}

/// Quote already-loaded data. Rejected fields are written one per line.
///
/// # Errors
///
/// Returns `CliError::Quote` when the quote fails.
pub fn write_quote(
    calculator: &Calculator,
    inputs: &Inputs,
    options: QuoteOptions,
    out: &mut impl Write,
) -> Result<(), CliError> {
    if !calculator.status.is_live() {
        info!(calculator = %calculator.name, status = %calculator.status, "quoting a calculator shoppers cannot see yet");
    }

    match quote(calculator, inputs, options.base_price) {
        Ok(quote) => {
            if quote.clamped {
                info!(price = %quote.price, "price raised to the calculator minimum");
            }
            if options.json {
                serde_json::to_writer_pretty(&mut *out, &quote)?;
                writeln!(out).map_err(CliError::Output)?;
            } else {
                writeln!(out, "{}", quote.price_in(options.currency)).map_err(CliError::Output)?;
            }
            Ok(())
        }
        Err(QuoteError::Validation(errors)) => {
            for rejected in &errors {
                let label = calculator
                    .field(&rejected.field)
                    .map_or_else(|| rejected.field.clone(), bonimi_core::Field::display_label);
                writeln!(out, "{label}: {}", describe(rejected.reason)).map_err(CliError::Output)?;
            }
            Err(QuoteError::Validation(errors).into())
        }
        Err(err @ QuoteError::Evaluation(_)) => {
            error!(calculator = %calculator.name, "formula cannot be evaluated; fix the calculator definition");
            Err(err.into())
        }
    }
}

const fn describe(reason: ValidationReason) -> &'static str {
    match reason {
        ValidationReason::Missing => "is required",
        ValidationReason::NotANumber => "must be a number",
        ValidationReason::BelowMin => "is below the minimum",
        ValidationReason::AboveMax => "is above the maximum",
    }
}
