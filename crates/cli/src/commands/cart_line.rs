//! Build the cart line attribute for a quoted configuration.

use std::io::Write;
use std::path::Path;

use bonimi_core::cart::CartLineConfig;
use bonimi_core::{Calculator, Inputs, quote};

use super::{CliError, load_calculator, load_inputs};

/// Quote the inputs and print the `calculator_config` attribute value.
///
/// # Errors
///
/// Returns `CliError` if loading, quoting or encoding fails.
pub fn run(calculator: &Path, inputs: &Path, out: &mut impl Write) -> Result<(), CliError> {
    let calculator = load_calculator(calculator)?;
    let inputs = load_inputs(inputs)?;
    write_attribute(&calculator, inputs, out)
}

/// Print the attribute for already-loaded data.
///
/// # Errors
///
/// Returns `CliError` if quoting or encoding fails.
pub fn write_attribute(calculator: &Calculator, inputs: Inputs, out: &mut impl Write) -> Result<(), CliError> {
    let quote = quote(calculator, &inputs, None)?;
    let attribute = CartLineConfig::new(calculator.id.clone(), &quote, inputs).to_attribute()?;
    tracing::info!(key = %attribute.key, price = %quote.price, "cart line attribute built");
    writeln!(out, "{}", attribute.value).map_err(CliError::Output)?;
    Ok(())
}
