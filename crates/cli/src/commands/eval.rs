//! Evaluate a bare formula.

use std::io::Write;

use bonimi_core::{Formula, Variables};
use rust_decimal::Decimal;

use super::CliError;

/// Parse a `name=value` pair from the command line.
///
/// # Errors
///
/// Returns a message when the pair has no `=` or the value is not a number.
pub fn parse_var(pair: &str) -> Result<(String, Decimal), String> {
    let (name, value) = pair
        .split_once('=')
        .ok_or_else(|| format!("expected name=value, got `{pair}`"))?;
    let value = value
        .trim()
        .parse::<Decimal>()
        .map_err(|e| format!("invalid value for `{}`: {e}", name.trim()))?;
    Ok((name.trim().to_string(), value))
}

/// Evaluate `formula` with `vars` and print the rounded result.
///
/// # Errors
///
/// Returns `CliError::Unbound` listing every name without a `--var`, or
/// `CliError::Evaluation` if the formula fails to parse or evaluate.
pub fn run(formula: &str, vars: Vec<(String, Decimal)>, out: &mut impl Write) -> Result<(), CliError> {
    let formula = Formula::parse(formula)?;
    let variables: Variables = vars.into_iter().collect();

    let missing: Vec<String> = formula
        .variables()
        .into_iter()
        .filter(|name| !variables.contains_key(*name))
        .map(str::to_owned)
        .collect();
    if !missing.is_empty() {
        return Err(CliError::Unbound(missing));
    }

    let result = formula.evaluate(&variables)?;
    writeln!(out, "{result}").map_err(CliError::Output)?;
    Ok(())
}
