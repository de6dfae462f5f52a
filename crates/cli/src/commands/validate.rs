//! Check a calculator definition for structural problems.

use std::io::Write;
use std::path::Path;

use bonimi_core::Calculator;

use super::{CliError, load_calculator};

/// Validate the calculator at `path`, printing every issue found.
///
/// # Errors
///
/// Returns `CliError::Invalid` when any issue is found.
pub fn run(path: &Path, out: &mut impl Write) -> Result<(), CliError> {
    let calculator = load_calculator(path)?;
    report(&calculator, out)
}

/// Print the issues of an already-loaded calculator.
///
/// # Errors
///
/// Returns `CliError::Invalid` when any issue is found.
pub fn report(calculator: &Calculator, out: &mut impl Write) -> Result<(), CliError> {
    let issues = calculator.validate();
    if issues.is_empty() {
        writeln!(out, "{}: ok ({} fields)", calculator.name, calculator.fields.len())
            .map_err(CliError::Output)?;
        return Ok(());
    }

    for issue in &issues {
        writeln!(out, "{issue}").map_err(CliError::Output)?;
    }
    Err(CliError::Invalid(issues.len()))
}
