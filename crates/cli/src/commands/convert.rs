//! Rewrite a calculator in the other stored shape.

use std::io::Write;
use std::path::Path;

use bonimi_core::{Calculator, SchemaShape};

use super::{CliError, load_calculator};

/// Print the calculator at `path` in `shape` as pretty JSON.
///
/// # Errors
///
/// Returns `CliError` if the file cannot be loaded or written out.
pub fn run(path: &Path, shape: SchemaShape, out: &mut impl Write) -> Result<(), CliError> {
    let calculator = load_calculator(path)?;
    write_shape(&calculator, shape, out)
}

/// Print an already-loaded calculator in `shape`.
///
/// # Errors
///
/// Returns `CliError` if serialization or writing fails.
pub fn write_shape(calculator: &Calculator, shape: SchemaShape, out: &mut impl Write) -> Result<(), CliError> {
    let value = match shape {
        SchemaShape::Elements => calculator.to_elements()?,
        SchemaShape::Fields => calculator.to_canonical()?,
    };
    serde_json::to_writer_pretty(&mut *out, &value)?;
    writeln!(out).map_err(CliError::Output)?;
    tracing::debug!(%shape, "calculator converted");
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use bonimi_core::{Field, normalize};

    use super::*;

    #[test]
    fn test_elements_output_normalizes_back() {
        let calculator = Calculator::new(
            "Shelf",
            "basePrice * width",
            vec![Field::number("width", "Width").required()],
        );
        let mut out = Vec::new();
        write_shape(&calculator, SchemaShape::Elements, &mut out).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value["elements"][0]["type"], "number-input");
        assert_eq!(normalize(&value).unwrap(), calculator);
    }
}
