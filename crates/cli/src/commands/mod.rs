//! CLI command implementations.
//!
//! Every command writes its result to the supplied writer; diagnostics go
//! through `tracing`.

pub mod cart_line;
pub mod convert;
pub mod eval;
pub mod quote;
pub mod validate;

use std::path::{Path, PathBuf};

use bonimi_core::cart::CartConfigError;
use bonimi_core::{Calculator, EvaluationError, Inputs, QuoteError, SchemaError};
use thiserror::Error;

use crate::config::ConfigError;

/// Errors surfaced by CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid calculator definition: {0}")]
    Schema(#[from] SchemaError),

    #[error("calculator has {0} validation issue(s)")]
    Invalid(usize),

    #[error(transparent)]
    Quote(#[from] QuoteError),

    #[error("formula error: {0}")]
    Evaluation(#[from] EvaluationError),

    #[error("formula references unbound names: {}", .0.join(", "))]
    Unbound(Vec<String>),

    #[error(transparent)]
    Cart(#[from] CartConfigError),

    #[error("failed to write output: {0}")]
    Output(#[source] std::io::Error),
}

/// Read a JSON or YAML document. YAML is chosen by the `.yaml`/`.yml` extension.
///
/// # Errors
///
/// Returns `CliError` if the file cannot be read or parsed.
pub fn read_document(path: &Path) -> Result<serde_json::Value, CliError> {
    let content = std::fs::read_to_string(path).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let is_yaml = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"));

    if is_yaml {
        Ok(serde_yaml::from_str(&content)?)
    } else {
        Ok(serde_json::from_str(&content)?)
    }
}

/// Load and normalize a calculator from either stored shape.
///
/// # Errors
///
/// Returns `CliError` if the file cannot be read or is not a calculator.
pub fn load_calculator(path: &Path) -> Result<Calculator, CliError> {
    let raw = read_document(path)?;
    let calculator = Calculator::from_raw(&raw)?;
    tracing::debug!(path = %path.display(), name = %calculator.name, "calculator loaded");
    Ok(calculator)
}

/// Load shopper inputs keyed by field name.
///
/// # Errors
///
/// Returns `CliError` if the file cannot be read or is not an object.
pub fn load_inputs(path: &Path) -> Result<Inputs, CliError> {
    let raw = read_document(path)?;
    Ok(serde_json::from_value(raw)?)
}
