//! CLI configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! - `BONIMI_CURRENCY` - Currency used to display quotes (default: `GBP`)
//! - `BONIMI_LOG_FORMAT` - `pretty` or `json` (default: `pretty`)
//!
//! A `.env` file in the working directory is loaded first if present.

use std::str::FromStr;

use bonimi_core::CurrencyCode;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            _ => Err(format!("invalid log format: {s} (expected pretty or json)")),
        }
    }
}

/// CLI configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CliConfig {
    /// Currency for displayed prices and cart amounts.
    pub currency: CurrencyCode,
    pub log_format: LogFormat,
}

impl CliConfig {
    /// Load configuration from the environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set to an unsupported value.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(get_optional_env)
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let currency = parse_var(&lookup, "BONIMI_CURRENCY")?.unwrap_or_default();
        let log_format = parse_var(&lookup, "BONIMI_LOG_FORMAT")?.unwrap_or_default();
        Ok(Self {
            currency,
            log_format,
        })
    }
}

fn parse_var<T>(lookup: impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr<Err = String>,
{
    lookup(key)
        .filter(|value| !value.trim().is_empty())
        .map(|value| {
            value
                .trim()
                .parse()
                .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e))
        })
        .transpose()
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = CliConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.currency, CurrencyCode::GBP);
        assert_eq!(config.log_format, LogFormat::Pretty);
    }

    #[test]
    fn test_explicit_values() {
        let config = CliConfig::from_lookup(lookup(&[
            ("BONIMI_CURRENCY", "usd"),
            ("BONIMI_LOG_FORMAT", "JSON"),
        ]))
        .unwrap();
        assert_eq!(config.currency, CurrencyCode::USD);
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn test_invalid_currency() {
        let err = CliConfig::from_lookup(lookup(&[("BONIMI_CURRENCY", "JPY")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(key, _) if key == "BONIMI_CURRENCY"));
    }
}
