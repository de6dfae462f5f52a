//! Raw shopper input as submitted by the storefront form.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Raw per-field inputs keyed by field name.
pub type Inputs = BTreeMap<String, InputValue>;

/// A single submitted value: a string, a number or a boolean.
///
/// Numbers stay JSON numbers on the wire, as the storefront form posts them;
/// numeric strings stay text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InputValue {
    Bool(bool),
    #[serde(with = "rust_decimal::serde::float")]
    Number(Decimal),
    Text(String),
}

impl InputValue {
    /// Whether the value counts as "not filled in".
    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Text(text) if text.trim().is_empty())
    }

    /// The value as an option key (`"premium"`, `"2"`).
    #[must_use]
    pub fn as_key(&self) -> String {
        match self {
            Self::Bool(flag) => flag.to_string(),
            Self::Number(number) => number.normalize().to_string(),
            Self::Text(text) => text.trim().to_owned(),
        }
    }
}

impl From<&str> for InputValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for InputValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Decimal> for InputValue {
    fn from(value: Decimal) -> Self {
        Self::Number(value)
    }
}

impl From<i64> for InputValue {
    fn from(value: i64) -> Self {
        Self::Number(Decimal::from(value))
    }
}

impl From<bool> for InputValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}
