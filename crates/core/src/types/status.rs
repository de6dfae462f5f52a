//! Status enums for various entities.

use serde::{Deserialize, Serialize};

/// Publication status of a calculator.
///
/// Only `Active` calculators are offered to shoppers; `Draft` ones are still
/// being edited in the builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "sqlite", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlite", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum CalculatorStatus {
    Draft,
    #[default]
    Active,
}

impl CalculatorStatus {
    /// Whether shoppers may use a calculator in this status.
    #[must_use]
    pub const fn is_live(self) -> bool {
        matches!(self, Self::Active)
    }
}

impl std::fmt::Display for CalculatorStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Draft => write!(f, "draft"),
            Self::Active => write!(f, "active"),
        }
    }
}

impl std::str::FromStr for CalculatorStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(Self::Draft),
            "active" => Ok(Self::Active),
            _ => Err(format!("invalid calculator status: {s}")),
        }
    }
}
