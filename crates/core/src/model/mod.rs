//! The canonical calculator model.
//!
//! Every consumer works with these types regardless of which stored shape a
//! calculator arrived in; see [`crate::schema`] for the conversions.

pub mod calculator;
pub mod field;
pub mod input;

pub use calculator::{BASE_PRICE_VARIABLE, Calculator, CalculatorConfig, CalculatorIssue};
pub use field::{
    Field, FieldOption, FieldType, MULTIPLIER_SUFFIX, PricingKind, PricingRule, is_valid_field_name,
};
pub use input::{InputValue, Inputs};
