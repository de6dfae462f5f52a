//! Calculator fields, their options and per-option pricing rules.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::input::InputValue;
use crate::formula::lexer::{is_ident_continue, is_ident_start};

/// Suffix of the alias under which a `multiplier` field's value is also bound.
pub const MULTIPLIER_SUFFIX: &str = "Multiplier";

/// Input control kind of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    Number,
    #[default]
    Text,
    Select,
    Checkbox,
    Radio,
}

impl FieldType {
    /// Map a builder canvas element type onto a field type.
    ///
    /// Unrecognized element types (display blocks, uploads) become `Text`.
    #[must_use]
    pub fn from_element_type(element_type: &str) -> Self {
        match element_type {
            "number-input" => Self::Number,
            "select" => Self::Select,
            "checkbox" => Self::Checkbox,
            "radio" => Self::Radio,
            _ => Self::Text,
        }
    }

    /// The builder canvas element type for this field type.
    #[must_use]
    pub const fn element_type(self) -> &'static str {
        match self {
            Self::Number => "number-input",
            Self::Text => "text-input",
            Self::Select => "select",
            Self::Checkbox => "checkbox",
            Self::Radio => "radio",
        }
    }

    /// Parse a list-format type name, falling back to `Text`.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name {
            "number" | "number-input" => Self::Number,
            "select" => Self::Select,
            "checkbox" => Self::Checkbox,
            "radio" => Self::Radio,
            _ => Self::Text,
        }
    }

    /// Whether shoppers choose from a list of options.
    #[must_use]
    pub const fn has_options(self) -> bool {
        matches!(self, Self::Select | Self::Radio)
    }
}

impl std::fmt::Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number => write!(f, "number"),
            Self::Text => write!(f, "text"),
            Self::Select => write!(f, "select"),
            Self::Checkbox => write!(f, "checkbox"),
            Self::Radio => write!(f, "radio"),
        }
    }
}

/// One choice of a `select` or `radio` field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldOption {
    /// Display text.
    pub label: String,
    /// Token submitted when the option is chosen.
    pub value: String,
}

impl FieldOption {
    #[must_use]
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}

/// How a selected option's value feeds into the price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PricingKind {
    /// Bind a dimensionless coefficient for the formula to multiply.
    Multiplier,
    /// Replace `basePrice` outright.
    Fixed,
    /// Add to `basePrice`.
    Additional,
}

impl std::fmt::Display for PricingKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Multiplier => write!(f, "multiplier"),
            Self::Fixed => write!(f, "fixed"),
            Self::Additional => write!(f, "additional"),
        }
    }
}

impl std::str::FromStr for PricingKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "multiplier" => Ok(Self::Multiplier),
            "fixed" => Ok(Self::Fixed),
            "additional" => Ok(Self::Additional),
            _ => Err(format!("invalid pricing kind: {s}")),
        }
    }
}

/// Per-option price modifiers for a selectable field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingRule {
    pub kind: PricingKind,
    pub value_by_option: BTreeMap<String, Decimal>,
}

impl PricingRule {
    #[must_use]
    pub fn new<K, I>(kind: PricingKind, values: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Decimal)>,
    {
        Self {
            kind,
            value_by_option: values.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    /// The configured value for `option`, if any.
    #[must_use]
    pub fn value_for(&self, option: &str) -> Option<Decimal> {
        self.value_by_option.get(option).copied()
    }
}

/// One input the shopper fills in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    /// Formula variable name.
    pub name: String,
    pub label: String,
    #[serde(rename = "type")]
    pub kind: FieldType,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub placeholder: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub help_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<FieldOption>,
    /// Initial state of a checkbox.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub checked: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pricing_rule: Option<PricingRule>,
}

impl Field {
    /// Create an optional field with no bounds, options or pricing rule.
    #[must_use]
    pub fn new(name: impl Into<String>, label: impl Into<String>, kind: FieldType) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            kind,
            required: false,
            placeholder: String::new(),
            help_text: String::new(),
            min: None,
            max: None,
            step: None,
            options: Vec::new(),
            checked: false,
            pricing_rule: None,
        }
    }

    #[must_use]
    pub fn number(name: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(name, label, FieldType::Number)
    }

    #[must_use]
    pub fn select(
        name: impl Into<String>,
        label: impl Into<String>,
        options: impl IntoIterator<Item = FieldOption>,
    ) -> Self {
        Self {
            options: options.into_iter().collect(),
            ..Self::new(name, label, FieldType::Select)
        }
    }

    /// Mark the field as required.
    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Set inclusive numeric bounds.
    #[must_use]
    pub fn bounded(mut self, min: Option<Decimal>, max: Option<Decimal>) -> Self {
        self.min = min;
        self.max = max;
        self
    }

    #[must_use]
    pub fn with_pricing_rule(mut self, rule: PricingRule) -> Self {
        self.pricing_rule = Some(rule);
        self
    }

    /// The extra formula name a `multiplier` rule binds (`materialMultiplier`).
    #[must_use]
    pub fn multiplier_alias(&self) -> Option<String> {
        self.pricing_rule
            .as_ref()
            .filter(|rule| rule.kind == PricingKind::Multiplier)
            .map(|_| format!("{}{MULTIPLIER_SUFFIX}", self.name))
    }

    /// Label shown to shoppers, falling back to the capitalized name.
    #[must_use]
    pub fn display_label(&self) -> String {
        if !self.label.trim().is_empty() {
            return self.label.clone();
        }
        let mut chars = self.name.chars();
        chars.next().map_or_else(String::new, |first| {
            first.to_uppercase().chain(chars).collect()
        })
    }

    /// Placeholder shown to shoppers, defaulting to "Enter <label>".
    #[must_use]
    pub fn display_placeholder(&self) -> String {
        if self.placeholder.is_empty() {
            format!("Enter {}", self.display_label())
        } else {
            self.placeholder.clone()
        }
    }

    /// The value a freshly opened form starts with.
    #[must_use]
    pub fn default_input(&self) -> InputValue {
        match self.kind {
            FieldType::Checkbox => InputValue::Bool(self.checked),
            FieldType::Select | FieldType::Radio => InputValue::Text(
                self.options
                    .first()
                    .map(|option| option.value.clone())
                    .unwrap_or_default(),
            ),
            FieldType::Number | FieldType::Text => InputValue::Text(String::new()),
        }
    }
}

/// Whether `name` is usable as a formula variable (`[A-Za-z_][A-Za-z0-9_]*`).
#[must_use]
pub fn is_valid_field_name(name: &str) -> bool {
    let mut chars = name.chars();
    chars.next().is_some_and(is_ident_start) && chars.all(is_ident_continue)
}
