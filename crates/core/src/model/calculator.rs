//! The canonical calculator entity and its validation rules.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::field::{Field, FieldType, is_valid_field_name};
use crate::formula::EvaluationError;
use crate::formula::lexer::{Token, tokenize};
use crate::schema::{self, SchemaError};
use crate::types::{CalculatorId, CalculatorStatus, ProductId};

/// Formula variable that always carries the (possibly rule-adjusted) base price.
pub const BASE_PRICE_VARIABLE: &str = "basePrice";

/// A named pricing configuration: a field schema, a formula and a base price.
///
/// This is the persisted shape as well: serializing a `Calculator` yields the
/// list ("fields") representation understood by every consumer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Calculator {
    /// Assigned by the repository on creation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<CalculatorId>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub formula: String,
    /// Display order only; evaluation ignores it.
    pub fields: Vec<Field>,
    #[serde(default)]
    pub base_price: Decimal,
    /// Floor applied to quoted prices.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum_price: Option<Decimal>,
    #[serde(default)]
    pub status: CalculatorStatus,
    /// Shopify products this calculator prices.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub product_ids: Vec<ProductId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// A single reason a calculator definition is unusable.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum CalculatorIssue {
    #[error("Calculator name is required")]
    EmptyName,

    #[error("Formula is required")]
    EmptyFormula,

    #[error("At least one field is required")]
    NoFields,

    #[error("Field name `{name}` is used more than once")]
    DuplicateFieldName { name: String },

    #[error("Field name `{name}` is not a valid formula variable")]
    InvalidFieldName { name: String },

    #[error("Field name `basePrice` is reserved")]
    ReservedFieldName,

    #[error("Field `{name}` has a minimum above its maximum")]
    InvalidBounds { name: String },

    #[error("Formula references unknown name `{name}` at position {position}")]
    UnknownIdentifier { name: String, position: usize },

    #[error("Formula uses text field `{name}` at position {position}; text is never a number")]
    TextFieldInFormula { name: String, position: usize },

    #[error("Formula contains an invalid character at position {position}")]
    InvalidFormulaCharacter { position: usize },

    #[error("Formula contains an out-of-range number at position {position}")]
    InvalidFormulaNumber { position: usize },
}

/// Storefront-facing projection of a calculator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculatorConfig<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<&'a CalculatorId>,
    pub name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<&'a str>,
    pub fields: &'a [Field],
    pub formula: &'a str,
    pub base_price: Decimal,
    pub status: CalculatorStatus,
}

impl Calculator {
    /// Create an unsaved, active calculator with a zero base price.
    #[must_use]
    pub fn new(name: impl Into<String>, formula: impl Into<String>, fields: Vec<Field>) -> Self {
        Self {
            id: None,
            name: name.into(),
            description: None,
            formula: formula.into(),
            fields,
            base_price: Decimal::ZERO,
            minimum_price: None,
            status: CalculatorStatus::default(),
            product_ids: Vec::new(),
            created_at: None,
            updated_at: None,
        }
    }

    #[must_use]
    pub fn with_base_price(mut self, base_price: Decimal) -> Self {
        self.base_price = base_price;
        self
    }

    /// Build a calculator from either stored shape.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError`] when the shape cannot be recognized.
    pub fn from_raw(raw: &serde_json::Value) -> Result<Self, SchemaError> {
        schema::normalize(raw)
    }

    /// The canonical ("fields") JSON representation.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_canonical(&self) -> serde_json::Result<serde_json::Value> {
        schema::to_fields_shape(self)
    }

    /// The builder canvas ("elements") JSON representation.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_elements(&self) -> serde_json::Result<serde_json::Value> {
        schema::to_elements_shape(self)
    }

    /// Look up a field by its variable name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|field| field.name == name)
    }

    /// Check every structural rule and return all violations.
    ///
    /// The formula check is lexical: it catches unknown names and characters
    /// but not misplaced operators, which surface when the formula is
    /// evaluated.
    #[must_use]
    pub fn validate(&self) -> Vec<CalculatorIssue> {
        let mut issues = Vec::new();

        if self.name.trim().is_empty() {
            issues.push(CalculatorIssue::EmptyName);
        }
        if self.formula.trim().is_empty() {
            issues.push(CalculatorIssue::EmptyFormula);
        }
        if self.fields.is_empty() {
            issues.push(CalculatorIssue::NoFields);
        }

        let aliases: Vec<String> = self.fields.iter().filter_map(Field::multiplier_alias).collect();
        let mut seen = BTreeSet::new();
        for field in &self.fields {
            if field.name == BASE_PRICE_VARIABLE {
                issues.push(CalculatorIssue::ReservedFieldName);
            } else if !is_valid_field_name(&field.name) {
                issues.push(CalculatorIssue::InvalidFieldName {
                    name: field.name.clone(),
                });
            }
            if !seen.insert(field.name.as_str()) {
                issues.push(CalculatorIssue::DuplicateFieldName {
                    name: field.name.clone(),
                });
            }
            if let (Some(min), Some(max)) = (field.min, field.max) {
                if min > max {
                    issues.push(CalculatorIssue::InvalidBounds {
                        name: field.name.clone(),
                    });
                }
            }
        }

        if !self.formula.trim().is_empty() {
            seen.extend(aliases.iter().map(String::as_str));
            issues.extend(self.formula_issues(&seen));
        }

        issues
    }

    /// Whether [`Calculator::validate`] finds nothing.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.validate().is_empty()
    }

    /// `known` holds field names and multiplier aliases.
    fn formula_issues(&self, known: &BTreeSet<&str>) -> Vec<CalculatorIssue> {
        let tokens = match tokenize(&self.formula) {
            Ok(tokens) => tokens,
            Err(EvaluationError::InvalidNumber { position }) => {
                return vec![CalculatorIssue::InvalidFormulaNumber { position }];
            }
            Err(EvaluationError::Syntax { position } | EvaluationError::UnexpectedToken { position }) => {
                return vec![CalculatorIssue::InvalidFormulaCharacter { position }];
            }
            Err(_) => return vec![CalculatorIssue::InvalidFormulaCharacter { position: 0 }],
        };

        tokens
            .into_iter()
            .filter_map(|spanned| match spanned.token {
                Token::Ident(name)
                    if self.field(&name).is_some_and(|field| field.kind == FieldType::Text) =>
                {
                    Some(CalculatorIssue::TextFieldInFormula {
                        name,
                        position: spanned.position,
                    })
                }
                Token::Ident(name)
                    if name != BASE_PRICE_VARIABLE && !known.contains(name.as_str()) =>
                {
                    Some(CalculatorIssue::UnknownIdentifier {
                        name,
                        position: spanned.position,
                    })
                }
                _ => None,
            })
            .collect()
    }

    /// Whether the calculator is assigned to `product_id`.
    #[must_use]
    pub fn is_assigned_to_product(&self, product_id: &ProductId) -> bool {
        self.product_ids.contains(product_id)
    }

    /// Assign the calculator to a product. Assigning twice is a no-op.
    pub fn assign_to_product(&mut self, product_id: ProductId) {
        if !self.is_assigned_to_product(&product_id) {
            self.product_ids.push(product_id);
            self.touch();
        }
    }

    /// Remove a product assignment.
    pub fn unassign_from_product(&mut self, product_id: &ProductId) {
        self.product_ids.retain(|id| id != product_id);
        self.touch();
    }

    /// Record a mutation.
    pub fn touch(&mut self) {
        self.updated_at = Some(Utc::now());
    }

    /// The subset of the calculator shoppers' browsers receive.
    #[must_use]
    pub fn config(&self) -> CalculatorConfig<'_> {
        CalculatorConfig {
            id: self.id.as_ref(),
            name: &self.name,
            description: self.description.as_deref(),
            fields: &self.fields,
            formula: &self.formula,
            base_price: self.base_price,
            status: self.status,
        }
    }
}
