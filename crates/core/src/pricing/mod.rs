//! Turning shopper input into formula variables.
//!
//! [`resolve_variables`] validates every field first and reports all
//! problems at once. Only when the input is clean does it coerce values and
//! apply pricing rules, producing the [`Variables`] map the formula
//! evaluator consumes. [`quote`] chains resolution, evaluation and the
//! minimum price floor.

mod quote;

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

use crate::formula::Variables;
use crate::model::{BASE_PRICE_VARIABLE, Calculator, Field, FieldType, InputValue, Inputs, PricingKind};

pub use quote::{Quote, QuoteError, quote};

/// Why a field's input was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationReason {
    Missing,
    NotANumber,
    BelowMin,
    AboveMax,
}

impl fmt::Display for ValidationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing => write!(f, "missing"),
            Self::NotANumber => write!(f, "not_a_number"),
            Self::BelowMin => write!(f, "below_min"),
            Self::AboveMax => write!(f, "above_max"),
        }
    }
}

/// A single rejected field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[error("{field}: {reason}")]
pub struct ValidationError {
    pub field: String,
    pub reason: ValidationReason,
}

impl ValidationError {
    fn new(field: &Field, reason: ValidationReason) -> Self {
        Self {
            field: field.name.clone(),
            reason,
        }
    }
}

/// Every rejected field of one submission, in field order. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[serde(transparent)]
#[error("{} field(s) failed validation", .0.len())]
pub struct ValidationErrors(pub Vec<ValidationError>);

impl ValidationErrors {
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ValidationError> {
        self.0.iter()
    }

    /// The reason `field` was rejected, if it was.
    #[must_use]
    pub fn reason_for(&self, field: &str) -> Option<ValidationReason> {
        self.0
            .iter()
            .find(|error| error.field == field)
            .map(|error| error.reason)
    }
}

impl<'a> IntoIterator for &'a ValidationErrors {
    type Item = &'a ValidationError;
    type IntoIter = std::slice::Iter<'a, ValidationError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Failure to turn a submission into formula variables.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// One or more fields were rejected.
    #[error(transparent)]
    Invalid(#[from] ValidationErrors),

    /// Base price plus `additional` amounts left the decimal range.
    #[error("base price overflows once pricing rules are applied")]
    Overflow,
}

/// Formula inputs ready for evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedVariables {
    /// Field bindings plus `basePrice`.
    pub variables: Variables,
    /// The effective base price after `fixed` and `additional` rules.
    pub base_price: Decimal,
}

/// A field's contribution once its input has been coerced.
enum Binding {
    Unbound,
    Value(Decimal),
    Selected { key: String },
}

/// Validate `inputs` against the calculator and build the variable map.
///
/// `base_price_override` replaces [`Calculator::base_price`] as the starting
/// point for pricing rules.
///
/// # Errors
///
/// Returns [`ResolveError::Invalid`] with every [`ValidationError`] found,
/// in field order, when any field is missing, non-numeric or out of bounds,
/// and [`ResolveError::Overflow`] when the rule-adjusted base price does not
/// fit in a decimal.
pub fn resolve_variables(
    calculator: &Calculator,
    inputs: &Inputs,
    base_price_override: Option<Decimal>,
) -> Result<ResolvedVariables, ResolveError> {
    let mut errors = Vec::new();
    let mut bindings = Vec::with_capacity(calculator.fields.len());

    for field in &calculator.fields {
        match coerce(field, inputs.get(&field.name)) {
            Ok(binding) => bindings.push((field, binding)),
            Err(reason) => errors.push(ValidationError::new(field, reason)),
        }
    }

    if !errors.is_empty() {
        tracing::debug!(
            calculator = %calculator.name,
            errors = errors.len(),
            "input rejected"
        );
        return Err(ValidationErrors(errors).into());
    }

    let mut variables = Variables::new();
    let mut fixed = None;
    let mut additional = Decimal::ZERO;

    for (field, binding) in bindings {
        let key = match binding {
            Binding::Unbound => continue,
            Binding::Value(value) => {
                variables.insert(field.name.clone(), value);
                continue;
            }
            Binding::Selected { key } => key,
        };

        let Some(rule) = &field.pricing_rule else {
            if let Ok(value) = Decimal::from_str(&key) {
                variables.insert(field.name.clone(), value);
            }
            continue;
        };

        let value = rule.value_for(&key);
        if value.is_none() && !key.is_empty() {
            tracing::warn!(
                field = %field.name,
                option = %key,
                "selected option has no price, contributing 0"
            );
        }
        variables.insert(field.name.clone(), value.unwrap_or_default());

        match (rule.kind, value) {
            (PricingKind::Multiplier, value) => {
                let alias = field
                    .multiplier_alias()
                    .filter(|alias| calculator.field(alias).is_none());
                if let Some(alias) = alias {
                    variables.insert(alias, value.unwrap_or_default());
                }
            }
            (PricingKind::Fixed, Some(value)) => fixed = Some(value),
            (PricingKind::Additional, Some(value)) => {
                additional = additional.checked_add(value).ok_or(ResolveError::Overflow)?;
            }
            (PricingKind::Fixed | PricingKind::Additional, None) => {}
        }
    }

    let base_price = fixed
        .unwrap_or_else(|| base_price_override.unwrap_or(calculator.base_price))
        .checked_add(additional)
        .ok_or(ResolveError::Overflow)?;
    variables.insert(BASE_PRICE_VARIABLE.to_owned(), base_price);

    tracing::debug!(
        calculator = %calculator.name,
        %base_price,
        bound = variables.len(),
        "variables resolved"
    );
    Ok(ResolvedVariables {
        variables,
        base_price,
    })
}

/// Check one field's raw input and coerce it.
fn coerce(field: &Field, input: Option<&InputValue>) -> Result<Binding, ValidationReason> {
    let input = input.filter(|value| !value.is_empty());

    let Some(input) = input else {
        if field.required {
            return Err(ValidationReason::Missing);
        }
        return Ok(match field.kind {
            FieldType::Number => Binding::Value(Decimal::ZERO),
            FieldType::Checkbox => Binding::Value(flag(field.checked)),
            FieldType::Select | FieldType::Radio => Binding::Selected { key: String::new() },
            FieldType::Text => Binding::Unbound,
        });
    };

    match field.kind {
        FieldType::Text => Ok(Binding::Unbound),
        FieldType::Number => {
            let value = number(input).ok_or(ValidationReason::NotANumber)?;
            if field.min.is_some_and(|min| value < min) {
                return Err(ValidationReason::BelowMin);
            }
            if field.max.is_some_and(|max| value > max) {
                return Err(ValidationReason::AboveMax);
            }
            Ok(Binding::Value(value))
        }
        FieldType::Checkbox => checkbox(input).map(Binding::Value),
        FieldType::Select | FieldType::Radio => Ok(Binding::Selected { key: input.as_key() }),
    }
}

fn number(input: &InputValue) -> Option<Decimal> {
    match input {
        InputValue::Number(value) => Some(*value),
        InputValue::Text(text) => Decimal::from_str(text.trim()).ok(),
        InputValue::Bool(_) => None,
    }
}

fn checkbox(input: &InputValue) -> Result<Decimal, ValidationReason> {
    match input {
        InputValue::Bool(checked) => Ok(flag(*checked)),
        InputValue::Number(value) => Ok(flag(!value.is_zero())),
        InputValue::Text(text) => match text.trim() {
            "true" | "on" | "1" => Ok(Decimal::ONE),
            "false" | "off" | "0" => Ok(Decimal::ZERO),
            _ => Err(ValidationReason::NotANumber),
        },
    }
}

const fn flag(checked: bool) -> Decimal {
    if checked { Decimal::ONE } else { Decimal::ZERO }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::{FieldOption, PricingRule};

    fn dec(value: &str) -> Decimal {
        Decimal::from_str(value).unwrap()
    }

    fn inputs<const N: usize>(pairs: [(&str, InputValue); N]) -> Inputs {
        pairs
            .into_iter()
            .map(|(name, value)| (name.to_owned(), value))
            .collect()
    }

    fn material(kind: PricingKind) -> Field {
        Field::select(
            "material",
            "Material",
            [
                FieldOption::new("Standard", "standard"),
                FieldOption::new("Premium", "premium"),
            ],
        )
        .with_pricing_rule(PricingRule::new(
            kind,
            [("standard", dec("0.8")), ("premium", dec("1.2"))],
        ))
    }

    fn splashback(kind: PricingKind) -> Calculator {
        Calculator::new(
            "Splashback",
            "basePrice + length * width * materialMultiplier",
            vec![
                Field::number("length", "Length")
                    .required()
                    .bounded(Some(dec("10")), Some(dec("300"))),
                Field::number("width", "Width").required(),
                material(kind),
            ],
        )
        .with_base_price(dec("25"))
    }

    fn rejected(result: Result<ResolvedVariables, ResolveError>) -> ValidationErrors {
        match result {
            Err(ResolveError::Invalid(errors)) => errors,
            other => panic!("expected rejected fields, got {other:?}"),
        }
    }

    #[test]
    fn test_multiplier_binds_alias() {
        let calc = splashback(PricingKind::Multiplier);
        let resolved = resolve_variables(
            &calc,
            &inputs([
                ("length", 100_i64.into()),
                ("width", "60".into()),
                ("material", "premium".into()),
            ]),
            None,
        )
        .unwrap();
        assert_eq!(resolved.variables["materialMultiplier"], dec("1.2"));
        assert_eq!(resolved.variables["material"], dec("1.2"));
        assert_eq!(resolved.variables["width"], dec("60"));
        assert_eq!(resolved.variables[BASE_PRICE_VARIABLE], dec("25"));
        assert_eq!(resolved.base_price, dec("25"));
    }

    #[test]
    fn test_all_errors_are_collected() {
        let calc = splashback(PricingKind::Multiplier);
        let errors = rejected(resolve_variables(&calc, &Inputs::new(), None));
        assert_eq!(
            errors.0,
            vec![
                ValidationError {
                    field: "length".to_owned(),
                    reason: ValidationReason::Missing
                },
                ValidationError {
                    field: "width".to_owned(),
                    reason: ValidationReason::Missing
                },
            ]
        );
    }

    #[test]
    fn test_bounds_and_type_errors() {
        let calc = splashback(PricingKind::Multiplier);
        let errors = rejected(resolve_variables(
            &calc,
            &inputs([("length", "5".into()), ("width", "wide".into())]),
            None,
        ));
        assert_eq!(errors.reason_for("length"), Some(ValidationReason::BelowMin));
        assert_eq!(errors.reason_for("width"), Some(ValidationReason::NotANumber));

        let errors = rejected(resolve_variables(
            &calc,
            &inputs([("length", 301_i64.into()), ("width", 1_i64.into())]),
            None,
        ));
        assert_eq!(errors.0.len(), 1);
        assert_eq!(errors.reason_for("length"), Some(ValidationReason::AboveMax));
    }

    #[test]
    fn test_blank_text_counts_as_missing() {
        let calc = splashback(PricingKind::Multiplier);
        let errors = rejected(resolve_variables(
            &calc,
            &inputs([("length", "  ".into()), ("width", 40_i64.into())]),
            None,
        ));
        assert_eq!(errors.reason_for("length"), Some(ValidationReason::Missing));
    }

    #[test]
    fn test_missing_option_price_is_zero() {
        let calc = splashback(PricingKind::Multiplier);
        let resolved = resolve_variables(
            &calc,
            &inputs([
                ("length", 100_i64.into()),
                ("width", 60_i64.into()),
                ("material", "marble".into()),
            ]),
            None,
        )
        .unwrap();
        assert_eq!(resolved.variables["materialMultiplier"], Decimal::ZERO);
    }

    #[test]
    fn test_fixed_overrides_base_price() {
        let calc = splashback(PricingKind::Fixed);
        let resolved = resolve_variables(
            &calc,
            &inputs([
                ("length", 100_i64.into()),
                ("width", 60_i64.into()),
                ("material", "premium".into()),
            ]),
            Some(dec("99")),
        )
        .unwrap();
        assert_eq!(resolved.base_price, dec("1.2"));
        assert!(!resolved.variables.contains_key("materialMultiplier"));
    }

    #[test]
    fn test_additional_adds_to_override() {
        let calc = splashback(PricingKind::Additional);
        let resolved = resolve_variables(
            &calc,
            &inputs([
                ("length", 100_i64.into()),
                ("width", 60_i64.into()),
                ("material", "standard".into()),
            ]),
            Some(dec("40")),
        )
        .unwrap();
        assert_eq!(resolved.base_price, dec("40.8"));
        assert_eq!(resolved.variables[BASE_PRICE_VARIABLE], dec("40.8"));
    }

    #[test]
    fn test_fixed_then_additional() {
        let mut calc = splashback(PricingKind::Fixed);
        calc.fields.push(
            Field::select("edge", "Edge", [FieldOption::new("Polished", "polished")])
                .with_pricing_rule(PricingRule::new(
                    PricingKind::Additional,
                    [("polished", dec("15"))],
                )),
        );
        calc.fields.rotate_right(1);
        let resolved = resolve_variables(
            &calc,
            &inputs([
                ("length", 100_i64.into()),
                ("width", 60_i64.into()),
                ("material", "standard".into()),
                ("edge", "polished".into()),
            ]),
            None,
        )
        .unwrap();
        assert_eq!(resolved.base_price, dec("15.8"));
    }

    #[test]
    fn test_text_fields_are_never_bound() {
        let mut calc = splashback(PricingKind::Multiplier);
        calc.fields.push(Field::new("notes", "Notes", FieldType::Text).required());
        let resolved = resolve_variables(
            &calc,
            &inputs([
                ("length", 100_i64.into()),
                ("width", 60_i64.into()),
                ("notes", "fragile".into()),
            ]),
            None,
        )
        .unwrap();
        assert!(!resolved.variables.contains_key("notes"));
    }

    #[test]
    fn test_checkbox_coercion() {
        let mut gift = Field::new("gift", "Gift wrap", FieldType::Checkbox);
        gift.checked = true;
        let calc = Calculator::new(
            "Box",
            "basePrice + gift * 3 + insured * 5",
            vec![gift, Field::new("insured", "Insured", FieldType::Checkbox)],
        );

        let resolved = resolve_variables(&calc, &inputs([("insured", true.into())]), None).unwrap();
        assert_eq!(resolved.variables["gift"], Decimal::ONE);
        assert_eq!(resolved.variables["insured"], Decimal::ONE);

        let resolved = resolve_variables(
            &calc,
            &inputs([("gift", false.into()), ("insured", "off".into())]),
            None,
        )
        .unwrap();
        assert_eq!(resolved.variables["gift"], Decimal::ZERO);
        assert_eq!(resolved.variables["insured"], Decimal::ZERO);
    }

    #[test]
    fn test_select_without_rule_binds_numeric_value() {
        let calc = Calculator::new(
            "Shelves",
            "basePrice * count",
            vec![
                Field::select(
                    "count",
                    "Shelves",
                    [FieldOption::new("Two", "2"), FieldOption::new("Three", "3")],
                ),
                Field::select("colour", "Colour", [FieldOption::new("Red", "red")]),
            ],
        );
        let resolved = resolve_variables(
            &calc,
            &inputs([("count", "3".into()), ("colour", "red".into())]),
            None,
        )
        .unwrap();
        assert_eq!(resolved.variables["count"], dec("3"));
        assert!(!resolved.variables.contains_key("colour"));
    }

    #[test]
    fn test_optional_number_defaults_to_zero() {
        let calc = Calculator::new("Extras", "basePrice + extra", vec![Field::number("extra", "Extra")]);
        let resolved = resolve_variables(&calc, &Inputs::new(), None).unwrap();
        assert_eq!(resolved.variables["extra"], Decimal::ZERO);
    }

    #[test]
    fn test_additional_amount_overflow_is_an_error() {
        let mut calc = Calculator::new(
            "Crate",
            "basePrice",
            vec![Field::select("lid", "Lid", [FieldOption::new("Oak", "oak")]).with_pricing_rule(
                PricingRule::new(PricingKind::Additional, [("oak", Decimal::MAX)]),
            )],
        )
        .with_base_price(Decimal::MAX);
        let order = inputs([("lid", "oak".into())]);
        assert_eq!(
            resolve_variables(&calc, &order, None),
            Err(ResolveError::Overflow)
        );

        calc.fields.push(
            Field::select("trim", "Trim", [FieldOption::new("Brass", "brass")]).with_pricing_rule(
                PricingRule::new(PricingKind::Additional, [("brass", Decimal::MAX)]),
            ),
        );
        calc.base_price = Decimal::ZERO;
        let order = inputs([("lid", "oak".into()), ("trim", "brass".into())]);
        assert_eq!(
            resolve_variables(&calc, &order, None),
            Err(ResolveError::Overflow)
        );
    }

    #[test]
    fn test_errors_serialize_as_list() {
        let errors = ValidationErrors(vec![ValidationError {
            field: "length".to_owned(),
            reason: ValidationReason::NotANumber,
        }]);
        assert_eq!(
            serde_json::to_value(&errors).unwrap(),
            serde_json::json!([{"field": "length", "reason": "not_a_number"}])
        );
    }
}
