use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;

use super::fields::read_field;
use super::{Props, SchemaError, SchemaShape};
use crate::model::{Calculator, Field, FieldOption, FieldType, PricingKind};

/// Canvas coordinates. Generated elements are stacked at the origin.
#[derive(Debug, Clone, Copy, Default, Serialize)]
struct Position {
    x: i64,
    y: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CanvasElement<'a> {
    id: &'a str,
    #[serde(rename = "type")]
    element_type: &'static str,
    name: &'a str,
    position: Position,
    config: ElementConfig<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ElementConfig<'a> {
    label: &'a str,
    placeholder: &'a str,
    required: bool,
    help_text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    min: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    step: Option<Decimal>,
    #[serde(skip_serializing_if = "<[_]>::is_empty")]
    options: &'a [FieldOption],
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    checked: bool,
    pricing_type: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pricing: Option<&'a BTreeMap<String, Decimal>>,
}

impl<'a> From<&'a Field> for CanvasElement<'a> {
    fn from(field: &'a Field) -> Self {
        let pricing_type = match field.pricing_rule.as_ref().map(|rule| rule.kind) {
            None => "none",
            Some(PricingKind::Multiplier) => "multiplier",
            Some(PricingKind::Fixed) => "fixed",
            Some(PricingKind::Additional) => "additional",
        };
        Self {
            id: &field.name,
            element_type: field.kind.element_type(),
            name: &field.label,
            position: Position::default(),
            config: ElementConfig {
                label: &field.label,
                placeholder: &field.placeholder,
                required: field.required,
                help_text: &field.help_text,
                min: field.min,
                max: field.max,
                step: field.step,
                options: &field.options,
                checked: field.checked,
                pricing_type,
                pricing: field.pricing_rule.as_ref().map(|rule| &rule.value_by_option),
            },
        }
    }
}

pub(super) fn parse_elements(entries: &[Value]) -> Result<Vec<Field>, SchemaError> {
    entries
        .iter()
        .enumerate()
        .map(|(index, entry)| parse_element(index, entry))
        .collect()
}

fn parse_element(index: usize, entry: &Value) -> Result<Field, SchemaError> {
    let element = entry
        .as_object()
        .ok_or_else(|| SchemaError::invalid(format!("element #{index}"), "elements"))?;
    let outer = Props::new(element, None);

    let name = outer
        .scalar("id", &format!("element #{index}"))?
        .filter(|id| !id.trim().is_empty())
        .ok_or(SchemaError::UnnamedField {
            shape: SchemaShape::Elements,
            index,
        })?;
    let location = format!("element `{name}`");

    let kind = outer
        .string("type", &location)?
        .map_or_else(FieldType::default, |kind| FieldType::from_element_type(&kind));

    let props = match outer.get("config") {
        None => outer,
        Some(Value::Object(config)) => Props::new(config, Some(element)),
        Some(_) => return Err(SchemaError::invalid(location, "config")),
    };

    let label = match props.string("label", &location)? {
        Some(label) => label,
        None => outer
            .string("name", &location)?
            .unwrap_or_else(|| capitalize(&name)),
    };

    read_field(name, label, kind, props, &location)
}

fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    chars
        .next()
        .map_or_else(String::new, |first| first.to_uppercase().chain(chars).collect())
}

/// The builder canvas ("elements") representation of a calculator.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn to_elements_shape(calculator: &Calculator) -> serde_json::Result<Value> {
    let elements: Vec<CanvasElement<'_>> = calculator.fields.iter().map(CanvasElement::from).collect();
    let mut value = serde_json::to_value(calculator)?;
    if let Value::Object(map) = &mut value {
        map.remove("fields");
        map.insert("elements".to_owned(), serde_json::to_value(elements)?);
    }
    Ok(value)
}
