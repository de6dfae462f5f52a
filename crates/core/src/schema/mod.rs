//! Conversion between stored calculator shapes and the canonical model.
//!
//! Calculators are stored in two shapes:
//!
//! - **elements** - written by the drag-and-drop builder. Each entry carries
//!   an `id`, a canvas element `type` (`number-input`, `text-input`, ...), a
//!   canvas `position` and a nested `config` object with the field
//!   properties.
//! - **fields** - a flat list of field objects, identical to the serialized
//!   [`Calculator`].
//!
//! [`normalize`] accepts either and yields one [`Calculator`];
//! [`to_elements_shape`] and [`to_fields_shape`] go the other way. The
//! conversions are pure.

mod elements;
mod fields;

use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::model::{Calculator, FieldOption, PricingKind, PricingRule};
use crate::types::{CalculatorId, CalculatorStatus, ProductId};

pub use elements::to_elements_shape;
pub use fields::to_fields_shape;

/// Errors raised when a stored calculator cannot be interpreted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// The input is not a JSON object.
    #[error("calculator definition must be a JSON object")]
    Malformed,

    /// Neither an `elements` nor a `fields` collection is present.
    #[error("calculator definition has neither `elements` nor `fields`")]
    MissingCollection,

    /// A field or element has no name to bind in formulas.
    #[error("{shape} entry {index} has no name")]
    UnnamedField { shape: SchemaShape, index: usize },

    /// A property has a value of the wrong kind.
    #[error("invalid `{property}` on {location}")]
    InvalidProperty { location: String, property: String },
}

impl SchemaError {
    fn invalid(location: impl Into<String>, property: &str) -> Self {
        Self::InvalidProperty {
            location: location.into(),
            property: property.to_owned(),
        }
    }
}

/// Which stored shape a calculator definition uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemaShape {
    Elements,
    Fields,
}

impl std::fmt::Display for SchemaShape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Elements => write!(f, "elements"),
            Self::Fields => write!(f, "fields"),
        }
    }
}

impl FromStr for SchemaShape {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "elements" => Ok(Self::Elements),
            "fields" => Ok(Self::Fields),
            _ => Err(format!("invalid schema shape: {s} (expected elements or fields)")),
        }
    }
}

/// Identify the shape of a raw definition. `fields` wins when both exist.
#[must_use]
pub fn detect_shape(raw: &Value) -> Option<SchemaShape> {
    let map = raw.as_object()?;
    if map.get("fields").is_some_and(Value::is_array) {
        Some(SchemaShape::Fields)
    } else if map.get("elements").is_some_and(Value::is_array) {
        Some(SchemaShape::Elements)
    } else {
        None
    }
}

/// Build the canonical calculator from a definition in either shape.
///
/// # Errors
///
/// Returns [`SchemaError::MissingCollection`] when neither collection is
/// present, [`SchemaError::UnnamedField`] when an entry has no derivable name,
/// and [`SchemaError::InvalidProperty`] for values of the wrong kind.
pub fn normalize(raw: &Value) -> Result<Calculator, SchemaError> {
    let map = raw.as_object().ok_or(SchemaError::Malformed)?;
    let shape = detect_shape(raw).ok_or_else(|| {
        if map.contains_key("fields") {
            SchemaError::invalid("calculator", "fields")
        } else if map.contains_key("elements") {
            SchemaError::invalid("calculator", "elements")
        } else {
            SchemaError::MissingCollection
        }
    })?;

    let entries = map
        .get(shape.to_string().as_str())
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();

    let fields = match shape {
        SchemaShape::Elements => elements::parse_elements(entries)?,
        SchemaShape::Fields => fields::parse_fields(entries)?,
    };

    let props = Props::new(map, None);
    let location = "calculator";
    let calculator = Calculator {
        id: props.id("id", location)?,
        name: props.string("name", location)?.unwrap_or_default(),
        description: props.string("description", location)?,
        formula: props.string("formula", location)?.unwrap_or_default(),
        fields,
        base_price: props.decimal("basePrice", location)?.unwrap_or_default(),
        minimum_price: props.decimal("minimumPrice", location)?,
        status: props.status(location)?,
        product_ids: props.product_ids(location)?,
        created_at: props.timestamp("createdAt", location)?,
        updated_at: props.timestamp("updatedAt", location)?,
    };

    tracing::debug!(
        %shape,
        name = %calculator.name,
        fields = calculator.fields.len(),
        "calculator normalized"
    );
    Ok(calculator)
}

/// Property lookup over a primary object with an optional fallback object.
///
/// Canvas elements keep their properties in `config` but older builder
/// versions wrote some of them on the element itself.
#[derive(Clone, Copy)]
pub(crate) struct Props<'a> {
    primary: &'a Map<String, Value>,
    fallback: Option<&'a Map<String, Value>>,
}

impl<'a> Props<'a> {
    pub(crate) const fn new(
        primary: &'a Map<String, Value>,
        fallback: Option<&'a Map<String, Value>>,
    ) -> Self {
        Self { primary, fallback }
    }

    pub(crate) fn get(&self, key: &str) -> Option<&'a Value> {
        self.primary
            .get(key)
            .filter(|value| !value.is_null())
            .or_else(|| {
                self.fallback
                    .and_then(|map| map.get(key))
                    .filter(|value| !value.is_null())
            })
    }

    pub(crate) fn string(&self, key: &str, location: &str) -> Result<Option<String>, SchemaError> {
        match self.get(key) {
            None => Ok(None),
            Some(Value::String(text)) => Ok(Some(text.clone())),
            Some(_) => Err(SchemaError::invalid(location, key)),
        }
    }

    /// A string or number, rendered as text (ids, option values).
    pub(crate) fn scalar(&self, key: &str, location: &str) -> Result<Option<String>, SchemaError> {
        match self.get(key) {
            None => Ok(None),
            Some(value) => scalar_text(value)
                .map(Some)
                .ok_or_else(|| SchemaError::invalid(location, key)),
        }
    }

    pub(crate) fn bool(&self, key: &str, location: &str) -> Result<Option<bool>, SchemaError> {
        match self.get(key) {
            None => Ok(None),
            Some(Value::Bool(flag)) => Ok(Some(*flag)),
            Some(_) => Err(SchemaError::invalid(location, key)),
        }
    }

    pub(crate) fn decimal(&self, key: &str, location: &str) -> Result<Option<Decimal>, SchemaError> {
        match self.get(key) {
            None => Ok(None),
            Some(Value::String(text)) if text.trim().is_empty() => Ok(None),
            Some(value) => decimal_value(value)
                .map(Some)
                .ok_or_else(|| SchemaError::invalid(location, key)),
        }
    }

    fn id(&self, key: &str, location: &str) -> Result<Option<CalculatorId>, SchemaError> {
        Ok(self.scalar(key, location)?.map(CalculatorId::from))
    }

    fn status(&self, location: &str) -> Result<CalculatorStatus, SchemaError> {
        self.string("status", location)?.map_or_else(
            || Ok(CalculatorStatus::default()),
            |status| {
                status
                    .parse()
                    .map_err(|_| SchemaError::invalid(location, "status"))
            },
        )
    }

    fn product_ids(&self, location: &str) -> Result<Vec<ProductId>, SchemaError> {
        let Some(value) = self.get("productIds") else {
            return Ok(Vec::new());
        };
        let entries = value
            .as_array()
            .ok_or_else(|| SchemaError::invalid(location, "productIds"))?;
        entries
            .iter()
            .map(|entry| {
                scalar_text(entry)
                    .map(ProductId::from)
                    .ok_or_else(|| SchemaError::invalid(location, "productIds"))
            })
            .collect()
    }

    fn timestamp(&self, key: &str, location: &str) -> Result<Option<DateTime<Utc>>, SchemaError> {
        self.string(key, location)?
            .map(|text| {
                DateTime::parse_from_rfc3339(&text)
                    .map(|ts| ts.with_timezone(&Utc))
                    .map_err(|_| SchemaError::invalid(location, key))
            })
            .transpose()
    }

    pub(crate) fn options(&self, location: &str) -> Result<Vec<FieldOption>, SchemaError> {
        let Some(value) = self.get("options") else {
            return Ok(Vec::new());
        };
        let entries = value
            .as_array()
            .ok_or_else(|| SchemaError::invalid(location, "options"))?;
        entries
            .iter()
            .map(|entry| parse_option(entry).ok_or_else(|| SchemaError::invalid(location, "options")))
            .collect()
    }

    /// Either a `pricingRule` object or the builder's `pricingType` + `pricing` pair.
    pub(crate) fn pricing_rule(&self, location: &str) -> Result<Option<PricingRule>, SchemaError> {
        if let Some(rule) = self.get("pricingRule") {
            let rule = rule
                .as_object()
                .ok_or_else(|| SchemaError::invalid(location, "pricingRule"))?;
            let rule_props = Props::new(rule, None);
            let kind = rule_props
                .string("kind", location)?
                .ok_or_else(|| SchemaError::invalid(location, "pricingRule.kind"))?;
            let kind = PricingKind::from_str(&kind)
                .map_err(|_| SchemaError::invalid(location, "pricingRule.kind"))?;
            let values = price_map(rule_props.get("valueByOption"), location, "pricingRule.valueByOption")?;
            return Ok(Some(PricingRule {
                kind,
                value_by_option: values,
            }));
        }

        let kind = match self.string("pricingType", location)?.as_deref() {
            None | Some("none" | "") => return Ok(None),
            Some(kind) => {
                PricingKind::from_str(kind).map_err(|_| SchemaError::invalid(location, "pricingType"))?
            }
        };
        let values = price_map(self.get("pricing"), location, "pricing")?;
        Ok(Some(PricingRule {
            kind,
            value_by_option: values,
        }))
    }
}

fn price_map(
    value: Option<&Value>,
    location: &str,
    property: &str,
) -> Result<std::collections::BTreeMap<String, Decimal>, SchemaError> {
    let Some(value) = value else {
        return Ok(std::collections::BTreeMap::new());
    };
    let map = value
        .as_object()
        .ok_or_else(|| SchemaError::invalid(location, property))?;
    map.iter()
        .map(|(option, price)| {
            decimal_value(price)
                .map(|price| (option.clone(), price))
                .ok_or_else(|| SchemaError::invalid(location, property))
        })
        .collect()
}

fn parse_option(entry: &Value) -> Option<FieldOption> {
    if let Some(map) = entry.as_object() {
        let value = map.get("value").and_then(scalar_text)?;
        let label = match map.get("label") {
            Some(Value::String(label)) => label.clone(),
            None | Some(Value::Null) => value.clone(),
            Some(_) => return None,
        };
        return Some(FieldOption { label, value });
    }
    let value = scalar_text(entry)?;
    Some(FieldOption {
        label: value.clone(),
        value,
    })
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

/// Interpret a JSON number or numeric string as a decimal.
pub(crate) fn decimal_value(value: &Value) -> Option<Decimal> {
    let text = match value {
        Value::Number(number) => number.to_string(),
        Value::String(text) => text.trim().to_owned(),
        _ => return None,
    };
    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .ok()
}
