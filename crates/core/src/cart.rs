//! Carrying quoted prices through the Shopify cart.
//!
//! The storefront attaches the quote to a cart line as a
//! [`CALCULATOR_CONFIG_KEY`] attribute. At checkout, [`transform_lines`]
//! reads that attribute back and turns each configured line into a unit
//! price override, or into a validation error when the attribute is
//! unreadable.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::formula::round_price;
use crate::model::Inputs;
use crate::pricing::Quote;
use crate::types::{CalculatorId, CurrencyCode, Price};

/// Line attribute holding the serialized [`CartLineConfig`].
pub const CALCULATOR_CONFIG_KEY: &str = "calculator_config";
/// Output attribute holding the shopper's field values.
pub const CUSTOM_CONFIGURATION_KEY: &str = "custom_configuration";
/// Output attribute holding the unit amount before the override.
pub const ORIGINAL_PRICE_KEY: &str = "original_price";
/// Message attached to lines whose configuration cannot be read.
pub const INVALID_CONFIGURATION_MESSAGE: &str = "Invalid calculator configuration";

/// Errors reading or writing the cart line configuration.
#[derive(Debug, Error)]
pub enum CartConfigError {
    #[error("calculator configuration is not valid JSON: {0}")]
    Parse(#[source] serde_json::Error),

    #[error("failed to serialize calculator configuration: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("calculated price {0} is negative")]
    NegativePrice(Decimal),
}

/// A custom attribute as read from a cart line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    pub key: String,
    pub value: Option<String>,
}

/// A custom attribute to write on a cart line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeInput {
    pub key: String,
    pub value: String,
}

/// Money as Shopify sends it: the amount stays a string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Money {
    pub amount: String,
    pub currency_code: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineCost {
    pub amount_per_quantity: Option<Money>,
}

/// A cart line as seen by the checkout function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub id: String,
    pub quantity: i64,
    #[serde(default)]
    pub attributes: Vec<Attribute>,
    #[serde(default)]
    pub cost: Option<CartLineCost>,
}

impl CartLine {
    /// The value of attribute `key`, if set.
    #[must_use]
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|attribute| attribute.key == key)
            .and_then(|attribute| attribute.value.as_deref())
    }

    fn original_amount(&self) -> &str {
        self.cost
            .as_ref()
            .and_then(|cost| cost.amount_per_quantity.as_ref())
            .map_or("0", |money| money.amount.as_str())
    }
}

/// The quoted configuration the storefront stores on a cart line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calculator_id: Option<CalculatorId>,
    pub calculated_price: Decimal,
    #[serde(default)]
    pub fields: Inputs,
}

impl CartLineConfig {
    /// Capture a quote and the inputs that produced it.
    #[must_use]
    pub fn new(calculator_id: Option<CalculatorId>, quote: &Quote, fields: Inputs) -> Self {
        Self {
            calculator_id,
            calculated_price: quote.price,
            fields,
        }
    }

    /// Read the configuration from a `calculator_config` attribute value.
    ///
    /// # Errors
    ///
    /// Returns [`CartConfigError::Parse`] for unreadable JSON and
    /// [`CartConfigError::NegativePrice`] for a negative price.
    pub fn from_attribute_value(value: &str) -> Result<Self, CartConfigError> {
        let config: Self = serde_json::from_str(value).map_err(CartConfigError::Parse)?;
        if config.calculated_price.is_sign_negative() && !config.calculated_price.is_zero() {
            return Err(CartConfigError::NegativePrice(config.calculated_price));
        }
        Ok(config)
    }

    /// The attribute to attach to the cart line.
    ///
    /// # Errors
    ///
    /// Returns [`CartConfigError::Serialize`] if encoding fails.
    pub fn to_attribute(&self) -> Result<AttributeInput, CartConfigError> {
        Ok(AttributeInput {
            key: CALCULATOR_CONFIG_KEY.to_owned(),
            value: serde_json::to_string(self).map_err(CartConfigError::Serialize)?,
        })
    }
}

/// A unit price override for one cart line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinePriceOverride {
    pub line_id: String,
    pub quantity: i64,
    pub price: Price,
    pub attributes: Vec<AttributeInput>,
}

/// A checkout validation error pointing at a cart line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartValidationError {
    pub message: String,
    pub target: String,
}

/// What checkout should do with one configured line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum LineOperation {
    PriceOverride(LinePriceOverride),
    ValidationError(CartValidationError),
}

/// Convert every line carrying a calculator configuration.
///
/// Lines without the attribute produce nothing. The result preserves line
/// order.
#[must_use]
pub fn transform_lines(lines: &[CartLine], currency: CurrencyCode) -> Vec<LineOperation> {
    lines
        .iter()
        .enumerate()
        .filter_map(|(index, line)| {
            let value = line.attribute(CALCULATOR_CONFIG_KEY)?;
            Some(transform_line(index, line, value, currency))
        })
        .collect()
}

fn transform_line(index: usize, line: &CartLine, value: &str, currency: CurrencyCode) -> LineOperation {
    let parsed = CartLineConfig::from_attribute_value(value).and_then(|config| {
        let fields = serde_json::to_string(&config.fields).map_err(CartConfigError::Serialize)?;
        Ok((config, fields))
    });
    let (config, fields) = match parsed {
        Ok(parsed) => parsed,
        Err(err) => {
            tracing::warn!(line = %line.id, index, error = %err, "rejecting cart line");
            return LineOperation::ValidationError(CartValidationError {
                message: INVALID_CONFIGURATION_MESSAGE.to_owned(),
                target: format!("$.cart.lines[{index}]"),
            });
        }
    };

    LineOperation::PriceOverride(LinePriceOverride {
        line_id: line.id.clone(),
        quantity: line.quantity,
        price: Price::new(round_price(config.calculated_price), currency),
        attributes: vec![
            AttributeInput {
                key: CUSTOM_CONFIGURATION_KEY.to_owned(),
                value: fields,
            },
            AttributeInput {
                key: ORIGINAL_PRICE_KEY.to_owned(),
                value: line.original_amount().to_owned(),
            },
        ],
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn line(id: &str, attributes: Vec<Attribute>, amount: Option<&str>) -> CartLine {
        CartLine {
            id: id.to_owned(),
            quantity: 2,
            attributes,
            cost: amount.map(|amount| CartLineCost {
                amount_per_quantity: Some(Money {
                    amount: amount.to_owned(),
                    currency_code: "GBP".to_owned(),
                }),
            }),
        }
    }

    fn config_attribute(value: &str) -> Attribute {
        Attribute {
            key: CALCULATOR_CONFIG_KEY.to_owned(),
            value: Some(value.to_owned()),
        }
    }

    #[test]
    fn test_price_override() {
        let lines = [line(
            "gid://shopify/CartLine/1",
            vec![config_attribute(
                r#"{"calculatorId":"abc","calculatedPrice":925,"fields":{"length":100,"material":"premium"}}"#,
            )],
            Some("49.99"),
        )];

        let operations = transform_lines(&lines, CurrencyCode::GBP);
        assert_eq!(operations.len(), 1);
        let LineOperation::PriceOverride(update) = &operations[0] else {
            panic!("expected a price override");
        };
        assert_eq!(update.line_id, "gid://shopify/CartLine/1");
        assert_eq!(update.quantity, 2);
        assert_eq!(update.price.amount, Decimal::from(925));
        assert_eq!(update.attributes[0].key, CUSTOM_CONFIGURATION_KEY);
        assert_eq!(update.attributes[0].value, r#"{"length":100.0,"material":"premium"}"#);
        assert_eq!(update.attributes[1].value, "49.99");
    }

    #[test]
    fn test_original_price_defaults_to_zero() {
        let lines = [line(
            "1",
            vec![config_attribute(r#"{"calculatedPrice":10.5,"fields":{}}"#)],
            None,
        )];
        let operations = transform_lines(&lines, CurrencyCode::USD);
        let LineOperation::PriceOverride(update) = &operations[0] else {
            panic!("expected a price override");
        };
        assert_eq!(update.attributes[1].value, "0");
        assert_eq!(
            serde_json::to_value(&update.price).unwrap(),
            json!({"amount": "10.5", "currencyCode": "USD"})
        );
    }

    #[test]
    fn test_invalid_configuration_targets_line() {
        let lines = [
            line("1", Vec::new(), Some("5.00")),
            line("2", vec![config_attribute("{not json")], Some("5.00")),
        ];
        let operations = transform_lines(&lines, CurrencyCode::GBP);
        assert_eq!(
            operations,
            vec![LineOperation::ValidationError(CartValidationError {
                message: INVALID_CONFIGURATION_MESSAGE.to_owned(),
                target: "$.cart.lines[1]".to_owned(),
            })]
        );
    }

    #[test]
    fn test_negative_price_is_rejected() {
        let err = CartLineConfig::from_attribute_value(r#"{"calculatedPrice":-1,"fields":{}}"#)
            .unwrap_err();
        assert!(matches!(err, CartConfigError::NegativePrice(_)));
    }

    #[test]
    fn test_lines_without_attribute_are_skipped() {
        let lines = [line("1", Vec::new(), None)];
        assert!(transform_lines(&lines, CurrencyCode::GBP).is_empty());
    }

    #[test]
    fn test_attribute_round_trip() {
        let config = CartLineConfig {
            calculator_id: Some(CalculatorId::new("calc-1")),
            calculated_price: Decimal::new(1250, 2),
            fields: Inputs::from([("width".to_owned(), "60".into())]),
        };
        let attribute = config.to_attribute().unwrap();
        assert_eq!(attribute.key, CALCULATOR_CONFIG_KEY);
        assert_eq!(CartLineConfig::from_attribute_value(&attribute.value).unwrap(), config);
    }
}
