//! Integration tests for Bonimi.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p bonimi-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `evaluator` - Formula evaluation properties
//! - `pricing` - Input validation, pricing rules and quotes
//! - `schema_round_trip` - `elements` and `fields` shape conversions
//! - `cart_line` - Quote to checkout price override
//! - `repository` - In-memory persistence contract
//!
//! This crate only holds shared fixtures; the tests live in `tests/`.

#![allow(clippy::unwrap_used)]

use std::str::FromStr;

use bonimi_core::{
    Calculator, Field, FieldOption, FieldType, InputValue, Inputs, PricingKind, PricingRule,
};
use rust_decimal::Decimal;
use serde_json::{Value, json};

/// Parse a decimal literal.
#[must_use]
pub fn dec(value: &str) -> Decimal {
    Decimal::from_str(value).unwrap()
}

/// Build an input map from `(name, value)` pairs.
#[must_use]
pub fn inputs<const N: usize>(pairs: [(&str, InputValue); N]) -> Inputs {
    pairs
        .into_iter()
        .map(|(name, value)| (name.to_owned(), value))
        .collect()
}

/// A glass splashback priced by area, with every field type represented.
///
/// - `material` multiplies the area charge (`standard` 0.8, `premium` 1.2)
/// - `edge` adds to the base price (`polished` 15, `none` unpriced)
/// - `giftWrap` adds 5 when ticked
/// - `notes` is free text and never reaches the formula
#[must_use]
pub fn splashback() -> Calculator {
    let mut gift_wrap = Field::new("giftWrap", "Gift wrap", FieldType::Checkbox);
    gift_wrap.help_text = "Wrapped in recycled paper".to_owned();

    let mut notes = Field::new("notes", "Notes", FieldType::Text);
    notes.placeholder = "Anything we should know?".to_owned();

    let mut length = Field::number("length", "Length (cm)")
        .required()
        .bounded(Some(dec("10")), Some(dec("300")));
    length.step = Some(dec("0.5"));

    let mut edge = Field::new("edge", "Edge finish", FieldType::Radio).with_pricing_rule(
        PricingRule::new(PricingKind::Additional, [("polished", dec("15"))]),
    );
    edge.options = vec![
        FieldOption::new("No finish", "none"),
        FieldOption::new("Polished", "polished"),
    ];

    let mut calculator = Calculator::new(
        "Glass splashback",
        "basePrice + length * width * 0.01 * materialMultiplier + giftWrap * 5",
        vec![
            length,
            Field::number("width", "Width (cm)")
                .required()
                .bounded(Some(dec("10")), Some(dec("120"))),
            Field::select(
                "material",
                "Material",
                [
                    FieldOption::new("Standard Glass", "standard"),
                    FieldOption::new("Premium Glass", "premium"),
                ],
            )
            .required()
            .with_pricing_rule(PricingRule::new(
                PricingKind::Multiplier,
                [("standard", dec("0.8")), ("premium", dec("1.2"))],
            )),
            edge,
            gift_wrap,
            notes,
        ],
    )
    .with_base_price(dec("100"));
    calculator.description = Some("Made-to-measure toughened glass".to_owned());
    calculator
}

/// Inputs for a 50 x 30 premium splashback with a polished edge and gift wrap.
#[must_use]
pub fn premium_order() -> Inputs {
    inputs([
        ("length", InputValue::from(50_i64)),
        ("width", InputValue::from("30")),
        ("material", InputValue::from("premium")),
        ("edge", InputValue::from("polished")),
        ("giftWrap", InputValue::from(true)),
        ("notes", InputValue::from("Fit behind the hob")),
    ])
}

/// A calculator as exported by the drag-and-drop builder.
#[must_use]
pub fn builder_export() -> Value {
    json!({
        "id": 1_712_345_678_901_i64,
        "name": "Worktop",
        "formula": "basePrice + length * depth * 0.02 * finishMultiplier",
        "basePrice": 40,
        "status": "draft",
        "productIds": ["gid://shopify/Product/8123"],
        "createdAt": "2024-04-05T10:00:00Z",
        "updatedAt": "2024-04-06T12:30:00Z",
        "elements": [
            {
                "id": "length",
                "type": "number-input",
                "name": "Length",
                "position": {"x": 20, "y": 40},
                "config": {"label": "Length (mm)", "required": true, "min": 300, "max": 4000, "step": 10}
            },
            {
                "id": "depth",
                "type": "number-input",
                "name": "Depth",
                "position": {"x": 20, "y": 120},
                "config": {"required": true}
            },
            {
                "id": "finish",
                "type": "select",
                "name": "Finish",
                "position": {"x": 20, "y": 200},
                "config": {
                    "label": "Finish",
                    "options": [{"label": "Matt", "value": "matt"}, {"label": "Gloss", "value": "gloss"}],
                    "pricingType": "multiplier",
                    "pricing": {"matt": 1, "gloss": 1.25}
                }
            },
            {
                "id": "heading",
                "type": "heading",
                "position": {"x": 0, "y": 0},
                "config": {"label": "Your worktop"}
            }
        ]
    })
}

/// A list-shaped calculator written by hand in YAML.
pub const SHELF_YAML: &str = r#"
name: Floating shelf
formula: basePrice + width * 0.4 + brackets * 3
basePrice: 12
minimumPrice: 25
fields:
  - name: width
    label: Width (cm)
    type: number
    required: true
    min: 20
    max: 180
  - name: brackets
    label: Extra brackets
    type: select
    options: ["0", "2", "4"]
"#;

/// Parse [`SHELF_YAML`] into a JSON value.
#[must_use]
pub fn shelf_document() -> Value {
    serde_yaml::from_str(SHELF_YAML).unwrap()
}
