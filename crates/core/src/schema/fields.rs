use serde_json::Value;

use super::{Props, SchemaError, SchemaShape};
use crate::model::{Calculator, Field, FieldType};

pub(super) fn parse_fields(entries: &[Value]) -> Result<Vec<Field>, SchemaError> {
    entries
        .iter()
        .enumerate()
        .map(|(index, entry)| parse_field(index, entry))
        .collect()
}

fn parse_field(index: usize, entry: &Value) -> Result<Field, SchemaError> {
    let map = entry
        .as_object()
        .ok_or_else(|| SchemaError::invalid(format!("field #{index}"), "fields"))?;
    let props = Props::new(map, None);
    let index_location = format!("field #{index}");

    let name = match props.scalar("name", &index_location)? {
        Some(name) if !name.trim().is_empty() => name,
        _ => props
            .scalar("id", &index_location)?
            .filter(|id| !id.trim().is_empty())
            .ok_or(SchemaError::UnnamedField {
                shape: SchemaShape::Fields,
                index,
            })?,
    };
    let location = format!("field `{name}`");

    let kind = props
        .string("type", &location)?
        .map_or_else(FieldType::default, |kind| FieldType::from_name(&kind));
    let label = props.string("label", &location)?.unwrap_or_default();

    read_field(name, label, kind, props, &location)
}

/// Fill in the properties shared by both stored shapes.
pub(super) fn read_field(
    name: String,
    label: String,
    kind: FieldType,
    props: Props<'_>,
    location: &str,
) -> Result<Field, SchemaError> {
    Ok(Field {
        name,
        label,
        kind,
        required: props.bool("required", location)?.unwrap_or(false),
        placeholder: props.string("placeholder", location)?.unwrap_or_default(),
        help_text: props.string("helpText", location)?.unwrap_or_default(),
        min: props.decimal("min", location)?,
        max: props.decimal("max", location)?,
        step: props.decimal("step", location)?,
        options: props.options(location)?,
        checked: props.bool("checked", location)?.unwrap_or(false),
        pricing_rule: props.pricing_rule(location)?,
    })
}

/// The list ("fields") representation of a calculator.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn to_fields_shape(calculator: &Calculator) -> serde_json::Result<Value> {
    serde_json::to_value(calculator)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;
    use serde_json::json;

    use super::to_fields_shape;
    use crate::model::{Calculator, Field, FieldOption, PricingKind, PricingRule};
    use crate::schema::{SchemaError, SchemaShape, normalize};

    #[test]
    fn test_list_shape_fields() {
        let calc = normalize(&json!({
            "name": "Splashback",
            "formula": "basePrice + length * materialMultiplier",
            "basePrice": 25,
            "fields": [
                {"name": "length", "label": "Length", "type": "number", "required": true, "min": 10, "max": 300},
                {
                    "name": "material",
                    "label": "Material",
                    "type": "select",
                    "options": [{"label": "Standard", "value": "standard"}, {"label": "Premium", "value": "premium"}],
                    "pricingRule": {"kind": "multiplier", "valueByOption": {"standard": 1, "premium": 1.2}}
                }
            ]
        }))
        .unwrap();

        assert_eq!(calc.base_price, Decimal::from(25));
        let length = &calc.fields[0];
        assert!(length.required);
        assert_eq!(length.min, Some(Decimal::from(10)));
        assert_eq!(length.max, Some(Decimal::from(300)));

        let material = &calc.fields[1];
        assert_eq!(
            material.options,
            vec![
                FieldOption::new("Standard", "standard"),
                FieldOption::new("Premium", "premium"),
            ]
        );
        assert_eq!(
            material.pricing_rule,
            Some(PricingRule::new(
                PricingKind::Multiplier,
                [("standard", Decimal::ONE), ("premium", Decimal::new(12, 1))]
            ))
        );
    }

    #[test]
    fn test_name_falls_back_to_id() {
        let calc = normalize(&json!({"fields": [{"id": "width", "type": "number"}]})).unwrap();
        assert_eq!(calc.fields[0].name, "width");
    }

    #[test]
    fn test_unnamed_field() {
        let raw = json!({"fields": [{"name": "length"}, {"label": "Width"}]});
        assert_eq!(
            normalize(&raw),
            Err(SchemaError::UnnamedField {
                shape: SchemaShape::Fields,
                index: 1
            })
        );
    }

    #[test]
    fn test_non_numeric_bound_is_rejected() {
        let raw = json!({"fields": [{"name": "length", "type": "number", "min": "ten"}]});
        assert_eq!(
            normalize(&raw),
            Err(SchemaError::InvalidProperty {
                location: "field `length`".to_owned(),
                property: "min".to_owned(),
            })
        );
    }

    #[test]
    fn test_canonical_output_reparses() {
        let raw = json!({
            "name": "Gift box",
            "formula": "basePrice + wrap * 3",
            "fields": [{"name": "wrap", "label": "Gift wrap", "type": "checkbox", "checked": true}]
        });
        let calc = normalize(&raw).unwrap();
        let canonical = calc.to_canonical().unwrap();
        assert_eq!(normalize(&canonical).unwrap(), calc);
    }

    #[test]
    fn test_decimals_are_written_as_exact_strings() {
        let calc = Calculator::new(
            "Panel",
            "basePrice + width",
            vec![Field::number("width", "Width").bounded(Some(Decimal::MIN), Some(Decimal::MAX))],
        )
        .with_base_price("12345678901234567.89".parse().unwrap());

        let raw = to_fields_shape(&calc).unwrap();
        assert_eq!(raw["basePrice"], "12345678901234567.89");
        assert_eq!(raw["fields"][0]["min"], "-79228162514264337593543950335");
        assert_eq!(normalize(&raw).unwrap(), calc);
    }
}
