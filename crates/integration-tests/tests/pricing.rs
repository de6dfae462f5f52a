//! Integration tests for input validation, pricing rules and quotes.

#![allow(clippy::unwrap_used)]

use bonimi_core::{
    Calculator, CurrencyCode, EvaluationError, FieldOption, InputValue, Inputs, PricingKind,
    PricingRule, QuoteError, ResolveError, ResolvedVariables, ValidationError, ValidationErrors,
    ValidationReason, normalize, quote, resolve_variables,
};
use bonimi_integration_tests::{dec, inputs, premium_order, shelf_document, splashback};
use rust_decimal::Decimal;

fn rejected(result: Result<ResolvedVariables, ResolveError>) -> ValidationErrors {
    match result {
        Err(ResolveError::Invalid(errors)) => errors,
        other => panic!("expected rejected fields, got {other:?}"),
    }
}

// =============================================================================
// Validation
// =============================================================================

#[test]
fn test_fixture_is_valid() {
    assert_eq!(splashback().validate(), Vec::new());
}

#[test]
fn test_every_missing_required_field_is_reported() {
    let order = inputs([("material", InputValue::from("standard"))]);
    let errors = rejected(resolve_variables(&splashback(), &order, None));
    assert_eq!(
        errors.0,
        vec![
            ValidationError {
                field: "length".to_owned(),
                reason: ValidationReason::Missing,
            },
            ValidationError {
                field: "width".to_owned(),
                reason: ValidationReason::Missing,
            },
        ]
    );
}

#[test]
fn test_mixed_problems_are_collected_in_field_order() {
    let order = inputs([
        ("length", InputValue::from("5")),
        ("width", InputValue::from("thirty")),
        ("material", InputValue::from("")),
    ]);
    let errors = rejected(resolve_variables(&splashback(), &order, None));
    let reasons: Vec<(&str, ValidationReason)> = errors
        .iter()
        .map(|error| (error.field.as_str(), error.reason))
        .collect();
    assert_eq!(
        reasons,
        [
            ("length", ValidationReason::BelowMin),
            ("width", ValidationReason::NotANumber),
            ("material", ValidationReason::Missing),
        ]
    );
}

#[test]
fn test_bounds_are_inclusive() {
    let order = inputs([
        ("length", InputValue::from(300_i64)),
        ("width", InputValue::from(10_i64)),
        ("material", InputValue::from("standard")),
    ]);
    assert!(resolve_variables(&splashback(), &order, None).is_ok());
}

// =============================================================================
// Pricing rules
// =============================================================================

#[test]
fn test_multiplier_resolves_alias() {
    let resolved = resolve_variables(&splashback(), &premium_order(), None).unwrap();
    assert_eq!(resolved.variables["materialMultiplier"], dec("1.2"));
}

#[test]
fn test_additional_and_checkbox() {
    let resolved = resolve_variables(&splashback(), &premium_order(), None).unwrap();
    assert_eq!(resolved.base_price, dec("115"));
    assert_eq!(resolved.variables["basePrice"], dec("115"));
    assert_eq!(resolved.variables["giftWrap"], dec("1"));
    assert!(!resolved.variables.contains_key("notes"));
}

#[test]
fn test_unpriced_option_contributes_zero() {
    let order = inputs([
        ("length", InputValue::from(50_i64)),
        ("width", InputValue::from(30_i64)),
        ("material", InputValue::from("standard")),
        ("edge", InputValue::from("none")),
    ]);
    let resolved = resolve_variables(&splashback(), &order, None).unwrap();
    assert_eq!(resolved.variables["edge"], dec("0"));
    assert_eq!(resolved.base_price, dec("100"));
}

#[test]
fn test_base_price_override() {
    let resolved = resolve_variables(&splashback(), &premium_order(), Some(dec("60"))).unwrap();
    assert_eq!(resolved.base_price, dec("75"));
}

#[test]
fn test_additional_amounts_that_overflow_are_rejected() {
    let mut calculator = splashback();
    let edge = calculator.fields.iter_mut().find(|field| field.name == "edge").unwrap();
    edge.options.push(FieldOption::new("Gold leaf", "gold"));
    edge.pricing_rule = Some(PricingRule::new(PricingKind::Additional, [("gold", Decimal::MAX)]));

    let mut order = premium_order();
    order.insert("edge".to_owned(), InputValue::from("gold"));
    assert_eq!(
        resolve_variables(&calculator, &order, None),
        Err(ResolveError::Overflow)
    );
    assert_eq!(
        quote(&calculator, &order, None),
        Err(QuoteError::Evaluation(EvaluationError::Overflow))
    );
}

// =============================================================================
// Quotes
// =============================================================================

#[test]
fn test_premium_quote() {
    let quote = quote(&splashback(), &premium_order(), None).unwrap();
    // 100 + 15 edge + 50 * 30 * 0.01 * 1.2 + 5 gift wrap
    assert_eq!(quote.price, dec("138.00"));
    assert!(!quote.clamped);
    assert_eq!(quote.price_in(CurrencyCode::GBP).display(), "£138.00");
}

#[test]
fn test_minimum_price_from_yaml_definition() {
    let shelf = normalize(&shelf_document()).unwrap();
    assert!(shelf.is_valid());

    let order = inputs([("width", InputValue::from(20_i64)), ("brackets", InputValue::from("0"))]);
    let floored = quote(&shelf, &order, None).unwrap();
    // 12 + 20 * 0.4 = 20, below the 25 floor
    assert_eq!(floored.price, dec("25"));
    assert!(floored.clamped);

    let order = inputs([("width", InputValue::from(100_i64)), ("brackets", InputValue::from("4"))]);
    let regular = quote(&shelf, &order, None).unwrap();
    assert_eq!(regular.price, dec("64"));
    assert!(!regular.clamped);
}

#[test]
fn test_renamed_field_is_a_formula_error() {
    let mut calculator: Calculator = splashback();
    calculator.formula = "basePrice + len * width".to_owned();
    let err = quote(&calculator, &premium_order(), None).unwrap_err();
    assert_eq!(
        err,
        QuoteError::Evaluation(EvaluationError::UnboundVariable("len".to_owned()))
    );
}

#[test]
fn test_validation_errors_win_over_formula_errors() {
    let mut calculator = splashback();
    calculator.formula = "basePrice / 0".to_owned();
    let err = quote(&calculator, &Inputs::new(), None).unwrap_err();
    assert!(matches!(err, QuoteError::Validation(errors) if errors.len() == 3));
}
