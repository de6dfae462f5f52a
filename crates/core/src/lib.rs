//! Bonimi Core - pricing calculator engine.
//!
//! This crate holds everything that decides what a configured product costs:
//! - [`model`] - the canonical calculator, its fields and validation rules
//! - [`schema`] - conversion from the builder's `elements` shape and the flat
//!   `fields` shape into the canonical model, and back
//! - [`formula`] - a closed arithmetic interpreter for pricing formulas
//! - [`pricing`] - shopper input validation, pricing rules and quotes
//! - [`cart`] - the cart line attribute carrying a quote into checkout
//! - [`store`] - the persistence contract plus an in-memory implementation
//!
//! # Architecture
//!
//! The core does no I/O: no database access, no HTTP clients, no filesystem.
//! Every operation is a pure function of its inputs, so quotes for
//! concurrent shoppers need no coordination.
//!
//! ```
//! use bonimi_core::{Calculator, Field, Inputs, InputValue, pricing};
//! use rust_decimal::Decimal;
//!
//! let calculator = Calculator::new(
//!     "Splashback",
//!     "basePrice + length * width * 0.15",
//!     vec![
//!         Field::number("length", "Length (cm)").required(),
//!         Field::number("width", "Width (cm)").required(),
//!     ],
//! )
//! .with_base_price(Decimal::from(25));
//!
//! let inputs = Inputs::from([
//!     ("length".to_owned(), InputValue::from(100_i64)),
//!     ("width".to_owned(), InputValue::from("60")),
//! ]);
//! let quote = pricing::quote(&calculator, &inputs, None).unwrap();
//! assert_eq!(quote.price, Decimal::from(925));
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod formula;
pub mod model;
pub mod pricing;
pub mod schema;
pub mod store;
pub mod types;

pub use formula::{EvaluationError, Formula, Variables, evaluate};
pub use model::{
    Calculator, CalculatorIssue, Field, FieldOption, FieldType, InputValue, Inputs, PricingKind,
    PricingRule,
};
pub use pricing::{
    Quote, QuoteError, ResolveError, ResolvedVariables, ValidationError, ValidationErrors,
    ValidationReason, quote, resolve_variables,
};
pub use schema::{SchemaError, SchemaShape, normalize};
pub use store::{CalculatorRepository, InMemoryCalculatorRepository, RepositoryError};
pub use types::*;
