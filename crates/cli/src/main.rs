//! Bonimi CLI - quote, validate and convert pricing calculators.
//!
//! # Usage
//!
//! ```bash
//! # Price a calculator for a set of shopper inputs
//! bonimi quote --calculator splashback.json --inputs order.json
//!
//! # Check a calculator definition
//! bonimi validate --calculator splashback.yaml
//!
//! # Rewrite a builder canvas export as a field list
//! bonimi convert --calculator canvas.json --to fields
//!
//! # Try out a formula
//! bonimi eval --formula "basePrice + length * 0.5" --var basePrice=10 --var length=40
//! ```
//!
//! # Commands
//!
//! - `quote` - Print the price for a calculator and inputs
//! - `validate` - List every problem with a calculator definition
//! - `convert` - Print a calculator in the `elements` or `fields` shape
//! - `eval` - Evaluate a bare formula
//! - `cart-line` - Print the `calculator_config` cart line attribute

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::io;
use std::path::PathBuf;

use bonimi_core::{CurrencyCode, SchemaShape};
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod config;

use commands::CliError;
use commands::quote::QuoteOptions;
use config::{CliConfig, LogFormat};

#[derive(Parser)]
#[command(name = "bonimi")]
#[command(author, version, about = "Bonimi pricing calculator tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Price a calculator for a set of shopper inputs
    Quote {
        /// Calculator definition (JSON or YAML, either shape)
        #[arg(short, long)]
        calculator: PathBuf,

        /// Shopper inputs keyed by field name
        #[arg(short, long)]
        inputs: PathBuf,

        /// Override the calculator's base price
        #[arg(long)]
        base_price: Option<Decimal>,

        /// Display currency (overrides `BONIMI_CURRENCY`)
        #[arg(long)]
        currency: Option<CurrencyCode>,

        /// Print the full quote as JSON
        #[arg(long)]
        json: bool,
    },
    /// List every problem with a calculator definition
    Validate {
        #[arg(short, long)]
        calculator: PathBuf,
    },
    /// Print a calculator in the `elements` or `fields` shape
    Convert {
        #[arg(short, long)]
        calculator: PathBuf,

        /// Target shape (`elements` or `fields`)
        #[arg(long, default_value = "fields")]
        to: SchemaShape,
    },
    /// Evaluate a bare formula
    Eval {
        #[arg(short, long)]
        formula: String,

        /// Variable binding as `name=value` (repeatable)
        #[arg(long = "var", value_parser = commands::eval::parse_var)]
        vars: Vec<(String, Decimal)>,
    },
    /// Print the `calculator_config` cart line attribute for a quote
    CartLine {
        #[arg(short, long)]
        calculator: PathBuf,

        #[arg(short, long)]
        inputs: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();
    let config = CliConfig::from_env();

    init_tracing(config.as_ref().map_or(LogFormat::Pretty, |config| config.log_format));

    let result = config
        .map_err(CliError::from)
        .and_then(|config| run(cli, &config));

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

/// Logs go to stderr so command output on stdout stays machine-readable.
fn init_tracing(format: LogFormat) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "bonimi_cli=info,bonimi_core=info".into());

    let registry = tracing_subscriber::registry().with(env_filter);
    match format {
        LogFormat::Pretty => registry
            .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
            .init(),
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(io::stderr))
            .init(),
    }
}

fn run(cli: Cli, config: &CliConfig) -> Result<(), CliError> {
    let mut out = io::stdout().lock();
    match cli.command {
        Commands::Quote {
            calculator,
            inputs,
            base_price,
            currency,
            json,
        } => {
            let options = QuoteOptions {
                base_price,
                currency: currency.unwrap_or(config.currency),
                json,
            };
            commands::quote::run(&calculator, &inputs, options, &mut out)?;
        }
        Commands::Validate { calculator } => commands::validate::run(&calculator, &mut out)?,
        Commands::Convert { calculator, to } => commands::convert::run(&calculator, to, &mut out)?,
        Commands::Eval { formula, vars } => commands::eval::run(&formula, vars, &mut out)?,
        Commands::CartLine { calculator, inputs } => {
            commands::cart_line::run(&calculator, &inputs, &mut out)?;
        }
    }
    Ok(())
}
