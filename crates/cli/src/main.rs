//! Miel CLI - Checkout and pricing tools.
//!
//! # Usage
//!
//! ```bash
//! # Resolve a raw step indicator the way the storefront does
//! miel step 2
//! miel step 2 --shipping
//! miel step -5
//!
//! # Quote a cart saved as JSON
//! miel quote cart.json
//! miel quote cart.json --discount 0 --shipping 7500
//! miel quote cart.json --json
//! ```
//!
//! # Commands
//!
//! - `step` - Resolve a step indicator and show the available transitions
//! - `quote` - Compute subtotal and total for a cart file

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use rust_decimal::Decimal;

mod commands;

#[derive(Parser)]
#[command(name = "miel")]
#[command(author, version, about = "Miel storefront CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve a checkout step indicator
    Step {
        /// Raw `step` value (omit to simulate a missing parameter)
        #[arg(allow_negative_numbers = true)]
        raw: Option<String>,

        /// Treat shipping details as captured
        #[arg(long)]
        shipping: bool,
    },
    /// Quote a cart file
    Quote {
        /// Path to a JSON array of cart line items
        cart: PathBuf,

        /// Flat discount
        #[arg(long, env = "MIEL_DISCOUNT", default_value = "3000")]
        discount: Decimal,

        /// Flat shipping fee
        #[arg(long = "shipping", env = "MIEL_SHIPPING_FEE", default_value = "5000")]
        shipping_fee: Decimal,

        /// Print the totals as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    // Load .env file if present (ignore errors if not found)
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli);

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

#[allow(clippy::print_stdout)]
fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Step { raw, shipping } => {
            println!("{}", commands::step::describe(raw.as_deref(), shipping));
        }
        Commands::Quote {
            cart,
            discount,
            shipping_fee,
            json,
        } => {
            let quote = commands::quote::quote_file(&cart, discount, shipping_fee)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&quote)?);
            } else {
                println!("{}", commands::quote::render(&quote));
            }
        }
    }
    Ok(())
}
