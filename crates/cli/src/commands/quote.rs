//! Cart quoting.
//!
//! Reads a cart saved as a JSON array of line items and computes its totals
//! with the given discount and shipping fee.

use std::path::{Path, PathBuf};

use miel_core::{Adjustments, Cart, CartTotals, Price, PricingError};
use rust_decimal::Decimal;
use thiserror::Error;

/// Errors that can occur while quoting a cart file.
#[derive(Debug, Error)]
pub enum QuoteError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid cart file: {0}")]
    Parse(#[from] serde_json::Error),
    #[error(transparent)]
    Pricing(#[from] PricingError),
}

/// Quote the cart stored at `path`.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, or if an
/// adjustment is negative.
pub fn quote_file(
    path: &Path,
    discount: Decimal,
    shipping_fee: Decimal,
) -> Result<CartTotals, QuoteError> {
    let contents = std::fs::read_to_string(path).map_err(|source| QuoteError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    quote_json(&contents, discount, shipping_fee)
}

/// Quote a cart given as JSON text.
///
/// # Errors
///
/// Returns an error if the JSON is not a valid cart or an adjustment is negative.
pub fn quote_json(
    json: &str,
    discount: Decimal,
    shipping_fee: Decimal,
) -> Result<CartTotals, QuoteError> {
    let adjustments = Adjustments::new(discount, shipping_fee)?;
    let cart: Cart = serde_json::from_str(json)?;
    tracing::debug!(lines = cart.len(), "Cart loaded");
    Ok(CartTotals::compute(cart.items(), &adjustments))
}

/// Human-readable totals, one figure per line.
#[must_use]
pub fn render(totals: &CartTotals) -> String {
    format!(
        "Items:    {}\nSubtotal: {}\nDiscount: -{}\nShipping: +{}\nTotal:    {}",
        totals.item_count,
        Price::ariary(totals.subtotal),
        Price::ariary(totals.discount),
        Price::ariary(totals.shipping_fee),
        Price::ariary(totals.total),
    )
}
