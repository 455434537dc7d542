//! Type-safe price representation using decimal arithmetic.
//!
//! Amounts are kept in the currency's major unit (e.g. ariary, not iraimbilanja)
//! as a [`Decimal`], so sums and products never drift the way binary floats do.

use core::fmt;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Number of decimal places used when displaying amounts.
pub const DISPLAY_DECIMAL_PLACES: u32 = 2;

/// A price with currency information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Amount in the currency's standard unit.
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency_code: CurrencyCode,
}

impl Price {
    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal, currency_code: CurrencyCode) -> Self {
        Self {
            amount,
            currency_code,
        }
    }

    /// Create a price in the default currency (Malagasy ariary).
    #[must_use]
    pub const fn ariary(amount: Decimal) -> Self {
        Self::new(amount, CurrencyCode::MGA)
    }

    /// Format for display, e.g. `"50000.00 Ariary"`.
    #[must_use]
    pub fn display(&self) -> String {
        let rounded = self
            .amount
            .round_dp_with_strategy(DISPLAY_DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero);
        format!("{rounded:.2} {}", self.currency_code.label())
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

/// ISO 4217 currency codes accepted by the shop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    /// Malagasy ariary.
    #[default]
    MGA,
    EUR,
    USD,
}

impl CurrencyCode {
    /// Display label shown after the amount.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::MGA => "Ariary",
            Self::EUR => "EUR",
            Self::USD => "USD",
        }
    }

    /// ISO 4217 code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::MGA => "MGA",
            Self::EUR => "EUR",
            Self::USD => "USD",
        }
    }
}
