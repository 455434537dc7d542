//! Cart total calculation.
//!
//! Totals are exact decimal sums. The discount and shipping fee are inputs
//! supplied by configuration, not constants.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::cart::CartLineItem;

/// Errors that can occur when building [`Adjustments`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PricingError {
    #[error("discount cannot be negative (got {0})")]
    NegativeDiscount(Decimal),
    #[error("shipping fee cannot be negative (got {0})")]
    NegativeShippingFee(Decimal),
}

/// Flat order-level adjustments applied on top of the subtotal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Adjustments {
    discount: Decimal,
    shipping_fee: Decimal,
}

impl Adjustments {
    /// Create adjustments from a flat discount and a flat shipping fee.
    ///
    /// # Errors
    ///
    /// Returns an error if either amount is negative.
    pub fn new(discount: Decimal, shipping_fee: Decimal) -> Result<Self, PricingError> {
        if discount < Decimal::ZERO {
            return Err(PricingError::NegativeDiscount(discount));
        }
        if shipping_fee < Decimal::ZERO {
            return Err(PricingError::NegativeShippingFee(shipping_fee));
        }
        Ok(Self {
            discount,
            shipping_fee,
        })
    }

    #[must_use]
    pub const fn discount(&self) -> Decimal {
        self.discount
    }

    #[must_use]
    pub const fn shipping_fee(&self) -> Decimal {
        self.shipping_fee
    }

    /// `subtotal − discount + shipping fee`, floored at zero.
    #[must_use]
    pub fn apply(&self, subtotal: Decimal) -> Decimal {
        subtotal
            .saturating_sub(self.discount)
            .saturating_add(self.shipping_fee)
            .max(Decimal::ZERO)
    }
}

/// Sum of `unit_price × quantity` over all items. Zero for no items.
///
/// Saturates at [`Decimal::MAX`] instead of panicking. Items held in a
/// [`Cart`](crate::Cart) never reach that bound.
#[must_use]
pub fn subtotal<'a, I>(items: I) -> Decimal
where
    I: IntoIterator<Item = &'a CartLineItem>,
{
    items
        .into_iter()
        .fold(Decimal::ZERO, |sum, item| sum.saturating_add(item.line_total()))
}

/// `subtotal − discount + shipping fee`. An order never totals below zero.
#[must_use]
pub fn total<'a, I>(items: I, adjustments: &Adjustments) -> Decimal
where
    I: IntoIterator<Item = &'a CartLineItem>,
{
    adjustments.apply(subtotal(items))
}

/// Breakdown shown in the cart details panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartTotals {
    pub subtotal: Decimal,
    pub discount: Decimal,
    pub shipping_fee: Decimal,
    pub total: Decimal,
    pub item_count: u64,
}

impl CartTotals {
    /// Compute the breakdown for `items`.
    #[must_use]
    pub fn compute(items: &[CartLineItem], adjustments: &Adjustments) -> Self {
        let subtotal = subtotal(items);
        Self {
            subtotal,
            discount: adjustments.discount,
            shipping_fee: adjustments.shipping_fee,
            total: adjustments.apply(subtotal),
            item_count: items.iter().map(|item| u64::from(item.quantity())).sum(),
        }
    }
}
