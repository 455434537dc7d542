//! Miel Core - Storefront domain library.
//!
//! This crate provides the domain logic shared by the Miel components:
//! - `storefront` - Public-facing honey shop (cart and checkout wizard)
//! - `cli` - Command-line tools for quoting carts and resolving steps
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP,
//! no session handling. Callers own the cart and hand it in explicitly.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for product IDs and prices
//! - [`cart`] - Line items, the cart collection and its change notifications
//! - [`pricing`] - Subtotal and grand total calculation
//! - [`checkout`] - Checkout step resolution, navigation intents and guards

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod checkout;
pub mod pricing;
pub mod types;

pub use cart::{Cart, CartError, CartEvent, CartLineItem, CartStore, LineItemKey, SubscriptionId};
pub use checkout::{
    CheckoutStep, InvalidStep, NavigationIntent, STEP_PARAM, ShippingInfo, StepContent, advance,
    can_advance, can_retreat, guarded_advance, resolve_active_step, retreat, step_content,
};
pub use pricing::{Adjustments, CartTotals, PricingError, subtotal, total};
pub use types::*;
