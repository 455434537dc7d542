//! Session-related types.
//!
//! The visitor's cart and captured shipping details live in the session, so
//! a page reload keeps checkout progress until the session expires.

/// Session keys for checkout data.
pub mod keys {
    /// Key for the visitor's cart (`miel_core::Cart`).
    pub const CART: &str = "cart";

    /// Key for captured shipping details (`miel_core::ShippingInfo`).
    pub const SHIPPING_INFO: &str = "shipping_info";
}
