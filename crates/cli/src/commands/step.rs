//! Checkout step resolution.
//!
//! # Usage
//!
//! ```bash
//! miel step 99
//! # active: 3 Payment Method
//! # next:   -
//! # back:   2 Shipping Address
//! ```

use std::fmt::Write;

use miel_core::{CheckoutStep, NavigationIntent, guarded_advance, resolve_active_step, retreat};

/// Describe the active step and where the navigation buttons lead.
#[must_use]
pub fn describe(raw: Option<&str>, shipping_info_present: bool) -> String {
    let step = resolve_active_step(raw);
    let mut out = String::new();

    let _ = writeln!(out, "active: {}", label(step));
    let _ = writeln!(
        out,
        "next:   {}",
        intent_label(guarded_advance(step, shipping_info_present))
    );
    let _ = write!(out, "back:   {}", intent_label(retreat(step)));

    out
}

fn label(step: CheckoutStep) -> String {
    format!("{} {}", step.number(), step.title())
}

fn intent_label(intent: NavigationIntent) -> String {
    intent.target().map_or_else(|| "-".to_string(), label)
}
