//! Checkout step controller.
//!
//! The active step is never stored: it is derived from a free-form step
//! indicator (the `step` query parameter) on every request and clamped into
//! range. Transitions are expressed as [`NavigationIntent`]s that the routing
//! layer carries out.
//!
//! ```text
//! 1 Shopping Cart ──advance──▶ 2 Shipping Address ──advance*──▶ 3 Payment Method
//!                 ◀──retreat──                    ◀──retreat───
//!
//! * only when shipping info has been captured
//! ```

use core::fmt;

use serde::{Deserialize, Serialize};

/// Name of the query parameter carrying the step indicator.
pub const STEP_PARAM: &str = "step";

/// A checkout stage. Always in `1..=3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum CheckoutStep {
    #[default]
    CartReview = 1,
    ShippingAddress = 2,
    Payment = 3,
}

impl CheckoutStep {
    /// All steps in order.
    pub const ALL: [Self; 3] = [Self::CartReview, Self::ShippingAddress, Self::Payment];

    pub const FIRST: Self = Self::CartReview;
    pub const LAST: Self = Self::Payment;

    /// Ordinal of the step (1, 2 or 3).
    #[must_use]
    pub const fn number(self) -> u8 {
        self as u8
    }

    /// Heading shown in the step indicator.
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::CartReview => "Shopping Cart",
            Self::ShippingAddress => "Shipping Address",
            Self::Payment => "Payment Method",
        }
    }

    /// Clamp any integer into the valid step range.
    #[must_use]
    pub const fn clamped(n: i64) -> Self {
        match n {
            i64::MIN..=1 => Self::CartReview,
            2 => Self::ShippingAddress,
            _ => Self::Payment,
        }
    }

    /// The following step, if any.
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::CartReview => Some(Self::ShippingAddress),
            Self::ShippingAddress => Some(Self::Payment),
            Self::Payment => None,
        }
    }

    /// The preceding step, if any.
    #[must_use]
    pub const fn previous(self) -> Option<Self> {
        match self {
            Self::CartReview => None,
            Self::ShippingAddress => Some(Self::CartReview),
            Self::Payment => Some(Self::ShippingAddress),
        }
    }

    /// Address of this step under `path`, e.g. `/cart?step=2`.
    #[must_use]
    pub fn location(self, path: &str) -> String {
        format!("{path}?{STEP_PARAM}={}", self.number())
    }
}

impl fmt::Display for CheckoutStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.number())
    }
}

impl From<CheckoutStep> for u8 {
    fn from(step: CheckoutStep) -> Self {
        step.number()
    }
}

/// Error for a step ordinal outside `1..=3`.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("checkout step must be between 1 and 3 (got {0})")]
pub struct InvalidStep(pub u8);

impl TryFrom<u8> for CheckoutStep {
    type Error = InvalidStep;

    fn try_from(n: u8) -> Result<Self, Self::Error> {
        match n {
            1 => Ok(Self::CartReview),
            2 => Ok(Self::ShippingAddress),
            3 => Ok(Self::Payment),
            other => Err(InvalidStep(other)),
        }
    }
}

/// Derive the active step from a raw step indicator.
///
/// Reads an optional sign and the leading run of digits after any leading
/// whitespace, so `"2"`, `" 2"` and `"2abc"` all give step 2. Absent, empty
/// or non-numeric input gives step 1. Anything out of range is clamped, and
/// values too large for an integer saturate.
#[must_use]
pub fn resolve_active_step(raw: Option<&str>) -> CheckoutStep {
    raw.and_then(parse_leading_integer)
        .map_or(CheckoutStep::FIRST, CheckoutStep::clamped)
}

fn parse_leading_integer(raw: &str) -> Option<i64> {
    let trimmed = raw.trim_start();
    let (negative, digits) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, trimmed.get(1..)?),
        Some(b'+') => (false, trimmed.get(1..)?),
        _ => (false, trimmed),
    };

    let run = digits.bytes().take_while(u8::is_ascii_digit);
    let mut seen = false;
    let mut value: i64 = 0;
    for digit in run {
        seen = true;
        value = value
            .saturating_mul(10)
            .saturating_add(i64::from(digit - b'0'));
    }

    seen.then_some(if negative { -value } else { value })
}

/// A request to change the step indicator.
///
/// Fulfilled by the routing layer; `Stay` means no navigation happens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NavigationIntent {
    Stay,
    NavigateTo(CheckoutStep),
}

impl NavigationIntent {
    /// Destination step, if navigation is requested.
    #[must_use]
    pub const fn target(self) -> Option<CheckoutStep> {
        match self {
            Self::Stay => None,
            Self::NavigateTo(step) => Some(step),
        }
    }

    /// The step that is active once the intent is carried out.
    #[must_use]
    pub const fn resolve(self, current: CheckoutStep) -> CheckoutStep {
        match self {
            Self::Stay => current,
            Self::NavigateTo(step) => step,
        }
    }

    /// Query string for the destination, e.g. `step=2`.
    #[must_use]
    pub fn query_string(self) -> Option<String> {
        self.target()
            .map(|step| format!("{STEP_PARAM}={}", step.number()))
    }
}

/// Move to the next step; no-op on the last step.
#[must_use]
pub const fn advance(current: CheckoutStep) -> NavigationIntent {
    match current.next() {
        Some(step) => NavigationIntent::NavigateTo(step),
        None => NavigationIntent::Stay,
    }
}

/// Move to the previous step; no-op on the first step.
#[must_use]
pub const fn retreat(current: CheckoutStep) -> NavigationIntent {
    match current.previous() {
        Some(step) => NavigationIntent::NavigateTo(step),
        None => NavigationIntent::Stay,
    }
}

/// Guard for the forward transition.
///
/// Leaving the shipping step requires captured shipping info, and there is
/// nothing after the payment step.
#[must_use]
pub const fn can_advance(current: CheckoutStep, shipping_info_present: bool) -> bool {
    match current {
        CheckoutStep::CartReview => true,
        CheckoutStep::ShippingAddress => shipping_info_present,
        CheckoutStep::Payment => false,
    }
}

/// Whether a back transition exists.
#[must_use]
pub const fn can_retreat(current: CheckoutStep) -> bool {
    current.previous().is_some()
}

/// [`advance`] when [`can_advance`] allows it, otherwise [`NavigationIntent::Stay`].
#[must_use]
pub const fn guarded_advance(current: CheckoutStep, shipping_info_present: bool) -> NavigationIntent {
    if can_advance(current, shipping_info_present) {
        advance(current)
    } else {
        NavigationIntent::Stay
    }
}

/// Result of the shipping sub-form.
///
/// Its contents are not validated here; only its presence matters to the
/// step controller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingInfo {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub city: String,
}

/// What the main panel shows for a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepContent {
    CartItems,
    ShippingForm,
    PaymentForm,
    /// Step 3 was reached without shipping info.
    ShippingMissing,
}

impl StepContent {
    /// Message shown for [`StepContent::ShippingMissing`].
    pub const SHIPPING_MISSING_MESSAGE: &'static str =
        "Shipping information is missing. Please go back to step 2.";
}

/// Pick the panel content for `step`.
#[must_use]
pub const fn step_content(step: CheckoutStep, shipping_info_present: bool) -> StepContent {
    match step {
        CheckoutStep::CartReview => StepContent::CartItems,
        CheckoutStep::ShippingAddress => StepContent::ShippingForm,
        CheckoutStep::Payment if shipping_info_present => StepContent::PaymentForm,
        CheckoutStep::Payment => StepContent::ShippingMissing,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    use super::CheckoutStep::{CartReview, Payment, ShippingAddress};

    #[test]
    fn test_resolve_examples() {
        assert_eq!(resolve_active_step(Some("2")), ShippingAddress);
        assert_eq!(resolve_active_step(Some("99")), Payment);
        assert_eq!(resolve_active_step(Some("-5")), CartReview);
        assert_eq!(resolve_active_step(None), CartReview);
    }

    #[test]
    fn test_resolve_is_always_in_range() {
        let inputs = [
            "",
            "0",
            "-0",
            "1",
            "3",
            "4",
            "-1",
            "abc",
            "step",
            "+",
            "-",
            "   ",
            "9223372036854775807",
            "99999999999999999999999999",
            "-99999999999999999999999999",
            "２",
        ];
        for raw in inputs {
            let step = resolve_active_step(Some(raw));
            assert!((1..=3).contains(&step.number()), "{raw:?} gave {step}");
        }
    }

    #[test]
    fn test_resolve_non_numeric_defaults_to_first() {
        assert_eq!(resolve_active_step(Some("")), CartReview);
        assert_eq!(resolve_active_step(Some("abc")), CartReview);
        assert_eq!(resolve_active_step(Some("-")), CartReview);
    }

    #[test]
    fn test_resolve_reads_leading_integer() {
        assert_eq!(resolve_active_step(Some(" 2")), ShippingAddress);
        assert_eq!(resolve_active_step(Some("2abc")), ShippingAddress);
        assert_eq!(resolve_active_step(Some("2.9")), ShippingAddress);
        assert_eq!(resolve_active_step(Some("+3")), Payment);
        assert_eq!(resolve_active_step(Some("0")), CartReview);
    }

    #[test]
    fn test_resolve_huge_values_saturate() {
        assert_eq!(
            resolve_active_step(Some("123456789012345678901234567890")),
            Payment
        );
        assert_eq!(
            resolve_active_step(Some("-123456789012345678901234567890")),
            CartReview
        );
    }

    #[test]
    fn test_advance_then_retreat_round_trips() {
        for step in [CartReview, ShippingAddress] {
            let forward = advance(step).resolve(step);
            assert_ne!(forward, step);
            assert_eq!(retreat(forward).resolve(forward), step);
        }
    }

    #[test]
    fn test_boundaries_are_noops() {
        assert_eq!(retreat(CartReview), NavigationIntent::Stay);
        assert_eq!(advance(Payment), NavigationIntent::Stay);
        assert!(!can_retreat(CartReview));
        assert!(can_retreat(Payment));
    }

    #[test]
    fn test_can_advance_guard() {
        assert!(!can_advance(ShippingAddress, false));
        assert!(can_advance(ShippingAddress, true));
        assert!(can_advance(CartReview, false));
        assert!(!can_advance(Payment, true));
    }

    #[test]
    fn test_guarded_advance_blocks_without_shipping() {
        assert_eq!(
            guarded_advance(ShippingAddress, false),
            NavigationIntent::Stay
        );
        assert_eq!(
            guarded_advance(ShippingAddress, true),
            NavigationIntent::NavigateTo(Payment)
        );
        assert_eq!(
            guarded_advance(CartReview, false),
            NavigationIntent::NavigateTo(ShippingAddress)
        );
    }

    #[test]
    fn test_intent_query_string_is_in_range() {
        assert_eq!(advance(CartReview).query_string().as_deref(), Some("step=2"));
        assert_eq!(NavigationIntent::Stay.query_string(), None);
        assert_eq!(Payment.location("/cart"), "/cart?step=3");
    }

    #[test]
    fn test_step_content() {
        assert_eq!(step_content(CartReview, false), StepContent::CartItems);
        assert_eq!(step_content(ShippingAddress, false), StepContent::ShippingForm);
        assert_eq!(step_content(Payment, true), StepContent::PaymentForm);
        assert_eq!(step_content(Payment, false), StepContent::ShippingMissing);
    }

    #[test]
    fn test_step_serde_as_number() {
        assert_eq!(serde_json::to_string(&ShippingAddress).unwrap(), "2");
        assert_eq!(serde_json::from_str::<CheckoutStep>("3").unwrap(), Payment);
        assert!(serde_json::from_str::<CheckoutStep>("4").is_err());
    }

    #[test]
    fn test_titles() {
        let titles: Vec<&str> = CheckoutStep::ALL.iter().map(|s| s.title()).collect();
        assert_eq!(
            titles,
            vec!["Shopping Cart", "Shipping Address", "Payment Method"]
        );
    }
}
