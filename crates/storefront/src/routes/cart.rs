//! Cart and checkout route handlers.
//!
//! The active checkout step is always derived from the `step` parameter.
//! Forward and back buttons post the current step; the handler turns the
//! resulting navigation intent into a redirect. The cart and the captured
//! shipping details are kept in the visitor's session.

use std::collections::BTreeMap;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form, Json,
    extract::{Query, State, rejection::FormRejection},
    response::{AppendHeaders, IntoResponse, Redirect, Response},
};
use miel_core::{
    Adjustments, Cart, CartEvent, CartLineItem, CartStore, CartTotals, CheckoutStep, LineItemKey,
    NavigationIntent, Price, ProductId, ShippingInfo, StepContent, can_advance, can_retreat,
    guarded_advance, resolve_active_step, retreat, step_content,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, Result, add_breadcrumb};
use crate::models::session_keys;
use crate::state::AppState;

/// Path of the checkout page.
pub const CART_PATH: &str = "/cart";

/// HTMX event fired whenever the cart changes.
pub const CART_UPDATED_TRIGGER: &str = "cart-updated";

// =============================================================================
// Views
// =============================================================================

/// One entry of the step indicator.
#[derive(Clone)]
pub struct StepIndicatorView {
    pub number: u8,
    pub title: &'static str,
    pub active: bool,
}

/// Cart line display data for templates.
#[derive(Clone)]
pub struct LineItemView {
    pub product_id: i32,
    pub name: String,
    pub size: String,
    pub color: String,
    pub quantity: u32,
    pub line_total: String,
    pub image: Option<String>,
}

impl From<&CartLineItem> for LineItemView {
    fn from(item: &CartLineItem) -> Self {
        Self {
            product_id: item.id.as_i32(),
            name: item.name.clone(),
            size: item.selected_size.clone(),
            color: item.selected_color.clone(),
            quantity: item.quantity(),
            line_total: Price::ariary(item.line_total()).display(),
            image: item.image().map(String::from),
        }
    }
}

/// Formatted cart details panel.
#[derive(Clone)]
pub struct TotalsView {
    pub subtotal: String,
    pub discount: String,
    pub shipping_fee: String,
    pub total: String,
}

impl From<&CartTotals> for TotalsView {
    fn from(totals: &CartTotals) -> Self {
        Self {
            subtotal: Price::ariary(totals.subtotal).display(),
            discount: Price::ariary(totals.discount).display(),
            shipping_fee: Price::ariary(totals.shipping_fee).display(),
            total: Price::ariary(totals.total).display(),
        }
    }
}

/// Checkout page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub step: u8,
    pub steps: Vec<StepIndicatorView>,
    pub items: Vec<LineItemView>,
    pub totals: TotalsView,
    pub shipping: ShippingInfo,
    pub show_items: bool,
    pub show_shipping_form: bool,
    pub show_payment_form: bool,
    pub shipping_missing: bool,
    pub shipping_missing_message: &'static str,
    pub show_continue: bool,
    pub continue_enabled: bool,
    pub show_back: bool,
    pub show_place_order: bool,
}

impl CartShowTemplate {
    /// Build the page for `step`.
    #[must_use]
    pub fn new(
        step: CheckoutStep,
        cart: &Cart,
        shipping: Option<ShippingInfo>,
        adjustments: &Adjustments,
    ) -> Self {
        let has_shipping = shipping.is_some();
        let content = step_content(step, has_shipping);
        let totals = CartTotals::compute(cart.items(), adjustments);

        Self {
            step: step.number(),
            steps: CheckoutStep::ALL
                .iter()
                .map(|s| StepIndicatorView {
                    number: s.number(),
                    title: s.title(),
                    active: *s == step,
                })
                .collect(),
            items: cart.items().iter().map(LineItemView::from).collect(),
            totals: TotalsView::from(&totals),
            shipping: shipping.unwrap_or_default(),
            show_items: content == StepContent::CartItems,
            show_shipping_form: content == StepContent::ShippingForm,
            show_payment_form: content == StepContent::PaymentForm,
            shipping_missing: content == StepContent::ShippingMissing,
            shipping_missing_message: StepContent::SHIPPING_MISSING_MESSAGE,
            show_continue: step < CheckoutStep::LAST,
            continue_enabled: can_advance(step, has_shipping),
            show_back: can_retreat(step),
            show_place_order: step == CheckoutStep::Payment,
        }
    }
}

// =============================================================================
// Forms
// =============================================================================

/// Step indicator from the query string.
#[derive(Debug, Deserialize)]
pub struct StepQuery {
    pub step: Option<String>,
}

/// Step indicator posted by the navigation buttons.
#[derive(Debug, Deserialize)]
pub struct StepForm {
    pub step: Option<String>,
}

/// Add to cart form data.
///
/// Name and price are taken from the client as posted; there is no catalog
/// lookup behind this form yet.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub product_id: i32,
    pub name: String,
    pub unit_price: Decimal,
    pub quantity: Option<u32>,
    pub size: String,
    pub color: String,
    pub image: Option<String>,
}

/// Remove from cart form data.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartForm {
    pub product_id: i32,
    pub size: String,
    pub color: String,
}

impl RemoveFromCartForm {
    fn key(self) -> LineItemKey {
        LineItemKey::new(ProductId::new(self.product_id), self.size, self.color)
    }
}

// =============================================================================
// Session Helpers
// =============================================================================

/// Get the cart from the session; a missing cart is empty.
///
/// A cart that cannot be read is an error, so it is never overwritten.
async fn load_cart(session: &Session) -> Result<Cart> {
    Ok(session
        .get::<Cart>(session_keys::CART)
        .await?
        .unwrap_or_default())
}

/// Save the cart in the session.
async fn save_cart(session: &Session, cart: &Cart) -> Result<()> {
    session.insert(session_keys::CART, cart).await?;
    Ok(())
}

/// Get the captured shipping details, if any.
async fn load_shipping_info(session: &Session) -> Result<Option<ShippingInfo>> {
    session
        .get::<ShippingInfo>(session_keys::SHIPPING_INFO)
        .await
        .map_err(AppError::from)
}

fn log_cart_event(event: &CartEvent, cart: &Cart) {
    tracing::info!(?event, lines = cart.len(), "Cart updated");
}

/// Redirect to `step`, telling HTMX listeners that the cart changed.
fn cart_updated(step: CheckoutStep) -> Response {
    (
        AppendHeaders([("HX-Trigger", CART_UPDATED_TRIGGER)]),
        Redirect::to(&step.location(CART_PATH)),
    )
        .into_response()
}

fn navigate(current: CheckoutStep, intent: NavigationIntent) -> Redirect {
    Redirect::to(&intent.resolve(current).location(CART_PATH))
}

// =============================================================================
// Handlers
// =============================================================================

/// Display the checkout page for the requested step.
#[instrument(skip(state, session))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<StepQuery>,
) -> Result<CartShowTemplate> {
    let step = resolve_active_step(query.step.as_deref());
    let cart = load_cart(&session).await?;
    let shipping = load_shipping_info(&session).await?;

    Ok(CartShowTemplate::new(step, &cart, shipping, state.adjustments()))
}

/// Add a line item, merging with an existing line of the same variant.
///
/// The posted price is trusted as-is.
#[instrument(skip(session))]
pub async fn add(
    session: Session,
    form: std::result::Result<Form<AddToCartForm>, FormRejection>,
) -> Result<Response> {
    let Form(form) = form?;
    let mut item = CartLineItem::new(
        ProductId::new(form.product_id),
        form.name,
        form.unit_price,
        form.quantity.unwrap_or(1),
        form.size,
        form.color,
    )?;
    if let Some(image) = form.image.filter(|image| !image.is_empty()) {
        let color = item.selected_color.clone();
        item = item.with_images(BTreeMap::from([(color, image)]));
    }

    let mut store = CartStore::new(load_cart(&session).await?);
    store.subscribe(log_cart_event);
    store.add(item)?;
    save_cart(&session, store.read()).await?;

    Ok(cart_updated(CheckoutStep::CartReview))
}

/// Remove a line item. Removing an item that is not in the cart is a no-op.
#[instrument(skip(session))]
pub async fn remove(
    session: Session,
    form: std::result::Result<Form<RemoveFromCartForm>, FormRejection>,
) -> Result<Response> {
    let Form(form) = form?;
    let key = form.key();
    let mut store = CartStore::new(load_cart(&session).await?);
    store.subscribe(log_cart_event);
    store.remove(&key);

    if store.revision() == 0 {
        tracing::debug!(%key, "Remove ignored, line not in cart");
        return Ok(Redirect::to(&CheckoutStep::CartReview.location(CART_PATH)).into_response());
    }

    save_cart(&session, store.read()).await?;
    Ok(cart_updated(CheckoutStep::CartReview))
}

/// Go to the next step if the guard allows it, otherwise stay.
#[instrument(skip(session))]
pub async fn next(session: Session, Form(form): Form<StepForm>) -> Result<Redirect> {
    let current = resolve_active_step(form.step.as_deref());
    let has_shipping = load_shipping_info(&session).await?.is_some();
    let intent = guarded_advance(current, has_shipping);

    if intent == NavigationIntent::Stay && current != CheckoutStep::LAST {
        tracing::info!(step = %current, "Forward navigation blocked, shipping info missing");
    }

    Ok(navigate(current, intent))
}

/// Go to the previous step.
#[instrument]
pub async fn back(Form(form): Form<StepForm>) -> Redirect {
    let current = resolve_active_step(form.step.as_deref());
    navigate(current, retreat(current))
}

/// Capture shipping details and continue to payment.
#[instrument(skip(session, form))]
pub async fn shipping(
    session: Session,
    form: std::result::Result<Form<ShippingInfo>, FormRejection>,
) -> Result<Redirect> {
    let Form(info) = form?;
    session.insert(session_keys::SHIPPING_INFO, &info).await?;
    add_breadcrumb("checkout", "Shipping details captured", None);

    let current = CheckoutStep::ShippingAddress;
    Ok(navigate(current, guarded_advance(current, true)))
}

/// Cart totals as JSON.
#[instrument(skip(state, session))]
pub async fn totals(State(state): State<AppState>, session: Session) -> Result<Json<CartTotals>> {
    let cart = load_cart(&session).await?;
    Ok(Json(CartTotals::compute(cart.items(), state.adjustments())))
}
