//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                 - Health check
//!
//! # Cart and checkout
//! GET  /cart?step=N            - Checkout page (1 cart, 2 shipping, 3 payment)
//! POST /cart/add               - Add to cart, redirect to step 1
//! POST /cart/remove            - Remove item, redirect to step 1
//! POST /cart/next              - Guarded forward navigation
//! POST /cart/back              - Backward navigation
//! POST /cart/shipping          - Capture shipping details, continue to step 3
//! GET  /cart/totals            - Cart totals (JSON)
//!
//! # Anything else
//! *                            - 404
//! ```

pub mod cart;

use axum::{
    Router,
    http::Uri,
    response::Redirect,
    routing::{get, post},
};

use crate::error::AppError;
use crate::state::AppState;

/// Create the cart mutation and navigation routes, nested under `/cart`.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/add", post(cart::add))
        .route("/remove", post(cart::remove))
        .route("/next", post(cart::next))
        .route("/back", post(cart::back))
        .route("/shipping", post(cart::shipping))
        .route("/totals", get(cart::totals))
}

/// Create the main router with all routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(|| async { Redirect::to(cart::CART_PATH) }))
        .route(cart::CART_PATH, get(cart::show))
        .nest(cart::CART_PATH, cart_routes())
}

/// Fallback for unknown paths.
pub async fn not_found(uri: Uri) -> AppError {
    AppError::NotFound(uri.path().to_string())
}
