//! Integration tests for Miel.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p miel-integration-tests
//! ```
//!
//! The storefront router is driven in-process with `tower::ServiceExt`; no
//! server or network is needed. [`TestApp`] carries the session cookie
//! between requests the way a browser would.
//!
//! # Test Categories
//!
//! - `storefront_checkout` - Step navigation and guards over HTTP
//! - `storefront_cart` - Cart mutations, totals and session persistence

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{HeaderMap, Request, StatusCode, header},
};
use miel_storefront::{config::StorefrontConfig, state::AppState};
use tower::ServiceExt;

/// A response with its body already collected.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl TestResponse {
    /// The `Location` header of a redirect.
    #[must_use]
    pub fn location(&self) -> Option<&str> {
        self.headers
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
    }

    /// Value of an arbitrary header.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// In-process storefront with a cookie jar of one session.
pub struct TestApp {
    router: Router,
    cookie: Option<String>,
}

impl TestApp {
    /// Storefront with default configuration (discount 3000, shipping 5000).
    ///
    /// # Panics
    ///
    /// Panics if the default configuration fails to load.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn new() -> Self {
        let config =
            StorefrontConfig::from_lookup(|_| None).expect("default configuration is valid");
        Self::with_config(config)
    }

    /// Storefront with a specific configuration.
    #[must_use]
    pub fn with_config(config: StorefrontConfig) -> Self {
        Self {
            router: miel_storefront::app(AppState::new(config)),
            cookie: None,
        }
    }

    /// Whether a session cookie has been issued.
    #[must_use]
    pub const fn has_session(&self) -> bool {
        self.cookie.is_some()
    }

    /// Send a GET request.
    pub async fn get(&mut self, uri: &str) -> TestResponse {
        let request = Request::get(uri);
        self.send(request, Body::empty()).await
    }

    /// Send a form-encoded POST request.
    pub async fn post_form(&mut self, uri: &str, fields: &[(&str, &str)]) -> TestResponse {
        let body = fields
            .iter()
            .map(|(k, v)| format!("{}={}", encode(k), encode(v)))
            .collect::<Vec<_>>()
            .join("&");
        let request = Request::post(uri).header(
            header::CONTENT_TYPE,
            "application/x-www-form-urlencoded",
        );
        self.send(request, Body::from(body)).await
    }

    #[allow(clippy::expect_used)]
    async fn send(&mut self, mut request: axum::http::request::Builder, body: Body) -> TestResponse {
        if let Some(cookie) = &self.cookie {
            request = request.header(header::COOKIE, cookie);
        }
        let request = request.body(body).expect("valid request");

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");

        if let Some(set_cookie) = response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
        {
            let pair = set_cookie.split(';').next().unwrap_or_default();
            self.cookie = Some(pair.to_string());
        }

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body is readable");

        TestResponse {
            status,
            headers,
            body: String::from_utf8_lossy(&bytes).into_owned(),
        }
    }
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

/// Minimal `application/x-www-form-urlencoded` encoding.
fn encode(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'*' => {
                out.push(char::from(byte));
            }
            b' ' => out.push('+'),
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}
