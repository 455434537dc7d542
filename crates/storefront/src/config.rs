//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All variables are optional.
//!
//! - `MIEL_HOST` - Bind address (default: 127.0.0.1)
//! - `MIEL_PORT` - Listen port (default: 3000)
//! - `MIEL_BASE_URL` - Public URL for the storefront (default: <http://localhost:3000>)
//! - `MIEL_DISCOUNT` - Flat order discount in ariary (default: 3000)
//! - `MIEL_SHIPPING_FEE` - Flat shipping fee in ariary (default: 5000)
//! - `MIEL_SESSION_CAPACITY` - Maximum number of live visitor sessions (default: 10000)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate, 0.0-1.0 (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Transaction sample rate, 0.0-1.0 (default: 0.0)

use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use miel_core::{Adjustments, PricingError};
use rust_decimal::Decimal;
use thiserror::Error;
use url::Url;

const DEFAULT_DISCOUNT: &str = "3000";
const DEFAULT_SHIPPING_FEE: &str = "5000";
const DEFAULT_SESSION_CAPACITY: &str = "10000";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Invalid pricing configuration: {0}")]
    Pricing(#[from] PricingError),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: Url,
    /// Discount and shipping fee applied to every cart
    pub adjustments: Adjustments,
    /// Sessions kept in memory before the least recently used are evicted
    pub session_capacity: u64,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g. production, staging)
    pub sentry_environment: Option<String>,
    /// Fraction of errors sent to Sentry
    pub sentry_sample_rate: f32,
    /// Fraction of transactions traced
    pub sentry_traces_sample_rate: f32,
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but cannot be parsed,
    /// or if the discount or shipping fee is negative.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Same as [`StorefrontConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env(lookup);

        let host = env.parse_or("MIEL_HOST", "127.0.0.1", IpAddr::from_str)?;
        let port = env.parse_or("MIEL_PORT", "3000", u16::from_str)?;
        let base_url = env.parse_or("MIEL_BASE_URL", "http://localhost:3000", Url::parse)?;
        let discount = env.parse_or("MIEL_DISCOUNT", DEFAULT_DISCOUNT, Decimal::from_str)?;
        let shipping_fee =
            env.parse_or("MIEL_SHIPPING_FEE", DEFAULT_SHIPPING_FEE, Decimal::from_str)?;
        let adjustments = Adjustments::new(discount, shipping_fee)?;
        let session_capacity =
            env.parse_or("MIEL_SESSION_CAPACITY", DEFAULT_SESSION_CAPACITY, u64::from_str)?;

        Ok(Self {
            host,
            port,
            base_url,
            adjustments,
            session_capacity,
            sentry_dsn: env.optional("SENTRY_DSN"),
            sentry_environment: env.optional("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: env.parse_or("SENTRY_SAMPLE_RATE", "1.0", f32::from_str)?,
            sentry_traces_sample_rate: env.parse_or(
                "SENTRY_TRACES_SAMPLE_RATE",
                "0.0",
                f32::from_str,
            )?,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether the storefront is served over HTTPS.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.scheme() == "https"
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

struct Env<F>(F);

impl<F> Env<F>
where
    F: Fn(&str) -> Option<String>,
{
    /// Get an optional variable, treating empty values as unset.
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|value| !value.trim().is_empty())
    }

    /// Parse a variable, falling back to `default` when unset.
    fn parse_or<T, E, P>(&self, key: &str, default: &str, parse: P) -> Result<T, ConfigError>
    where
        P: Fn(&str) -> Result<T, E>,
        E: std::fmt::Display,
    {
        let value = self.optional(key).unwrap_or_else(|| default.to_string());
        parse(value.trim()).map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use rust_decimal_macros::dec;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<StorefrontConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        StorefrontConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:3000");
        assert_eq!(config.adjustments.discount(), dec!(3000));
        assert_eq!(config.adjustments.shipping_fee(), dec!(5000));
        assert_eq!(config.session_capacity, 10_000);
        assert!(!config.is_secure());
        assert!(config.sentry_dsn.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("MIEL_PORT", "8080"),
            ("MIEL_BASE_URL", "https://miel.mg"),
            ("MIEL_DISCOUNT", "0"),
            ("MIEL_SHIPPING_FEE", "7500.50"),
            ("MIEL_SESSION_CAPACITY", "500"),
        ])
        .unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.session_capacity, 500);
        assert!(config.is_secure());
        assert_eq!(config.adjustments.discount(), dec!(0));
        assert_eq!(config.adjustments.shipping_fee(), dec!(7500.50));
    }

    #[test]
    fn test_empty_value_uses_default() {
        let config = load(&[("MIEL_DISCOUNT", ""), ("SENTRY_DSN", "  ")]).unwrap();
        assert_eq!(config.adjustments.discount(), dec!(3000));
        assert!(config.sentry_dsn.is_none());
    }

    #[test]
    fn test_invalid_port() {
        let err = load(&[("MIEL_PORT", "not-a-port")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(ref key, _) if key == "MIEL_PORT"));
    }

    #[test]
    fn test_invalid_decimal() {
        let err = load(&[("MIEL_SHIPPING_FEE", "five thousand")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(ref key, _) if key == "MIEL_SHIPPING_FEE"));
    }

    #[test]
    fn test_negative_discount_rejected() {
        let err = load(&[("MIEL_DISCOUNT", "-100")]).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Pricing(PricingError::NegativeDiscount(_))
        ));
    }
}
