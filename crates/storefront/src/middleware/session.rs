//! Session middleware configuration.
//!
//! Sessions live in a bounded in-process moka cache. Records are evicted
//! once their expiry date passes or when the cache is full, so abandoned
//! carts do not accumulate.

use tower_sessions::{Expiry, SessionManagerLayer};
use tower_sessions_moka_store::MokaStore;

use crate::config::StorefrontConfig;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "miel_session";

/// Session expiry time in seconds (7 days).
const SESSION_EXPIRY_SECONDS: i64 = 7 * 24 * 60 * 60;

/// Create the session store, bounded by `session_capacity`.
#[must_use]
pub fn create_session_store(config: &StorefrontConfig) -> MokaStore {
    MokaStore::new(Some(config.session_capacity))
}

/// Create the session layer backed by `store`.
#[must_use]
pub fn create_session_layer(
    store: MokaStore,
    config: &StorefrontConfig,
) -> SessionManagerLayer<MokaStore> {
    SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(config.is_secure())
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use tower_sessions::cookie::time::{Duration, OffsetDateTime};
    use tower_sessions::session::{Id, Record};
    use tower_sessions::SessionStore;

    use super::*;

    fn config() -> StorefrontConfig {
        StorefrontConfig::from_lookup(|_| None).unwrap()
    }

    fn record(expiry_date: OffsetDateTime) -> Record {
        Record {
            id: Id::default(),
            data: std::collections::HashMap::default(),
            expiry_date,
        }
    }

    #[tokio::test]
    async fn test_store_round_trips_live_session() {
        let store = create_session_store(&config());
        let mut live = record(OffsetDateTime::now_utc() + Duration::days(7));
        store.create(&mut live).await.unwrap();

        assert_eq!(store.load(&live.id).await.unwrap(), Some(live));
    }

    #[tokio::test]
    async fn test_store_drops_expired_session() {
        let store = create_session_store(&config());
        let mut expired = record(OffsetDateTime::now_utc() - Duration::seconds(1));
        store.create(&mut expired).await.unwrap();

        assert_eq!(store.load(&expired.id).await.unwrap(), None);
    }
}
