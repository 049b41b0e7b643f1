//! Storage Adapters
//!
//! Implementations of the SessionStore port.
//!
//! ## Available Adapters
//!
//! - **RedisSessionStore** - JSON records with per-write TTL (production)
//! - **InMemorySessionStore** - Process-local map (testing/development)
//!
//! ## Usage
//!
//! ```ignore
//! let store = build_session_store(&config.redis, &config.session).await;
//! ```

mod in_memory_session_store;
mod redis_session_store;

pub use in_memory_session_store::InMemorySessionStore;
pub use redis_session_store::RedisSessionStore;

use std::sync::Arc;

use crate::config::{RedisConfig, SessionConfig};
use crate::ports::SessionStore;

/// Picks the Redis backend when configured and reachable, else in-memory.
pub async fn build_session_store(
    redis: &RedisConfig,
    session: &SessionConfig,
) -> Arc<dyn SessionStore> {
    let Some(url) = redis.url() else {
        tracing::info!("no Redis URL configured, sessions are kept in memory");
        return Arc::new(InMemorySessionStore::new());
    };

    let client = match redis::Client::open(url) {
        Ok(client) => client,
        Err(e) => {
            tracing::warn!(error = %e, "invalid Redis URL, falling back to in-memory sessions");
            return Arc::new(InMemorySessionStore::new());
        }
    };

    match tokio::time::timeout(redis.timeout(), client.get_multiplexed_tokio_connection()).await {
        Ok(Ok(conn)) => {
            tracing::info!(ttl_secs = session.ttl_secs, "using Redis session store");
            Arc::new(
                RedisSessionStore::new(conn, session.ttl_secs)
                    .with_key_prefix(session.key_prefix.clone()),
            )
        }
        Ok(Err(e)) => {
            tracing::warn!(error = %e, "Redis unreachable, falling back to in-memory sessions");
            Arc::new(InMemorySessionStore::new())
        }
        Err(_) => {
            tracing::warn!(
                timeout_secs = redis.timeout_secs,
                "Redis connection timed out, falling back to in-memory sessions"
            );
            Arc::new(InMemorySessionStore::new())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::SessionKey;
    use crate::domain::session::Session;

    #[tokio::test]
    async fn without_url_sessions_live_in_memory() {
        let store = build_session_store(&RedisConfig::default(), &SessionConfig::default()).await;
        let key = SessionKey::generate();
        store.put(&key, &Session::new()).await.unwrap();
        assert!(store.get(&key).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn unreachable_redis_falls_back_to_memory() {
        let redis = RedisConfig {
            url: Some("redis://127.0.0.1:1".to_string()),
            timeout_secs: 1,
        };
        let store = build_session_store(&redis, &SessionConfig::default()).await;
        let key = SessionKey::generate();
        store.put(&key, &Session::new()).await.unwrap();
        assert!(store.get(&key).await.unwrap().is_some());
    }
}
