//! Redis-backed session store for multi-process deployments.
//!
//! One JSON record per session at `{prefix}{key}`, written with
//! `SET key value EX ttl` so every write refreshes the expiry.

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;

use crate::domain::foundation::SessionKey;
use crate::domain::session::Session;
use crate::ports::{SessionStore, SessionStoreError};

pub const DEFAULT_KEY_PREFIX: &str = "session:";

/// Full Redis key for a session.
fn redis_key(prefix: &str, key: &SessionKey) -> String {
    format!("{}{}", prefix, key)
}

fn encode_record(session: &Session) -> Result<String, SessionStoreError> {
    serde_json::to_string(session).map_err(|e| SessionStoreError::SerializationFailed(e.to_string()))
}

/// Parses one stored record. `get` treats a failure as a miss.
fn decode_record(raw: &str) -> Result<Session, serde_json::Error> {
    serde_json::from_str(raw)
}

/// Redis session store with per-write TTL.
#[derive(Clone)]
pub struct RedisSessionStore {
    conn: MultiplexedConnection,
    key_prefix: String,
    ttl_secs: u64,
}

impl RedisSessionStore {
    pub fn new(conn: MultiplexedConnection, ttl_secs: u64) -> Self {
        Self {
            conn,
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
            ttl_secs,
        }
    }

    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }

    fn redis_key(&self, key: &SessionKey) -> String {
        redis_key(&self.key_prefix, key)
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn get(&self, key: &SessionKey) -> Result<Option<Session>, SessionStoreError> {
        let redis_key = self.redis_key(key);
        let mut conn = self.conn.clone();

        let raw: Option<String> = match conn.get(&redis_key).await {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(key = %redis_key, error = %e, "session read failed, treating as miss");
                return Ok(None);
            }
        };

        let Some(raw) = raw else {
            return Ok(None);
        };

        match decode_record(&raw) {
            Ok(session) => Ok(Some(session)),
            Err(e) => {
                tracing::warn!(key = %redis_key, error = %e, "undecodable session record, treating as miss");
                Ok(None)
            }
        }
    }

    async fn put(&self, key: &SessionKey, session: &Session) -> Result<(), SessionStoreError> {
        let redis_key = self.redis_key(key);
        let json = encode_record(session)?;

        let mut conn = self.conn.clone();
        redis::cmd("SET")
            .arg(&redis_key)
            .arg(json)
            .arg("EX")
            .arg(self.ttl_secs)
            .query_async::<_, ()>(&mut conn)
            .await
            .map_err(|e: redis::RedisError| SessionStoreError::write_failed(e.to_string()))?;

        Ok(())
    }

    async fn delete(&self, key: &SessionKey) -> Result<(), SessionStoreError> {
        let redis_key = self.redis_key(key);
        let mut conn = self.conn.clone();

        conn.del::<_, ()>(&redis_key)
            .await
            .map_err(|e: redis::RedisError| SessionStoreError::unavailable(e.to_string()))?;

        Ok(())
    }
}

impl std::fmt::Debug for RedisSessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisSessionStore")
            .field("key_prefix", &self.key_prefix)
            .field("ttl_secs", &self.ttl_secs)
            .finish_non_exhaustive()
    }
}
