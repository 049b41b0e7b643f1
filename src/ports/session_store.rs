//! Session Store Port - Keyed persistence of per-conversation state.
//!
//! A coarse key-value register: callers read, modify and write back the
//! whole session. Concurrent writers are last-writer-wins.

use async_trait::async_trait;

use crate::domain::foundation::SessionKey;
use crate::domain::session::Session;

/// Errors that can occur during session store operations.
#[derive(Debug, thiserror::Error)]
pub enum SessionStoreError {
    #[error("Failed to serialize session: {0}")]
    SerializationFailed(String),

    #[error("Session backend unavailable: {0}")]
    Unavailable(String),

    #[error("Session write failed: {0}")]
    WriteFailed(String),
}

impl SessionStoreError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable(message.into())
    }

    pub fn write_failed(message: impl Into<String>) -> Self {
        Self::WriteFailed(message.into())
    }
}

/// Port for loading and saving sessions.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Loads a session.
    ///
    /// A miss is `Ok(None)`. Backends treat undecodable records as misses.
    async fn get(&self, key: &SessionKey) -> Result<Option<Session>, SessionStoreError>;

    /// Writes the full session in one operation, refreshing any expiry.
    async fn put(&self, key: &SessionKey, session: &Session) -> Result<(), SessionStoreError>;

    /// Removes a session. Deleting a missing key is not an error.
    async fn delete(&self, key: &SessionKey) -> Result<(), SessionStoreError>;

    /// Issues a fresh key.
    fn new_key(&self) -> SessionKey {
        SessionKey::generate()
    }
}
