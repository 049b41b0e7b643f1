//! Session persistence configuration

use serde::Deserialize;

use super::error::ValidationError;

/// Session expiry and key layout
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Seconds a session survives without a write
    #[serde(default = "default_ttl")]
    pub ttl_secs: u64,

    /// Prefix of the Redis key holding a session
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
}

impl SessionConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.ttl_secs == 0 {
            return Err(ValidationError::out_of_range(
                "session.ttl_secs",
                1.0,
                u64::MAX as f64,
            ));
        }
        Ok(())
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_ttl(),
            key_prefix: default_key_prefix(),
        }
    }
}

fn default_ttl() -> u64 {
    3600
}

fn default_key_prefix() -> String {
    "session:".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_config_defaults() {
        let config = SessionConfig::default();
        assert_eq!(config.ttl_secs, 3600);
        assert_eq!(config.key_prefix, "session:");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_ttl_is_invalid() {
        let config = SessionConfig {
            ttl_secs: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
