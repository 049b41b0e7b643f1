//! Dispatch chain configuration

use serde::Deserialize;

use super::error::ValidationError;

/// Toggles and thresholds for the routing chain
#[derive(Debug, Clone, Deserialize)]
pub struct RoutingConfig {
    /// Cosine similarity a reference phrase must exceed
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f32,

    /// Enable embedding-based routing
    #[serde(default = "default_true")]
    pub semantic_enabled: bool,

    /// Enable LLM intent classification
    #[serde(default = "default_true")]
    pub classifier_enabled: bool,
}

impl RoutingConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !(0.0..=1.0).contains(&self.similarity_threshold) {
            return Err(ValidationError::out_of_range(
                "routing.similarity_threshold",
                0.0,
                1.0,
            ));
        }
        Ok(())
    }
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: default_similarity_threshold(),
            semantic_enabled: true,
            classifier_enabled: true,
        }
    }
}

fn default_similarity_threshold() -> f32 {
    0.87
}

fn default_true() -> bool {
    true
}
