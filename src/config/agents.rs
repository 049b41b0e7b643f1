//! Handler tuning

use serde::Deserialize;

use super::error::ValidationError;

/// Knobs for the built-in handlers
#[derive(Debug, Clone, Deserialize)]
pub struct AgentsConfig {
    /// Required risk fields that must be present before analysis
    #[serde(default = "default_readiness_threshold")]
    pub readiness_threshold: usize,

    /// Questions per generated quiz
    #[serde(default = "default_quiz_question_count")]
    pub quiz_question_count: usize,

    /// Generation attempts per quiz slot
    #[serde(default = "default_quiz_max_attempts")]
    pub quiz_max_attempts: u32,

    /// Topics a quiz may discard and replace
    #[serde(default = "default_quiz_max_substitutions")]
    pub quiz_max_substitutions: usize,

    /// Documents retrieved for risk analysis
    #[serde(default = "default_risk_search_k")]
    pub risk_search_k: usize,

    /// Largest distance at which a document still backs a quiz answer
    #[serde(default = "default_reference_max_distance")]
    pub reference_max_distance: f32,
}

impl AgentsConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !(1..=4).contains(&self.readiness_threshold) {
            return Err(ValidationError::out_of_range(
                "agents.readiness_threshold",
                1.0,
                4.0,
            ));
        }
        if !(1..=10).contains(&self.quiz_question_count) {
            return Err(ValidationError::out_of_range(
                "agents.quiz_question_count",
                1.0,
                10.0,
            ));
        }
        if self.quiz_max_attempts == 0 {
            return Err(ValidationError::out_of_range(
                "agents.quiz_max_attempts",
                1.0,
                f64::from(u32::MAX),
            ));
        }
        if self.risk_search_k == 0 {
            return Err(ValidationError::out_of_range(
                "agents.risk_search_k",
                1.0,
                usize::MAX as f64,
            ));
        }
        if !(0.0..=2.0).contains(&self.reference_max_distance) {
            return Err(ValidationError::out_of_range(
                "agents.reference_max_distance",
                0.0,
                2.0,
            ));
        }
        Ok(())
    }
}

impl Default for AgentsConfig {
    fn default() -> Self {
        Self {
            readiness_threshold: default_readiness_threshold(),
            quiz_question_count: default_quiz_question_count(),
            quiz_max_attempts: default_quiz_max_attempts(),
            quiz_max_substitutions: default_quiz_max_substitutions(),
            risk_search_k: default_risk_search_k(),
            reference_max_distance: default_reference_max_distance(),
        }
    }
}

fn default_readiness_threshold() -> usize {
    3
}

fn default_quiz_question_count() -> usize {
    5
}

fn default_quiz_max_attempts() -> u32 {
    2
}

fn default_quiz_max_substitutions() -> usize {
    5
}

fn default_risk_search_k() -> usize {
    10
}

fn default_reference_max_distance() -> f32 {
    0.8
}
