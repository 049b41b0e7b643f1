//! Candidate items and validation verdicts.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result of validating one candidate.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Verdict {
    pub passed: bool,
    pub issues: Vec<String>,
}

impl Verdict {
    pub fn pass() -> Self {
        Self {
            passed: true,
            issues: Vec::new(),
        }
    }

    pub fn fail(issues: Vec<String>) -> Self {
        Self {
            passed: false,
            issues,
        }
    }

    /// Builds a verdict from collected issues: no issues means pass.
    pub fn from_issues(issues: Vec<String>) -> Self {
        if issues.is_empty() {
            Self::pass()
        } else {
            Self::fail(issues)
        }
    }
}

/// One generated unit of content and how it fared.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateItem<P> {
    pub payload: P,
    pub passed: bool,
    pub issues: Vec<String>,
    /// 1-based attempt number within its slot.
    pub attempt: u32,
}

/// Errors from a generation call.
///
/// These consume one attempt; they never abort the loop.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    #[error("generation call failed: {0}")]
    Upstream(String),

    #[error("generated output was malformed: {0}")]
    Malformed(String),
}

impl GenerationError {
    pub fn upstream(message: impl Into<String>) -> Self {
        Self::Upstream(message.into())
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_issues_passes_only_when_empty() {
        assert!(Verdict::from_issues(vec![]).passed);
        let v = Verdict::from_issues(vec!["bad".to_string()]);
        assert!(!v.passed);
        assert_eq!(v.issues, vec!["bad"]);
    }

    #[test]
    fn generation_error_messages() {
        assert_eq!(
            GenerationError::malformed("no JSON").to_string(),
            "generated output was malformed: no JSON"
        );
    }
}
