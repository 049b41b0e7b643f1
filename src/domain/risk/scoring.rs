//! Impact × likelihood scoring.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Overall or per-factor risk level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
    Unknown,
}

impl RiskLevel {
    /// Maps a score on the 1-25 scale: ≥15 critical, ≥10 high, ≥5 medium.
    pub fn from_score(score: f64) -> Self {
        if score >= 15.0 {
            RiskLevel::Critical
        } else if score >= 10.0 {
            RiskLevel::High
        } else if score >= 5.0 {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
            RiskLevel::Critical => "critical",
            RiskLevel::Unknown => "unknown",
        };
        write!(f, "{}", s)
    }
}

/// One dimension the risk evaluation always covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvaluationItem {
    pub key: &'static str,
    pub name: &'static str,
    pub description: &'static str,
}

pub const EVALUATION_ITEMS: &[EvaluationItem] = &[
    EvaluationItem {
        key: "financial_loss",
        name: "Financial loss",
        description: "Direct monetary loss from penalties, claims or price adjustments.",
    },
    EvaluationItem {
        key: "delay",
        name: "Schedule delay",
        description: "Knock-on delays to shipment, production or delivery commitments.",
    },
    EvaluationItem {
        key: "relationship_risk",
        name: "Customer relationship",
        description: "Damage to trust with the buyer or supplier and future orders.",
    },
    EvaluationItem {
        key: "compliance_risk",
        name: "Contract compliance",
        description: "Breach of contract clauses, Incoterms obligations or regulations.",
    },
    EvaluationItem {
        key: "internal_blame_risk",
        name: "Internal accountability",
        description: "Exposure of the person handling the deal inside the company.",
    },
];

/// One scored risk factor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskFactor {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub impact: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub likelihood: Option<u8>,
    pub score: u32,
    pub level: RiskLevel,
    #[serde(default)]
    pub reasoning: String,
    #[serde(default)]
    pub mitigation: Vec<String>,
}

impl RiskFactor {
    /// Scores a factor; impact and likelihood are clamped to 1-5.
    pub fn rated(name: impl Into<String>, impact: u8, likelihood: u8) -> Self {
        let impact = impact.clamp(1, 5);
        let likelihood = likelihood.clamp(1, 5);
        let score = u32::from(impact) * u32::from(likelihood);
        Self {
            name: name.into(),
            impact: Some(impact),
            likelihood: Some(likelihood),
            score,
            level: RiskLevel::from_score(f64::from(score)),
            reasoning: String::new(),
            mitigation: Vec::new(),
        }
    }

    /// Factor known only by its score (clamped to 0-25).
    pub fn scored(name: impl Into<String>, score: u32) -> Self {
        let score = score.min(25);
        Self {
            name: name.into(),
            impact: None,
            likelihood: None,
            score,
            level: RiskLevel::from_score(f64::from(score)),
            reasoning: String::new(),
            mitigation: Vec::new(),
        }
    }

    pub fn with_reasoning(mut self, reasoning: impl Into<String>) -> Self {
        self.reasoning = reasoning.into();
        self
    }

    pub fn with_mitigation(mut self, mitigation: Vec<String>) -> Self {
        self.mitigation = mitigation;
        self
    }
}

/// Aggregate scoring derived from factors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskScoring {
    pub overall_risk_level: RiskLevel,
    pub overall_risk_score: f64,
    #[serde(default)]
    pub overall_assessment: String,
    pub risk_factors: BTreeMap<String, RiskFactor>,
}

impl RiskScoring {
    /// Recomputes the aggregate as the mean factor score.
    ///
    /// With no factors the level is `unknown` and the score 0.
    pub fn from_factors(
        risk_factors: BTreeMap<String, RiskFactor>,
        overall_assessment: impl Into<String>,
    ) -> Self {
        let (overall_risk_score, overall_risk_level) = if risk_factors.is_empty() {
            (0.0, RiskLevel::Unknown)
        } else {
            let total: u32 = risk_factors.values().map(|f| f.score).sum();
            let mean = f64::from(total) / risk_factors.len() as f64;
            let mean = (mean * 100.0).round() / 100.0;
            (mean, RiskLevel::from_score(mean))
        };
        Self {
            overall_risk_level,
            overall_risk_score,
            overall_assessment: overall_assessment.into(),
            risk_factors,
        }
    }
}

/// Keyword-driven scoring used when model evaluation is unavailable.
///
/// Every evaluation item gets the same rating, picked by the strongest
/// signal in the situation text: penalty, then claim, then delay.
pub fn heuristic_factors(situation: &str) -> Vec<RiskFactor> {
    let lower = situation.to_lowercase();
    let (impact, likelihood, signal) = if lower.contains("penalty") || lower.contains("liquidated") {
        (4, 4, "penalty clause mentioned")
    } else if lower.contains("claim") {
        (4, 3, "claim mentioned")
    } else if lower.contains("delay") || lower.contains("late") {
        (3, 4, "delay mentioned")
    } else {
        (3, 3, "no strong signal")
    };

    EVALUATION_ITEMS
        .iter()
        .map(|item| {
            RiskFactor::rated(item.name, impact, likelihood).with_reasoning(format!(
                "{}: impact={}, likelihood={} ({})",
                item.name, impact, likelihood, signal
            ))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_thresholds() {
        assert_eq!(RiskLevel::from_score(25.0), RiskLevel::Critical);
        assert_eq!(RiskLevel::from_score(15.0), RiskLevel::Critical);
        assert_eq!(RiskLevel::from_score(14.9), RiskLevel::High);
        assert_eq!(RiskLevel::from_score(10.0), RiskLevel::High);
        assert_eq!(RiskLevel::from_score(5.0), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_score(4.0), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(0.0), RiskLevel::Low);
    }

    #[test]
    fn rated_factor_clamps_and_multiplies() {
        let f = RiskFactor::rated("x", 9, 0);
        assert_eq!(f.impact, Some(5));
        assert_eq!(f.likelihood, Some(1));
        assert_eq!(f.score, 5);
        assert_eq!(f.level, RiskLevel::Medium);
    }

    #[test]
    fn scoring_is_mean_of_factor_scores() {
        let factors: BTreeMap<_, _> = [
            RiskFactor::rated("a", 4, 4),
            RiskFactor::rated("b", 2, 4),
            RiskFactor::rated("c", 3, 3),
        ]
        .into_iter()
        .map(|f| (f.name.clone(), f))
        .collect();

        let scoring = RiskScoring::from_factors(factors, "");
        assert_eq!(scoring.overall_risk_score, 11.0);
        assert_eq!(scoring.overall_risk_level, RiskLevel::High);
    }

    #[test]
    fn scoring_rounds_to_two_decimals() {
        let factors: BTreeMap<_, _> = [RiskFactor::scored("a", 10), RiskFactor::scored("b", 10), RiskFactor::scored("c", 11)]
            .into_iter()
            .map(|f| (f.name.clone(), f))
            .collect();
        assert_eq!(RiskScoring::from_factors(factors, "").overall_risk_score, 10.33);
    }

    #[test]
    fn empty_scoring_is_unknown() {
        let scoring = RiskScoring::from_factors(BTreeMap::new(), "n/a");
        assert_eq!(scoring.overall_risk_level, RiskLevel::Unknown);
        assert_eq!(scoring.overall_risk_score, 0.0);
    }

    #[test]
    fn heuristic_prefers_penalty_signal() {
        let factors = heuristic_factors("5 day delay with a Penalty of 1% per day");
        assert_eq!(factors.len(), EVALUATION_ITEMS.len());
        assert!(factors.iter().all(|f| f.score == 16));
    }

    #[test]
    fn heuristic_without_signal_is_medium() {
        let factors = heuristic_factors("we changed our logo");
        assert!(factors.iter().all(|f| f.score == 9 && f.level == RiskLevel::Medium));
    }
}
