//! Canonical risk report and its normalization from loosely shaped output.
//!
//! Analysis payloads arrive in several historical shapes: factors as a list
//! or as a map, named by `name`, `name_kr` or nothing at all, scored by
//! impact × likelihood or by a bare `score`/`risk_score`. [`RiskReport::canonicalize`]
//! folds all of them into one shape and recomputes the aggregate so the
//! level and score always agree with the factors.

use super::scoring::{RiskFactor, RiskScoring};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LossSimulation {
    pub quantitative: Option<String>,
    pub qualitative: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlGapAnalysis {
    pub identified_gaps: Vec<String>,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreventionStrategy {
    pub short_term: Vec<String>,
    pub long_term: Vec<String>,
}

/// A past case retrieved as evidence.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimilarCase {
    pub content: String,
    pub source: String,
    pub category: String,
    pub distance: f32,
}

/// Canonical risk analysis report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskReport {
    pub analysis_id: String,
    pub input_summary: String,
    pub risk_scoring: RiskScoring,
    pub loss_simulation: LossSimulation,
    pub control_gap_analysis: ControlGapAnalysis,
    pub prevention_strategy: PreventionStrategy,
    pub response_summary: String,
    pub suggested_actions: Vec<String>,
    pub similar_cases: Vec<SimilarCase>,
    pub evidence_sources: Vec<String>,
    pub confidence_score: f64,
}

const NO_SUMMARY: &str = "No summary available.";

impl RiskReport {
    /// Folds any known report shape into the canonical one.
    pub fn canonicalize(raw: &Value) -> Self {
        let empty = Map::new();
        let root = raw.as_object().unwrap_or(&empty);
        let scoring_src = root
            .get("risk_scoring")
            .and_then(Value::as_object)
            .unwrap_or(root);

        let mut factors = parse_factors(scoring_src.get("risk_factors"));
        if factors.is_empty() {
            factors = parse_factors(root.get("risk_factors"));
        }
        let assessment = str_field(scoring_src, &["overall_assessment"]).unwrap_or_default();

        Self {
            analysis_id: str_field(root, &["analysis_id", "id"]).unwrap_or_else(|| "N/A".to_string()),
            input_summary: str_field(root, &["input_summary"]).unwrap_or_default(),
            risk_scoring: RiskScoring::from_factors(factors, assessment),
            loss_simulation: section(root, "loss_simulation"),
            control_gap_analysis: section(root, "control_gap_analysis"),
            prevention_strategy: section(root, "prevention_strategy"),
            response_summary: str_field(root, &["response_summary", "summary"])
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| NO_SUMMARY.to_string()),
            suggested_actions: string_list(
                root.get("suggested_actions")
                    .or_else(|| root.get("recommendations")),
            ),
            similar_cases: root
                .get("similar_cases")
                .and_then(Value::as_array)
                .map(|cases| {
                    cases
                        .iter()
                        .filter_map(|c| serde_json::from_value(c.clone()).ok())
                        .collect()
                })
                .unwrap_or_default(),
            evidence_sources: string_list(root.get("evidence_sources")),
            confidence_score: root
                .get("confidence_score")
                .and_then(Value::as_f64)
                .map(|c| c.clamp(0.0, 1.0))
                .unwrap_or(0.0),
        }
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

fn str_field(map: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .find_map(|k| map.get(*k).and_then(Value::as_str))
        .map(str::to_string)
}

fn section<T: Default + serde::de::DeserializeOwned>(root: &Map<String, Value>, key: &str) -> T {
    root.get(key)
        .and_then(|v| serde_json::from_value(v.clone()).ok())
        .unwrap_or_default()
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    let Some(Value::Array(items)) = value else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| match item {
            Value::String(s) => Some(s.clone()),
            Value::Null => None,
            other => Some(other.to_string()),
        })
        .collect()
}

fn parse_factors(value: Option<&Value>) -> BTreeMap<String, RiskFactor> {
    let mut out = BTreeMap::new();
    match value {
        Some(Value::Array(items)) => {
            for (i, item) in items.iter().enumerate() {
                let Some(obj) = item.as_object() else { continue };
                let key = str_field(obj, &["name", "name_kr"])
                    .unwrap_or_else(|| format!("factor_{}", i));
                if let Some(factor) = parse_factor(&key, obj) {
                    out.insert(key, factor);
                }
            }
        }
        Some(Value::Object(map)) => {
            for (key, item) in map {
                let Some(obj) = item.as_object() else { continue };
                if let Some(factor) = parse_factor(key, obj) {
                    out.insert(key.clone(), factor);
                }
            }
        }
        _ => {}
    }
    out
}

fn parse_factor(key: &str, obj: &Map<String, Value>) -> Option<RiskFactor> {
    let name = str_field(obj, &["name", "name_kr"]).unwrap_or_else(|| key.to_string());
    let factor = match (rating(obj.get("impact")), rating(obj.get("likelihood"))) {
        (Some(impact), Some(likelihood)) => RiskFactor::rated(name, impact, likelihood),
        _ => {
            let score = ["score", "risk_score"]
                .iter()
                .find_map(|k| number(obj.get(*k)))?;
            RiskFactor::scored(name, score.max(0.0).round() as u32)
        }
    };

    let mitigation = string_list(
        obj.get("mitigation")
            .or_else(|| obj.get("mitigation_suggestions")),
    );
    Some(
        factor
            .with_reasoning(str_field(obj, &["reasoning"]).unwrap_or_default())
            .with_mitigation(mitigation),
    )
}

fn number(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn rating(value: Option<&Value>) -> Option<u8> {
    number(value).map(|n| n.round().clamp(1.0, 5.0) as u8)
}
