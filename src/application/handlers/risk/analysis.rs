//! Full risk analysis: retrieval, then five concurrent model sub-tasks.
//!
//! Every sub-task has a deterministic fallback, so an analysis always
//! yields a complete report even with the model unreachable.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use crate::domain::lenient_json::{decode_as, decode_object};
use crate::domain::readiness::ExtractedFacts;
use crate::domain::risk::{
    heuristic_factors, ControlGapAnalysis, LossSimulation, PreventionStrategy, RiskFactor,
    RiskReport, RiskScoring, SimilarCase, EVALUATION_ITEMS,
};
use crate::ports::{DocumentRetriever, LlmGateway, RetrievedDocument};

const MAX_SIMILAR_CASES: usize = 5;
const CASE_EXCERPT_CHARS: usize = 300;
const INPUT_SUMMARY_CHARS: usize = 200;
const MAX_SUGGESTED_ACTIONS: usize = 5;

const SCORING_TEMPERATURE: f32 = 0.2;
const WRITING_TEMPERATURE: f32 = 0.3;

#[derive(Debug, Deserialize)]
struct FactorRating {
    #[serde(alias = "name")]
    key: String,
    impact: f64,
    likelihood: f64,
    #[serde(default)]
    reasoning: String,
    #[serde(default)]
    mitigation: Vec<String>,
}

pub struct RiskAnalyzer {
    gateway: Arc<dyn LlmGateway>,
    retriever: Arc<dyn DocumentRetriever>,
    search_k: usize,
}

impl RiskAnalyzer {
    pub fn new(gateway: Arc<dyn LlmGateway>, retriever: Arc<dyn DocumentRetriever>, search_k: usize) -> Self {
        Self {
            gateway,
            retriever,
            search_k,
        }
    }

    pub async fn analyze(&self, situation: &str, facts: &ExtractedFacts) -> RiskReport {
        let documents = match self.retriever.search(situation, self.search_k, None).await {
            Ok(docs) => docs,
            Err(e) => {
                tracing::warn!(error = %e, "risk case search failed; analysing without evidence");
                Vec::new()
            }
        };
        let similar_cases: Vec<SimilarCase> = documents
            .iter()
            .take(MAX_SIMILAR_CASES)
            .map(similar_case)
            .collect();
        let evidence = similar_cases
            .iter()
            .enumerate()
            .map(|(i, c)| format!("[{}] ({}) {}", i + 1, c.category, c.content))
            .collect::<Vec<_>>()
            .join("\n");
        let facts_json = facts.to_json().to_string();

        let (factors, summary, loss, gaps, prevention) = futures::join!(
            self.evaluate_factors(situation, &evidence),
            self.summarize(situation, &facts_json),
            self.simulate_loss(situation, &facts_json, facts),
            self.find_control_gaps(situation, &evidence),
            self.plan_prevention(situation, &evidence),
        );

        let factor_count = factors.len();
        let factors: BTreeMap<String, RiskFactor> =
            factors.into_iter().map(|f| (f.name.clone(), f)).collect();
        let mut scoring = RiskScoring::from_factors(factors, "");
        scoring.overall_assessment = format!(
            "Overall risk is {} ({:.1} of 25) across {} factors.",
            scoring.overall_risk_level, scoring.overall_risk_score, factor_count
        );

        let mut suggested_actions: Vec<String> = Vec::new();
        for action in prevention.short_term.iter().chain(&gaps.recommendations) {
            if suggested_actions.len() >= MAX_SUGGESTED_ACTIONS {
                break;
            }
            if !suggested_actions.contains(action) {
                suggested_actions.push(action.clone());
            }
        }

        let mut evidence_sources: Vec<String> = Vec::new();
        for case in &similar_cases {
            if !evidence_sources.contains(&case.source) {
                evidence_sources.push(case.source.clone());
            }
        }

        let confidence_score = (0.5
            + (documents.len() as f64 * 0.05).min(0.25)
            + (factor_count as f64 * 0.05).min(0.25))
        .min(1.0);

        RiskReport {
            analysis_id: Uuid::new_v4().to_string(),
            input_summary: truncate(situation, INPUT_SUMMARY_CHARS),
            risk_scoring: scoring,
            loss_simulation: loss,
            control_gap_analysis: gaps,
            prevention_strategy: prevention,
            response_summary: summary,
            suggested_actions,
            similar_cases,
            evidence_sources,
            confidence_score,
        }
    }

    async fn ask(&self, prompt: String, temperature: f32, task: &str) -> Option<String> {
        match self.gateway.invoke(&prompt, Some(temperature)).await {
            Ok(reply) if !reply.trim().is_empty() => Some(reply),
            Ok(_) => None,
            Err(e) => {
                tracing::warn!(task, error = %e, "risk sub-task fell back");
                None
            }
        }
    }

    async fn evaluate_factors(&self, situation: &str, evidence: &str) -> Vec<RiskFactor> {
        let items = EVALUATION_ITEMS
            .iter()
            .map(|i| format!("- {}: {}", i.key, i.description))
            .collect::<Vec<_>>()
            .join("\n");
        let prompt = format!(
            "Rate each risk factor for this trade situation on impact (1-5) and likelihood (1-5).\n\
             Factors:\n{items}\n\nSimilar cases:\n{evidence}\n\nSituation:\n{situation}\n\n\
             Reply with JSON only: {{\"factors\": [{{\"key\": \"...\", \"impact\": 1-5, \
             \"likelihood\": 1-5, \"reasoning\": \"...\", \"mitigation\": [\"...\"]}}]}}"
        );

        let rated = self
            .ask(prompt, SCORING_TEMPERATURE, "factor evaluation")
            .await
            .map(|reply| parse_factors(&reply))
            .unwrap_or_default();

        if rated.is_empty() {
            tracing::info!("using keyword heuristic for risk factors");
            return heuristic_factors(situation);
        }
        rated
    }

    async fn summarize(&self, situation: &str, facts_json: &str) -> String {
        let prompt = format!(
            "Write a three-sentence executive summary of this trade risk for a junior staff member.\n\
             Known facts: {facts_json}\n\nSituation:\n{situation}"
        );
        match self.ask(prompt, WRITING_TEMPERATURE, "summary").await {
            Some(text) => text.trim().to_string(),
            None => format!(
                "Risk assessment for: {}. Review the factor scores and act on the suggested steps.",
                truncate(situation, 120)
            ),
        }
    }

    async fn simulate_loss(&self, situation: &str, facts_json: &str, facts: &ExtractedFacts) -> LossSimulation {
        let prompt = format!(
            "Estimate the possible loss for this trade situation.\n\
             Known facts: {facts_json}\n\nSituation:\n{situation}\n\n\
             Reply with JSON only: {{\"quantitative\": \"...\", \"qualitative\": \"...\"}}"
        );
        self.ask(prompt, WRITING_TEMPERATURE, "loss simulation")
            .await
            .and_then(|reply| decode_as::<LossSimulation>(&reply))
            .filter(|l| !l.qualitative.trim().is_empty())
            .unwrap_or_else(|| fallback_loss(facts))
    }

    async fn find_control_gaps(&self, situation: &str, evidence: &str) -> ControlGapAnalysis {
        let prompt = format!(
            "List the internal control gaps that let this trade problem happen and how to close them.\n\
             Similar cases:\n{evidence}\n\nSituation:\n{situation}\n\n\
             Reply with JSON only: {{\"identified_gaps\": [...], \"recommendations\": [...]}}"
        );
        self.ask(prompt, WRITING_TEMPERATURE, "control gaps")
            .await
            .and_then(|reply| decode_as::<ControlGapAnalysis>(&reply))
            .filter(|g| !g.identified_gaps.is_empty())
            .unwrap_or_else(|| ControlGapAnalysis {
                identified_gaps: vec![
                    "No documented check of penalty and delay clauses before shipment".to_string(),
                ],
                recommendations: vec![
                    "Review contract penalty clauses with the sales lead before committing dates".to_string(),
                ],
            })
    }

    async fn plan_prevention(&self, situation: &str, evidence: &str) -> PreventionStrategy {
        let prompt = format!(
            "Propose short-term and long-term actions to contain and prevent this trade risk.\n\
             Similar cases:\n{evidence}\n\nSituation:\n{situation}\n\n\
             Reply with JSON only: {{\"short_term\": [...], \"long_term\": [...]}}"
        );
        self.ask(prompt, WRITING_TEMPERATURE, "prevention strategy")
            .await
            .and_then(|reply| decode_as::<PreventionStrategy>(&reply))
            .filter(|p| !p.short_term.is_empty() || !p.long_term.is_empty())
            .unwrap_or_else(|| PreventionStrategy {
                short_term: vec![
                    "Notify the counterparty in writing and agree a revised schedule".to_string(),
                    "Record all delay causes and supporting documents".to_string(),
                ],
                long_term: vec!["Add buffer time and clear liability caps to future contracts".to_string()],
            })
    }
}

/// Ratings for known evaluation items; unknown keys and bad entries are dropped.
fn parse_factors(reply: &str) -> Vec<RiskFactor> {
    let Some(root) = decode_object(reply) else {
        return Vec::new();
    };
    let Some(Value::Array(entries)) = root.get("factors").or_else(|| root.get("risk_factors")) else {
        return Vec::new();
    };

    let mut factors: Vec<RiskFactor> = Vec::new();
    for entry in entries {
        let Ok(rating) = serde_json::from_value::<FactorRating>(entry.clone()) else {
            continue;
        };
        let Some(item) = EVALUATION_ITEMS.iter().find(|i| {
            i.key.eq_ignore_ascii_case(rating.key.trim()) || i.name.eq_ignore_ascii_case(rating.key.trim())
        }) else {
            continue;
        };
        if factors.iter().any(|f| f.name == item.name) {
            continue;
        }
        factors.push(
            RiskFactor::rated(item.name, to_rating(rating.impact), to_rating(rating.likelihood))
                .with_reasoning(rating.reasoning)
                .with_mitigation(rating.mitigation),
        );
    }
    factors
}

fn to_rating(value: f64) -> u8 {
    value.round().clamp(1.0, 5.0) as u8
}

fn fallback_loss(facts: &ExtractedFacts) -> LossSimulation {
    let known: Vec<String> = ["contract_amount", "penalty_info", "loss_estimate", "delay_days"]
        .iter()
        .filter(|k| facts.is_present(k))
        .map(|k| format!("{}: {}", k, facts.get(k).to_json()))
        .collect();
    LossSimulation {
        quantitative: (!known.is_empty()).then(|| known.join(", ")),
        qualitative: "Expect penalty exposure plus follow-on costs from rescheduling and buyer goodwill."
            .to_string(),
    }
}

fn similar_case(doc: &RetrievedDocument) -> SimilarCase {
    SimilarCase {
        content: truncate(&doc.content, CASE_EXCERPT_CHARS),
        source: doc.source().to_string(),
        category: doc
            .meta_str("category")
            .or_else(|| doc.meta_str("document_type"))
            .unwrap_or("general")
            .to_string(),
        distance: doc.distance,
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    let text = text.trim();
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::ai::MockLlmGateway;
    use crate::domain::readiness::ReadinessPolicy;
    use crate::domain::risk::RiskLevel;
    use crate::ports::{LlmError, RetrieverError};
    use async_trait::async_trait;
    use serde_json::{json, Map};

    struct CaseRetriever(usize);

    #[async_trait]
    impl DocumentRetriever for CaseRetriever {
        async fn search(
            &self,
            _query: &str,
            k: usize,
            _type_filter: Option<&str>,
        ) -> Result<Vec<RetrievedDocument>, RetrieverError> {
            Ok((0..self.0.min(k))
                .map(|i| {
                    let mut metadata = Map::new();
                    metadata.insert("source".into(), json!(format!("claims-{}", i % 2)));
                    metadata.insert("category".into(), json!("delay"));
                    RetrievedDocument {
                        content: format!("case {i}"),
                        metadata,
                        distance: 0.1 * i as f32,
                    }
                })
                .collect())
        }
    }

    fn facts() -> ExtractedFacts {
        let policy = ReadinessPolicy::trade_risk(3);
        let raw = json!({"contract_amount": "$100k", "delay_days": 14});
        ExtractedFacts::from_json(policy.fields(), raw.as_object().unwrap())
    }

    #[test]
    fn parses_known_factors_and_drops_unknown() {
        let reply = r#"{"factors": [
            {"key": "financial_loss", "impact": 4, "likelihood": 4.4, "mitigation": ["negotiate"]},
            {"name": "Schedule delay", "impact": 9, "likelihood": 0},
            {"key": "weather", "impact": 5, "likelihood": 5},
            {"key": "delay", "impact": "high"}
        ]}"#;
        let factors = parse_factors(reply);
        assert_eq!(factors.len(), 2);
        assert_eq!(factors[0].name, "Financial loss");
        assert_eq!(factors[0].score, 16);
        assert_eq!(factors[0].mitigation, vec!["negotiate".to_string()]);
        assert_eq!((factors[1].impact, factors[1].likelihood), (Some(5), Some(1)));
    }

    #[tokio::test]
    async fn model_outage_still_yields_complete_report() {
        let analyzer = RiskAnalyzer::new(
            Arc::new(MockLlmGateway::failing(LlmError::unavailable("down"))),
            Arc::new(CaseRetriever(8)),
            10,
        );
        let report = analyzer.analyze("shipment delay with penalty clause", &facts()).await;

        assert_eq!(report.risk_scoring.risk_factors.len(), EVALUATION_ITEMS.len());
        assert_eq!(report.risk_scoring.overall_risk_score, 16.0);
        assert_eq!(report.risk_scoring.overall_risk_level, RiskLevel::Critical);
        assert_eq!(report.similar_cases.len(), MAX_SIMILAR_CASES);
        assert_eq!(report.evidence_sources, vec!["claims-0".to_string(), "claims-1".to_string()]);
        assert!(report.loss_simulation.quantitative.unwrap().contains("contract_amount"));
        assert!(!report.suggested_actions.is_empty());
        // 0.5 + min(8 * 0.05, 0.25) + min(5 * 0.05, 0.25)
        assert_eq!(report.confidence_score, 1.0);
    }

    #[tokio::test]
    async fn model_sections_are_used_when_present() {
        let gateway = MockLlmGateway::new()
            .with_rule(
                "Rate each risk factor",
                r#"{"factors": [{"key": "delay", "impact": 2, "likelihood": 3}]}"#,
            )
            .with_rule("executive summary", "Moderate exposure.")
            .with_rule("possible loss", r#"{"quantitative": "$7,000", "qualitative": "penalty"}"#)
            .with_rule("control gaps", r#"{"identified_gaps": ["g"], "recommendations": ["r"]}"#)
            .with_rule("short-term", r#"{"short_term": ["s"], "long_term": ["l"]}"#);
        let analyzer = RiskAnalyzer::new(Arc::new(gateway.clone()), Arc::new(CaseRetriever(0)), 10);

        let report = analyzer.analyze("late shipment", &facts()).await;
        assert_eq!(report.response_summary, "Moderate exposure.");
        assert_eq!(report.risk_scoring.overall_risk_score, 6.0);
        assert_eq!(report.risk_scoring.overall_risk_level, RiskLevel::Medium);
        assert_eq!(report.loss_simulation.quantitative.as_deref(), Some("$7,000"));
        assert_eq!(report.suggested_actions, vec!["s".to_string(), "r".to_string()]);
        assert!(report.similar_cases.is_empty());
        assert!((report.confidence_score - 0.55).abs() < 1e-9);
        assert_eq!(gateway.call_count(), 5);
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate("지연 클레임", 2), "지연...");
        assert_eq!(truncate("short", 10), "short");
    }
}
