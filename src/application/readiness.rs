//! ReadinessAssessor - Extracts facts from dialogue and decides readiness.
//!
//! The model only extracts. Whether enough is known is decided by
//! [`ReadinessPolicy`] from presence counts; the model's own `status` is
//! recorded for logging and never consulted.

use std::sync::Arc;

use serde_json::{Map, Value};

use crate::domain::lenient_json::decode_object;
use crate::domain::readiness::{ExtractedFacts, ReadinessPolicy, ReadinessVerdict};
use crate::domain::session::ChatTurn;
use crate::ports::LlmGateway;

const EXTRACTION_TEMPERATURE: f32 = 0.1;

/// Result of one assessment.
#[derive(Debug, Clone, PartialEq)]
pub struct Assessment {
    pub facts: ExtractedFacts,
    pub verdict: ReadinessVerdict,
    pub model_status: Option<String>,
    pub model_message: Option<String>,
}

pub struct ReadinessAssessor {
    gateway: Arc<dyn LlmGateway>,
    policy: ReadinessPolicy,
}

impl ReadinessAssessor {
    pub fn new(gateway: Arc<dyn LlmGateway>, policy: ReadinessPolicy) -> Self {
        Self { gateway, policy }
    }

    pub fn policy(&self) -> &ReadinessPolicy {
        &self.policy
    }

    /// Extracts facts from `history` plus `turn_text`, from scratch.
    pub async fn assess(&self, turn_text: &str, history: &[ChatTurn]) -> Assessment {
        let prompt = self.extraction_prompt(turn_text, history);

        let reply = match self
            .gateway
            .invoke(&prompt, Some(EXTRACTION_TEMPERATURE))
            .await
        {
            Ok(reply) => reply,
            Err(e) => {
                tracing::warn!(error = %e, "fact extraction failed");
                return self.unusable();
            }
        };

        let Some(root) = decode_object(&reply) else {
            tracing::warn!("fact extraction reply was not a JSON object");
            return self.unusable();
        };

        let fields = match root.get("extracted_data") {
            Some(Value::Object(map)) => map.clone(),
            _ => root.clone(),
        };
        let facts = ExtractedFacts::from_json(self.policy.fields(), &fields);
        let verdict = self.policy.verdict(&facts);
        let model_status = str_of(&root, "status");

        tracing::debug!(
            present = self.policy.present_count(&facts),
            threshold = self.policy.threshold(),
            model_status = model_status.as_deref().unwrap_or("-"),
            ready = verdict.is_ready,
            "readiness assessed"
        );

        Assessment {
            facts,
            verdict,
            model_status,
            model_message: str_of(&root, "message"),
        }
    }

    fn unusable(&self) -> Assessment {
        Assessment {
            facts: ExtractedFacts::absent(self.policy.fields()),
            verdict: ReadinessVerdict::retry(),
            model_status: None,
            model_message: None,
        }
    }

    fn extraction_prompt(&self, turn_text: &str, history: &[ChatTurn]) -> String {
        let field_lines: Vec<String> = self
            .policy
            .fields()
            .iter()
            .map(|f| format!("- {}: {}", f.name, f.prompt))
            .collect();

        format!(
            "You extract facts about a trade incident from a conversation.\n\
             Fields:\n{fields}\n\n\
             Use null for anything not stated. Reply with JSON only:\n\
             {{\"status\": \"sufficient\" or \"insufficient\", \"message\": \"...\", \"extracted_data\": {{...}}}}\n\n\
             Conversation:\n{transcript}\nUser: {turn}",
            fields = field_lines.join("\n"),
            transcript = ChatTurn::transcript(history),
            turn = turn_text,
        )
    }
}

fn str_of(map: &Map<String, Value>, key: &str) -> Option<String> {
    map.get(key).and_then(Value::as_str).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::ai::MockLlmGateway;
    use crate::domain::readiness::GENERIC_RETRY_PROMPT;
    use crate::ports::LlmError;

    fn assessor(gateway: MockLlmGateway) -> ReadinessAssessor {
        ReadinessAssessor::new(Arc::new(gateway), ReadinessPolicy::trade_risk(3))
    }

    #[tokio::test]
    async fn model_status_is_ignored_when_fields_are_missing() {
        let gateway = MockLlmGateway::new().with_response(
            r#"{"status": "sufficient", "message": "ok", "extracted_data": {"contract_amount": "$100k"}}"#,
        );
        let a = assessor(gateway).assess("delay issue", &[]).await;
        assert!(!a.verdict.is_ready);
        assert_eq!(a.model_status.as_deref(), Some("sufficient"));
        assert_eq!(a.verdict.missing_field_prompts.len(), 3);
    }

    #[tokio::test]
    async fn three_present_fields_are_ready_even_if_model_disagrees() {
        let gateway = MockLlmGateway::new().with_response(
            "```json\n{\"status\": \"insufficient\", \"extracted_data\": {\"contract_amount\": \"$100k\", \"penalty_info\": \"0.5%/day\", \"delay_days\": 14}}\n```",
        );
        let a = assessor(gateway).assess("details", &[]).await;
        assert!(a.verdict.is_ready);
        assert!(a.verdict.missing_field_prompts.is_empty());
    }

    #[tokio::test]
    async fn bare_field_object_is_accepted() {
        let gateway = MockLlmGateway::new().with_response(
            r#"Sure: {"contract_amount": "1M USD", "penalty_info": "cap 10%", "loss_estimate": "50k", "delay_days": "7"}"#,
        );
        let a = assessor(gateway).assess("x", &[]).await;
        assert!(a.verdict.is_ready);
        assert!(a.facts.is_present("delay_days"));
    }

    #[tokio::test]
    async fn unparseable_reply_gives_generic_retry() {
        let gateway = MockLlmGateway::new().with_response("I am not sure.");
        let a = assessor(gateway).assess("x", &[]).await;
        assert!(!a.verdict.is_ready);
        assert_eq!(a.verdict.missing_field_prompts, vec![GENERIC_RETRY_PROMPT.to_string()]);
        assert!(a.facts.iter().all(|(_, v)| !v.is_present()));
    }

    #[tokio::test]
    async fn gateway_failure_gives_generic_retry() {
        let gateway = MockLlmGateway::failing(LlmError::timeout(30));
        let a = assessor(gateway).assess("x", &[]).await;
        assert_eq!(a.verdict, ReadinessVerdict::retry());
    }

    #[tokio::test]
    async fn prompt_carries_history_and_low_temperature() {
        let gateway = MockLlmGateway::new();
        let a = assessor(gateway.clone());
        a.assess(
            "the penalty is 1%",
            &[ChatTurn::user("shipment is late"), ChatTurn::assistant("how late?")],
        )
        .await;
        let calls = gateway.get_calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].temperature, Some(0.1));
        assert!(calls[0].prompt.contains("User: shipment is late"));
        assert!(calls[0].prompt.contains("Assistant: how late?"));
        assert!(calls[0].prompt.ends_with("User: the penalty is 1%"));
    }
}
