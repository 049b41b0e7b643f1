//! Presence-count readiness policy.

use serde::{Deserialize, Serialize};

use super::{ExtractedFacts, FieldSpec};

/// Prompt used when extraction produced nothing usable.
pub const GENERIC_RETRY_PROMPT: &str =
    "I couldn't pick out the details yet. Could you describe the situation again, \
     including the contract amount, penalty terms, expected loss and delay?";

/// Outcome of a readiness check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadinessVerdict {
    pub is_ready: bool,
    pub missing_field_prompts: Vec<String>,
}

impl ReadinessVerdict {
    /// Not ready, with the generic retry prompt.
    pub fn retry() -> Self {
        Self {
            is_ready: false,
            missing_field_prompts: vec![GENERIC_RETRY_PROMPT.to_string()],
        }
    }
}

/// Fixed field set plus the number of required fields that must be present.
#[derive(Debug, Clone)]
pub struct ReadinessPolicy {
    fields: Vec<FieldSpec>,
    threshold: usize,
}

impl ReadinessPolicy {
    /// Threshold is clamped to `1..=required field count`.
    pub fn new(fields: Vec<FieldSpec>, threshold: usize) -> Self {
        let required = fields.iter().filter(|f| f.required).count().max(1);
        Self {
            fields,
            threshold: threshold.clamp(1, required),
        }
    }

    /// Field set used by the risk handler.
    pub fn trade_risk(threshold: usize) -> Self {
        Self::new(
            vec![
                FieldSpec::text(
                    "contract_amount",
                    "What is the total contract amount, including the currency?",
                ),
                FieldSpec::text(
                    "penalty_info",
                    "What penalty or liquidated-damages terms apply (for example a daily rate or a cap)?",
                ),
                FieldSpec::text(
                    "loss_estimate",
                    "How large a loss do you expect so far, even roughly?",
                ),
                FieldSpec::integer(
                    "delay_days",
                    "How many days of delay have occurred or are expected?",
                ),
                FieldSpec::text(
                    "delay_risk",
                    "Is there a risk the delay grows further?",
                )
                .optional(),
            ],
            threshold,
        )
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn threshold(&self) -> usize {
        self.threshold
    }

    /// Number of required fields present in `facts`.
    pub fn present_count(&self, facts: &ExtractedFacts) -> usize {
        self.fields
            .iter()
            .filter(|f| f.required && facts.is_present(&f.name))
            .count()
    }

    /// Decides readiness from presence alone.
    ///
    /// When not ready, one prompt per missing required field is returned in
    /// field order.
    pub fn verdict(&self, facts: &ExtractedFacts) -> ReadinessVerdict {
        if self.present_count(facts) >= self.threshold {
            return ReadinessVerdict {
                is_ready: true,
                missing_field_prompts: Vec::new(),
            };
        }

        ReadinessVerdict {
            is_ready: false,
            missing_field_prompts: self
                .fields
                .iter()
                .filter(|f| f.required && !facts.is_present(&f.name))
                .map(|f| f.prompt.clone())
                .collect(),
        }
    }
}
