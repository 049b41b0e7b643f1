//! Model-backed quiz item generation.

use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::lenient_json::decode_as;
use crate::domain::quiz::{QuizItem, CHOICE_COUNT};
use crate::domain::validation::{CandidateGenerator, GenerationError};
use crate::ports::LlmGateway;

const GENERATION_TEMPERATURE: f32 = 0.7;

pub struct QuizGenerator {
    gateway: Arc<dyn LlmGateway>,
}

impl QuizGenerator {
    pub fn new(gateway: Arc<dyn LlmGateway>) -> Self {
        Self { gateway }
    }

    fn prompt(term: &str, feedback: &[String]) -> String {
        let mut prompt = format!(
            "Write one multiple-choice question testing the trade term \"{term}\".\n\
             Give exactly {CHOICE_COUNT} distinct choices, one correct. Do not use \
             \"all of the above\" or \"none of the above\".\n\
             Reply with JSON only: {{\"question\": \"...\", \"choices\": [...], \
             \"correct_answer\": <index>, \"explanation\": \"...\"}}"
        );
        if !feedback.is_empty() {
            prompt.push_str("\n\nThe previous attempt was rejected. Fix these problems:\n");
            for issue in feedback {
                prompt.push_str(&format!("- {issue}\n"));
            }
        }
        prompt
    }
}

#[async_trait]
impl CandidateGenerator<String, QuizItem> for QuizGenerator {
    async fn generate(&self, term: &String, feedback: &[String]) -> Result<QuizItem, GenerationError> {
        let reply = self
            .gateway
            .invoke(&Self::prompt(term, feedback), Some(GENERATION_TEMPERATURE))
            .await
            .map_err(|e| GenerationError::upstream(e.to_string()))?;

        let mut item: QuizItem = decode_as(&reply)
            .ok_or_else(|| GenerationError::malformed("reply is not a quiz item"))?;
        if item.quiz_id.is_empty() {
            item.quiz_id = Uuid::new_v4().to_string();
        }
        if item.term.is_none() {
            item.term = Some(term.clone());
        }
        Ok(item)
    }
}
