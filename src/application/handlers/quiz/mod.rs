//! Quiz - Trade terminology quizzes built by the content validation loop.
//!
//! The first turn generates and validates the questions, then holds them in
//! `Answering` until every question has an answer:
//!
//! ```text
//! Idle --(generated)--> Answering --(partial answers)--> Answering
//!                           |
//!                           +--(all answered or "stop")--> Done (graded)
//! ```

mod criteria;
mod generator;

pub use criteria::{quiz_validation_chain, DistractorCriterion, ReferenceCriterion, StructuralCriterion};
pub use generator::QuizGenerator;

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use crate::domain::foundation::StateMachine;
use crate::domain::quiz::{choice_letter, parse_answers, QuizGrade, QuizItem, QuizSheet, TOPIC_POOL};
use crate::domain::response::{HandlerResponse, ResponseEnvelope};
use crate::domain::session::{HandlerPhase, HandlerState};
use crate::domain::validation::{ContentValidationLoop, LoopLimits, ValidationChain};
use crate::ports::{
    DocumentRetriever, Handler, HandlerError, HandlerInput, HandlerOutput, HandlerProfile,
    LlmGateway,
};

pub const QUIZ_ID: &str = "quiz";

/// Handler state key holding the [`QuizSheet`].
const SHEET_KEY: &str = "quiz";
/// Request context key for answers keyed by `quiz_id`.
const ANSWERS_CONTEXT_KEY: &str = "answers";

const DEFAULT_REFERENCE_MAX_DISTANCE: f32 = 0.8;

const STOP_WORDS: &[&str] = &["stop", "quit", "give up", "end quiz", "cancel"];

const ANSWER_HINT: &str =
    "Reply with letters in order (e.g. `A C B`) or by number (e.g. `1:A 3:C`). Say `stop` to finish early.";

/// Generates a validated quiz, then collects and grades the answers.
pub struct QuizHandler {
    generator: QuizGenerator,
    validator: ValidationChain<QuizItem>,
    content_loop: ContentValidationLoop,
    profile: HandlerProfile,
}

impl QuizHandler {
    pub fn new(gateway: Arc<dyn LlmGateway>, retriever: Arc<dyn DocumentRetriever>) -> Self {
        Self {
            generator: QuizGenerator::new(gateway),
            validator: quiz_validation_chain(retriever, DEFAULT_REFERENCE_MAX_DISTANCE),
            content_loop: ContentValidationLoop::new(LoopLimits::new(5, 2).with_max_substitutions(5)),
            profile: HandlerProfile::new(QUIZ_ID, "Quizzes on trade terms such as Incoterms and payment methods")
                .with_triggers(&["quiz", "Incoterms", "terminology", "test me"])
                .with_reference_phrases(&[
                    "give me a quiz on trade terms",
                    "test my knowledge of shipping vocabulary",
                    "I want to practice incoterms questions",
                ]),
        }
    }

    pub fn with_limits(mut self, limits: LoopLimits) -> Self {
        self.content_loop = ContentValidationLoop::new(limits);
        self
    }

    /// Replaces the validation chain, e.g. to change the reference distance.
    pub fn with_validator(mut self, validator: ValidationChain<QuizItem>) -> Self {
        self.validator = validator;
        self
    }

    /// Topic pool, with terms named in the request moved to the front.
    fn topics(text: &str) -> Vec<String> {
        let lower = text.to_lowercase();
        let (mut named, rest): (Vec<&str>, Vec<&str>) = TOPIC_POOL
            .iter()
            .partition(|t| lower.contains(&t.to_lowercase()));
        named.extend(rest);
        named.into_iter().map(str::to_string).collect()
    }

    /// The open quiz, if the session is mid-quiz and its state decodes.
    fn open_sheet(state: &HandlerState) -> Option<QuizSheet> {
        if state.phase != HandlerPhase::Answering {
            return None;
        }
        let value = state.data.get(SHEET_KEY)?.clone();
        match serde_json::from_value(value) {
            Ok(sheet) => Some(sheet),
            Err(e) => {
                tracing::warn!(error = %e, "stored quiz is unreadable; starting a new one");
                None
            }
        }
    }

    fn sheet_state(phase: HandlerPhase, sheet: &QuizSheet) -> Result<HandlerState, HandlerError> {
        let value = serde_json::to_value(sheet).map_err(|e| HandlerError::internal(e.to_string()))?;
        let mut data = Map::new();
        data.insert(SHEET_KEY.to_string(), value);
        Ok(HandlerState { phase, data })
    }

    async fn generate(&self, input: &HandlerInput) -> Result<HandlerOutput, HandlerError> {
        let outcome = self
            .content_loop
            .produce(Self::topics(&input.text), &self.generator, &self.validator)
            .await;

        tracing::info!(
            accepted = outcome.accepted.len(),
            discarded = outcome.discarded_topics.len(),
            calls = outcome.generation_calls,
            rejected = outcome.rejected_candidates,
            "quiz generation finished"
        );

        if outcome.accepted.is_empty() {
            let message = "Sorry, I couldn't put together a quiz right now. Please try again.";
            return Ok(HandlerOutput::reply(
                input,
                HandlerResponse::Failure(message.to_string()),
                message,
            ));
        }

        let sheet = QuizSheet::new(outcome.accepted.into_iter().map(|c| c.payload).collect());
        let items: Vec<Value> = sheet.questions.iter().map(QuizItem::without_answer).collect();
        let intro = format!(
            "Here are {} questions on trade terminology. {}",
            items.len(),
            ANSWER_HINT
        );
        let phase = input.state.phase.transition_to(HandlerPhase::Answering)?;

        Ok(HandlerOutput::reply(
            input,
            HandlerResponse::Items {
                intro: intro.clone(),
                items,
            },
            intro,
        )
        .with_state(Self::sheet_state(phase, &sheet)?))
    }

    fn collect_answers(input: &HandlerInput, sheet: &mut QuizSheet) -> usize {
        let mut recorded = 0;
        if let Some(Value::Object(by_id)) = input.context.get(ANSWERS_CONTEXT_KEY) {
            for (quiz_id, choice) in by_id {
                let choice = choice.as_u64().and_then(|c| usize::try_from(c).ok());
                if let Some(choice) = choice {
                    if sheet.answer_by_id(quiz_id, choice) {
                        recorded += 1;
                    }
                }
            }
        }
        if let Some(submitted) = parse_answers(&input.text) {
            recorded += sheet.record(submitted);
        }
        recorded
    }

    fn answer(&self, input: &HandlerInput, mut sheet: QuizSheet) -> Result<HandlerOutput, HandlerError> {
        let lower = input.text.to_lowercase();
        let stopping = STOP_WORDS.iter().any(|w| lower.contains(w));
        let recorded = Self::collect_answers(input, &mut sheet);
        tracing::debug!(recorded, stopping, "quiz answers received");

        if sheet.is_complete() || stopping {
            let phase = input.state.phase.transition_to(HandlerPhase::Done)?;
            let grade = sheet.grade();
            let message = render_grade(&grade, &sheet);
            let envelope = ResponseEnvelope::chat(message.clone())
                .with_meta("score", grade.score)
                .with_meta("total", grade.total)
                .with_meta("grade", json!(grade));
            return Ok(
                HandlerOutput::reply(input, HandlerResponse::Normalized(envelope), message)
                    .with_phase(phase),
            );
        }

        let pending: Vec<String> = sheet.unanswered().iter().map(|i| (i + 1).to_string()).collect();
        let message = if recorded == 0 {
            format!("I couldn't find an answer in that. {ANSWER_HINT}")
        } else {
            format!(
                "Got {recorded} answer(s). Still unanswered: {}.",
                pending.join(", ")
            )
        };
        let phase = input.state.phase.transition_to(HandlerPhase::Answering)?;
        let envelope = ResponseEnvelope::chat(message.clone()).with_meta("unanswered", json!(pending));

        Ok(
            HandlerOutput::reply(input, HandlerResponse::Normalized(envelope), message)
                .with_state(Self::sheet_state(phase, &sheet)?),
        )
    }
}

fn render_grade(grade: &QuizGrade, sheet: &QuizSheet) -> String {
    let mut out = format!("You scored {}/{}.\n", grade.score, grade.total);
    for (result, item) in grade.results.iter().zip(&sheet.questions) {
        let mark = if result.is_correct { "correct" } else { "wrong" };
        let picked = result
            .selected
            .map(|c| choice_letter(c).to_string())
            .unwrap_or_else(|| "-".to_string());
        out.push_str(&format!(
            "\n{}. {} ({}; you chose {}, answer {})",
            result.number,
            item.question,
            mark,
            picked,
            choice_letter(result.correct_answer)
        ));
        if !result.is_correct && !result.explanation.is_empty() {
            out.push_str(&format!("\n   {}", result.explanation));
        }
    }
    out
}

#[async_trait]
impl Handler for QuizHandler {
    fn profile(&self) -> &HandlerProfile {
        &self.profile
    }

    async fn handle(&self, input: HandlerInput) -> Result<HandlerOutput, HandlerError> {
        match Self::open_sheet(&input.state) {
            Some(sheet) => self.answer(&input, sheet),
            None => {
                let mut input = input;
                // An unreadable quiz is dropped; generation starts from Idle.
                input.state = HandlerState::default();
                self.generate(&input).await
            }
        }
    }
}
