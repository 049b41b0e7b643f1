//! Handler Port - The contract every conversational agent implements.

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::domain::foundation::HandlerId;
use crate::domain::response::HandlerResponse;
use crate::domain::session::{ChatTurn, HandlerPhase, HandlerState};

/// Static description used by the dispatcher.
#[derive(Debug, Clone)]
pub struct HandlerProfile {
    pub id: HandlerId,
    pub description: String,
    /// Case-sensitive substrings that claim a turn.
    pub triggers: Vec<String>,
    /// Phrases embedded for semantic routing.
    pub reference_phrases: Vec<String>,
}

impl HandlerProfile {
    pub fn new(id: impl Into<HandlerId>, description: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            triggers: Vec::new(),
            reference_phrases: Vec::new(),
        }
    }

    pub fn with_triggers(mut self, triggers: &[&str]) -> Self {
        self.triggers = triggers.iter().map(|t| t.to_string()).collect();
        self
    }

    pub fn with_reference_phrases(mut self, phrases: &[&str]) -> Self {
        self.reference_phrases = phrases.iter().map(|p| p.to_string()).collect();
        self
    }

    /// True if any trigger is a substring of `text`.
    pub fn matches_trigger(&self, text: &str) -> bool {
        self.triggers.iter().any(|t| text.contains(t.as_str()))
    }
}

/// One turn as seen by a handler.
#[derive(Debug, Clone, Default)]
pub struct HandlerInput {
    pub text: String,
    /// History owned by this handler, excluding `text`.
    pub history: Vec<ChatTurn>,
    pub in_progress: bool,
    pub state: HandlerState,
    /// Caller-supplied context from the turn request.
    pub context: Map<String, Value>,
}

impl HandlerInput {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn context_str(&self, key: &str) -> Option<&str> {
        self.context.get(key).and_then(Value::as_str)
    }

    /// History plus the current turn.
    pub fn history_with_turn(&self) -> Vec<ChatTurn> {
        let mut history = self.history.clone();
        history.push(ChatTurn::user(self.text.clone()));
        history
    }
}

/// What a handler returns after a turn.
#[derive(Debug, Clone)]
pub struct HandlerOutput {
    pub response: HandlerResponse,
    pub history: Vec<ChatTurn>,
    pub state: HandlerState,
}

impl HandlerOutput {
    /// Output that appends the user turn and `reply` to history.
    pub fn reply(input: &HandlerInput, response: HandlerResponse, reply: impl Into<String>) -> Self {
        let mut history = input.history_with_turn();
        history.push(ChatTurn::assistant(reply));
        Self {
            response,
            history,
            state: HandlerState::default(),
        }
    }

    pub fn with_state(mut self, state: HandlerState) -> Self {
        self.state = state;
        self
    }

    pub fn with_phase(mut self, phase: HandlerPhase) -> Self {
        self.state.phase = phase;
        self
    }

    pub fn phase(&self) -> HandlerPhase {
        self.state.phase
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum HandlerError {
    #[error("invalid phase transition: {0}")]
    InvalidPhase(String),

    #[error("handler failed: {0}")]
    Internal(String),
}

impl HandlerError {
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }
}

impl From<crate::domain::foundation::ValidationError> for HandlerError {
    fn from(err: crate::domain::foundation::ValidationError) -> Self {
        Self::InvalidPhase(err.to_string())
    }
}

/// Port for a pluggable turn-processing agent.
#[async_trait]
pub trait Handler: Send + Sync {
    fn profile(&self) -> &HandlerProfile;

    async fn handle(&self, input: HandlerInput) -> Result<HandlerOutput, HandlerError>;

    fn id(&self) -> &HandlerId {
        &self.profile().id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn triggers_are_case_sensitive_substrings() {
        let profile = HandlerProfile::new("quiz", "quiz").with_triggers(&["quiz", "Incoterms"]);
        assert!(profile.matches_trigger("give me a quiz please"));
        assert!(profile.matches_trigger("Incoterms test"));
        assert!(!profile.matches_trigger("incoterms test"));
    }

    #[test]
    fn reply_appends_user_and_assistant_turns() {
        let mut input = HandlerInput::new("second");
        input.history = vec![ChatTurn::user("first"), ChatTurn::assistant("ok")];
        let out = HandlerOutput::reply(&input, HandlerResponse::Chat("done".into()), "done");
        assert_eq!(out.history.len(), 4);
        assert_eq!(out.history[2], ChatTurn::user("second"));
        assert_eq!(out.history[3], ChatTurn::assistant("done"));
        assert_eq!(out.phase(), HandlerPhase::Idle);
    }
}
