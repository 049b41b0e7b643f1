//! Session aggregate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::foundation::HandlerId;

use super::{ChatTurn, HandlerPhase, HandlerState};

/// Per-conversation state, persisted as one JSON document.
///
/// # Invariants
///
/// - At most one handler is active.
/// - `history` and `handler_state` belong to `active_handler` only; they are
///   cleared whenever the active handler changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub active_handler: Option<HandlerId>,
    #[serde(default)]
    pub history: Vec<ChatTurn>,
    #[serde(default)]
    pub handler_state: HandlerState,
    pub last_touched_at: DateTime<Utc>,
}

impl Session {
    /// Creates an empty session with no active handler.
    pub fn new() -> Self {
        Self {
            active_handler: None,
            history: Vec::new(),
            handler_state: HandlerState::default(),
            last_touched_at: Utc::now(),
        }
    }

    /// Returns true if `handler` differs from the active handler.
    pub fn is_switch_to(&self, handler: &HandlerId) -> bool {
        self.active_handler.as_ref() != Some(handler)
    }

    /// Makes `handler` active. Switching clears history and handler state.
    ///
    /// Returns true if a switch happened.
    pub fn activate(&mut self, handler: &HandlerId) -> bool {
        if !self.is_switch_to(handler) {
            return false;
        }
        self.active_handler = Some(handler.clone());
        self.history.clear();
        self.handler_state = HandlerState::default();
        true
    }

    /// Releases the active handler after a terminal phase.
    ///
    /// History is kept until the next turn's switch clears it.
    pub fn release_handler(&mut self) {
        self.active_handler = None;
        self.handler_state = HandlerState::default();
    }

    /// True if the active handler flagged an unfinished multi-turn flow.
    pub fn has_flow_in_progress(&self) -> bool {
        self.active_handler.is_some() && self.handler_state.is_in_progress()
    }

    pub fn phase(&self) -> HandlerPhase {
        self.handler_state.phase
    }

    pub fn touch(&mut self) {
        self.last_touched_at = Utc::now();
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
