//! Handler phases and handler-owned state.
//!
//! Multi-turn handlers move through an explicit phase enum instead of
//! carrying an "analysis in progress" boolean:
//!
//! ```text
//! Idle ──► Gathering ──► Ready ──► Analyzing ──► Done
//!   │         ▲  │         ▲           │
//!   │         └──┘         │           │ (analysis failed)
//!   ├──────────────────────┘           ▼
//!   │                              Gathering
//!   └──► Answering ──► Done
//!          ▲  │
//!          └──┘
//! ```
//!
//! `Answering` holds a generated quiz open until every question is answered.
//!
//! Stateless handlers stay in `Idle`. `Done` is terminal: the orchestrator
//! releases the handler and its state once it is reached.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::foundation::StateMachine;

/// Phase of the currently active handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum HandlerPhase {
    #[default]
    Idle,
    Gathering,
    Ready,
    Analyzing,
    Answering,
    Done,
}

impl HandlerPhase {
    /// True while a multi-turn interaction must not be abandoned.
    pub fn is_in_progress(&self) -> bool {
        matches!(
            self,
            HandlerPhase::Gathering
                | HandlerPhase::Ready
                | HandlerPhase::Analyzing
                | HandlerPhase::Answering
        )
    }
}

impl StateMachine for HandlerPhase {
    fn valid_transitions(&self) -> Vec<Self> {
        use HandlerPhase::*;
        match self {
            Idle => vec![Gathering, Ready, Answering],
            Gathering => vec![Gathering, Ready],
            Ready => vec![Analyzing],
            Analyzing => vec![Done, Gathering],
            Answering => vec![Answering, Done],
            Done => vec![],
        }
    }
}

/// State owned exclusively by the active handler.
///
/// `data` is opaque to everything except the handler that wrote it.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct HandlerState {
    #[serde(default)]
    pub phase: HandlerPhase,
    #[serde(default)]
    pub data: Map<String, Value>,
}

impl HandlerState {
    pub fn is_in_progress(&self) -> bool {
        self.phase.is_in_progress()
    }
}
