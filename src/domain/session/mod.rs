//! Session module - Per-conversation state owned by the orchestrator.
//!
//! A session tracks which handler is active, the dialogue exchanged with
//! that handler, and the handler's private state.

mod aggregate;
mod history;
mod phase;

pub use aggregate::Session;
pub use history::{ChatTurn, TurnRole};
pub use phase::{HandlerPhase, HandlerState};
