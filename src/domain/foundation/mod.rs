//! Foundation module - Shared domain primitives.
//!
//! Identifiers, validation errors and the state machine trait used by
//! handler phases.

mod errors;
mod ids;
mod state_machine;

pub use errors::ValidationError;
pub use ids::{HandlerId, SessionKey};
pub use state_machine::StateMachine;
