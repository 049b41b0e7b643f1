//! Application layer - Per-turn orchestration and the handlers it drives.
//!
//! The orchestrator owns the turn lifecycle; the dispatcher decides who
//! answers; handlers do the work through ports.

pub mod dispatch;
pub mod handlers;
pub mod orchestrator;
pub mod readiness;

pub use dispatch::{Dispatcher, HandlerRegistry, IntentClassifier, RouteDecision, RouteReason, SimilarityIndex};
pub use orchestrator::{OrchestratorError, TurnCommand, TurnOrchestrator, TurnOutcome};
pub use readiness::{Assessment, ReadinessAssessor};
