//! Dispatch - Deciding which handler owns a turn.

mod classifier;
mod dispatcher;
mod registry;
mod similarity;

pub use classifier::IntentClassifier;
pub use dispatcher::{Dispatcher, RouteDecision, RouteReason};
pub use registry::HandlerRegistry;
pub use similarity::SimilarityIndex;

#[cfg(test)]
pub(crate) use registry::test_support;
