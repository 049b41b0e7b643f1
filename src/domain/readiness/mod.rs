//! Readiness - Deciding when enough facts exist to run an expensive step.
//!
//! The model extracts fields; this module decides readiness. The decision
//! is a presence count over required fields and never consults the model's
//! own judgement.

mod facts;
mod policy;

pub use facts::{ExtractedFacts, FactValue, FieldKind, FieldSpec};
pub use policy::{ReadinessPolicy, ReadinessVerdict, GENERIC_RETRY_PROMPT};
