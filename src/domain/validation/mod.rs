//! Validation - Generate, validate, retry, substitute.
//!
//! Generated content is checked by an ordered chain of criteria. Failed
//! candidates are regenerated with the failure messages as feedback; a topic
//! that keeps failing is dropped in favour of a different one.

mod candidate;
mod chain;
mod content_loop;

pub use candidate::{CandidateItem, GenerationError, Verdict};
pub use chain::{Criterion, ValidationChain, Validator};
pub use content_loop::{CandidateGenerator, ContentValidationLoop, LoopLimits, LoopOutcome};
