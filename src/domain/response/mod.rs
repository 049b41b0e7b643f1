//! Response - The envelope every turn returns and the normalizer that builds it.

mod envelope;
mod normalizer;

pub use envelope::{EnvelopeKind, HandlerResponse, ResponseEnvelope};
pub use normalizer::ResponseNormalizer;
