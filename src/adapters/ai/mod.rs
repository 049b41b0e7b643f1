//! AI adapters - Implementations of the LlmGateway and Embedder ports.
//!
//! - `OpenAiGateway` / `OpenAiEmbedder` - OpenAI-compatible HTTP endpoints
//! - `HashingEmbedder` - Deterministic offline embeddings
//! - `MockLlmGateway` - Scriptable gateway for tests

mod backoff;
mod hashing_embedder;
mod mock_gateway;
mod openai_embedder;
mod openai_gateway;

pub use backoff::Backoff;
pub use hashing_embedder::HashingEmbedder;
pub use mock_gateway::{MockCall, MockLlmGateway, MockReply};
pub use openai_embedder::OpenAiEmbedder;
pub use openai_gateway::{OpenAiConfig, OpenAiGateway};
