//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the core and the outside world. Adapters implement these ports.
//!
//! - `SessionStore` - Keyed session persistence with expiry
//! - `LlmGateway` - Single-shot text generation
//! - `Embedder` - Text embeddings for semantic routing and retrieval
//! - `DocumentRetriever` - Similarity search over reference documents
//! - `Handler` - Contract for conversational agents

mod document_retriever;
mod embedder;
mod handler;
mod llm_gateway;
mod session_store;

pub use document_retriever::{DocumentRetriever, RetrievedDocument, RetrieverError};
pub use embedder::{cosine_similarity, Embedder, EmbeddingError};
pub use handler::{Handler, HandlerError, HandlerInput, HandlerOutput, HandlerProfile};
pub use llm_gateway::{LlmError, LlmGateway};
pub use session_store::{SessionStore, SessionStoreError};
