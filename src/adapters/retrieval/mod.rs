//! Retrieval adapters - Implementations of the DocumentRetriever port.

mod in_memory_retriever;

pub use in_memory_retriever::{CorpusDocument, InMemoryRetriever};
