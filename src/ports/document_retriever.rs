//! Document Retriever Port - Similarity search over reference documents.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Port for vector search.
#[async_trait]
pub trait DocumentRetriever: Send + Sync {
    /// Returns up to `k` documents in ascending distance order.
    ///
    /// `type_filter` restricts results to documents whose `document_type`
    /// metadata equals the filter.
    async fn search(
        &self,
        query: &str,
        k: usize,
        type_filter: Option<&str>,
    ) -> Result<Vec<RetrievedDocument>, RetrieverError>;
}

/// One search hit. Lower distance means more similar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedDocument {
    pub content: String,
    #[serde(default)]
    pub metadata: Map<String, Value>,
    pub distance: f32,
}

impl RetrievedDocument {
    /// String metadata value, if present.
    pub fn meta_str(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(Value::as_str)
    }

    /// Source label, falling back to "unknown".
    pub fn source(&self) -> &str {
        self.meta_str("source")
            .or_else(|| self.meta_str("source_dataset"))
            .unwrap_or("unknown")
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RetrieverError {
    #[error("retriever unavailable: {0}")]
    Unavailable(String),

    #[error("failed to load corpus: {0}")]
    Corpus(String),
}

impl RetrieverError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable(message.into())
    }

    pub fn corpus(message: impl Into<String>) -> Self {
        Self::Corpus(message.into())
    }
}
