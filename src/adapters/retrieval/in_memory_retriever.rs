//! In-memory vector retriever over a YAML corpus.
//!
//! Documents are embedded once at load time; a search embeds the query and
//! ranks by cosine distance (`1 - similarity`).
//!
//! Corpus format:
//!
//! ```yaml
//! documents:
//!   - content: "FOB: risk passes when goods are on board the vessel."
//!     metadata:
//!       document_type: trade_terminology
//!       source: icc_trade_terms
//! ```

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::path::Path;
use std::sync::Arc;

use crate::ports::{
    cosine_similarity, DocumentRetriever, Embedder, RetrievedDocument, RetrieverError,
};

#[derive(Debug, Clone, Deserialize)]
pub struct CorpusDocument {
    pub content: String,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CorpusFile {
    Wrapped { documents: Vec<CorpusDocument> },
    Bare(Vec<CorpusDocument>),
}

struct IndexedDocument {
    doc: CorpusDocument,
    vector: Vec<f32>,
}

/// Retriever holding the whole corpus in memory.
pub struct InMemoryRetriever {
    embedder: Arc<dyn Embedder>,
    documents: Vec<IndexedDocument>,
}

impl InMemoryRetriever {
    /// Empty retriever; every search returns no documents.
    pub fn empty(embedder: Arc<dyn Embedder>) -> Self {
        Self {
            embedder,
            documents: Vec::new(),
        }
    }

    pub async fn from_documents(
        documents: Vec<CorpusDocument>,
        embedder: Arc<dyn Embedder>,
    ) -> Result<Self, RetrieverError> {
        let texts: Vec<String> = documents.iter().map(|d| d.content.clone()).collect();
        let vectors = embedder
            .embed(&texts)
            .await
            .map_err(|e| RetrieverError::corpus(format!("embedding corpus: {}", e)))?;
        if vectors.len() != documents.len() {
            return Err(RetrieverError::corpus("embedder returned wrong vector count"));
        }
        let documents = documents
            .into_iter()
            .zip(vectors)
            .map(|(doc, vector)| IndexedDocument { doc, vector })
            .collect();
        Ok(Self {
            embedder,
            documents,
        })
    }

    pub async fn from_yaml_str(
        yaml: &str,
        embedder: Arc<dyn Embedder>,
    ) -> Result<Self, RetrieverError> {
        let file: CorpusFile =
            serde_yaml::from_str(yaml).map_err(|e| RetrieverError::corpus(e.to_string()))?;
        let documents = match file {
            CorpusFile::Wrapped { documents } => documents,
            CorpusFile::Bare(documents) => documents,
        };
        Self::from_documents(documents, embedder).await
    }

    pub async fn from_path(
        path: impl AsRef<Path>,
        embedder: Arc<dyn Embedder>,
    ) -> Result<Self, RetrieverError> {
        let path = path.as_ref();
        let yaml = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| RetrieverError::corpus(format!("{}: {}", path.display(), e)))?;
        let retriever = Self::from_yaml_str(&yaml, embedder).await?;
        tracing::info!(path = %path.display(), documents = retriever.len(), "reference corpus loaded");
        Ok(retriever)
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

#[async_trait]
impl DocumentRetriever for InMemoryRetriever {
    async fn search(
        &self,
        query: &str,
        k: usize,
        type_filter: Option<&str>,
    ) -> Result<Vec<RetrievedDocument>, RetrieverError> {
        if self.documents.is_empty() || k == 0 {
            return Ok(Vec::new());
        }
        let query_vector = self
            .embedder
            .embed(&[query.to_string()])
            .await
            .map_err(|e| RetrieverError::unavailable(e.to_string()))?
            .into_iter()
            .next()
            .ok_or_else(|| RetrieverError::unavailable("no query embedding"))?;

        let mut hits: Vec<RetrievedDocument> = self
            .documents
            .iter()
            .filter(|d| match type_filter {
                Some(filter) => {
                    d.doc.metadata.get("document_type").and_then(Value::as_str) == Some(filter)
                }
                None => true,
            })
            .map(|d| RetrievedDocument {
                content: d.doc.content.clone(),
                metadata: d.doc.metadata.clone(),
                distance: 1.0 - cosine_similarity(&query_vector, &d.vector),
            })
            .collect();

        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits.truncate(k);
        Ok(hits)
    }
}

impl std::fmt::Debug for InMemoryRetriever {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryRetriever")
            .field("documents", &self.documents.len())
            .finish_non_exhaustive()
    }
}
