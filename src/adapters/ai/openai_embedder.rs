//! OpenAI-compatible embeddings client.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::openai_gateway::OpenAiConfig;
use crate::ports::{Embedder, EmbeddingError, LlmError};

/// Embedder backed by `/embeddings`. `config.model` is the embedding model.
pub struct OpenAiEmbedder {
    config: OpenAiConfig,
    client: Client,
}

impl OpenAiEmbedder {
    pub fn new(config: OpenAiConfig) -> Result<Self, LlmError> {
        let client = config.build_client()?;
        Ok(Self { config, client })
    }

    async fn embed_once(&self, request: &EmbeddingRequest<'_>) -> Result<Vec<Vec<f32>>, LlmError> {
        let response = self
            .config
            .post_json(&self.client, "embeddings", request)
            .await?;
        let mut parsed: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| LlmError::parse(format!("Failed to parse embeddings: {}", e)))?;
        parsed.data.sort_by_key(|d| d.index);
        Ok(parsed.data.into_iter().map(|d| d.embedding).collect())
    }
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let request = EmbeddingRequest {
            model: &self.config.model,
            input: texts,
        };
        let vectors = self
            .config
            .backoff
            .run(|| self.embed_once(&request))
            .await
            .map_err(|e| EmbeddingError::unavailable(e.to_string()))?;

        if vectors.len() != texts.len() {
            return Err(EmbeddingError::malformed(format!(
                "expected {} vectors, got {}",
                texts.len(),
                vectors.len()
            )));
        }
        Ok(vectors)
    }
}

impl std::fmt::Debug for OpenAiEmbedder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiEmbedder")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    #[serde(default)]
    index: usize,
    embedding: Vec<f32>,
}
