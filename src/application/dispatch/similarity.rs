//! Semantic routing over pre-embedded reference phrases.

use std::sync::Arc;

use crate::domain::foundation::HandlerId;
use crate::ports::{cosine_similarity, Embedder, EmbeddingError};

use super::HandlerRegistry;

/// Reference-phrase embeddings per handler, in registration order.
pub struct SimilarityIndex {
    embedder: Arc<dyn Embedder>,
    entries: Vec<(HandlerId, Vec<Vec<f32>>)>,
    threshold: f32,
}

impl SimilarityIndex {
    /// Embeds every registered handler's reference phrases once.
    ///
    /// Handlers without reference phrases are left out.
    pub async fn build(
        embedder: Arc<dyn Embedder>,
        registry: &HandlerRegistry,
        threshold: f32,
    ) -> Result<Self, EmbeddingError> {
        let mut entries = Vec::new();
        for handler in registry.ordered() {
            let phrases = &handler.profile().reference_phrases;
            if phrases.is_empty() {
                continue;
            }
            let vectors = embedder.embed(phrases).await?;
            entries.push((handler.id().clone(), vectors));
        }

        tracing::info!(
            handlers = entries.len(),
            threshold,
            "semantic routing index built"
        );

        Ok(Self {
            embedder,
            entries,
            threshold,
        })
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Handler whose closest reference phrase scores above the threshold.
    ///
    /// The highest score wins; equal scores go to the earlier registration.
    pub async fn best_match(&self, text: &str) -> Result<Option<(HandlerId, f32)>, EmbeddingError> {
        if self.entries.is_empty() {
            return Ok(None);
        }

        let query = self
            .embedder
            .embed(&[text.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| EmbeddingError::malformed("no vector for routing query"))?;

        let mut best: Option<(&HandlerId, f32)> = None;
        for (id, vectors) in &self.entries {
            let score = vectors
                .iter()
                .map(|v| cosine_similarity(&query, v))
                .fold(f32::MIN, f32::max);
            if best.map_or(true, |(_, b)| score > b) {
                best = Some((id, score));
            }
        }

        Ok(best
            .filter(|(_, score)| *score > self.threshold)
            .map(|(id, score)| (id.clone(), score)))
    }
}

impl std::fmt::Debug for SimilarityIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimilarityIndex")
            .field("handlers", &self.entries.len())
            .field("threshold", &self.threshold)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::ai::HashingEmbedder;
    use crate::application::dispatch::test_support::StubHandler;
    use async_trait::async_trait;

    fn registry() -> HandlerRegistry {
        HandlerRegistry::new(Arc::new(StubHandler::new("default_chat")))
            .register(Arc::new(
                StubHandler::new("riskmanaging")
                    .with_reference_phrases(&["my shipment arrived late and the buyer wants compensation"]),
            ))
            .register(Arc::new(
                StubHandler::new("quiz").with_reference_phrases(&["ask me trade vocabulary questions"]),
            ))
    }

    #[tokio::test]
    async fn exact_reference_phrase_matches_its_handler() {
        let index = SimilarityIndex::build(Arc::new(HashingEmbedder::new()), &registry(), 0.87)
            .await
            .unwrap();
        let (id, score) = index
            .best_match("ask me trade vocabulary questions")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(id.as_str(), "quiz");
        assert!(score > 0.99);
    }

    #[tokio::test]
    async fn unrelated_text_stays_below_threshold() {
        let index = SimilarityIndex::build(Arc::new(HashingEmbedder::new()), &registry(), 0.87)
            .await
            .unwrap();
        assert!(index.best_match("what's the weather tomorrow").await.unwrap().is_none());
    }

    /// Every text embeds to the same vector.
    struct FlatEmbedder;

    #[async_trait]
    impl Embedder for FlatEmbedder {
        async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
            Ok(texts.iter().map(|_| vec![1.0, 0.0]).collect())
        }
    }

    #[tokio::test]
    async fn ties_go_to_registration_order() {
        let index = SimilarityIndex::build(Arc::new(FlatEmbedder), &registry(), 0.5)
            .await
            .unwrap();
        let (id, _) = index.best_match("anything").await.unwrap().unwrap();
        assert_eq!(id.as_str(), "riskmanaging");
    }

    #[tokio::test]
    async fn threshold_is_strict() {
        let index = SimilarityIndex::build(Arc::new(FlatEmbedder), &registry(), 1.0)
            .await
            .unwrap();
        assert!(index.best_match("anything").await.unwrap().is_none());
    }
}
