//! Quality criteria for generated quiz items, in evaluation order.

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::quiz::{distractor_issues, structural_issues, QuizItem};
use crate::domain::validation::{Criterion, ValidationChain, Verdict};
use crate::ports::DocumentRetriever;

const REFERENCE_K: usize = 5;

/// Item shape: question, four choices, answer index, explanation.
pub struct StructuralCriterion;

#[async_trait]
impl Criterion<QuizItem> for StructuralCriterion {
    fn name(&self) -> &'static str {
        "structural"
    }

    async fn check(&self, item: &QuizItem) -> Verdict {
        Verdict::from_issues(structural_issues(item))
    }
}

/// The question and its answer must be backed by the reference corpus.
///
/// A retriever outage skips the check rather than failing every item.
pub struct ReferenceCriterion {
    retriever: Arc<dyn DocumentRetriever>,
    max_distance: f32,
}

impl ReferenceCriterion {
    pub fn new(retriever: Arc<dyn DocumentRetriever>, max_distance: f32) -> Self {
        Self {
            retriever,
            max_distance,
        }
    }
}

#[async_trait]
impl Criterion<QuizItem> for ReferenceCriterion {
    fn name(&self) -> &'static str {
        "reference"
    }

    async fn check(&self, item: &QuizItem) -> Verdict {
        let query = format!("{} {}", item.question, item.correct_choice().unwrap_or_default());
        match self.retriever.search(&query, REFERENCE_K, None).await {
            Ok(docs) if docs.iter().any(|d| d.distance <= self.max_distance) => Verdict::pass(),
            Ok(docs) => Verdict::fail(vec![format!(
                "No reference document supports this question (closest distance {})",
                docs.first()
                    .map(|d| format!("{:.2}", d.distance))
                    .unwrap_or_else(|| "n/a".to_string())
            )]),
            Err(e) => {
                tracing::warn!(error = %e, "reference check skipped");
                Verdict::pass()
            }
        }
    }
}

/// Distractors must be distinct and must not be catch-alls.
pub struct DistractorCriterion;

#[async_trait]
impl Criterion<QuizItem> for DistractorCriterion {
    fn name(&self) -> &'static str {
        "distractor"
    }

    async fn check(&self, item: &QuizItem) -> Verdict {
        Verdict::from_issues(distractor_issues(item))
    }
}

/// Structural, then reference, then distractor.
pub fn quiz_validation_chain(
    retriever: Arc<dyn DocumentRetriever>,
    max_distance: f32,
) -> ValidationChain<QuizItem> {
    ValidationChain::new()
        .with(Arc::new(StructuralCriterion))
        .with(Arc::new(ReferenceCriterion::new(retriever, max_distance)))
        .with(Arc::new(DistractorCriterion))
}
