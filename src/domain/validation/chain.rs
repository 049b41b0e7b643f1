//! Ordered validation criteria.

use async_trait::async_trait;
use std::sync::Arc;

use super::Verdict;

/// Anything that can judge a payload.
#[async_trait]
pub trait Validator<P>: Send + Sync {
    async fn validate(&self, payload: &P) -> Verdict;
}

/// One pluggable quality criterion.
#[async_trait]
pub trait Criterion<P>: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    async fn check(&self, payload: &P) -> Verdict;
}

/// Criteria evaluated in a fixed order, stopping at the first failure.
///
/// The failing criterion's issues become the verdict's issues.
pub struct ValidationChain<P> {
    criteria: Vec<Arc<dyn Criterion<P>>>,
}

impl<P> ValidationChain<P> {
    pub fn new() -> Self {
        Self {
            criteria: Vec::new(),
        }
    }

    pub fn with(mut self, criterion: Arc<dyn Criterion<P>>) -> Self {
        self.criteria.push(criterion);
        self
    }

    pub fn len(&self) -> usize {
        self.criteria.len()
    }

    pub fn is_empty(&self) -> bool {
        self.criteria.is_empty()
    }
}

impl<P> Default for ValidationChain<P> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<P: Send + Sync> Validator<P> for ValidationChain<P> {
    async fn validate(&self, payload: &P) -> Verdict {
        for criterion in &self.criteria {
            let verdict = criterion.check(payload).await;
            if !verdict.passed {
                tracing::debug!(
                    criterion = criterion.name(),
                    issues = verdict.issues.len(),
                    "candidate rejected"
                );
                return verdict;
            }
        }
        Verdict::pass()
    }
}
