//! Bounded generate-validate-retry loop with topic substitution.

use async_trait::async_trait;
use std::fmt::Debug;

use super::{CandidateItem, GenerationError, Validator};

/// Produces one candidate payload for a topic.
///
/// `feedback` holds every issue raised against earlier attempts on the same
/// topic; it is empty on the first attempt.
#[async_trait]
pub trait CandidateGenerator<T, P>: Send + Sync {
    async fn generate(&self, topic: &T, feedback: &[String]) -> Result<P, GenerationError>;
}

/// Bounds for one loop run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopLimits {
    pub target_count: usize,
    pub max_attempts_per_slot: u32,
    /// How many failed topics may be replaced by fresh ones.
    pub max_substitutions: usize,
}

impl LoopLimits {
    pub fn new(target_count: usize, max_attempts_per_slot: u32) -> Self {
        Self {
            target_count,
            max_attempts_per_slot: max_attempts_per_slot.max(1),
            max_substitutions: target_count,
        }
    }

    pub fn with_max_substitutions(mut self, max_substitutions: usize) -> Self {
        self.max_substitutions = max_substitutions;
        self
    }

    /// Hard cap on generation calls for one run: every slot and every
    /// permitted substitute gets its full attempt allowance.
    pub fn call_budget(&self) -> usize {
        self.target_count
            .saturating_add(self.max_substitutions)
            .saturating_mul(self.max_attempts_per_slot.max(1) as usize)
    }
}

/// What a loop run produced.
#[derive(Debug, Clone, PartialEq)]
pub struct LoopOutcome<T, P> {
    pub accepted: Vec<CandidateItem<P>>,
    /// Topics dropped after exhausting their attempts, in order.
    pub discarded_topics: Vec<T>,
    pub generation_calls: usize,
    pub rejected_candidates: usize,
}

impl<T, P> LoopOutcome<T, P> {
    pub fn is_complete(&self, limits: &LoopLimits) -> bool {
        self.accepted.len() >= limits.target_count
    }
}

/// Drives generation until `target_count` candidates pass validation.
///
/// Each slot takes the next topic and retries it up to
/// `max_attempts_per_slot` times, feeding validator issues back into the
/// generator. A topic that exhausts its attempts is discarded and the next
/// slot starts on a different topic. The run stops when the target is met,
/// the call budget (`(target_count + max_substitutions) *
/// max_attempts_per_slot`) is spent, the substitution allowance is used up,
/// or topics run out.
#[derive(Debug, Clone, Copy)]
pub struct ContentValidationLoop {
    limits: LoopLimits,
}

impl ContentValidationLoop {
    pub fn new(limits: LoopLimits) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> &LoopLimits {
        &self.limits
    }

    pub async fn produce<T, P, G, V>(
        &self,
        topics: Vec<T>,
        generator: &G,
        validator: &V,
    ) -> LoopOutcome<T, P>
    where
        T: Debug + Send + Sync,
        P: Send + Sync,
        G: CandidateGenerator<T, P> + ?Sized,
        V: Validator<P> + ?Sized,
    {
        let budget = self.limits.call_budget();
        let mut outcome = LoopOutcome {
            accepted: Vec::new(),
            discarded_topics: Vec::new(),
            generation_calls: 0,
            rejected_candidates: 0,
        };
        let mut substitutions = 0usize;
        let mut topics = topics.into_iter();

        while outcome.accepted.len() < self.limits.target_count {
            if outcome.generation_calls >= budget {
                break;
            }
            let Some(topic) = topics.next() else {
                tracing::debug!("content loop ran out of topics");
                break;
            };

            let mut feedback: Vec<String> = Vec::new();
            let mut accepted = None;

            for attempt in 1..=self.limits.max_attempts_per_slot {
                if outcome.generation_calls >= budget {
                    break;
                }
                outcome.generation_calls += 1;

                let payload = match generator.generate(&topic, &feedback).await {
                    Ok(payload) => payload,
                    Err(e) => {
                        tracing::warn!("generation failed for {:?} (attempt {}): {}", topic, attempt, e);
                        push_unique(&mut feedback, format!("Previous attempt failed: {}", e));
                        continue;
                    }
                };

                let verdict = validator.validate(&payload).await;
                if verdict.passed {
                    accepted = Some(CandidateItem {
                        payload,
                        passed: true,
                        issues: Vec::new(),
                        attempt,
                    });
                    break;
                }

                outcome.rejected_candidates += 1;
                for issue in verdict.issues {
                    push_unique(&mut feedback, issue);
                }
            }

            match accepted {
                Some(item) => outcome.accepted.push(item),
                None => {
                    tracing::info!("discarding topic {:?} after failed attempts", topic);
                    outcome.discarded_topics.push(topic);
                    if substitutions >= self.limits.max_substitutions {
                        break;
                    }
                    substitutions += 1;
                }
            }
        }

        outcome
    }
}

fn push_unique(feedback: &mut Vec<String>, issue: String) {
    if !feedback.contains(&issue) {
        feedback.push(issue);
    }
}
