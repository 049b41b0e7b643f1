//! Priority-ordered routing of a turn to one handler.

use std::fmt;

use serde::Serialize;

use crate::domain::foundation::HandlerId;
use crate::domain::session::Session;

use super::{HandlerRegistry, IntentClassifier, SimilarityIndex};

/// Which step of the chain picked the handler.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "step", content = "score")]
pub enum RouteReason {
    Continuation,
    Override,
    Keyword,
    Similarity(f32),
    Classified,
    Fallback,
}

impl RouteReason {
    pub fn label(&self) -> &'static str {
        match self {
            RouteReason::Continuation => "continuation",
            RouteReason::Override => "override",
            RouteReason::Keyword => "keyword",
            RouteReason::Similarity(_) => "similarity",
            RouteReason::Classified => "classified",
            RouteReason::Fallback => "fallback",
        }
    }
}

impl fmt::Display for RouteReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteReason::Similarity(score) => write!(f, "similarity({:.3})", score),
            other => f.write_str(other.label()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RouteDecision {
    pub handler: HandlerId,
    pub reason: RouteReason,
}

impl RouteDecision {
    fn new(handler: HandlerId, reason: RouteReason) -> Self {
        Self { handler, reason }
    }
}

/// Routes turns through a fixed chain; the first step that matches wins.
///
/// 1. continuation of an in-progress flow
/// 2. explicit override from the caller
/// 3. keyword trigger, in registration order
/// 4. semantic similarity (optional)
/// 5. LLM classification (optional)
/// 6. the default handler
#[derive(Debug)]
pub struct Dispatcher {
    registry: HandlerRegistry,
    similarity: Option<SimilarityIndex>,
    classifier: Option<IntentClassifier>,
}

impl Dispatcher {
    pub fn new(registry: HandlerRegistry) -> Self {
        Self {
            registry,
            similarity: None,
            classifier: None,
        }
    }

    pub fn with_similarity(mut self, index: SimilarityIndex) -> Self {
        self.similarity = Some(index);
        self
    }

    pub fn with_classifier(mut self, classifier: IntentClassifier) -> Self {
        self.classifier = Some(classifier);
        self
    }

    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    pub async fn route(
        &self,
        text: &str,
        session: &Session,
        override_id: Option<&str>,
    ) -> RouteDecision {
        let decision = self.resolve(text, session, override_id).await;
        tracing::info!(
            handler = %decision.handler,
            reason = %decision.reason,
            previous = session.active_handler.as_ref().map(|h| h.as_str()).unwrap_or("-"),
            "turn routed"
        );
        decision
    }

    async fn resolve(
        &self,
        text: &str,
        session: &Session,
        override_id: Option<&str>,
    ) -> RouteDecision {
        if let Some(active) = &session.active_handler {
            let is_default = active == self.registry.default_handler().id();
            if !is_default && self.registry.contains(active) && session.has_flow_in_progress() {
                return RouteDecision::new(active.clone(), RouteReason::Continuation);
            }
        }

        if let Some(requested) = override_id.map(str::trim).filter(|s| !s.is_empty()) {
            let id = HandlerId::new(requested);
            if self.registry.contains(&id) {
                return RouteDecision::new(id, RouteReason::Override);
            }
            tracing::debug!(requested, "ignoring override for unregistered handler");
        }

        if let Some(handler) = self
            .registry
            .ordered()
            .iter()
            .find(|h| h.profile().matches_trigger(text))
        {
            return RouteDecision::new(handler.id().clone(), RouteReason::Keyword);
        }

        if let Some(index) = &self.similarity {
            match index.best_match(text).await {
                Ok(Some((id, score))) => {
                    return RouteDecision::new(id, RouteReason::Similarity(score));
                }
                Ok(None) => {}
                Err(e) => tracing::warn!(error = %e, "semantic routing skipped"),
            }
        }

        if let Some(classifier) = &self.classifier {
            if let Some((id, reason)) = classifier.classify(text, &self.registry).await {
                tracing::debug!(handler = %id, reason = %reason, "classifier picked handler");
                return RouteDecision::new(id, RouteReason::Classified);
            }
        }

        RouteDecision::new(
            self.registry.default_handler().id().clone(),
            RouteReason::Fallback,
        )
    }
}
