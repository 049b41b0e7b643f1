//! Mock LLM gateway for testing.
//!
//! Provides a scriptable implementation of the LlmGateway port so handlers,
//! the readiness assessor and the dispatcher can be tested without a model.
//!
//! # Features
//!
//! - Rules: a prompt containing a marker gets a fixed reply (order-free, so
//!   concurrent sub-steps stay deterministic)
//! - A FIFO queue of replies for prompts no rule matches
//! - Error injection and simulated delays
//! - Call tracking for verification
//!
//! # Example
//!
//! ```ignore
//! let gateway = MockLlmGateway::new()
//!     .with_rule("extracted_data", r#"{"extracted_data": {}}"#)
//!     .with_response("Hello!");
//! ```

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::time::sleep;

use crate::ports::{LlmError, LlmGateway};

/// A configured mock reply.
#[derive(Debug, Clone)]
pub enum MockReply {
    Text(String),
    Error(LlmError),
}

/// One recorded call.
#[derive(Debug, Clone, PartialEq)]
pub struct MockCall {
    pub prompt: String,
    pub temperature: Option<f32>,
}

/// Mock gateway; clones share the same script and call log.
#[derive(Debug, Clone)]
pub struct MockLlmGateway {
    rules: Arc<Mutex<Vec<(String, MockReply)>>>,
    queue: Arc<Mutex<VecDeque<MockReply>>>,
    fallback: MockReply,
    delay: Duration,
    calls: Arc<Mutex<Vec<MockCall>>>,
}

impl Default for MockLlmGateway {
    fn default() -> Self {
        Self::new()
    }
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}

impl MockLlmGateway {
    pub fn new() -> Self {
        Self {
            rules: Arc::new(Mutex::new(Vec::new())),
            queue: Arc::new(Mutex::new(VecDeque::new())),
            fallback: MockReply::Text("Mock response".to_string()),
            delay: Duration::ZERO,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Every prompt containing `marker` gets `reply`. First matching rule wins.
    pub fn with_rule(self, marker: impl Into<String>, reply: impl Into<String>) -> Self {
        lock(&self.rules).push((marker.into(), MockReply::Text(reply.into())));
        self
    }

    /// Every prompt containing `marker` fails with `error`.
    pub fn with_rule_error(self, marker: impl Into<String>, error: LlmError) -> Self {
        lock(&self.rules).push((marker.into(), MockReply::Error(error)));
        self
    }

    /// Queues a reply for the next unmatched prompt.
    pub fn with_response(self, content: impl Into<String>) -> Self {
        lock(&self.queue).push_back(MockReply::Text(content.into()));
        self
    }

    /// Queues an error for the next unmatched prompt.
    pub fn with_error(self, error: LlmError) -> Self {
        lock(&self.queue).push_back(MockReply::Error(error));
        self
    }

    /// Reply used once rules and queue are exhausted.
    pub fn with_fallback(mut self, reply: MockReply) -> Self {
        self.fallback = reply;
        self
    }

    /// Every call fails with `error` unless a rule or queued reply applies.
    pub fn failing(error: LlmError) -> Self {
        Self::new().with_fallback(MockReply::Error(error))
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn call_count(&self) -> usize {
        lock(&self.calls).len()
    }

    pub fn get_calls(&self) -> Vec<MockCall> {
        lock(&self.calls).clone()
    }

    /// Calls whose prompt contains `marker`.
    pub fn calls_containing(&self, marker: &str) -> usize {
        lock(&self.calls)
            .iter()
            .filter(|c| c.prompt.contains(marker))
            .count()
    }

    pub fn clear_calls(&self) {
        lock(&self.calls).clear();
    }

    fn next_reply(&self, prompt: &str) -> MockReply {
        if let Some((_, reply)) = lock(&self.rules)
            .iter()
            .find(|(marker, _)| prompt.contains(marker.as_str()))
        {
            return reply.clone();
        }
        lock(&self.queue)
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone())
    }
}

#[async_trait]
impl LlmGateway for MockLlmGateway {
    async fn invoke(&self, prompt: &str, temperature: Option<f32>) -> Result<String, LlmError> {
        lock(&self.calls).push(MockCall {
            prompt: prompt.to_string(),
            temperature,
        });

        if !self.delay.is_zero() {
            sleep(self.delay).await;
        }

        match self.next_reply(prompt) {
            MockReply::Text(text) => Ok(text),
            MockReply::Error(err) => Err(err),
        }
    }

    fn model_name(&self) -> &str {
        "mock-model-1"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn returns_queued_responses_in_order_then_fallback() {
        let gateway = MockLlmGateway::new().with_response("one").with_response("two");
        assert_eq!(gateway.invoke("a", None).await.unwrap(), "one");
        assert_eq!(gateway.invoke("b", None).await.unwrap(), "two");
        assert_eq!(gateway.invoke("c", None).await.unwrap(), "Mock response");
    }

    #[tokio::test]
    async fn rules_take_precedence_and_are_not_consumed() {
        let gateway = MockLlmGateway::new()
            .with_rule("classify", r#"{"handler": "quiz"}"#)
            .with_response("queued");
        assert_eq!(gateway.invoke("please classify", None).await.unwrap(), r#"{"handler": "quiz"}"#);
        assert_eq!(gateway.invoke("classify again", None).await.unwrap(), r#"{"handler": "quiz"}"#);
        assert_eq!(gateway.invoke("other", None).await.unwrap(), "queued");
    }

    #[tokio::test]
    async fn returns_configured_error() {
        let gateway = MockLlmGateway::new().with_error(LlmError::timeout(30));
        assert!(gateway.invoke("x", None).await.unwrap_err().is_timeout());
    }

    #[tokio::test]
    async fn failing_gateway_fails_everything() {
        let gateway = MockLlmGateway::failing(LlmError::unavailable("down"));
        assert!(gateway.invoke("x", None).await.is_err());
        assert!(gateway.invoke("y", None).await.is_err());
    }

    #[tokio::test]
    async fn tracks_calls_with_temperature() {
        let gateway = MockLlmGateway::new();
        gateway.invoke("first", Some(0.1)).await.unwrap();
        gateway.invoke("second", None).await.unwrap();
        let calls = gateway.get_calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].temperature, Some(0.1));
        assert_eq!(gateway.calls_containing("sec"), 1);
        gateway.clear_calls();
        assert_eq!(gateway.call_count(), 0);
    }

    #[tokio::test]
    async fn clones_share_state() {
        let gateway = MockLlmGateway::new().with_response("shared");
        let clone = gateway.clone();
        assert_eq!(clone.invoke("x", None).await.unwrap(), "shared");
        assert_eq!(gateway.call_count(), 1);
    }

    #[tokio::test]
    async fn respects_delay() {
        let gateway = MockLlmGateway::new().with_delay(Duration::from_millis(20));
        let start = std::time::Instant::now();
        gateway.invoke("x", None).await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(20));
    }
}
