//! LLM intent classification, the last routing step before the fallback.

use std::sync::Arc;

use serde::Deserialize;

use crate::domain::foundation::HandlerId;
use crate::domain::lenient_json::decode_as;
use crate::ports::LlmGateway;

use super::HandlerRegistry;

const CLASSIFY_TEMPERATURE: f32 = 0.1;
const OUT_OF_SCOPE: &str = "out_of_scope";

#[derive(Debug, Deserialize)]
struct Classification {
    handler: String,
    #[serde(default)]
    reason: String,
}

pub struct IntentClassifier {
    gateway: Arc<dyn LlmGateway>,
}

impl IntentClassifier {
    pub fn new(gateway: Arc<dyn LlmGateway>) -> Self {
        Self { gateway }
    }

    /// Picks a registered handler, or `None` to fall through.
    pub async fn classify(&self, text: &str, registry: &HandlerRegistry) -> Option<(HandlerId, String)> {
        let prompt = classification_prompt(text, registry);

        let reply = match self.gateway.invoke(&prompt, Some(CLASSIFY_TEMPERATURE)).await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::warn!(error = %e, "intent classification failed");
                return None;
            }
        };

        let Some(picked) = decode_as::<Classification>(&reply) else {
            tracing::debug!("intent classification reply did not parse");
            return None;
        };

        let handler = picked.handler.trim();
        if handler == OUT_OF_SCOPE {
            return None;
        }
        let id = HandlerId::new(handler);
        if !registry.contains(&id) {
            tracing::debug!(handler, "classifier picked an unknown handler");
            return None;
        }
        Some((id, picked.reason))
    }
}

impl std::fmt::Debug for IntentClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IntentClassifier")
            .field("model", &self.gateway.model_name())
            .finish()
    }
}

fn classification_prompt(text: &str, registry: &HandlerRegistry) -> String {
    let options: Vec<String> = registry
        .ordered()
        .iter()
        .map(|h| format!("- {}: {}", h.id(), h.profile().description))
        .collect();

    format!(
        "Pick the agent that should answer the user's message.\n\
         Agents:\n{options}\n- {OUT_OF_SCOPE}: none of the above\n\n\
         Reply with JSON only: {{\"handler\": \"<id>\", \"reason\": \"...\"}}\n\n\
         Message: {text}",
        options = options.join("\n"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::ai::MockLlmGateway;
    use crate::application::dispatch::test_support::StubHandler;
    use crate::ports::LlmError;

    fn registry() -> HandlerRegistry {
        HandlerRegistry::new(Arc::new(StubHandler::new("default_chat")))
            .register(Arc::new(StubHandler::new("email")))
    }

    async fn classify(reply: MockLlmGateway) -> Option<(HandlerId, String)> {
        IntentClassifier::new(Arc::new(reply))
            .classify("help me answer my buyer", &registry())
            .await
    }

    #[tokio::test]
    async fn registered_id_is_accepted() {
        let gateway = MockLlmGateway::new()
            .with_response(r#"```json
{"handler": "email", "reason": "writing to a buyer"}
```"#);
        let (id, reason) = classify(gateway).await.unwrap();
        assert_eq!(id.as_str(), "email");
        assert_eq!(reason, "writing to a buyer");
    }

    #[tokio::test]
    async fn out_of_scope_unknown_and_garbage_fall_through() {
        for reply in [
            r#"{"handler": "out_of_scope"}"#,
            r#"{"handler": "weather"}"#,
            "no idea",
        ] {
            assert!(classify(MockLlmGateway::new().with_response(reply)).await.is_none());
        }
    }

    #[tokio::test]
    async fn gateway_error_falls_through() {
        assert!(classify(MockLlmGateway::failing(LlmError::unavailable("down"))).await.is_none());
    }

    #[tokio::test]
    async fn prompt_lists_agents_at_low_temperature() {
        let gateway = MockLlmGateway::new();
        classify(gateway.clone()).await;
        let calls = gateway.get_calls();
        assert_eq!(calls[0].temperature, Some(0.1));
        assert!(calls[0].prompt.contains("- email: email stub"));
        assert!(calls[0].prompt.contains("out_of_scope"));
    }
}
