//! OpenAI-compatible chat gateway.
//!
//! One user message per call against `/chat/completions`, with a client
//! timeout and bounded exponential backoff on transient failures.
//!
//! # Configuration
//!
//! ```ignore
//! let config = OpenAiConfig::new(api_key)
//!     .with_model("gpt-4o-mini")
//!     .with_base_url("https://api.openai.com/v1");
//!
//! let gateway = OpenAiGateway::new(config)?;
//! ```

use async_trait::async_trait;
use reqwest::{Client, Response};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::backoff::Backoff;
use crate::ports::{LlmError, LlmGateway};

/// Connection settings shared by the chat gateway and the embedder.
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    api_key: Secret<String>,
    pub model: String,
    pub base_url: String,
    pub timeout: Duration,
    pub backoff: Backoff,
}

impl OpenAiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Secret::new(api_key.into()),
            model: "gpt-4o-mini".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            timeout: Duration::from_secs(60),
            backoff: Backoff::default(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.backoff.max_attempts = max_attempts;
        self
    }

    /// Overrides the backoff schedule (tests use millisecond delays).
    pub fn with_backoff(mut self, base: Duration, cap: Duration) -> Self {
        self.backoff.base = base;
        self.backoff.cap = cap;
        self
    }

    fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }

    pub(crate) fn build_client(&self) -> Result<Client, LlmError> {
        Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| LlmError::InvalidRequest(format!("Failed to create HTTP client: {}", e)))
    }

    /// Sends a JSON POST to `{base_url}/{path}` with bearer auth.
    pub(crate) async fn post_json<B: Serialize + ?Sized>(
        &self,
        client: &Client,
        path: &str,
        body: &B,
    ) -> Result<Response, LlmError> {
        let response = client
            .post(format!("{}/{}", self.base_url, path))
            .header("Authorization", format!("Bearer {}", self.api_key()))
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::timeout(self.timeout.as_secs())
                } else if e.is_connect() {
                    LlmError::network(format!("Connection failed: {}", e))
                } else {
                    LlmError::network(e.to_string())
                }
            })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(status_error(status.as_u16(), body))
    }
}

/// Maps a non-success status to an error.
pub(crate) fn status_error(status: u16, body: String) -> LlmError {
    match status {
        401 | 403 => LlmError::AuthenticationFailed,
        408 => LlmError::timeout(0),
        429 => LlmError::rate_limited(parse_retry_after(&body)),
        400..=499 => LlmError::InvalidRequest(body),
        500..=599 => LlmError::unavailable(format!("Server error {}: {}", status, body)),
        _ => LlmError::network(format!("Unexpected status {}: {}", status, body)),
    }
}

/// Reads "try again in Ns" from an error body; defaults to 30.
fn parse_retry_after(error_body: &str) -> u32 {
    if let Ok(parsed) = serde_json::from_str::<serde_json::Value>(error_body) {
        if let Some(s) = parsed
            .get("error")
            .and_then(|e| e.get("message"))
            .and_then(|m| m.as_str())
        {
            if let Some(idx) = s.find("try again in ") {
                let rest = &s[idx + 13..];
                let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
                if let Ok(secs) = digits.parse::<u32>() {
                    return secs;
                }
            }
        }
    }
    30
}

/// Chat gateway against an OpenAI-compatible endpoint.
pub struct OpenAiGateway {
    config: OpenAiConfig,
    client: Client,
}

impl OpenAiGateway {
    pub fn new(config: OpenAiConfig) -> Result<Self, LlmError> {
        let client = config.build_client()?;
        Ok(Self { config, client })
    }

    async fn invoke_once(&self, request: &ChatRequest<'_>) -> Result<String, LlmError> {
        let response = self
            .config
            .post_json(&self.client, "chat/completions", request)
            .await?;

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| LlmError::parse(format!("Failed to parse response: {}", e)))?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content.unwrap_or_default())
            .ok_or_else(|| LlmError::parse("No choices in response"))
    }
}

#[async_trait]
impl LlmGateway for OpenAiGateway {
    async fn invoke(&self, prompt: &str, temperature: Option<f32>) -> Result<String, LlmError> {
        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature,
        };
        self.config
            .backoff
            .run(|| self.invoke_once(&request))
            .await
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

impl std::fmt::Debug for OpenAiGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiGateway")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

// ----- OpenAI API Types -----

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode, routing::post, Json, Router};
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    /// Serves `/chat/completions`, failing with `fail_status` for the first
    /// `failures` calls.
    async fn spawn_server(failures: u32, fail_status: StatusCode) -> (String, Arc<AtomicU32>) {
        let hits = Arc::new(AtomicU32::new(0));
        let counter = hits.clone();
        let app = Router::new().route(
            "/chat/completions",
            post(move |Json(body): Json<Value>| {
                let counter = counter.clone();
                async move {
                    let n = counter.fetch_add(1, Ordering::SeqCst);
                    if n < failures {
                        return (fail_status, Json(json!({"error": {"message": "nope"}})));
                    }
                    let prompt = body["messages"][0]["content"].as_str().unwrap_or("").to_string();
                    (
                        StatusCode::OK,
                        Json(json!({"choices": [{"message": {"role": "assistant", "content": format!("echo: {prompt}")}}]})),
                    )
                }
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{}", addr), hits)
    }

    fn gateway(base_url: &str) -> OpenAiGateway {
        let config = OpenAiConfig::new("test-key")
            .with_base_url(base_url)
            .with_timeout(Duration::from_secs(5))
            .with_backoff(Duration::from_millis(1), Duration::from_millis(5));
        OpenAiGateway::new(config).unwrap()
    }

    #[test]
    fn config_builder_works() {
        let config = OpenAiConfig::new("test-key")
            .with_model("gpt-4o")
            .with_base_url("https://custom.api.com/")
            .with_timeout(Duration::from_secs(30))
            .with_max_attempts(5);

        assert_eq!(config.model, "gpt-4o");
        assert_eq!(config.base_url, "https://custom.api.com");
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.backoff.max_attempts, 5);
        assert_eq!(config.api_key(), "test-key");
        assert!(!format!("{:?}", config).contains("test-key"));
    }

    #[test]
    fn status_mapping() {
        assert_eq!(status_error(401, String::new()), LlmError::AuthenticationFailed);
        assert!(matches!(status_error(400, "bad".into()), LlmError::InvalidRequest(_)));
        assert!(status_error(503, String::new()).is_retryable());
        assert_eq!(status_error(429, String::new()), LlmError::rate_limited(30));
    }

    #[test]
    fn parse_retry_after_from_message() {
        let body = r#"{"error": {"message": "Rate limit reached. Please try again in 7s."}}"#;
        assert_eq!(parse_retry_after(body), 7);
        assert_eq!(parse_retry_after("not json"), 30);
    }

    #[tokio::test]
    async fn invoke_returns_first_choice() {
        let (url, hits) = spawn_server(0, StatusCode::OK).await;
        let reply = gateway(&url).invoke("hello", Some(0.2)).await.unwrap();
        assert_eq!(reply, "echo: hello");
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn invoke_retries_server_errors() {
        let (url, hits) = spawn_server(2, StatusCode::BAD_GATEWAY).await;
        let reply = gateway(&url).invoke("again", None).await.unwrap();
        assert_eq!(reply, "echo: again");
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn invoke_gives_up_after_three_attempts() {
        let (url, hits) = spawn_server(10, StatusCode::SERVICE_UNAVAILABLE).await;
        let err = gateway(&url).invoke("x", None).await.unwrap_err();
        assert!(matches!(err, LlmError::Unavailable { .. }));
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn auth_failure_is_not_retried() {
        let (url, hits) = spawn_server(10, StatusCode::UNAUTHORIZED).await;
        let err = gateway(&url).invoke("x", None).await.unwrap_err();
        assert_eq!(err, LlmError::AuthenticationFailed);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }
}
