//! Request and response DTOs for the turn API.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::application::TurnOutcome;
use crate::domain::response::EnvelopeKind;

// ════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════

/// Request to process one conversational turn.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    /// Existing session key; a new session is started when absent.
    #[serde(default)]
    pub session_id: Option<String>,
    pub message: String,
    /// Free-form caller context (`mode`, `email_content`, ...).
    #[serde(default)]
    pub context: Option<Map<String, Value>>,
}

// ════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════

/// Envelope returned for every processed turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub session_id: String,
    pub kind: EnvelopeKind,
    pub message: String,
    pub payload: Option<Value>,
    pub meta: Map<String, Value>,
}

impl From<TurnOutcome> for ChatResponse {
    fn from(outcome: TurnOutcome) -> Self {
        let envelope = outcome.envelope;
        Self {
            session_id: outcome.session_key.to_string(),
            kind: envelope.kind,
            message: envelope.message,
            payload: envelope.payload,
            meta: envelope.meta,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionCreatedResponse {
    pub session_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub handlers: Vec<String>,
}

/// Standard error response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            code: "BAD_REQUEST".to_string(),
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            code: "INTERNAL_ERROR".to_string(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::RouteReason;
    use crate::domain::foundation::{HandlerId, SessionKey};
    use crate::domain::response::ResponseEnvelope;

    #[test]
    fn chat_request_needs_only_a_message() {
        let req: ChatRequest = serde_json::from_str(r#"{"message": "hi"}"#).unwrap();
        assert_eq!(req.message, "hi");
        assert!(req.session_id.is_none());
        assert!(req.context.is_none());
    }

    #[test]
    fn chat_request_reads_context() {
        let json = r#"{"session_id": "abc", "message": "go", "context": {"mode": "quiz"}}"#;
        let req: ChatRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.session_id.as_deref(), Some("abc"));
        assert_eq!(req.context.unwrap()["mode"], "quiz");
    }

    #[test]
    fn chat_response_flattens_the_envelope() {
        let outcome = TurnOutcome {
            session_key: SessionKey::new("s-1").unwrap(),
            envelope: ResponseEnvelope::chat("hello").with_meta("handler", "default_chat"),
            handler: HandlerId::new("default_chat"),
            route_reason: RouteReason::Fallback,
            persisted: true,
        };

        let value = serde_json::to_value(ChatResponse::from(outcome)).unwrap();
        assert_eq!(value["session_id"], "s-1");
        assert_eq!(value["kind"], "chat");
        assert_eq!(value["message"], "hello");
        assert!(value["payload"].is_null());
        assert_eq!(value["meta"]["handler"], "default_chat");
    }

    #[test]
    fn error_response_bad_request_creates_correctly() {
        let error = ErrorResponse::bad_request("Invalid input");
        assert_eq!(error.code, "BAD_REQUEST");
        assert_eq!(error.message, "Invalid input");
    }
}
