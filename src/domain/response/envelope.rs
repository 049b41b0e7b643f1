//! Response envelope and raw handler output.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Discriminator of the envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnvelopeKind {
    Chat,
    Report,
    Error,
}

/// Uniform shape returned to clients for every turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    pub kind: EnvelopeKind,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
    #[serde(default)]
    pub meta: Map<String, Value>,
}

impl ResponseEnvelope {
    pub fn chat(message: impl Into<String>) -> Self {
        Self {
            kind: EnvelopeKind::Chat,
            message: message.into(),
            payload: None,
            meta: Map::new(),
        }
    }

    pub fn report(message: impl Into<String>, payload: Value) -> Self {
        Self {
            kind: EnvelopeKind::Report,
            message: message.into(),
            payload: Some(payload),
            meta: Map::new(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: EnvelopeKind::Error,
            message: message.into(),
            payload: None,
            meta: Map::new(),
        }
    }

    /// Adds or replaces a metadata entry.
    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.meta.insert(key.into(), value.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.kind == EnvelopeKind::Error
    }
}

/// What a handler hands back before normalization.
#[derive(Debug, Clone, PartialEq)]
pub enum HandlerResponse {
    /// Plain conversational text.
    Chat(String),
    /// Structured analysis, in any known report shape.
    Report(Value),
    /// A generated list, such as quiz questions.
    Items { intro: String, items: Vec<Value> },
    /// User-safe failure text.
    Failure(String),
    /// Already an envelope; passed through untouched.
    Normalized(ResponseEnvelope),
}
