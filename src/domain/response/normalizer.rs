//! Folds every handler output shape into a [`ResponseEnvelope`].

use super::{EnvelopeKind, HandlerResponse, ResponseEnvelope};
use crate::domain::risk::RiskReport;
use serde_json::Value;

const DEFAULT_PREVIEW_LIMIT: usize = 3;
const PREVIEW_TITLE_CHARS: usize = 80;

/// Stateless normalizer.
///
/// Applying it to an envelope it produced returns the same envelope.
#[derive(Debug, Clone)]
pub struct ResponseNormalizer {
    preview_limit: usize,
}

impl Default for ResponseNormalizer {
    fn default() -> Self {
        Self {
            preview_limit: DEFAULT_PREVIEW_LIMIT,
        }
    }
}

impl ResponseNormalizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of list items rendered into the message preview.
    pub fn with_preview_limit(mut self, limit: usize) -> Self {
        self.preview_limit = limit;
        self
    }

    pub fn normalize(&self, raw: HandlerResponse) -> ResponseEnvelope {
        match raw {
            HandlerResponse::Normalized(envelope) => self.renormalize(envelope),
            HandlerResponse::Chat(text) => match report_in_text(&text) {
                Some(report) => self.report(&report),
                None => ResponseEnvelope::chat(text),
            },
            HandlerResponse::Report(value) => self.report(&value),
            HandlerResponse::Items { intro, items } => self.items(intro, items),
            HandlerResponse::Failure(message) => ResponseEnvelope::error(message),
        }
    }

    /// Report envelopes are re-canonicalized; everything else passes through.
    fn renormalize(&self, envelope: ResponseEnvelope) -> ResponseEnvelope {
        match (&envelope.kind, &envelope.payload) {
            (EnvelopeKind::Report, Some(payload)) => {
                let mut normalized = self.report(payload);
                for (k, v) in envelope.meta {
                    normalized.meta.entry(k).or_insert(v);
                }
                normalized
            }
            _ => envelope,
        }
    }

    fn report(&self, raw: &Value) -> ResponseEnvelope {
        let report = RiskReport::canonicalize(raw);
        let message = report.response_summary.clone();
        let level = report.risk_scoring.overall_risk_level.to_string();
        ResponseEnvelope::report(message, report.to_value()).with_meta("risk_level", level)
    }

    fn items(&self, intro: String, items: Vec<Value>) -> ResponseEnvelope {
        let mut message = intro;
        if !items.is_empty() {
            message.push_str("\n\n");
            let lines: Vec<String> = items
                .iter()
                .take(self.preview_limit)
                .enumerate()
                .map(|(i, item)| format!("{}. {}", i + 1, item_title(item)))
                .collect();
            message.push_str(&lines.join("\n"));
            if items.len() > self.preview_limit {
                message.push_str(&format!("\n(and {} more)", items.len() - self.preview_limit));
            }
        }
        let count = items.len();
        ResponseEnvelope::chat(message)
            .with_meta("item_count", count)
            .with_meta("items", Value::Array(items))
    }
}

/// Text that is itself a report object (has `analysis_id`).
fn report_in_text(text: &str) -> Option<Value> {
    let trimmed = text.trim();
    if !trimmed.starts_with('{') {
        return None;
    }
    let value: Value = serde_json::from_str(trimmed).ok()?;
    value.get("analysis_id")?;
    Some(value)
}

fn item_title(item: &Value) -> String {
    let title = ["question", "title", "text"]
        .iter()
        .find_map(|k| item.get(*k).and_then(Value::as_str))
        .map(str::to_string)
        .unwrap_or_else(|| match item {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        });
    if title.chars().count() > PREVIEW_TITLE_CHARS {
        let cut: String = title.chars().take(PREVIEW_TITLE_CHARS).collect();
        format!("{}...", cut)
    } else {
        title
    }
}
