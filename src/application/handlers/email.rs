//! Email coach - Drafts new trade emails or reviews existing ones.
//!
//! Review mode runs reference retrieval, rule-based risk detection, unit
//! consistency checks and tone analysis concurrently, then asks the model for
//! a rewrite. Draft mode
//! retrieves templates and asks the model for a new email. Both modes are
//! single-turn.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use crate::domain::email::{
    checklist, heuristic_tone, EmailRisk, EmailRiskDetector, ToneAnalysis, UnitReport, UnitValidator,
};
use crate::domain::lenient_json::decode_as;
use crate::domain::response::{HandlerResponse, ResponseEnvelope};
use crate::ports::{
    DocumentRetriever, Handler, HandlerError, HandlerInput, HandlerOutput, HandlerProfile,
    LlmGateway, RetrievedDocument,
};

pub const EMAIL_ID: &str = "email";

const MISTAKE_DOC_TYPE: &str = "common_mistake";
const TEMPLATE_DOC_TYPE: &str = "email";
const MISTAKE_K: usize = 5;
const TEMPLATE_K: usize = 3;
const GOOD_TONE_SCORE: f32 = 8.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EmailMode {
    Draft,
    Review,
}

impl EmailMode {
    fn as_str(&self) -> &'static str {
        match self {
            EmailMode::Draft => "draft",
            EmailMode::Review => "review",
        }
    }
}

pub struct EmailHandler {
    gateway: Arc<dyn LlmGateway>,
    retriever: Arc<dyn DocumentRetriever>,
    detector: EmailRiskDetector,
    units: UnitValidator,
    profile: HandlerProfile,
}

impl EmailHandler {
    pub fn new(gateway: Arc<dyn LlmGateway>, retriever: Arc<dyn DocumentRetriever>) -> Self {
        Self {
            gateway,
            retriever,
            detector: EmailRiskDetector::new(),
            units: UnitValidator::new(),
            profile: HandlerProfile::new(EMAIL_ID, "Drafts or reviews business emails to trade partners")
                .with_triggers(&["email", "reply", "draft", "mail", "review"])
                .with_reference_phrases(&[
                    "help me write a business email to my buyer",
                    "check my email before I send it to the supplier",
                    "how should I reply to this customer message",
                ]),
        }
    }

    fn mode(input: &HandlerInput) -> EmailMode {
        match input.context_str("email_mode") {
            Some("review") => return EmailMode::Review,
            Some("draft") => return EmailMode::Draft,
            _ => {}
        }
        if input.context_str("email_content").is_some() {
            return EmailMode::Review;
        }
        let lower = input.text.to_lowercase();
        if ["review", "check", "proofread", "feedback"].iter().any(|k| lower.contains(k)) {
            EmailMode::Review
        } else {
            EmailMode::Draft
        }
    }

    /// Email body from context, else whatever follows the first line or colon.
    fn email_body(input: &HandlerInput) -> Option<String> {
        if let Some(body) = input.context_str("email_content").filter(|b| !b.trim().is_empty()) {
            return Some(body.trim().to_string());
        }
        let text = input.text.trim();
        let body = match (text.find('\n'), text.find(':')) {
            (Some(nl), _) => &text[nl + 1..],
            (None, Some(colon)) => &text[colon + 1..],
            (None, None) => "",
        };
        let body = body.trim();
        (!body.is_empty()).then(|| body.to_string())
    }

    async fn search(&self, query: &str, k: usize, doc_type: &str) -> Vec<RetrievedDocument> {
        match self.retriever.search(query, k, Some(doc_type)).await {
            Ok(docs) => docs,
            Err(e) => {
                tracing::warn!(error = %e, doc_type, "email reference search failed");
                Vec::new()
            }
        }
    }

    async fn analyze_tone(&self, email: &str) -> ToneAnalysis {
        let prompt = format!(
            "Rate the tone of this business email.\n\
             Reply with JSON only: {{\"current_tone\": \"...\", \"recommended_tone\": \"professional\", \
             \"score\": 0-10, \"issues\": [...], \"improvements\": [...]}}\n\nEmail:\n{email}"
        );
        match self.gateway.invoke(&prompt, Some(0.2)).await {
            Ok(reply) => match decode_as::<ToneAnalysis>(&reply) {
                Some(tone) => ToneAnalysis {
                    score: tone.score.clamp(0.0, 10.0),
                    ..tone
                },
                None => heuristic_tone(email),
            },
            Err(e) => {
                tracing::warn!(error = %e, "tone analysis fell back to keyword heuristic");
                heuristic_tone(email)
            }
        }
    }

    async fn review(&self, input: &HandlerInput) -> HandlerResponse {
        let Some(email) = Self::email_body(input) else {
            return HandlerResponse::Chat(
                "Please paste the email you want reviewed after a colon or on a new line, \
                 or send it as `email_content` in the context."
                    .to_string(),
            );
        };

        let (mistakes, risks, units, tone) = futures::join!(
            self.search(&email, MISTAKE_K, MISTAKE_DOC_TYPE),
            async { self.detector.detect(&email) },
            async { self.units.validate(&email) },
            self.analyze_tone(&email),
        );

        let clean = risks.is_empty() && units.inconsistencies.is_empty();
        let improved = if clean && tone.score >= GOOD_TONE_SCORE {
            None
        } else {
            self.rewrite(&email, &risks, &units, &tone).await
        };

        let sources: Vec<String> = mistakes.iter().map(|d| d.source().to_string()).collect();
        let message = render_review(&risks, &units, &tone, improved.as_deref(), &mistakes);

        HandlerResponse::Normalized(
            ResponseEnvelope::chat(message)
                .with_meta("mode", EmailMode::Review.as_str())
                .with_meta("risks", json!(risks))
                .with_meta("risk_count", risks.len())
                .with_meta("units", json!(units))
                .with_meta("tone", json!(tone))
                .with_meta("sources", json!(sources)),
        )
    }

    async fn rewrite(
        &self,
        email: &str,
        risks: &[EmailRisk],
        units: &UnitReport,
        tone: &ToneAnalysis,
    ) -> Option<String> {
        let mut risk_lines: Vec<String> = risks
            .iter()
            .map(|r| format!("- {}: {}", r.kind, r.recommendation))
            .collect();
        risk_lines.extend(
            units
                .inconsistencies
                .iter()
                .map(|u| format!("- units ({}): {}", u.text, u.suggestion)),
        );
        let prompt = format!(
            "Rewrite this trade email so it is clear and {recommended}.\n\
             Fix these issues:\n{risks}\nTone issues: {tone_issues}\n\n\
             Return only the rewritten email.\n\nEmail:\n{email}",
            recommended = tone.recommended_tone,
            risks = risk_lines.join("\n"),
            tone_issues = tone.issues.join(", "),
        );
        match self.gateway.invoke(&prompt, Some(0.4)).await {
            Ok(text) if !text.trim().is_empty() => Some(text.trim().to_string()),
            Ok(_) => None,
            Err(e) => {
                tracing::warn!(error = %e, "email rewrite unavailable");
                None
            }
        }
    }

    async fn draft(&self, input: &HandlerInput) -> HandlerResponse {
        let situation = input.context_str("situation").unwrap_or_default();
        let query = format!("{} {}", input.text, situation);
        let templates = self.search(query.trim(), TEMPLATE_K, TEMPLATE_DOC_TYPE).await;

        let examples: Vec<&str> = templates.iter().map(|d| d.content.as_str()).collect();
        let prompt = format!(
            "Write a professional trade email for this request.\n\
             Request: {request}\nSituation: {situation}\nRecipient country: {country}\n\n\
             Reference emails:\n{examples}\n\nReturn only the email.",
            request = input.text,
            country = input.context_str("recipient_country").unwrap_or("unspecified"),
            examples = examples.join("\n---\n"),
        );

        let email = match self.gateway.invoke(&prompt, Some(0.5)).await {
            Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
            Ok(_) | Err(_) => {
                tracing::warn!("email draft generation unavailable");
                return HandlerResponse::Failure(
                    "Sorry, I couldn't draft the email right now. Please try again shortly.".to_string(),
                );
            }
        };

        let checks = checklist(&email);
        let mut message = format!("Here is a draft:\n\n{email}\n\nChecklist:\n");
        for c in &checks {
            message.push_str(&format!(
                "- [{}] {}\n",
                if c.present { "x" } else { " " },
                c.item
            ));
        }
        let sources: Vec<String> = templates.iter().map(|d| d.source().to_string()).collect();

        HandlerResponse::Normalized(
            ResponseEnvelope::chat(message.trim_end())
                .with_meta("mode", EmailMode::Draft.as_str())
                .with_meta("checklist", json!(checks))
                .with_meta("sources", json!(sources)),
        )
    }
}

fn render_review(
    risks: &[EmailRisk],
    units: &UnitReport,
    tone: &ToneAnalysis,
    improved: Option<&str>,
    mistakes: &[RetrievedDocument],
) -> String {
    let mut out = String::from("Email review\n\n");

    if risks.is_empty() {
        out.push_str("No risks detected.\n");
    } else {
        out.push_str(&format!("Risks ({}):\n", risks.len()));
        for r in risks {
            let excerpt = r.excerpt.as_deref().map(|e| format!(" \"{e}\"")).unwrap_or_default();
            out.push_str(&format!(
                "- [{:?}] {}{}: {}\n",
                r.severity, r.kind, excerpt, r.recommendation
            ));
        }
    }

    if !units.inconsistencies.is_empty() {
        out.push_str("\nUnits:\n");
        for u in &units.inconsistencies {
            out.push_str(&format!("- {} ({}): {}\n", u.issue, u.text, u.suggestion));
        }
    }
    if !units.standardized.is_empty() {
        out.push_str(&format!("Standard form: {}\n", units.standardized));
    }

    out.push_str(&format!(
        "\nTone: {} ({:.1}/10), recommended: {}\n",
        tone.current_tone, tone.score, tone.recommended_tone
    ));
    for i in &tone.improvements {
        out.push_str(&format!("- {i}\n"));
    }

    if let Some(first) = mistakes.first() {
        out.push_str(&format!("\nSimilar past mistake: {}\n", first.content));
    }

    match improved {
        Some(text) => out.push_str(&format!("\nSuggested rewrite:\n{text}")),
        None if risks.is_empty() && units.inconsistencies.is_empty() => {
            out.push_str("\nThe email is already in good shape.")
        }
        None => out.push_str("\nApply the fixes above before sending."),
    }
    out
}

#[async_trait]
impl Handler for EmailHandler {
    fn profile(&self) -> &HandlerProfile {
        &self.profile
    }

    async fn handle(&self, input: HandlerInput) -> Result<HandlerOutput, HandlerError> {
        let mode = Self::mode(&input);
        tracing::debug!(mode = mode.as_str(), "email handler");

        let response = match mode {
            EmailMode::Review => self.review(&input).await,
            EmailMode::Draft => self.draft(&input).await,
        };
        let reply = match &response {
            HandlerResponse::Normalized(env) => env.message.clone(),
            HandlerResponse::Chat(text) | HandlerResponse::Failure(text) => text.clone(),
            _ => String::new(),
        };
        Ok(HandlerOutput::reply(&input, response, reply))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::ai::{HashingEmbedder, MockLlmGateway};
    use crate::adapters::retrieval::{CorpusDocument, InMemoryRetriever};
    use crate::domain::response::EnvelopeKind;
    use crate::ports::LlmError;
    use serde_json::Map;

    async fn retriever() -> Arc<dyn DocumentRetriever> {
        let doc = |content: &str, doc_type: &str| {
            let mut metadata = Map::new();
            metadata.insert("document_type".into(), doc_type.into());
            metadata.insert("source".into(), "handbook".into());
            CorpusDocument {
                content: content.to_string(),
                metadata,
            }
        };
        Arc::new(
            InMemoryRetriever::from_documents(
                vec![
                    doc("Forgot to state payment terms; buyer paid 90 days late.", MISTAKE_DOC_TYPE),
                    doc("Dear buyer, please find our quotation FOB Busan attached.", TEMPLATE_DOC_TYPE),
                ],
                Arc::new(HashingEmbedder::new()),
            )
            .await
            .unwrap(),
        )
    }

    fn envelope(out: &HandlerOutput) -> &ResponseEnvelope {
        match &out.response {
            HandlerResponse::Normalized(env) => env,
            other => panic!("expected envelope, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn review_combines_rules_tone_and_rewrite() {
        let gateway = MockLlmGateway::new()
            .with_rule("Rate the tone", r#"{"current_tone": "casual", "score": 6, "issues": ["too casual"]}"#)
            .with_rule("Rewrite this trade email", "Dear partner, payment by T/T.");
        let handler = EmailHandler::new(Arc::new(gateway), retriever().await);

        let input = HandlerInput::new("review this:\nhey, payment after delivery. You must hurry.");
        let out = handler.handle(input).await.unwrap();
        let env = envelope(&out);

        assert_eq!(env.kind, EnvelopeKind::Chat);
        assert_eq!(env.meta["mode"], "review");
        assert!(env.meta["risk_count"].as_u64().unwrap() >= 2);
        assert_eq!(env.meta["tone"]["current_tone"], "casual");
        assert!(env.message.contains("Suggested rewrite:\nDear partner, payment by T/T."));
        assert_eq!(out.history.len(), 2);
    }

    #[tokio::test]
    async fn review_survives_model_outage() {
        let handler = EmailHandler::new(
            Arc::new(MockLlmGateway::failing(LlmError::unavailable("down"))),
            retriever().await,
        );
        let mut input = HandlerInput::new("please check my email");
        input.context.insert("email_content".into(), "Dear Mr. Lee, you must pay immediately, urgent!".into());
        let out = handler.handle(input).await.unwrap();
        let env = envelope(&out);

        assert_eq!(env.meta["tone"]["current_tone"], "aggressive");
        assert!(env.message.contains("Apply the fixes above"));
    }

    #[tokio::test]
    async fn review_without_body_asks_for_it() {
        let handler = EmailHandler::new(Arc::new(MockLlmGateway::new()), retriever().await);
        let out = handler.handle(HandlerInput::new("review my email")).await.unwrap();
        assert!(matches!(out.response, HandlerResponse::Chat(ref t) if t.contains("paste the email")));
    }

    #[tokio::test]
    async fn draft_adds_checklist() {
        let gateway = MockLlmGateway::new()
            .with_rule("Write a professional trade email", "Dear buyer, 100 pcs FOB Busan, payment by L/C.");
        let handler = EmailHandler::new(Arc::new(gateway), retriever().await);
        let out = handler
            .handle(HandlerInput::new("draft an email offering our product"))
            .await
            .unwrap();
        let env = envelope(&out);

        assert_eq!(env.meta["mode"], "draft");
        assert_eq!(env.meta["checklist"].as_array().unwrap().len(), 5);
        assert!(env.message.contains("- [x] Payment terms"));
        assert_eq!(env.meta["sources"][0], "handbook");
    }

    #[tokio::test]
    async fn draft_failure_is_user_safe() {
        let handler = EmailHandler::new(
            Arc::new(MockLlmGateway::failing(LlmError::timeout(60))),
            retriever().await,
        );
        let out = handler.handle(HandlerInput::new("draft a reply")).await.unwrap();
        assert!(matches!(out.response, HandlerResponse::Failure(_)));
    }

    #[tokio::test]
    async fn review_reports_mixed_units() {
        let gateway = MockLlmGateway::new()
            .with_rule("Rate the tone", r#"{"current_tone": "professional", "score": 9}"#)
            .with_rule("Rewrite this trade email", "Dear partner, 20 MT (20,000 kg) in 1x40HC.");
        let handler = EmailHandler::new(Arc::new(gateway.clone()), retriever().await);

        let mut input = HandlerInput::new("please check");
        input.context.insert(
            "email_content".into(),
            "Dear Ms. Park, we load 20 ton, net 18000 kg, in 1x40HC. Kind regards".into(),
        );
        let out = handler.handle(input).await.unwrap();
        let env = envelope(&out);

        assert_eq!(env.meta["units"]["inconsistencies"].as_array().unwrap().len(), 1);
        assert_eq!(env.meta["units"]["unit_summary"]["container"][0], "1X40HC");
        assert!(env.message.contains("Units:\n- Mixed weight units"));
        assert!(env.message.contains("Standard form: 20 MT (20,000 kg), 1X40HC"));
        // A clean tone alone would skip the rewrite; the unit issue forces it.
        assert_eq!(gateway.calls_containing("units (20 ton, 18000 kg)"), 1);
    }

    #[test]
    fn mode_prefers_context_then_keywords() {
        let mut input = HandlerInput::new("review this");
        input.context.insert("email_mode".into(), "draft".into());
        assert_eq!(EmailHandler::mode(&input), EmailMode::Draft);
        assert_eq!(EmailHandler::mode(&HandlerInput::new("check my mail")), EmailMode::Review);
        assert_eq!(EmailHandler::mode(&HandlerInput::new("write an email")), EmailMode::Draft);
    }
}
