//! Risk managing - Multi-turn trade risk analysis.
//!
//! Gathers facts over several turns until the readiness policy is
//! satisfied, then runs the full analysis and returns a report:
//!
//! ```text
//! Idle/Gathering --(not ready)--> Gathering
//! Idle/Gathering --(ready)------> Ready -> Analyzing -> Done
//! ```

mod analysis;

pub use analysis::RiskAnalyzer;

use std::sync::Arc;

use async_trait::async_trait;

use crate::application::readiness::ReadinessAssessor;
use crate::domain::foundation::StateMachine;
use crate::domain::readiness::ReadinessPolicy;
use crate::domain::response::HandlerResponse;
use crate::domain::session::{ChatTurn, HandlerPhase, HandlerState, TurnRole};
use crate::ports::{
    DocumentRetriever, Handler, HandlerError, HandlerInput, HandlerOutput, HandlerProfile,
    LlmGateway,
};

pub const RISK_ID: &str = "riskmanaging";

const DEFAULT_SEARCH_K: usize = 10;

pub struct RiskManagingHandler {
    assessor: ReadinessAssessor,
    analyzer: RiskAnalyzer,
    profile: HandlerProfile,
}

impl RiskManagingHandler {
    pub fn new(
        gateway: Arc<dyn LlmGateway>,
        retriever: Arc<dyn DocumentRetriever>,
        policy: ReadinessPolicy,
    ) -> Self {
        Self {
            assessor: ReadinessAssessor::new(gateway.clone(), policy),
            analyzer: RiskAnalyzer::new(gateway, retriever, DEFAULT_SEARCH_K),
            profile: HandlerProfile::new(
                RISK_ID,
                "Analyses trade risks such as shipment delays, claims and contract penalties",
            )
            .with_triggers(&[
                "shipment delay",
                "claim",
                "penalty",
                "risk",
                "delay",
                "damages",
                "countermeasure",
                "similar case",
            ])
            .with_reference_phrases(&[
                "the shipment will arrive late and the buyer may ask for compensation",
                "how much could this contract penalty cost us",
                "what should we do about this trade dispute",
            ]),
        }
    }

    pub fn with_analyzer(mut self, analyzer: RiskAnalyzer) -> Self {
        self.analyzer = analyzer;
        self
    }

    fn gathering_reply(prompts: &[String]) -> String {
        let mut reply = String::from("To assess this risk I need a little more information:\n");
        for prompt in prompts {
            reply.push_str(&format!("- {prompt}\n"));
        }
        reply.trim_end().to_string()
    }

    /// The user's side of the conversation, which is what gets analysed.
    fn situation(history: &[ChatTurn]) -> String {
        history
            .iter()
            .filter(|t| t.role == TurnRole::User)
            .map(|t| t.content.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[async_trait]
impl Handler for RiskManagingHandler {
    fn profile(&self) -> &HandlerProfile {
        &self.profile
    }

    async fn handle(&self, input: HandlerInput) -> Result<HandlerOutput, HandlerError> {
        let assessment = self.assessor.assess(&input.text, &input.history).await;
        let current = input.state.phase;
        let mut data = input.state.data.clone();
        data.insert("extracted_facts".to_string(), assessment.facts.to_json());

        if !assessment.verdict.is_ready {
            let phase = current.transition_to(HandlerPhase::Gathering)?;
            let reply = Self::gathering_reply(&assessment.verdict.missing_field_prompts);
            return Ok(
                HandlerOutput::reply(&input, HandlerResponse::Chat(reply.clone()), reply)
                    .with_state(HandlerState { phase, data }),
            );
        }

        let phase = current
            .transition_to(HandlerPhase::Ready)?
            .transition_to(HandlerPhase::Analyzing)?;
        tracing::info!(phase = ?phase, "risk facts complete; running analysis");

        let situation = Self::situation(&input.history_with_turn());
        let report = self.analyzer.analyze(&situation, &assessment.facts).await;
        let phase = phase.transition_to(HandlerPhase::Done)?;

        let summary = report.response_summary.clone();
        Ok(
            HandlerOutput::reply(&input, HandlerResponse::Report(report.to_value()), summary)
                .with_state(HandlerState { phase, data }),
        )
    }
}
