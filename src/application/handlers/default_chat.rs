//! Default chat - General trade Q&A, the dispatcher's fallback.

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::response::HandlerResponse;
use crate::domain::session::ChatTurn;
use crate::ports::{Handler, HandlerError, HandlerInput, HandlerOutput, HandlerProfile, LlmGateway};

pub const DEFAULT_CHAT_ID: &str = "default_chat";

const HISTORY_WINDOW: usize = 10;
const CHAT_TEMPERATURE: f32 = 0.7;

const UNAVAILABLE_REPLY: &str = "Sorry, the chat assistant is having a temporary problem. \
     Risk analysis, email help and quizzes are still available from the menu.";

pub struct DefaultChatHandler {
    gateway: Arc<dyn LlmGateway>,
    profile: HandlerProfile,
}

impl DefaultChatHandler {
    pub fn new(gateway: Arc<dyn LlmGateway>) -> Self {
        Self {
            gateway,
            profile: HandlerProfile::new(
                DEFAULT_CHAT_ID,
                "General questions about trade practice and this assistant",
            ),
        }
    }

    fn prompt(input: &HandlerInput) -> String {
        let start = input.history.len().saturating_sub(HISTORY_WINDOW);
        format!(
            "You are a knowledgeable guide for people new to international trade. \
             Answer briefly and plainly.\n\n{}\nUser: {}\nAssistant:",
            ChatTurn::transcript(&input.history[start..]),
            input.text
        )
    }
}

#[async_trait]
impl Handler for DefaultChatHandler {
    fn profile(&self) -> &HandlerProfile {
        &self.profile
    }

    async fn handle(&self, input: HandlerInput) -> Result<HandlerOutput, HandlerError> {
        let reply = match self
            .gateway
            .invoke(&Self::prompt(&input), Some(CHAT_TEMPERATURE))
            .await
        {
            Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
            Ok(_) => UNAVAILABLE_REPLY.to_string(),
            Err(e) => {
                tracing::warn!(error = %e, "default chat falling back to canned reply");
                UNAVAILABLE_REPLY.to_string()
            }
        };

        Ok(HandlerOutput::reply(
            &input,
            HandlerResponse::Chat(reply.clone()),
            reply,
        ))
    }
}
