//! Conversational handlers.
//!
//! Each implements the [`Handler`](crate::ports::Handler) port and is
//! registered with the dispatcher in this order: risk, quiz, email. The
//! default chat handler is the fallback.

pub mod default_chat;
pub mod email;
pub mod quiz;
pub mod risk;

pub use default_chat::{DefaultChatHandler, DEFAULT_CHAT_ID};
pub use email::{EmailHandler, EMAIL_ID};
pub use quiz::{QuizHandler, QUIZ_ID};
pub use risk::{RiskAnalyzer, RiskManagingHandler, RISK_ID};
