//! HTTP adapter for the turn API.

mod dto;
mod handlers;
mod routes;

pub use dto::{ChatRequest, ChatResponse, ErrorResponse, HealthResponse, SessionCreatedResponse};
pub use handlers::ChatHandlers;
pub use routes::chat_routes;
