//! HTTP handlers for the turn API.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use super::dto::{ChatRequest, ChatResponse, ErrorResponse, HealthResponse, SessionCreatedResponse};
use crate::application::{OrchestratorError, TurnCommand, TurnOrchestrator};
use crate::domain::foundation::SessionKey;

// ════════════════════════════════════════════════════════════════════════════
// Handler state
// ════════════════════════════════════════════════════════════════════════════

/// Shared state for the chat endpoints.
#[derive(Clone)]
pub struct ChatHandlers {
    orchestrator: Arc<TurnOrchestrator>,
}

impl ChatHandlers {
    pub fn new(orchestrator: Arc<TurnOrchestrator>) -> Self {
        Self { orchestrator }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// HTTP handlers
// ════════════════════════════════════════════════════════════════════════════

/// POST /api/chat - Process one turn
pub async fn post_chat(
    State(handlers): State<ChatHandlers>,
    Json(request): Json<ChatRequest>,
) -> Response {
    let mut cmd = TurnCommand::new(request.message);

    if let Some(raw) = request.session_id {
        match SessionKey::new(raw) {
            Ok(key) => cmd = cmd.with_session(key),
            Err(e) => {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(ErrorResponse::bad_request(e.to_string())),
                )
                    .into_response();
            }
        }
    }
    if let Some(context) = request.context {
        cmd.context = context;
    }

    match handlers.orchestrator.handle_turn(cmd).await {
        Ok(outcome) => (StatusCode::OK, Json(ChatResponse::from(outcome))).into_response(),
        Err(e) => handle_turn_error(e),
    }
}

/// POST /api/sessions - Allocate a fresh session key
pub async fn create_session(State(handlers): State<ChatHandlers>) -> Response {
    let response = SessionCreatedResponse {
        session_id: handlers.orchestrator.new_session_key().to_string(),
    };
    (StatusCode::CREATED, Json(response)).into_response()
}

/// DELETE /api/sessions/:id - Reset a session
pub async fn delete_session(
    State(handlers): State<ChatHandlers>,
    Path(session_id): Path<String>,
) -> Response {
    let key = match SessionKey::new(session_id) {
        Ok(key) => key,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::bad_request(e.to_string())),
            )
                .into_response();
        }
    };

    match handlers.orchestrator.reset_session(&key).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => {
            tracing::error!(session = %key, error = %e, "failed to reset session");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::internal("Failed to reset session")),
            )
                .into_response()
        }
    }
}

/// GET /health - Liveness and registered handlers
pub async fn health(State(handlers): State<ChatHandlers>) -> Response {
    let response = HealthResponse {
        status: "ok".to_string(),
        handlers: handlers
            .orchestrator
            .dispatcher()
            .registry()
            .ids()
            .into_iter()
            .map(|id| id.to_string())
            .collect(),
    };
    (StatusCode::OK, Json(response)).into_response()
}

// ════════════════════════════════════════════════════════════════════════════
// Error handling
// ════════════════════════════════════════════════════════════════════════════

fn handle_turn_error(error: OrchestratorError) -> Response {
    match error {
        OrchestratorError::EmptyMessage => (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::bad_request("message cannot be empty")),
        )
            .into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_message_maps_to_400() {
        let response = handle_turn_error(OrchestratorError::EmptyMessage);
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
