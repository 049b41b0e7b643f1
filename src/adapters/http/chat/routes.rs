//! HTTP routes for the turn API.

use axum::{
    routing::{delete, get, post},
    Router,
};

use super::handlers::{create_session, delete_session, health, post_chat, ChatHandlers};

/// Creates the chat router with all endpoints.
pub fn chat_routes(handlers: ChatHandlers) -> Router {
    Router::new()
        .route("/api/chat", post(post_chat))
        .route("/api/sessions", post(create_session))
        .route("/api/sessions/:id", delete(delete_session))
        .route("/health", get(health))
        .with_state(handlers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::storage::InMemorySessionStore;
    use crate::application::dispatch::test_support::StubHandler;
    use crate::application::{Dispatcher, HandlerRegistry, TurnOrchestrator};
    use crate::domain::foundation::SessionKey;
    use crate::ports::SessionStore;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tower::ServiceExt;

    // ───────────────────────────────────────────────────────────────
    // Test fixtures
    // ───────────────────────────────────────────────────────────────

    fn app_with_store(store: Arc<InMemorySessionStore>) -> Router {
        let registry = HandlerRegistry::new(Arc::new(StubHandler::new("default_chat")))
            .register(Arc::new(StubHandler::new("quiz").with_triggers(&["quiz"])));
        let orchestrator = TurnOrchestrator::new(store, Arc::new(Dispatcher::new(registry)));
        chat_routes(ChatHandlers::new(Arc::new(orchestrator)))
    }

    fn app() -> Router {
        app_with_store(Arc::new(InMemorySessionStore::new()))
    }

    fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    // ───────────────────────────────────────────────────────────────
    // Tests
    // ───────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn chat_without_session_starts_one() {
        let response = app()
            .oneshot(json_request("POST", "/api/chat", json!({"message": "hello"})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert!(!body["session_id"].as_str().unwrap().is_empty());
        assert_eq!(body["kind"], "chat");
        assert_eq!(body["message"], "default_chat handled");
        assert_eq!(body["meta"]["handler"], "default_chat");
        assert_eq!(body["meta"]["session_persisted"], true);
    }

    #[tokio::test]
    async fn chat_keeps_given_session_and_persists_it() {
        let store = Arc::new(InMemorySessionStore::new());
        let response = app_with_store(store.clone())
            .oneshot(json_request(
                "POST",
                "/api/chat",
                json!({"session_id": "abc-1", "message": "give me a quiz"}),
            ))
            .await
            .unwrap();

        let body = body_json(response).await;
        assert_eq!(body["session_id"], "abc-1");
        assert_eq!(body["meta"]["handler"], "quiz");

        let key = SessionKey::new("abc-1").unwrap();
        let session = store.get(&key).await.unwrap().unwrap();
        assert_eq!(session.history.len(), 2);
    }

    #[tokio::test]
    async fn context_mode_overrides_routing() {
        let response = app()
            .oneshot(json_request(
                "POST",
                "/api/chat",
                json!({"message": "hello there", "context": {"mode": "quiz"}}),
            ))
            .await
            .unwrap();

        let body = body_json(response).await;
        assert_eq!(body["meta"]["handler"], "quiz");
        assert_eq!(body["meta"]["route"], "override");
    }

    #[tokio::test]
    async fn empty_message_is_rejected() {
        let response = app()
            .oneshot(json_request("POST", "/api/chat", json!({"message": "   "})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["code"], "BAD_REQUEST");
        assert!(body["message"].as_str().unwrap().contains("empty"));
    }

    #[tokio::test]
    async fn blank_session_id_is_rejected() {
        let response = app()
            .oneshot(json_request(
                "POST",
                "/api/chat",
                json!({"session_id": " ", "message": "hi"}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn create_session_returns_fresh_key() {
        let response = app()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/sessions")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        let body = body_json(response).await;
        assert_eq!(body["session_id"].as_str().unwrap().len(), 36);
    }

    #[tokio::test]
    async fn delete_session_removes_state() {
        let store = Arc::new(InMemorySessionStore::new());
        let app = app_with_store(store.clone());

        app.clone()
            .oneshot(json_request(
                "POST",
                "/api/chat",
                json!({"session_id": "gone", "message": "hi"}),
            ))
            .await
            .unwrap();
        let response = app
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri("/api/sessions/gone")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        let key = SessionKey::new("gone").unwrap();
        assert!(store.get(&key).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn health_lists_handlers_with_default_last() {
        let response = app()
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["handlers"], json!(["quiz", "default_chat"]));
    }
}
