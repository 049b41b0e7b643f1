//! HTTP tests for the fully wired service in its offline configuration.
//!
//! No API key and no Redis URL: the gateway fails every call, so every
//! handler answers from its fallback path.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use trade_assist::adapters::http::{build_router, ChatHandlers};
use trade_assist::bootstrap::build_orchestrator;
use trade_assist::config::AppConfig;

async fn app() -> Router {
    let config = AppConfig::default();
    let orchestrator = build_orchestrator(&config).await.unwrap();
    build_router(ChatHandlers::new(Arc::new(orchestrator)), &config.server)
}

async fn post_chat(app: &Router, body: Value) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/chat")
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn health_lists_builtin_handlers() {
    let response = app()
        .await
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(
        body["handlers"],
        json!(["riskmanaging", "quiz", "email", "default_chat"])
    );
}

#[tokio::test]
async fn risk_turn_without_model_asks_to_retry_and_keeps_the_flow() {
    let app = app().await;

    let (status, first) = post_chat(&app, json!({"message": "We have a shipment delay"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["kind"], "chat");
    assert_eq!(first["meta"]["handler"], "riskmanaging");
    assert_eq!(first["meta"]["route"], "keyword");
    assert_eq!(first["meta"]["session_persisted"], true);

    let session_id = first["session_id"].as_str().unwrap().to_string();
    let (_, second) = post_chat(
        &app,
        json!({"session_id": session_id, "message": "the contract was $50k"}),
    )
    .await;
    assert_eq!(second["session_id"], session_id.as_str());
    assert_eq!(second["meta"]["handler"], "riskmanaging");
    assert_eq!(second["meta"]["route"], "continuation");
}

#[tokio::test]
async fn general_turn_gets_a_canned_reply() {
    let app = app().await;
    let (status, body) = post_chat(&app, json!({"message": "good morning"})).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["kind"], "chat");
    assert_eq!(body["meta"]["handler"], "default_chat");
    assert!(!body["message"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn empty_message_is_a_bad_request() {
    let app = app().await;
    let (status, body) = post_chat(&app, json!({"message": ""})).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn reset_session_returns_no_content() {
    let app = app().await;
    let (_, first) = post_chat(&app, json!({"message": "We have a shipment delay"})).await;
    let session_id = first["session_id"].as_str().unwrap();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/api/sessions/{session_id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    // After a reset the same key starts over and is routed afresh.
    let (_, again) = post_chat(
        &app,
        json!({"session_id": session_id, "message": "good morning"}),
    )
    .await;
    assert_eq!(again["meta"]["handler"], "default_chat");
}
