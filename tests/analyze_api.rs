use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use contract_tracker::analyzer::{
    build_analyzer, AnalyzerConfig, DocumentAnalysisResponse, ANALYSIS_FAILURE_MESSAGE,
    NOTHING_FOUND_MESSAGE, PARSE_FAILURE_MESSAGE,
};
use contract_tracker::reminders::LogNotifier;
use contract_tracker::store::MemoryContractStore;
use contract_tracker::{create_app, AppState};
use httpmock::prelude::*;
use serde_json::json;
use tower::ServiceExt;

const SERVICE_AGREEMENT: &str = "Service Agreement - This agreement is made on February 10, 2024, \
    between Global Corp and Tech Innovations LLC. The contract term is 12 months from the \
    effective date. Services include software development and maintenance as detailed in Schedule A.";

const GENERATE_PATH: &str = "/v1beta/models/gemini-2.0-flash:generateContent";

fn llm_app(server: &MockServer) -> Router {
    let config = AnalyzerConfig {
        api_key: Some("test-key".to_string()),
        model: "gemini-2.0-flash".to_string(),
        base_url: server.base_url(),
        timeout_secs: 5,
    };
    let state = AppState::new(
        Arc::new(MemoryContractStore::new()),
        build_analyzer(&config),
        Arc::new(LogNotifier),
    );
    create_app(state)
}

fn model_reply(text: &str) -> serde_json::Value {
    json!({
        "candidates": [{
            "content": { "role": "model", "parts": [{ "text": text }] },
            "finishReason": "STOP"
        }]
    })
}

async fn analyze(app: Router, text: &str) -> (StatusCode, Option<DocumentAnalysisResponse>) {
    let req = Request::post("/api/analyze-document")
        .header("content-type", "application/json")
        .body(Body::from(
            serde_json::to_vec(&json!({ "document_text": text })).unwrap(),
        ))
        .unwrap();
    let res = app.oneshot(req).await.unwrap();
    let status = res.status();
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).ok())
}

#[tokio::test]
async fn test_rules_only_service_agreement() {
    let app = create_app(AppState::in_memory());
    let (status, body) = analyze(app, SERVICE_AGREEMENT).await;
    let body = body.unwrap();
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.contract_date.as_deref(), Some("2024-02-10"));
    assert_eq!(body.contract_tenure.as_deref(), Some("12 months"));
    assert_eq!(body.expiry_date.as_deref(), Some("2025-02-10"));
    assert!(body.error.is_none());
}

#[tokio::test]
async fn test_rules_only_nothing_found() {
    let app = create_app(AppState::in_memory());
    let (status, body) = analyze(app, "Lorem ipsum dolor sit amet.").await;
    let body = body.unwrap();
    assert_eq!(status, StatusCode::OK);
    assert!(body.contract_date.is_none());
    assert!(body.expiry_date.is_none());
    assert_eq!(body.error.as_deref(), Some(NOTHING_FOUND_MESSAGE));
}

#[tokio::test]
async fn test_empty_document_rejected() {
    let app = create_app(AppState::in_memory());
    let (status, _) = analyze(app, "   ").await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_llm_reply_with_code_fence() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path(GENERATE_PATH)
                .header("x-goog-api-key", "test-key")
                .body_contains("Tech Innovations LLC");
            then.status(200).json_body(model_reply(
                "```json\n{\"contractDate\": \"2024-01-31\", \"contractTenure\": \"1 month\"}\n```",
            ));
        })
        .await;

    let (status, body) = analyze(llm_app(&server), SERVICE_AGREEMENT).await;
    let body = body.unwrap();

    mock.assert_async().await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.contract_date.as_deref(), Some("2024-01-31"));
    assert_eq!(body.contract_tenure.as_deref(), Some("1 month"));
    // Month-end clamps instead of overflowing into March
    assert_eq!(body.expiry_date.as_deref(), Some("2024-02-29"));
}

#[tokio::test]
async fn test_llm_null_tenure_leaves_expiry_unset() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path(GENERATE_PATH);
            then.status(200).json_body(model_reply(
                "{\"contractDate\": \"2024-06-01\", \"contractTenure\": null}",
            ));
        })
        .await;

    let (_, body) = analyze(llm_app(&server), "Signed 2024-06-01.").await;
    let body = body.unwrap();
    assert_eq!(body.contract_date.as_deref(), Some("2024-06-01"));
    assert!(body.contract_tenure.is_none());
    assert!(body.expiry_date.is_none());
    assert!(body.error.is_none());
}

#[tokio::test]
async fn test_llm_upstream_error_falls_back_to_rules() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST).path(GENERATE_PATH);
            then.status(500).body("internal error");
        })
        .await;

    let (status, body) = analyze(llm_app(&server), SERVICE_AGREEMENT).await;
    let body = body.unwrap();

    mock.assert_async().await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.expiry_date.as_deref(), Some("2025-02-10"));
    assert!(body.error.is_none());
}

#[tokio::test]
async fn test_llm_upstream_error_reported_when_rules_find_nothing() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path(GENERATE_PATH);
            then.status(503);
        })
        .await;

    let (status, body) = analyze(llm_app(&server), "Lorem ipsum dolor sit amet.").await;
    let body = body.unwrap();
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.error.as_deref(), Some(ANALYSIS_FAILURE_MESSAGE));
}

#[tokio::test]
async fn test_llm_unparseable_reply_reported() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path(GENERATE_PATH);
            then.status(200)
                .json_body(model_reply("I could not find any dates in this text."));
        })
        .await;

    let (status, body) = analyze(llm_app(&server), "Lorem ipsum dolor sit amet.").await;
    let body = body.unwrap();
    assert_eq!(status, StatusCode::OK);
    assert!(body.contract_date.is_none());
    assert_eq!(body.error.as_deref(), Some(PARSE_FAILURE_MESSAGE));
}

#[tokio::test]
async fn test_llm_datetime_start_still_yields_expiry() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path(GENERATE_PATH);
            then.status(200).json_body(model_reply(
                "{\"contractDate\": \"2024-02-10T00:00:00\", \"contractTenure\": \"12 months\"}",
            ));
        })
        .await;

    let (status, body) = analyze(llm_app(&server), SERVICE_AGREEMENT).await;
    let body = body.unwrap();
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.contract_date.as_deref(), Some("2024-02-10T00:00:00"));
    assert_eq!(body.expiry_date.as_deref(), Some("2025-02-10"));
    assert!(body.error.is_none());
}
