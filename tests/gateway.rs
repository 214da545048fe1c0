//! End-to-end scenarios from spec §8 (S1-S6), driven against the real axum
//! router via `tower::ServiceExt::oneshot` with a `wiremock` stub standing in
//! for the engine — the same "stub engine returns a fixed body" pattern the
//! spec's own scenarios describe.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use vllm_gateway::blob_store::BlobStore;
use vllm_gateway::config::Config;
use vllm_gateway::engine_client::EngineClient;
use vllm_gateway::http::router;
use vllm_gateway::registry::BatchRegistry;
use vllm_gateway::scheduler::{QueueConfig, Scheduler};
use vllm_gateway::state::AppState;
use vllm_gateway::tokenizer::Tokenizer;
use vllm_gateway::types::batch::BatchStatus;

async fn build_state(engine_base_url: String, api_token: &str) -> (Arc<AppState>, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let engine = EngineClient::new(engine_base_url, Duration::from_secs(5));
    let scheduler = Scheduler::new(engine.clone(), QueueConfig::INTERACTIVE, QueueConfig::BATCH);
    let blob_store = BlobStore::new(dir.path()).unwrap();

    let mut config = Config::from_env();
    config.api_token = api_token.to_string();

    let state = Arc::new(AppState {
        config,
        engine,
        scheduler,
        blob_store,
        batches: BatchRegistry::new(),
        tokenizer: Tokenizer::load(),
    });
    (state, dir)
}

fn auth_header(token: &str) -> String {
    format!("Bearer {token}")
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// S1. No Authorization header with auth configured -> 401 with the
/// FastAPI-matching envelope.
#[tokio::test]
async fn auth_negative_returns_401() {
    let (state, _dir) = build_state("http://127.0.0.1:1".to_string(), "secret").await;
    let app = router(state);

    let request = Request::builder()
        .method("POST")
        .uri("/v1/chat/completions")
        .header("content-type", "application/json")
        .body(Body::from(json!({"model": "qwen3-4b", "messages": []}).to_string()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body, json!({"error": "Unauthorized"}));
}

/// S2. Stub engine always returns a fixed completion; the gateway returns it
/// unmodified.
#[tokio::test]
async fn interactive_happy_path() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"role": "assistant", "content": "hi"}}],
            "usage": {"prompt_tokens": 3, "completion_tokens": 1},
        })))
        .mount(&server)
        .await;

    let (state, _dir) = build_state(server.uri(), "").await;
    let app = router(state);

    let request = Request::builder()
        .method("POST")
        .uri("/v1/chat/completions")
        .header("content-type", "application/json")
        .body(Body::from(
            json!({"model": "qwen3-4b", "messages": [{"role": "user", "content": "hello"}]}).to_string(),
        ))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["choices"][0]["message"]["content"], "hi");
}

/// S4. A 3-line batch with valid system/user messages completes with all
/// three requests accounted for and an output file containing all three
/// custom IDs.
#[tokio::test]
async fn batch_lifecycle_completes() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"role": "assistant", "content": "ok"}}],
            "usage": {"prompt_tokens": 1, "completion_tokens": 1},
        })))
        .mount(&server)
        .await;

    let (state, _dir) = build_state(server.uri(), "").await;
    let app = router(state.clone());

    let input = (1..=3)
        .map(|i| {
            json!({"messages": [
                {"role": "system", "content": "profile: <user_profile>"},
                {"role": "user", "content": format!("user-{i}")},
            ]})
            .to_string()
        })
        .collect::<Vec<_>>()
        .join("\n");

    let upload = upload_batch_file(app.clone(), &input).await;
    let file_id = upload["id"].as_str().unwrap().to_string();

    let create_request = Request::builder()
        .method("POST")
        .uri("/v1/batches")
        .header("content-type", "application/json")
        .body(Body::from(
            json!({"input_file_id": file_id, "endpoint": "/v1/chat/completions", "completion_window": "24h"})
                .to_string(),
        ))
        .unwrap();
    let create_response = app.clone().oneshot(create_request).await.unwrap();
    assert_eq!(create_response.status(), StatusCode::CREATED);
    let created = body_json(create_response).await;
    assert_eq!(created["status"], "pending");
    let batch_id = created["id"].as_str().unwrap().to_string();

    let batch = poll_until_terminal(app.clone(), &batch_id).await;
    assert_eq!(batch["status"], "completed");
    assert_eq!(batch["request_counts"]["total"], 3);
    assert_eq!(batch["request_counts"]["completed"], 3);
    assert_eq!(batch["request_counts"]["failed"], 0);
    assert!(!batch["output_file_id"].is_null());
    assert!(batch["error_file_id"].is_null());
}

/// S6. Line 1 is invalid JSON, line 2 is valid: one failure, one success.
#[tokio::test]
async fn batch_per_line_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"usage": {}})))
        .mount(&server)
        .await;

    let (state, _dir) = build_state(server.uri(), "").await;
    let app = router(state.clone());

    let input = format!(
        "{}\n{}",
        "not valid json",
        json!({"messages": [
            {"role": "system", "content": "<user_profile>"},
            {"role": "user", "content": "data"},
        ]})
    );

    let upload = upload_batch_file(app.clone(), &input).await;
    let file_id = upload["id"].as_str().unwrap().to_string();

    let create_request = Request::builder()
        .method("POST")
        .uri("/v1/batches")
        .header("content-type", "application/json")
        .body(Body::from(
            json!({"input_file_id": file_id, "endpoint": "/v1/chat/completions", "completion_window": "24h"})
                .to_string(),
        ))
        .unwrap();
    let created = body_json(app.clone().oneshot(create_request).await.unwrap()).await;
    let batch_id = created["id"].as_str().unwrap().to_string();

    let batch = poll_until_terminal(app.clone(), &batch_id).await;
    assert_eq!(batch["request_counts"]["total"], 1);
    assert_eq!(batch["request_counts"]["completed"], 1);
    assert_eq!(batch["request_counts"]["failed"], 1);
    assert!(!batch["error_file_id"].is_null());
    assert!(!batch["output_file_id"].is_null());
}

/// Cancel is rejected once a batch has already reached a terminal state
/// (spec §4.6 Cancel / P5).
#[tokio::test]
async fn cancel_after_completion_returns_400() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"usage": {}})))
        .mount(&server)
        .await;

    let (state, _dir) = build_state(server.uri(), "").await;
    let app = router(state.clone());

    let input = json!({"messages": [
        {"role": "system", "content": "<user_profile>"},
        {"role": "user", "content": "data"},
    ]})
    .to_string();

    let upload = upload_batch_file(app.clone(), &input).await;
    let file_id = upload["id"].as_str().unwrap().to_string();

    let create_request = Request::builder()
        .method("POST")
        .uri("/v1/batches")
        .header("content-type", "application/json")
        .body(Body::from(
            json!({"input_file_id": file_id, "endpoint": "/v1/chat/completions", "completion_window": "24h"})
                .to_string(),
        ))
        .unwrap();
    let created = body_json(app.clone().oneshot(create_request).await.unwrap()).await;
    let batch_id = created["id"].as_str().unwrap().to_string();

    poll_until_terminal(app.clone(), &batch_id).await;

    let cancel_request = Request::builder()
        .method("POST")
        .uri(format!("/v1/batches/{batch_id}/cancel"))
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(cancel_request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_batch_id_is_404() {
    let (state, _dir) = build_state("http://127.0.0.1:1".to_string(), "").await;
    let app = router(state);

    let request = Request::builder()
        .method("GET")
        .uri("/v1/batches/does-not-exist")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

async fn upload_batch_file(app: axum::Router, content: &str) -> Value {
    let boundary = "test-boundary";
    let body = format!(
        "--{boundary}\r\n\
         Content-Disposition: form-data; name=\"file\"; filename=\"input.jsonl\"\r\n\
         Content-Type: application/octet-stream\r\n\r\n\
         {content}\r\n\
         --{boundary}\r\n\
         Content-Disposition: form-data; name=\"purpose\"\r\n\r\n\
         batch\r\n\
         --{boundary}--\r\n"
    );

    let request = Request::builder()
        .method("POST")
        .uri("/v1/files")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await
}

async fn poll_until_terminal(app: axum::Router, batch_id: &str) -> Value {
    for _ in 0..200 {
        let request = Request::builder()
            .method("GET")
            .uri(format!("/v1/batches/{batch_id}"))
            .body(Body::empty())
            .unwrap();
        let snapshot = body_json(app.clone().oneshot(request).await.unwrap()).await;
        let status = snapshot["status"].as_str().unwrap();
        if matches!(status, "completed" | "cancelled" | "failed" | "expired") {
            return snapshot;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("batch {batch_id} did not reach a terminal state ({:?})", BatchStatus::Failed);
}
