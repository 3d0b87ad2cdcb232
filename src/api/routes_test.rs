//! Tests for llmq HTTP routes
//! llmq HTTP路由测试

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use crate::api::handlers::common::ErrorResponse;
use crate::api::routes::create_api_router;
use crate::api::state::ApiState;
use crate::backend::OllamaClient;
use crate::config::BackendConfig;
use crate::storage::{MemoryTaskStore, TaskStore};

/// Create test state with a memory store and an unreachable backend
/// 创建带有内存存储和不可达后端的测试状态
fn create_test_state() -> (ApiState, Arc<dyn TaskStore>) {
    let store: Arc<dyn TaskStore> = Arc::new(MemoryTaskStore::new());
    let backend = Arc::new(
        OllamaClient::new(&BackendConfig {
            url: "http://127.0.0.1:1/api/generate".to_string(),
            model: "llama3".to_string(),
            timeout_secs: 1,
        })
        .unwrap(),
    );
    (
        ApiState {
            backend,
            store: store.clone(),
        },
        store,
    )
}

fn json_request(method: Method, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn response_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health_route() {
    let (state, _) = create_test_state();
    let app = create_api_router(state);

    let request = Request::builder()
        .method(Method::GET)
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "llmq-api");
}

#[tokio::test]
async fn test_submit_returns_task_id() {
    let (state, _) = create_test_state();
    let app = create_api_router(state);

    let request = json_request(Method::POST, "/generate", json!({"prompt": "hello"}));
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert!(body["task_id"].as_str().is_some_and(|id| !id.is_empty()));
}

#[tokio::test]
async fn test_submit_distinct_prompts_yield_distinct_ids() {
    let (state, _) = create_test_state();
    let app = create_api_router(state);

    let first = app
        .clone()
        .oneshot(json_request(Method::POST, "/generate", json!({"prompt": "one"})))
        .await
        .unwrap();
    let second = app
        .oneshot(json_request(Method::POST, "/generate", json!({"prompt": "two"})))
        .await
        .unwrap();

    let first_id = response_json(first).await["task_id"].as_str().unwrap().to_string();
    let second_id = response_json(second).await["task_id"].as_str().unwrap().to_string();
    assert_ne!(first_id, second_id);
}

#[tokio::test]
async fn test_empty_prompt_is_rejected() {
    let (state, _) = create_test_state();
    let app = create_api_router(state);

    for uri in ["/generate", "/generate/sync"] {
        let request = json_request(Method::POST, uri, json!({"prompt": "   "}));
        let response = app.clone().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY, "uri: {}", uri);
        let body: ErrorResponse =
            serde_json::from_value(response_json(response).await).unwrap();
        assert_eq!(body.error, "INVALID_PROMPT");
        assert!(!body.message.is_empty());
    }
}

#[tokio::test]
async fn test_submitted_task_polls_pending() {
    let (state, _) = create_test_state();
    let app = create_api_router(state);

    let response = app
        .clone()
        .oneshot(json_request(Method::POST, "/generate", json!({"prompt": "hello"})))
        .await
        .unwrap();
    let task_id = response_json(response).await["task_id"].as_str().unwrap().to_string();

    let request = Request::builder()
        .method(Method::GET)
        .uri(format!("/result/{}", task_id))
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["status"], "pending");
    assert!(body.get("result").is_none());
    assert!(body.get("error").is_none());
}

#[tokio::test]
async fn test_poll_done_task_returns_result() {
    let (state, store) = create_test_state();
    let app = create_api_router(state);

    let task_id = store.submit("hello").await.unwrap();
    store
        .complete(&task_id, json!({"response": "hi there"}))
        .await
        .unwrap();

    // Terminal reads are stable across polls / 终止状态的读取在多次轮询间稳定
    for _ in 0..2 {
        let request = Request::builder()
            .method(Method::GET)
            .uri(format!("/result/{}", task_id))
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = response_json(response).await;
        assert_eq!(body["status"], "done");
        assert_eq!(body["result"]["response"], "hi there");
    }
}

#[tokio::test]
async fn test_poll_failed_task_returns_error() {
    let (state, store) = create_test_state();
    let app = create_api_router(state);

    let task_id = store.submit("hello").await.unwrap();
    store.fail(&task_id, "backend unreachable").await.unwrap();

    let request = Request::builder()
        .method(Method::GET)
        .uri(format!("/result/{}", task_id))
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["status"], "failed");
    assert_eq!(body["error"], "backend unreachable");
    assert!(body.get("result").is_none());
}

#[tokio::test]
async fn test_poll_unknown_task_is_404() {
    let (state, _) = create_test_state();
    let app = create_api_router(state);

    let request = Request::builder()
        .method(Method::GET)
        .uri("/result/never-issued")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: ErrorResponse = serde_json::from_value(response_json(response).await).unwrap();
    assert_eq!(body.error, "TASK_NOT_FOUND");
}

#[tokio::test]
async fn test_sync_generate_unreachable_backend_is_500_with_detail() {
    let (state, _) = create_test_state();
    let app = create_api_router(state);

    let request = json_request(Method::POST, "/generate/sync", json!({"prompt": "hello"}));
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: ErrorResponse = serde_json::from_value(response_json(response).await).unwrap();
    assert_eq!(body.error, "BACKEND_UNAVAILABLE");
    // Never an empty detail / 绝不返回空详情
    assert!(!body.message.is_empty());
}
