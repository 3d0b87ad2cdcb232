//! HTTP routes for llmq
//! llmq的HTTP路由

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{generate_sync, get_result, health_check, submit_generate};
use super::state::ApiState;

/// Create HTTP routes / 创建HTTP路由
pub(crate) fn create_routes(state: ApiState) -> Router {
    Router::new()
        // Generation endpoints / 生成端点
        .route("/generate", post(submit_generate))
        .route("/generate/sync", post(generate_sync))
        // Result polling endpoint / 结果轮询端点
        .route("/result/{task_id}", get(get_result))
        // Health check endpoint / 健康检查端点
        .route("/health", get(health_check))
        .with_state(state)
}

/// Create the API router / 创建API路由器
pub fn create_api_router(state: ApiState) -> Router {
    create_routes(state)
}
