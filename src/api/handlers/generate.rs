//! Generation HTTP handlers
//! 生成HTTP处理器
//!
//! Two submission paths over the same validated prompt: the asynchronous
//! path hands the prompt to the task store and returns an identifier at
//! once; the synchronous path calls the backend inline and returns the raw
//! inference result.
//! 同一经过验证的提示有两条提交路径：异步路径将提示交给任务存储并立即返回
//! 标识符；同步路径内联调用后端并返回原始推理结果。

use axum::{extract::State, http::StatusCode, response::Json};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, info};

use super::common::ErrorResponse;
use crate::api::state::ApiState;
use crate::error::{LlmqError, LlmqResult};

// HTTP request/response types / HTTP请求/响应类型

#[derive(Debug, Deserialize, Serialize)]
pub struct PromptParams {
    pub prompt: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SubmitResponse {
    pub task_id: String,
}

/// Reject empty or whitespace-only prompts / 拒绝空白提示
fn validate_prompt(params: &PromptParams) -> LlmqResult<()> {
    if params.prompt.trim().is_empty() {
        return Err(LlmqError::InvalidPrompt {
            message: "prompt must not be empty".to_string(),
        });
    }
    Ok(())
}

/// Submit a generation task / 提交生成任务
///
/// Returns the task identifier immediately; failures of the generation
/// itself surface later through polling, never here.
/// 立即返回任务标识符；生成本身的失败之后通过轮询显现，绝不在此处。
pub async fn submit_generate(
    State(state): State<ApiState>,
    Json(params): Json<PromptParams>,
) -> Result<Json<SubmitResponse>, (StatusCode, Json<ErrorResponse>)> {
    if let Err(e) = validate_prompt(&params) {
        return Err(e.into());
    }

    match state.store.submit(&params.prompt).await {
        Ok(task_id) => {
            info!(task_id = %task_id, "Generation task submitted");
            Ok(Json(SubmitResponse { task_id }))
        }
        Err(e) => {
            error!(error = %e, "Failed to submit generation task");
            Err(e.into())
        }
    }
}

/// Generate synchronously / 同步生成
pub async fn generate_sync(
    State(state): State<ApiState>,
    Json(params): Json<PromptParams>,
) -> Result<Json<Value>, (StatusCode, Json<ErrorResponse>)> {
    if let Err(e) = validate_prompt(&params) {
        return Err(e.into());
    }

    info!("HTTP: Synchronous generation requested");

    match state.backend.generate(&params.prompt).await {
        Ok(result) => Ok(Json(result)),
        Err(e) => {
            error!(error = %e, "Synchronous generation failed");
            Err(e.into())
        }
    }
}
