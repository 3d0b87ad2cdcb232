//! Result polling HTTP handler
//! 结果轮询HTTP处理器

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error};

use super::common::ErrorResponse;
use crate::api::state::ApiState;
use crate::error::LlmqError;
use crate::storage::{TaskState, TaskStatus};

/// Poll response body / 轮询响应体
#[derive(Debug, Serialize, Deserialize)]
pub struct TaskStatusResponse {
    pub status: TaskStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Poll a task by id / 按ID轮询任务
///
/// Terminal states are stable: repeated polls return the same payload.
/// An identifier that was never issued, or whose record has expired in the
/// store, yields 404.
/// 终止状态是稳定的：重复轮询返回相同负载。从未签发或记录已在存储中过期的
/// 标识符返回404。
pub async fn get_result(
    State(state): State<ApiState>,
    Path(task_id): Path<String>,
) -> Result<Json<TaskStatusResponse>, (StatusCode, Json<ErrorResponse>)> {
    debug!(task_id = %task_id, "HTTP: Polling task result");

    match state.store.status(&task_id).await {
        Ok(TaskState::Pending) => Ok(Json(TaskStatusResponse {
            status: TaskStatus::Pending,
            result: None,
            error: None,
        })),
        Ok(TaskState::Done(result)) => Ok(Json(TaskStatusResponse {
            status: TaskStatus::Done,
            result: Some(result),
            error: None,
        })),
        Ok(TaskState::Failed(error)) => Ok(Json(TaskStatusResponse {
            status: TaskStatus::Failed,
            result: None,
            error: Some(error),
        })),
        Err(e @ LlmqError::UnknownTask { .. }) => {
            debug!(task_id = %task_id, "Task not found");
            Err(e.into())
        }
        Err(e) => {
            error!(task_id = %task_id, error = %e, "Failed to read task status");
            Err(e.into())
        }
    }
}
