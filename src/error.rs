//! Error types for llmq components
//! llmq组件的错误类型

use axum::http::StatusCode;
use axum::Json;
use thiserror::Error;

use crate::api::handlers::common::ErrorResponse;

/// llmq service error types / llmq服务错误类型
#[derive(Error, Debug)]
pub enum LlmqError {
    /// Malformed or missing prompt / 格式错误或缺失的提示
    #[error("Invalid prompt: {message}")]
    InvalidPrompt { message: String },

    /// Connection or timeout failure reaching the inference backend
    /// 连接推理后端时的连接或超时失败
    #[error("Inference backend unavailable: {0}")]
    BackendUnavailable(String),

    /// Non-success HTTP status from the inference backend / 推理后端返回的非成功HTTP状态
    #[error("Inference backend returned status {status}: {message}")]
    BackendError { status: u16, message: String },

    /// Task id was never issued or has expired / 任务ID从未签发或已过期
    #[error("Task {task_id} not found")]
    UnknownTask { task_id: String },

    /// Terminal state written more than once / 终止状态被写入多次
    #[error("Task {task_id} is already in a terminal state")]
    TaskStateConflict { task_id: String },

    /// Task store error / 任务存储错误
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization error / 序列化错误
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Experiment tracking error, never surfaced to callers
    /// 实验跟踪错误，绝不暴露给调用者
    #[error("Tracking error: {0}")]
    Tracking(String),

    /// Configuration error / 配置错误
    #[error("Configuration error: {0}")]
    Config(#[from] figment::Error),

    /// IO error / IO错误
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for llmq operations / llmq操作的结果类型别名
pub type LlmqResult<T> = Result<T, LlmqError>;

impl From<redis::RedisError> for LlmqError {
    fn from(err: redis::RedisError) -> Self {
        LlmqError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for LlmqError {
    fn from(err: serde_json::Error) -> Self {
        LlmqError::Serialization(err.to_string())
    }
}

impl LlmqError {
    /// HTTP status for this error / 此错误对应的HTTP状态
    pub fn status_code(&self) -> StatusCode {
        match self {
            LlmqError::InvalidPrompt { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            LlmqError::UnknownTask { .. } => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Machine-readable error code / 机器可读的错误代码
    pub fn error_code(&self) -> &'static str {
        match self {
            LlmqError::InvalidPrompt { .. } => "INVALID_PROMPT",
            LlmqError::BackendUnavailable(_) => "BACKEND_UNAVAILABLE",
            LlmqError::BackendError { .. } => "BACKEND_ERROR",
            LlmqError::UnknownTask { .. } => "TASK_NOT_FOUND",
            LlmqError::TaskStateConflict { .. } => "TASK_STATE_CONFLICT",
            LlmqError::Storage(_) => "STORAGE_ERROR",
            LlmqError::Serialization(_) => "SERIALIZATION_ERROR",
            LlmqError::Tracking(_) => "TRACKING_ERROR",
            LlmqError::Config(_) => "CONFIG_ERROR",
            LlmqError::Io(_) => "IO_ERROR",
        }
    }
}

/// Convert LlmqError to an axum error response tuple
/// 将LlmqError转换为axum错误响应元组
impl From<LlmqError> for (StatusCode, Json<ErrorResponse>) {
    fn from(err: LlmqError) -> Self {
        (
            err.status_code(),
            Json(ErrorResponse {
                error: err.error_code().to_string(),
                message: err.to_string(),
            }),
        )
    }
}
