//! llmq: prompt-forwarding API with an asynchronous task lifecycle
//! llmq: 带有异步任务生命周期的提示转发API

// Shared modules / 共享模块
pub mod backend;
pub mod config;
pub mod constants;
pub mod error;
pub mod storage;
pub mod tracking;

// Service-specific modules / 服务特定模块
pub mod api;
pub mod worker;

// Re-exports / 重新导出
pub use config::*;
pub use error::{LlmqError, LlmqResult};
