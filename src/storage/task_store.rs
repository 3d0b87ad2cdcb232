//! Task store abstraction layer
//! 任务存储抽象层
//!
//! A task moves through exactly one status transition in its lifetime:
//! `pending` to either `done` or `failed`. The trait enforces that terminal
//! writes happen once; a second terminal write is a programming error and is
//! rejected instead of silently overwriting.
//! 任务在其生命周期中只经历一次状态转换：从`pending`到`done`或`failed`。
//! trait保证终止写入只发生一次；第二次终止写入属于编程错误，会被拒绝而
//! 不是静默覆盖。

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::constants::{DEFAULT_POLL_TIMEOUT_SECS, TASK_QUEUE_KEY};
use crate::error::{LlmqError, LlmqResult};
use crate::storage::memory::MemoryTaskStore;
use crate::storage::redis::RedisTaskStore;

/// Task status / 任务状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Pending,
    Done,
    Failed,
}

/// Stored task record / 存储的任务记录
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskRecord {
    /// Opaque identifier allocated at submission / 提交时分配的不透明标识符
    pub task_id: String,
    /// The prompt to forward / 待转发的提示
    pub prompt: String,
    /// Current status / 当前状态
    pub status: TaskStatus,
    /// Inference result, present only when done / 推理结果，仅在done时存在
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Error message, present only when failed / 错误消息，仅在failed时存在
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Submission time, unix seconds / 提交时间，unix秒
    pub submitted_at: i64,
    /// Completion time, unix seconds / 完成时间，unix秒
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<i64>,
}

impl TaskRecord {
    /// Create a pending record with a fresh identifier / 创建带有新标识符的待处理记录
    pub fn new(prompt: &str) -> Self {
        Self {
            task_id: Uuid::new_v4().to_string(),
            prompt: prompt.to_string(),
            status: TaskStatus::Pending,
            result: None,
            error: None,
            submitted_at: chrono::Utc::now().timestamp(),
            finished_at: None,
        }
    }

    /// Caller-visible state derived from the record / 由记录导出的调用者可见状态
    pub fn state(&self) -> TaskState {
        match self.status {
            TaskStatus::Pending => TaskState::Pending,
            TaskStatus::Done => TaskState::Done(self.result.clone().unwrap_or(Value::Null)),
            TaskStatus::Failed => TaskState::Failed(self.error.clone().unwrap_or_default()),
        }
    }
}

/// Caller-visible task state / 调用者可见的任务状态
#[derive(Debug, Clone, PartialEq)]
pub enum TaskState {
    Pending,
    Done(Value),
    Failed(String),
}

/// Task store configuration / 任务存储配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Storage backend type (redis, memory) / 存储后端类型
    pub backend: String,
    /// Broker/result store connection URL / 代理/结果存储连接URL
    pub redis_url: String,
    /// Queue list key / 队列列表键
    pub queue: String,
    /// Worker dequeue poll timeout in seconds / 工作进程出队轮询超时（秒）
    pub poll_timeout_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: "redis".to_string(),
            redis_url: "redis://localhost:6379/0".to_string(),
            queue: TASK_QUEUE_KEY.to_string(),
            poll_timeout_secs: DEFAULT_POLL_TIMEOUT_SECS,
        }
    }
}

/// Task store trait for different backends / 不同后端的任务存储trait
#[async_trait]
pub trait TaskStore: Send + Sync + Debug {
    /// Enqueue a prompt and return the new task identifier; never blocks on
    /// completion / 入队一个提示并返回新任务标识符；绝不阻塞等待完成
    async fn submit(&self, prompt: &str) -> LlmqResult<String>;

    /// Fetch the full record for a task / 获取任务的完整记录
    async fn get(&self, task_id: &str) -> LlmqResult<Option<TaskRecord>>;

    /// Blocking pop of the next task id, up to `timeout` / 阻塞弹出下一个任务ID，最长等待`timeout`
    async fn dequeue(&self, timeout: Duration) -> LlmqResult<Option<String>>;

    /// Record a successful result; exactly once per task / 记录成功结果；每个任务仅一次
    async fn complete(&self, task_id: &str, result: Value) -> LlmqResult<()>;

    /// Record a failure; exactly once per task / 记录失败；每个任务仅一次
    async fn fail(&self, task_id: &str, error: &str) -> LlmqResult<()>;

    /// Non-blocking status lookup / 非阻塞状态查询
    async fn status(&self, task_id: &str) -> LlmqResult<TaskState> {
        match self.get(task_id).await? {
            Some(record) => Ok(record.state()),
            None => Err(LlmqError::UnknownTask {
                task_id: task_id.to_string(),
            }),
        }
    }
}

/// Create a task store from configuration / 从配置创建任务存储
pub async fn create_task_store(config: &StoreConfig) -> LlmqResult<Arc<dyn TaskStore>> {
    match config.backend.as_str() {
        "memory" => Ok(Arc::new(MemoryTaskStore::new())),
        "redis" => Ok(Arc::new(RedisTaskStore::connect(config).await?)),
        other => Err(LlmqError::Storage(format!(
            "Unsupported task store backend: {}",
            other
        ))),
    }
}
