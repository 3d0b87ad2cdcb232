//! In-memory task store backend
//! 内存任务存储后端
//!
//! Single-process backend used by tests and local development. Queue and
//! records live behind tokio locks; dequeue polls until the timeout elapses.
//! 测试和本地开发使用的单进程后端。队列和记录位于tokio锁之后；出队轮询
//! 直到超时。

use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};

use crate::error::{LlmqError, LlmqResult};
use crate::storage::task_store::{TaskRecord, TaskStatus, TaskStore};

/// In-memory task store / 内存任务存储
#[derive(Debug, Clone, Default)]
pub struct MemoryTaskStore {
    tasks: Arc<RwLock<HashMap<String, TaskRecord>>>,
    queue: Arc<Mutex<VecDeque<String>>>,
}

impl MemoryTaskStore {
    /// Create an empty store / 创建空存储
    pub fn new() -> Self {
        Self::default()
    }

    /// Write a terminal state exactly once / 恰好一次写入终止状态
    async fn finish(
        &self,
        task_id: &str,
        status: TaskStatus,
        result: Option<Value>,
        error: Option<String>,
    ) -> LlmqResult<()> {
        let mut tasks = self.tasks.write().await;
        let record = tasks.get_mut(task_id).ok_or_else(|| LlmqError::UnknownTask {
            task_id: task_id.to_string(),
        })?;

        if record.status != TaskStatus::Pending {
            return Err(LlmqError::TaskStateConflict {
                task_id: task_id.to_string(),
            });
        }

        record.status = status;
        record.result = result;
        record.error = error;
        record.finished_at = Some(chrono::Utc::now().timestamp());
        Ok(())
    }
}

#[async_trait]
impl TaskStore for MemoryTaskStore {
    async fn submit(&self, prompt: &str) -> LlmqResult<String> {
        let record = TaskRecord::new(prompt);
        let task_id = record.task_id.clone();

        self.tasks.write().await.insert(task_id.clone(), record);
        self.queue.lock().await.push_back(task_id.clone());
        Ok(task_id)
    }

    async fn get(&self, task_id: &str) -> LlmqResult<Option<TaskRecord>> {
        Ok(self.tasks.read().await.get(task_id).cloned())
    }

    async fn dequeue(&self, timeout: Duration) -> LlmqResult<Option<String>> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if let Some(task_id) = self.queue.lock().await.pop_front() {
                return Ok(Some(task_id));
            }
            if tokio::time::Instant::now() >= deadline {
                return Ok(None);
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    async fn complete(&self, task_id: &str, result: Value) -> LlmqResult<()> {
        self.finish(task_id, TaskStatus::Done, Some(result), None).await
    }

    async fn fail(&self, task_id: &str, error: &str) -> LlmqResult<()> {
        self.finish(task_id, TaskStatus::Failed, None, Some(error.to_string()))
            .await
    }
}
