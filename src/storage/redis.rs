//! Redis task store backend
//! Redis任务存储后端
//!
//! Production backend over the external broker/result store. Task records
//! are JSON strings under `llmq:task:{id}`; the pending queue is a list the
//! API pushes to and workers BRPOP from. The store guarantees each queued id
//! is popped by exactly one worker; retention of finished records is the
//! store's concern, not this adapter's.
//! 基于外部代理/结果存储的生产后端。任务记录是`llmq:task:{id}`下的JSON
//! 字符串；待处理队列是一个列表，API向其推入，工作进程从中BRPOP。存储保证
//! 每个入队的ID恰好被一个工作进程弹出；已完成记录的保留归存储管，不归本
//! 适配器管。

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use crate::constants::TASK_KEY_PREFIX;
use crate::error::{LlmqError, LlmqResult};
use crate::storage::task_store::{StoreConfig, TaskRecord, TaskStatus, TaskStore};

/// Redis-backed task store / 基于Redis的任务存储
#[derive(Clone)]
pub struct RedisTaskStore {
    conn: ConnectionManager,
    queue_key: String,
}

impl std::fmt::Debug for RedisTaskStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisTaskStore")
            .field("queue_key", &self.queue_key)
            .finish()
    }
}

impl RedisTaskStore {
    /// Connect to the configured broker / 连接到配置的代理
    pub async fn connect(config: &StoreConfig) -> LlmqResult<Self> {
        let client = redis::Client::open(config.redis_url.as_str())?;
        let conn = client.get_connection_manager().await?;

        debug!(url = %config.redis_url, queue = %config.queue, "Connected to task store");

        Ok(Self {
            conn,
            queue_key: config.queue.clone(),
        })
    }

    /// Storage key for a task record / 任务记录的存储键
    fn task_key(task_id: &str) -> String {
        format!("{}{}", TASK_KEY_PREFIX, task_id)
    }

    async fn put_record(&self, record: &TaskRecord) -> LlmqResult<()> {
        let mut conn = self.conn.clone();
        let value = serde_json::to_string(record)?;
        conn.set::<_, _, ()>(Self::task_key(&record.task_id), value)
            .await?;
        Ok(())
    }

    async fn get_record(&self, task_id: &str) -> LlmqResult<Option<TaskRecord>> {
        let mut conn = self.conn.clone();
        let value: Option<String> = conn.get(Self::task_key(task_id)).await?;
        match value {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    /// Write a terminal state exactly once / 恰好一次写入终止状态
    ///
    /// The guard relies on single delivery per task: only the worker that
    /// popped the id writes its terminal state.
    /// 该保护依赖每个任务的单一投递：只有弹出该ID的工作进程写入其终止状态。
    async fn finish(
        &self,
        task_id: &str,
        status: TaskStatus,
        result: Option<Value>,
        error: Option<String>,
    ) -> LlmqResult<()> {
        let mut record = self
            .get_record(task_id)
            .await?
            .ok_or_else(|| LlmqError::UnknownTask {
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
        self.put_record(&record).await
    }
}

#[async_trait]
impl TaskStore for RedisTaskStore {
    async fn submit(&self, prompt: &str) -> LlmqResult<String> {
        let record = TaskRecord::new(prompt);
        let task_id = record.task_id.clone();

        // Record first so a dequeuing worker always finds it
        // 先写记录，以便出队的工作进程总能找到它
        self.put_record(&record).await?;

        let mut conn = self.conn.clone();
        conn.lpush::<_, _, ()>(&self.queue_key, &task_id).await?;

        debug!(task_id = %task_id, "Task enqueued");
        Ok(task_id)
    }

    async fn get(&self, task_id: &str) -> LlmqResult<Option<TaskRecord>> {
        self.get_record(task_id).await
    }

    async fn dequeue(&self, timeout: Duration) -> LlmqResult<Option<String>> {
        let mut conn = self.conn.clone();
        let popped: Option<(String, String)> = conn
            .brpop(&self.queue_key, timeout.as_secs_f64())
            .await?;
        Ok(popped.map(|(_, task_id)| task_id))
    }

    async fn complete(&self, task_id: &str, result: Value) -> LlmqResult<()> {
        self.finish(task_id, TaskStatus::Done, Some(result), None).await
    }

    async fn fail(&self, task_id: &str, error: &str) -> LlmqResult<()> {
        self.finish(task_id, TaskStatus::Failed, None, Some(error.to_string()))
            .await
    }
}
