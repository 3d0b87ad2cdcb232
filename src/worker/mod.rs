//! Task executor and worker loop
//! 任务执行器和工作循环
//!
//! The executor runs once per dequeued task: forward the prompt to the
//! inference backend, record the outcome in the task store, and best-effort
//! log the run to the experiment tracker. The worker is the sequential
//! dequeue loop around it: one task at a time per process, with concurrency
//! coming from running more worker processes against the shared store.
//! 执行器对每个出队的任务运行一次：将提示转发给推理后端，在任务存储中记录
//! 结果，并尽力将运行记录到实验跟踪器。工作进程是围绕它的顺序出队循环：
//! 每个进程一次一个任务，并发来自针对共享存储运行更多工作进程。

use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

use crate::backend::OllamaClient;
use crate::error::LlmqResult;
use crate::storage::{TaskStatus, TaskStore};
use crate::tracking::MlflowTracker;

/// Runs one dequeued task to its terminal state / 将一个出队任务运行到终止状态
pub struct TaskExecutor {
    backend: Arc<OllamaClient>,
    store: Arc<dyn TaskStore>,
    tracker: Option<MlflowTracker>,
}

impl TaskExecutor {
    /// Create a new executor / 创建新的执行器
    pub fn new(
        backend: Arc<OllamaClient>,
        store: Arc<dyn TaskStore>,
        tracker: Option<MlflowTracker>,
    ) -> Self {
        Self {
            backend,
            store,
            tracker,
        }
    }

    /// Execute a task by id / 按ID执行任务
    ///
    /// Backend failures end up in the task record, not in the returned
    /// result; the error return covers only store access itself.
    /// 后端失败会进入任务记录而非返回结果；错误返回仅涵盖存储访问本身。
    pub async fn execute(&self, task_id: &str) -> LlmqResult<()> {
        let record = match self.store.get(task_id).await? {
            Some(record) => record,
            None => {
                // Record expired between enqueue and dequeue / 记录在入队和出队之间过期
                warn!(task_id = %task_id, "Dequeued task has no record, skipping");
                return Ok(());
            }
        };

        if record.status != TaskStatus::Pending {
            // Tolerated under at-least-once delivery / 在至少一次投递下可容忍
            debug!(task_id = %task_id, "Task already terminal, skipping redelivery");
            return Ok(());
        }

        let started = Instant::now();

        match self.backend.generate(&record.prompt).await {
            Ok(result) => {
                let latency_ms = started.elapsed().as_secs_f64() * 1000.0;

                // Best-effort: a tracking failure never blocks the result write
                // 尽力而为：跟踪失败绝不阻塞结果写入
                if let Some(tracker) = &self.tracker {
                    if let Err(e) = tracker
                        .record_run(self.backend.model(), &record.prompt, latency_ms, &result)
                        .await
                    {
                        warn!(task_id = %task_id, error = %e, "Experiment tracking failed");
                    }
                }

                self.store.complete(task_id, result).await?;
                info!(task_id = %task_id, latency_ms = latency_ms, "Task completed");
            }
            Err(e) => {
                self.store.fail(task_id, &e.to_string()).await?;
                info!(task_id = %task_id, error = %e, "Task failed");
            }
        }

        Ok(())
    }
}

/// Sequential dequeue loop / 顺序出队循环
pub struct Worker {
    executor: TaskExecutor,
    store: Arc<dyn TaskStore>,
    poll_timeout: Duration,
}

impl Worker {
    /// Create a new worker / 创建新的工作进程
    pub fn new(executor: TaskExecutor, store: Arc<dyn TaskStore>, poll_timeout: Duration) -> Self {
        Self {
            executor,
            store,
            poll_timeout,
        }
    }

    /// Pull and execute tasks until the surrounding task is aborted
    /// 拉取并执行任务，直到外层任务被中止
    pub async fn run(self) {
        info!("Worker started");
        loop {
            match self.store.dequeue(self.poll_timeout).await {
                Ok(Some(task_id)) => {
                    if let Err(e) = self.executor.execute(&task_id).await {
                        error!(task_id = %task_id, error = %e, "Failed to record task outcome");
                    }
                }
                Ok(None) => {
                    // Poll timeout with an empty queue / 队列为空时的轮询超时
                }
                Err(e) => {
                    error!(error = %e, "Dequeue failed, backing off");
                    tokio::time::sleep(Duration::from_secs(1)).await;
                }
            }
        }
    }
}
