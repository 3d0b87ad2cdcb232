//! llmq worker main entry point
//! llmq工作进程主入口点
//!
//! One sequential executor per process; run more worker processes to scale
//! out against the shared task store.
//! 每个进程一个顺序执行器；针对共享任务存储运行更多工作进程以横向扩展。

use clap::Parser;
use std::sync::Arc;
use std::time::Duration;

use llmq::backend::OllamaClient;
use llmq::config::{init_tracing, AppConfig, CliArgs};
use llmq::storage::create_task_store;
use llmq::tracking::MlflowTracker;
use llmq::worker::{TaskExecutor, Worker};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse command line arguments / 解析命令行参数
    let args = CliArgs::parse();

    // Load configuration with CLI override / 加载配置并使用CLI覆盖
    let config = AppConfig::load_with_cli(&args)?;

    // Initialize logging with configuration / 使用配置初始化日志
    init_tracing(&config.log)?;

    tracing::info!("llmq worker starting with:");
    tracing::info!("  - Inference backend: {}", config.backend.url);
    tracing::info!("  - Model: {}", config.backend.model);
    tracing::info!("  - Task store backend: {}", config.store.backend);
    tracing::info!("  - Experiment tracking enabled: {}", config.tracking.enabled);

    // Initialize components / 初始化组件
    let backend = Arc::new(OllamaClient::new(&config.backend)?);
    let store = create_task_store(&config.store).await?;
    let tracker = MlflowTracker::from_config(&config.tracking);

    let executor = TaskExecutor::new(backend, store.clone(), tracker);
    let worker = Worker::new(
        executor,
        store,
        Duration::from_secs(config.store.poll_timeout_secs),
    );

    let worker_handle = tokio::spawn(worker.run());

    tracing::info!("llmq worker started successfully");

    // Wait for shutdown signal / 等待关闭信号
    tokio::signal::ctrl_c().await?;
    tracing::info!("llmq worker shutting down");

    worker_handle.abort();

    Ok(())
}
