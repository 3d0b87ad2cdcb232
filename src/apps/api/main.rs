//! llmq API server main entry point
//! llmq API服务器主入口点

use clap::Parser;
use std::sync::Arc;

use llmq::api::{ApiState, HttpServer};
use llmq::backend::OllamaClient;
use llmq::config::{init_tracing, AppConfig, CliArgs};
use llmq::storage::create_task_store;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse command line arguments / 解析命令行参数
    let args = CliArgs::parse();

    // Load configuration with CLI override / 加载配置并使用CLI覆盖
    let config = AppConfig::load_with_cli(&args)?;

    // Initialize logging with configuration / 使用配置初始化日志
    init_tracing(&config.log)?;

    tracing::info!("llmq API starting with:");
    tracing::info!("  - HTTP server on: {}", config.http.addr);
    tracing::info!("  - Inference backend: {}", config.backend.url);
    tracing::info!("  - Model: {}", config.backend.model);
    tracing::info!("  - Task store backend: {}", config.store.backend);

    // Initialize components / 初始化组件
    let backend = Arc::new(OllamaClient::new(&config.backend)?);
    let store = create_task_store(&config.store).await?;
    let state = ApiState { backend, store };

    // Start the HTTP server / 启动HTTP服务器
    let server = HttpServer::new(config.http.addr, state);
    let server_handle = tokio::spawn(async move {
        if let Err(e) = server.start().await {
            tracing::error!("HTTP server error: {}", e);
        }
    });

    tracing::info!("llmq API started successfully");

    // Wait for shutdown signal / 等待关闭信号
    tokio::signal::ctrl_c().await?;
    tracing::info!("llmq API shutting down");

    server_handle.abort();

    Ok(())
}
