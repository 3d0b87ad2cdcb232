//! HTTP server implementation for llmq
//! llmq的HTTP服务器实现

use anyhow::Result;
use std::net::SocketAddr;
use tracing::{error, info};

use super::routes::create_api_router;
use super::state::ApiState;

/// llmq HTTP server / llmq HTTP服务器
pub struct HttpServer {
    addr: SocketAddr,
    state: ApiState,
}

impl HttpServer {
    /// Create a new HTTP server / 创建新的HTTP服务器
    pub fn new(addr: SocketAddr, state: ApiState) -> Self {
        Self { addr, state }
    }

    /// Get the HTTP address / 获取HTTP地址
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Start the HTTP server / 启动HTTP服务器
    pub async fn start(self) -> Result<()> {
        info!("Starting llmq HTTP API on {}", self.addr);

        let app = create_api_router(self.state);

        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        if let Err(e) = axum::serve(listener, app).await {
            error!("HTTP server error: {}", e);
            return Err(e.into());
        }

        Ok(())
    }
}
