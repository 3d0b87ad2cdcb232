//! HTTP API for llmq
//! llmq的HTTP API
//!
//! This module contains the HTTP surface of the service:
//! 此模块包含服务的HTTP表面：
//!
//! - `handlers`: request handlers / 请求处理器
//! - `routes`: route table / 路由表
//! - `server`: HTTP server wrapper / HTTP服务器封装
//! - `state`: shared handler state / 共享处理器状态

pub mod handlers;
pub mod routes;
pub mod server;
pub mod state;

#[cfg(test)]
pub mod routes_test;

// Re-export commonly used types / 重新导出常用类型
pub use server::HttpServer;
pub use state::ApiState;
