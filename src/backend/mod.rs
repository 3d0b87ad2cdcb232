//! Inference backend client
//! 推理后端客户端
//!
//! One outbound HTTP call per prompt against an Ollama-compatible generate
//! endpoint. The client owns the request timeout and the translation of
//! transport and status failures into the service error taxonomy. No retries:
//! a single failed call surfaces as an error to the caller.
//! 每个提示对Ollama兼容的生成端点发起一次出站HTTP调用。客户端负责请求超时
//! 以及将传输和状态失败转换为服务错误分类。不重试：单次调用失败即作为错误
//! 返回给调用者。

use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use crate::config::BackendConfig;
use crate::error::{LlmqError, LlmqResult};

/// Wire request for the generate endpoint / 生成端点的请求格式
#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

/// HTTP client for the inference backend / 推理后端的HTTP客户端
#[derive(Debug, Clone)]
pub struct OllamaClient {
    http: reqwest::Client,
    url: String,
    model: String,
}

impl OllamaClient {
    /// Create a client from backend configuration / 从后端配置创建客户端
    pub fn new(config: &BackendConfig) -> LlmqResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| LlmqError::BackendUnavailable(e.to_string()))?;

        Ok(Self {
            http,
            url: config.url.clone(),
            model: config.model.clone(),
        })
    }

    /// Model name sent with every request / 随每个请求发送的模型名称
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Forward a prompt to the backend and return the raw inference result
    /// 将提示转发给后端并返回原始推理结果
    ///
    /// The result payload is passed through unmodified; callers treat it as
    /// opaque apart from the generated-text field.
    /// 结果负载原样透传；除生成文本字段外调用者将其视为不透明。
    pub async fn generate(&self, prompt: &str) -> LlmqResult<Value> {
        let request = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
        };

        debug!(url = %self.url, model = %self.model, "Forwarding prompt to inference backend");

        let response = self
            .http
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .map_err(|e| LlmqError::BackendUnavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(LlmqError::BackendError {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| LlmqError::Serialization(e.to_string()))
    }
}
