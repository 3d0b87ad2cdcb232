//! Experiment tracking client
//! 实验跟踪客户端
//!
//! Minimal MLflow REST client used by the executor to record one run per
//! completed generation: parameters (model, prompt), the latency metric, and
//! a truncated copy of the generated text. Every failure maps to
//! [`LlmqError::Tracking`]; callers treat the whole recording as best-effort
//! and must never let it block the task result write.
//! 执行器使用的最小MLflow REST客户端，为每次完成的生成记录一个运行：参数
//! （模型、提示）、延迟指标和截断的生成文本副本。所有失败都映射为
//! [`LlmqError::Tracking`]；调用者将整个记录视为尽力而为，绝不能让它阻塞
//! 任务结果写入。

use serde_json::{json, Value};
use tracing::debug;

use crate::config::TrackingConfig;
use crate::constants::TRACKING_PARAM_MAX_LEN;
use crate::error::{LlmqError, LlmqResult};

/// MLflow REST tracking client / MLflow REST跟踪客户端
#[derive(Debug, Clone)]
pub struct MlflowTracker {
    http: reqwest::Client,
    uri: String,
    experiment_id: String,
}

impl MlflowTracker {
    /// Build a tracker when tracking is enabled / 在启用跟踪时构建跟踪器
    pub fn from_config(config: &TrackingConfig) -> Option<Self> {
        if !config.enabled {
            return None;
        }
        Some(Self {
            http: reqwest::Client::new(),
            uri: config.uri.trim_end_matches('/').to_string(),
            experiment_id: config.experiment_id.clone(),
        })
    }

    /// Record one generation run / 记录一次生成运行
    pub async fn record_run(
        &self,
        model: &str,
        prompt: &str,
        latency_ms: f64,
        result: &Value,
    ) -> LlmqResult<()> {
        let run_id = self.create_run().await?;
        debug!(run_id = %run_id, "Recording generation run");

        self.log_param(&run_id, "model", model).await?;
        self.log_param(&run_id, "prompt", &truncate(prompt)).await?;
        self.log_metric(&run_id, "latency_ms", latency_ms).await?;

        if let Some(text) = result.get("response").and_then(|v| v.as_str()) {
            self.log_param(&run_id, "output", &truncate(text)).await?;
        }

        self.end_run(&run_id).await
    }

    async fn create_run(&self) -> LlmqResult<String> {
        let body = json!({
            "experiment_id": self.experiment_id,
            "start_time": chrono::Utc::now().timestamp_millis(),
            "run_name": "generate",
        });
        let response = self.post("runs/create", &body).await?;
        response
            .pointer("/run/info/run_id")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
            .ok_or_else(|| LlmqError::Tracking("run id missing from create response".to_string()))
    }

    async fn log_param(&self, run_id: &str, key: &str, value: &str) -> LlmqResult<()> {
        let body = json!({"run_id": run_id, "key": key, "value": value});
        self.post("runs/log-parameter", &body).await.map(|_| ())
    }

    async fn log_metric(&self, run_id: &str, key: &str, value: f64) -> LlmqResult<()> {
        let body = json!({
            "run_id": run_id,
            "key": key,
            "value": value,
            "timestamp": chrono::Utc::now().timestamp_millis(),
            "step": 0,
        });
        self.post("runs/log-metric", &body).await.map(|_| ())
    }

    async fn end_run(&self, run_id: &str) -> LlmqResult<()> {
        let body = json!({
            "run_id": run_id,
            "status": "FINISHED",
            "end_time": chrono::Utc::now().timestamp_millis(),
        });
        self.post("runs/update", &body).await.map(|_| ())
    }

    async fn post(&self, path: &str, body: &Value) -> LlmqResult<Value> {
        let url = format!("{}/api/2.0/mlflow/{}", self.uri, path);
        let response = self
            .http
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| LlmqError::Tracking(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(LlmqError::Tracking(format!(
                "tracking server returned {}: {}",
                status, message
            )));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| LlmqError::Tracking(e.to_string()))
    }
}

/// Clamp a parameter value to the tracked maximum / 将参数值限制到跟踪最大长度
fn truncate(value: &str) -> String {
    value.chars().take(TRACKING_PARAM_MAX_LEN).collect()
}
