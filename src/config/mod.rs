//! Configuration management for llmq components
//! llmq组件的配置管理
//!
//! Configuration is layered with the following precedence (highest last):
//! 配置分层，优先级如下（最后者最高）：
//!
//! 1. Compiled defaults / 编译默认值
//! 2. TOML configuration file / TOML配置文件
//! 3. `LLMQ_*` environment variables / `LLMQ_*`环境变量
//! 4. Well-known environment names (`OLLAMA_URL`, `REDIS_URL`, ...)
//!    知名环境变量名（`OLLAMA_URL`、`REDIS_URL`等）
//! 5. Command line arguments / 命令行参数
//!
//! The loaded [`AppConfig`] is constructed once in each binary's `main` and
//! passed into components explicitly; there is no ambient global.
//! 加载的[`AppConfig`]在每个二进制的`main`中构建一次并显式传入各组件；
//! 没有全局环境状态。

use anyhow::{Context, Result};
use clap::Parser;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    value::{Map, Value},
    Figment, Metadata, Profile, Provider,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::OnceLock;

use crate::constants::DEFAULT_BACKEND_TIMEOUT_SECS;
use crate::storage::StoreConfig;

/// llmq command line arguments / llmq命令行参数
///
/// Shared by the API and worker binaries; flags that do not apply to a
/// binary are simply ignored by it.
/// API和工作进程二进制共享；不适用于某个二进制的标志会被其忽略。
#[derive(Parser, Debug, Clone)]
#[command(
    name = "llmq",
    version = "0.1.0",
    about = "llmq - asynchronous text-generation forwarding service\nllmq - 异步文本生成转发服务"
)]
pub struct CliArgs {
    /// Configuration file path / 配置文件路径
    #[arg(short, long, value_name = "FILE", help = "Configuration file path / 配置文件路径")]
    pub config: Option<String>,

    /// HTTP server address / HTTP服务器地址
    #[arg(long, value_name = "ADDR", help = "HTTP server address (e.g., 0.0.0.0:8000) / HTTP服务器地址")]
    pub http_addr: Option<String>,

    /// Log level / 日志级别
    #[arg(long, value_name = "LEVEL", help = "Log level (trace, debug, info, warn, error) / 日志级别")]
    pub log_level: Option<String>,

    /// Inference backend URL / 推理后端URL
    #[arg(long, value_name = "URL", help = "Inference backend endpoint / 推理后端端点")]
    pub ollama_url: Option<String>,

    /// Model name sent to the backend / 发送给后端的模型名称
    #[arg(long, value_name = "NAME", help = "Model name sent to the backend / 发送给后端的模型名称")]
    pub model: Option<String>,

    /// Broker and result store URL / 代理和结果存储URL
    #[arg(long, value_name = "URL", help = "Broker/result store connection URL / 代理/结果存储连接URL")]
    pub redis_url: Option<String>,

    /// Task store backend / 任务存储后端
    #[arg(long, value_name = "BACKEND", help = "Task store backend (redis, memory) / 任务存储后端")]
    pub store_backend: Option<String>,
}

/// Custom Figment provider for command line arguments
/// 命令行参数的自定义Figment提供者
impl Provider for CliArgs {
    fn metadata(&self) -> Metadata {
        Metadata::named("CLI Arguments")
    }

    fn data(&self) -> Result<Map<Profile, Map<String, Value>>, figment::Error> {
        let mut map: Map<String, Value> = Map::new();

        // Only add values that were explicitly provided / 只添加明确提供的值
        if let Some(ref addr) = self.http_addr {
            let mut http_map: Map<String, Value> = Map::new();
            http_map.insert("addr".to_string(), Value::from(addr.clone()));
            map.insert("http".to_string(), Value::from(http_map));
        }

        if let Some(ref level) = self.log_level {
            let mut log_map: Map<String, Value> = Map::new();
            log_map.insert("level".to_string(), Value::from(level.clone()));
            map.insert("log".to_string(), Value::from(log_map));
        }

        let mut backend_map: Map<String, Value> = Map::new();
        if let Some(ref url) = self.ollama_url {
            backend_map.insert("url".to_string(), Value::from(url.clone()));
        }
        if let Some(ref model) = self.model {
            backend_map.insert("model".to_string(), Value::from(model.clone()));
        }
        if !backend_map.is_empty() {
            map.insert("backend".to_string(), Value::from(backend_map));
        }

        let mut store_map: Map<String, Value> = Map::new();
        if let Some(ref url) = self.redis_url {
            store_map.insert("redis_url".to_string(), Value::from(url.clone()));
        }
        if let Some(ref backend) = self.store_backend {
            store_map.insert("backend".to_string(), Value::from(backend.clone()));
        }
        if !store_map.is_empty() {
            map.insert("store".to_string(), Value::from(store_map));
        }

        Ok(Map::from([(Profile::Default, map)]))
    }
}

/// Provider for the well-known environment variable names recognized by the
/// service regardless of the `LLMQ_` prefix convention.
/// 无论`LLMQ_`前缀约定如何，服务都识别的知名环境变量名的提供者。
struct WellKnownEnv;

impl Provider for WellKnownEnv {
    fn metadata(&self) -> Metadata {
        Metadata::named("Well-known environment variables")
    }

    fn data(&self) -> Result<Map<Profile, Map<String, Value>>, figment::Error> {
        let mut map: Map<String, Value> = Map::new();

        if let Ok(url) = std::env::var("OLLAMA_URL") {
            let mut backend_map: Map<String, Value> = Map::new();
            backend_map.insert("url".to_string(), Value::from(url));
            map.insert("backend".to_string(), Value::from(backend_map));
        }

        if let Ok(url) = std::env::var("REDIS_URL") {
            let mut store_map: Map<String, Value> = Map::new();
            store_map.insert("redis_url".to_string(), Value::from(url));
            map.insert("store".to_string(), Value::from(store_map));
        }

        // An explicit tracking URI also turns tracking on
        // 显式的跟踪URI同时开启跟踪
        if let Ok(uri) = std::env::var("MLFLOW_TRACKING_URI") {
            let mut tracking_map: Map<String, Value> = Map::new();
            tracking_map.insert("uri".to_string(), Value::from(uri));
            tracking_map.insert("enabled".to_string(), Value::from(true));
            map.insert("tracking".to_string(), Value::from(tracking_map));
        }

        if let Ok(token) = std::env::var("HUGGING_FACE_TOKEN") {
            map.insert("hugging_face_token".to_string(), Value::from(token));
        }

        Ok(Map::from([(Profile::Default, map)]))
    }
}

/// HTTP server configuration / HTTP服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Server bind address / 服务器绑定地址
    #[serde(deserialize_with = "deserialize_socket_addr")]
    pub addr: SocketAddr,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            addr: "0.0.0.0:8000".parse().unwrap(),
        }
    }
}

fn deserialize_socket_addr<'de, D>(deserializer: D) -> Result<SocketAddr, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    s.parse().map_err(serde::de::Error::custom)
}

/// Logging configuration / 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Log level (trace, debug, info, warn, error) / 日志级别
    pub level: String,
    /// Log format (json, compact, pretty) / 日志格式
    pub format: String,
    /// Log output file / 日志输出文件
    pub file: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
            file: None,
        }
    }
}

/// Inference backend configuration / 推理后端配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Backend endpoint URL / 后端端点URL
    pub url: String,
    /// Model name sent with every request / 随每个请求发送的模型名称
    pub model: String,
    /// Request timeout in seconds; generation can be slow
    /// 请求超时（秒）；生成可能较慢
    pub timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:11434/api/generate".to_string(),
            model: "llama3".to_string(),
            timeout_secs: DEFAULT_BACKEND_TIMEOUT_SECS,
        }
    }
}

/// Experiment tracking configuration / 实验跟踪配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingConfig {
    /// Enable experiment tracking / 启用实验跟踪
    pub enabled: bool,
    /// Tracking server URI / 跟踪服务器URI
    pub uri: String,
    /// Experiment the runs are recorded under / 运行记录所属的实验
    pub experiment_id: String,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            uri: "http://localhost:5000".to_string(),
            experiment_id: "0".to_string(),
        }
    }
}

/// Application-wide configuration / 应用程序全局配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// HTTP server configuration / HTTP服务器配置
    pub http: HttpConfig,
    /// Logging configuration / 日志配置
    pub log: LogConfig,
    /// Inference backend configuration / 推理后端配置
    pub backend: BackendConfig,
    /// Task store configuration / 任务存储配置
    pub store: StoreConfig,
    /// Experiment tracking configuration / 实验跟踪配置
    pub tracking: TrackingConfig,
    /// Reserved for gated model access; unused by the core flow
    /// 保留用于受限模型访问；核心流程未使用
    pub hugging_face_token: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            http: HttpConfig::default(),
            log: LogConfig::default(),
            backend: BackendConfig::default(),
            store: StoreConfig::default(),
            tracking: TrackingConfig::default(),
            hugging_face_token: String::new(),
        }
    }
}

impl AppConfig {
    /// Load configuration from file and environment / 从文件和环境变量加载配置
    pub fn load() -> Result<Self, figment::Error> {
        Figment::new()
            .merge(Serialized::defaults(Self::default()))
            .merge(Toml::file("config.toml"))
            .merge(Env::prefixed("LLMQ_").split("__"))
            .merge(WellKnownEnv)
            .extract()
    }

    /// Load configuration with command line arguments override
    /// 加载配置并使用命令行参数覆盖
    pub fn load_with_cli(args: &CliArgs) -> Result<Self, figment::Error> {
        let mut figment = Figment::new().merge(Serialized::defaults(Self::default()));

        // Add config file if specified / 如果指定了配置文件则添加
        if let Some(ref config_path) = args.config {
            figment = figment.merge(Toml::file(config_path));
        } else {
            figment = figment.merge(Toml::file("config.toml"));
        }

        // Environment variables, well-known names last / 环境变量，知名名称在后
        figment = figment
            .merge(Env::prefixed("LLMQ_").split("__"))
            .merge(WellKnownEnv);

        // Command line arguments (highest priority) / 命令行参数（最高优先级）
        figment = figment.merge(args);

        figment.extract()
    }
}

static FILE_LOG_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();

/// Initialize tracing based on logging configuration
/// 基于日志配置初始化跟踪
pub fn init_tracing(config: &LogConfig) -> Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if config.level.trim().is_empty() {
            EnvFilter::new("info")
        } else {
            EnvFilter::new(config.level.clone())
        }
    });

    let registry = tracing_subscriber::registry().with(env_filter);

    let file_writer = if let Some(path) = config.file.as_ref() {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create log dir: {}", parent.display()))?;
        }
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("open log file: {}", path.display()))?;
        let (file_writer, guard) = tracing_appender::non_blocking(file);
        let _ = FILE_LOG_GUARD.set(guard);
        Some(file_writer)
    } else {
        None
    };

    match (config.format.as_str(), file_writer) {
        ("json", Some(file_writer)) => {
            let stdout_layer = tracing_subscriber::fmt::layer().json().with_target(true);
            let file_layer = tracing_subscriber::fmt::layer()
                .json()
                .with_target(true)
                .with_writer(file_writer);
            registry.with(stdout_layer).with(file_layer).init();
        }
        ("compact", Some(file_writer)) => {
            let stdout_layer = tracing_subscriber::fmt::layer().compact().with_target(true);
            let file_layer = tracing_subscriber::fmt::layer()
                .compact()
                .with_target(true)
                .with_writer(file_writer);
            registry.with(stdout_layer).with(file_layer).init();
        }
        (_, Some(file_writer)) => {
            let stdout_layer = tracing_subscriber::fmt::layer().pretty().with_target(true);
            // File output stays compact even when stdout is pretty
            // 即使stdout为pretty，文件输出仍保持compact
            let file_layer = tracing_subscriber::fmt::layer()
                .compact()
                .with_target(true)
                .with_writer(file_writer);
            registry.with(stdout_layer).with(file_layer).init();
        }
        ("json", None) => {
            let stdout_layer = tracing_subscriber::fmt::layer().json().with_target(true);
            registry.with(stdout_layer).init();
        }
        ("compact", None) => {
            let stdout_layer = tracing_subscriber::fmt::layer().compact().with_target(true);
            registry.with(stdout_layer).init();
        }
        (_, None) => {
            let stdout_layer = tracing_subscriber::fmt::layer().pretty().with_target(true);
            registry.with(stdout_layer).init();
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::fs;
    use tempfile::NamedTempFile;

    fn empty_args() -> CliArgs {
        CliArgs {
            config: None,
            http_addr: None,
            log_level: None,
            ollama_url: None,
            model: None,
            redis_url: None,
            store_backend: None,
        }
    }

    /// Test AppConfig default values / 测试AppConfig默认值
    #[test]
    fn test_app_config_default() {
        let config = AppConfig::default();

        assert_eq!(config.http.addr.to_string(), "0.0.0.0:8000");
        assert_eq!(config.backend.url, "http://localhost:11434/api/generate");
        assert_eq!(config.backend.model, "llama3");
        assert_eq!(config.backend.timeout_secs, 60);
        assert_eq!(config.store.backend, "redis");
        assert_eq!(config.store.redis_url, "redis://localhost:6379/0");
        assert!(!config.tracking.enabled);
        assert_eq!(config.tracking.uri, "http://localhost:5000");
        assert!(config.hugging_face_token.is_empty());
    }

    /// Test CliArgs as Figment Provider / 测试CliArgs作为Figment Provider
    #[test]
    fn test_cli_args_provider() {
        let args = CliArgs {
            http_addr: Some("127.0.0.1:9000".to_string()),
            ollama_url: Some("http://10.0.0.5:11434/api/generate".to_string()),
            store_backend: Some("memory".to_string()),
            ..empty_args()
        };

        let data = args.data().expect("Failed to get provider data");
        let default_profile = data.get(&Profile::Default).expect("No default profile");
        assert!(default_profile.contains_key("http"));
        assert!(default_profile.contains_key("backend"));
        assert!(default_profile.contains_key("store"));
        // Nothing for sections without explicit values / 没有显式值的部分不应出现
        assert!(!default_profile.contains_key("log"));
    }

    /// Test configuration priority: CLI > defaults / 测试配置优先级：CLI > 默认值
    #[test]
    #[serial]
    fn test_load_with_cli_args() {
        let args = CliArgs {
            http_addr: Some("127.0.0.1:9001".to_string()),
            model: Some("mistral".to_string()),
            redis_url: Some("redis://10.0.0.9:6379/1".to_string()),
            ..empty_args()
        };

        let config = AppConfig::load_with_cli(&args).expect("Failed to load config");

        assert_eq!(config.http.addr.to_string(), "127.0.0.1:9001");
        assert_eq!(config.backend.model, "mistral");
        assert_eq!(config.store.redis_url, "redis://10.0.0.9:6379/1");
        // Untouched sections keep defaults / 未触及的部分保持默认值
        assert_eq!(config.backend.url, "http://localhost:11434/api/generate");
    }

    /// Test configuration loading with config file / 测试使用配置文件加载配置
    #[test]
    #[serial]
    fn test_load_with_config_file() {
        let config_content = r#"
[http]
addr = "0.0.0.0:8081"

[backend]
url = "http://ollama.internal:11434/api/generate"
model = "llama3:70b"
timeout_secs = 120

[store]
backend = "memory"

[tracking]
enabled = true
uri = "http://mlflow.internal:5000"
"#;

        let temp_file = NamedTempFile::new().expect("Failed to create temp file");
        fs::write(temp_file.path(), config_content).expect("Failed to write config file");

        let args = CliArgs {
            config: Some(temp_file.path().to_string_lossy().to_string()),
            ..empty_args()
        };

        let config = AppConfig::load_with_cli(&args).expect("Failed to load config");

        assert_eq!(config.http.addr.to_string(), "0.0.0.0:8081");
        assert_eq!(config.backend.url, "http://ollama.internal:11434/api/generate");
        assert_eq!(config.backend.model, "llama3:70b");
        assert_eq!(config.backend.timeout_secs, 120);
        assert_eq!(config.store.backend, "memory");
        assert!(config.tracking.enabled);
        assert_eq!(config.tracking.uri, "http://mlflow.internal:5000");
    }

    /// Test well-known environment variable names / 测试知名环境变量名
    #[test]
    #[serial]
    fn test_well_known_env_vars() {
        std::env::set_var("OLLAMA_URL", "http://gpu-box:11434/api/generate");
        std::env::set_var("REDIS_URL", "redis://broker:6379/2");
        std::env::set_var("MLFLOW_TRACKING_URI", "http://tracker:5000");
        std::env::set_var("HUGGING_FACE_TOKEN", "hf_test_token");

        let config = AppConfig::load_with_cli(&empty_args()).expect("Failed to load config");

        std::env::remove_var("OLLAMA_URL");
        std::env::remove_var("REDIS_URL");
        std::env::remove_var("MLFLOW_TRACKING_URI");
        std::env::remove_var("HUGGING_FACE_TOKEN");

        assert_eq!(config.backend.url, "http://gpu-box:11434/api/generate");
        assert_eq!(config.store.redis_url, "redis://broker:6379/2");
        assert_eq!(config.tracking.uri, "http://tracker:5000");
        assert!(config.tracking.enabled);
        assert_eq!(config.hugging_face_token, "hf_test_token");
    }

    /// Test CLI overrides well-known env vars / 测试CLI覆盖知名环境变量
    #[test]
    #[serial]
    fn test_config_priority_cli_over_env() {
        std::env::set_var("OLLAMA_URL", "http://from-env:11434/api/generate");

        let args = CliArgs {
            ollama_url: Some("http://from-cli:11434/api/generate".to_string()),
            ..empty_args()
        };
        let config = AppConfig::load_with_cli(&args).expect("Failed to load config");

        std::env::remove_var("OLLAMA_URL");

        assert_eq!(config.backend.url, "http://from-cli:11434/api/generate");
    }

    /// Test invalid bind address is rejected / 测试无效绑定地址被拒绝
    #[test]
    #[serial]
    fn test_invalid_http_addr() {
        let config_content = r#"
[http]
addr = "not-an-address"
"#;

        let temp_file = NamedTempFile::new().expect("Failed to create temp file");
        fs::write(temp_file.path(), config_content).expect("Failed to write config file");

        let args = CliArgs {
            config: Some(temp_file.path().to_string_lossy().to_string()),
            ..empty_args()
        };

        assert!(AppConfig::load_with_cli(&args).is_err());
    }
}
