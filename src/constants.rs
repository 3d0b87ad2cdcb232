//! Shared constants for llmq components
//! llmq组件的共享常量

/// Key prefix for stored task records / 存储任务记录的键前缀
pub const TASK_KEY_PREFIX: &str = "llmq:task:";

/// List key used as the pending-task queue / 用作待处理任务队列的列表键
pub const TASK_QUEUE_KEY: &str = "llmq:queue";

/// Default dequeue poll timeout in seconds / 默认出队轮询超时（秒）
pub const DEFAULT_POLL_TIMEOUT_SECS: u64 = 5;

/// Default inference request timeout in seconds / 默认推理请求超时（秒）
pub const DEFAULT_BACKEND_TIMEOUT_SECS: u64 = 60;

/// Maximum length of a tracked parameter value / 跟踪参数值的最大长度
pub const TRACKING_PARAM_MAX_LEN: usize = 500;
