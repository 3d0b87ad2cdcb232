//! Shared API state
//! 共享API状态

use std::sync::Arc;

use crate::backend::OllamaClient;
use crate::storage::TaskStore;

/// State shared by all HTTP handlers / 所有HTTP处理器共享的状态
#[derive(Clone)]
pub struct ApiState {
    /// Inference backend client / 推理后端客户端
    pub backend: Arc<OllamaClient>,
    /// Task store adapter / 任务存储适配器
    pub store: Arc<dyn TaskStore>,
}
