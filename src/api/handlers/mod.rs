//! HTTP handlers for llmq
//! llmq的HTTP处理器

pub mod common;
pub mod generate;
pub mod health;
pub mod result;

// Re-export all public items from each module / 重新导出每个模块的所有公共项
pub use common::*;
pub use generate::*;
pub use health::*;
pub use result::*;
