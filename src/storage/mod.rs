//! Storage module for llmq
//!
//! This module contains the task store abstraction and its backends. The
//! store is the hand-off point between the API process and worker processes:
//! it owns the pending-task queue and the per-task result records.
//!
//! llmq的存储模块
//!
//! 此模块包含任务存储抽象及其后端。存储是API进程和工作进程之间的交接点：
//! 它持有待处理任务队列和每个任务的结果记录。

pub mod memory;
pub mod redis;
pub mod task_store;

// Re-export commonly used types for convenience
// 为方便使用重新导出常用类型
pub use memory::MemoryTaskStore;
pub use redis::RedisTaskStore;
pub use task_store::{
    create_task_store, StoreConfig, TaskRecord, TaskState, TaskStatus, TaskStore,
};
