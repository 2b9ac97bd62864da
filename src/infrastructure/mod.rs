//! Infrastructure Layer - 基础设施层
//!
//! 提供所有端口的具体实现

pub mod adapters;
pub mod events;
pub mod memory;
pub mod persistence;
pub mod worker;

pub use events::VisualEventPublisher;
pub use memory::{InMemorySettingsStore, ManualScheduler};
pub use persistence::TomlSettingsStore;
pub use worker::{DelayQueueScheduler, SessionHandle, SessionWorker, SessionWorkerConfig};
