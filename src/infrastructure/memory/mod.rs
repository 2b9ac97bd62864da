//! Memory Layer - In-Memory Implementations
//!
//! 设置存储和虚拟时钟调度器的内存实现

mod manual_scheduler;
mod settings_store;

pub use manual_scheduler::ManualScheduler;
pub use settings_store::InMemorySettingsStore;
