//! Worker Layer - 实时会话驱动
//!
//! DelayQueueScheduler 负责真实时间的定时器，SessionWorker 串行处理命令与定时器

mod delay_queue_scheduler;
mod session_worker;

pub use delay_queue_scheduler::DelayQueueScheduler;
pub use session_worker::{SessionHandle, SessionWorker, SessionWorkerConfig, WorkerError};
