//! Scheduler Port - 延时回调
//!
//! 控制器通过此端口登记定时器；由实现方在到期时把 `SessionTimer`
//! 交还给控制器的 `on_timer`

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::domain::{PhaseState, RunGeneration};

/// 定时器句柄
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TimerKey(u64);

impl TimerKey {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn value(self) -> u64 {
        self.0
    }
}

/// 已调度的阶段切换
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseTransition {
    pub generation: RunGeneration,
    pub next: PhaseState,
}

/// 会话定时器
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionTimer {
    /// 阶段切换
    Phase(PhaseTransition),
    /// 每秒倒计时
    Tick { generation: RunGeneration },
    /// 完成后延迟回到就绪状态
    ReadyReset { generation: RunGeneration },
}

impl SessionTimer {
    pub fn generation(&self) -> RunGeneration {
        match self {
            Self::Phase(transition) => transition.generation,
            Self::Tick { generation } | Self::ReadyReset { generation } => *generation,
        }
    }
}

/// Scheduler Port
pub trait SchedulerPort: Send {
    /// 在 `delay` 之后触发 `timer`
    ///
    /// 相同延迟的定时器按登记顺序触发
    fn schedule(&mut self, delay: Duration, timer: SessionTimer) -> TimerKey;

    /// 取消定时器；已触发或未知的句柄返回 false
    fn cancel(&mut self, key: TimerKey) -> bool;

    /// 尚未触发的定时器数量
    fn pending(&self) -> usize;
}
