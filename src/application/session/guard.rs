//! 会话守卫
//!
//! 每次阶段切换前统一检查的条件

use serde::{Deserialize, Serialize};

/// 阶段切换前查询的守卫
pub trait SessionGuard {
    fn is_running(&self) -> bool;

    fn remaining_seconds(&self) -> u32;

    /// 会话仍在运行且还有剩余时间
    fn permits_transition(&self) -> bool {
        self.is_running() && self.remaining_seconds() > 0
    }
}

/// 会话倒计时状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SessionState {
    pub remaining_seconds: u32,
    pub running: bool,
}

impl SessionState {
    pub fn idle(total_duration_secs: u32) -> Self {
        Self {
            remaining_seconds: total_duration_secs,
            running: false,
        }
    }
}

impl SessionGuard for SessionState {
    fn is_running(&self) -> bool {
        self.running
    }

    fn remaining_seconds(&self) -> u32 {
        self.remaining_seconds
    }
}
