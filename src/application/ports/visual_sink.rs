//! Visual Sink Port - 视觉副作用出口
//!
//! 核心只发出事件；缩放动画、标签淡入淡出、计时器文本由外部渲染

use serde::{Deserialize, Serialize};

use crate::domain::{PhaseState, SessionDisplayState};

/// 视觉事件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum VisualEvent {
    /// 进入阶段（Idle 表示复位到静止大小并隐藏标签）
    Phase {
        phase: PhaseState,
        /// 过渡动画时长（秒）
        duration_secs: f32,
        /// 指示圆目标缩放；None 表示保持当前大小
        #[serde(skip_serializing_if = "Option::is_none")]
        scale: Option<f32>,
        /// 阶段标签；None 表示隐藏
        #[serde(skip_serializing_if = "Option::is_none")]
        label: Option<String>,
    },
    /// 会话完成 / 就绪
    Session {
        state: SessionDisplayState,
        label: String,
    },
    /// 剩余时间显示
    Remaining { seconds: u32, text: String },
}

impl VisualEvent {
    pub fn phase(&self) -> Option<PhaseState> {
        match self {
            Self::Phase { phase, .. } => Some(*phase),
            _ => None,
        }
    }

    pub fn session_state(&self) -> Option<SessionDisplayState> {
        match self {
            Self::Session { state, .. } => Some(*state),
            _ => None,
        }
    }
}

/// Visual Sink Port
pub trait VisualSinkPort: Send + Sync {
    fn publish(&self, event: VisualEvent);
}
