//! Breathing Context - 呼吸会话限界上下文
//!
//! 职责:
//! - 呼吸阶段及其循环顺序
//! - 会话配置与输入取值范围
//! - 运行代次（过期回调判定）

mod phase;
mod value_objects;

pub use phase::{
    CueKind, PhaseState, SessionDisplayState, EXPANDED_SCALE, RESET_TRANSITION_SECS,
    RESTING_SCALE,
};
pub use value_objects::{
    format_time, CueToggles, InputBounds, PhaseTimings, RunGeneration, SessionConfig,
};
