//! Domain Layer - 领域层
//!
//! 只有一个限界上下文:
//! - Breathing Context: 呼吸阶段、会话配置、运行代次

pub mod breathing;

pub use breathing::{
    format_time, CueKind, CueToggles, InputBounds, PhaseState, PhaseTimings, RunGeneration,
    SessionConfig, SessionDisplayState, EXPANDED_SCALE, RESET_TRANSITION_SECS, RESTING_SCALE,
};
