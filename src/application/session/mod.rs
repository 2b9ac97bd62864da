//! 会话编排
//!
//! - guard: 会话运行条件
//! - sequencer: 吸气 / 屏息 / 呼气状态机
//! - controller: 倒计时、音频与定时器的编排
//! - settings: 从设置存储恢复会话配置
//! - commands: worker 命令

mod commands;
mod controller;
mod guard;
mod sequencer;
mod settings;

pub use commands::SessionCommand;
pub use controller::{
    CueAssets, SessionController, SessionSnapshot, DONE_DISPLAY_DELAY, TICK_INTERVAL,
};
pub use guard::{SessionGuard, SessionState};
pub use sequencer::{PhaseEffect, PhaseSequencer, PhaseStep, ScheduledPhase};
pub use settings::{load_language, load_session_config, InputSpec, SessionDefaults};
