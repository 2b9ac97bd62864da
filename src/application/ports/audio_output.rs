//! Audio Output Port - 共享音频输出图
//!
//! 一个输出图包含两条路径：
//! - 直连输出的一次性提示音
//! - 经过增益节点的背景音总线（同一时间只循环一个声音）

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use super::AudioBuffer;

/// 输出错误
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to resume audio output: {0}")]
    ResumeFailed(String),

    #[error("Audio output is closed")]
    Closed,

    #[error("Invalid buffer: {0}")]
    InvalidBuffer(String),

    #[error("Audio device unavailable: {0}")]
    DeviceUnavailable(String),

    #[error("Device buffer full")]
    BufferFull,
}

/// 输出状态
///
/// 浏览器自动播放策略之类的限制会让输出处于 Suspended，需要 resume 才能发声
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputState {
    Suspended,
    Running,
    Closed,
}

/// 正在播放的声部标识
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VoiceId(Uuid);

impl VoiceId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for VoiceId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for VoiceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Audio Output Port
#[async_trait]
pub trait AudioOutputPort: Send + Sync {
    fn state(&self) -> OutputState;

    /// 从 Suspended 恢复
    async fn resume(&self) -> Result<(), OutputError>;

    /// 直连输出播放一次，结束后由输出自行释放
    fn play_once(&self, buffer: &AudioBuffer) -> Result<VoiceId, OutputError>;

    /// 在背景音总线上循环播放
    fn start_background(&self, buffer: &AudioBuffer) -> Result<VoiceId, OutputError>;

    /// 停止并释放声部；未知声部忽略
    fn stop_voice(&self, voice: VoiceId);

    fn set_background_gain(&self, gain: f32);

    fn background_gain(&self) -> f32;

    /// 增益节点允许的最大增益
    fn max_gain(&self) -> f32;
}
