//! Settings Store Port - 键值设置存储
//!
//! 核心只读取设置，写入由外围 UI 负责

use thiserror::Error;

/// 设置存储错误
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

/// 设置键名
pub mod keys {
    pub const INHALE_DURATION: &str = "inhaleDuration";
    pub const EXHALE_DURATION: &str = "exhaleDuration";
    pub const HOLD_DURATION: &str = "holdDuration";
    pub const INHALE_SOUND_TOGGLE: &str = "inhaleSoundToggle";
    pub const EXHALE_SOUND_TOGGLE: &str = "exhaleSoundToggle";
    pub const BG_SOUND: &str = "bgSound";
    pub const BG_VOLUME: &str = "bgVolume";
    pub const LANGUAGE: &str = "language";

    pub const ALL: &[&str] = &[
        INHALE_DURATION,
        EXHALE_DURATION,
        HOLD_DURATION,
        INHALE_SOUND_TOGGLE,
        EXHALE_SOUND_TOGGLE,
        BG_SOUND,
        BG_VOLUME,
        LANGUAGE,
    ];
}

/// Settings Store Port
pub trait SettingsStorePort: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;

    fn set(&self, key: &str, value: &str) -> Result<(), SettingsError>;
}
