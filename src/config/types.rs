//! Configuration Types
//!
//! 定义所有配置结构体

use serde::Deserialize;
use std::path::PathBuf;

use crate::application::session::{InputSpec, SessionDefaults};

/// 应用主配置
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// 音频配置
    #[serde(default)]
    pub audio: AudioConfig,

    /// 会话默认值
    #[serde(default)]
    pub session: SessionConfigSection,

    /// 输入范围
    #[serde(default)]
    pub inputs: InputsConfig,

    /// 设置存储
    #[serde(default)]
    pub settings: SettingsConfig,

    /// 多语言
    #[serde(default)]
    pub i18n: I18nConfig,

    /// 日志配置
    #[serde(default)]
    pub log: LogConfig,
}

impl AppConfig {
    /// 设置缺失时使用的会话默认值
    pub fn session_defaults(&self) -> SessionDefaults {
        SessionDefaults {
            total_duration_secs: self.session.total_duration_secs,
            inhale: self.inputs.inhale.spec(),
            hold: self.inputs.hold.spec(),
            exhale: self.inputs.exhale.spec(),
            volume: self.inputs.volume.spec(),
            inhale_sound: self.session.inhale_sound,
            exhale_sound: self.session.exhale_sound,
            background: self.session.background.clone().filter(|b| !b.is_empty()),
            language: self.i18n.language.clone(),
        }
    }
}

/// 音频配置
#[derive(Debug, Clone, Deserialize)]
pub struct AudioConfig {
    /// 本地资源根目录
    #[serde(default = "default_asset_root")]
    pub asset_root: PathBuf,

    /// 吸气提示音
    #[serde(default = "default_inhale_cue")]
    pub inhale_cue: String,

    /// 呼气提示音
    #[serde(default = "default_exhale_cue")]
    pub exhale_cue: String,

    /// 远程资源请求超时（秒）
    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout_secs: u64,

    /// 输出采样率（Hz）
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,

    /// 输出声道数
    #[serde(default = "default_channels")]
    pub channels: u16,

    /// 背景音增益上限
    #[serde(default = "default_max_gain")]
    pub max_gain: f32,

    /// 渲染周期（毫秒）
    #[serde(default = "default_render_interval")]
    pub render_interval_ms: u64,

    /// 是否打开系统默认输出设备
    #[serde(default = "default_device_output")]
    pub device_output: bool,

    /// 设备环形缓冲区容量（渲染块数）
    #[serde(default = "default_ring_buffer_chunks")]
    pub ring_buffer_chunks: usize,
}

fn default_asset_root() -> PathBuf {
    PathBuf::from("assets")
}

fn default_inhale_cue() -> String {
    "sounds/inhale.mp3".to_string()
}

fn default_exhale_cue() -> String {
    "sounds/exhale.mp3".to_string()
}

fn default_fetch_timeout() -> u64 {
    30
}

fn default_sample_rate() -> u32 {
    44100
}

fn default_channels() -> u16 {
    2 // 立体声
}

fn default_max_gain() -> f32 {
    1.0
}

fn default_render_interval() -> u64 {
    20
}

fn default_device_output() -> bool {
    true
}

fn default_ring_buffer_chunks() -> usize {
    8
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            asset_root: default_asset_root(),
            inhale_cue: default_inhale_cue(),
            exhale_cue: default_exhale_cue(),
            fetch_timeout_secs: default_fetch_timeout(),
            sample_rate: default_sample_rate(),
            channels: default_channels(),
            max_gain: default_max_gain(),
            render_interval_ms: default_render_interval(),
            device_output: default_device_output(),
            ring_buffer_chunks: default_ring_buffer_chunks(),
        }
    }
}

impl AudioConfig {
    /// 每个渲染周期的帧数
    pub fn frames_per_render(&self) -> usize {
        (u64::from(self.sample_rate) * self.render_interval_ms / 1000) as usize
    }
}

/// 会话默认值
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfigSection {
    /// 会话总时长（秒）
    #[serde(default = "default_total_duration")]
    pub total_duration_secs: u32,

    #[serde(default = "default_true")]
    pub inhale_sound: bool,

    #[serde(default = "default_true")]
    pub exhale_sound: bool,

    /// 默认背景音（设置中没有 bgSound 时使用）
    #[serde(default)]
    pub background: Option<String>,
}

fn default_total_duration() -> u32 {
    300 // 5 分钟
}

fn default_true() -> bool {
    true
}

impl Default for SessionConfigSection {
    fn default() -> Self {
        Self {
            total_duration_secs: default_total_duration(),
            inhale_sound: true,
            exhale_sound: true,
            background: None,
        }
    }
}

/// 单个数值输入的范围
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct InputRange {
    pub min: u32,
    pub max: u32,
    pub default: u32,
}

impl InputRange {
    pub const fn new(min: u32, max: u32, default: u32) -> Self {
        Self { min, max, default }
    }

    pub fn spec(&self) -> InputSpec {
        InputSpec::new(self.min, self.max, self.default)
    }

    fn is_valid(&self) -> bool {
        self.min <= self.default && self.default <= self.max
    }
}

/// 输入范围配置
#[derive(Debug, Clone, Deserialize)]
pub struct InputsConfig {
    #[serde(default = "default_inhale_range")]
    pub inhale: InputRange,

    #[serde(default = "default_hold_range")]
    pub hold: InputRange,

    #[serde(default = "default_exhale_range")]
    pub exhale: InputRange,

    #[serde(default = "default_volume_range")]
    pub volume: InputRange,
}

fn default_inhale_range() -> InputRange {
    InputRange::new(1, 20, 4)
}

fn default_hold_range() -> InputRange {
    InputRange::new(0, 20, 4)
}

fn default_exhale_range() -> InputRange {
    InputRange::new(1, 20, 4)
}

fn default_volume_range() -> InputRange {
    InputRange::new(0, 100, 50)
}

impl Default for InputsConfig {
    fn default() -> Self {
        Self {
            inhale: default_inhale_range(),
            hold: default_hold_range(),
            exhale: default_exhale_range(),
            volume: default_volume_range(),
        }
    }
}

impl InputsConfig {
    /// 返回第一个无效范围的名称
    pub(crate) fn invalid_range(&self) -> Option<&'static str> {
        [
            ("inhale", &self.inhale),
            ("hold", &self.hold),
            ("exhale", &self.exhale),
            ("volume", &self.volume),
        ]
        .into_iter()
        .find(|(_, range)| !range.is_valid())
        .map(|(name, _)| name)
    }
}

/// 设置存储配置
#[derive(Debug, Clone, Deserialize)]
pub struct SettingsConfig {
    /// 设置文件路径
    #[serde(default = "default_settings_path")]
    pub path: PathBuf,
}

fn default_settings_path() -> PathBuf {
    PathBuf::from("data/settings.toml")
}

impl Default for SettingsConfig {
    fn default() -> Self {
        Self {
            path: default_settings_path(),
        }
    }
}

/// 多语言配置
#[derive(Debug, Clone, Deserialize)]
pub struct I18nConfig {
    /// 标签目录文件
    #[serde(default = "default_catalog")]
    pub catalog: PathBuf,

    /// 默认语言
    #[serde(default = "default_language")]
    pub language: String,
}

fn default_catalog() -> PathBuf {
    PathBuf::from("lang.json")
}

fn default_language() -> String {
    "en".to_string()
}

impl Default for I18nConfig {
    fn default() -> Self {
        Self {
            catalog: default_catalog(),
            language: default_language(),
        }
    }
}

/// 日志配置
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub level: String,

    /// 是否启用 JSON 格式
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}
