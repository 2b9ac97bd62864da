//! Configuration Loader
//!
//! 实现多源配置加载与合并逻辑
//!
//! 优先级（从高到低）：
//! 1. 环境变量
//! 2. 配置文件（breathe.toml）
//! 3. 默认值

use config::{Config, ConfigError as ConfigCrateError, Environment, File};
use std::path::Path;
use thiserror::Error;

use super::types::AppConfig;

/// 配置加载错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<ConfigCrateError> for ConfigError {
    fn from(err: ConfigCrateError) -> Self {
        ConfigError::LoadError(err.to_string())
    }
}

/// 配置文件搜索路径
const CONFIG_FILE_NAMES: &[&str] = &["breathe", "breathe.local"];

/// 加载应用配置
///
/// 按优先级从高到低合并配置：
/// 1. 环境变量（前缀 `BREATHE_`，层级分隔符 `__`）
/// 2. 配置文件（breathe.toml 或 breathe.local.toml）
/// 3. 默认值
///
/// # 环境变量示例
/// - `BREATHE_SESSION__TOTAL_DURATION_SECS=600`
/// - `BREATHE_AUDIO__ASSET_ROOT=/usr/share/breathe`
/// - `BREATHE_I18N__LANGUAGE=fa`
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from_path(None)
}

/// 从指定路径加载配置
///
/// # 参数
/// - `config_path` - 可选的配置文件路径，如果为 None 则使用默认搜索路径
pub fn load_config_from_path(config_path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder();

    // 1. 默认值（最低优先级）
    builder = builder
        .set_default("audio.asset_root", "assets")?
        .set_default("audio.inhale_cue", "sounds/inhale.mp3")?
        .set_default("audio.exhale_cue", "sounds/exhale.mp3")?
        .set_default("audio.fetch_timeout_secs", 30)?
        .set_default("audio.sample_rate", 44100)?
        .set_default("audio.channels", 2)?
        .set_default("audio.max_gain", 1.0)?
        .set_default("audio.render_interval_ms", 20)?
        .set_default("audio.device_output", true)?
        .set_default("audio.ring_buffer_chunks", 8)?
        .set_default("session.total_duration_secs", 300)?
        .set_default("session.inhale_sound", true)?
        .set_default("session.exhale_sound", true)?
        .set_default("settings.path", "data/settings.toml")?
        .set_default("i18n.catalog", "lang.json")?
        .set_default("i18n.language", "en")?
        .set_default("log.level", "info")?
        .set_default("log.json", false)?;

    // 2. 配置文件
    if let Some(path) = config_path {
        builder = builder.add_source(File::from(path).required(true));
    } else {
        for name in CONFIG_FILE_NAMES {
            builder = builder.add_source(File::with_name(name).required(false));
        }
    }

    // 3. 环境变量（最高优先级）
    // 例如: BREATHE_AUDIO__MAX_GAIN=0.8
    builder = builder.add_source(
        Environment::with_prefix("BREATHE")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;

    let app_config: AppConfig = config.try_deserialize().map_err(|e| {
        ConfigError::ParseError(format!("Failed to deserialize config: {}", e))
    })?;

    validate_config(&app_config)?;

    Ok(app_config)
}

/// 验证配置有效性
fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    if config.audio.sample_rate == 0 {
        return Err(ConfigError::ValidationError(
            "Sample rate cannot be 0".to_string(),
        ));
    }

    if config.audio.channels == 0 {
        return Err(ConfigError::ValidationError(
            "Channel count cannot be 0".to_string(),
        ));
    }

    if !config.audio.max_gain.is_finite() || config.audio.max_gain <= 0.0 {
        return Err(ConfigError::ValidationError(format!(
            "Invalid max gain: {}",
            config.audio.max_gain
        )));
    }

    if config.audio.ring_buffer_chunks == 0 {
        return Err(ConfigError::ValidationError(
            "Ring buffer must hold at least one chunk".to_string(),
        ));
    }

    if config.audio.render_interval_ms == 0 {
        return Err(ConfigError::ValidationError(
            "Render interval cannot be 0".to_string(),
        ));
    }

    if config.audio.inhale_cue.is_empty() || config.audio.exhale_cue.is_empty() {
        return Err(ConfigError::ValidationError(
            "Cue sound ids cannot be empty".to_string(),
        ));
    }

    if config.session.total_duration_secs == 0 {
        return Err(ConfigError::ValidationError(
            "Total duration cannot be 0".to_string(),
        ));
    }

    if let Some(name) = config.inputs.invalid_range() {
        return Err(ConfigError::ValidationError(format!(
            "Input range '{}' must satisfy min <= default <= max",
            name
        )));
    }

    if config.inputs.inhale.min == 0 || config.inputs.exhale.min == 0 {
        return Err(ConfigError::ValidationError(
            "Inhale and exhale must last at least 1 second".to_string(),
        ));
    }

    if config.inputs.volume.max > 100 {
        return Err(ConfigError::ValidationError(
            "Volume cannot exceed 100".to_string(),
        ));
    }

    if config.i18n.language.is_empty() {
        return Err(ConfigError::ValidationError(
            "Language cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// 打印配置信息（用于启动时日志）
pub fn print_config(config: &AppConfig) {
    tracing::info!("=== Application Configuration ===");
    tracing::info!("Asset Root: {:?}", config.audio.asset_root);
    tracing::info!(
        "Cues: inhale={}, exhale={}",
        config.audio.inhale_cue,
        config.audio.exhale_cue
    );
    tracing::info!(
        "Output: {} Hz, {} channels, max gain {}, device {}",
        config.audio.sample_rate,
        config.audio.channels,
        config.audio.max_gain,
        if config.audio.device_output { "on" } else { "off" }
    );
    tracing::info!("Total Duration: {}s", config.session.total_duration_secs);
    if let Some(background) = &config.session.background {
        tracing::info!("Default Background: {}", background);
    }
    tracing::info!("Settings: {:?}", config.settings.path);
    tracing::info!(
        "Labels: {:?} ({})",
        config.i18n.catalog,
        config.i18n.language
    );
    tracing::info!("Log Level: {}", config.log.level);
    tracing::info!("=================================");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::InputRange;
    use tempfile::TempDir;

    #[test]
    fn test_validation_passes_for_valid_config() {
        let config = AppConfig::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validation_error_for_zero_sample_rate() {
        let mut config = AppConfig::default();
        config.audio.sample_rate = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validation_error_for_empty_ring_buffer() {
        let mut config = AppConfig::default();
        config.audio.ring_buffer_chunks = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validation_error_for_empty_cue() {
        let mut config = AppConfig::default();
        config.audio.exhale_cue = String::new();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validation_error_for_impossible_range() {
        let mut config = AppConfig::default();
        config.inputs.hold = InputRange::new(5, 2, 3);
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::ValidationError(_))
        ));

        let mut config = AppConfig::default();
        config.inputs.inhale = InputRange::new(0, 20, 4);
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("breathe.toml");
        std::fs::write(
            &path,
            r#"
[session]
total_duration_secs = 120
background = "sounds/rain.mp3"

[inputs.hold]
min = 0
max = 10
default = 2

[i18n]
language = "fa"
"#,
        )
        .unwrap();

        let config = load_config_from_path(Some(&path)).unwrap();
        assert_eq!(config.session.total_duration_secs, 120);
        assert_eq!(config.session.background.as_deref(), Some("sounds/rain.mp3"));
        assert_eq!(config.inputs.hold, InputRange::new(0, 10, 2));
        assert_eq!(config.inputs.inhale, InputRange::new(1, 20, 4));
        assert_eq!(config.audio.sample_rate, 44100);

        let defaults = config.session_defaults();
        assert_eq!(defaults.language, "fa");
        assert_eq!(defaults.hold.default, 2);
    }

    #[test]
    fn test_missing_required_file() {
        let dir = TempDir::new().unwrap();
        let result = load_config_from_path(Some(&dir.path().join("missing.toml")));
        assert!(matches!(result, Err(ConfigError::LoadError(_))));
    }
}
