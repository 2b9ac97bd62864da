//! 从键值设置构建会话配置
//!
//! 所有数值输入在使用前夹到声明的范围内，非数字输入回退到默认值

use serde::{Deserialize, Serialize};

use crate::application::ports::{settings_keys as keys, SettingsStorePort};
use crate::domain::{CueToggles, InputBounds, PhaseTimings, SessionConfig};

/// 单个数值输入的范围与默认值
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputSpec {
    pub bounds: InputBounds,
    pub default: u32,
}

impl InputSpec {
    pub const fn new(min: u32, max: u32, default: u32) -> Self {
        Self {
            bounds: InputBounds::new(min, max),
            default,
        }
    }

    pub fn parse(&self, raw: Option<&str>) -> u32 {
        match raw {
            Some(raw) => self.bounds.parse_clamped(raw, self.default),
            None => self.bounds.clamp(i64::from(self.default)),
        }
    }
}

/// 会话默认值（设置缺失时使用）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionDefaults {
    pub total_duration_secs: u32,
    pub inhale: InputSpec,
    pub hold: InputSpec,
    pub exhale: InputSpec,
    pub volume: InputSpec,
    pub inhale_sound: bool,
    pub exhale_sound: bool,
    pub background: Option<String>,
    pub language: String,
}

impl Default for SessionDefaults {
    fn default() -> Self {
        Self {
            total_duration_secs: 300,
            inhale: InputSpec::new(1, 20, 4),
            hold: InputSpec::new(0, 20, 4),
            exhale: InputSpec::new(1, 20, 4),
            volume: InputSpec::new(0, 100, 50),
            inhale_sound: true,
            exhale_sound: true,
            background: None,
            language: "en".to_string(),
        }
    }
}

impl SessionDefaults {
    /// 把阶段时长夹到各自的范围内
    pub fn clamp_timings(&self, timings: PhaseTimings) -> PhaseTimings {
        PhaseTimings {
            inhale_secs: self.inhale.bounds.clamp(i64::from(timings.inhale_secs)),
            hold_secs: self.hold.bounds.clamp(i64::from(timings.hold_secs)),
            exhale_secs: self.exhale.bounds.clamp(i64::from(timings.exhale_secs)),
        }
    }

    pub fn clamp_volume(&self, percent: u32) -> u8 {
        self.volume.bounds.clamp(i64::from(percent)).min(100) as u8
    }
}

/// 读取设置并构建会话配置
pub fn load_session_config(store: &dyn SettingsStorePort, defaults: &SessionDefaults) -> SessionConfig {
    let read = |key: &str| store.get(key);

    let timings = PhaseTimings {
        inhale_secs: defaults.inhale.parse(read(keys::INHALE_DURATION).as_deref()),
        hold_secs: defaults.hold.parse(read(keys::HOLD_DURATION).as_deref()),
        exhale_secs: defaults.exhale.parse(read(keys::EXHALE_DURATION).as_deref()),
    };

    let cues = CueToggles {
        inhale: parse_toggle(read(keys::INHALE_SOUND_TOGGLE).as_deref(), defaults.inhale_sound),
        exhale: parse_toggle(read(keys::EXHALE_SOUND_TOGGLE).as_deref(), defaults.exhale_sound),
    };

    let background = match read(keys::BG_SOUND) {
        Some(id) => Some(id.trim().to_string()).filter(|id| !id.is_empty()),
        None => defaults.background.clone(),
    };

    let volume = defaults.volume.parse(read(keys::BG_VOLUME).as_deref()).min(100) as u8;

    SessionConfig {
        total_duration_secs: defaults.total_duration_secs,
        timings,
        cues,
        background,
        background_volume: volume,
    }
    .normalized()
}

/// 界面语言设置
pub fn load_language(store: &dyn SettingsStorePort, defaults: &SessionDefaults) -> String {
    store
        .get(keys::LANGUAGE)
        .map(|lang| lang.trim().to_string())
        .filter(|lang| !lang.is_empty())
        .unwrap_or_else(|| defaults.language.clone())
}

fn parse_toggle(raw: Option<&str>, default: bool) -> bool {
    match raw.map(str::trim) {
        Some("true") => true,
        Some("false") => false,
        Some(other) => {
            tracing::warn!(value = %other, "Invalid toggle setting, using default");
            default
        }
        None => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::memory::InMemorySettingsStore;

    fn store(pairs: &[(&str, &str)]) -> InMemorySettingsStore {
        let store = InMemorySettingsStore::new();
        for (key, value) in pairs {
            store.set(key, value).unwrap();
        }
        store
    }

    #[test]
    fn test_defaults_when_empty() {
        let defaults = SessionDefaults::default();
        let config = load_session_config(&store(&[]), &defaults);

        assert_eq!(config.total_duration_secs, 300);
        assert_eq!(config.timings, PhaseTimings::new(4, 4, 4));
        assert_eq!(config.cues, CueToggles::default());
        assert_eq!(config.background, None);
        assert_eq!(config.background_volume, 50);
    }

    #[test]
    fn test_reads_all_keys() {
        let defaults = SessionDefaults::default();
        let config = load_session_config(
            &store(&[
                ("inhaleDuration", "5"),
                ("holdDuration", "0"),
                ("exhaleDuration", "7"),
                ("inhaleSoundToggle", "false"),
                ("exhaleSoundToggle", "true"),
                ("bgSound", "sounds/rain.mp3"),
                ("bgVolume", "80"),
            ]),
            &defaults,
        );

        assert_eq!(config.timings, PhaseTimings::new(5, 0, 7));
        assert!(!config.cues.inhale);
        assert!(config.cues.exhale);
        assert_eq!(config.background.as_deref(), Some("sounds/rain.mp3"));
        assert_eq!(config.background_volume, 80);
    }

    #[test]
    fn test_out_of_range_inputs_are_clamped() {
        let defaults = SessionDefaults::default();
        let config = load_session_config(
            &store(&[
                ("inhaleDuration", "0"),
                ("holdDuration", "-4"),
                ("exhaleDuration", "500"),
                ("bgVolume", "250"),
            ]),
            &defaults,
        );

        assert_eq!(config.timings, PhaseTimings::new(1, 0, 20));
        assert_eq!(config.background_volume, 100);
    }

    #[test]
    fn test_non_numeric_inputs_fall_back() {
        let defaults = SessionDefaults::default();
        let config = load_session_config(
            &store(&[("inhaleDuration", "slow"), ("bgVolume", "loud")]),
            &defaults,
        );

        assert_eq!(config.timings.inhale_secs, 4);
        assert_eq!(config.background_volume, 50);
    }

    #[test]
    fn test_empty_background_means_none() {
        let defaults = SessionDefaults {
            background: Some("sounds/forest.mp3".to_string()),
            ..Default::default()
        };
        let config = load_session_config(&store(&[("bgSound", "")]), &defaults);
        assert_eq!(config.background, None);

        let config = load_session_config(&store(&[]), &defaults);
        assert_eq!(config.background.as_deref(), Some("sounds/forest.mp3"));
    }

    #[test]
    fn test_clamp_timings() {
        let defaults = SessionDefaults::default();
        assert_eq!(
            defaults.clamp_timings(PhaseTimings::new(0, 99, 3)),
            PhaseTimings::new(1, 20, 3)
        );
    }

    #[test]
    fn test_language() {
        let defaults = SessionDefaults::default();
        assert_eq!(load_language(&store(&[]), &defaults), "en");
        assert_eq!(load_language(&store(&[("language", "fa")]), &defaults), "fa");
    }
}
