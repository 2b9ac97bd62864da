//! Breathing Context - Value Objects

use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::PhaseState;

/// 运行代次
///
/// 每次 start / stop 都会递增。所有定时回调在调度时捕获当前代次，
/// 触发时与控制器的代次比较，不一致即为过期回调
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct RunGeneration(u64);

impl RunGeneration {
    pub fn initial() -> Self {
        Self(0)
    }

    pub fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }

    pub fn value(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for RunGeneration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// 输入控件声明的取值范围（闭区间）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputBounds {
    pub min: u32,
    pub max: u32,
}

impl InputBounds {
    pub const fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }

    pub fn clamp(&self, value: i64) -> u32 {
        value.clamp(i64::from(self.min), i64::from(self.max)) as u32
    }

    /// 解析文本输入并夹到范围内
    ///
    /// 非数字输入回退到 `default`；小数向下取整
    pub fn parse_clamped(&self, raw: &str, default: u32) -> u32 {
        match raw.trim().parse::<f64>() {
            Ok(value) if value.is_finite() => self.clamp(value.floor() as i64),
            _ => self.clamp(i64::from(default)),
        }
    }
}

/// 各阶段时长（秒）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseTimings {
    pub inhale_secs: u32,
    pub hold_secs: u32,
    pub exhale_secs: u32,
}

impl PhaseTimings {
    pub fn new(inhale_secs: u32, hold_secs: u32, exhale_secs: u32) -> Self {
        Self {
            inhale_secs,
            hold_secs,
            exhale_secs,
        }
    }

    /// 阶段时长；Idle 为 0
    pub fn duration_of(&self, phase: PhaseState) -> Duration {
        let secs = match phase {
            PhaseState::Inhale => self.inhale_secs,
            PhaseState::Hold => self.hold_secs,
            PhaseState::Exhale => self.exhale_secs,
            PhaseState::Idle => 0,
        };
        Duration::from_secs(u64::from(secs))
    }

    pub fn cycle_secs(&self) -> u32 {
        self.inhale_secs + self.hold_secs + self.exhale_secs
    }

    /// 吸气、呼气至少 1 秒；屏气可以为 0
    pub fn normalized(self) -> Self {
        Self {
            inhale_secs: self.inhale_secs.max(1),
            hold_secs: self.hold_secs,
            exhale_secs: self.exhale_secs.max(1),
        }
    }
}

impl Default for PhaseTimings {
    fn default() -> Self {
        Self::new(4, 4, 4)
    }
}

/// 提示音开关
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CueToggles {
    pub inhale: bool,
    pub exhale: bool,
}

impl CueToggles {
    pub fn is_enabled(&self, cue: super::CueKind) -> bool {
        match cue {
            super::CueKind::Inhale => self.inhale,
            super::CueKind::Exhale => self.exhale,
        }
    }
}

impl Default for CueToggles {
    fn default() -> Self {
        Self {
            inhale: true,
            exhale: true,
        }
    }
}

/// 单次会话的配置
///
/// 不变量（由 `normalized` 保证）:
/// - total_duration_secs >= 1
/// - inhale / exhale >= 1，hold >= 0
/// - background_volume <= 100
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    pub total_duration_secs: u32,
    pub timings: PhaseTimings,
    pub cues: CueToggles,
    pub background: Option<String>,
    pub background_volume: u8,
}

impl SessionConfig {
    pub fn new(total_duration_secs: u32, timings: PhaseTimings) -> Self {
        Self {
            total_duration_secs,
            timings,
            ..Default::default()
        }
    }

    pub fn with_cues(mut self, cues: CueToggles) -> Self {
        self.cues = cues;
        self
    }

    pub fn with_background(mut self, sound_id: impl Into<String>, volume_percent: u8) -> Self {
        let sound_id = sound_id.into();
        self.background = (!sound_id.is_empty()).then_some(sound_id);
        self.background_volume = volume_percent;
        self
    }

    pub fn normalized(mut self) -> Self {
        self.total_duration_secs = self.total_duration_secs.max(1);
        self.timings = self.timings.normalized();
        self.background_volume = self.background_volume.min(100);
        self.background = self.background.filter(|id| !id.is_empty());
        self
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            total_duration_secs: 300,
            timings: PhaseTimings::default(),
            cues: CueToggles::default(),
            background: None,
            background_volume: 50,
        }
    }
}

/// 将剩余秒数格式化为 `M:SS`
pub fn format_time(seconds: u32) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(0), "0:00");
        assert_eq!(format_time(59), "0:59");
        assert_eq!(format_time(60), "1:00");
        assert_eq!(format_time(125), "2:05");
        assert_eq!(format_time(3600), "60:00");
    }

    #[test]
    fn test_bounds_clamp() {
        let bounds = InputBounds::new(1, 20);
        assert_eq!(bounds.clamp(0), 1);
        assert_eq!(bounds.clamp(-5), 1);
        assert_eq!(bounds.clamp(25), 20);
        assert_eq!(bounds.clamp(7), 7);
    }

    #[test]
    fn test_bounds_parse_clamped() {
        let bounds = InputBounds::new(0, 10);
        assert_eq!(bounds.parse_clamped("4", 2), 4);
        assert_eq!(bounds.parse_clamped(" 4.9 ", 2), 4);
        assert_eq!(bounds.parse_clamped("99", 2), 10);
        assert_eq!(bounds.parse_clamped("-3", 2), 0);
        // 非数字输入使用默认值
        assert_eq!(bounds.parse_clamped("abc", 2), 2);
        assert_eq!(bounds.parse_clamped("", 2), 2);
        assert_eq!(bounds.parse_clamped("NaN", 2), 2);
    }

    #[test]
    fn test_generation_is_monotonic() {
        let g0 = RunGeneration::initial();
        let g1 = g0.next();
        assert!(g1 > g0);
        assert_ne!(g1, g1.next());
    }

    #[test]
    fn test_session_config_normalized() {
        let config = SessionConfig {
            total_duration_secs: 0,
            timings: PhaseTimings::new(0, 0, 0),
            cues: CueToggles::default(),
            background: Some(String::new()),
            background_volume: 250,
        }
        .normalized();

        assert_eq!(config.total_duration_secs, 1);
        assert_eq!(config.timings, PhaseTimings::new(1, 0, 1));
        assert_eq!(config.background, None);
        assert_eq!(config.background_volume, 100);
    }

    #[test]
    fn test_cycle_secs() {
        let timings = PhaseTimings::new(4, 7, 8);
        assert_eq!(timings.cycle_secs(), 19);
        assert_eq!(timings.duration_of(PhaseState::Hold), Duration::from_secs(7));
        assert_eq!(timings.duration_of(PhaseState::Idle), Duration::ZERO);
    }
}
