//! Breathing Context - 呼吸阶段

use serde::{Deserialize, Serialize};

/// 指示圆静止时的缩放比例
pub const RESTING_SCALE: f32 = 0.75;

/// 吸气结束时指示圆的缩放比例
pub const EXPANDED_SCALE: f32 = 1.0;

/// 复位动画时长（秒）
pub const RESET_TRANSITION_SECS: f32 = 0.3;

/// 呼吸阶段状态
///
/// 固定循环: Inhale → Hold → Exhale → Inhale …
/// Idle 既是初始状态，也是两次会话之间的终止状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PhaseState {
    #[default]
    Idle,
    Inhale,
    Hold,
    Exhale,
}

impl PhaseState {
    /// 循环中的下一个阶段
    pub fn next(self) -> Self {
        match self {
            Self::Idle | Self::Exhale => Self::Inhale,
            Self::Inhale => Self::Hold,
            Self::Hold => Self::Exhale,
        }
    }

    pub fn is_idle(self) -> bool {
        self == Self::Idle
    }

    /// 进入该阶段时指示圆的目标缩放
    ///
    /// Hold 保持吸气后的大小，因此没有目标值
    pub fn target_scale(self) -> Option<f32> {
        match self {
            Self::Inhale => Some(EXPANDED_SCALE),
            Self::Idle | Self::Exhale => Some(RESTING_SCALE),
            Self::Hold => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Inhale => "inhale",
            Self::Hold => "hold",
            Self::Exhale => "exhale",
        }
    }
}

impl std::fmt::Display for PhaseState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// 提示音类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CueKind {
    Inhale,
    Exhale,
}

impl CueKind {
    /// 该阶段对应的提示音
    pub fn for_phase(phase: PhaseState) -> Option<Self> {
        match phase {
            PhaseState::Inhale => Some(Self::Inhale),
            PhaseState::Exhale => Some(Self::Exhale),
            PhaseState::Hold | PhaseState::Idle => None,
        }
    }
}

/// 会话结束后的显示状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionDisplayState {
    Done,
    Ready,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_order() {
        let mut phase = PhaseState::Idle;
        let mut visited = Vec::new();
        for _ in 0..4 {
            phase = phase.next();
            visited.push(phase);
        }
        assert_eq!(
            visited,
            vec![
                PhaseState::Inhale,
                PhaseState::Hold,
                PhaseState::Exhale,
                PhaseState::Inhale
            ]
        );
    }

    #[test]
    fn test_target_scale() {
        assert_eq!(PhaseState::Inhale.target_scale(), Some(EXPANDED_SCALE));
        assert_eq!(PhaseState::Exhale.target_scale(), Some(RESTING_SCALE));
        assert_eq!(PhaseState::Idle.target_scale(), Some(RESTING_SCALE));
        assert_eq!(PhaseState::Hold.target_scale(), None);
    }

    #[test]
    fn test_cue_for_phase() {
        assert_eq!(CueKind::for_phase(PhaseState::Inhale), Some(CueKind::Inhale));
        assert_eq!(CueKind::for_phase(PhaseState::Exhale), Some(CueKind::Exhale));
        assert_eq!(CueKind::for_phase(PhaseState::Hold), None);
    }
}
