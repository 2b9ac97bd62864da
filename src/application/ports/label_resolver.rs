//! Label Resolver Port - 文本标签解析（i18n）

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{PhaseState, SessionDisplayState};

/// 标签目录错误
#[derive(Debug, Error)]
pub enum LabelError {
    #[error("Unknown language: {0}")]
    UnknownLanguage(String),

    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),
}

/// 核心使用到的标签
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LabelKey {
    Inhale,
    Hold,
    Exhale,
    Done,
    Ready,
}

impl LabelKey {
    pub fn for_phase(phase: PhaseState) -> Option<Self> {
        match phase {
            PhaseState::Inhale => Some(Self::Inhale),
            PhaseState::Hold => Some(Self::Hold),
            PhaseState::Exhale => Some(Self::Exhale),
            PhaseState::Idle => None,
        }
    }

    pub fn for_display(state: SessionDisplayState) -> Self {
        match state {
            SessionDisplayState::Done => Self::Done,
            SessionDisplayState::Ready => Self::Ready,
        }
    }

    /// 目录中的键名
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Inhale => "inhale",
            Self::Hold => "hold",
            Self::Exhale => "exhale",
            Self::Done => "done",
            Self::Ready => "ready",
        }
    }

    /// 英文默认文本
    pub fn default_text(self) -> &'static str {
        match self {
            Self::Inhale => "Inhale",
            Self::Hold => "Hold",
            Self::Exhale => "Exhale",
            Self::Done => "Done",
            Self::Ready => "Ready",
        }
    }
}

/// 文本方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextDirection {
    Ltr,
    Rtl,
}

/// Label Resolver Port
pub trait LabelResolverPort: Send + Sync {
    fn resolve(&self, key: LabelKey) -> String;

    fn direction(&self) -> TextDirection {
        TextDirection::Ltr
    }

    /// 切换语言；只有内置英文的实现只接受 "en"
    fn set_language(&self, language: &str) -> Result<(), LabelError> {
        if language == "en" {
            Ok(())
        } else {
            Err(LabelError::UnknownLanguage(language.to_string()))
        }
    }
}
