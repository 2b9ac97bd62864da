//! Session Commands - 会话命令
//!
//! 外围 UI 发给会话 worker 的全部操作

use crate::domain::{PhaseTimings, SessionConfig};

/// 会话命令
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    /// 以当前设置开始会话（已在运行时忽略）
    Start,
    /// 以指定配置开始会话
    StartWith(SessionConfig),
    /// 停止会话
    Stop,
    /// 开始 / 停止按钮
    Toggle,
    /// 修改总时长
    SetTotalDuration(u32),
    /// 修改阶段时长（下一个阶段生效）
    SetPhaseTimings(PhaseTimings),
    /// 修改背景音音量
    SetLoopVolume(u8),
    /// 切换背景音；None 表示关闭
    ChangeBackground(Option<String>),
    /// 切换界面语言
    SetLanguage(String),
    /// 停止一切并退出 worker
    Shutdown,
}
