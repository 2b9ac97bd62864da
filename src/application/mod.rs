//! 应用层 - 用例编排
//!
//! 包含：
//! - ports: 六边形架构端口定义（资源、解码、输出、调度、设置、标签、视觉）
//! - audio: 解码缓存与播放引擎
//! - session: 阶段状态机与会话控制器

pub mod audio;
pub mod ports;
pub mod session;

pub use audio::{AudioBufferCache, AudioPlaybackEngine, BufferCacheStats, LoopHandle};
pub use session::{
    load_language, load_session_config, CueAssets, SessionCommand, SessionController,
    SessionDefaults, SessionSnapshot,
};
