//! 音频服务
//!
//! - AudioBufferCache: 资源读取 + 解码 + 缓存
//! - AudioPlaybackEngine: 共享输出图上的提示音 / 背景音

mod buffer_cache;
mod playback_engine;

pub use buffer_cache::{AudioBufferCache, BufferCacheStats};
pub use playback_engine::{volume_to_gain, AudioPlaybackEngine, LoopHandle};
