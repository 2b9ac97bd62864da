//! Audio Decoder Port - 音频解码
//!
//! 将压缩音频字节解码为交错排列的 f32 PCM

use std::ops::Deref;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// 解码错误
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Decoding error: {0}")]
    DecodingError(String),

    #[error("Decoded audio is empty")]
    Empty,
}

/// 解码后的 PCM 数据
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedBuffer {
    /// 交错排列的样本
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    pub channels: u16,
}

impl DecodedBuffer {
    pub fn new(samples: Vec<f32>, sample_rate: u32, channels: u16) -> Self {
        Self {
            samples,
            sample_rate,
            channels,
        }
    }

    /// 帧数（每帧包含 channels 个样本）
    pub fn frames(&self) -> usize {
        if self.channels == 0 {
            return 0;
        }
        self.samples.len() / self.channels as usize
    }

    pub fn duration(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.frames() as f64 / f64::from(self.sample_rate))
    }
}

/// 可共享的解码缓冲区
///
/// 克隆只增加引用计数
#[derive(Debug, Clone)]
pub struct AudioBuffer(Arc<DecodedBuffer>);

impl AudioBuffer {
    pub fn new(decoded: DecodedBuffer) -> Self {
        Self(Arc::new(decoded))
    }

    /// 是否指向同一份解码数据
    pub fn ptr_eq(&self, other: &AudioBuffer) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Deref for AudioBuffer {
    type Target = DecodedBuffer;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<DecodedBuffer> for AudioBuffer {
    fn from(decoded: DecodedBuffer) -> Self {
        Self::new(decoded)
    }
}

/// Audio Decoder Port
pub trait AudioDecoderPort: Send + Sync {
    /// 解码音频
    ///
    /// `extension` 为格式提示（如 "mp3"），可为空
    fn decode(&self, data: &[u8], extension: Option<&str>) -> Result<DecodedBuffer, DecodeError>;
}

/// 从资源标识中提取扩展名作为格式提示
pub fn extension_hint(source_id: &str) -> Option<&str> {
    let path = source_id.split(['?', '#']).next().unwrap_or(source_id);
    let file_name = path.rsplit('/').next()?;
    let (stem, ext) = file_name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        None
    } else {
        Some(ext)
    }
}
