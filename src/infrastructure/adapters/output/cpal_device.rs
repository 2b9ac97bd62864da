//! Device Output - 系统默认音频输出设备（cpal）
//!
//! 回调线程只从 `SampleReader` 取样本，不阻塞。

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleRate, Stream, StreamConfig};

use crate::application::ports::OutputError;

use super::SampleReader;

/// 系统默认输出设备
///
/// cpal 的 Stream 不是 Send，需要留在创建它的线程上；丢弃即停止播放。
pub struct DeviceOutput {
    _stream: Stream,
    samples_played: Arc<AtomicU64>,
    underruns: Arc<AtomicU64>,
}

impl DeviceOutput {
    pub fn open(sample_rate: u32, channels: u16, reader: SampleReader) -> Result<Self, OutputError> {
        let host = cpal::default_host();
        let device = host.default_output_device().ok_or_else(|| {
            OutputError::DeviceUnavailable("No audio output device found".to_string())
        })?;

        tracing::info!(
            device = device
                .name()
                .unwrap_or_else(|_| "unknown".to_string())
                .as_str(),
            "Using audio output device"
        );

        let config = StreamConfig {
            channels,
            sample_rate: SampleRate(sample_rate),
            buffer_size: cpal::BufferSize::Default,
        };

        let samples_played = Arc::new(AtomicU64::new(0));
        let underruns = Arc::new(AtomicU64::new(0));
        let played_cb = Arc::clone(&samples_played);
        let underruns_cb = Arc::clone(&underruns);
        let mut reader = reader;

        let stream = device
            .build_output_stream(
                &config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    let written = reader.fill(data);
                    played_cb.fetch_add(written as u64, Ordering::Relaxed);
                    if written < data.len() {
                        underruns_cb.fetch_add(1, Ordering::Relaxed);
                    }
                },
                |err| tracing::error!(error = %err, "Audio output stream error"),
                None,
            )
            .map_err(|e| OutputError::DeviceUnavailable(e.to_string()))?;

        stream
            .play()
            .map_err(|e| OutputError::DeviceUnavailable(e.to_string()))?;

        tracing::debug!(
            sample_rate = sample_rate,
            channels = channels,
            "Audio output stream playing"
        );

        Ok(Self {
            _stream: stream,
            samples_played,
            underruns,
        })
    }

    /// 设备已消耗的样本数（交错计数）
    pub fn samples_played(&self) -> u64 {
        self.samples_played.load(Ordering::Relaxed)
    }

    /// 回调中出现欠载的次数
    pub fn underruns(&self) -> u64 {
        self.underruns.load(Ordering::Relaxed)
    }
}
