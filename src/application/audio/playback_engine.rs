//! Audio Playback Engine - 提示音与背景音播放
//!
//! 包装唯一的共享输出图：
//! - 提示音一次性直连输出
//! - 背景音独占一个循环槽位，经过增益节点
//!
//! 所有失败都降级为静音，不会向外抛出

use std::sync::Arc;

use crate::application::ports::{AudioBuffer, AudioOutputPort, OutputState, VoiceId};

use super::AudioBufferCache;

/// 音量百分比映射到增益
///
/// 100% 只对应最大增益的一半，给提示音留出余量
pub fn volume_to_gain(volume_percent: u8, max_gain: f32) -> f32 {
    f32::from(volume_percent.min(100)) / 200.0 * max_gain
}

/// 当前循环的背景音
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopHandle {
    pub voice: VoiceId,
    pub source_id: String,
}

/// 播放引擎
pub struct AudioPlaybackEngine {
    output: Arc<dyn AudioOutputPort>,
    cache: Arc<AudioBufferCache>,
    current_loop: Option<LoopHandle>,
}

impl AudioPlaybackEngine {
    pub fn new(output: Arc<dyn AudioOutputPort>, cache: Arc<AudioBufferCache>) -> Self {
        Self {
            output,
            cache,
            current_loop: None,
        }
    }

    pub fn cache(&self) -> &Arc<AudioBufferCache> {
        &self.cache
    }

    pub fn current_loop(&self) -> Option<&LoopHandle> {
        self.current_loop.as_ref()
    }

    /// 确保输出处于可播放状态
    ///
    /// 返回 false 表示本次发声应被静默跳过
    pub async fn ensure_active(&self) -> bool {
        match self.output.state() {
            OutputState::Running => true,
            OutputState::Closed => {
                tracing::warn!("Audio output is closed, skipping sound");
                false
            }
            OutputState::Suspended => match self.output.resume().await {
                Ok(()) => {
                    tracing::debug!("Audio output resumed");
                    true
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Error resuming audio output");
                    false
                }
            },
        }
    }

    /// 播放一次；buffer 为空时什么都不做
    pub async fn play_one_shot(&self, buffer: Option<&AudioBuffer>) {
        let Some(buffer) = buffer else {
            return;
        };

        if !self.ensure_active().await {
            return;
        }

        if let Err(e) = self.output.play_once(buffer) {
            tracing::warn!(error = %e, "Failed to play cue sound");
        }
    }

    /// 开始循环背景音
    ///
    /// 先停止已有的循环（同一时间只允许一个），再加载并以给定音量播放
    pub async fn start_loop(&mut self, source_id: &str, volume_percent: u8) -> Option<LoopHandle> {
        self.stop_loop();

        if source_id.is_empty() {
            return None;
        }

        let buffer = self.cache.get(source_id).await?;

        if !self.ensure_active().await {
            return None;
        }

        self.output
            .set_background_gain(volume_to_gain(volume_percent, self.output.max_gain()));

        match self.output.start_background(&buffer) {
            Ok(voice) => {
                let handle = LoopHandle {
                    voice,
                    source_id: source_id.to_string(),
                };
                tracing::info!(
                    source_id = %source_id,
                    volume_percent = volume_percent,
                    "Background loop started"
                );
                self.current_loop = Some(handle.clone());
                Some(handle)
            }
            Err(e) => {
                tracing::warn!(source_id = %source_id, error = %e, "Failed to start background loop");
                None
            }
        }
    }

    /// 实时调整背景音音量；没有循环时不做任何事
    pub fn set_loop_volume(&self, volume_percent: u8) {
        if self.current_loop.is_none() {
            return;
        }
        let gain = volume_to_gain(volume_percent, self.output.max_gain());
        self.output.set_background_gain(gain);
        tracing::debug!(volume_percent = volume_percent, gain = gain, "Background volume updated");
    }

    /// 停止并释放当前循环（幂等）
    pub fn stop_loop(&mut self) {
        if let Some(handle) = self.current_loop.take() {
            self.output.stop_voice(handle.voice);
            tracing::info!(source_id = %handle.source_id, "Background loop stopped");
        }
    }
}
