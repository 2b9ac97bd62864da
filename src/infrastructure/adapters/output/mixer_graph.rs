//! Mixer Graph - 软件混音输出
//!
//! 实现 AudioOutputPort。图中有两条路径：
//! - 提示音直连输出（增益 1.0），播放完自动释放
//! - 背景音总线，经过共享增益节点后循环播放
//!
//! 输出设备通过 `render` 拉取交错排列的样本；非 Running 状态下只输出静音。
//! 不做采样率转换，声部按输出采样率逐帧读取。

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::application::ports::{AudioBuffer, AudioOutputPort, OutputError, OutputState, VoiceId};

/// 输出图配置
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MixerGraphConfig {
    pub sample_rate: u32,
    pub channels: u16,
    /// 背景音增益上限
    pub max_gain: f32,
    /// 创建时是否处于 Suspended（需要 resume 才能发声）
    pub start_suspended: bool,
}

impl Default for MixerGraphConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44100,
            channels: 2,
            max_gain: 1.0,
            start_suspended: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Route {
    Direct,
    Background,
}

struct Voice {
    id: VoiceId,
    buffer: AudioBuffer,
    /// 下一帧的位置
    cursor: usize,
    route: Route,
}

impl Voice {
    fn finished(&self) -> bool {
        self.route == Route::Direct && self.cursor >= self.buffer.frames()
    }
}

struct MixerInner {
    state: OutputState,
    voices: Vec<Voice>,
    background_gain: f32,
}

/// 软件混音输出图
pub struct MixerGraph {
    config: MixerGraphConfig,
    inner: Mutex<MixerInner>,
    frames_rendered: AtomicU64,
}

impl MixerGraph {
    pub fn new(config: MixerGraphConfig) -> Self {
        let state = if config.start_suspended {
            OutputState::Suspended
        } else {
            OutputState::Running
        };
        Self {
            config,
            inner: Mutex::new(MixerInner {
                state,
                voices: Vec::new(),
                background_gain: config.max_gain,
            }),
            frames_rendered: AtomicU64::new(0),
        }
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn config(&self) -> &MixerGraphConfig {
        &self.config
    }

    /// 关闭输出并释放所有声部，之后不可恢复
    pub fn close(&self) {
        let mut inner = self.inner.lock();
        inner.state = OutputState::Closed;
        inner.voices.clear();
        tracing::info!("Mixer closed");
    }

    /// 当前声部数量
    pub fn active_voices(&self) -> usize {
        self.inner.lock().voices.len()
    }

    pub fn has_voice(&self, voice: VoiceId) -> bool {
        self.inner.lock().voices.iter().any(|v| v.id == voice)
    }

    /// 已渲染的总帧数
    pub fn frames_rendered(&self) -> u64 {
        self.frames_rendered.load(Ordering::Relaxed)
    }

    /// 渲染 `frames` 帧交错样本
    pub fn render(&self, frames: usize) -> Vec<f32> {
        let out_channels = self.config.channels.max(1) as usize;
        let mut output = vec![0.0f32; frames * out_channels];

        let mut inner = self.inner.lock();
        if inner.state != OutputState::Running {
            return output;
        }

        let background_gain = inner.background_gain;
        for voice in inner.voices.iter_mut() {
            let gain = match voice.route {
                Route::Direct => 1.0,
                Route::Background => background_gain,
            };
            mix_voice(voice, gain, &mut output, out_channels);
        }
        inner.voices.retain(|v| !v.finished());
        drop(inner);

        self.frames_rendered
            .fetch_add(frames as u64, Ordering::Relaxed);
        output
    }

    fn add_voice(&self, buffer: &AudioBuffer, route: Route) -> Result<VoiceId, OutputError> {
        if buffer.frames() == 0 {
            return Err(OutputError::InvalidBuffer("buffer has no frames".to_string()));
        }

        let mut inner = self.inner.lock();
        if inner.state == OutputState::Closed {
            return Err(OutputError::Closed);
        }

        if buffer.sample_rate != self.config.sample_rate {
            tracing::debug!(
                buffer_rate = buffer.sample_rate,
                output_rate = self.config.sample_rate,
                "Sample rate mismatch, playing without conversion"
            );
        }

        let id = VoiceId::new();
        inner.voices.push(Voice {
            id,
            buffer: buffer.clone(),
            cursor: 0,
            route,
        });
        Ok(id)
    }
}

impl Default for MixerGraph {
    fn default() -> Self {
        Self::new(MixerGraphConfig::default())
    }
}

/// 把一个声部叠加到输出上；源声道不足时重复最后一个声道
fn mix_voice(voice: &mut Voice, gain: f32, output: &mut [f32], out_channels: usize) {
    let src_channels = voice.buffer.channels.max(1) as usize;
    let total = voice.buffer.frames();
    if total == 0 {
        return;
    }

    for frame in output.chunks_mut(out_channels) {
        if voice.cursor >= total {
            match voice.route {
                Route::Direct => break,
                Route::Background => voice.cursor = 0,
            }
        }
        let base = voice.cursor * src_channels;
        for (c, sample) in frame.iter_mut().enumerate() {
            let src = base + c.min(src_channels - 1);
            *sample += voice.buffer.samples[src] * gain;
        }
        voice.cursor += 1;
    }
}

#[async_trait]
impl AudioOutputPort for MixerGraph {
    fn state(&self) -> OutputState {
        self.inner.lock().state
    }

    async fn resume(&self) -> Result<(), OutputError> {
        let mut inner = self.inner.lock();
        match inner.state {
            OutputState::Closed => Err(OutputError::Closed),
            OutputState::Running => Ok(()),
            OutputState::Suspended => {
                inner.state = OutputState::Running;
                tracing::debug!("Mixer resumed");
                Ok(())
            }
        }
    }

    fn play_once(&self, buffer: &AudioBuffer) -> Result<VoiceId, OutputError> {
        self.add_voice(buffer, Route::Direct)
    }

    fn start_background(&self, buffer: &AudioBuffer) -> Result<VoiceId, OutputError> {
        self.add_voice(buffer, Route::Background)
    }

    fn stop_voice(&self, voice: VoiceId) {
        self.inner.lock().voices.retain(|v| v.id != voice);
    }

    fn set_background_gain(&self, gain: f32) {
        let gain = if gain.is_finite() {
            gain.clamp(0.0, self.config.max_gain)
        } else {
            0.0
        };
        self.inner.lock().background_gain = gain;
    }

    fn background_gain(&self) -> f32 {
        self.inner.lock().background_gain
    }

    fn max_gain(&self) -> f32 {
        self.config.max_gain
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::DecodedBuffer;

    fn running_mixer() -> MixerGraph {
        MixerGraph::new(MixerGraphConfig {
            sample_rate: 8000,
            channels: 2,
            max_gain: 1.0,
            start_suspended: false,
        })
    }

    fn mono(samples: Vec<f32>) -> AudioBuffer {
        AudioBuffer::new(DecodedBuffer::new(samples, 8000, 1))
    }

    #[test]
    fn test_one_shot_plays_and_releases() {
        let mixer = running_mixer();
        let voice = mixer.play_once(&mono(vec![0.5, 0.25])).unwrap();
        assert!(mixer.has_voice(voice));

        let out = mixer.render(3);
        assert_eq!(out, vec![0.5, 0.5, 0.25, 0.25, 0.0, 0.0]);
        assert!(!mixer.has_voice(voice));
        assert_eq!(mixer.frames_rendered(), 3);
    }

    #[test]
    fn test_background_loops_with_gain() {
        let mixer = running_mixer();
        mixer.set_background_gain(0.5);
        mixer.start_background(&mono(vec![1.0, 0.0])).unwrap();

        let out = mixer.render(3);
        assert_eq!(out, vec![0.5, 0.5, 0.0, 0.0, 0.5, 0.5]);
        assert_eq!(mixer.active_voices(), 1);
    }

    #[test]
    fn test_gain_is_clamped() {
        let mixer = running_mixer();
        mixer.set_background_gain(3.0);
        assert_eq!(mixer.background_gain(), 1.0);
        mixer.set_background_gain(-1.0);
        assert_eq!(mixer.background_gain(), 0.0);
    }

    #[tokio::test]
    async fn test_suspended_renders_silence_until_resumed() {
        let mixer = MixerGraph::new(MixerGraphConfig {
            start_suspended: true,
            ..running_mixer().config
        });
        assert_eq!(mixer.state(), OutputState::Suspended);

        mixer.play_once(&mono(vec![1.0])).unwrap();
        assert_eq!(mixer.render(1), vec![0.0, 0.0]);

        mixer.resume().await.unwrap();
        assert_eq!(mixer.state(), OutputState::Running);
        assert_eq!(mixer.render(1), vec![1.0, 1.0]);
    }

    #[tokio::test]
    async fn test_closed_rejects_everything() {
        let mixer = running_mixer();
        mixer.close();

        assert!(matches!(mixer.resume().await, Err(OutputError::Closed)));
        assert!(matches!(
            mixer.play_once(&mono(vec![1.0])),
            Err(OutputError::Closed)
        ));
    }

    #[test]
    fn test_stop_voice() {
        let mixer = running_mixer();
        let voice = mixer.start_background(&mono(vec![1.0])).unwrap();
        mixer.stop_voice(voice);
        mixer.stop_voice(voice);

        assert_eq!(mixer.active_voices(), 0);
        assert_eq!(mixer.render(1), vec![0.0, 0.0]);
    }

    #[test]
    fn test_empty_buffer_rejected() {
        let mixer = running_mixer();
        assert!(matches!(
            mixer.play_once(&mono(Vec::new())),
            Err(OutputError::InvalidBuffer(_))
        ));
    }
}
