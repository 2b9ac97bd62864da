//! Render Pump - 混音图到设备的样本通道
//!
//! 渲染泵按固定周期调用 `MixerGraph::render`，把结果写入有界环形缓冲区
//! （crossbeam channel）；设备回调从另一端取样本，欠载时补静音。

use std::sync::Arc;
use std::time::Duration;

use crossbeam::channel::{bounded, Receiver, Sender, TrySendError};
use tokio::task::JoinHandle;

use crate::application::ports::{AudioOutputPort, OutputError, OutputState};

use super::MixerGraph;

/// 创建一对环形缓冲区端点，容量以渲染块计
pub fn sample_ring(chunks: usize) -> (SampleWriter, SampleReader) {
    let (sender, receiver) = bounded(chunks.max(1));
    (
        SampleWriter { sender },
        SampleReader {
            receiver,
            pending: Vec::new(),
            offset: 0,
        },
    )
}

/// 环形缓冲区写入端（渲染泵持有）
#[derive(Debug, Clone)]
pub struct SampleWriter {
    sender: Sender<Vec<f32>>,
}

impl SampleWriter {
    pub fn has_capacity(&self) -> bool {
        !self.sender.is_full()
    }

    /// 写入一个渲染块，不等待
    pub fn write(&self, samples: Vec<f32>) -> Result<(), OutputError> {
        if samples.is_empty() {
            return Ok(());
        }
        match self.sender.try_send(samples) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => Err(OutputError::BufferFull),
            Err(TrySendError::Disconnected(_)) => Err(OutputError::Closed),
        }
    }
}

/// 环形缓冲区读取端（设备回调持有）
#[derive(Debug)]
pub struct SampleReader {
    receiver: Receiver<Vec<f32>>,
    /// 上一个块中尚未输出的部分
    pending: Vec<f32>,
    offset: usize,
}

impl SampleReader {
    /// 填满 `out`，返回其中真实样本的数量，其余为静音
    pub fn fill(&mut self, out: &mut [f32]) -> usize {
        let mut written = 0;
        while written < out.len() {
            if self.offset >= self.pending.len() {
                match self.receiver.try_recv() {
                    Ok(chunk) => {
                        self.pending = chunk;
                        self.offset = 0;
                        continue;
                    }
                    Err(_) => break,
                }
            }
            let n = (self.pending.len() - self.offset).min(out.len() - written);
            out[written..written + n]
                .copy_from_slice(&self.pending[self.offset..self.offset + n]);
            written += n;
            self.offset += n;
        }
        out[written..].fill(0.0);
        written
    }
}

/// 启动渲染泵
///
/// 缓冲区满时跳过本周期，声部不前进；混音图关闭或设备断开后退出。
pub fn spawn_render_pump(
    mixer: Arc<MixerGraph>,
    writer: SampleWriter,
    frames: usize,
    interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            if mixer.state() == OutputState::Closed {
                break;
            }
            if !writer.has_capacity() {
                continue;
            }
            match writer.write(mixer.render(frames)) {
                Ok(()) => {}
                Err(OutputError::Closed) => {
                    tracing::warn!("Audio device disconnected, render pump stopped");
                    break;
                }
                Err(e) => tracing::debug!(error = %e, "Render chunk dropped"),
            }
        }
        tracing::debug!("Render pump stopped");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::{AudioBuffer, DecodedBuffer};
    use crate::infrastructure::adapters::MixerGraphConfig;

    #[test]
    fn test_reader_spans_chunks_and_pads_silence() {
        let (writer, mut reader) = sample_ring(4);
        writer.write(vec![0.1, 0.2, 0.3]).unwrap();
        writer.write(vec![0.4]).unwrap();

        let mut out = [1.0f32; 2];
        assert_eq!(reader.fill(&mut out), 2);
        assert_eq!(out, [0.1, 0.2]);

        let mut out = [1.0f32; 4];
        assert_eq!(reader.fill(&mut out), 2);
        assert_eq!(out, [0.3, 0.4, 0.0, 0.0]);
    }

    #[test]
    fn test_writer_reports_full_and_closed() {
        let (writer, reader) = sample_ring(1);
        writer.write(vec![0.5]).unwrap();
        assert!(!writer.has_capacity());
        assert!(matches!(writer.write(vec![0.5]), Err(OutputError::BufferFull)));
        assert!(writer.write(Vec::new()).is_ok());

        drop(reader);
        assert!(matches!(writer.write(vec![0.5]), Err(OutputError::Closed)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_pump_stops_rendering_while_ring_is_full() {
        let mixer = MixerGraph::new(MixerGraphConfig {
            sample_rate: 8000,
            channels: 1,
            max_gain: 1.0,
            start_suspended: false,
        })
        .arc();
        mixer
            .play_once(&AudioBuffer::new(DecodedBuffer::new(vec![0.25; 64], 8000, 1)))
            .unwrap();

        let (writer, mut reader) = sample_ring(2);
        let pump = spawn_render_pump(mixer.clone(), writer, 16, Duration::from_millis(10));
        tokio::time::sleep(Duration::from_millis(200)).await;

        // 两个块之后缓冲区已满，声部停在第 32 帧
        assert_eq!(mixer.frames_rendered(), 32);
        assert_eq!(mixer.active_voices(), 1);

        let mut out = [0.0f32; 32];
        assert_eq!(reader.fill(&mut out), 32);
        assert!(out.iter().all(|s| *s == 0.25));

        mixer.close();
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(pump.is_finished());
    }
}
