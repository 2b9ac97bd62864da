//! Symphonia Decoder
//!
//! 支持 WAV 与 MP3，输出交错排列的 f32 PCM

use std::io::Cursor;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::application::ports::{AudioDecoderPort, DecodeError, DecodedBuffer};

/// Symphonia 解码器
#[derive(Debug, Clone, Copy, Default)]
pub struct SymphoniaDecoder;

impl SymphoniaDecoder {
    pub fn new() -> Self {
        Self
    }
}

impl AudioDecoderPort for SymphoniaDecoder {
    fn decode(&self, data: &[u8], extension: Option<&str>) -> Result<DecodedBuffer, DecodeError> {
        if data.is_empty() {
            return Err(DecodeError::Empty);
        }

        let cursor = Cursor::new(data.to_vec());
        let mss = MediaSourceStream::new(Box::new(cursor), Default::default());

        let mut hint = Hint::new();
        if let Some(ext) = extension {
            hint.with_extension(ext);
        }

        let probed = symphonia::default::get_probe()
            .format(
                &hint,
                mss,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .map_err(|e| DecodeError::UnsupportedFormat(format!("Probe failed: {}", e)))?;

        let mut format = probed.format;

        let track = format
            .default_track()
            .ok_or_else(|| DecodeError::DecodingError("No audio track found".to_string()))?;

        let mut sample_rate = track.codec_params.sample_rate.unwrap_or(0);
        let mut channels = track
            .codec_params
            .channels
            .map(|c| c.count() as u16)
            .unwrap_or(0);

        let mut decoder = symphonia::default::get_codecs()
            .make(&track.codec_params, &DecoderOptions::default())
            .map_err(|e| DecodeError::UnsupportedFormat(format!("Decoder creation failed: {}", e)))?;

        let track_id = track.id;
        let mut samples: Vec<f32> = Vec::new();

        loop {
            let packet = match format.next_packet() {
                Ok(p) => p,
                Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                    break;
                }
                Err(SymphoniaError::ResetRequired) => break,
                Err(e) => {
                    return Err(DecodeError::DecodingError(format!(
                        "Packet read error: {}",
                        e
                    )));
                }
            };

            if packet.track_id() != track_id {
                continue;
            }

            let decoded = match decoder.decode(&packet) {
                Ok(d) => d,
                Err(SymphoniaError::DecodeError(e)) => {
                    tracing::warn!(error = %e, "Decode error (skipping packet)");
                    continue;
                }
                Err(e) => {
                    return Err(DecodeError::DecodingError(format!("Decode failed: {}", e)));
                }
            };

            let spec = *decoded.spec();
            // MP3 的声道数和采样率可能只在首个数据包里给出
            if sample_rate == 0 {
                sample_rate = spec.rate;
            }
            if channels == 0 {
                channels = spec.channels.count() as u16;
            }

            let num_frames = decoded.frames();
            let mut sample_buf = SampleBuffer::<f32>::new(num_frames as u64, spec);
            sample_buf.copy_interleaved_ref(decoded);
            let actual_samples = num_frames * spec.channels.count();
            samples.extend(&sample_buf.samples()[..actual_samples]);
        }

        if samples.is_empty() || sample_rate == 0 || channels == 0 {
            return Err(DecodeError::Empty);
        }

        tracing::debug!(
            samples = samples.len(),
            sample_rate = sample_rate,
            channels = channels,
            "Audio decoded"
        );

        Ok(DecodedBuffer::new(samples, sample_rate, channels))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 生成 16 位 PCM WAV
    fn create_test_wav(sample_rate: u32, num_channels: u16, frames: usize, value: i16) -> Vec<u8> {
        let bits_per_sample: u16 = 16;
        let data_size = frames * num_channels as usize * 2;
        let file_size = 36 + data_size;

        let mut wav = Vec::with_capacity(44 + data_size);

        wav.extend_from_slice(b"RIFF");
        wav.extend_from_slice(&(file_size as u32).to_le_bytes());
        wav.extend_from_slice(b"WAVE");

        wav.extend_from_slice(b"fmt ");
        wav.extend_from_slice(&16u32.to_le_bytes());
        wav.extend_from_slice(&1u16.to_le_bytes()); // PCM
        wav.extend_from_slice(&num_channels.to_le_bytes());
        wav.extend_from_slice(&sample_rate.to_le_bytes());
        let byte_rate = sample_rate * num_channels as u32 * (bits_per_sample / 8) as u32;
        wav.extend_from_slice(&byte_rate.to_le_bytes());
        let block_align = num_channels * (bits_per_sample / 8);
        wav.extend_from_slice(&block_align.to_le_bytes());
        wav.extend_from_slice(&bits_per_sample.to_le_bytes());

        wav.extend_from_slice(b"data");
        wav.extend_from_slice(&(data_size as u32).to_le_bytes());
        for _ in 0..frames * num_channels as usize {
            wav.extend_from_slice(&value.to_le_bytes());
        }

        wav
    }

    #[test]
    fn test_decode_wav() {
        let wav = create_test_wav(16000, 1, 16000, 0);
        let decoded = SymphoniaDecoder::new().decode(&wav, Some("wav")).unwrap();

        assert_eq!(decoded.sample_rate, 16000);
        assert_eq!(decoded.channels, 1);
        assert_eq!(decoded.frames(), 16000);
        assert_eq!(decoded.duration().as_millis(), 1000);
    }

    #[test]
    fn test_decode_stereo_without_hint() {
        let wav = create_test_wav(8000, 2, 800, 16384);
        let decoded = SymphoniaDecoder::new().decode(&wav, None).unwrap();

        assert_eq!(decoded.channels, 2);
        assert_eq!(decoded.frames(), 800);
        assert!(decoded.samples.iter().all(|s| (s - 0.5).abs() < 0.01));
    }

    #[test]
    fn test_decode_garbage() {
        let result = SymphoniaDecoder::new().decode(b"definitely not audio", Some("mp3"));
        assert!(result.is_err());
    }

    #[test]
    fn test_decode_empty() {
        let result = SymphoniaDecoder::new().decode(&[], Some("wav"));
        assert!(matches!(result, Err(DecodeError::Empty)));
    }
}
