//! Audio Buffer Cache - 解码音频缓存
//!
//! 以资源标识为 key 的进程级缓存：首次请求读取并解码，之后直接返回缓存。
//! 不做淘汰；失败不缓存，下次请求会重试

use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::application::ports::{
    extension_hint, AssetSourcePort, AudioBuffer, AudioDecoderPort,
};

/// 缓存统计信息
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BufferCacheStats {
    pub entries: usize,
    pub hit_count: u64,
    pub miss_count: u64,
    pub failure_count: u64,
}

/// 解码音频缓存
pub struct AudioBufferCache {
    source: Arc<dyn AssetSourcePort>,
    decoder: Arc<dyn AudioDecoderPort>,
    entries: DashMap<String, AudioBuffer>,
    hit_count: AtomicU64,
    miss_count: AtomicU64,
    failure_count: AtomicU64,
}

impl AudioBufferCache {
    pub fn new(source: Arc<dyn AssetSourcePort>, decoder: Arc<dyn AudioDecoderPort>) -> Self {
        Self {
            source,
            decoder,
            entries: DashMap::new(),
            hit_count: AtomicU64::new(0),
            miss_count: AtomicU64::new(0),
            failure_count: AtomicU64::new(0),
        }
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// 获取解码后的缓冲区
    ///
    /// 读取或解码失败时记录错误并返回 None，从不向调用方抛出
    pub async fn get(&self, source_id: &str) -> Option<AudioBuffer> {
        if source_id.is_empty() {
            return None;
        }

        if let Some(buffer) = self.entries.get(source_id) {
            self.hit_count.fetch_add(1, Ordering::Relaxed);
            return Some(buffer.clone());
        }
        self.miss_count.fetch_add(1, Ordering::Relaxed);

        let data = match self.source.fetch(source_id).await {
            Ok(data) => data,
            Err(e) => {
                self.failure_count.fetch_add(1, Ordering::Relaxed);
                tracing::error!(source_id = %source_id, error = %e, "Failed to load audio asset");
                return None;
            }
        };

        let decoded = match self.decoder.decode(&data, extension_hint(source_id)) {
            Ok(decoded) => decoded,
            Err(e) => {
                self.failure_count.fetch_add(1, Ordering::Relaxed);
                tracing::error!(source_id = %source_id, error = %e, "Failed to decode audio asset");
                return None;
            }
        };

        tracing::debug!(
            source_id = %source_id,
            frames = decoded.frames(),
            sample_rate = decoded.sample_rate,
            channels = decoded.channels,
            "Audio buffer cached"
        );

        // 并发加载同一资源时保留先写入的那份
        let buffer = self
            .entries
            .entry(source_id.to_string())
            .or_insert_with(|| AudioBuffer::new(decoded))
            .clone();
        Some(buffer)
    }

    pub fn contains(&self, source_id: &str) -> bool {
        self.entries.contains_key(source_id)
    }

    pub fn stats(&self) -> BufferCacheStats {
        BufferCacheStats {
            entries: self.entries.len(),
            hit_count: self.hit_count.load(Ordering::Relaxed),
            miss_count: self.miss_count.load(Ordering::Relaxed),
            failure_count: self.failure_count.load(Ordering::Relaxed),
        }
    }
}
