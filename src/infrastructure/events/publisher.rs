//! Visual Event Publisher
//!
//! 通过 broadcast 通道把视觉事件推送给所有订阅者（渲染层、日志、测试）

use std::sync::Arc;
use tokio::sync::broadcast;

use crate::application::ports::{VisualEvent, VisualSinkPort};

/// 默认通道容量
const DEFAULT_CAPACITY: usize = 100;

/// 视觉事件发布器
pub struct VisualEventPublisher {
    channel: broadcast::Sender<VisualEvent>,
}

impl VisualEventPublisher {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { channel: tx }
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// 订阅视觉事件
    pub fn subscribe(&self) -> broadcast::Receiver<VisualEvent> {
        self.channel.subscribe()
    }

    pub fn receiver_count(&self) -> usize {
        self.channel.receiver_count()
    }
}

impl Default for VisualEventPublisher {
    fn default() -> Self {
        Self::new()
    }
}

impl VisualSinkPort for VisualEventPublisher {
    fn publish(&self, event: VisualEvent) {
        tracing::trace!(event = ?event, "Visual event");
        if let Err(e) = self.channel.send(event) {
            tracing::debug!(error = %e, "Failed to publish visual event (no receivers)");
        }
    }
}
