//! DelayQueue Scheduler - 实时调度器
//!
//! 基于 tokio-util 的 DelayQueue；worker 通过 `next_expired` 在 select 循环里等待到期定时器

use futures_util::StreamExt;
use std::collections::HashMap;
use std::time::Duration;
use tokio_util::time::{delay_queue, DelayQueue};

use crate::application::ports::{SchedulerPort, SessionTimer, TimerKey};

/// 实时调度器
#[derive(Debug, Default)]
pub struct DelayQueueScheduler {
    queue: DelayQueue<(TimerKey, SessionTimer)>,
    keys: HashMap<TimerKey, delay_queue::Key>,
    seq: u64,
}

impl DelayQueueScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// 等待下一个到期的定时器
    ///
    /// 队列为空时一直挂起，适合放进 `tokio::select!`
    pub async fn next_expired(&mut self) -> Option<SessionTimer> {
        if self.queue.is_empty() {
            std::future::pending::<()>().await;
        }

        let expired = self.queue.next().await?;
        let (key, timer) = expired.into_inner();
        self.keys.remove(&key);
        Some(timer)
    }
}

impl SchedulerPort for DelayQueueScheduler {
    fn schedule(&mut self, delay: Duration, timer: SessionTimer) -> TimerKey {
        self.seq += 1;
        let key = TimerKey::new(self.seq);
        let queue_key = self.queue.insert((key, timer), delay);
        self.keys.insert(key, queue_key);
        key
    }

    fn cancel(&mut self, key: TimerKey) -> bool {
        match self.keys.remove(&key) {
            Some(queue_key) => self.queue.try_remove(&queue_key).is_some(),
            None => false,
        }
    }

    fn pending(&self) -> usize {
        self.queue.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RunGeneration;

    fn tick() -> SessionTimer {
        SessionTimer::Tick {
            generation: RunGeneration::initial().next(),
        }
    }

    fn ready() -> SessionTimer {
        SessionTimer::ReadyReset {
            generation: RunGeneration::initial().next(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_fires_after_delay() {
        let mut scheduler = DelayQueueScheduler::new();
        let started = tokio::time::Instant::now();

        scheduler.schedule(Duration::from_secs(2), ready());
        scheduler.schedule(Duration::from_secs(1), tick());
        assert_eq!(scheduler.pending(), 2);

        assert_eq!(scheduler.next_expired().await, Some(tick()));
        assert!(started.elapsed() >= Duration::from_secs(1));
        assert_eq!(scheduler.next_expired().await, Some(ready()));
        assert!(started.elapsed() >= Duration::from_secs(2));
        assert_eq!(scheduler.pending(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_timer_never_fires() {
        let mut scheduler = DelayQueueScheduler::new();
        let cancelled = scheduler.schedule(Duration::from_secs(1), tick());
        scheduler.schedule(Duration::from_secs(3), ready());

        assert!(scheduler.cancel(cancelled));
        assert!(!scheduler.cancel(cancelled));
        assert_eq!(scheduler.next_expired().await, Some(ready()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_queue_pends() {
        let mut scheduler = DelayQueueScheduler::new();
        let result =
            tokio::time::timeout(Duration::from_secs(10), scheduler.next_expired()).await;
        assert!(result.is_err());
    }
}
