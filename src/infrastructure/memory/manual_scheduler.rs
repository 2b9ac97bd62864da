//! Manual Scheduler - 虚拟时钟调度器
//!
//! 时间只在调用方推进时流逝，用于确定性地驱动会话（测试、离线模拟）。
//! 到期顺序：截止时间升序，相同截止时间按登记顺序。

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use crate::application::ports::{SchedulerPort, SessionTimer, TimerKey};
use crate::application::session::SessionController;

type Slot = (Duration, u64);

/// 虚拟时钟调度器
#[derive(Debug, Default)]
pub struct ManualScheduler {
    now: Duration,
    seq: u64,
    queue: BTreeMap<Slot, (TimerKey, SessionTimer)>,
    slots: HashMap<TimerKey, Slot>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// 虚拟时钟当前时间
    pub fn now(&self) -> Duration {
        self.now
    }

    /// 下一个定时器的截止时间
    pub fn next_deadline(&self) -> Option<Duration> {
        self.queue.keys().next().map(|(deadline, _)| *deadline)
    }

    /// 取出截止时间不晚于 `until` 的最早定时器，并把时钟拨到它的截止时间
    pub fn pop_due(&mut self, until: Duration) -> Option<SessionTimer> {
        let slot = *self.queue.keys().next()?;
        if slot.0 > until {
            return None;
        }
        let (key, timer) = self.queue.remove(&slot)?;
        self.slots.remove(&key);
        self.now = self.now.max(slot.0);
        Some(timer)
    }

    /// 把时钟拨到 `at`（不会回拨）
    pub fn set_now(&mut self, at: Duration) {
        self.now = self.now.max(at);
    }
}

impl SchedulerPort for ManualScheduler {
    fn schedule(&mut self, delay: Duration, timer: SessionTimer) -> TimerKey {
        self.seq += 1;
        let key = TimerKey::new(self.seq);
        let slot = (self.now + delay, self.seq);
        self.queue.insert(slot, (key, timer));
        self.slots.insert(key, slot);
        key
    }

    fn cancel(&mut self, key: TimerKey) -> bool {
        match self.slots.remove(&key) {
            Some(slot) => self.queue.remove(&slot).is_some(),
            None => false,
        }
    }

    fn pending(&self) -> usize {
        self.queue.len()
    }
}

impl SessionController<ManualScheduler> {
    /// 推进虚拟时钟并依次处理到期的定时器
    pub async fn advance(&mut self, by: Duration) {
        let target = self.scheduler().now() + by;
        while let Some(timer) = self.scheduler_mut().pop_due(target) {
            self.on_timer(timer).await;
        }
        self.scheduler_mut().set_now(target);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RunGeneration;

    fn tick(bumps: u64) -> SessionTimer {
        let mut generation = RunGeneration::initial();
        for _ in 0..bumps {
            generation = generation.next();
        }
        SessionTimer::Tick { generation }
    }

    #[test]
    fn test_fires_in_deadline_order() {
        let mut scheduler = ManualScheduler::new();
        scheduler.schedule(Duration::from_secs(3), tick(3));
        scheduler.schedule(Duration::from_secs(1), tick(1));
        scheduler.schedule(Duration::from_secs(2), tick(2));

        let until = Duration::from_secs(10);
        assert_eq!(scheduler.pop_due(until), Some(tick(1)));
        assert_eq!(scheduler.now(), Duration::from_secs(1));
        assert_eq!(scheduler.pop_due(until), Some(tick(2)));
        assert_eq!(scheduler.pop_due(until), Some(tick(3)));
        assert_eq!(scheduler.pop_due(until), None);
    }

    #[test]
    fn test_equal_deadlines_fire_in_registration_order() {
        let mut scheduler = ManualScheduler::new();
        scheduler.schedule(Duration::from_secs(1), tick(5));
        scheduler.schedule(Duration::from_secs(1), tick(6));

        let until = Duration::from_secs(1);
        assert_eq!(scheduler.pop_due(until), Some(tick(5)));
        assert_eq!(scheduler.pop_due(until), Some(tick(6)));
    }

    #[test]
    fn test_respects_until() {
        let mut scheduler = ManualScheduler::new();
        scheduler.schedule(Duration::from_secs(2), tick(1));

        assert_eq!(scheduler.pop_due(Duration::from_secs(1)), None);
        assert_eq!(scheduler.pending(), 1);
        assert_eq!(scheduler.next_deadline(), Some(Duration::from_secs(2)));
    }

    #[test]
    fn test_cancel() {
        let mut scheduler = ManualScheduler::new();
        let key = scheduler.schedule(Duration::from_secs(1), tick(1));

        assert!(scheduler.cancel(key));
        assert!(!scheduler.cancel(key));
        assert_eq!(scheduler.pending(), 0);
        assert_eq!(scheduler.pop_due(Duration::from_secs(5)), None);
    }
}
