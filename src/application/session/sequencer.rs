//! Phase Sequencer - 呼吸阶段状态机
//!
//! Idle → Inhale → Hold → Exhale → Inhale … 直到守卫失败或被取消。
//!
//! 状态机本身不接触定时器和音频：每一步返回 `PhaseStep`，
//! 由控制器执行副作用并登记下一次切换。切换请求携带运行代次，
//! 代次不匹配的请求一律视为过期，不产生任何副作用。

use std::time::Duration;

use crate::application::ports::PhaseTransition;
use crate::domain::{CueKind, CueToggles, PhaseState, PhaseTimings, RunGeneration};

use super::SessionGuard;

/// 状态机产生的副作用
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseEffect {
    /// 进入阶段，驱动缩放动画与阶段标签
    Enter { phase: PhaseState, duration: Duration },
    /// 播放阶段提示音
    PlayCue(CueKind),
    /// 回到 Idle：指示圆复位，标签隐藏
    Settle,
}

/// 请求在 `delay` 之后执行的切换
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduledPhase {
    pub delay: Duration,
    pub transition: PhaseTransition,
}

/// 一步状态推进的结果
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PhaseStep {
    pub effects: Vec<PhaseEffect>,
    pub schedule: Option<ScheduledPhase>,
}

impl PhaseStep {
    pub fn is_empty(&self) -> bool {
        self.effects.is_empty() && self.schedule.is_none()
    }
}

/// 阶段状态机
#[derive(Debug, Default)]
pub struct PhaseSequencer {
    state: PhaseState,
    armed: Option<RunGeneration>,
    cycles_completed: u64,
}

impl PhaseSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> PhaseState {
        self.state
    }

    pub fn is_armed(&self) -> bool {
        self.armed.is_some()
    }

    pub fn armed_generation(&self) -> Option<RunGeneration> {
        self.armed
    }

    /// 本次运行完成的完整循环数
    pub fn cycles_completed(&self) -> u64 {
        self.cycles_completed
    }

    /// 以新的代次启动，立即进入 Inhale
    ///
    /// 之前的代次随之失效
    pub fn arm(
        &mut self,
        generation: RunGeneration,
        timings: &PhaseTimings,
        cues: &CueToggles,
        guard: &dyn SessionGuard,
    ) -> PhaseStep {
        self.armed = Some(generation);
        self.cycles_completed = 0;

        if !guard.permits_transition() {
            return self.settle();
        }
        self.enter(PhaseState::Inhale, generation, timings, cues)
    }

    /// 执行已调度的切换
    ///
    /// 时长在进入阶段时读取，因此运行中修改的时长从下一个阶段开始生效
    pub fn advance(
        &mut self,
        transition: PhaseTransition,
        timings: &PhaseTimings,
        cues: &CueToggles,
        guard: &dyn SessionGuard,
    ) -> PhaseStep {
        if self.armed != Some(transition.generation) {
            tracing::trace!(
                generation = %transition.generation,
                next = %transition.next,
                "Stale phase transition ignored"
            );
            return PhaseStep::default();
        }

        if !guard.permits_transition() {
            tracing::debug!(generation = %transition.generation, "Guard failed, sequencer settling");
            return self.settle();
        }

        if transition.next == PhaseState::Inhale && self.state == PhaseState::Exhale {
            self.cycles_completed += 1;
        }
        self.enter(transition.next, transition.generation, timings, cues)
    }

    /// 取消当前运行，返回被取消的代次
    pub fn cancel(&mut self) -> Option<RunGeneration> {
        self.state = PhaseState::Idle;
        self.armed.take()
    }

    fn settle(&mut self) -> PhaseStep {
        self.state = PhaseState::Idle;
        self.armed = None;
        PhaseStep {
            effects: vec![PhaseEffect::Settle],
            schedule: None,
        }
    }

    fn enter(
        &mut self,
        phase: PhaseState,
        generation: RunGeneration,
        timings: &PhaseTimings,
        cues: &CueToggles,
    ) -> PhaseStep {
        let duration = timings.duration_of(phase);
        self.state = phase;

        let mut effects = vec![PhaseEffect::Enter { phase, duration }];
        if let Some(cue) = CueKind::for_phase(phase) {
            if cues.is_enabled(cue) {
                effects.push(PhaseEffect::PlayCue(cue));
            }
        }

        PhaseStep {
            effects,
            schedule: Some(ScheduledPhase {
                delay: duration,
                transition: PhaseTransition {
                    generation,
                    next: phase.next(),
                },
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::session::SessionState;

    fn running() -> SessionState {
        SessionState {
            remaining_seconds: 60,
            running: true,
        }
    }

    fn entered(step: &PhaseStep) -> Option<(PhaseState, Duration)> {
        step.effects.iter().find_map(|effect| match effect {
            PhaseEffect::Enter { phase, duration } => Some((*phase, *duration)),
            _ => None,
        })
    }

    #[test]
    fn test_full_cycle_order_and_duration() {
        let timings = PhaseTimings::new(4, 2, 6);
        let cues = CueToggles::default();
        let guard = running();
        let generation = RunGeneration::initial().next();
        let mut sequencer = PhaseSequencer::new();

        let mut step = sequencer.arm(generation, &timings, &cues, &guard);
        let mut visited = Vec::new();
        let mut elapsed = Duration::ZERO;

        for _ in 0..3 {
            let (phase, _) = entered(&step).unwrap();
            visited.push(phase);
            let scheduled = step.schedule.unwrap();
            elapsed += scheduled.delay;
            step = sequencer.advance(scheduled.transition, &timings, &cues, &guard);
        }

        assert_eq!(
            visited,
            vec![PhaseState::Inhale, PhaseState::Hold, PhaseState::Exhale]
        );
        assert_eq!(elapsed, Duration::from_secs(12));
        // 循环结束后自动回到 Inhale
        assert_eq!(entered(&step).map(|(p, _)| p), Some(PhaseState::Inhale));
        assert_eq!(sequencer.cycles_completed(), 1);
    }

    #[test]
    fn test_zero_hold_still_visits_hold() {
        let timings = PhaseTimings::new(3, 0, 3);
        let cues = CueToggles::default();
        let guard = running();
        let mut sequencer = PhaseSequencer::new();

        let step = sequencer.arm(RunGeneration::initial(), &timings, &cues, &guard);
        let step = sequencer.advance(step.schedule.unwrap().transition, &timings, &cues, &guard);

        assert_eq!(entered(&step), Some((PhaseState::Hold, Duration::ZERO)));
        assert_eq!(step.schedule.unwrap().delay, Duration::ZERO);
    }

    #[test]
    fn test_cues_follow_toggles() {
        let timings = PhaseTimings::default();
        let guard = running();
        let mut sequencer = PhaseSequencer::new();

        let cues = CueToggles {
            inhale: true,
            exhale: false,
        };
        let inhale = sequencer.arm(RunGeneration::initial(), &timings, &cues, &guard);
        assert!(inhale
            .effects
            .contains(&PhaseEffect::PlayCue(CueKind::Inhale)));

        let hold = sequencer.advance(inhale.schedule.unwrap().transition, &timings, &cues, &guard);
        assert_eq!(hold.effects.len(), 1);

        let exhale = sequencer.advance(hold.schedule.unwrap().transition, &timings, &cues, &guard);
        assert!(!exhale
            .effects
            .iter()
            .any(|e| matches!(e, PhaseEffect::PlayCue(_))));
    }

    #[test]
    fn test_guard_failure_settles_to_idle() {
        let timings = PhaseTimings::default();
        let cues = CueToggles::default();
        let mut sequencer = PhaseSequencer::new();

        let step = sequencer.arm(RunGeneration::initial(), &timings, &cues, &running());
        let stopped = SessionState {
            remaining_seconds: 30,
            running: false,
        };
        let step = sequencer.advance(step.schedule.unwrap().transition, &timings, &cues, &stopped);

        assert_eq!(step.effects, vec![PhaseEffect::Settle]);
        assert!(step.schedule.is_none());
        assert_eq!(sequencer.state(), PhaseState::Idle);
        assert!(!sequencer.is_armed());
    }

    #[test]
    fn test_out_of_time_settles() {
        let timings = PhaseTimings::default();
        let cues = CueToggles::default();
        let mut sequencer = PhaseSequencer::new();

        let step = sequencer.arm(RunGeneration::initial(), &timings, &cues, &running());
        let expired = SessionState {
            remaining_seconds: 0,
            running: true,
        };
        let step = sequencer.advance(step.schedule.unwrap().transition, &timings, &cues, &expired);
        assert_eq!(step.effects, vec![PhaseEffect::Settle]);
    }

    #[test]
    fn test_stale_generation_is_noop() {
        let timings = PhaseTimings::default();
        let cues = CueToggles::default();
        let guard = running();
        let mut sequencer = PhaseSequencer::new();

        let old = RunGeneration::initial();
        let stale = sequencer.arm(old, &timings, &cues, &guard);
        sequencer.cancel();
        let fresh = sequencer.arm(old.next(), &timings, &cues, &guard);

        let step = sequencer.advance(stale.schedule.unwrap().transition, &timings, &cues, &guard);
        assert!(step.is_empty());
        assert_eq!(sequencer.state(), PhaseState::Inhale);
        assert_eq!(sequencer.armed_generation(), Some(old.next()));

        let step = sequencer.advance(fresh.schedule.unwrap().transition, &timings, &cues, &guard);
        assert_eq!(entered(&step).map(|(p, _)| p), Some(PhaseState::Hold));
    }

    #[test]
    fn test_cancelled_sequencer_ignores_pending() {
        let timings = PhaseTimings::default();
        let cues = CueToggles::default();
        let guard = running();
        let mut sequencer = PhaseSequencer::new();

        let step = sequencer.arm(RunGeneration::initial(), &timings, &cues, &guard);
        assert_eq!(sequencer.cancel(), Some(RunGeneration::initial()));

        let step = sequencer.advance(step.schedule.unwrap().transition, &timings, &cues, &guard);
        assert!(step.is_empty());
        assert_eq!(sequencer.state(), PhaseState::Idle);
    }

    #[test]
    fn test_live_timing_applies_to_next_phase() {
        let cues = CueToggles::default();
        let guard = running();
        let mut sequencer = PhaseSequencer::new();

        let step = sequencer.arm(
            RunGeneration::initial(),
            &PhaseTimings::new(4, 4, 4),
            &cues,
            &guard,
        );
        assert_eq!(step.schedule.unwrap().delay, Duration::from_secs(4));

        let edited = PhaseTimings::new(4, 9, 4);
        let step = sequencer.advance(step.schedule.unwrap().transition, &edited, &cues, &guard);
        assert_eq!(step.schedule.unwrap().delay, Duration::from_secs(9));
    }
}
