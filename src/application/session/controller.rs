//! Session Controller - 会话控制器
//!
//! 持有会话的全部可变状态：倒计时、阶段状态机、播放引擎和调度器。
//! 每次 start / stop 递增运行代次，所有定时器在触发时先比较代次，
//! 因此即使取消失败，旧代次的回调也不会产生副作用。

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

use crate::application::audio::AudioPlaybackEngine;
use crate::application::ports::{
    AudioBuffer, LabelKey, LabelResolverPort, SchedulerPort, SessionTimer, TimerKey, VisualEvent,
    VisualSinkPort,
};
use crate::domain::{
    format_time, CueKind, PhaseState, PhaseTimings, RunGeneration, SessionConfig,
    SessionDisplayState, RESET_TRANSITION_SECS, RESTING_SCALE,
};

use super::{PhaseEffect, PhaseSequencer, PhaseStep, SessionDefaults, SessionState};

/// 倒计时间隔
pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Done 显示多久后回到 Ready
pub const DONE_DISPLAY_DELAY: Duration = Duration::from_secs(2);

/// 吸气 / 呼气提示音的资源标识
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CueAssets {
    pub inhale: String,
    pub exhale: String,
}

impl Default for CueAssets {
    fn default() -> Self {
        Self {
            inhale: "sounds/inhale.mp3".to_string(),
            exhale: "sounds/exhale.mp3".to_string(),
        }
    }
}

#[derive(Debug, Default)]
struct CueBuffers {
    inhale: Option<AudioBuffer>,
    exhale: Option<AudioBuffer>,
}

impl CueBuffers {
    fn get(&self, cue: CueKind) -> Option<&AudioBuffer> {
        match cue {
            CueKind::Inhale => self.inhale.as_ref(),
            CueKind::Exhale => self.exhale.as_ref(),
        }
    }
}

/// 会话快照（供 UI 查询）
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSnapshot {
    pub running: bool,
    pub remaining_seconds: u32,
    pub remaining_text: String,
    pub phase: PhaseState,
    pub generation: u64,
    pub started_at: Option<DateTime<Utc>>,
    pub background: Option<String>,
}

/// 会话控制器
pub struct SessionController<S: SchedulerPort> {
    scheduler: S,
    engine: AudioPlaybackEngine,
    visuals: Arc<dyn VisualSinkPort>,
    labels: Arc<dyn LabelResolverPort>,
    cue_assets: CueAssets,
    cue_buffers: CueBuffers,
    /// 阶段时长与音量的取值范围
    defaults: SessionDefaults,
    sequencer: PhaseSequencer,
    state: SessionState,
    config: SessionConfig,
    /// 运行中可修改的阶段时长，在每个阶段开始时读取
    timings: PhaseTimings,
    generation: RunGeneration,
    phase_timer: Option<TimerKey>,
    tick_timer: Option<TimerKey>,
    reset_timer: Option<TimerKey>,
    started_at: Option<DateTime<Utc>>,
}

impl<S: SchedulerPort> SessionController<S> {
    pub fn new(
        scheduler: S,
        engine: AudioPlaybackEngine,
        visuals: Arc<dyn VisualSinkPort>,
        labels: Arc<dyn LabelResolverPort>,
        cue_assets: CueAssets,
        initial: SessionConfig,
    ) -> Self {
        let defaults = SessionDefaults::default();
        let config = clamp_config(&defaults, initial);
        Self {
            scheduler,
            engine,
            visuals,
            labels,
            cue_assets,
            cue_buffers: CueBuffers::default(),
            defaults,
            sequencer: PhaseSequencer::new(),
            state: SessionState::idle(config.total_duration_secs),
            timings: config.timings,
            config,
            generation: RunGeneration::initial(),
            phase_timer: None,
            tick_timer: None,
            reset_timer: None,
            started_at: None,
        }
    }

    /// 使用给定的输入范围，并据此重新夹取当前配置
    pub fn with_defaults(mut self, defaults: SessionDefaults) -> Self {
        self.config = clamp_config(&defaults, self.config);
        self.timings = self.config.timings;
        self.defaults = defaults;
        self
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state.running
    }

    pub fn phase(&self) -> PhaseState {
        self.sequencer.state()
    }

    pub fn generation(&self) -> RunGeneration {
        self.generation
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn timings(&self) -> PhaseTimings {
        self.timings
    }

    pub fn sequencer(&self) -> &PhaseSequencer {
        &self.sequencer
    }

    pub fn engine(&self) -> &AudioPlaybackEngine {
        &self.engine
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            running: self.state.running,
            remaining_seconds: self.state.remaining_seconds,
            remaining_text: format_time(self.state.remaining_seconds),
            phase: self.sequencer.state(),
            generation: self.generation.value(),
            started_at: self.started_at,
            background: self.engine.current_loop().map(|l| l.source_id.clone()),
        }
    }

    /// 预加载提示音
    pub async fn preload(&mut self) {
        self.load_cues().await;
    }

    /// 开始会话
    ///
    /// 已在运行时什么都不做并返回 false
    pub async fn start(&mut self, config: SessionConfig) -> bool {
        if self.state.running {
            tracing::debug!(generation = %self.generation, "Session already running, start ignored");
            return false;
        }

        let config = clamp_config(&self.defaults, config);
        self.cancel_timers();
        self.sequencer.cancel();
        self.generation = self.generation.next();
        self.timings = config.timings;
        self.state = SessionState {
            remaining_seconds: config.total_duration_secs,
            running: true,
        };
        self.config = config;
        self.started_at = Some(Utc::now());

        tracing::info!(
            generation = %self.generation,
            total_secs = self.config.total_duration_secs,
            inhale = self.timings.inhale_secs,
            hold = self.timings.hold_secs,
            exhale = self.timings.exhale_secs,
            "Session started"
        );

        self.engine.ensure_active().await;
        self.load_cues().await;

        if let Some(background) = self.config.background.clone() {
            let already_looping = self
                .engine
                .current_loop()
                .is_some_and(|l| l.source_id == background);
            if !already_looping {
                self.engine
                    .start_loop(&background, self.config.background_volume)
                    .await;
            }
        }

        self.publish_remaining();

        let step = self.sequencer.arm(
            self.generation,
            &self.timings,
            &self.config.cues,
            &self.state,
        );
        self.apply_step(step).await;

        self.tick_timer = Some(self.scheduler.schedule(
            TICK_INTERVAL,
            SessionTimer::Tick {
                generation: self.generation,
            },
        ));
        true
    }

    /// 停止会话并复位（幂等）
    pub fn stop(&mut self) {
        let was_running = self.state.running;
        self.halt();
        self.publish_resting();
        self.publish_remaining();
        self.publish_display(SessionDisplayState::Ready);
        tracing::info!(generation = %self.generation, was_running = was_running, "Session stopped");
    }

    /// 开始 / 停止切换
    pub async fn toggle(&mut self, config: SessionConfig) {
        if self.state.running {
            self.stop();
        } else {
            self.start(config).await;
        }
    }

    /// 修改总时长
    ///
    /// 空闲时立即更新剩余时间；运行中只在下次复位时生效
    pub fn set_total_duration(&mut self, seconds: u32) {
        let seconds = seconds.max(1);
        self.config.total_duration_secs = seconds;
        if self.state.running {
            tracing::debug!(seconds = seconds, "Total duration stored for next session");
            return;
        }
        self.state.remaining_seconds = seconds;
        self.publish_remaining();
    }

    /// 修改阶段时长，从下一个阶段开始生效
    pub fn set_phase_timings(&mut self, timings: PhaseTimings) {
        let timings = self.defaults.clamp_timings(timings).normalized();
        self.timings = timings;
        self.config.timings = timings;
        tracing::debug!(
            inhale = timings.inhale_secs,
            hold = timings.hold_secs,
            exhale = timings.exhale_secs,
            running = self.state.running,
            "Phase timings updated"
        );
    }

    pub fn set_loop_volume(&mut self, volume_percent: u8) {
        let volume_percent = self.defaults.clamp_volume(u32::from(volume_percent));
        self.config.background_volume = volume_percent;
        self.engine.set_loop_volume(volume_percent);
    }

    /// 切换背景音，立即生效
    pub async fn change_background(&mut self, sound_id: Option<String>) {
        let sound_id = sound_id.filter(|id| !id.is_empty());
        self.config.background = sound_id.clone();
        match sound_id {
            Some(id) => {
                self.engine
                    .start_loop(&id, self.config.background_volume)
                    .await;
            }
            None => self.engine.stop_loop(),
        }
    }

    /// 切换界面语言
    ///
    /// 未知语言保持原语言。空闲且没有待显示的 Done 时重新发布 Ready 文本
    pub fn set_language(&mut self, language: &str) -> bool {
        if let Err(e) = self.labels.set_language(language) {
            tracing::warn!(language = %language, error = %e, "Language not changed");
            return false;
        }
        tracing::info!(language = %language, "Language changed");
        if !self.state.running && self.reset_timer.is_none() {
            self.publish_display(SessionDisplayState::Ready);
        }
        true
    }

    /// 停止所有定时器与背景音，不发出视觉事件
    pub fn shutdown(&mut self) {
        self.halt();
        self.engine.stop_loop();
        tracing::info!("Session controller shut down");
    }

    /// 定时器到期
    pub async fn on_timer(&mut self, timer: SessionTimer) {
        if timer.generation() != self.generation {
            tracing::trace!(
                timer_generation = %timer.generation(),
                generation = %self.generation,
                "Stale timer ignored"
            );
            return;
        }

        match timer {
            SessionTimer::Tick { .. } => self.on_tick(),
            SessionTimer::Phase(transition) => {
                self.phase_timer = None;
                let step = self.sequencer.advance(
                    transition,
                    &self.timings,
                    &self.config.cues,
                    &self.state,
                );
                self.apply_step(step).await;
            }
            SessionTimer::ReadyReset { .. } => {
                self.reset_timer = None;
                if !self.state.running {
                    self.publish_display(SessionDisplayState::Ready);
                }
            }
        }
    }

    fn on_tick(&mut self) {
        self.tick_timer = None;
        if !self.state.running {
            return;
        }

        self.state.remaining_seconds = self.state.remaining_seconds.saturating_sub(1);
        self.publish_remaining();

        if self.state.remaining_seconds == 0 {
            self.complete();
            return;
        }

        self.tick_timer = Some(self.scheduler.schedule(
            TICK_INTERVAL,
            SessionTimer::Tick {
                generation: self.generation,
            },
        ));
    }

    fn complete(&mut self) {
        self.halt();
        self.publish_resting();
        self.publish_remaining();
        self.publish_display(SessionDisplayState::Done);

        self.reset_timer = Some(self.scheduler.schedule(
            DONE_DISPLAY_DELAY,
            SessionTimer::ReadyReset {
                generation: self.generation,
            },
        ));
        tracing::info!(generation = %self.generation, "Session completed");
    }

    /// 取消定时器与状态机，复位倒计时
    ///
    /// 只有存在运行中的会话或待触发的定时器时才递增代次
    fn halt(&mut self) {
        let active = self.state.running
            || !self.sequencer.state().is_idle()
            || self.phase_timer.is_some()
            || self.tick_timer.is_some()
            || self.reset_timer.is_some();
        self.cancel_timers();
        self.sequencer.cancel();
        if active {
            self.generation = self.generation.next();
        }
        self.state = SessionState::idle(self.config.total_duration_secs);
        self.started_at = None;
    }

    fn cancel_timers(&mut self) {
        for key in [
            self.phase_timer.take(),
            self.tick_timer.take(),
            self.reset_timer.take(),
        ]
        .into_iter()
        .flatten()
        {
            self.scheduler.cancel(key);
        }
    }

    async fn load_cues(&mut self) {
        if self.cue_buffers.inhale.is_none() {
            self.cue_buffers.inhale = self.engine.cache().get(&self.cue_assets.inhale).await;
        }
        if self.cue_buffers.exhale.is_none() {
            self.cue_buffers.exhale = self.engine.cache().get(&self.cue_assets.exhale).await;
        }
    }

    async fn apply_step(&mut self, step: PhaseStep) {
        for effect in step.effects {
            match effect {
                PhaseEffect::Enter { phase, duration } => {
                    let label = LabelKey::for_phase(phase).map(|key| self.labels.resolve(key));
                    tracing::debug!(phase = %phase, duration_secs = duration.as_secs(), "Phase entered");
                    self.visuals.publish(VisualEvent::Phase {
                        phase,
                        duration_secs: duration.as_secs_f32(),
                        scale: phase.target_scale(),
                        label,
                    });
                }
                PhaseEffect::PlayCue(cue) => {
                    self.engine.play_one_shot(self.cue_buffers.get(cue)).await;
                }
                PhaseEffect::Settle => self.publish_resting(),
            }
        }

        if let Some(scheduled) = step.schedule {
            if let Some(previous) = self.phase_timer.take() {
                self.scheduler.cancel(previous);
            }
            self.phase_timer = Some(
                self.scheduler
                    .schedule(scheduled.delay, SessionTimer::Phase(scheduled.transition)),
            );
        }
    }

    fn publish_resting(&self) {
        self.visuals.publish(VisualEvent::Phase {
            phase: PhaseState::Idle,
            duration_secs: RESET_TRANSITION_SECS,
            scale: Some(RESTING_SCALE),
            label: None,
        });
    }

    fn publish_remaining(&self) {
        self.visuals.publish(VisualEvent::Remaining {
            seconds: self.state.remaining_seconds,
            text: format_time(self.state.remaining_seconds),
        });
    }

    fn publish_display(&self, state: SessionDisplayState) {
        self.visuals.publish(VisualEvent::Session {
            state,
            label: self.labels.resolve(LabelKey::for_display(state)),
        });
    }
}

/// 把阶段时长与音量夹到输入范围内
fn clamp_config(defaults: &SessionDefaults, mut config: SessionConfig) -> SessionConfig {
    config.timings = defaults.clamp_timings(config.timings);
    config.background_volume = defaults.clamp_volume(u32::from(config.background_volume));
    config.normalized()
}
