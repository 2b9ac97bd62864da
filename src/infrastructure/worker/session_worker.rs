//! Session Worker - 会话事件循环
//!
//! 单任务持有 `SessionController`，串行处理 UI 命令与到期定时器，
//! 每次处理后通过 watch 通道发布快照。

use std::ops::ControlFlow;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, watch};

use crate::application::ports::{SessionTimer, SettingsStorePort};
use crate::application::session::{
    load_session_config, SessionCommand, SessionController, SessionDefaults, SessionSnapshot,
};
use crate::domain::{PhaseTimings, SessionConfig};

use super::DelayQueueScheduler;

/// Worker 错误
#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Session worker has stopped")]
    Closed,
}

/// Worker 配置
#[derive(Debug, Clone)]
pub struct SessionWorkerConfig {
    /// 命令队列容量
    pub command_capacity: usize,
}

impl Default for SessionWorkerConfig {
    fn default() -> Self {
        Self {
            command_capacity: 32,
        }
    }
}

enum WorkerEvent {
    Command(Option<SessionCommand>),
    Timer(SessionTimer),
}

/// 会话 Worker
pub struct SessionWorker {
    controller: SessionController<DelayQueueScheduler>,
    commands: mpsc::Receiver<SessionCommand>,
    snapshots: watch::Sender<SessionSnapshot>,
    settings: Arc<dyn SettingsStorePort>,
    defaults: SessionDefaults,
}

impl SessionWorker {
    pub fn new(
        config: SessionWorkerConfig,
        controller: SessionController<DelayQueueScheduler>,
        settings: Arc<dyn SettingsStorePort>,
        defaults: SessionDefaults,
    ) -> (Self, SessionHandle) {
        let controller = controller.with_defaults(defaults.clone());
        let (command_tx, command_rx) = mpsc::channel(config.command_capacity.max(1));
        let (snapshot_tx, snapshot_rx) = watch::channel(controller.snapshot());

        let worker = Self {
            controller,
            commands: command_rx,
            snapshots: snapshot_tx,
            settings,
            defaults,
        };
        let handle = SessionHandle {
            commands: command_tx,
            snapshots: snapshot_rx,
        };
        (worker, handle)
    }

    /// 启动 Worker；收到 Shutdown 或所有句柄被丢弃后返回
    pub async fn run(mut self) {
        tracing::info!("SessionWorker started");
        self.controller.preload().await;

        loop {
            let event = tokio::select! {
                command = self.commands.recv() => WorkerEvent::Command(command),
                Some(timer) = self.controller.scheduler_mut().next_expired() => WorkerEvent::Timer(timer),
            };

            let flow = match event {
                WorkerEvent::Timer(timer) => {
                    self.controller.on_timer(timer).await;
                    ControlFlow::Continue(())
                }
                WorkerEvent::Command(Some(command)) => self.handle_command(command).await,
                WorkerEvent::Command(None) => {
                    tracing::debug!("All session handles dropped");
                    self.controller.shutdown();
                    ControlFlow::Break(())
                }
            };

            self.publish_snapshot();
            if flow.is_break() {
                break;
            }
        }

        tracing::info!("SessionWorker stopped");
    }

    async fn handle_command(&mut self, command: SessionCommand) -> ControlFlow<()> {
        tracing::debug!(command = ?command, "Session command");
        match command {
            SessionCommand::Start => {
                let config = self.config_from_settings();
                self.controller.start(config).await;
            }
            SessionCommand::StartWith(config) => {
                self.controller.start(config).await;
            }
            SessionCommand::Stop => self.controller.stop(),
            SessionCommand::Toggle => {
                let config = self.config_from_settings();
                self.controller.toggle(config).await;
            }
            SessionCommand::SetTotalDuration(seconds) => {
                self.controller.set_total_duration(seconds)
            }
            SessionCommand::SetPhaseTimings(timings) => {
                self.controller.set_phase_timings(timings)
            }
            SessionCommand::SetLoopVolume(volume) => self.controller.set_loop_volume(volume),
            SessionCommand::ChangeBackground(sound_id) => {
                self.controller.change_background(sound_id).await;
            }
            SessionCommand::SetLanguage(language) => {
                self.controller.set_language(&language);
            }
            SessionCommand::Shutdown => {
                self.controller.shutdown();
                return ControlFlow::Break(());
            }
        }
        ControlFlow::Continue(())
    }

    /// 从设置读取最新配置；总时长沿用控制器当前值
    fn config_from_settings(&self) -> SessionConfig {
        let mut config = load_session_config(self.settings.as_ref(), &self.defaults);
        config.total_duration_secs = self.controller.config().total_duration_secs;
        config
    }

    fn publish_snapshot(&self) {
        self.snapshots.send_replace(self.controller.snapshot());
    }
}

/// Worker 句柄
#[derive(Debug, Clone)]
pub struct SessionHandle {
    commands: mpsc::Sender<SessionCommand>,
    snapshots: watch::Receiver<SessionSnapshot>,
}

impl SessionHandle {
    pub async fn send(&self, command: SessionCommand) -> Result<(), WorkerError> {
        self.commands
            .send(command)
            .await
            .map_err(|_| WorkerError::Closed)
    }

    pub async fn start(&self) -> Result<(), WorkerError> {
        self.send(SessionCommand::Start).await
    }

    pub async fn stop(&self) -> Result<(), WorkerError> {
        self.send(SessionCommand::Stop).await
    }

    pub async fn toggle(&self) -> Result<(), WorkerError> {
        self.send(SessionCommand::Toggle).await
    }

    pub async fn set_total_duration(&self, seconds: u32) -> Result<(), WorkerError> {
        self.send(SessionCommand::SetTotalDuration(seconds)).await
    }

    pub async fn set_phase_timings(&self, timings: PhaseTimings) -> Result<(), WorkerError> {
        self.send(SessionCommand::SetPhaseTimings(timings)).await
    }

    pub async fn set_loop_volume(&self, volume_percent: u8) -> Result<(), WorkerError> {
        self.send(SessionCommand::SetLoopVolume(volume_percent)).await
    }

    pub async fn change_background(&self, sound_id: Option<String>) -> Result<(), WorkerError> {
        self.send(SessionCommand::ChangeBackground(sound_id)).await
    }

    pub async fn set_language(&self, language: impl Into<String>) -> Result<(), WorkerError> {
        self.send(SessionCommand::SetLanguage(language.into())).await
    }

    pub async fn shutdown(&self) -> Result<(), WorkerError> {
        self.send(SessionCommand::Shutdown).await
    }

    /// 最近一次快照
    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshots.borrow().clone()
    }

    /// 订阅快照变化
    pub fn watch(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshots.clone()
    }
}
