//! Breathe - 呼吸引导计时器
//!
//! 启动一次会话：读取配置与设置，装配端口，运行 SessionWorker，
//! 记录所有视觉事件，直到会话结束回到 Ready 或收到 Ctrl-C。

use std::sync::Arc;
#[cfg(feature = "device")]
use std::time::Duration;

use breathe::application::ports::{
    LabelResolverPort, SettingsStorePort, VisualEvent, VisualSinkPort,
};
use breathe::application::{
    load_language, load_session_config, AudioBufferCache, AudioPlaybackEngine, CueAssets,
    SessionController,
};
use breathe::config::{load_config, load_config_from_path, print_config, AppConfig};
use breathe::domain::SessionDisplayState;
#[cfg(feature = "device")]
use breathe::infrastructure::adapters::{sample_ring, spawn_render_pump, DeviceOutput};
use breathe::infrastructure::adapters::{
    AssetFetcher, AssetFetcherConfig, DefaultLabels, JsonLabelCatalog, MixerGraph,
    MixerGraphConfig, SymphoniaDecoder,
};
use breathe::infrastructure::events::VisualEventPublisher;
use breathe::infrastructure::persistence::TomlSettingsStore;
use breathe::infrastructure::worker::{DelayQueueScheduler, SessionWorker, SessionWorkerConfig};
use tokio::sync::broadcast;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 加载配置（优先级：环境变量 > 配置文件 > 默认值）
    let config = match std::env::args().nth(1) {
        Some(path) => load_config_from_path(Some(std::path::Path::new(&path))),
        None => load_config(),
    }
    .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

    init_tracing(&config);

    tracing::info!("Breathe - 呼吸引导计时器");
    print_config(&config);

    // 设置存储
    let settings: Arc<dyn SettingsStorePort> =
        Arc::new(TomlSettingsStore::open(&config.settings.path)?);
    let defaults = config.session_defaults();

    // 标签目录（缺失时使用内置英文）
    let language = load_language(settings.as_ref(), &defaults);
    let labels: Arc<dyn LabelResolverPort> =
        match JsonLabelCatalog::load(&config.i18n.catalog, &language).await {
            Ok(catalog) => catalog.arc(),
            Err(e) => {
                tracing::warn!(error = %e, "Label catalog unavailable, using built-in labels");
                DefaultLabels.arc()
            }
        };

    // 音频
    let fetcher = AssetFetcher::new(
        AssetFetcherConfig::new(&config.audio.asset_root)
            .with_timeout(config.audio.fetch_timeout_secs),
    )?;
    let cache = AudioBufferCache::new(Arc::new(fetcher), Arc::new(SymphoniaDecoder::new())).arc();
    let mixer = MixerGraph::new(MixerGraphConfig {
        sample_rate: config.audio.sample_rate,
        channels: config.audio.channels,
        max_gain: config.audio.max_gain,
        start_suspended: true,
    })
    .arc();
    let engine = AudioPlaybackEngine::new(mixer.clone(), cache.clone());

    // 视觉事件
    let publisher = VisualEventPublisher::new().arc();
    let mut events = publisher.subscribe();
    let visuals: Arc<dyn VisualSinkPort> = publisher.clone();

    // 会话
    let cues = CueAssets {
        inhale: config.audio.inhale_cue.clone(),
        exhale: config.audio.exhale_cue.clone(),
    };
    let initial = load_session_config(settings.as_ref(), &defaults);
    let controller = SessionController::new(
        DelayQueueScheduler::new(),
        engine,
        visuals,
        labels,
        cues,
        initial,
    );

    let (worker, handle) =
        SessionWorker::new(SessionWorkerConfig::default(), controller, settings, defaults);
    let worker_task = tokio::spawn(worker.run());

    // 音频设备：渲染泵 → 环形缓冲区 → 设备回调
    let audio = open_audio(&config, mixer.clone());

    handle.start().await?;

    let mut finished = false;
    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(event) => {
                    log_event(&event);
                    match event.session_state() {
                        Some(SessionDisplayState::Done) => finished = true,
                        Some(SessionDisplayState::Ready) if finished => break,
                        _ => {}
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped = skipped, "Visual event log lagged");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Received shutdown signal");
                break;
            }
        }
    }

    let snapshot = handle.snapshot();
    handle.shutdown().await?;
    worker_task.await?;
    mixer.close();
    if let Some(audio) = audio {
        audio.finish().await;
    }

    let stats = cache.stats();
    tracing::info!(
        remaining = %snapshot.remaining_text,
        frames_rendered = mixer.frames_rendered(),
        cached_buffers = stats.entries,
        cache_hits = stats.hit_count,
        cache_misses = stats.miss_count,
        load_failures = stats.failure_count,
        "Shutdown complete"
    );

    Ok(())
}

/// 设备输出与驱动它的渲染泵
#[cfg_attr(not(feature = "device"), allow(dead_code))]
struct AudioSink {
    #[cfg(feature = "device")]
    device: DeviceOutput,
    pump: tokio::task::JoinHandle<()>,
}

impl AudioSink {
    /// 混音图关闭后渲染泵自行退出
    async fn finish(self) {
        if let Err(e) = self.pump.await {
            tracing::warn!(error = %e, "Render pump failed");
        }
        #[cfg(feature = "device")]
        tracing::info!(
            samples_played = self.device.samples_played(),
            underruns = self.device.underruns(),
            "Audio device closed"
        );
    }
}

#[cfg(feature = "device")]
fn open_audio(config: &AppConfig, mixer: Arc<MixerGraph>) -> Option<AudioSink> {
    if !config.audio.device_output {
        tracing::info!("Device output disabled, cues are not played");
        return None;
    }

    let (writer, reader) = sample_ring(config.audio.ring_buffer_chunks);
    match DeviceOutput::open(config.audio.sample_rate, config.audio.channels, reader) {
        Ok(device) => {
            let pump = spawn_render_pump(
                mixer,
                writer,
                config.audio.frames_per_render(),
                Duration::from_millis(config.audio.render_interval_ms),
            );
            Some(AudioSink { device, pump })
        }
        Err(e) => {
            tracing::warn!(error = %e, "Audio device unavailable, cues are not played");
            None
        }
    }
}

#[cfg(not(feature = "device"))]
fn open_audio(config: &AppConfig, _mixer: Arc<MixerGraph>) -> Option<AudioSink> {
    if config.audio.device_output {
        tracing::warn!("Built without the `device` feature, cues are not played");
    }
    None
}

/// 初始化日志（RUST_LOG 优先于配置）
fn init_tracing(config: &AppConfig) {
    let log_filter = format!("{},breathe={}", config.log.level, config.log.level);
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_filter));

    if config.log.json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

fn log_event(event: &VisualEvent) {
    match serde_json::to_string(event) {
        Ok(json) => tracing::info!(event = %json, "Visual"),
        Err(e) => tracing::warn!(error = %e, "Failed to serialize visual event"),
    }
}
