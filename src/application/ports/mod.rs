//! Application Ports - 出站端口定义
//!
//! 定义应用层与基础设施层的抽象接口

mod asset_source;
mod audio_decoder;
mod audio_output;
mod label_resolver;
mod scheduler;
mod settings_store;
mod visual_sink;

pub use asset_source::{AssetError, AssetSourcePort};
pub use audio_decoder::{
    extension_hint, AudioBuffer, AudioDecoderPort, DecodeError, DecodedBuffer,
};
pub use audio_output::{AudioOutputPort, OutputError, OutputState, VoiceId};
pub use label_resolver::{LabelError, LabelKey, LabelResolverPort, TextDirection};
pub use scheduler::{PhaseTransition, SchedulerPort, SessionTimer, TimerKey};
pub use settings_store::{keys as settings_keys, SettingsError, SettingsStorePort};
pub use visual_sink::{VisualEvent, VisualSinkPort};
