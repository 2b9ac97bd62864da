//! Output Adapter - 软件混音输出图与系统音频设备

#[cfg(feature = "device")]
mod cpal_device;
mod mixer_graph;
mod render_pump;

#[cfg(feature = "device")]
pub use cpal_device::DeviceOutput;
pub use mixer_graph::{MixerGraph, MixerGraphConfig};
pub use render_pump::{sample_ring, spawn_render_pump, SampleReader, SampleWriter};
