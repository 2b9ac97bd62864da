//! Events - 视觉事件分发

mod publisher;

pub use publisher::VisualEventPublisher;
