//! Infrastructure Adapters
//!
//! 六边形架构的适配器实现

pub mod assets;
pub mod decoder;
pub mod i18n;
pub mod output;

pub use assets::*;
pub use decoder::*;
pub use i18n::*;
pub use output::*;
