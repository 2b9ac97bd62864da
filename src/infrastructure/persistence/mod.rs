//! Persistence Layer - 设置持久化

mod toml_settings;

pub use toml_settings::TomlSettingsStore;
