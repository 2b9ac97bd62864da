//! TOML Settings Store
//!
//! 磁盘上的扁平 TOML 表，外围 UI 写入、核心读取。
//! 数值与布尔值按字符串读出，写入时统一保存为字符串。

use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::application::ports::{SettingsError, SettingsStorePort};

/// TOML 文件设置存储
pub struct TomlSettingsStore {
    path: PathBuf,
    values: RwLock<BTreeMap<String, String>>,
}

impl TomlSettingsStore {
    /// 打开设置文件；文件不存在时视为空表
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref().to_path_buf();
        let values = Self::read_file(&path)?;

        tracing::info!(
            path = %path.display(),
            entries = values.len(),
            "Settings loaded"
        );

        Ok(Self {
            path,
            values: RwLock::new(values),
        })
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 重新读取文件（外部写入后调用）
    pub fn reload(&self) -> Result<(), SettingsError> {
        let values = Self::read_file(&self.path)?;
        *self.values.write() = values;
        tracing::debug!(path = %self.path.display(), "Settings reloaded");
        Ok(())
    }

    fn read_file(path: &Path) -> Result<BTreeMap<String, String>, SettingsError> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(SettingsError::IoError(e.to_string())),
        };

        let table: toml::Table =
            toml::from_str(&content).map_err(|e| SettingsError::ParseError(e.to_string()))?;

        let mut values = BTreeMap::new();
        for (key, value) in table {
            let text = match value {
                toml::Value::String(s) => s,
                toml::Value::Integer(i) => i.to_string(),
                toml::Value::Float(f) => f.to_string(),
                toml::Value::Boolean(b) => b.to_string(),
                other => {
                    tracing::warn!(key = %key, value = %other, "Ignoring non-scalar setting");
                    continue;
                }
            };
            values.insert(key, text);
        }
        Ok(values)
    }

    fn write_file(&self, values: &BTreeMap<String, String>) -> Result<(), SettingsError> {
        let content =
            toml::to_string(values).map_err(|e| SettingsError::SerializationError(e.to_string()))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| SettingsError::IoError(e.to_string()))?;
        }
        std::fs::write(&self.path, content).map_err(|e| SettingsError::IoError(e.to_string()))
    }
}

impl SettingsStorePort for TomlSettingsStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.read().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), SettingsError> {
        let mut values = self.values.write();
        values.insert(key.to_string(), value.to_string());
        self.write_file(&values)?;
        tracing::debug!(key = %key, value = %value, "Setting saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let store = TomlSettingsStore::open(dir.path().join("settings.toml")).unwrap();
        assert!(store.get("bgVolume").is_none());
    }

    #[test]
    fn test_reads_scalars_as_strings() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.toml");
        std::fs::write(
            &path,
            "inhaleDuration = 6\ninhaleSoundToggle = false\nbgSound = \"sounds/rain.mp3\"\n",
        )
        .unwrap();

        let store = TomlSettingsStore::open(&path).unwrap();
        assert_eq!(store.get("inhaleDuration").as_deref(), Some("6"));
        assert_eq!(store.get("inhaleSoundToggle").as_deref(), Some("false"));
        assert_eq!(store.get("bgSound").as_deref(), Some("sounds/rain.mp3"));
    }

    #[test]
    fn test_set_persists() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/settings.toml");

        let store = TomlSettingsStore::open(&path).unwrap();
        store.set("bgVolume", "35").unwrap();
        store.set("language", "fa").unwrap();

        let reopened = TomlSettingsStore::open(&path).unwrap();
        assert_eq!(reopened.get("bgVolume").as_deref(), Some("35"));
        assert_eq!(reopened.get("language").as_deref(), Some("fa"));
    }

    #[test]
    fn test_reload_and_parse_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.toml");
        let store = TomlSettingsStore::open(&path).unwrap();

        std::fs::write(&path, "holdDuration = 2\n").unwrap();
        store.reload().unwrap();
        assert_eq!(store.get("holdDuration").as_deref(), Some("2"));

        std::fs::write(&path, "not toml at all [").unwrap();
        assert!(matches!(store.reload(), Err(SettingsError::ParseError(_))));
        assert_eq!(store.get("holdDuration").as_deref(), Some("2"));
    }
}
