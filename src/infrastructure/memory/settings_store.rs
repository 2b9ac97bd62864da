//! In-Memory Settings Store

use dashmap::DashMap;
use std::sync::Arc;

use crate::application::ports::{SettingsError, SettingsStorePort};

/// 内存设置存储
pub struct InMemorySettingsStore {
    values: DashMap<String, String>,
}

impl InMemorySettingsStore {
    pub fn new() -> Self {
        Self {
            values: DashMap::new(),
        }
    }

    /// 以给定键值初始化
    pub fn with_values<I, K, V>(values: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            values: values
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl Default for InMemorySettingsStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SettingsStorePort for InMemorySettingsStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).map(|v| v.clone())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), SettingsError> {
        self.values.insert(key.to_string(), value.to_string());
        tracing::debug!(key = %key, value = %value, "Setting updated");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_set() {
        let store = InMemorySettingsStore::new();
        assert!(store.get("bgVolume").is_none());

        store.set("bgVolume", "30").unwrap();
        assert_eq!(store.get("bgVolume").as_deref(), Some("30"));

        store.set("bgVolume", "70").unwrap();
        assert_eq!(store.get("bgVolume").as_deref(), Some("70"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_with_values() {
        let store = InMemorySettingsStore::with_values([("language", "fa"), ("bgSound", "")]);
        assert_eq!(store.get("language").as_deref(), Some("fa"));
        assert_eq!(store.get("bgSound").as_deref(), Some(""));
    }
}
