//! JSON Label Catalog
//!
//! 目录格式：`{ "<lang>": { "<key>": "<text>" } }`。
//! 缺失的键记录错误并回退到英文默认文本。

use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tokio::fs;

use crate::application::ports::{LabelError, LabelKey, LabelResolverPort, TextDirection};

/// 从右到左书写的语言
const RTL_LANGUAGES: &[&str] = &["fa", "ar", "he", "ur"];

type Catalog = HashMap<String, HashMap<String, String>>;

/// 多语言标签目录
pub struct JsonLabelCatalog {
    catalog: Catalog,
    language: RwLock<String>,
}

impl JsonLabelCatalog {
    /// 解析目录并选择语言
    pub fn from_json_str(json: &str, language: &str) -> Result<Self, LabelError> {
        let catalog: Catalog =
            serde_json::from_str(json).map_err(|e| LabelError::ParseError(e.to_string()))?;

        if !catalog.contains_key(language) {
            return Err(LabelError::UnknownLanguage(language.to_string()));
        }

        Ok(Self {
            catalog,
            language: RwLock::new(language.to_string()),
        })
    }

    /// 从文件读取目录
    pub async fn load(path: impl AsRef<Path>, language: &str) -> Result<Self, LabelError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)
            .await
            .map_err(|e| LabelError::IoError(format!("{}: {}", path.display(), e)))?;

        let catalog = Self::from_json_str(&json, language)?;
        tracing::info!(
            path = %path.display(),
            language = %language,
            languages = catalog.catalog.len(),
            "Label catalog loaded"
        );
        Ok(catalog)
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn language(&self) -> String {
        self.language.read().clone()
    }

    /// 目录中的全部语言
    pub fn languages(&self) -> Vec<String> {
        let mut languages: Vec<String> = self.catalog.keys().cloned().collect();
        languages.sort();
        languages
    }

    /// 查找任意键（包括核心之外的按钮文本）
    pub fn lookup(&self, key: &str) -> Option<String> {
        let language = self.language.read();
        self.catalog
            .get(language.as_str())
            .and_then(|entries| entries.get(key))
            .cloned()
    }
}

impl LabelResolverPort for JsonLabelCatalog {
    fn resolve(&self, key: LabelKey) -> String {
        match self.lookup(key.as_str()) {
            Some(text) => text,
            None => {
                tracing::error!(
                    key = key.as_str(),
                    language = %self.language(),
                    "Missing label, using default"
                );
                key.default_text().to_string()
            }
        }
    }

    /// 未知语言保持原语言不变
    fn set_language(&self, language: &str) -> Result<(), LabelError> {
        if !self.catalog.contains_key(language) {
            tracing::error!(language = %language, "Invalid language");
            return Err(LabelError::UnknownLanguage(language.to_string()));
        }
        *self.language.write() = language.to_string();
        Ok(())
    }

    fn direction(&self) -> TextDirection {
        if RTL_LANGUAGES.contains(&self.language.read().as_str()) {
            TextDirection::Rtl
        } else {
            TextDirection::Ltr
        }
    }
}
