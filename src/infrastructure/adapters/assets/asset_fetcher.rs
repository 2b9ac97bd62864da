//! Asset Fetcher
//!
//! 实现 AssetSourcePort：
//! - `http://` / `https://` 通过 reqwest 下载
//! - 其他标识视为资源根目录下的相对路径

use async_trait::async_trait;
use reqwest::Client;
use std::path::{Component, Path, PathBuf};
use std::time::Duration;
use tokio::fs;

use crate::application::ports::{AssetError, AssetSourcePort};

/// 资源读取配置
#[derive(Debug, Clone)]
pub struct AssetFetcherConfig {
    /// 本地资源根目录
    pub asset_root: PathBuf,
    /// 网络请求超时时间（秒）
    pub timeout_secs: u64,
}

impl Default for AssetFetcherConfig {
    fn default() -> Self {
        Self {
            asset_root: PathBuf::from("assets"),
            timeout_secs: 30,
        }
    }
}

impl AssetFetcherConfig {
    pub fn new(asset_root: impl Into<PathBuf>) -> Self {
        Self {
            asset_root: asset_root.into(),
            ..Default::default()
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

/// 资源读取器
pub struct AssetFetcher {
    client: Client,
    config: AssetFetcherConfig,
}

impl AssetFetcher {
    pub fn new(config: AssetFetcherConfig) -> Result<Self, AssetError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AssetError::NetworkError(e.to_string()))?;

        Ok(Self { client, config })
    }

    pub fn asset_root(&self) -> &Path {
        &self.config.asset_root
    }

    fn is_remote(source_id: &str) -> bool {
        source_id.starts_with("http://") || source_id.starts_with("https://")
    }

    /// 解析本地路径，拒绝绝对路径与跳出根目录的路径
    fn resolve_local(&self, source_id: &str) -> Result<PathBuf, AssetError> {
        let relative = Path::new(source_id);
        let escapes = relative.components().any(|c| {
            matches!(
                c,
                Component::ParentDir | Component::RootDir | Component::Prefix(_)
            )
        });
        if escapes {
            return Err(AssetError::InvalidSource(source_id.to_string()));
        }
        Ok(self.config.asset_root.join(relative))
    }

    async fn fetch_remote(&self, url: &str) -> Result<Vec<u8>, AssetError> {
        tracing::debug!(url = %url, "Fetching remote asset");

        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                AssetError::NetworkError(format!("Timeout fetching {}", url))
            } else if e.is_connect() {
                AssetError::NetworkError(format!("Cannot connect to {}: {}", url, e))
            } else {
                AssetError::NetworkError(e.to_string())
            }
        })?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(AssetError::NotFound(url.to_string()));
        }
        if !status.is_success() {
            return Err(AssetError::NetworkError(format!("HTTP {}: {}", status, url)));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| AssetError::NetworkError(format!("Failed to read body: {}", e)))?;

        Ok(bytes.to_vec())
    }

    async fn fetch_local(&self, source_id: &str) -> Result<Vec<u8>, AssetError> {
        let path = self.resolve_local(source_id)?;
        fs::read(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                AssetError::NotFound(path.display().to_string())
            } else {
                AssetError::IoError(e.to_string())
            }
        })
    }
}

#[async_trait]
impl AssetSourcePort for AssetFetcher {
    async fn fetch(&self, source_id: &str) -> Result<Vec<u8>, AssetError> {
        if source_id.trim().is_empty() {
            return Err(AssetError::InvalidSource(source_id.to_string()));
        }

        let data = if Self::is_remote(source_id) {
            self.fetch_remote(source_id).await?
        } else {
            self.fetch_local(source_id).await?
        };

        tracing::debug!(source_id = %source_id, size = data.len(), "Asset fetched");
        Ok(data)
    }
}
