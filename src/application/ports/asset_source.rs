//! Asset Source Port - 声音资源读取
//!
//! 按不透明的资源标识（相对路径或 URL）读取原始字节

use async_trait::async_trait;
use thiserror::Error;

/// 资源读取错误
#[derive(Debug, Error)]
pub enum AssetError {
    #[error("Asset not found: {0}")]
    NotFound(String),

    #[error("Invalid asset source: {0}")]
    InvalidSource(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("IO error: {0}")]
    IoError(String),
}

/// Asset Source Port
#[async_trait]
pub trait AssetSourcePort: Send + Sync {
    /// 读取资源的全部字节
    async fn fetch(&self, source_id: &str) -> Result<Vec<u8>, AssetError>;
}
