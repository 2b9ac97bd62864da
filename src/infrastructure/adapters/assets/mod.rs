//! Asset Adapter - 音频资源读取
//!
//! http(s) 地址走网络，其余按资源根目录下的相对路径读取

mod asset_fetcher;

pub use asset_fetcher::{AssetFetcher, AssetFetcherConfig};
