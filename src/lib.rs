//! Breathe - 呼吸引导计时器
//!
//! 架构设计: Hexagonal Architecture
//!
//! 领域层 (domain/):
//! - 呼吸阶段、运行代次、会话配置与输入范围
//!
//! 应用层 (application/):
//! - Ports: 资源、解码、输出、调度、设置、标签、视觉端口
//! - Audio: 解码缓存与播放引擎
//! - Session: 阶段状态机与会话控制器
//!
//! 基础设施层 (infrastructure/):
//! - Adapters: 资源读取、symphonia 解码、软件混音输出、标签目录
//! - Memory: 内存设置存储、虚拟时钟调度器
//! - Persistence: TOML 设置文件
//! - Worker: DelayQueue 调度器与会话 Worker
//! - Events: 视觉事件广播

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::{load_config, AppConfig};
