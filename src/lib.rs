//! VoxCache - 响应语音合成与音频缓存
//!
//! 架构设计: Hexagonal Architecture
//!
//! 领域层 (domain/):
//! - TTS Context: 宿主响应模型、可朗读片段、缓存 key 与存储路径
//!
//! 应用层 (application/):
//! - Ports: 端口定义（TtsCachePort, SpeechSynthesizerPort）
//! - Orchestrator: 查缓存 -> 合成 -> 写缓存 -> 挂载音频
//! - Commands: 命令处理器
//!
//! 基础设施层 (infrastructure/):
//! - HTTP: RESTful API + 缓存音频静态文件
//! - Adapters: HTTP/Fake TTS Client, 文件缓存
//! - Persistence: Sled 缓存
//! - Memory: 进程内缓存
//! - Factory: 按配置构造后端

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::{load_config, AppConfig};
