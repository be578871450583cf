//! Configuration Types
//!
//! 定义所有配置结构体

use serde::Deserialize;
use std::path::PathBuf;

use crate::application::orchestrator::TtsSettings;

/// 应用主配置
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// 服务器配置
    #[serde(default)]
    pub server: ServerConfig,

    /// 编排配置
    #[serde(default)]
    pub tts: TtsConfig,

    /// 合成后端配置
    #[serde(default)]
    pub synthesis: SynthesisConfig,

    /// 缓存后端配置
    #[serde(default)]
    pub cache: CacheConfig,

    /// 日志配置
    #[serde(default)]
    pub log: LogConfig,
}

impl AppConfig {
    /// 缓存条目的公开 Base URL
    ///
    /// 未显式配置时指向本服务的静态文件挂载点
    pub fn cache_base_url(&self) -> String {
        self.cache.base_url.clone().unwrap_or_else(|| {
            format!(
                "{}/{}",
                self.server.public_base_url().trim_end_matches('/'),
                self.cache.static_mount.trim_matches('/')
            )
        })
    }
}

/// 服务器配置
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// 监听地址
    #[serde(default = "default_host")]
    pub host: String,

    /// 监听端口
    #[serde(default = "default_port")]
    pub port: u16,

    /// 公开访问的 Base URL
    /// 如果未设置，则使用 http://{host}:{port}
    #[serde(default)]
    pub base_url: Option<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5060
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            base_url: None,
        }
    }
}

impl ServerConfig {
    /// 获取服务器地址
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// 获取公开的 Base URL
    pub fn public_base_url(&self) -> String {
        self.base_url.clone().unwrap_or_else(|| {
            let host = if self.host == "0.0.0.0" {
                "localhost"
            } else {
                &self.host
            };
            format!("http://{}:{}", host, self.port)
        })
    }
}

/// 编排配置
#[derive(Debug, Clone, Deserialize)]
pub struct TtsConfig {
    /// 音频格式（mp3 / ogg_vorbis / pcm）
    #[serde(default = "default_output_format")]
    pub output_format: String,

    /// 请求未带 locale 时使用
    #[serde(default = "default_fallback_locale")]
    pub fallback_locale: String,

    /// 响应中是否保留 Base64 音频
    #[serde(default)]
    pub include_raw_audio: bool,

    /// 音频写入的平台段
    #[serde(default = "default_platform")]
    pub platform: String,
}

fn default_output_format() -> String {
    "mp3".to_string()
}

fn default_fallback_locale() -> String {
    "en-US".to_string()
}

fn default_platform() -> String {
    "web".to_string()
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            output_format: default_output_format(),
            fallback_locale: default_fallback_locale(),
            include_raw_audio: false,
            platform: default_platform(),
        }
    }
}

impl TtsConfig {
    pub fn to_settings(&self) -> TtsSettings {
        TtsSettings {
            output_format: self.output_format.clone(),
            fallback_locale: self.fallback_locale.clone(),
            include_raw_audio: self.include_raw_audio,
            platform: self.platform.clone(),
        }
    }
}

/// 合成后端类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SynthesisBackend {
    #[default]
    Http,
    Fake,
}

/// 合成后端配置
#[derive(Debug, Clone, Deserialize)]
pub struct SynthesisConfig {
    #[serde(default)]
    pub backend: SynthesisBackend,

    /// TTS 服务基础 URL
    #[serde(default = "default_synthesis_url")]
    pub url: String,

    #[serde(default)]
    pub api_key: Option<String>,

    /// 请求超时时间（秒）
    #[serde(default = "default_synthesis_timeout")]
    pub timeout_secs: u64,

    #[serde(default = "default_voice_id")]
    pub voice_id: String,

    #[serde(default = "default_engine")]
    pub engine: String,

    #[serde(default = "default_sample_rate")]
    pub sample_rate: String,

    #[serde(default)]
    pub language_code: Option<String>,

    #[serde(default)]
    pub lexicon_names: Vec<String>,

    #[serde(default)]
    pub speech_mark_types: Vec<String>,

    /// fake 后端固定返回的音频文件
    #[serde(default)]
    pub fake_audio_path: Option<PathBuf>,

    #[serde(default = "default_fake_content_type")]
    pub fake_content_type: String,
}

fn default_synthesis_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_synthesis_timeout() -> u64 {
    30
}

fn default_voice_id() -> String {
    "Matthew".to_string()
}

fn default_engine() -> String {
    "standard".to_string()
}

fn default_sample_rate() -> String {
    "16000".to_string()
}

fn default_fake_content_type() -> String {
    "audio/mpeg".to_string()
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            backend: SynthesisBackend::default(),
            url: default_synthesis_url(),
            api_key: None,
            timeout_secs: default_synthesis_timeout(),
            voice_id: default_voice_id(),
            engine: default_engine(),
            sample_rate: default_sample_rate(),
            language_code: None,
            lexicon_names: Vec::new(),
            speech_mark_types: Vec::new(),
            fake_audio_path: None,
            fake_content_type: default_fake_content_type(),
        }
    }
}

/// 缓存后端类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    None,
    #[default]
    File,
    Sled,
    Memory,
}

/// 缓存配置
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    #[serde(default)]
    pub backend: CacheBackend,

    /// get 时是否读取音频本体（否则只做存在性检查）
    #[serde(default)]
    pub return_raw_audio: bool,

    /// 条目路径前缀
    #[serde(default = "default_cache_path")]
    pub path: String,

    /// 条目公开 Base URL，未设置时使用本服务的静态挂载点
    #[serde(default)]
    pub base_url: Option<String>,

    /// 文件缓存根目录（相当于 bucket）
    #[serde(default = "default_cache_root_dir")]
    pub root_dir: PathBuf,

    /// 文件缓存的静态文件挂载路径
    #[serde(default = "default_static_mount")]
    pub static_mount: String,

    /// Sled 数据库路径
    #[serde(default = "default_sled_path")]
    pub sled_path: String,

    /// Sled 最大缓存大小（字节）
    #[serde(default = "default_max_size_bytes")]
    pub max_size_bytes: u64,
}

fn default_cache_path() -> String {
    "polly-tts/audio".to_string()
}

fn default_cache_root_dir() -> PathBuf {
    PathBuf::from("data/tts")
}

fn default_static_mount() -> String {
    "/audio".to_string()
}

fn default_sled_path() -> String {
    "data/tts-cache.sled".to_string()
}

fn default_max_size_bytes() -> u64 {
    1024 * 1024 * 1024 // 1 GB
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: CacheBackend::default(),
            return_raw_audio: false,
            path: default_cache_path(),
            base_url: None,
            root_dir: default_cache_root_dir(),
            static_mount: default_static_mount(),
            sled_path: default_sled_path(),
            max_size_bytes: default_max_size_bytes(),
        }
    }
}

/// 日志配置
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub level: String,

    /// 是否启用 JSON 格式
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}
