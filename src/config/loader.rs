//! Configuration Loader
//!
//! 实现多源配置加载与合并逻辑
//!
//! 优先级（从高到低）：
//! 1. 环境变量
//! 2. 配置文件（config.toml）
//! 3. 默认值

use config::{Config, ConfigError as ConfigCrateError, Environment, File};
use std::path::Path;
use thiserror::Error;

use super::types::{AppConfig, CacheBackend, SynthesisBackend};
use crate::domain::tts::is_valid_locale;

/// 配置加载错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<ConfigCrateError> for ConfigError {
    fn from(err: ConfigCrateError) -> Self {
        ConfigError::LoadError(err.to_string())
    }
}

/// 配置文件搜索路径
const CONFIG_FILE_NAMES: &[&str] = &["config", "config.local"];

/// 加载应用配置
///
/// 按优先级从高到低合并配置：
/// 1. 环境变量（前缀 `VOXCACHE_`，层级分隔符 `__`）
/// 2. 配置文件（config.toml 或 config.local.toml）
/// 3. 默认值
///
/// # 环境变量示例
/// - `VOXCACHE_SERVER__PORT=8080`
/// - `VOXCACHE_SYNTHESIS__URL=http://tts-gateway:8000`
/// - `VOXCACHE_SYNTHESIS__VOICE_ID=Joanna`
/// - `VOXCACHE_CACHE__BACKEND=sled`
/// - `VOXCACHE_SYNTHESIS__LEXICON_NAMES=brands,names`
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from_path(None)
}

/// 从指定路径加载配置
///
/// # 参数
/// - `config_path` - 可选的配置文件路径，如果为 None 则使用默认搜索路径
pub fn load_config_from_path(config_path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder();

    // 1. 首先设置默认值（最低优先级）
    builder = builder
        .set_default("server.host", "0.0.0.0")?
        .set_default("server.port", 5060)?
        .set_default("tts.output_format", "mp3")?
        .set_default("tts.fallback_locale", "en-US")?
        .set_default("tts.include_raw_audio", false)?
        .set_default("tts.platform", "web")?
        .set_default("synthesis.backend", "http")?
        .set_default("synthesis.url", "http://localhost:8000")?
        .set_default("synthesis.timeout_secs", 30)?
        .set_default("synthesis.voice_id", "Matthew")?
        .set_default("synthesis.engine", "standard")?
        .set_default("synthesis.sample_rate", "16000")?
        .set_default("cache.backend", "file")?
        .set_default("cache.return_raw_audio", false)?
        .set_default("cache.path", "polly-tts/audio")?
        .set_default("cache.root_dir", "data/tts")?
        .set_default("cache.static_mount", "/audio")?
        .set_default("cache.sled_path", "data/tts-cache.sled")?
        .set_default("cache.max_size_bytes", 1024_u64 * 1024 * 1024)?
        .set_default("log.level", "info")?
        .set_default("log.json", false)?;

    // 2. 添加配置文件（如果存在）
    if let Some(path) = config_path {
        builder = builder.add_source(File::from(path).required(true));
    } else {
        // 搜索默认配置文件
        for name in CONFIG_FILE_NAMES {
            builder = builder.add_source(File::with_name(name).required(false));
        }
    }

    // 3. 添加环境变量（最高优先级）
    // 列表值用逗号分隔
    builder = builder.add_source(
        Environment::with_prefix("VOXCACHE")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true)
            .list_separator(",")
            .with_list_parse_key("synthesis.lexicon_names")
            .with_list_parse_key("synthesis.speech_mark_types"),
    );

    // 4. 构建配置
    let config = builder.build()?;

    // 5. 反序列化为 AppConfig
    let app_config: AppConfig = config.try_deserialize().map_err(|e| {
        ConfigError::ParseError(format!("Failed to deserialize config: {}", e))
    })?;

    // 6. 验证配置
    validate_config(&app_config)?;

    Ok(app_config)
}

/// 验证配置有效性
fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    // 验证端口范围
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "Server port cannot be 0".to_string(),
        ));
    }

    if config.tts.output_format.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "TTS output_format cannot be empty".to_string(),
        ));
    }

    if config.tts.fallback_locale.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "TTS fallback_locale cannot be empty".to_string(),
        ));
    }
    if !is_valid_locale(&config.tts.fallback_locale) {
        return Err(ConfigError::ValidationError(format!(
            "TTS fallback_locale is not a valid locale: {}",
            config.tts.fallback_locale
        )));
    }

    if config.tts.platform.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "TTS platform cannot be empty".to_string(),
        ));
    }

    if config.synthesis.backend == SynthesisBackend::Http {
        if config.synthesis.url.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "Synthesis URL cannot be empty".to_string(),
            ));
        }
        if config.synthesis.voice_id.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "Synthesis voice_id cannot be empty".to_string(),
            ));
        }
    }

    match config.cache.backend {
        CacheBackend::File if !config.cache.static_mount.starts_with('/') => {
            return Err(ConfigError::ValidationError(
                "Cache static_mount must start with '/'".to_string(),
            ));
        }
        CacheBackend::Sled if config.cache.max_size_bytes == 0 => {
            return Err(ConfigError::ValidationError(
                "Cache max_size_bytes cannot be 0".to_string(),
            ));
        }
        _ => {}
    }

    // sled / memory 没有公开地址时，只能靠内联音频播放
    let needs_inline_audio = matches!(config.cache.backend, CacheBackend::Sled | CacheBackend::Memory)
        && config.cache.base_url.is_none();
    if needs_inline_audio && !(config.cache.return_raw_audio && config.tts.include_raw_audio) {
        return Err(ConfigError::ValidationError(format!(
            "Cache backend {:?} without base_url requires cache.return_raw_audio and tts.include_raw_audio",
            config.cache.backend
        )));
    }

    Ok(())
}

/// 打印配置信息（用于启动时日志）
pub fn print_config(config: &AppConfig) {
    tracing::info!("=== Application Configuration ===");
    tracing::info!("Server: {}:{}", config.server.host, config.server.port);
    tracing::info!("Public Base URL: {}", config.server.public_base_url());
    tracing::info!("Output Format: {}", config.tts.output_format);
    tracing::info!("Fallback Locale: {}", config.tts.fallback_locale);
    tracing::info!("Include Raw Audio: {}", config.tts.include_raw_audio);
    tracing::info!("Synthesis Backend: {:?}", config.synthesis.backend);
    if config.synthesis.backend == SynthesisBackend::Http {
        tracing::info!("Synthesis URL: {}", config.synthesis.url);
        tracing::info!(
            "Synthesis API Key: {}",
            if config.synthesis.api_key.is_some() { "***" } else { "<none>" }
        );
    }
    tracing::info!(
        "Voice: {} ({}, {} Hz)",
        config.synthesis.voice_id,
        config.synthesis.engine,
        config.synthesis.sample_rate
    );
    tracing::info!("Cache Backend: {:?}", config.cache.backend);
    match config.cache.backend {
        CacheBackend::File => {
            tracing::info!("Cache Root: {:?}", config.cache.root_dir);
            tracing::info!("Cache Base URL: {}", config.cache_base_url());
        }
        CacheBackend::Sled => {
            tracing::info!("Cache Database: {}", config.cache.sled_path);
            tracing::info!("Cache Max Size: {} bytes", config.cache.max_size_bytes);
        }
        CacheBackend::Memory | CacheBackend::None => {}
    }
    tracing::info!("Log Level: {}", config.log.level);
    tracing::info!("=================================");
}
