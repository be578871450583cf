//! VoxCache - 响应语音合成服务
//!
//! 启动流程：加载配置 -> 初始化日志 -> 构造合成/缓存后端 -> 启动 HTTP 服务

use voxcache::application::TtsOrchestrator;
use voxcache::config::{load_config, print_config, AppConfig, CacheBackend};
use voxcache::infrastructure::http::{AppState, HttpServer, ServerConfig, StaticMount};
use voxcache::infrastructure::{build_cache, build_synthesizer};

fn init_tracing(config: &AppConfig) {
    let log_filter = format!(
        "{},voxcache={},tower_http=debug",
        config.log.level, config.log.level
    );
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_filter));

    if config.log.json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for ctrl-c");
        return;
    }
    tracing::info!("Received shutdown signal");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 加载配置（优先级：环境变量 > 配置文件 > 默认值）
    let config = load_config().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

    init_tracing(&config);

    tracing::info!("VoxCache - 响应语音合成服务");
    print_config(&config);

    // 构造后端，配置缺失时直接退出
    let synthesizer = build_synthesizer(&config)?;
    let cache = build_cache(&config).await?;

    if !synthesizer.health_check().await {
        tracing::warn!(url = %config.synthesis.url, "TTS service is not reachable yet");
    }

    let orchestrator =
        TtsOrchestrator::new(config.tts.to_settings(), synthesizer.clone(), cache.clone());
    let state = AppState::new(orchestrator, synthesizer, cache);

    // 创建 HTTP 服务器
    let server_config = ServerConfig::new(&config.server.host, config.server.port);
    let mut server = HttpServer::new(server_config, state);

    // 文件缓存由本服务公开读取
    if config.cache.backend == CacheBackend::File {
        server = server.with_static_mount(StaticMount {
            mount: config.cache.static_mount.clone(),
            root_dir: config.cache.root_dir.clone(),
        });
    }

    tracing::info!("Starting HTTP server...");

    // 启动服务器（带优雅关闭）
    server.run_with_shutdown(shutdown_signal()).await?;

    tracing::info!("Server shutdown complete");

    Ok(())
}
