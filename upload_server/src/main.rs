//! Main entry point for the file intake server binary

use anyhow::Result;
use std::net::SocketAddr;
use tracing::info;
use tracing_subscriber::{filter::LevelFilter, fmt, prelude::*, EnvFilter};
use upload_core::{config::LogFormat, create_app, run_server, AppConfig, AppState, RotatingFileWriter};

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::load()
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;

    config.create_directories()
        .map_err(|e| anyhow::anyhow!("Failed to create directories: {}", e))?;

    init_tracing(&config)?;

    info!("{} startup", config.service_name);
    info!("Mode: {:?}", config.mode);
    info!("Upload folder: {}", config.files.upload_dir.display());

    let addr: SocketAddr = config.bind_address().parse()
        .map_err(|e| anyhow::anyhow!("Invalid bind address: {}", e))?;

    let production = config.is_production();
    let state = AppState::new(config);
    state.initialize().await
        .map_err(|e| anyhow::anyhow!("Failed to initialize storage: {}", e))?;

    info!("App: {} v{}", state.app_name, state.version);
    info!("Server will be available at: http://{}", addr);
    info!("API endpoints:");
    info!("  GET    /                  - Main page");
    info!("  POST   /upload            - Upload file");
    info!("  GET    /files             - List files");
    info!("  DELETE /files/<filename>  - Delete file");
    if production {
        info!("  GET    /health            - Health check");
    }

    let app = create_app(state);

    run_server(app, addr).await?;

    info!("Server shutdown complete");
    Ok(())
}

fn init_tracing(config: &AppConfig) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| {
            format!(
                "upload_core={level},upload_server={level},tower_http={level},axum=info",
                level = config.logging.level
            ).into()
        });

    let file_layer = if config.is_production() {
        let writer = RotatingFileWriter::new(
            config.log_file_path(),
            config.logging.max_bytes,
            config.logging.backups,
        )
        .map_err(|e| anyhow::anyhow!("Failed to open log file: {}", e))?;

        Some(
            fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(false)
                .with_file(true)
                .with_line_number(true)
                .with_filter(LevelFilter::INFO),
        )
    } else {
        None
    };

    let fmt_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true);

    let is_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(config.logging.format == LogFormat::Json);

    if is_json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(file_layer)
            .with(fmt_layer.json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(file_layer)
            .with(fmt_layer.pretty())
            .init();
    }

    Ok(())
}
