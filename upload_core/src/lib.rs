//! Core library for the file intake service: upload validation and storage,
//! listing, deletion and the HTTP surface around them.

pub mod config;
pub mod error;
pub mod files;
pub mod handlers;
pub mod middleware;
pub mod telemetry;

pub use config::{AppConfig, RunMode};
pub use error::{AppError, Result};
pub use files::{format_file_size, sanitize_filename, FileManager, FileManagerConfig, StoredFile};
pub use handlers::routes::create_routes;
pub use telemetry::RotatingFileWriter;

use axum::Router;
use std::{net::SocketAddr, sync::Arc};
use tokio::signal;
use tracing::info;

#[derive(Clone)]
pub struct AppState {
    pub app_name: String,
    pub version: String,
    pub config: Arc<AppConfig>,
    pub file_manager: FileManager,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        let file_manager = FileManager::new(FileManagerConfig::from(&config.files));

        Self {
            app_name: config.service_name.clone(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            config: Arc::new(config),
            file_manager,
        }
    }

    /// Creates the storage root and its staging directory.
    pub async fn initialize(&self) -> Result<()> {
        self.file_manager.initialize().await
    }
}

pub fn create_app(state: AppState) -> Router {
    let router = create_routes(&state)
        .layer(middleware::logging::logging_layer(&state.app_name));

    router.with_state(state)
}

pub async fn run_server(app: Router, addr: SocketAddr) -> Result<()> {
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        },
        _ = terminate => {
            info!("Received SIGTERM, starting graceful shutdown");
        },
    }
}
