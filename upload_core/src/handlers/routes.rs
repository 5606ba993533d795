//! Route table for the upload service

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
    Router,
};

use super::{files, health, static_files};
use crate::{error::AppError, AppState};

pub fn create_routes(state: &AppState) -> Router<AppState> {
    let body_limit = usize::try_from(state.file_manager.max_upload_bytes()).unwrap_or(usize::MAX);

    let mut router = Router::new()
        .route(
            "/",
            get(static_files::handle_index).fallback(method_not_allowed),
        )
        .route(
            "/upload",
            post(files::upload_file)
                .fallback(method_not_allowed)
                .layer(DefaultBodyLimit::max(body_limit)),
        )
        .route("/files", get(files::list_files).fallback(method_not_allowed))
        .route(
            "/files/:filename",
            delete(files::delete_file).fallback(method_not_allowed),
        );

    if state.config.is_production() {
        router = router.route(
            "/health",
            get(health::handle_health).fallback(method_not_allowed),
        );
    }

    router.fallback(static_files::handle_static)
}

/// Answers a known path requested with the wrong method.
async fn method_not_allowed() -> AppError {
    AppError::MethodNotAllowed
}
