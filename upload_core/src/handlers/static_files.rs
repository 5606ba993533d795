//! Main page and static asset serving

use axum::{
    extract::State,
    http::{header, HeaderValue, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
};
use std::path::{Component, Path, PathBuf};
use tokio::fs as async_fs;
use tracing::{debug, warn};

use crate::{
    error::{AppError, Result},
    AppState,
};

pub async fn handle_index(State(state): State<AppState>) -> Result<Response> {
    let index = state.config.static_files.index.clone();
    serve_static_path(&state.config.static_files.root, &index).await
}

/// Fallback for every unrouted request: GET and HEAD look under the static
/// root, anything else is a 404.
pub async fn handle_static(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
) -> Result<Response> {
    if method != Method::GET && method != Method::HEAD {
        return Err(AppError::NotFound("Resource not found".to_string()));
    }

    serve_static_path(&state.config.static_files.root, uri.path()).await
}

async fn serve_static_path(root: &Path, requested: &str) -> Result<Response> {
    let file_path = resolve_static_path(root, requested).await.ok_or_else(|| {
        debug!("Static file not found: {}", requested);
        AppError::NotFound("Resource not found".to_string())
    })?;

    let data = async_fs::read(&file_path).await?;
    let content_type = mime_guess::from_path(&file_path).first_or(mime::APPLICATION_OCTET_STREAM);

    let mut response = (StatusCode::OK, data).into_response();
    if let Ok(value) = HeaderValue::from_str(content_type.as_ref()) {
        response.headers_mut().insert(header::CONTENT_TYPE, value);
    }

    Ok(response)
}

/// Maps a request path onto a regular file under `root`, refusing anything
/// that would leave it.
async fn resolve_static_path(root: &Path, requested: &str) -> Option<PathBuf> {
    let relative = Path::new(requested.trim_start_matches('/'));
    if relative
        .components()
        .any(|component| !matches!(component, Component::Normal(_)))
    {
        warn!("Path traversal attempt blocked: {}", requested);
        return None;
    }

    let root_canonical = async_fs::canonicalize(root).await.ok()?;
    let file_canonical = async_fs::canonicalize(root.join(relative)).await.ok()?;
    if !file_canonical.starts_with(&root_canonical) {
        warn!(
            "Path traversal attempt blocked: {} -> {}",
            requested,
            file_canonical.display()
        );
        return None;
    }

    let metadata = async_fs::metadata(&file_canonical).await.ok()?;
    metadata.is_file().then_some(file_canonical)
}
