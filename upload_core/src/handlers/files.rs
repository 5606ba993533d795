use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        rejection::PathRejection,
        Multipart, Path, State,
    },
    http::{header, HeaderMap, StatusCode},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::{
    error::{AppError, Result},
    files::{FileUpload, StoredFile, ValidationError},
    AppState,
};

/// Multipart field carrying the uploaded file.
pub const FILE_FIELD: &str = "file";

#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    pub message: String,
    #[serde(flatten)]
    pub file: StoredFile,
}

impl From<StoredFile> for UploadResponse {
    fn from(file: StoredFile) -> Self {
        Self {
            message: "File uploaded successfully".to_string(),
            file,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FileListResponse {
    pub files: Vec<StoredFile>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

pub async fn upload_file(
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>> {
    let file_manager = &state.file_manager;
    let max_bytes = file_manager.max_upload_bytes();

    if let Some(length) = declared_content_length(&headers) {
        if length > max_bytes {
            warn!("Rejected upload of {} bytes (limit {})", length, max_bytes);
            return Err(AppError::PayloadTooLarge(max_bytes));
        }
    }

    let mut multipart = multipart.map_err(|e| {
        debug!("Request is not a usable multipart body: {}", e);
        AppError::from(ValidationError::NoFilePart)
    })?;

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, max_bytes))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let upload = FileUpload {
            original_filename: field.file_name().unwrap_or_default().to_string(),
            content_type: field.content_type().map(str::to_string),
        };

        let mut pending = file_manager.begin_upload(upload).await?;
        debug!("Receiving upload {}", pending.filename());

        loop {
            match field.chunk().await {
                Ok(Some(chunk)) => {
                    if let Err(e) = pending.write_chunk(&chunk).await {
                        pending.abort().await;
                        return Err(e);
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    pending.abort().await;
                    return Err(multipart_error(e, max_bytes));
                }
            }
        }

        let stored = pending.commit().await?;

        info!(
            "File uploaded: {}, size: {}, type: {}",
            stored.filename, stored.size, stored.content_type
        );

        return Ok(Json(stored.into()));
    }

    Err(ValidationError::NoFilePart.into())
}

pub async fn list_files(State(state): State<AppState>) -> Result<Json<FileListResponse>> {
    let files = state.file_manager.list_files().await?;
    debug!("Listed {} stored files", files.len());

    Ok(Json(FileListResponse { files }))
}

pub async fn delete_file(
    State(state): State<AppState>,
    filename: std::result::Result<Path<String>, PathRejection>,
) -> Result<Json<MessageResponse>> {
    let Path(filename) = filename.map_err(|e| {
        debug!("Undecodable filename in delete request: {}", e);
        AppError::NotFound("File not found".to_string())
    })?;

    let deleted = state.file_manager.delete_file(&filename).await?;
    info!("File deleted: {}", deleted);

    Ok(Json(MessageResponse {
        message: format!("File {} deleted successfully", deleted),
    }))
}

fn declared_content_length(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(header::CONTENT_LENGTH)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
}

fn multipart_error(err: MultipartError, max_bytes: u64) -> AppError {
    let status = err.status();
    if status == StatusCode::PAYLOAD_TOO_LARGE {
        warn!("Upload exceeded the {} byte limit while streaming", max_bytes);
        AppError::PayloadTooLarge(max_bytes)
    } else if status.is_server_error() {
        AppError::Other(anyhow::anyhow!("Failed to read upload: {}", err.body_text()))
    } else {
        AppError::BadRequest(format!("Failed to read multipart data: {}", err.body_text()))
    }
}
