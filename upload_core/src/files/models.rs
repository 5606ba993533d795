use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::format::format_file_size;

pub const UNKNOWN_CONTENT_TYPE: &str = "Unknown";

/// A regular file in the storage root, described from a live stat call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredFile {
    pub filename: String,
    pub size: u64,
    pub size_formatted: String,
    #[serde(rename = "type")]
    pub content_type: String,
    pub uploaded_at: DateTime<Utc>,
}

impl StoredFile {
    pub fn new(
        filename: String,
        size: u64,
        content_type: Option<String>,
        uploaded_at: DateTime<Utc>,
    ) -> Self {
        Self {
            filename,
            size,
            size_formatted: format_file_size(size),
            content_type: content_type
                .filter(|ct| !ct.trim().is_empty())
                .unwrap_or_else(|| UNKNOWN_CONTENT_TYPE.to_string()),
            uploaded_at,
        }
    }
}

/// The file part of an upload request, before any byte is read.
#[derive(Debug, Clone)]
pub struct FileUpload {
    pub original_filename: String,
    pub content_type: Option<String>,
}
