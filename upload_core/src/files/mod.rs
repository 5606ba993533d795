//! File intake: validation, sanitization, staged storage and listing.

pub mod format;
pub mod manager;
pub mod models;
pub mod validation;

pub use format::format_file_size;
pub use manager::{FileManager, FileManagerConfig, PendingUpload, STAGING_DIR};
pub use models::{FileUpload, StoredFile, UNKNOWN_CONTENT_TYPE};
pub use validation::{sanitize_filename, FileValidationConfig, FileValidator, ValidationError};
