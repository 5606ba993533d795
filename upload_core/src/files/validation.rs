use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashSet;
use thiserror::Error;

use crate::config::FileConfig;

lazy_static! {
    static ref UNSAFE_FILENAME_CHARS: Regex = Regex::new(r"[^A-Za-z0-9_.-]").unwrap();
}

const RESERVED_NAMES: [&str; 22] = [
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
    "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    #[error("No file part")]
    NoFilePart,

    #[error("No file selected")]
    NoFileSelected,

    #[error("File type not allowed")]
    FileTypeNotAllowed,

    #[error("Invalid filename")]
    InvalidFilename,

    #[error("Filename too long")]
    FilenameTooLong { length: usize, max_length: usize },
}

#[derive(Debug, Clone)]
pub struct FileValidationConfig {
    pub allowed_extensions: HashSet<String>,
    pub max_filename_length: usize,
}

impl Default for FileValidationConfig {
    fn default() -> Self {
        Self::from(&FileConfig::default())
    }
}

impl From<&FileConfig> for FileValidationConfig {
    fn from(config: &FileConfig) -> Self {
        Self {
            allowed_extensions: config
                .allowed_extensions
                .iter()
                .map(|ext| ext.to_ascii_lowercase())
                .collect(),
            max_filename_length: 255,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FileValidator {
    config: FileValidationConfig,
}

impl FileValidator {
    pub fn new(config: FileValidationConfig) -> Self {
        Self { config }
    }

    pub fn with_default_config() -> Self {
        Self::new(FileValidationConfig::default())
    }

    /// Checks a client-supplied filename and returns the sanitized name the
    /// file is stored under.
    pub fn validate_filename(&self, filename: &str) -> Result<String, ValidationError> {
        if filename.is_empty() {
            return Err(ValidationError::NoFileSelected);
        }

        if !self.is_allowed(filename) {
            return Err(ValidationError::FileTypeNotAllowed);
        }

        let sanitized = sanitize_filename(filename);
        if sanitized.is_empty() {
            return Err(ValidationError::InvalidFilename);
        }

        if sanitized.len() > self.config.max_filename_length {
            return Err(ValidationError::FilenameTooLong {
                length: sanitized.len(),
                max_length: self.config.max_filename_length,
            });
        }

        Ok(sanitized)
    }

    pub fn is_allowed(&self, filename: &str) -> bool {
        match filename.rsplit_once('.') {
            Some((_, ext)) => self
                .config
                .allowed_extensions
                .contains(&ext.to_ascii_lowercase()),
            None => false,
        }
    }
}

/// Reduces a client-supplied name to a single safe path component.
///
/// Non-ASCII characters are dropped, path separators and whitespace runs
/// become `_`, anything outside `[A-Za-z0-9_.-]` is removed and leading or
/// trailing dots and underscores are trimmed. The result never contains a
/// separator and is never `.` or `..`, but it may be empty.
pub fn sanitize_filename(filename: &str) -> String {
    let ascii: String = filename
        .chars()
        .filter(char::is_ascii)
        .map(|c| if c == '/' || c == '\\' { ' ' } else { c })
        .collect();

    let joined = ascii.split_whitespace().collect::<Vec<_>>().join("_");
    let stripped = UNSAFE_FILENAME_CHARS.replace_all(&joined, "");
    let trimmed = stripped.trim_matches(|c| c == '.' || c == '_');

    let stem = trimmed.split('.').next().unwrap_or(trimmed).to_ascii_uppercase();
    if !trimmed.is_empty() && RESERVED_NAMES.contains(&stem.as_str()) {
        format!("_{}", trimmed)
    } else {
        trimmed.to_string()
    }
}
