use chrono::{DateTime, Utc};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs as async_fs;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use crate::config::FileConfig;
use crate::error::{AppError, Result};
use super::models::{FileUpload, StoredFile};
use super::validation::{sanitize_filename, FileValidationConfig, FileValidator};

/// Subdirectory of the storage root holding uploads that are still streaming.
pub const STAGING_DIR: &str = ".incoming";

#[derive(Debug, Clone)]
pub struct FileManagerConfig {
    pub storage_path: PathBuf,
    pub validation: FileValidationConfig,
    pub max_upload_bytes: u64,
}

impl Default for FileManagerConfig {
    fn default() -> Self {
        Self::from(&FileConfig::default())
    }
}

impl From<&FileConfig> for FileManagerConfig {
    fn from(config: &FileConfig) -> Self {
        Self {
            storage_path: config.upload_dir.clone(),
            validation: FileValidationConfig::from(config),
            max_upload_bytes: config.max_upload_bytes,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FileManager {
    config: FileManagerConfig,
    validator: FileValidator,
}

impl FileManager {
    pub fn new(config: FileManagerConfig) -> Self {
        let validator = FileValidator::new(config.validation.clone());

        Self { config, validator }
    }

    pub fn storage_path(&self) -> &Path {
        &self.config.storage_path
    }

    pub fn max_upload_bytes(&self) -> u64 {
        self.config.max_upload_bytes
    }

    fn staging_path(&self) -> PathBuf {
        self.config.storage_path.join(STAGING_DIR)
    }

    pub async fn initialize(&self) -> Result<()> {
        async_fs::create_dir_all(self.staging_path()).await?;
        Ok(())
    }

    /// Validates the upload and opens a staging file for its bytes. Nothing
    /// becomes visible in the storage root until [`PendingUpload::commit`].
    pub async fn begin_upload(&self, upload: FileUpload) -> Result<PendingUpload> {
        let filename = self.validator.validate_filename(&upload.original_filename)?;

        let staging = self.staging_path();
        async_fs::create_dir_all(&staging).await?;

        let temp_path = staging.join(format!("{}.part", Uuid::new_v4()));
        let file = async_fs::File::create(&temp_path).await?;

        Ok(PendingUpload {
            file: Some(file),
            final_path: self.config.storage_path.join(&filename),
            temp_path,
            filename,
            content_type: upload.content_type,
            written: 0,
            max_bytes: self.config.max_upload_bytes,
            finished: false,
        })
    }

    pub async fn store_file(&self, upload: FileUpload, data: &[u8]) -> Result<StoredFile> {
        let mut pending = self.begin_upload(upload).await?;
        pending.write_chunk(data).await?;
        pending.commit().await
    }

    pub async fn list_files(&self) -> Result<Vec<StoredFile>> {
        let mut entries = match async_fs::read_dir(&self.config.storage_path).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut files = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let metadata = match entry.metadata().await {
                Ok(metadata) => metadata,
                // deleted between enumeration and stat
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => return Err(e.into()),
            };

            if !metadata.is_file() {
                continue;
            }

            let filename = entry.file_name().to_string_lossy().into_owned();
            let content_type = mime_guess::from_path(&filename)
                .first_raw()
                .map(str::to_string);

            files.push(StoredFile::new(
                filename,
                metadata.len(),
                content_type,
                creation_time(&metadata),
            ));
        }

        Ok(files)
    }

    /// Removes the regular file stored under the sanitized form of
    /// `filename` and returns that sanitized name.
    pub async fn delete_file(&self, filename: &str) -> Result<String> {
        let sanitized = sanitize_filename(filename);
        if sanitized.is_empty() {
            return Err(AppError::NotFound("File not found".to_string()));
        }

        let path = self.config.storage_path.join(&sanitized);
        match async_fs::symlink_metadata(&path).await {
            Ok(metadata) if metadata.is_file() => {}
            Ok(_) => return Err(AppError::NotFound("File not found".to_string())),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(AppError::NotFound("File not found".to_string()))
            }
            Err(e) => return Err(e.into()),
        }

        match async_fs::remove_file(&path).await {
            Ok(()) => Ok(sanitized),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(AppError::NotFound("File not found".to_string()))
            }
            Err(e) => {
                tracing::error!("Failed to delete file {}: {}", path.display(), e);
                Err(e.into())
            }
        }
    }
}

/// An upload being streamed into the staging directory.
///
/// Dropping it without calling [`commit`](Self::commit) removes the staging
/// file, so a cancelled request leaves nothing behind.
#[derive(Debug)]
pub struct PendingUpload {
    file: Option<async_fs::File>,
    temp_path: PathBuf,
    final_path: PathBuf,
    filename: String,
    content_type: Option<String>,
    written: u64,
    max_bytes: u64,
    finished: bool,
}

impl PendingUpload {
    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn bytes_written(&self) -> u64 {
        self.written
    }

    pub async fn write_chunk(&mut self, chunk: &[u8]) -> Result<()> {
        let len = chunk.len() as u64;
        if self.written + len > self.max_bytes {
            return Err(AppError::PayloadTooLarge(self.max_bytes));
        }

        let file = self
            .file
            .as_mut()
            .ok_or_else(|| AppError::Other(anyhow::anyhow!("Upload already closed")))?;
        file.write_all(chunk).await?;
        self.written += len;

        Ok(())
    }

    /// Flushes the staged bytes and moves them onto the final name,
    /// replacing any file already stored there.
    pub async fn commit(mut self) -> Result<StoredFile> {
        let mut file = self
            .file
            .take()
            .ok_or_else(|| AppError::Other(anyhow::anyhow!("Upload already closed")))?;
        file.flush().await?;
        file.sync_all().await?;
        let metadata = file.metadata().await?;
        drop(file);

        // The final path belongs to whoever renames last; never stat it here.
        async_fs::rename(&self.temp_path, &self.final_path).await?;
        self.finished = true;

        Ok(StoredFile::new(
            self.filename.clone(),
            self.written,
            self.content_type.take(),
            creation_time(&metadata),
        ))
    }

    pub async fn abort(mut self) {
        self.file.take();
        if let Err(e) = async_fs::remove_file(&self.temp_path).await {
            if e.kind() != ErrorKind::NotFound {
                tracing::warn!(
                    "Failed to remove staged upload {}: {}",
                    self.temp_path.display(),
                    e
                );
            }
        }
        self.finished = true;
    }
}

impl Drop for PendingUpload {
    fn drop(&mut self) {
        if !self.finished {
            self.file.take();
            let _ = std::fs::remove_file(&self.temp_path);
        }
    }
}

fn creation_time(metadata: &std::fs::Metadata) -> DateTime<Utc> {
    metadata
        .created()
        .or_else(|_| metadata.modified())
        .map(DateTime::<Utc>::from)
        .unwrap_or_else(|_| Utc::now())
}
