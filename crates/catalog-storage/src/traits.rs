//! Storage abstraction trait
//!
//! This module defines the Storage trait that all storage backends must implement.

use crate::StorageBackend;
use async_trait::async_trait;
use std::pin::Pin;
use thiserror::Error;
use tokio::io::AsyncRead;
use tokio_util::sync::CancellationToken;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Storage operation cancelled")]
    Cancelled,
}

impl From<StorageError> for catalog_core::AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Cancelled => catalog_core::AppError::Cancelled,
            other => catalog_core::AppError::Storage(other.to_string()),
        }
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Readable file content handed to a backend.
pub type FileStream = Pin<Box<dyn AsyncRead + Send + Unpin>>;

/// Storage abstraction trait
///
/// All storage backends (S3, local filesystem) must implement this trait.
/// Use cases work against it without knowing where media assets end up.
///
/// **Key format:** `{aggregate_id}-{slot}.{extension}`; see the crate root documentation.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Upload the stream under `key` and return the stored path.
    ///
    /// An existing object under the same key is overwritten. If `cancel` fires
    /// before the write completes, nothing is left behind and
    /// `StorageError::Cancelled` is returned.
    async fn upload(
        &self,
        key: &str,
        content_type: &str,
        reader: FileStream,
        cancel: &CancellationToken,
    ) -> StorageResult<String>;

    /// Delete a stored file by the path returned from `upload`.
    ///
    /// Deleting a path that does not exist succeeds.
    async fn delete(&self, path: &str, cancel: &CancellationToken) -> StorageResult<()>;

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;
}
