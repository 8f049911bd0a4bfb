//! Mock Storage implementation for testing

use async_trait::async_trait;
use catalog_storage::{FileStream, Storage, StorageBackend, StorageError, StorageResult};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use tokio::io::AsyncReadExt;
use tokio_util::sync::CancellationToken;

use crate::media_upload::FileInput;

/// In-memory storage that records every call, with per-key failure injection
#[derive(Default)]
pub struct MockStorage {
    files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    uploads: Mutex<Vec<String>>,
    delete_attempts: Mutex<Vec<String>>,
    deleted: Mutex<Vec<String>>,
    failing_uploads: Mutex<HashSet<String>>,
    failing_deletes: Mutex<HashSet<String>>,
    cancel_after_upload: Mutex<Option<CancellationToken>>,
}

impl MockStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make uploads to `key` fail.
    pub fn fail_upload(&self, key: &str) {
        self.failing_uploads.lock().unwrap().insert(key.to_string());
    }

    /// Make deletes of `path` fail.
    pub fn fail_delete(&self, path: &str) {
        self.failing_deletes.lock().unwrap().insert(path.to_string());
    }

    /// Fire `token` right after the next successful upload.
    pub fn cancel_after_upload(&self, token: CancellationToken) {
        *self.cancel_after_upload.lock().unwrap() = Some(token);
    }

    /// Keys of successful uploads, in order.
    pub fn uploaded_keys(&self) -> Vec<String> {
        self.uploads.lock().unwrap().clone()
    }

    /// Every delete call, successful or not.
    pub fn delete_attempts(&self) -> Vec<String> {
        self.delete_attempts.lock().unwrap().clone()
    }

    /// Paths of successful deletes, in order.
    pub fn deleted_paths(&self) -> Vec<String> {
        self.deleted.lock().unwrap().clone()
    }

    pub fn has_file(&self, key: &str) -> bool {
        self.files.lock().unwrap().contains_key(key)
    }

    pub fn get_file(&self, key: &str) -> Option<Vec<u8>> {
        self.files.lock().unwrap().get(key).cloned()
    }
}

#[async_trait]
impl Storage for MockStorage {
    async fn upload(
        &self,
        key: &str,
        _content_type: &str,
        mut reader: FileStream,
        cancel: &CancellationToken,
    ) -> StorageResult<String> {
        if cancel.is_cancelled() {
            return Err(StorageError::Cancelled);
        }
        if self.failing_uploads.lock().unwrap().contains(key) {
            return Err(StorageError::UploadFailed(format!("injected failure for {}", key)));
        }

        let mut data = Vec::new();
        reader.read_to_end(&mut data).await?;
        self.files.lock().unwrap().insert(key.to_string(), data);
        self.uploads.lock().unwrap().push(key.to_string());

        if let Some(token) = self.cancel_after_upload.lock().unwrap().take() {
            token.cancel();
        }
        Ok(key.to_string())
    }

    async fn delete(&self, path: &str, cancel: &CancellationToken) -> StorageResult<()> {
        self.delete_attempts.lock().unwrap().push(path.to_string());
        if cancel.is_cancelled() {
            return Err(StorageError::Cancelled);
        }
        if self.failing_deletes.lock().unwrap().contains(path) {
            return Err(StorageError::DeleteFailed(format!("injected failure for {}", path)));
        }
        self.files.lock().unwrap().remove(path);
        self.deleted.lock().unwrap().push(path.to_string());
        Ok(())
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}

/// Small in-memory file with the given extension.
pub fn file(extension: &str) -> FileInput {
    FileInput::new(
        extension,
        "application/octet-stream",
        Box::pin(std::io::Cursor::new(b"file bytes".to_vec())),
    )
}

/// In-memory file of `size` zero bytes.
pub fn file_of_size(extension: &str, size: usize) -> FileInput {
    FileInput::new(
        extension,
        "application/octet-stream",
        Box::pin(std::io::Cursor::new(vec![0u8; size])),
    )
}
