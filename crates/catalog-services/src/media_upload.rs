//! Upload of video media files with compensating deletes
//!
//! Uploads happen outside the database transaction. Every successful upload of
//! an operation is recorded in an [`UploadLedger`]; if a later step fails (or
//! the request is cancelled) the caller hands the ledger to
//! [`MediaUploadOrchestrator::compensate`], which deletes exactly those files.
//!
//! A crash between a successful upload and its compensating delete leaves an
//! orphaned object in storage. Nothing here reconciles such objects.

use catalog_core::models::Video;
use catalog_core::AppError;
use catalog_storage::{storage_key, FileStream, Storage};
use std::fmt;
use std::io;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::task::{ready, Context, Poll};
use tokio::io::{AsyncRead, ReadBuf};
use tokio_util::sync::CancellationToken;

/// Named media slot of a video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaSlot {
    Thumb,
    ThumbHalf,
    Banner,
    Trailer,
    Media,
}

impl MediaSlot {
    /// Slot name used in storage keys.
    pub fn name(&self) -> &'static str {
        match self {
            MediaSlot::Thumb => "thumb",
            MediaSlot::ThumbHalf => "thumbhalf",
            MediaSlot::Banner => "banner",
            MediaSlot::Trailer => "trailer",
            MediaSlot::Media => "media",
        }
    }

    fn apply(&self, video: &mut Video, path: String) {
        match self {
            MediaSlot::Thumb => video.update_thumb(path),
            MediaSlot::ThumbHalf => video.update_thumb_half(path),
            MediaSlot::Banner => video.update_banner(path),
            MediaSlot::Trailer => video.update_trailer(path),
            MediaSlot::Media => video.update_media(path),
        }
    }
}

impl fmt::Display for MediaSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A file to store in one slot.
pub struct FileInput {
    pub extension: String,
    pub content_type: String,
    pub stream: FileStream,
}

impl FileInput {
    pub fn new(extension: impl Into<String>, content_type: impl Into<String>, stream: FileStream) -> Self {
        Self {
            extension: extension.into(),
            content_type: content_type.into(),
            stream,
        }
    }
}

impl fmt::Debug for FileInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileInput")
            .field("extension", &self.extension)
            .field("content_type", &self.content_type)
            .finish_non_exhaustive()
    }
}

/// Files requested for an operation; slots left `None` are not touched.
#[derive(Debug, Default)]
pub struct MediaFiles {
    pub thumb: Option<FileInput>,
    pub thumb_half: Option<FileInput>,
    pub banner: Option<FileInput>,
    pub trailer: Option<FileInput>,
    pub media: Option<FileInput>,
}

impl MediaFiles {
    pub fn is_empty(&self) -> bool {
        self.thumb.is_none()
            && self.thumb_half.is_none()
            && self.banner.is_none()
            && self.trailer.is_none()
            && self.media.is_none()
    }

    fn into_slots(self) -> Vec<(MediaSlot, FileInput)> {
        [
            (MediaSlot::Thumb, self.thumb),
            (MediaSlot::ThumbHalf, self.thumb_half),
            (MediaSlot::Banner, self.banner),
            (MediaSlot::Trailer, self.trailer),
            (MediaSlot::Media, self.media),
        ]
        .into_iter()
        .filter_map(|(slot, file)| file.map(|file| (slot, file)))
        .collect()
    }
}

/// Files stored by the current operation, in upload order.
#[derive(Debug, Default)]
pub struct UploadLedger {
    uploaded: Vec<(MediaSlot, String)>,
}

impl UploadLedger {
    pub fn record(&mut self, slot: MediaSlot, path: String) {
        self.uploaded.push((slot, path));
    }

    pub fn entries(&self) -> &[(MediaSlot, String)] {
        &self.uploaded
    }

    pub fn len(&self) -> usize {
        self.uploaded.len()
    }

    pub fn is_empty(&self) -> bool {
        self.uploaded.is_empty()
    }
}

/// Stream that fails once more than `remaining` bytes have been read.
struct SizeLimitedStream {
    inner: FileStream,
    remaining: u64,
    exceeded: Arc<AtomicBool>,
}

impl AsyncRead for SizeLimitedStream {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let before = buf.filled().len();
        ready!(self.inner.as_mut().poll_read(cx, buf))?;
        let read = (buf.filled().len() - before) as u64;

        if read > self.remaining {
            self.exceeded.store(true, Ordering::SeqCst);
            return Poll::Ready(Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "file exceeds maximum upload size",
            )));
        }
        self.remaining -= read;
        Poll::Ready(Ok(()))
    }
}

#[derive(Clone)]
pub struct MediaUploadOrchestrator {
    storage: Arc<dyn Storage>,
    max_upload_size: Option<u64>,
}

impl MediaUploadOrchestrator {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self {
            storage,
            max_upload_size: None,
        }
    }

    /// Reject any single file larger than `bytes`.
    pub fn with_max_upload_size(mut self, bytes: u64) -> Self {
        self.max_upload_size = Some(bytes);
        self
    }

    fn limit(&self, stream: FileStream) -> (FileStream, Arc<AtomicBool>) {
        let exceeded = Arc::new(AtomicBool::new(false));
        let Some(limit) = self.max_upload_size else {
            return (stream, exceeded);
        };

        let limited: FileStream = Box::pin(SizeLimitedStream {
            inner: stream,
            remaining: limit,
            exceeded: exceeded.clone(),
        });
        (limited, exceeded)
    }

    /// Upload every requested slot and point the video at the stored paths.
    ///
    /// Slots are uploaded one after another; each success is recorded in
    /// `ledger` before the next starts, so on error the ledger holds exactly
    /// the files this call stored. A file over the configured size limit
    /// fails with `InvalidInput`.
    pub async fn upload_all(
        &self,
        video: &mut Video,
        files: MediaFiles,
        ledger: &mut UploadLedger,
        cancel: &CancellationToken,
    ) -> Result<(), AppError> {
        for (slot, file) in files.into_slots() {
            let key = storage_key(video.id, slot.name(), &file.extension);
            let (stream, exceeded) = self.limit(file.stream);
            let path = self
                .storage
                .upload(&key, &file.content_type, stream, cancel)
                .await
                .map_err(|e| {
                    tracing::warn!(
                        error = %e,
                        video_id = %video.id,
                        slot = %slot,
                        key = %key,
                        "Media upload failed"
                    );
                    match self.max_upload_size {
                        Some(limit) if exceeded.load(Ordering::SeqCst) => AppError::InvalidInput(
                            format!("{} file exceeds maximum allowed size of {} bytes", slot, limit),
                        ),
                        _ => AppError::from(e),
                    }
                })?;

            tracing::debug!(video_id = %video.id, slot = %slot, path = %path, "Media uploaded");
            ledger.record(slot, path.clone());
            slot.apply(video, path);
        }
        Ok(())
    }

    /// Delete every file in `ledger`, once each.
    ///
    /// Runs with its own token so a cancelled request still cleans up.
    /// Delete failures are logged and otherwise ignored; the caller returns
    /// its original error regardless.
    pub async fn compensate(&self, ledger: &UploadLedger) {
        if ledger.is_empty() {
            return;
        }

        let cancel = CancellationToken::new();
        for (slot, path) in ledger.entries() {
            match self.storage.delete(path, &cancel).await {
                Ok(()) => {
                    tracing::info!(slot = %slot, path = %path, "Compensating delete of uploaded media");
                }
                Err(e) => {
                    tracing::error!(
                        error = %e,
                        slot = %slot,
                        path = %path,
                        "Failed to delete uploaded media during compensation"
                    );
                }
            }
        }
    }

    /// Best-effort removal of stored files that are no longer referenced.
    pub async fn remove_stored(&self, paths: Vec<String>) {
        let cancel = CancellationToken::new();
        for path in paths {
            if let Err(e) = self.storage.delete(&path, &cancel).await {
                tracing::warn!(error = %e, path = %path, "Failed to remove stored media");
            }
        }
    }
}
