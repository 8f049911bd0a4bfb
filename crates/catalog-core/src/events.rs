//! Domain events raised by aggregates and published after a successful commit.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DomainEvent {
    /// A main media file was stored for a video and awaits encoding.
    VideoUploaded {
        resource_id: Uuid,
        file_path: String,
        occurred_at: DateTime<Utc>,
    },
}

impl DomainEvent {
    pub fn video_uploaded(resource_id: Uuid, file_path: impl Into<String>) -> Self {
        DomainEvent::VideoUploaded {
            resource_id,
            file_path: file_path.into(),
            occurred_at: Utc::now(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            DomainEvent::VideoUploaded { .. } => "video_uploaded",
        }
    }
}

/// Dispatches events raised on aggregates once their changes are durable.
#[async_trait]
pub trait DomainEventPublisher: Send + Sync {
    async fn publish(&self, event: &DomainEvent) -> Result<(), AppError>;
}
