//! Post-commit domain event dispatch
//!
//! The unit of work publishes events through [`EventDispatcher`], which fans
//! each event out to the handlers that accept it. The database write has
//! already committed at that point, so handler failures are logged and never
//! reach the caller.

use async_trait::async_trait;
use catalog_core::{AppError, DomainEvent, DomainEventPublisher};
use serde_json::json;
use std::sync::Arc;

#[async_trait]
pub trait DomainEventHandler: Send + Sync {
    fn name(&self) -> &'static str;

    fn handles(&self, event: &DomainEvent) -> bool;

    async fn handle(&self, event: &DomainEvent) -> Result<(), AppError>;
}

#[derive(Clone, Default)]
pub struct EventDispatcher {
    handlers: Vec<Arc<dyn DomainEventHandler>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_handler(mut self, handler: Arc<dyn DomainEventHandler>) -> Self {
        self.handlers.push(handler);
        self
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }
}

#[async_trait]
impl DomainEventPublisher for EventDispatcher {
    async fn publish(&self, event: &DomainEvent) -> Result<(), AppError> {
        for handler in self.handlers.iter().filter(|handler| handler.handles(event)) {
            if let Err(e) = handler.handle(event).await {
                tracing::error!(
                    error = %e,
                    event = event.name(),
                    handler = handler.name(),
                    "Domain event handler failed"
                );
            }
        }
        Ok(())
    }
}

/// Outbound message channel; broker mechanics live behind it.
#[async_trait]
pub trait MessageProducer: Send + Sync {
    async fn send(&self, topic: &str, payload: serde_json::Value) -> Result<(), AppError>;
}

/// Producer that only logs outgoing messages.
#[derive(Debug, Clone, Default)]
pub struct LoggingMessageProducer;

#[async_trait]
impl MessageProducer for LoggingMessageProducer {
    async fn send(&self, topic: &str, payload: serde_json::Value) -> Result<(), AppError> {
        tracing::info!(topic = %topic, payload = %payload, "Message produced");
        Ok(())
    }
}

pub const ENCODER_TOPIC: &str = "video.encode";

/// Asks the encoder to process a freshly uploaded main media file.
pub struct EncoderNotificationHandler {
    producer: Arc<dyn MessageProducer>,
    topic: String,
}

impl EncoderNotificationHandler {
    pub fn new(producer: Arc<dyn MessageProducer>) -> Self {
        Self {
            producer,
            topic: ENCODER_TOPIC.to_string(),
        }
    }

    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = topic.into();
        self
    }
}

#[async_trait]
impl DomainEventHandler for EncoderNotificationHandler {
    fn name(&self) -> &'static str {
        "encoder_notification"
    }

    fn handles(&self, event: &DomainEvent) -> bool {
        matches!(event, DomainEvent::VideoUploaded { .. })
    }

    async fn handle(&self, event: &DomainEvent) -> Result<(), AppError> {
        let DomainEvent::VideoUploaded {
            resource_id,
            file_path,
            ..
        } = event;

        let payload = json!({
            "resource_id": resource_id,
            "file_path": file_path,
        });
        self.producer.send(&self.topic, payload).await?;
        tracing::debug!(video_id = %resource_id, topic = %self.topic, "Encoder notified");
        Ok(())
    }
}
