//! Catalog Core Library
//!
//! This crate provides the domain aggregates, error types, configuration and
//! relation synchronization logic shared by all catalog components.

pub mod cancellation;
pub mod config;
pub mod error;
pub mod events;
pub mod models;
pub mod relations;
pub mod storage_types;
pub mod validation;

// Re-export commonly used types
pub use cancellation::{cancellable, ensure_not_cancelled};
pub use config::CatalogConfig;
pub use error::{AppError, ErrorMetadata, LogLevel, MissingIds};
pub use events::{DomainEvent, DomainEventPublisher};
pub use relations::{JoinRowChange, JoinTable, RelationSynchronizer};
pub use storage_types::StorageBackend;
