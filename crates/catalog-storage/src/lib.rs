//! Catalog Storage Library
//!
//! This crate provides the object storage abstraction used for video media
//! assets, with S3 and local filesystem implementations.
//!
//! # Storage key format
//!
//! Keys are derived deterministically from the owning aggregate, the media slot
//! and the file extension: `{aggregate_id}-{slot}.{extension}`. Uploading the
//! same slot twice for the same aggregate targets the same key, and overwrite
//! semantics are left to the backend.
//!
//! Keys must not contain `..` or a leading `/`. Key generation is centralized in
//! the `keys` module so all callers stay consistent.

pub mod factory;
pub mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

// Re-export commonly used types
pub use catalog_core::StorageBackend;
pub use factory::create_storage;
pub use keys::storage_key;
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use traits::{FileStream, Storage, StorageError, StorageResult};
