//! Test helpers for use-case unit tests
//!
//! In-memory repositories, a recording storage and a recording event
//! publisher, so use cases can be exercised without a database or object store.

pub mod in_memory;
pub mod mock_storage;

pub use in_memory::{InMemoryCatalog, RecordingPublisher};
pub use mock_storage::{file, file_of_size, MockStorage};
