//! Repository and unit-of-work contracts
//!
//! Writes (`insert`, `update`, `delete`) are staged in the request's unit of
//! work and become durable only on `UnitOfWork::commit`. Reads observe
//! committed state.

use async_trait::async_trait;
use catalog_core::models::{CastMember, Category, Genre, SearchInput, SearchOutput, Video};
use catalog_core::AppError;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

#[async_trait]
pub trait CategoryRepository: Send + Sync {
    async fn insert(&self, category: &Category) -> Result<(), AppError>;
    async fn update(&self, category: &Category) -> Result<(), AppError>;
    async fn delete(&self, category: &Category) -> Result<(), AppError>;
    /// Fails with `AppError::NotFound` when no row exists.
    async fn get(&self, id: Uuid) -> Result<Category, AppError>;
    async fn search(&self, input: &SearchInput) -> Result<SearchOutput<Category>, AppError>;
    /// Subset of `ids` that exist.
    async fn get_ids_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Uuid>, AppError>;
}

#[async_trait]
pub trait CastMemberRepository: Send + Sync {
    async fn insert(&self, cast_member: &CastMember) -> Result<(), AppError>;
    async fn update(&self, cast_member: &CastMember) -> Result<(), AppError>;
    async fn delete(&self, cast_member: &CastMember) -> Result<(), AppError>;
    async fn get(&self, id: Uuid) -> Result<CastMember, AppError>;
    async fn search(&self, input: &SearchInput) -> Result<SearchOutput<CastMember>, AppError>;
    async fn get_ids_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Uuid>, AppError>;
}

#[async_trait]
pub trait GenreRepository: Send + Sync {
    async fn insert(&self, genre: &Genre) -> Result<(), AppError>;
    async fn update(&self, genre: &Genre) -> Result<(), AppError>;
    async fn delete(&self, genre: &Genre) -> Result<(), AppError>;
    /// Returned genres carry their categories as read from the join table.
    async fn get(&self, id: Uuid) -> Result<Genre, AppError>;
    async fn search(&self, input: &SearchInput) -> Result<SearchOutput<Genre>, AppError>;
    async fn get_ids_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Uuid>, AppError>;
}

#[async_trait]
pub trait VideoRepository: Send + Sync {
    async fn insert(&self, video: &Video) -> Result<(), AppError>;
    async fn update(&self, video: &Video) -> Result<(), AppError>;
    async fn delete(&self, video: &Video) -> Result<(), AppError>;
    /// Returned videos carry categories, genres and cast members from the join tables.
    async fn get(&self, id: Uuid) -> Result<Video, AppError>;
    async fn search(&self, input: &SearchInput) -> Result<SearchOutput<Video>, AppError>;
    async fn get_ids_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Uuid>, AppError>;
}

/// Commit boundary for everything the repositories staged in this request.
#[async_trait]
pub trait UnitOfWork: Send + Sync {
    /// Persist all staged writes atomically, then publish the domain events
    /// raised by the aggregates that were written.
    async fn commit(&self, cancel: &CancellationToken) -> Result<(), AppError>;

    /// Discard staged writes and pending events.
    async fn rollback(&self) -> Result<(), AppError>;
}
