//! Existence checks for ids an aggregate is about to reference

use async_trait::async_trait;
use catalog_core::models::RelationKind;
use catalog_core::{cancellable, AppError};
use catalog_db::{CastMemberRepository, CategoryRepository, GenreRepository};
use std::collections::HashSet;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Source of truth for which ids of one aggregate kind exist.
#[async_trait]
pub trait IdLookup: Send + Sync {
    /// Subset of `ids` that exist.
    async fn get_ids_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Uuid>, AppError>;
}

#[async_trait]
impl IdLookup for dyn CategoryRepository {
    async fn get_ids_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Uuid>, AppError> {
        CategoryRepository::get_ids_by_ids(self, ids).await
    }
}

#[async_trait]
impl IdLookup for dyn GenreRepository {
    async fn get_ids_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Uuid>, AppError> {
        GenreRepository::get_ids_by_ids(self, ids).await
    }
}

#[async_trait]
impl IdLookup for dyn CastMemberRepository {
    async fn get_ids_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Uuid>, AppError> {
        CastMemberRepository::get_ids_by_ids(self, ids).await
    }
}

/// Candidates absent from `existing`, deduplicated, in candidate order.
pub fn missing_ids(candidates: &[Uuid], existing: &[Uuid]) -> Vec<Uuid> {
    let existing: HashSet<&Uuid> = existing.iter().collect();
    let mut seen = HashSet::new();
    candidates
        .iter()
        .filter(|id| !existing.contains(id) && seen.insert(**id))
        .copied()
        .collect()
}

pub struct RelationValidator;

impl RelationValidator {
    /// Confirm every candidate id exists, querying `lookup` once.
    ///
    /// All-or-nothing: a single missing id rejects the whole set with
    /// `AppError::RelatedAggregate`. An empty candidate set is accepted
    /// without a lookup.
    pub async fn validate<L>(
        kind: RelationKind,
        candidates: &[Uuid],
        lookup: &L,
        cancel: &CancellationToken,
    ) -> Result<Vec<Uuid>, AppError>
    where
        L: IdLookup + ?Sized,
    {
        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        let existing = cancellable(cancel, lookup.get_ids_by_ids(candidates)).await?;
        let missing = missing_ids(candidates, &existing);
        if !missing.is_empty() {
            tracing::info!(
                kind = %kind,
                requested = candidates.len(),
                missing = missing.len(),
                "Related aggregate ids not found"
            );
            return Err(AppError::related_aggregate(kind, missing));
        }

        let mut seen = HashSet::new();
        Ok(candidates
            .iter()
            .filter(|id| seen.insert(**id))
            .copied()
            .collect())
    }
}
