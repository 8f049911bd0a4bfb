//! Genre use cases

use catalog_core::models::{Genre, RelationKind, SearchInput, SearchOutput};
use catalog_core::{cancellable, ensure_not_cancelled, AppError};
use catalog_db::{CategoryRepository, GenreRepository, UnitOfWork};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::persist;
use crate::relation_validator::RelationValidator;

#[derive(Debug, Clone, Deserialize)]
pub struct CreateGenreInput {
    pub name: String,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default)]
    pub categories_ids: Vec<Uuid>,
}

/// `categories_ids: None` leaves the genre's categories as they are;
/// `Some(vec![])` removes them all.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateGenreInput {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default)]
    pub categories_ids: Option<Vec<Uuid>>,
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenreOutput {
    pub id: Uuid,
    pub name: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub categories: Vec<Uuid>,
}

impl From<Genre> for GenreOutput {
    fn from(genre: Genre) -> Self {
        Self {
            categories: genre.categories.to_vec(),
            id: genre.id,
            name: genre.name,
            is_active: genre.is_active,
            created_at: genre.created_at,
        }
    }
}

#[derive(Clone)]
pub struct GenreService {
    genres: Arc<dyn GenreRepository>,
    categories: Arc<dyn CategoryRepository>,
    uow: Arc<dyn UnitOfWork>,
}

impl GenreService {
    pub fn new(
        genres: Arc<dyn GenreRepository>,
        categories: Arc<dyn CategoryRepository>,
        uow: Arc<dyn UnitOfWork>,
    ) -> Self {
        Self {
            genres,
            categories,
            uow,
        }
    }

    async fn validate_categories(
        &self,
        ids: &[Uuid],
        cancel: &CancellationToken,
    ) -> Result<Vec<Uuid>, AppError> {
        RelationValidator::validate(RelationKind::Category, ids, self.categories.as_ref(), cancel)
            .await
    }

    #[tracing::instrument(skip(self, input, cancel), fields(genre.name = %input.name))]
    pub async fn create(
        &self,
        input: CreateGenreInput,
        cancel: &CancellationToken,
    ) -> Result<GenreOutput, AppError> {
        ensure_not_cancelled(cancel)?;
        let mut genre = Genre::new(input.name, input.is_active)?;

        for id in self.validate_categories(&input.categories_ids, cancel).await? {
            genre.add_category(id);
        }

        persist(self.uow.as_ref(), cancel, self.genres.insert(&genre)).await?;
        genre.categories.mark_persisted();

        tracing::info!(
            genre_id = %genre.id,
            categories = genre.categories.len(),
            "Genre created"
        );
        Ok(genre.into())
    }

    #[tracing::instrument(skip(self, input, cancel), fields(genre.id = %input.id))]
    pub async fn update(
        &self,
        input: UpdateGenreInput,
        cancel: &CancellationToken,
    ) -> Result<GenreOutput, AppError> {
        let mut genre = cancellable(cancel, self.genres.get(input.id)).await?;
        genre.update(input.name)?;
        match input.is_active {
            Some(true) => genre.activate(),
            Some(false) => genre.deactivate(),
            None => {}
        }

        if let Some(categories_ids) = input.categories_ids {
            let ids = self.validate_categories(&categories_ids, cancel).await?;
            genre.remove_all_categories();
            for id in ids {
                genre.add_category(id);
            }
        }

        persist(self.uow.as_ref(), cancel, self.genres.update(&genre)).await?;
        genre.categories.mark_persisted();
        Ok(genre.into())
    }

    pub async fn get(&self, id: Uuid, cancel: &CancellationToken) -> Result<GenreOutput, AppError> {
        let genre = cancellable(cancel, self.genres.get(id)).await?;
        Ok(genre.into())
    }

    #[tracing::instrument(skip(self, cancel))]
    pub async fn delete(&self, id: Uuid, cancel: &CancellationToken) -> Result<(), AppError> {
        let genre = cancellable(cancel, self.genres.get(id)).await?;
        persist(self.uow.as_ref(), cancel, self.genres.delete(&genre)).await?;
        tracing::info!(genre_id = %id, "Genre deleted");
        Ok(())
    }

    pub async fn list(
        &self,
        input: &SearchInput,
        cancel: &CancellationToken,
    ) -> Result<SearchOutput<GenreOutput>, AppError> {
        let page = cancellable(cancel, self.genres.search(input)).await?;
        Ok(page.map(GenreOutput::from))
    }
}
