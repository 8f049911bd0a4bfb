use async_trait::async_trait;
use catalog_core::models::{Genre, RelationSet, SearchInput, SearchOutput};
use catalog_core::relations::genre_relations;
use catalog_core::{AppError, JoinRowChange, JoinTable, RelationSynchronizer};
use chrono::{DateTime, Utc};
use sqlx::Postgres;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::db::join_rows;
use crate::db::repositories::GenreRepository;
use crate::db::search::{like_pattern, order_clause, page};
use crate::db::transaction::PgUnitOfWork;

const SORTABLE_COLUMNS: &[&str] = &["name", "created_at"];

#[derive(sqlx::FromRow)]
struct GenreRow {
    id: Uuid,
    name: String,
    is_active: bool,
    created_at: DateTime<Utc>,
}

impl GenreRow {
    fn into_genre(self, categories: RelationSet) -> Genre {
        Genre {
            id: self.id,
            name: self.name,
            is_active: self.is_active,
            created_at: self.created_at,
            categories,
        }
    }
}

/// Repository for the `genres` table and its `genres_categories` join rows
#[derive(Clone)]
pub struct PgGenreRepository {
    uow: Arc<PgUnitOfWork>,
}

impl PgGenreRepository {
    pub fn new(uow: Arc<PgUnitOfWork>) -> Self {
        Self { uow }
    }
}

#[async_trait]
impl GenreRepository for PgGenreRepository {
    #[tracing::instrument(skip(self, genre), fields(db.table = "genres", db.operation = "insert", db.record_id = %genre.id))]
    async fn insert(&self, genre: &Genre) -> Result<(), AppError> {
        let mut tx = self.uow.transaction().await?;
        sqlx::query("INSERT INTO genres (id, name, is_active, created_at) VALUES ($1, $2, $3, $4)")
            .bind(genre.id)
            .bind(&genre.name)
            .bind(genre.is_active)
            .bind(genre.created_at)
            .execute(&mut **tx)
            .await?;

        let changes = RelationSynchronizer::sync_on_insert(genre.id, &genre_relations(genre));
        join_rows::apply(&mut **tx, &changes).await
    }

    #[tracing::instrument(skip(self, genre), fields(db.table = "genres", db.operation = "update", db.record_id = %genre.id))]
    async fn update(&self, genre: &Genre) -> Result<(), AppError> {
        let mut tx = self.uow.transaction().await?;
        let result = sqlx::query("UPDATE genres SET name = $2, is_active = $3 WHERE id = $1")
            .bind(genre.id)
            .bind(&genre.name)
            .bind(genre.is_active)
            .execute(&mut **tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("Genre", genre.id));
        }

        let changes = RelationSynchronizer::sync_on_update(genre.id, &genre_relations(genre));
        join_rows::apply(&mut **tx, &changes).await
    }

    #[tracing::instrument(skip(self, genre), fields(db.table = "genres", db.operation = "delete", db.record_id = %genre.id))]
    async fn delete(&self, genre: &Genre) -> Result<(), AppError> {
        let mut tx = self.uow.transaction().await?;
        join_rows::apply(
            &mut **tx,
            &[JoinRowChange::DeleteAll {
                table: JoinTable::GenreCategory,
                parent_id: genre.id,
            }],
        )
        .await?;
        join_rows::delete_by_child(&mut **tx, JoinTable::VideoGenre, genre.id).await?;
        sqlx::query("DELETE FROM genres WHERE id = $1")
            .bind(genre.id)
            .execute(&mut **tx)
            .await?;
        Ok(())
    }

    #[tracing::instrument(skip(self), fields(db.table = "genres", db.operation = "select", db.record_id = %id))]
    async fn get(&self, id: Uuid) -> Result<Genre, AppError> {
        let row = sqlx::query_as::<Postgres, GenreRow>(
            "SELECT id, name, is_active, created_at FROM genres WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.uow.pool())
        .await?
        .ok_or_else(|| AppError::not_found("Genre", id))?;

        let categories =
            join_rows::load_children(self.uow.pool(), JoinTable::GenreCategory, id).await?;
        Ok(row.into_genre(RelationSet::loaded(categories)))
    }

    #[tracing::instrument(skip(self), fields(db.table = "genres", db.operation = "select"))]
    async fn search(&self, input: &SearchInput) -> Result<SearchOutput<Genre>, AppError> {
        let pattern = like_pattern(input);
        let sql = format!(
            "SELECT id, name, is_active, created_at FROM genres \
             WHERE ($1::text IS NULL OR name ILIKE $1) {} LIMIT $2 OFFSET $3",
            order_clause(input, SORTABLE_COLUMNS, "created_at")
        );

        let rows = sqlx::query_as::<Postgres, GenreRow>(&sql)
            .bind(&pattern)
            .bind(i64::from(input.per_page()))
            .bind(input.offset() as i64)
            .fetch_all(self.uow.pool())
            .await?;

        let total = sqlx::query_scalar::<Postgres, i64>(
            "SELECT COUNT(*) FROM genres WHERE ($1::text IS NULL OR name ILIKE $1)",
        )
        .bind(&pattern)
        .fetch_one(self.uow.pool())
        .await?;

        let ids: Vec<Uuid> = rows.iter().map(|row| row.id).collect();
        let mut categories: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
        for (genre_id, category_id) in
            join_rows::load_children_for(self.uow.pool(), JoinTable::GenreCategory, &ids).await?
        {
            categories.entry(genre_id).or_default().push(category_id);
        }

        let items = rows
            .into_iter()
            .map(|row| {
                let set = RelationSet::loaded(categories.remove(&row.id).unwrap_or_default());
                row.into_genre(set)
            })
            .collect();
        Ok(page(input, total, items))
    }

    #[tracing::instrument(skip(self, ids), fields(db.table = "genres", db.operation = "select", db.ids = ids.len()))]
    async fn get_ids_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Uuid>, AppError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let existing = sqlx::query_scalar::<Postgres, Uuid>("SELECT id FROM genres WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(self.uow.pool())
            .await?;
        Ok(existing)
    }
}
