use async_trait::async_trait;
use catalog_core::models::{Category, SearchInput, SearchOutput};
use catalog_core::{AppError, JoinTable};
use chrono::{DateTime, Utc};
use sqlx::Postgres;
use std::sync::Arc;
use uuid::Uuid;

use crate::db::join_rows;
use crate::db::repositories::CategoryRepository;
use crate::db::search::{like_pattern, order_clause, page};
use crate::db::transaction::PgUnitOfWork;

const SORTABLE_COLUMNS: &[&str] = &["name", "created_at"];

#[derive(sqlx::FromRow)]
struct CategoryRow {
    id: Uuid,
    name: String,
    description: String,
    is_active: bool,
    created_at: DateTime<Utc>,
}

impl From<CategoryRow> for Category {
    fn from(row: CategoryRow) -> Self {
        Category {
            id: row.id,
            name: row.name,
            description: row.description,
            is_active: row.is_active,
            created_at: row.created_at,
        }
    }
}

/// Repository for the `categories` table
#[derive(Clone)]
pub struct PgCategoryRepository {
    uow: Arc<PgUnitOfWork>,
}

impl PgCategoryRepository {
    pub fn new(uow: Arc<PgUnitOfWork>) -> Self {
        Self { uow }
    }
}

#[async_trait]
impl CategoryRepository for PgCategoryRepository {
    #[tracing::instrument(skip(self, category), fields(db.table = "categories", db.operation = "insert", db.record_id = %category.id))]
    async fn insert(&self, category: &Category) -> Result<(), AppError> {
        let mut tx = self.uow.transaction().await?;
        sqlx::query(
            "INSERT INTO categories (id, name, description, is_active, created_at) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(category.id)
        .bind(&category.name)
        .bind(&category.description)
        .bind(category.is_active)
        .bind(category.created_at)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    #[tracing::instrument(skip(self, category), fields(db.table = "categories", db.operation = "update", db.record_id = %category.id))]
    async fn update(&self, category: &Category) -> Result<(), AppError> {
        let mut tx = self.uow.transaction().await?;
        let result = sqlx::query(
            "UPDATE categories SET name = $2, description = $3, is_active = $4 WHERE id = $1",
        )
        .bind(category.id)
        .bind(&category.name)
        .bind(&category.description)
        .bind(category.is_active)
        .execute(&mut **tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("Category", category.id));
        }
        Ok(())
    }

    #[tracing::instrument(skip(self, category), fields(db.table = "categories", db.operation = "delete", db.record_id = %category.id))]
    async fn delete(&self, category: &Category) -> Result<(), AppError> {
        let mut tx = self.uow.transaction().await?;
        join_rows::delete_by_child(&mut **tx, JoinTable::GenreCategory, category.id).await?;
        join_rows::delete_by_child(&mut **tx, JoinTable::VideoCategory, category.id).await?;
        sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(category.id)
            .execute(&mut **tx)
            .await?;
        Ok(())
    }

    #[tracing::instrument(skip(self), fields(db.table = "categories", db.operation = "select", db.record_id = %id))]
    async fn get(&self, id: Uuid) -> Result<Category, AppError> {
        let row = sqlx::query_as::<Postgres, CategoryRow>(
            "SELECT id, name, description, is_active, created_at FROM categories WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.uow.pool())
        .await?;

        row.map(Category::from)
            .ok_or_else(|| AppError::not_found("Category", id))
    }

    #[tracing::instrument(skip(self), fields(db.table = "categories", db.operation = "select"))]
    async fn search(&self, input: &SearchInput) -> Result<SearchOutput<Category>, AppError> {
        let pattern = like_pattern(input);
        let sql = format!(
            "SELECT id, name, description, is_active, created_at FROM categories \
             WHERE ($1::text IS NULL OR name ILIKE $1) {} LIMIT $2 OFFSET $3",
            order_clause(input, SORTABLE_COLUMNS, "created_at")
        );

        let rows = sqlx::query_as::<Postgres, CategoryRow>(&sql)
            .bind(&pattern)
            .bind(i64::from(input.per_page()))
            .bind(input.offset() as i64)
            .fetch_all(self.uow.pool())
            .await?;

        let total = sqlx::query_scalar::<Postgres, i64>(
            "SELECT COUNT(*) FROM categories WHERE ($1::text IS NULL OR name ILIKE $1)",
        )
        .bind(&pattern)
        .fetch_one(self.uow.pool())
        .await?;

        Ok(page(input, total, rows.into_iter().map(Category::from).collect()))
    }

    #[tracing::instrument(skip(self, ids), fields(db.table = "categories", db.operation = "select", db.ids = ids.len()))]
    async fn get_ids_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Uuid>, AppError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let existing = sqlx::query_scalar::<Postgres, Uuid>("SELECT id FROM categories WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(self.uow.pool())
            .await?;
        Ok(existing)
    }
}
