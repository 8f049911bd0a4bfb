use async_trait::async_trait;
use catalog_core::models::{CastMember, CastMemberType, SearchInput, SearchOutput};
use catalog_core::{AppError, JoinTable};
use chrono::{DateTime, Utc};
use sqlx::Postgres;
use std::sync::Arc;
use uuid::Uuid;

use crate::db::join_rows;
use crate::db::repositories::CastMemberRepository;
use crate::db::search::{like_pattern, order_clause, page};
use crate::db::transaction::PgUnitOfWork;

const SORTABLE_COLUMNS: &[&str] = &["name", "created_at"];

#[derive(sqlx::FromRow)]
struct CastMemberRow {
    id: Uuid,
    name: String,
    member_type: i16,
    created_at: DateTime<Utc>,
}

impl TryFrom<CastMemberRow> for CastMember {
    type Error = AppError;

    fn try_from(row: CastMemberRow) -> Result<Self, Self::Error> {
        Ok(CastMember {
            id: row.id,
            name: row.name,
            member_type: CastMemberType::from_code(row.member_type)?,
            created_at: row.created_at,
        })
    }
}

/// Repository for the `cast_members` table
#[derive(Clone)]
pub struct PgCastMemberRepository {
    uow: Arc<PgUnitOfWork>,
}

impl PgCastMemberRepository {
    pub fn new(uow: Arc<PgUnitOfWork>) -> Self {
        Self { uow }
    }
}

#[async_trait]
impl CastMemberRepository for PgCastMemberRepository {
    #[tracing::instrument(skip(self, cast_member), fields(db.table = "cast_members", db.operation = "insert", db.record_id = %cast_member.id))]
    async fn insert(&self, cast_member: &CastMember) -> Result<(), AppError> {
        let mut tx = self.uow.transaction().await?;
        sqlx::query(
            "INSERT INTO cast_members (id, name, member_type, created_at) VALUES ($1, $2, $3, $4)",
        )
        .bind(cast_member.id)
        .bind(&cast_member.name)
        .bind(cast_member.member_type.code())
        .bind(cast_member.created_at)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    #[tracing::instrument(skip(self, cast_member), fields(db.table = "cast_members", db.operation = "update", db.record_id = %cast_member.id))]
    async fn update(&self, cast_member: &CastMember) -> Result<(), AppError> {
        let mut tx = self.uow.transaction().await?;
        let result = sqlx::query("UPDATE cast_members SET name = $2, member_type = $3 WHERE id = $1")
            .bind(cast_member.id)
            .bind(&cast_member.name)
            .bind(cast_member.member_type.code())
            .execute(&mut **tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("CastMember", cast_member.id));
        }
        Ok(())
    }

    #[tracing::instrument(skip(self, cast_member), fields(db.table = "cast_members", db.operation = "delete", db.record_id = %cast_member.id))]
    async fn delete(&self, cast_member: &CastMember) -> Result<(), AppError> {
        let mut tx = self.uow.transaction().await?;
        join_rows::delete_by_child(&mut **tx, JoinTable::VideoCastMember, cast_member.id).await?;
        sqlx::query("DELETE FROM cast_members WHERE id = $1")
            .bind(cast_member.id)
            .execute(&mut **tx)
            .await?;
        Ok(())
    }

    #[tracing::instrument(skip(self), fields(db.table = "cast_members", db.operation = "select", db.record_id = %id))]
    async fn get(&self, id: Uuid) -> Result<CastMember, AppError> {
        let row = sqlx::query_as::<Postgres, CastMemberRow>(
            "SELECT id, name, member_type, created_at FROM cast_members WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.uow.pool())
        .await?;

        match row {
            Some(row) => row.try_into(),
            None => Err(AppError::not_found("CastMember", id)),
        }
    }

    #[tracing::instrument(skip(self), fields(db.table = "cast_members", db.operation = "select"))]
    async fn search(&self, input: &SearchInput) -> Result<SearchOutput<CastMember>, AppError> {
        let pattern = like_pattern(input);
        let sql = format!(
            "SELECT id, name, member_type, created_at FROM cast_members \
             WHERE ($1::text IS NULL OR name ILIKE $1) {} LIMIT $2 OFFSET $3",
            order_clause(input, SORTABLE_COLUMNS, "created_at")
        );

        let rows = sqlx::query_as::<Postgres, CastMemberRow>(&sql)
            .bind(&pattern)
            .bind(i64::from(input.per_page()))
            .bind(input.offset() as i64)
            .fetch_all(self.uow.pool())
            .await?;

        let total = sqlx::query_scalar::<Postgres, i64>(
            "SELECT COUNT(*) FROM cast_members WHERE ($1::text IS NULL OR name ILIKE $1)",
        )
        .bind(&pattern)
        .fetch_one(self.uow.pool())
        .await?;

        let items = rows
            .into_iter()
            .map(CastMember::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(page(input, total, items))
    }

    #[tracing::instrument(skip(self, ids), fields(db.table = "cast_members", db.operation = "select", db.ids = ids.len()))]
    async fn get_ids_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Uuid>, AppError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let existing =
            sqlx::query_scalar::<Postgres, Uuid>("SELECT id FROM cast_members WHERE id = ANY($1)")
                .bind(ids)
                .fetch_all(self.uow.pool())
                .await?;
        Ok(existing)
    }
}
