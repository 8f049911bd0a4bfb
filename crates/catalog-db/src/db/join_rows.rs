//! Execution of staged join-row writes
//!
//! Join rows are written and read explicitly; the schema has no cascading
//! deletes between aggregates.

use catalog_core::{AppError, JoinRowChange, JoinTable};
use sqlx::{PgConnection, PgPool, Postgres};
use uuid::Uuid;

/// Physical table and columns backing a join table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct JoinTableSpec {
    pub table: &'static str,
    pub parent_column: &'static str,
    pub child_column: &'static str,
}

pub(crate) fn table_spec(table: JoinTable) -> JoinTableSpec {
    match table {
        JoinTable::VideoCategory => JoinTableSpec {
            table: "videos_categories",
            parent_column: "video_id",
            child_column: "category_id",
        },
        JoinTable::VideoGenre => JoinTableSpec {
            table: "videos_genres",
            parent_column: "video_id",
            child_column: "genre_id",
        },
        JoinTable::VideoCastMember => JoinTableSpec {
            table: "videos_cast_members",
            parent_column: "video_id",
            child_column: "cast_member_id",
        },
        JoinTable::GenreCategory => JoinTableSpec {
            table: "genres_categories",
            parent_column: "genre_id",
            child_column: "category_id",
        },
    }
}

fn statement(change: &JoinRowChange) -> String {
    let spec = table_spec(change.table());
    match change {
        JoinRowChange::DeleteAll { .. } => format!(
            "DELETE FROM {} WHERE {} = $1",
            spec.table, spec.parent_column
        ),
        JoinRowChange::Insert { .. } => format!(
            "INSERT INTO {} ({}, {}) SELECT $1, UNNEST($2::uuid[])",
            spec.table, spec.parent_column, spec.child_column
        ),
    }
}

/// Apply changes in order inside the caller's transaction.
pub(crate) async fn apply(conn: &mut PgConnection, changes: &[JoinRowChange]) -> Result<(), AppError> {
    for change in changes {
        let sql = statement(change);
        match change {
            JoinRowChange::DeleteAll { parent_id, .. } => {
                sqlx::query(&sql).bind(parent_id).execute(&mut *conn).await?;
            }
            JoinRowChange::Insert {
                parent_id,
                child_ids,
                ..
            } => {
                sqlx::query(&sql)
                    .bind(parent_id)
                    .bind(child_ids)
                    .execute(&mut *conn)
                    .await?;
            }
        }
    }

    if !changes.is_empty() {
        tracing::debug!(changes = changes.len(), "Join rows staged");
    }
    Ok(())
}

/// Remove every row that references `child_id` from the child side.
pub(crate) async fn delete_by_child(
    conn: &mut PgConnection,
    table: JoinTable,
    child_id: Uuid,
) -> Result<(), AppError> {
    let spec = table_spec(table);
    let sql = format!("DELETE FROM {} WHERE {} = $1", spec.table, spec.child_column);
    sqlx::query(&sql).bind(child_id).execute(&mut *conn).await?;
    Ok(())
}

/// Child ids currently persisted for a parent.
pub(crate) async fn load_children(
    pool: &PgPool,
    table: JoinTable,
    parent_id: Uuid,
) -> Result<Vec<Uuid>, AppError> {
    let spec = table_spec(table);
    let sql = format!(
        "SELECT {} FROM {} WHERE {} = $1",
        spec.child_column, spec.table, spec.parent_column
    );
    let ids = sqlx::query_scalar::<Postgres, Uuid>(&sql)
        .bind(parent_id)
        .fetch_all(pool)
        .await?;
    Ok(ids)
}

/// Child ids for several parents at once, as `(parent_id, child_id)` pairs.
pub(crate) async fn load_children_for(
    pool: &PgPool,
    table: JoinTable,
    parent_ids: &[Uuid],
) -> Result<Vec<(Uuid, Uuid)>, AppError> {
    if parent_ids.is_empty() {
        return Ok(Vec::new());
    }
    let spec = table_spec(table);
    let sql = format!(
        "SELECT {}, {} FROM {} WHERE {} = ANY($1)",
        spec.parent_column, spec.child_column, spec.table, spec.parent_column
    );
    let rows = sqlx::query_as::<Postgres, (Uuid, Uuid)>(&sql)
        .bind(parent_ids)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}
