use async_trait::async_trait;
use catalog_core::models::{
    Image, Media, MediaStatus, Rating, RelationSet, SearchInput, SearchOutput, Video, VideoDetails,
};
use catalog_core::relations::video_relations;
use catalog_core::{AppError, JoinRowChange, JoinTable, RelationSynchronizer};
use chrono::{DateTime, Utc};
use sqlx::Postgres;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::db::join_rows;
use crate::db::repositories::VideoRepository;
use crate::db::search::{like_pattern, order_clause, page};
use crate::db::transaction::PgUnitOfWork;

const SORTABLE_COLUMNS: &[&str] = &["title", "created_at"];

const VIDEO_COLUMNS: &str = "id, title, description, year_launched, opened, published, duration, rating, created_at, \
     thumb_path, thumb_half_path, banner_path, \
     media_id, media_file_path, media_encoded_path, media_status, \
     trailer_id, trailer_file_path, trailer_encoded_path, trailer_status";

const RELATION_TABLES: [JoinTable; 3] = [
    JoinTable::VideoCategory,
    JoinTable::VideoGenre,
    JoinTable::VideoCastMember,
];

#[derive(sqlx::FromRow)]
struct VideoRow {
    id: Uuid,
    title: String,
    description: String,
    year_launched: i32,
    opened: bool,
    published: bool,
    duration: i32,
    rating: String,
    created_at: DateTime<Utc>,
    thumb_path: Option<String>,
    thumb_half_path: Option<String>,
    banner_path: Option<String>,
    media_id: Option<Uuid>,
    media_file_path: Option<String>,
    media_encoded_path: Option<String>,
    media_status: Option<String>,
    trailer_id: Option<Uuid>,
    trailer_file_path: Option<String>,
    trailer_encoded_path: Option<String>,
    trailer_status: Option<String>,
}

fn media_from_columns(
    id: Option<Uuid>,
    file_path: Option<String>,
    encoded_path: Option<String>,
    status: Option<String>,
) -> Result<Option<Media>, AppError> {
    match (id, file_path) {
        (Some(id), Some(file_path)) => Ok(Some(Media {
            id,
            file_path,
            encoded_path,
            status: status
                .as_deref()
                .unwrap_or(MediaStatus::Pending.as_str())
                .parse()?,
        })),
        _ => Ok(None),
    }
}

impl TryFrom<VideoRow> for Video {
    type Error = AppError;

    fn try_from(row: VideoRow) -> Result<Self, Self::Error> {
        let rating: Rating = row.rating.parse()?;
        let media = media_from_columns(
            row.media_id,
            row.media_file_path,
            row.media_encoded_path,
            row.media_status,
        )?;
        let trailer = media_from_columns(
            row.trailer_id,
            row.trailer_file_path,
            row.trailer_encoded_path,
            row.trailer_status,
        )?;

        Ok(Video::restore(
            row.id,
            VideoDetails {
                title: row.title,
                description: row.description,
                year_launched: row.year_launched,
                opened: row.opened,
                published: row.published,
                duration: row.duration,
                rating,
            },
            row.created_at,
            row.thumb_path.map(Image::new),
            row.thumb_half_path.map(Image::new),
            row.banner_path.map(Image::new),
            media,
            trailer,
        ))
    }
}

fn relation_slot(video: &mut Video, table: JoinTable) -> &mut RelationSet {
    match table {
        JoinTable::VideoGenre => &mut video.genres,
        JoinTable::VideoCastMember => &mut video.cast_members,
        JoinTable::VideoCategory | JoinTable::GenreCategory => &mut video.categories,
    }
}

/// Repository for the `videos` table and its three join tables
#[derive(Clone)]
pub struct PgVideoRepository {
    uow: Arc<PgUnitOfWork>,
}

impl PgVideoRepository {
    pub fn new(uow: Arc<PgUnitOfWork>) -> Self {
        Self { uow }
    }

    /// Fill relation sets of freshly read videos from the join tables.
    async fn hydrate_relations(&self, videos: &mut [Video]) -> Result<(), AppError> {
        let ids: Vec<Uuid> = videos.iter().map(|video| video.id).collect();
        for table in RELATION_TABLES {
            let mut children: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
            for (video_id, child_id) in
                join_rows::load_children_for(self.uow.pool(), table, &ids).await?
            {
                children.entry(video_id).or_default().push(child_id);
            }
            for video in videos.iter_mut() {
                let loaded = RelationSet::loaded(children.remove(&video.id).unwrap_or_default());
                *relation_slot(video, table) = loaded;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl VideoRepository for PgVideoRepository {
    #[tracing::instrument(skip(self, video), fields(db.table = "videos", db.operation = "insert", db.record_id = %video.id))]
    async fn insert(&self, video: &Video) -> Result<(), AppError> {
        let mut tx = self.uow.transaction().await?;
        let sql = format!(
            "INSERT INTO videos ({}) VALUES \
             ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19, $20)",
            VIDEO_COLUMNS
        );
        sqlx::query(&sql)
            .bind(video.id)
            .bind(&video.title)
            .bind(&video.description)
            .bind(video.year_launched)
            .bind(video.opened)
            .bind(video.published)
            .bind(video.duration)
            .bind(video.rating.as_str())
            .bind(video.created_at)
            .bind(video.thumb.as_ref().map(|image| image.path.as_str()))
            .bind(video.thumb_half.as_ref().map(|image| image.path.as_str()))
            .bind(video.banner.as_ref().map(|image| image.path.as_str()))
            .bind(video.media.as_ref().map(|media| media.id))
            .bind(video.media.as_ref().map(|media| media.file_path.as_str()))
            .bind(video.media.as_ref().and_then(|media| media.encoded_path.as_deref()))
            .bind(video.media.as_ref().map(|media| media.status.as_str()))
            .bind(video.trailer.as_ref().map(|trailer| trailer.id))
            .bind(video.trailer.as_ref().map(|trailer| trailer.file_path.as_str()))
            .bind(video.trailer.as_ref().and_then(|trailer| trailer.encoded_path.as_deref()))
            .bind(video.trailer.as_ref().map(|trailer| trailer.status.as_str()))
            .execute(&mut **tx)
            .await?;

        let changes = RelationSynchronizer::sync_on_insert(video.id, &video_relations(video));
        join_rows::apply(&mut **tx, &changes).await?;
        drop(tx);

        self.uow.record_events(video.events()).await;
        Ok(())
    }

    #[tracing::instrument(skip(self, video), fields(db.table = "videos", db.operation = "update", db.record_id = %video.id))]
    async fn update(&self, video: &Video) -> Result<(), AppError> {
        let mut tx = self.uow.transaction().await?;
        let result = sqlx::query(
            r#"
            UPDATE videos SET
                title = $2, description = $3, year_launched = $4, opened = $5,
                published = $6, duration = $7, rating = $8,
                thumb_path = $9, thumb_half_path = $10, banner_path = $11,
                media_id = $12, media_file_path = $13, media_encoded_path = $14, media_status = $15,
                trailer_id = $16, trailer_file_path = $17, trailer_encoded_path = $18, trailer_status = $19
            WHERE id = $1
            "#,
        )
        .bind(video.id)
        .bind(&video.title)
        .bind(&video.description)
        .bind(video.year_launched)
        .bind(video.opened)
        .bind(video.published)
        .bind(video.duration)
        .bind(video.rating.as_str())
        .bind(video.thumb.as_ref().map(|image| image.path.as_str()))
        .bind(video.thumb_half.as_ref().map(|image| image.path.as_str()))
        .bind(video.banner.as_ref().map(|image| image.path.as_str()))
        .bind(video.media.as_ref().map(|media| media.id))
        .bind(video.media.as_ref().map(|media| media.file_path.as_str()))
        .bind(video.media.as_ref().and_then(|media| media.encoded_path.as_deref()))
        .bind(video.media.as_ref().map(|media| media.status.as_str()))
        .bind(video.trailer.as_ref().map(|trailer| trailer.id))
        .bind(video.trailer.as_ref().map(|trailer| trailer.file_path.as_str()))
        .bind(video.trailer.as_ref().and_then(|trailer| trailer.encoded_path.as_deref()))
        .bind(video.trailer.as_ref().map(|trailer| trailer.status.as_str()))
        .execute(&mut **tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("Video", video.id));
        }

        let changes = RelationSynchronizer::sync_on_update(video.id, &video_relations(video));
        join_rows::apply(&mut **tx, &changes).await?;
        drop(tx);

        self.uow.record_events(video.events()).await;
        Ok(())
    }

    #[tracing::instrument(skip(self, video), fields(db.table = "videos", db.operation = "delete", db.record_id = %video.id))]
    async fn delete(&self, video: &Video) -> Result<(), AppError> {
        let mut tx = self.uow.transaction().await?;
        let changes: Vec<JoinRowChange> = RELATION_TABLES
            .into_iter()
            .map(|table| JoinRowChange::DeleteAll {
                table,
                parent_id: video.id,
            })
            .collect();
        join_rows::apply(&mut **tx, &changes).await?;
        sqlx::query("DELETE FROM videos WHERE id = $1")
            .bind(video.id)
            .execute(&mut **tx)
            .await?;
        Ok(())
    }

    #[tracing::instrument(skip(self), fields(db.table = "videos", db.operation = "select", db.record_id = %id))]
    async fn get(&self, id: Uuid) -> Result<Video, AppError> {
        let sql = format!("SELECT {} FROM videos WHERE id = $1", VIDEO_COLUMNS);
        let row = sqlx::query_as::<Postgres, VideoRow>(&sql)
            .bind(id)
            .fetch_optional(self.uow.pool())
            .await?
            .ok_or_else(|| AppError::not_found("Video", id))?;

        let mut videos = vec![Video::try_from(row)?];
        self.hydrate_relations(&mut videos).await?;
        videos
            .pop()
            .ok_or_else(|| AppError::not_found("Video", id))
    }

    #[tracing::instrument(skip(self), fields(db.table = "videos", db.operation = "select"))]
    async fn search(&self, input: &SearchInput) -> Result<SearchOutput<Video>, AppError> {
        let pattern = like_pattern(input);
        let sql = format!(
            "SELECT {} FROM videos WHERE ($1::text IS NULL OR title ILIKE $1) {} LIMIT $2 OFFSET $3",
            VIDEO_COLUMNS,
            order_clause(input, SORTABLE_COLUMNS, "created_at")
        );

        let rows = sqlx::query_as::<Postgres, VideoRow>(&sql)
            .bind(&pattern)
            .bind(i64::from(input.per_page()))
            .bind(input.offset() as i64)
            .fetch_all(self.uow.pool())
            .await?;

        let total = sqlx::query_scalar::<Postgres, i64>(
            "SELECT COUNT(*) FROM videos WHERE ($1::text IS NULL OR title ILIKE $1)",
        )
        .bind(&pattern)
        .fetch_one(self.uow.pool())
        .await?;

        let mut items = rows
            .into_iter()
            .map(Video::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        self.hydrate_relations(&mut items).await?;
        Ok(page(input, total, items))
    }

    #[tracing::instrument(skip(self, ids), fields(db.table = "videos", db.operation = "select", db.ids = ids.len()))]
    async fn get_ids_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Uuid>, AppError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let existing = sqlx::query_scalar::<Postgres, Uuid>("SELECT id FROM videos WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(self.uow.pool())
            .await?;
        Ok(existing)
    }
}
