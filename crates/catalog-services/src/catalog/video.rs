//! Video use cases
//!
//! Create and update run a fixed sequence: scalar validation, relation
//! validation (categories, then genres, then cast members), aggregate
//! mutation, media upload, staging of the row and its join rows, commit.
//! The first failure ends the request. Any failure after the first upload,
//! cancellation included, deletes the files uploaded by this request before
//! the error is returned.

use catalog_core::models::{
    Media, MediaStatus, Rating, RelationKind, SearchInput, SearchOutput, Video, VideoDetails,
};
use catalog_core::{cancellable, ensure_not_cancelled, AppError};
use catalog_db::{
    CastMemberRepository, CategoryRepository, GenreRepository, UnitOfWork, VideoRepository,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::persist;
use crate::media_upload::{MediaFiles, MediaUploadOrchestrator, UploadLedger};
use crate::relation_validator::RelationValidator;

#[derive(Debug)]
pub struct CreateVideoInput {
    pub details: VideoDetails,
    pub categories_ids: Vec<Uuid>,
    pub genres_ids: Vec<Uuid>,
    pub cast_members_ids: Vec<Uuid>,
    pub files: MediaFiles,
}

/// Relation fields left `None` keep their persisted rows; `Some(vec![])`
/// clears them.
#[derive(Debug)]
pub struct UpdateVideoInput {
    pub id: Uuid,
    pub details: VideoDetails,
    pub categories_ids: Option<Vec<Uuid>>,
    pub genres_ids: Option<Vec<Uuid>>,
    pub cast_members_ids: Option<Vec<Uuid>>,
    pub files: MediaFiles,
}

#[derive(Debug)]
pub struct UploadMediasInput {
    pub video_id: Uuid,
    pub files: MediaFiles,
}

/// Encoder outcome for a video's main media.
#[derive(Debug, Clone)]
pub struct UpdateMediaStatusInput {
    pub video_id: Uuid,
    pub status: MediaStatus,
    pub encoded_path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VideoOutput {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub year_launched: i32,
    pub opened: bool,
    pub published: bool,
    pub duration: i32,
    pub rating: Rating,
    pub created_at: DateTime<Utc>,
    pub categories: Vec<Uuid>,
    pub genres: Vec<Uuid>,
    pub cast_members: Vec<Uuid>,
    pub thumb: Option<String>,
    pub thumb_half: Option<String>,
    pub banner: Option<String>,
    pub media: Option<Media>,
    pub trailer: Option<Media>,
}

impl From<Video> for VideoOutput {
    fn from(video: Video) -> Self {
        Self {
            categories: video.categories.to_vec(),
            genres: video.genres.to_vec(),
            cast_members: video.cast_members.to_vec(),
            thumb: video.thumb.map(|image| image.path),
            thumb_half: video.thumb_half.map(|image| image.path),
            banner: video.banner.map(|image| image.path),
            id: video.id,
            title: video.title,
            description: video.description,
            year_launched: video.year_launched,
            opened: video.opened,
            published: video.published,
            duration: video.duration,
            rating: video.rating,
            created_at: video.created_at,
            media: video.media,
            trailer: video.trailer,
        }
    }
}

/// Relation ids confirmed to exist; `None` for kinds the request left out.
#[derive(Debug, Default)]
struct ValidatedRelations {
    categories: Option<Vec<Uuid>>,
    genres: Option<Vec<Uuid>>,
    cast_members: Option<Vec<Uuid>>,
}

impl ValidatedRelations {
    fn apply(self, video: &mut Video) {
        if let Some(ids) = self.categories {
            video.remove_all_categories();
            ids.into_iter().for_each(|id| video.add_category(id));
        }
        if let Some(ids) = self.genres {
            video.remove_all_genres();
            ids.into_iter().for_each(|id| video.add_genre(id));
        }
        if let Some(ids) = self.cast_members {
            video.remove_all_cast_members();
            ids.into_iter().for_each(|id| video.add_cast_member(id));
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum WriteMode {
    Insert,
    Update,
}

fn mark_persisted(video: &mut Video) {
    video.clear_events();
    video.categories.mark_persisted();
    video.genres.mark_persisted();
    video.cast_members.mark_persisted();
}

/// Paths of every file a video references in storage.
fn stored_paths(video: &Video) -> Vec<String> {
    [&video.thumb, &video.thumb_half, &video.banner]
        .into_iter()
        .flatten()
        .map(|image| image.path.clone())
        .chain(
            [&video.media, &video.trailer]
                .into_iter()
                .flatten()
                .map(|media| media.file_path.clone()),
        )
        .collect()
}

#[derive(Clone)]
pub struct VideoService {
    videos: Arc<dyn VideoRepository>,
    categories: Arc<dyn CategoryRepository>,
    genres: Arc<dyn GenreRepository>,
    cast_members: Arc<dyn CastMemberRepository>,
    uow: Arc<dyn UnitOfWork>,
    uploads: MediaUploadOrchestrator,
}

impl VideoService {
    pub fn new(
        videos: Arc<dyn VideoRepository>,
        categories: Arc<dyn CategoryRepository>,
        genres: Arc<dyn GenreRepository>,
        cast_members: Arc<dyn CastMemberRepository>,
        uow: Arc<dyn UnitOfWork>,
        uploads: MediaUploadOrchestrator,
    ) -> Self {
        Self {
            videos,
            categories,
            genres,
            cast_members,
            uow,
            uploads,
        }
    }

    /// Validate each provided relation kind in turn; the first kind with a
    /// missing id fails the request and later kinds are not looked up.
    async fn validate_relations(
        &self,
        categories: Option<&[Uuid]>,
        genres: Option<&[Uuid]>,
        cast_members: Option<&[Uuid]>,
        cancel: &CancellationToken,
    ) -> Result<ValidatedRelations, AppError> {
        let mut validated = ValidatedRelations::default();

        if let Some(ids) = categories {
            validated.categories = Some(
                RelationValidator::validate(
                    RelationKind::Category,
                    ids,
                    self.categories.as_ref(),
                    cancel,
                )
                .await?,
            );
        }
        if let Some(ids) = genres {
            validated.genres = Some(
                RelationValidator::validate(
                    RelationKind::Genre,
                    ids,
                    self.genres.as_ref(),
                    cancel,
                )
                .await?,
            );
        }
        if let Some(ids) = cast_members {
            validated.cast_members = Some(
                RelationValidator::validate(
                    RelationKind::CastMember,
                    ids,
                    self.cast_members.as_ref(),
                    cancel,
                )
                .await?,
            );
        }

        Ok(validated)
    }

    async fn upload_and_persist(
        &self,
        video: &mut Video,
        files: MediaFiles,
        write: WriteMode,
        ledger: &mut UploadLedger,
        cancel: &CancellationToken,
    ) -> Result<(), AppError> {
        self.uploads.upload_all(video, files, ledger, cancel).await?;

        let video: &Video = video;
        match write {
            WriteMode::Insert => persist(self.uow.as_ref(), cancel, self.videos.insert(video)).await,
            WriteMode::Update => persist(self.uow.as_ref(), cancel, self.videos.update(video)).await,
        }
    }

    /// Upload `files`, then stage and commit the video. On failure every file
    /// uploaded here is deleted and the original error is returned.
    async fn store_with_uploads(
        &self,
        video: &mut Video,
        files: MediaFiles,
        write: WriteMode,
        cancel: &CancellationToken,
    ) -> Result<(), AppError> {
        let mut ledger = UploadLedger::default();

        match self
            .upload_and_persist(video, files, write, &mut ledger, cancel)
            .await
        {
            Ok(()) => {
                mark_persisted(video);
                Ok(())
            }
            Err(e) => {
                if !ledger.is_empty() {
                    tracing::warn!(
                        error = %e,
                        video_id = %video.id,
                        uploaded = ledger.len(),
                        "Reverting media uploads after failure"
                    );
                }
                self.uploads.compensate(&ledger).await;
                Err(e)
            }
        }
    }

    #[tracing::instrument(skip(self, input, cancel), fields(video.title = %input.details.title))]
    pub async fn create(
        &self,
        input: CreateVideoInput,
        cancel: &CancellationToken,
    ) -> Result<VideoOutput, AppError> {
        ensure_not_cancelled(cancel)?;
        let mut video = Video::new(input.details)?;

        let relations = self
            .validate_relations(
                Some(input.categories_ids.as_slice()),
                Some(input.genres_ids.as_slice()),
                Some(input.cast_members_ids.as_slice()),
                cancel,
            )
            .await?;
        relations.apply(&mut video);

        self.store_with_uploads(&mut video, input.files, WriteMode::Insert, cancel)
            .await?;

        tracing::info!(video_id = %video.id, "Video created");
        Ok(video.into())
    }

    #[tracing::instrument(skip(self, input, cancel), fields(video.id = %input.id))]
    pub async fn update(
        &self,
        input: UpdateVideoInput,
        cancel: &CancellationToken,
    ) -> Result<VideoOutput, AppError> {
        let mut video = cancellable(cancel, self.videos.get(input.id)).await?;
        video.update(input.details)?;

        let relations = self
            .validate_relations(
                input.categories_ids.as_deref(),
                input.genres_ids.as_deref(),
                input.cast_members_ids.as_deref(),
                cancel,
            )
            .await?;
        relations.apply(&mut video);

        self.store_with_uploads(&mut video, input.files, WriteMode::Update, cancel)
            .await?;

        tracing::info!(video_id = %video.id, "Video updated");
        Ok(video.into())
    }

    /// Store new media files for an existing video.
    #[tracing::instrument(skip(self, input, cancel), fields(video.id = %input.video_id))]
    pub async fn upload_medias(
        &self,
        input: UploadMediasInput,
        cancel: &CancellationToken,
    ) -> Result<VideoOutput, AppError> {
        if input.files.is_empty() {
            return Err(AppError::InvalidInput("No media files provided".to_string()));
        }

        let mut video = cancellable(cancel, self.videos.get(input.video_id)).await?;
        self.store_with_uploads(&mut video, input.files, WriteMode::Update, cancel)
            .await?;
        Ok(video.into())
    }

    /// Record the encoder's outcome on the main media.
    #[tracing::instrument(skip(self, input, cancel), fields(video.id = %input.video_id, media.status = %input.status))]
    pub async fn update_media_status(
        &self,
        input: UpdateMediaStatusInput,
        cancel: &CancellationToken,
    ) -> Result<VideoOutput, AppError> {
        let mut video = cancellable(cancel, self.videos.get(input.video_id)).await?;

        match input.status {
            MediaStatus::Completed => {
                let encoded_path = input
                    .encoded_path
                    .filter(|path| !path.trim().is_empty())
                    .ok_or_else(|| {
                        AppError::InvalidInput(
                            "Encoded path is required for completed media".to_string(),
                        )
                    })?;
                video.update_as_encoded(encoded_path)?;
            }
            MediaStatus::Processing => video.update_as_sent_to_encode()?,
            MediaStatus::Error => video.update_as_encoding_error()?,
            MediaStatus::Pending => {
                return Err(AppError::InvalidInput(
                    "Media status cannot be reset to pending".to_string(),
                ))
            }
        }

        persist(self.uow.as_ref(), cancel, self.videos.update(&video)).await?;
        mark_persisted(&mut video);
        Ok(video.into())
    }

    pub async fn get(&self, id: Uuid, cancel: &CancellationToken) -> Result<VideoOutput, AppError> {
        let video = cancellable(cancel, self.videos.get(id)).await?;
        Ok(video.into())
    }

    /// Delete the video and its join rows, then its stored files. File
    /// removal runs after the commit and is best-effort.
    #[tracing::instrument(skip(self, cancel))]
    pub async fn delete(&self, id: Uuid, cancel: &CancellationToken) -> Result<(), AppError> {
        let video = cancellable(cancel, self.videos.get(id)).await?;
        persist(self.uow.as_ref(), cancel, self.videos.delete(&video)).await?;

        self.uploads.remove_stored(stored_paths(&video)).await;
        tracing::info!(video_id = %id, "Video deleted");
        Ok(())
    }

    pub async fn list(
        &self,
        input: &SearchInput,
        cancel: &CancellationToken,
    ) -> Result<SearchOutput<VideoOutput>, AppError> {
        let page = cancellable(cancel, self.videos.search(input)).await?;
        Ok(page.map(VideoOutput::from))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{file, file_of_size, InMemoryCatalog, MockStorage};
    use catalog_core::models::SearchOrder;
    use catalog_core::{DomainEvent, JoinTable};
    use std::collections::BTreeSet;

    struct Fixture {
        catalog: Arc<InMemoryCatalog>,
        storage: Arc<MockStorage>,
        service: VideoService,
    }

    fn fixture() -> Fixture {
        let catalog = InMemoryCatalog::new();
        let storage = Arc::new(MockStorage::new());
        let service = VideoService::new(
            catalog.clone(),
            catalog.clone(),
            catalog.clone(),
            catalog.clone(),
            catalog.clone(),
            MediaUploadOrchestrator::new(storage.clone()),
        );
        Fixture {
            catalog,
            storage,
            service,
        }
    }

    fn details(title: &str) -> VideoDetails {
        VideoDetails {
            title: title.to_string(),
            description: "A computer hacker learns about the true nature of reality".to_string(),
            year_launched: 1999,
            opened: false,
            published: true,
            duration: 136,
            rating: Rating::Rate14,
        }
    }

    fn create_input(categories_ids: Vec<Uuid>) -> CreateVideoInput {
        CreateVideoInput {
            details: details("Matrix"),
            categories_ids,
            genres_ids: Vec::new(),
            cast_members_ids: Vec::new(),
            files: MediaFiles::default(),
        }
    }

    fn update_input(id: Uuid) -> UpdateVideoInput {
        UpdateVideoInput {
            id,
            details: details("Matrix Reloaded"),
            categories_ids: None,
            genres_ids: None,
            cast_members_ids: None,
            files: MediaFiles::default(),
        }
    }

    fn all_files() -> MediaFiles {
        MediaFiles {
            thumb: Some(file("jpg")),
            thumb_half: Some(file("jpg")),
            banner: Some(file("png")),
            trailer: Some(file("mp4")),
            media: Some(file("mp4")),
        }
    }

    fn set(ids: &[Uuid]) -> BTreeSet<Uuid> {
        ids.iter().copied().collect()
    }

    #[tokio::test]
    async fn test_create_with_relations_and_media() {
        let f = fixture();
        let categories = f.catalog.seed_categories(2);
        let genres = f.catalog.seed_genres(1);
        let cast_members = f.catalog.seed_cast_members(3);

        let output = f
            .service
            .create(
                CreateVideoInput {
                    details: details("Matrix"),
                    categories_ids: categories.clone(),
                    genres_ids: genres.clone(),
                    cast_members_ids: cast_members.clone(),
                    files: MediaFiles {
                        thumb: Some(file("jpg")),
                        media: Some(file("mp4")),
                        ..Default::default()
                    },
                },
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        assert_eq!(set(&output.categories), set(&categories));
        assert_eq!(f.catalog.join_rows(JoinTable::VideoCategory, output.id), set(&categories));
        assert_eq!(f.catalog.join_rows(JoinTable::VideoGenre, output.id), set(&genres));
        assert_eq!(
            f.catalog.join_rows(JoinTable::VideoCastMember, output.id),
            set(&cast_members)
        );
        assert_eq!(output.thumb, Some(format!("{}-thumb.jpg", output.id)));
        assert_eq!(output.media.as_ref().unwrap().status, MediaStatus::Pending);

        let published = f.catalog.published();
        assert_eq!(published.len(), 1);
        assert!(matches!(
            &published[0],
            DomainEvent::VideoUploaded { resource_id, file_path, .. }
                if *resource_id == output.id && *file_path == format!("{}-media.mp4", output.id)
        ));
    }

    #[tokio::test]
    async fn test_missing_category_persists_nothing() {
        let f = fixture();
        let cat_x = f.catalog.seed_categories(1)[0];
        let cat_y = Uuid::new_v4();

        let mut input = create_input(vec![cat_x, cat_y]);
        input.files.thumb = Some(file("jpg"));
        let err = f
            .service
            .create(input, &CancellationToken::new())
            .await
            .unwrap_err();

        match &err {
            AppError::RelatedAggregate { kind, missing } => {
                assert_eq!(*kind, RelationKind::Category);
                assert_eq!(missing.0, vec![cat_y]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(err.to_string().contains(&cat_y.to_string()));
        assert!(!err.to_string().contains(&cat_x.to_string()));
        assert_eq!(f.catalog.video_count(), 0);
        assert_eq!(f.catalog.join_row_count(JoinTable::VideoCategory), 0);
        assert_eq!(f.catalog.commit_count(), 0);
        assert!(f.storage.uploaded_keys().is_empty());
    }

    #[tokio::test]
    async fn test_category_error_wins_over_genre_error() {
        let f = fixture();
        let mut input = create_input(vec![Uuid::new_v4()]);
        input.genres_ids = vec![Uuid::new_v4()];

        let err = f
            .service
            .create(input, &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            AppError::RelatedAggregate {
                kind: RelationKind::Category,
                ..
            }
        ));
        assert_eq!(f.catalog.lookups(), vec!["category"]);
    }

    #[tokio::test]
    async fn test_relation_kinds_are_checked_in_order() {
        let f = fixture();
        let mut input = create_input(f.catalog.seed_categories(1));
        input.genres_ids = f.catalog.seed_genres(1);
        input.cast_members_ids = vec![Uuid::new_v4()];

        let err = f
            .service
            .create(input, &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            AppError::RelatedAggregate {
                kind: RelationKind::CastMember,
                ..
            }
        ));
        assert_eq!(f.catalog.lookups(), vec!["category", "genre", "cast_member"]);
        assert_eq!(f.catalog.video_count(), 0);
    }

    #[tokio::test]
    async fn test_invalid_title_fails_before_relation_lookup() {
        let f = fixture();
        let mut input = create_input(vec![Uuid::new_v4()]);
        input.details.title = String::new();

        let result = f.service.create(input, &CancellationToken::new()).await;

        assert!(matches!(result, Err(AppError::EntityValidation(_))));
        assert!(f.catalog.lookups().is_empty());
    }

    #[tokio::test]
    async fn test_update_with_empty_list_clears_only_that_kind() {
        let f = fixture();
        let cancel = CancellationToken::new();
        let categories = f.catalog.seed_categories(2);
        let genres = f.catalog.seed_genres(2);
        let mut input = create_input(categories.clone());
        input.genres_ids = genres.clone();
        let created = f.service.create(input, &cancel).await.unwrap();

        let mut update = update_input(created.id);
        update.categories_ids = Some(Vec::new());
        let updated = f.service.update(update, &cancel).await.unwrap();

        assert!(updated.categories.is_empty());
        assert!(f.catalog.join_rows(JoinTable::VideoCategory, created.id).is_empty());
        assert_eq!(f.catalog.join_rows(JoinTable::VideoGenre, created.id), set(&genres));
        assert_eq!(updated.title, "Matrix Reloaded");
    }

    #[tokio::test]
    async fn test_update_with_omitted_relations_keeps_rows() {
        let f = fixture();
        let cancel = CancellationToken::new();
        let categories = f.catalog.seed_categories(2);
        let cast_members = f.catalog.seed_cast_members(1);
        let mut input = create_input(categories.clone());
        input.cast_members_ids = cast_members.clone();
        let created = f.service.create(input, &cancel).await.unwrap();

        let updated = f.service.update(update_input(created.id), &cancel).await.unwrap();

        assert_eq!(set(&updated.categories), set(&categories));
        assert_eq!(f.catalog.join_rows(JoinTable::VideoCategory, created.id), set(&categories));
        assert_eq!(
            f.catalog.join_rows(JoinTable::VideoCastMember, created.id),
            set(&cast_members)
        );
    }

    #[tokio::test]
    async fn test_update_replaces_relation_set() {
        let f = fixture();
        let cancel = CancellationToken::new();
        let categories = f.catalog.seed_categories(3);
        let created = f
            .service
            .create(create_input(categories[..2].to_vec()), &cancel)
            .await
            .unwrap();

        let mut update = update_input(created.id);
        update.categories_ids = Some(vec![categories[2]]);
        f.service.update(update, &cancel).await.unwrap();

        assert_eq!(
            f.catalog.join_rows(JoinTable::VideoCategory, created.id),
            set(&categories[2..])
        );
    }

    #[tokio::test]
    async fn test_commit_failure_deletes_every_upload() {
        let f = fixture();
        f.catalog.fail_commits();
        let mut input = create_input(Vec::new());
        input.files = all_files();

        let result = f.service.create(input, &CancellationToken::new()).await;

        assert!(matches!(result, Err(AppError::Internal(_))));
        let uploaded = f.storage.uploaded_keys();
        assert_eq!(uploaded.len(), 5);
        assert_eq!(f.storage.deleted_paths(), uploaded);
        assert_eq!(f.catalog.video_count(), 0);
        assert!(f.catalog.published().is_empty());
    }

    #[tokio::test]
    async fn test_thumb_only_commit_failure_deletes_thumb_only() {
        let f = fixture();
        f.catalog.fail_commits();
        let mut input = create_input(Vec::new());
        input.files.thumb = Some(file("jpg"));

        let result = f.service.create(input, &CancellationToken::new()).await;

        assert!(result.is_err());
        let uploaded = f.storage.uploaded_keys();
        assert_eq!(uploaded.len(), 1);
        assert!(uploaded[0].ends_with("-thumb.jpg"));
        assert_eq!(f.storage.delete_attempts(), uploaded);
    }

    #[tokio::test]
    async fn test_upload_failure_deletes_earlier_uploads() {
        let f = fixture();
        let cancel = CancellationToken::new();
        let created = f.service.create(create_input(Vec::new()), &cancel).await.unwrap();
        f.storage.fail_upload(&format!("{}-trailer.mp4", created.id));

        let mut files = all_files();
        files.thumb = None;
        let err = f
            .service
            .upload_medias(
                UploadMediasInput {
                    video_id: created.id,
                    files,
                },
                &cancel,
            )
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Storage(_)));
        assert_eq!(
            f.storage.deleted_paths(),
            vec![
                format!("{}-thumbhalf.jpg", created.id),
                format!("{}-banner.png", created.id),
            ]
        );
        let stored = f.service.get(created.id, &cancel).await.unwrap();
        assert!(stored.banner.is_none());
    }

    #[tokio::test]
    async fn test_oversized_file_deletes_earlier_uploads() {
        let catalog = InMemoryCatalog::new();
        let storage = Arc::new(MockStorage::new());
        let service = VideoService::new(
            catalog.clone(),
            catalog.clone(),
            catalog.clone(),
            catalog.clone(),
            catalog.clone(),
            MediaUploadOrchestrator::new(storage.clone()).with_max_upload_size(16),
        );
        let mut input = create_input(Vec::new());
        input.files.thumb = Some(file_of_size("jpg", 16));
        input.files.banner = Some(file_of_size("png", 17));

        let err = service
            .create(input, &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::InvalidInput(_)));
        let uploaded = storage.uploaded_keys();
        assert_eq!(uploaded.len(), 1);
        assert!(uploaded[0].ends_with("-thumb.jpg"));
        assert_eq!(storage.deleted_paths(), uploaded);
        assert_eq!(catalog.video_count(), 0);
    }

    #[tokio::test]
    async fn test_cancellation_after_upload_compensates() {
        let f = fixture();
        let cancel = CancellationToken::new();
        f.storage.cancel_after_upload(cancel.clone());
        let mut input = create_input(Vec::new());
        input.files.banner = Some(file("png"));

        let result = f.service.create(input, &cancel).await;

        assert!(matches!(result, Err(AppError::Cancelled)));
        let uploaded = f.storage.uploaded_keys();
        assert_eq!(uploaded.len(), 1);
        assert_eq!(f.storage.deleted_paths(), uploaded);
        assert_eq!(f.catalog.video_count(), 0);
    }

    #[tokio::test]
    async fn test_cancellation_during_commit_keeps_uploads() {
        let f = fixture();
        let cancel = CancellationToken::new();
        f.catalog.cancel_during_commit(cancel.clone());
        let mut input = create_input(Vec::new());
        input.files.thumb = Some(file("jpg"));
        input.files.media = Some(file("mp4"));

        let output = f.service.create(input, &cancel).await.unwrap();

        assert!(cancel.is_cancelled());
        assert_eq!(f.catalog.video_count(), 1);
        assert!(f.storage.delete_attempts().is_empty());
        assert!(f.storage.has_file(&format!("{}-thumb.jpg", output.id)));
        assert_eq!(f.catalog.published().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_compensation_keeps_original_error() {
        let f = fixture();
        let cancel = CancellationToken::new();
        let created = f.service.create(create_input(Vec::new()), &cancel).await.unwrap();
        let thumb_key = format!("{}-thumb.jpg", created.id);
        let media_key = format!("{}-media.mp4", created.id);
        f.storage.fail_delete(&thumb_key);
        f.catalog.fail_commits();

        let result = f
            .service
            .upload_medias(
                UploadMediasInput {
                    video_id: created.id,
                    files: MediaFiles {
                        thumb: Some(file("jpg")),
                        media: Some(file("mp4")),
                        ..Default::default()
                    },
                },
                &cancel,
            )
            .await;

        assert!(matches!(result, Err(AppError::Internal(ref message)) if message == "commit failed"));
        assert_eq!(f.storage.delete_attempts(), vec![thumb_key, media_key.clone()]);
        assert_eq!(f.storage.deleted_paths(), vec![media_key]);
        assert!(f.catalog.published().is_empty());
    }

    #[tokio::test]
    async fn test_upload_medias_sets_media_and_publishes() {
        let f = fixture();
        let cancel = CancellationToken::new();
        let created = f.service.create(create_input(Vec::new()), &cancel).await.unwrap();

        let output = f
            .service
            .upload_medias(
                UploadMediasInput {
                    video_id: created.id,
                    files: MediaFiles {
                        media: Some(file("mp4")),
                        trailer: Some(file("mp4")),
                        ..Default::default()
                    },
                },
                &cancel,
            )
            .await
            .unwrap();

        assert_eq!(
            output.trailer.as_ref().unwrap().file_path,
            format!("{}-trailer.mp4", created.id)
        );
        let stored = f.service.get(created.id, &cancel).await.unwrap();
        assert_eq!(stored.media, output.media);
        assert_eq!(f.catalog.published().len(), 1);
    }

    #[tokio::test]
    async fn test_upload_medias_requires_files() {
        let f = fixture();
        let result = f
            .service
            .upload_medias(
                UploadMediasInput {
                    video_id: Uuid::new_v4(),
                    files: MediaFiles::default(),
                },
                &CancellationToken::new(),
            )
            .await;
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_media_status_transitions() {
        let f = fixture();
        let cancel = CancellationToken::new();
        let mut input = create_input(Vec::new());
        input.files.media = Some(file("mp4"));
        let created = f.service.create(input, &cancel).await.unwrap();

        let missing_path = f
            .service
            .update_media_status(
                UpdateMediaStatusInput {
                    video_id: created.id,
                    status: MediaStatus::Completed,
                    encoded_path: None,
                },
                &cancel,
            )
            .await;
        assert!(matches!(missing_path, Err(AppError::InvalidInput(_))));

        let encoded = f
            .service
            .update_media_status(
                UpdateMediaStatusInput {
                    video_id: created.id,
                    status: MediaStatus::Completed,
                    encoded_path: Some("encoded/matrix.m3u8".to_string()),
                },
                &cancel,
            )
            .await
            .unwrap();
        let media = encoded.media.unwrap();
        assert_eq!(media.status, MediaStatus::Completed);
        assert_eq!(media.encoded_path.as_deref(), Some("encoded/matrix.m3u8"));

        let failed = f
            .service
            .update_media_status(
                UpdateMediaStatusInput {
                    video_id: created.id,
                    status: MediaStatus::Error,
                    encoded_path: None,
                },
                &cancel,
            )
            .await
            .unwrap();
        assert_eq!(failed.media.unwrap().status, MediaStatus::Error);
    }

    #[tokio::test]
    async fn test_media_status_without_media_is_entity_validation() {
        let f = fixture();
        let cancel = CancellationToken::new();
        let created = f.service.create(create_input(Vec::new()), &cancel).await.unwrap();

        let result = f
            .service
            .update_media_status(
                UpdateMediaStatusInput {
                    video_id: created.id,
                    status: MediaStatus::Processing,
                    encoded_path: None,
                },
                &cancel,
            )
            .await;
        assert!(matches!(result, Err(AppError::EntityValidation(_))));
    }

    #[tokio::test]
    async fn test_delete_removes_rows_and_files() {
        let f = fixture();
        let cancel = CancellationToken::new();
        let mut input = create_input(f.catalog.seed_categories(2));
        input.files.thumb = Some(file("jpg"));
        input.files.trailer = Some(file("mp4"));
        let created = f.service.create(input, &cancel).await.unwrap();

        f.service.delete(created.id, &cancel).await.unwrap();

        assert_eq!(f.catalog.video_count(), 0);
        assert_eq!(f.catalog.join_row_count(JoinTable::VideoCategory), 0);
        assert_eq!(f.storage.deleted_paths().len(), 2);
        assert!(matches!(
            f.service.get(created.id, &cancel).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_list_searches_titles() {
        let f = fixture();
        let cancel = CancellationToken::new();
        f.service.create(create_input(Vec::new()), &cancel).await.unwrap();
        let mut other = create_input(Vec::new());
        other.details.title = "Inception".to_string();
        f.service.create(other, &cancel).await.unwrap();

        let page = f
            .service
            .list(
                &SearchInput {
                    search: "matr".to_string(),
                    ..Default::default()
                },
                &cancel,
            )
            .await
            .unwrap();

        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].title, "Matrix");
    }

    #[tokio::test]
    async fn test_list_sorts_by_title_or_creation() {
        let f = fixture();
        let cancel = CancellationToken::new();
        f.service.create(create_input(Vec::new()), &cancel).await.unwrap();
        let mut older = create_input(Vec::new());
        older.details.title = "Metropolis".to_string();
        older.details.year_launched = 1927;
        f.service.create(older, &cancel).await.unwrap();

        let titles = |page: SearchOutput<VideoOutput>| {
            page.items.into_iter().map(|v| v.title).collect::<Vec<_>>()
        };

        let by_title = f
            .service
            .list(
                &SearchInput {
                    order_by: "Title".to_string(),
                    order: SearchOrder::Desc,
                    ..Default::default()
                },
                &cancel,
            )
            .await
            .unwrap();
        assert_eq!(titles(by_title), vec!["Metropolis", "Matrix"]);

        let by_year = f
            .service
            .list(
                &SearchInput {
                    order_by: "year_launched".to_string(),
                    ..Default::default()
                },
                &cancel,
            )
            .await
            .unwrap();
        assert_eq!(titles(by_year), vec!["Matrix", "Metropolis"]);
    }
}
