use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use catalog_core::{AppError, CatalogConfig, ErrorMetadata, LogLevel};
use catalog_db::{
    setup_database, PgCastMemberRepository, PgCategoryRepository, PgGenreRepository,
    PgUnitOfWork, PgVideoRepository,
};
use catalog_services::{
    CastMemberService, CategoryService, EncoderNotificationHandler, EventDispatcher, FileInput,
    GenreService, LoggingMessageProducer, MediaUploadOrchestrator, VideoService,
};
use catalog_storage::create_storage;

/// Initialize tracing for the CLI.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
}

/// Use cases wired to PostgreSQL and the configured storage backend.
///
/// One instance serves one command: its unit of work holds at most one open
/// transaction.
pub struct Catalog {
    pub categories: CategoryService,
    pub cast_members: CastMemberService,
    pub genres: GenreService,
    pub videos: VideoService,
}

impl Catalog {
    pub async fn connect(config: &CatalogConfig) -> anyhow::Result<Self> {
        tracing::info!(environment = %config.environment, "Connecting catalog");
        let pool = setup_database(config).await?;
        let storage = create_storage(config)
            .await
            .context("Failed to initialize storage")?;
        tracing::info!(backend = %storage.backend_type(), "Storage initialized");

        let dispatcher = EventDispatcher::new().with_handler(Arc::new(
            EncoderNotificationHandler::new(Arc::new(LoggingMessageProducer)),
        ));
        let uow = Arc::new(PgUnitOfWork::new(pool, Arc::new(dispatcher)));

        let categories = Arc::new(PgCategoryRepository::new(uow.clone()));
        let cast_members = Arc::new(PgCastMemberRepository::new(uow.clone()));
        let genres = Arc::new(PgGenreRepository::new(uow.clone()));
        let videos = Arc::new(PgVideoRepository::new(uow.clone()));

        Ok(Self {
            categories: CategoryService::new(categories.clone(), uow.clone()),
            cast_members: CastMemberService::new(cast_members.clone(), uow.clone()),
            genres: GenreService::new(genres.clone(), categories.clone(), uow.clone()),
            videos: VideoService::new(
                videos,
                categories,
                genres,
                cast_members,
                uow,
                MediaUploadOrchestrator::new(storage)
                    .with_max_upload_size(config.max_upload_size_bytes as u64),
            ),
        })
    }
}

/// Process exit code for a failed command.
///
/// Rejected input exits with 2, a missing aggregate with 3, an interrupted
/// command with 130 and everything else with 1.
pub fn exit_code(error: &anyhow::Error) -> u8 {
    let Some(app_error) = error.downcast_ref::<AppError>() else {
        return 1;
    };
    match app_error.http_status_code() {
        400 => 2,
        404 => 3,
        499 => 130,
        _ => 1,
    }
}

/// Log a failed command at its error's level and print the client message.
pub fn report_error(error: &anyhow::Error) -> ExitCode {
    match error.downcast_ref::<AppError>() {
        Some(app_error) => {
            let error_code = app_error.error_code();
            match app_error.log_level() {
                LogLevel::Debug => {
                    tracing::debug!(error = %app_error, error_code = error_code, "Command failed");
                }
                LogLevel::Warn => {
                    tracing::warn!(error = %app_error, error_code = error_code, "Command failed");
                }
                LogLevel::Error => {
                    tracing::error!(error = %app_error, error_code = error_code, "Command failed");
                }
            }
            eprintln!("error [{}]: {}", error_code, app_error.client_message());
        }
        None => {
            tracing::error!(error = %error, "Command failed");
            eprintln!("error: {:#}", error);
        }
    }
    ExitCode::from(exit_code(error))
}

/// Content type for a file extension; unknown extensions map to
/// `application/octet-stream`.
pub fn content_type_for(extension: &str) -> &'static str {
    match extension.to_lowercase().as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "mp4" => "video/mp4",
        "mov" => "video/quicktime",
        "webm" => "video/webm",
        "mkv" => "video/x-matroska",
        _ => "application/octet-stream",
    }
}

/// Open a local file as an upload input.
pub async fn open_file(path: &Path) -> anyhow::Result<FileInput> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or_default()
        .to_lowercase();
    let file = tokio::fs::File::open(path)
        .await
        .with_context(|| format!("Failed to open {}", path.display()))?;

    Ok(FileInput::new(
        extension.clone(),
        content_type_for(&extension),
        Box::pin(file),
    ))
}
