//! Catalog CLI: administer categories, genres, cast members and videos.
//!
//! Reads DATABASE_URL and the storage settings (STORAGE_BACKEND,
//! LOCAL_STORAGE_PATH, S3_BUCKET, ...) from the environment or a `.env` file.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use catalog_cli::{init_tracing, open_file, report_error, Catalog};
use catalog_core::models::{CastMemberType, MediaStatus, Rating, SearchInput, SearchOrder, VideoDetails};
use catalog_core::CatalogConfig;
use catalog_services::{
    CreateCastMemberInput, CreateCategoryInput, CreateGenreInput, CreateVideoInput, MediaFiles,
    UpdateCastMemberInput, UpdateCategoryInput, UpdateGenreInput, UpdateMediaStatusInput,
    UpdateVideoInput, UploadMediasInput,
};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "catalog", about = "Media catalog administration")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Category operations
    Category {
        #[command(subcommand)]
        sub: CategoryCommands,
    },
    /// Cast member operations
    CastMember {
        #[command(subcommand)]
        sub: CastMemberCommands,
    },
    /// Genre operations
    Genre {
        #[command(subcommand)]
        sub: GenreCommands,
    },
    /// Video operations
    Video {
        #[command(subcommand)]
        sub: VideoCommands,
    },
}

#[derive(Args)]
struct ListArgs {
    #[arg(long, default_value = "1")]
    page: u32,
    #[arg(long, default_value = "15")]
    per_page: u32,
    /// Case-insensitive text filter
    #[arg(long, default_value = "")]
    search: String,
    /// Column to sort by
    #[arg(long, default_value = "")]
    order_by: String,
    /// Sort descending
    #[arg(long)]
    desc: bool,
}

impl From<ListArgs> for SearchInput {
    fn from(args: ListArgs) -> Self {
        SearchInput {
            page: args.page,
            per_page: args.per_page,
            search: args.search,
            order_by: args.order_by,
            order: if args.desc {
                SearchOrder::Desc
            } else {
                SearchOrder::Asc
            },
        }
    }
}

#[derive(Subcommand)]
enum CategoryCommands {
    Create {
        name: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        inactive: bool,
    },
    Update {
        id: Uuid,
        name: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        active: Option<bool>,
    },
    Get {
        id: Uuid,
    },
    Delete {
        id: Uuid,
    },
    List(ListArgs),
}

#[derive(Subcommand)]
enum CastMemberCommands {
    Create {
        name: String,
        /// director or actor
        #[arg(long)]
        member_type: CastMemberType,
    },
    Update {
        id: Uuid,
        name: String,
        #[arg(long)]
        member_type: CastMemberType,
    },
    Get {
        id: Uuid,
    },
    Delete {
        id: Uuid,
    },
    List(ListArgs),
}

#[derive(Subcommand)]
enum GenreCommands {
    Create {
        name: String,
        #[arg(long)]
        inactive: bool,
        /// Category ids, comma separated
        #[arg(long, value_delimiter = ',')]
        categories: Vec<Uuid>,
    },
    Update {
        id: Uuid,
        name: String,
        #[arg(long)]
        active: Option<bool>,
        /// Replace the genre's categories (comma separated)
        #[arg(long, value_delimiter = ',', num_args = 0..)]
        categories: Option<Vec<Uuid>>,
    },
    Get {
        id: Uuid,
    },
    Delete {
        id: Uuid,
    },
    List(ListArgs),
}

#[derive(Args)]
struct DetailsArgs {
    #[arg(long)]
    title: String,
    #[arg(long)]
    description: String,
    #[arg(long)]
    year_launched: i32,
    #[arg(long)]
    opened: bool,
    #[arg(long)]
    published: bool,
    /// Duration in minutes
    #[arg(long)]
    duration: i32,
    /// ER, L, 10, 12, 14, 16 or 18
    #[arg(long)]
    rating: Rating,
}

impl From<DetailsArgs> for VideoDetails {
    fn from(args: DetailsArgs) -> Self {
        VideoDetails {
            title: args.title,
            description: args.description,
            year_launched: args.year_launched,
            opened: args.opened,
            published: args.published,
            duration: args.duration,
            rating: args.rating,
        }
    }
}

#[derive(Args)]
struct FileArgs {
    #[arg(long)]
    thumb: Option<PathBuf>,
    #[arg(long)]
    thumb_half: Option<PathBuf>,
    #[arg(long)]
    banner: Option<PathBuf>,
    #[arg(long)]
    trailer: Option<PathBuf>,
    #[arg(long)]
    media: Option<PathBuf>,
}

impl FileArgs {
    async fn open(self) -> anyhow::Result<MediaFiles> {
        async fn open_opt(path: Option<PathBuf>) -> anyhow::Result<Option<catalog_services::FileInput>> {
            match path {
                Some(path) => Ok(Some(open_file(&path).await?)),
                None => Ok(None),
            }
        }

        Ok(MediaFiles {
            thumb: open_opt(self.thumb).await?,
            thumb_half: open_opt(self.thumb_half).await?,
            banner: open_opt(self.banner).await?,
            trailer: open_opt(self.trailer).await?,
            media: open_opt(self.media).await?,
        })
    }
}

#[derive(Subcommand)]
enum VideoCommands {
    Create {
        #[command(flatten)]
        details: DetailsArgs,
        #[arg(long, value_delimiter = ',')]
        categories: Vec<Uuid>,
        #[arg(long, value_delimiter = ',')]
        genres: Vec<Uuid>,
        #[arg(long, value_delimiter = ',')]
        cast_members: Vec<Uuid>,
        #[command(flatten)]
        files: FileArgs,
    },
    Update {
        id: Uuid,
        #[command(flatten)]
        details: DetailsArgs,
        /// Replace categories; pass the flag with no value to clear them
        #[arg(long, value_delimiter = ',', num_args = 0..)]
        categories: Option<Vec<Uuid>>,
        #[arg(long, value_delimiter = ',', num_args = 0..)]
        genres: Option<Vec<Uuid>>,
        #[arg(long, value_delimiter = ',', num_args = 0..)]
        cast_members: Option<Vec<Uuid>>,
        #[command(flatten)]
        files: FileArgs,
    },
    /// Upload media files for an existing video
    UploadMedias {
        id: Uuid,
        #[command(flatten)]
        files: FileArgs,
    },
    /// Record the encoder's result for the main media
    UpdateMediaStatus {
        id: Uuid,
        /// processing, completed or error
        #[arg(long)]
        status: MediaStatus,
        #[arg(long)]
        encoded_path: Option<String>,
    },
    Get {
        id: Uuid,
    },
    Delete {
        id: Uuid,
    },
    List(ListArgs),
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize response")?;
    println!("{}", out);
    Ok(())
}

fn print_deleted(id: Uuid) -> anyhow::Result<()> {
    print_json(&serde_json::json!({ "deleted": id }))
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => report_error(&e),
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = CatalogConfig::from_env()?;
    let catalog = Catalog::connect(&config).await?;

    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, cancelling");
            ctrl_c.cancel();
        }
    });

    match cli.command {
        Commands::Category { sub } => {
            let service = &catalog.categories;
            match sub {
                CategoryCommands::Create {
                    name,
                    description,
                    inactive,
                } => {
                    let input = CreateCategoryInput {
                        name,
                        description,
                        is_active: !inactive,
                    };
                    print_json(&service.create(input, &cancel).await?)?;
                }
                CategoryCommands::Update {
                    id,
                    name,
                    description,
                    active,
                } => {
                    let input = UpdateCategoryInput {
                        id,
                        name,
                        description,
                        is_active: active,
                    };
                    print_json(&service.update(input, &cancel).await?)?;
                }
                CategoryCommands::Get { id } => print_json(&service.get(id, &cancel).await?)?,
                CategoryCommands::Delete { id } => {
                    service.delete(id, &cancel).await?;
                    print_deleted(id)?;
                }
                CategoryCommands::List(args) => {
                    print_json(&service.list(&args.into(), &cancel).await?)?
                }
            }
        }
        Commands::CastMember { sub } => {
            let service = &catalog.cast_members;
            match sub {
                CastMemberCommands::Create { name, member_type } => {
                    let input = CreateCastMemberInput { name, member_type };
                    print_json(&service.create(input, &cancel).await?)?;
                }
                CastMemberCommands::Update {
                    id,
                    name,
                    member_type,
                } => {
                    let input = UpdateCastMemberInput {
                        id,
                        name,
                        member_type,
                    };
                    print_json(&service.update(input, &cancel).await?)?;
                }
                CastMemberCommands::Get { id } => print_json(&service.get(id, &cancel).await?)?,
                CastMemberCommands::Delete { id } => {
                    service.delete(id, &cancel).await?;
                    print_deleted(id)?;
                }
                CastMemberCommands::List(args) => {
                    print_json(&service.list(&args.into(), &cancel).await?)?
                }
            }
        }
        Commands::Genre { sub } => {
            let service = &catalog.genres;
            match sub {
                GenreCommands::Create {
                    name,
                    inactive,
                    categories,
                } => {
                    let input = CreateGenreInput {
                        name,
                        is_active: !inactive,
                        categories_ids: categories,
                    };
                    print_json(&service.create(input, &cancel).await?)?;
                }
                GenreCommands::Update {
                    id,
                    name,
                    active,
                    categories,
                } => {
                    let input = UpdateGenreInput {
                        id,
                        name,
                        is_active: active,
                        categories_ids: categories,
                    };
                    print_json(&service.update(input, &cancel).await?)?;
                }
                GenreCommands::Get { id } => print_json(&service.get(id, &cancel).await?)?,
                GenreCommands::Delete { id } => {
                    service.delete(id, &cancel).await?;
                    print_deleted(id)?;
                }
                GenreCommands::List(args) => {
                    print_json(&service.list(&args.into(), &cancel).await?)?
                }
            }
        }
        Commands::Video { sub } => {
            let service = &catalog.videos;
            match sub {
                VideoCommands::Create {
                    details,
                    categories,
                    genres,
                    cast_members,
                    files,
                } => {
                    let input = CreateVideoInput {
                        details: details.into(),
                        categories_ids: categories,
                        genres_ids: genres,
                        cast_members_ids: cast_members,
                        files: files.open().await?,
                    };
                    print_json(&service.create(input, &cancel).await?)?;
                }
                VideoCommands::Update {
                    id,
                    details,
                    categories,
                    genres,
                    cast_members,
                    files,
                } => {
                    let input = UpdateVideoInput {
                        id,
                        details: details.into(),
                        categories_ids: categories,
                        genres_ids: genres,
                        cast_members_ids: cast_members,
                        files: files.open().await?,
                    };
                    print_json(&service.update(input, &cancel).await?)?;
                }
                VideoCommands::UploadMedias { id, files } => {
                    let input = UploadMediasInput {
                        video_id: id,
                        files: files.open().await?,
                    };
                    print_json(&service.upload_medias(input, &cancel).await?)?;
                }
                VideoCommands::UpdateMediaStatus {
                    id,
                    status,
                    encoded_path,
                } => {
                    let input = UpdateMediaStatusInput {
                        video_id: id,
                        status,
                        encoded_path,
                    };
                    print_json(&service.update_media_status(input, &cancel).await?)?;
                }
                VideoCommands::Get { id } => print_json(&service.get(id, &cancel).await?)?,
                VideoCommands::Delete { id } => {
                    service.delete(id, &cancel).await?;
                    print_deleted(id)?;
                }
                VideoCommands::List(args) => {
                    print_json(&service.list(&args.into(), &cancel).await?)?
                }
            }
        }
    }

    Ok(())
}
