//! Catalog service layer
//!
//! Use cases for categories, genres, cast members and videos. Each write
//! validates the aggregate and its relation ids, uploads media where the
//! request carries files, and commits through a [`catalog_db::UnitOfWork`].
//! Uploaded files are deleted again when the write does not commit.

pub mod catalog;
pub mod events;
pub mod media_upload;
pub mod relation_validator;

#[cfg(test)]
pub mod test_helpers;

pub use catalog::cast_member::{
    CastMemberOutput, CastMemberService, CreateCastMemberInput, UpdateCastMemberInput,
};
pub use catalog::category::{
    CategoryOutput, CategoryService, CreateCategoryInput, UpdateCategoryInput,
};
pub use catalog::genre::{CreateGenreInput, GenreOutput, GenreService, UpdateGenreInput};
pub use catalog::video::{
    CreateVideoInput, UpdateMediaStatusInput, UpdateVideoInput, UploadMediasInput, VideoOutput,
    VideoService,
};
pub use events::{
    DomainEventHandler, EncoderNotificationHandler, EventDispatcher, LoggingMessageProducer,
    MessageProducer, ENCODER_TOPIC,
};
pub use media_upload::{FileInput, MediaFiles, MediaSlot, MediaUploadOrchestrator, UploadLedger};
pub use relation_validator::{IdLookup, RelationValidator};
