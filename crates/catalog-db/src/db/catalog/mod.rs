//! PostgreSQL repositories for the catalog aggregates

pub mod cast_member;
pub mod category;
pub mod genre;
pub mod video;

pub use cast_member::PgCastMemberRepository;
pub use category::PgCategoryRepository;
pub use genre::PgGenreRepository;
pub use video::PgVideoRepository;
