//! Database repositories for the data access layer
//!
//! `repositories` holds the contracts the services depend on. `catalog` holds
//! their PostgreSQL implementations, which stage writes in the shared
//! transaction of a `PgUnitOfWork`.
//
// Repository and unit-of-work contracts
pub mod repositories;
//
// PostgreSQL repositories
pub mod catalog;
//
// Request-scoped transaction
pub mod transaction;
//
// Join-row writes and search helpers
mod join_rows;
mod search;

pub use catalog::{
    PgCastMemberRepository, PgCategoryRepository, PgGenreRepository, PgVideoRepository,
};
pub use repositories::{
    CastMemberRepository, CategoryRepository, GenreRepository, UnitOfWork, VideoRepository,
};
pub use transaction::PgUnitOfWork;
