//! Catalog persistence layer
//!
//! Repository and unit-of-work contracts for the catalog aggregates, with
//! PostgreSQL implementations. Writes from one request share a single
//! transaction that the unit of work commits; reads go straight to the pool.

pub mod db;
pub mod setup;

pub use db::{
    CastMemberRepository, CategoryRepository, GenreRepository, PgCastMemberRepository,
    PgCategoryRepository, PgGenreRepository, PgUnitOfWork, PgVideoRepository, UnitOfWork,
    VideoRepository,
};
pub use setup::setup_database;
