//! Domain models for the catalog
//!
//! Aggregates (Category, Genre, CastMember, Video), their value objects and
//! the pagination types shared by list operations.

mod cast_member;
mod category;
mod genre;
mod relation;
mod search;
mod video;

pub use cast_member::*;
pub use category::*;
pub use genre::*;
pub use relation::*;
pub use search::*;
pub use video::*;
