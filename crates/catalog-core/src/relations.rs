//! Join-row synchronization for many-to-many relations
//!
//! Relations are persisted as explicit `{parent_id, child_id}` rows. The
//! synchronizer turns an aggregate's in-memory relation sets into the list of
//! join-row writes a repository must stage next to the parent row:
//!
//! - on insert, one row per id for every non-empty set;
//! - on update, only sets that were replaced since load are rewritten, by
//!   deleting every row for `(parent, table)` and inserting the new membership.
//!
//! Sets that were not replaced produce no writes, so a relation omitted from an
//! update request keeps its persisted rows.

use uuid::Uuid;

use crate::models::{Genre, RelationKind, RelationSet, Video};

/// Join tables holding many-to-many relations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JoinTable {
    VideoCategory,
    VideoGenre,
    VideoCastMember,
    GenreCategory,
}

impl JoinTable {
    /// Kind of the child side of the relation.
    pub fn child_kind(&self) -> RelationKind {
        match self {
            JoinTable::VideoCategory | JoinTable::GenreCategory => RelationKind::Category,
            JoinTable::VideoGenre => RelationKind::Genre,
            JoinTable::VideoCastMember => RelationKind::CastMember,
        }
    }
}

/// A staged write against a join table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinRowChange {
    DeleteAll {
        table: JoinTable,
        parent_id: Uuid,
    },
    Insert {
        table: JoinTable,
        parent_id: Uuid,
        child_ids: Vec<Uuid>,
    },
}

impl JoinRowChange {
    pub fn table(&self) -> JoinTable {
        match self {
            JoinRowChange::DeleteAll { table, .. } | JoinRowChange::Insert { table, .. } => *table,
        }
    }
}

/// Relation sets of an aggregate, paired with the table each one lives in.
pub type Relations<'a> = Vec<(JoinTable, &'a RelationSet)>;

pub fn video_relations(video: &Video) -> Relations<'_> {
    vec![
        (JoinTable::VideoCategory, &video.categories),
        (JoinTable::VideoGenre, &video.genres),
        (JoinTable::VideoCastMember, &video.cast_members),
    ]
}

pub fn genre_relations(genre: &Genre) -> Relations<'_> {
    vec![(JoinTable::GenreCategory, &genre.categories)]
}

pub struct RelationSynchronizer;

impl RelationSynchronizer {
    /// Rows to create for a freshly inserted parent.
    pub fn sync_on_insert(parent_id: Uuid, relations: &[(JoinTable, &RelationSet)]) -> Vec<JoinRowChange> {
        relations
            .iter()
            .filter(|(_, set)| !set.is_empty())
            .map(|(table, set)| JoinRowChange::Insert {
                table: *table,
                parent_id,
                child_ids: set.to_vec(),
            })
            .collect()
    }

    /// Full replace of every relation set the caller touched.
    pub fn sync_on_update(parent_id: Uuid, relations: &[(JoinTable, &RelationSet)]) -> Vec<JoinRowChange> {
        let mut changes = Vec::new();
        for (table, set) in relations.iter().filter(|(_, set)| set.is_replaced()) {
            changes.push(JoinRowChange::DeleteAll {
                table: *table,
                parent_id,
            });
            if !set.is_empty() {
                changes.push(JoinRowChange::Insert {
                    table: *table,
                    parent_id,
                    child_ids: set.to_vec(),
                });
            }
        }
        changes
    }
}
