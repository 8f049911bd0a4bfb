use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt::{Display, Formatter, Result as FmtResult};
use uuid::Uuid;

/// Kind of cross-aggregate reference held by a Video or Genre.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    Category,
    Genre,
    CastMember,
}

impl Display for RelationKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            RelationKind::Category => write!(f, "category"),
            RelationKind::Genre => write!(f, "genre"),
            RelationKind::CastMember => write!(f, "cast member"),
        }
    }
}

/// Set of related aggregate ids.
///
/// Tracks whether the membership was replaced since it was loaded from
/// storage, so an update only rewrites join rows for kinds the caller touched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RelationSet {
    ids: BTreeSet<Uuid>,
    #[serde(skip)]
    replaced: bool,
}

impl RelationSet {
    /// Membership as read from persisted join rows.
    pub fn loaded(ids: impl IntoIterator<Item = Uuid>) -> Self {
        Self {
            ids: ids.into_iter().collect(),
            replaced: false,
        }
    }

    pub fn add(&mut self, id: Uuid) {
        self.ids.insert(id);
        self.replaced = true;
    }

    pub fn remove(&mut self, id: &Uuid) {
        self.ids.remove(id);
        self.replaced = true;
    }

    pub fn clear(&mut self) {
        self.ids.clear();
        self.replaced = true;
    }

    /// Clear the set and fill it with `ids`, marking it replaced even when `ids` is empty.
    pub fn replace(&mut self, ids: impl IntoIterator<Item = Uuid>) {
        self.clear();
        for id in ids {
            self.add(id);
        }
    }

    pub fn contains(&self, id: &Uuid) -> bool {
        self.ids.contains(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Uuid> {
        self.ids.iter()
    }

    pub fn to_vec(&self) -> Vec<Uuid> {
        self.ids.iter().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn is_replaced(&self) -> bool {
        self.replaced
    }

    /// Forget pending replacement once join rows have been written.
    pub fn mark_persisted(&mut self) {
        self.replaced = false;
    }
}

impl PartialEq for RelationSet {
    fn eq(&self, other: &Self) -> bool {
        self.ids == other.ids
    }
}

impl Eq for RelationSet {}

impl FromIterator<Uuid> for RelationSet {
    fn from_iter<T: IntoIterator<Item = Uuid>>(iter: T) -> Self {
        Self::loaded(iter)
    }
}
