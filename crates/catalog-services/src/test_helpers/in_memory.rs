//! In-memory catalog store for use-case tests
//!
//! Writes go to a pending copy of the tables that replaces the committed copy
//! on `commit`, so tests observe the same atomicity as the PostgreSQL unit of
//! work. Reads always see committed state.

use async_trait::async_trait;
use catalog_core::models::{
    CastMember, Category, Genre, RelationSet, SearchInput, SearchOrder, SearchOutput, Video,
};
use catalog_core::relations::{genre_relations, video_relations};
use catalog_core::{
    ensure_not_cancelled, AppError, DomainEvent, DomainEventPublisher, JoinRowChange, JoinTable,
    RelationSynchronizer,
};
use catalog_db::{
    CastMemberRepository, CategoryRepository, GenreRepository, UnitOfWork, VideoRepository,
};
use chrono::{DateTime, Utc};
use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

#[derive(Clone, Default)]
struct Tables {
    categories: HashMap<Uuid, Category>,
    genres: HashMap<Uuid, Genre>,
    cast_members: HashMap<Uuid, CastMember>,
    videos: HashMap<Uuid, Video>,
    join_rows: HashMap<JoinTable, BTreeSet<(Uuid, Uuid)>>,
}

impl Tables {
    fn apply(&mut self, changes: &[JoinRowChange]) {
        for change in changes {
            match change {
                JoinRowChange::DeleteAll { table, parent_id } => {
                    self.join_rows
                        .entry(*table)
                        .or_default()
                        .retain(|(parent, _)| parent != parent_id);
                }
                JoinRowChange::Insert {
                    table,
                    parent_id,
                    child_ids,
                } => {
                    let rows = self.join_rows.entry(*table).or_default();
                    for child_id in child_ids {
                        rows.insert((*parent_id, *child_id));
                    }
                }
            }
        }
    }

    fn delete_by_child(&mut self, table: JoinTable, child_id: Uuid) {
        self.join_rows
            .entry(table)
            .or_default()
            .retain(|(_, child)| *child != child_id);
    }

    fn children(&self, table: JoinTable, parent_id: Uuid) -> RelationSet {
        RelationSet::loaded(
            self.join_rows
                .get(&table)
                .into_iter()
                .flatten()
                .filter(|(parent, _)| *parent == parent_id)
                .map(|(_, child)| *child),
        )
    }

    fn hydrate_genre(&self, genre: &Genre) -> Genre {
        let mut genre = genre.clone();
        genre.categories = self.children(JoinTable::GenreCategory, genre.id);
        genre
    }

    fn hydrate_video(&self, video: &Video) -> Video {
        let mut video = video.clone();
        video.clear_events();
        video.categories = self.children(JoinTable::VideoCategory, video.id);
        video.genres = self.children(JoinTable::VideoGenre, video.id);
        video.cast_members = self.children(JoinTable::VideoCastMember, video.id);
        video
    }
}

/// Records every event published after a commit
#[derive(Default)]
pub struct RecordingPublisher {
    events: Mutex<Vec<DomainEvent>>,
}

impl RecordingPublisher {
    pub fn published(&self) -> Vec<DomainEvent> {
        self.events.lock().unwrap().clone()
    }
}

#[async_trait]
impl DomainEventPublisher for RecordingPublisher {
    async fn publish(&self, event: &DomainEvent) -> Result<(), AppError> {
        self.events.lock().unwrap().push(event.clone());
        Ok(())
    }
}

/// Shared in-memory store implementing every repository and the unit of work
#[derive(Default)]
pub struct InMemoryCatalog {
    committed: Mutex<Tables>,
    pending: Mutex<Option<Tables>>,
    events: Mutex<Vec<DomainEvent>>,
    fail_commit: AtomicBool,
    cancel_during_commit: Mutex<Option<CancellationToken>>,
    commits: AtomicUsize,
    lookups: Mutex<Vec<&'static str>>,
    publisher: RecordingPublisher,
}

impl InMemoryCatalog {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Make every following commit fail.
    pub fn fail_commits(&self) {
        self.fail_commit.store(true, Ordering::SeqCst);
    }

    /// Fire `token` once the next commit has applied its writes.
    pub fn cancel_during_commit(&self, token: CancellationToken) {
        *self.cancel_during_commit.lock().unwrap() = Some(token);
    }

    pub fn commit_count(&self) -> usize {
        self.commits.load(Ordering::SeqCst)
    }

    /// Relation kinds looked up through `get_ids_by_ids`, in call order.
    pub fn lookups(&self) -> Vec<&'static str> {
        self.lookups.lock().unwrap().clone()
    }

    pub fn published(&self) -> Vec<DomainEvent> {
        self.publisher.published()
    }

    /// Committed join rows of one parent.
    pub fn join_rows(&self, table: JoinTable, parent_id: Uuid) -> BTreeSet<Uuid> {
        self.committed
            .lock()
            .unwrap()
            .children(table, parent_id)
            .iter()
            .copied()
            .collect()
    }

    pub fn join_row_count(&self, table: JoinTable) -> usize {
        self.committed
            .lock()
            .unwrap()
            .join_rows
            .get(&table)
            .map(BTreeSet::len)
            .unwrap_or(0)
    }

    pub fn video_count(&self) -> usize {
        self.committed.lock().unwrap().videos.len()
    }

    pub fn genre_count(&self) -> usize {
        self.committed.lock().unwrap().genres.len()
    }

    /// Seed committed categories directly.
    pub fn seed_categories(&self, count: usize) -> Vec<Uuid> {
        (0..count)
            .map(|i| {
                let category =
                    Category::new(format!("Category {}", i), String::new(), true).unwrap();
                let id = category.id;
                self.committed.lock().unwrap().categories.insert(id, category);
                id
            })
            .collect()
    }

    pub fn seed_genres(&self, count: usize) -> Vec<Uuid> {
        (0..count)
            .map(|i| {
                let genre = Genre::new(format!("Genre {}", i), true).unwrap();
                let id = genre.id;
                self.committed.lock().unwrap().genres.insert(id, genre);
                id
            })
            .collect()
    }

    pub fn seed_cast_members(&self, count: usize) -> Vec<Uuid> {
        (0..count)
            .map(|i| {
                let cast_member = CastMember::new(
                    format!("Actor {}", i),
                    catalog_core::models::CastMemberType::Actor,
                )
                .unwrap();
                let id = cast_member.id;
                self.committed
                    .lock()
                    .unwrap()
                    .cast_members
                    .insert(id, cast_member);
                id
            })
            .collect()
    }

    fn stage<R>(&self, f: impl FnOnce(&mut Tables) -> Result<R, AppError>) -> Result<R, AppError> {
        let mut pending = self.pending.lock().unwrap();
        if pending.is_none() {
            *pending = Some(self.committed.lock().unwrap().clone());
        }
        match pending.as_mut() {
            Some(tables) => f(tables),
            None => Err(AppError::Internal("no pending transaction".to_string())),
        }
    }

    fn read<R>(&self, f: impl FnOnce(&Tables) -> R) -> R {
        f(&self.committed.lock().unwrap())
    }

    fn existing_ids<T>(
        &self,
        kind: &'static str,
        ids: &[Uuid],
        table: impl Fn(&Tables) -> &HashMap<Uuid, T>,
    ) -> Vec<Uuid> {
        self.lookups.lock().unwrap().push(kind);
        self.read(|tables| {
            let rows = table(tables);
            ids.iter().filter(|id| rows.contains_key(*id)).copied().collect()
        })
    }
}

/// Filter and sort like the PostgreSQL repositories: `text_column` and
/// `created_at` are the only sortable columns, anything else sorts by
/// `created_at`.
fn paginate<T>(
    input: &SearchInput,
    mut items: Vec<T>,
    text_column: &str,
    text: impl Fn(&T) -> &str,
    created_at: impl Fn(&T) -> DateTime<Utc>,
) -> SearchOutput<T> {
    if let Some(term) = input.search_term() {
        let term = term.to_lowercase();
        items.retain(|item| text(item).to_lowercase().contains(&term));
    }
    if input.order_by.trim().to_lowercase() == text_column {
        items.sort_by(|a, b| text(a).cmp(text(b)));
    } else {
        items.sort_by_key(|item| created_at(item));
    }
    if input.order == SearchOrder::Desc {
        items.reverse();
    }

    let total = items.len() as u64;
    let items = items
        .into_iter()
        .skip(input.offset() as usize)
        .take(input.per_page() as usize)
        .collect();
    SearchOutput {
        current_page: input.page(),
        per_page: input.per_page(),
        total,
        items,
    }
}

#[async_trait]
impl CategoryRepository for InMemoryCatalog {
    async fn insert(&self, category: &Category) -> Result<(), AppError> {
        self.stage(|tables| {
            tables.categories.insert(category.id, category.clone());
            Ok(())
        })
    }

    async fn update(&self, category: &Category) -> Result<(), AppError> {
        self.stage(|tables| match tables.categories.get_mut(&category.id) {
            Some(row) => {
                *row = category.clone();
                Ok(())
            }
            None => Err(AppError::not_found("Category", category.id)),
        })
    }

    async fn delete(&self, category: &Category) -> Result<(), AppError> {
        self.stage(|tables| {
            tables.delete_by_child(JoinTable::GenreCategory, category.id);
            tables.delete_by_child(JoinTable::VideoCategory, category.id);
            tables.categories.remove(&category.id);
            Ok(())
        })
    }

    async fn get(&self, id: Uuid) -> Result<Category, AppError> {
        self.read(|tables| tables.categories.get(&id).cloned())
            .ok_or_else(|| AppError::not_found("Category", id))
    }

    async fn search(&self, input: &SearchInput) -> Result<SearchOutput<Category>, AppError> {
        let items = self.read(|tables| tables.categories.values().cloned().collect());
        Ok(paginate(input, items, "name", |c| c.name.as_str(), |c| c.created_at))
    }

    async fn get_ids_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Uuid>, AppError> {
        Ok(self.existing_ids("category", ids, |tables| &tables.categories))
    }
}

#[async_trait]
impl CastMemberRepository for InMemoryCatalog {
    async fn insert(&self, cast_member: &CastMember) -> Result<(), AppError> {
        self.stage(|tables| {
            tables.cast_members.insert(cast_member.id, cast_member.clone());
            Ok(())
        })
    }

    async fn update(&self, cast_member: &CastMember) -> Result<(), AppError> {
        self.stage(|tables| match tables.cast_members.get_mut(&cast_member.id) {
            Some(row) => {
                *row = cast_member.clone();
                Ok(())
            }
            None => Err(AppError::not_found("CastMember", cast_member.id)),
        })
    }

    async fn delete(&self, cast_member: &CastMember) -> Result<(), AppError> {
        self.stage(|tables| {
            tables.delete_by_child(JoinTable::VideoCastMember, cast_member.id);
            tables.cast_members.remove(&cast_member.id);
            Ok(())
        })
    }

    async fn get(&self, id: Uuid) -> Result<CastMember, AppError> {
        self.read(|tables| tables.cast_members.get(&id).cloned())
            .ok_or_else(|| AppError::not_found("CastMember", id))
    }

    async fn search(&self, input: &SearchInput) -> Result<SearchOutput<CastMember>, AppError> {
        let items = self.read(|tables| tables.cast_members.values().cloned().collect());
        Ok(paginate(input, items, "name", |c| c.name.as_str(), |c| c.created_at))
    }

    async fn get_ids_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Uuid>, AppError> {
        Ok(self.existing_ids("cast_member", ids, |tables| &tables.cast_members))
    }
}

#[async_trait]
impl GenreRepository for InMemoryCatalog {
    async fn insert(&self, genre: &Genre) -> Result<(), AppError> {
        self.stage(|tables| {
            tables.genres.insert(genre.id, genre.clone());
            tables.apply(&RelationSynchronizer::sync_on_insert(
                genre.id,
                &genre_relations(genre),
            ));
            Ok(())
        })
    }

    async fn update(&self, genre: &Genre) -> Result<(), AppError> {
        self.stage(|tables| {
            match tables.genres.get_mut(&genre.id) {
                Some(row) => *row = genre.clone(),
                None => return Err(AppError::not_found("Genre", genre.id)),
            }
            tables.apply(&RelationSynchronizer::sync_on_update(
                genre.id,
                &genre_relations(genre),
            ));
            Ok(())
        })
    }

    async fn delete(&self, genre: &Genre) -> Result<(), AppError> {
        self.stage(|tables| {
            tables.apply(&[JoinRowChange::DeleteAll {
                table: JoinTable::GenreCategory,
                parent_id: genre.id,
            }]);
            tables.delete_by_child(JoinTable::VideoGenre, genre.id);
            tables.genres.remove(&genre.id);
            Ok(())
        })
    }

    async fn get(&self, id: Uuid) -> Result<Genre, AppError> {
        self.read(|tables| tables.genres.get(&id).map(|genre| tables.hydrate_genre(genre)))
            .ok_or_else(|| AppError::not_found("Genre", id))
    }

    async fn search(&self, input: &SearchInput) -> Result<SearchOutput<Genre>, AppError> {
        let items = self.read(|tables| {
            tables
                .genres
                .values()
                .map(|genre| tables.hydrate_genre(genre))
                .collect()
        });
        Ok(paginate(input, items, "name", |g| g.name.as_str(), |g| g.created_at))
    }

    async fn get_ids_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Uuid>, AppError> {
        Ok(self.existing_ids("genre", ids, |tables| &tables.genres))
    }
}

#[async_trait]
impl VideoRepository for InMemoryCatalog {
    async fn insert(&self, video: &Video) -> Result<(), AppError> {
        self.stage(|tables| {
            tables.videos.insert(video.id, video.clone());
            tables.apply(&RelationSynchronizer::sync_on_insert(
                video.id,
                &video_relations(video),
            ));
            Ok(())
        })?;
        self.events.lock().unwrap().extend_from_slice(video.events());
        Ok(())
    }

    async fn update(&self, video: &Video) -> Result<(), AppError> {
        self.stage(|tables| {
            match tables.videos.get_mut(&video.id) {
                Some(row) => *row = video.clone(),
                None => return Err(AppError::not_found("Video", video.id)),
            }
            tables.apply(&RelationSynchronizer::sync_on_update(
                video.id,
                &video_relations(video),
            ));
            Ok(())
        })?;
        self.events.lock().unwrap().extend_from_slice(video.events());
        Ok(())
    }

    async fn delete(&self, video: &Video) -> Result<(), AppError> {
        self.stage(|tables| {
            for table in [
                JoinTable::VideoCategory,
                JoinTable::VideoGenre,
                JoinTable::VideoCastMember,
            ] {
                tables.apply(&[JoinRowChange::DeleteAll {
                    table,
                    parent_id: video.id,
                }]);
            }
            tables.videos.remove(&video.id);
            Ok(())
        })
    }

    async fn get(&self, id: Uuid) -> Result<Video, AppError> {
        self.read(|tables| tables.videos.get(&id).map(|video| tables.hydrate_video(video)))
            .ok_or_else(|| AppError::not_found("Video", id))
    }

    async fn search(&self, input: &SearchInput) -> Result<SearchOutput<Video>, AppError> {
        let items = self.read(|tables| {
            tables
                .videos
                .values()
                .map(|video| tables.hydrate_video(video))
                .collect()
        });
        Ok(paginate(input, items, "title", |v| v.title.as_str(), |v| v.created_at))
    }

    async fn get_ids_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Uuid>, AppError> {
        Ok(self.existing_ids("video", ids, |tables| &tables.videos))
    }
}

#[async_trait]
impl UnitOfWork for InMemoryCatalog {
    async fn commit(&self, cancel: &CancellationToken) -> Result<(), AppError> {
        ensure_not_cancelled(cancel)?;

        let pending = self.pending.lock().unwrap().take();
        if self.fail_commit.load(Ordering::SeqCst) {
            self.events.lock().unwrap().clear();
            return Err(AppError::Internal("commit failed".to_string()));
        }

        if let Some(tables) = pending {
            *self.committed.lock().unwrap() = tables;
        }
        self.commits.fetch_add(1, Ordering::SeqCst);
        if let Some(token) = self.cancel_during_commit.lock().unwrap().take() {
            token.cancel();
        }

        let events = std::mem::take(&mut *self.events.lock().unwrap());
        for event in &events {
            self.publisher.publish(event).await?;
        }
        Ok(())
    }

    async fn rollback(&self) -> Result<(), AppError> {
        self.pending.lock().unwrap().take();
        self.events.lock().unwrap().clear();
        Ok(())
    }
}
