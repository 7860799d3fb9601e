//! Normalized in-memory mirror of persisted entities.
//!
//! The view layer never reads the store directly: every repository result
//! is applied to a cache, and rendering pulls from the cache by id. The
//! cache only reflects what this process has written or re-fetched; there
//! is no external invalidation (single-process app).

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

use crate::models::{Story, StoryId, Tag, TagId};

/// Entities that can live in an [`EntityCache`].
///
/// `key` returns `None` for unsaved values, which the cache ignores.
pub trait Keyed {
    type Id: Eq + Hash + Copy + Debug;

    fn key(&self) -> Option<Self::Id>;
}

impl Keyed for Story {
    type Id = StoryId;

    fn key(&self) -> Option<StoryId> {
        self.id
    }
}

impl Keyed for Tag {
    type Id = TagId;

    fn key(&self) -> Option<TagId> {
        self.id
    }
}

/// Keyed-by-id collection mirroring one persisted table.
///
/// Insertion order is irrelevant; `select_all` makes no ordering promise.
#[derive(Debug, Clone)]
pub struct EntityCache<T: Keyed> {
    entries: HashMap<T::Id, T>,
}

impl<T: Keyed> Default for EntityCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Keyed> EntityCache<T> {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Applies a bulk-fetch result: inserts new entries, replaces existing.
    pub fn upsert_many(&mut self, entities: impl IntoIterator<Item = T>) {
        for entity in entities {
            self.upsert_one(entity);
        }
    }

    /// Applies a single fetched or inserted entity.
    pub fn upsert_one(&mut self, entity: T) {
        if let Some(id) = entity.key() {
            self.entries.insert(id, entity);
        }
    }

    /// Applies an insert result. Unsaved values (no id) are ignored.
    pub fn add_one(&mut self, entity: T) {
        self.upsert_one(entity);
    }

    /// Applies an update result, replacing the cached entry.
    pub fn update_one(&mut self, entity: T) {
        self.upsert_one(entity);
    }

    /// Applies a delete result.
    pub fn remove_one(&mut self, id: T::Id) {
        self.entries.remove(&id);
    }

    /// All cached entities, in no particular order.
    pub fn select_all(&self) -> impl Iterator<Item = &T> {
        self.entries.values()
    }

    /// Looks up one entity by id.
    pub fn select_by_id(&self, id: T::Id) -> Option<&T> {
        self.entries.get(&id)
    }

    /// Number of cached entities.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drops every entry (used after a destructive reset).
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Cache of stories keyed by [`StoryId`].
pub type StoryCache = EntityCache<Story>;
/// Cache of tags keyed by [`TagId`].
pub type TagCache = EntityCache<Tag>;
