//! Reverse index from tag to the cache keys currently providing it.

use std::collections::{BTreeSet, HashMap, HashSet};

use stockroom_core::cache::{CacheKey, Tag, TagSet};

/// Maps each provided tag to the keys whose latest result declared it.
///
/// Tags are grouped by kind so a bare tag can reach every id of its kind.
/// Empty sets are dropped as soon as they empty out.
#[derive(Debug, Default)]
pub struct TagIndex {
    by_kind: HashMap<String, HashMap<Tag, HashSet<CacheKey>>>,
}

impl TagIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Moves `key` from the `old` tag set to the `new` one.
    pub fn replace(&mut self, key: &CacheKey, old: &TagSet, new: &TagSet) {
        for tag in old.difference(new) {
            self.unlink(key, tag);
        }
        for tag in new.difference(old) {
            self.by_kind
                .entry(tag.kind().to_string())
                .or_default()
                .entry(tag.clone())
                .or_default()
                .insert(key.clone());
        }
    }

    /// Drops every reference to `key` held under `tags`.
    pub fn remove_key(&mut self, key: &CacheKey, tags: &TagSet) {
        for tag in tags {
            self.unlink(key, tag);
        }
    }

    /// Keys affected by invalidating `tag`.
    pub fn keys_for(&self, tag: &Tag) -> HashSet<CacheKey> {
        let Some(tags) = self.by_kind.get(tag.kind()) else {
            return HashSet::new();
        };
        tags.iter()
            .filter(|(provided, _)| tag.covers(provided))
            .flat_map(|(_, keys)| keys.iter().cloned())
            .collect()
    }

    /// Union of the keys affected by each of `tags`, each key once.
    pub fn lookup(&self, tags: &TagSet) -> BTreeSet<CacheKey> {
        tags.iter().flat_map(|tag| self.keys_for(tag)).collect()
    }

    /// Returns true if any tag still references `key`.
    pub fn references(&self, key: &CacheKey) -> bool {
        self.by_kind
            .values()
            .flat_map(|tags| tags.values())
            .any(|keys| keys.contains(key))
    }

    /// Number of distinct tags currently indexed.
    pub fn len(&self) -> usize {
        self.by_kind.values().map(|tags| tags.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_kind.is_empty()
    }

    fn unlink(&mut self, key: &CacheKey, tag: &Tag) {
        let Some(tags) = self.by_kind.get_mut(tag.kind()) else {
            return;
        };
        if let Some(keys) = tags.get_mut(tag) {
            keys.remove(key);
            if keys.is_empty() {
                tags.remove(tag);
            }
        }
        if tags.is_empty() {
            self.by_kind.remove(tag.kind());
        }
    }
}
