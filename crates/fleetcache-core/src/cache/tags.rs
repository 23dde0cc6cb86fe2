//! Inverted tag index.
//!
//! Tracks which cache entries were produced under which tags, so a mutation
//! can find exactly the entries it must invalidate.
//!
//! The index holds no lock of its own: it lives inside the resource store's
//! mutex and is only touched from within a single store operation.

use std::collections::{HashMap, HashSet};

use crate::cache::key::{QueryKey, Tag};

/// Bidirectional tag → keys and key → tags mapping.
#[derive(Debug, Default)]
pub struct TagIndex {
    tag_to_keys: HashMap<Tag, HashSet<QueryKey>>,
    key_to_tags: HashMap<QueryKey, HashSet<Tag>>,
}

impl TagIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a key under a set of tags, replacing any tags from the key's
    /// previous successful population. Registering the same (key, tag) pair
    /// twice has no additional effect.
    pub fn register(&mut self, key: QueryKey, tags: HashSet<Tag>) {
        self.unregister(&key);
        for tag in &tags {
            self.tag_to_keys.entry(*tag).or_default().insert(key.clone());
        }
        self.key_to_tags.insert(key, tags);
    }

    /// Remove a key and clean up its tag mappings. Called on eviction.
    pub fn unregister(&mut self, key: &QueryKey) {
        if let Some(tags) = self.key_to_tags.remove(key) {
            for tag in tags {
                if let Some(keys) = self.tag_to_keys.get_mut(&tag) {
                    keys.remove(key);
                    if keys.is_empty() {
                        self.tag_to_keys.remove(&tag);
                    }
                }
            }
        }
    }

    /// All keys currently registered under a tag. A tag with no entries
    /// yields an empty set.
    pub fn keys_for_tag(&self, tag: &Tag) -> HashSet<QueryKey> {
        self.tag_to_keys.get(tag).cloned().unwrap_or_default()
    }

    /// All tags a key is registered under.
    #[cfg(test)]
    pub fn tags_for_key(&self, key: &QueryKey) -> HashSet<Tag> {
        self.key_to_tags.get(key).cloned().unwrap_or_default()
    }

    #[cfg(test)]
    pub fn key_count(&self) -> usize {
        self.key_to_tags.len()
    }

    #[cfg(test)]
    pub fn tag_count(&self) -> usize {
        self.tag_to_keys.len()
    }
}
