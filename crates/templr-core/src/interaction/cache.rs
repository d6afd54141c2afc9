//! Local interaction cache.
//!
//! Records which listings this profile has liked or viewed. The cache is
//! advisory: it gates view increments and decorates listings with a liked
//! flag, while the authoritative counters stay in the document store.

use super::store::KeyValueStore;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Storage keys for the two id sets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InteractionKeys {
    pub liked: String,
    pub viewed: String,
}

impl Default for InteractionKeys {
    fn default() -> Self {
        Self {
            liked: "templr_liked_ids".to_string(),
            viewed: "templr_viewed_ids".to_string(),
        }
    }
}

/// How this profile has interacted with one listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Interaction {
    pub liked: bool,
    pub viewed: bool,
}

/// Sets of liked and viewed listing ids.
///
/// The viewed set only grows. The liked set follows the like toggle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InteractionCache {
    liked: BTreeSet<String>,
    viewed: BTreeSet<String>,
}

impl InteractionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads both sets. Missing or unreadable entries load as empty sets.
    pub fn load(store: &dyn KeyValueStore, keys: &InteractionKeys) -> Self {
        Self {
            liked: load_set(store, &keys.liked),
            viewed: load_set(store, &keys.viewed),
        }
    }

    pub fn save_liked(&self, store: &dyn KeyValueStore, keys: &InteractionKeys) -> Result<()> {
        save_set(store, &keys.liked, &self.liked)
    }

    pub fn save_viewed(&self, store: &dyn KeyValueStore, keys: &InteractionKeys) -> Result<()> {
        save_set(store, &keys.viewed, &self.viewed)
    }

    pub fn interaction(&self, listing_id: &str) -> Interaction {
        Interaction {
            liked: self.is_liked(listing_id),
            viewed: self.has_viewed(listing_id),
        }
    }

    pub fn is_liked(&self, listing_id: &str) -> bool {
        self.liked.contains(listing_id)
    }

    pub fn has_viewed(&self, listing_id: &str) -> bool {
        self.viewed.contains(listing_id)
    }

    /// Returns `true` if the id was not already marked.
    pub fn mark_viewed(&mut self, listing_id: &str) -> bool {
        self.viewed.insert(listing_id.to_string())
    }

    /// Reverts a view mark whose counter write failed.
    pub fn unmark_viewed(&mut self, listing_id: &str) {
        self.viewed.remove(listing_id);
    }

    /// Flips the liked flag and returns the new state.
    pub fn toggle_liked(&mut self, listing_id: &str) -> bool {
        if self.liked.remove(listing_id) {
            false
        } else {
            self.liked.insert(listing_id.to_string());
            true
        }
    }

    pub fn liked_ids(&self) -> impl Iterator<Item = &str> {
        self.liked.iter().map(String::as_str)
    }

    pub fn viewed_ids(&self) -> impl Iterator<Item = &str> {
        self.viewed.iter().map(String::as_str)
    }
}

fn load_set(store: &dyn KeyValueStore, key: &str) -> BTreeSet<String> {
    let raw = match store.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return BTreeSet::new(),
        Err(e) => {
            tracing::warn!("[InteractionCache] Failed to read '{}': {}", key, e);
            return BTreeSet::new();
        }
    };

    match serde_json::from_str::<Vec<String>>(&raw) {
        Ok(ids) => ids.into_iter().collect(),
        Err(e) => {
            tracing::warn!("[InteractionCache] Ignoring unreadable '{}': {}", key, e);
            BTreeSet::new()
        }
    }
}

fn save_set(store: &dyn KeyValueStore, key: &str, ids: &BTreeSet<String>) -> Result<()> {
    let raw = serde_json::to_string(&ids.iter().collect::<Vec<_>>())?;
    store.set(key, &raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MockStore {
        values: Mutex<HashMap<String, String>>,
    }

    impl KeyValueStore for MockStore {
        fn get(&self, key: &str) -> Result<Option<String>> {
            Ok(self.values.lock().unwrap().get(key).cloned())
        }

        fn set(&self, key: &str, value: &str) -> Result<()> {
            self.values
                .lock()
                .unwrap()
                .insert(key.to_string(), value.to_string());
            Ok(())
        }
    }

    #[test]
    fn test_toggle_like_round_trip() {
        let mut cache = InteractionCache::new();
        assert!(cache.toggle_liked("a"));
        assert!(cache.is_liked("a"));
        assert!(!cache.toggle_liked("a"));
        assert!(!cache.is_liked("a"));
    }

    #[test]
    fn test_mark_viewed_reports_first_time_only() {
        let mut cache = InteractionCache::new();
        assert!(cache.mark_viewed("a"));
        assert!(!cache.mark_viewed("a"));
        cache.unmark_viewed("a");
        assert!(!cache.has_viewed("a"));
    }

    #[test]
    fn test_persists_as_json_arrays() {
        let store = MockStore::default();
        let keys = InteractionKeys::default();
        let mut cache = InteractionCache::new();
        cache.toggle_liked("-b");
        cache.toggle_liked("-a");
        cache.mark_viewed("-c");
        cache.save_liked(&store, &keys).unwrap();
        cache.save_viewed(&store, &keys).unwrap();

        assert_eq!(
            store.get("templr_liked_ids").unwrap().as_deref(),
            Some(r#"["-a","-b"]"#)
        );

        let reloaded = InteractionCache::load(&store, &keys);
        assert_eq!(reloaded, cache);
        assert_eq!(
            reloaded.interaction("-c"),
            Interaction {
                liked: false,
                viewed: true
            }
        );
    }

    #[test]
    fn test_corrupt_entry_loads_empty() {
        let store = MockStore::default();
        store.set("templr_liked_ids", "not json").unwrap();
        let cache = InteractionCache::load(&store, &InteractionKeys::default());
        assert_eq!(cache.liked_ids().count(), 0);
    }
}
