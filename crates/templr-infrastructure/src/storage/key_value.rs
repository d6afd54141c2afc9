//! Key-value store implementations for the local interaction cache.

use super::toml_document::TomlDocument;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::RwLock;
use templr_core::Result;
use templr_core::interaction::KeyValueStore;

/// Process-local store. Contents vanish with the process.
#[derive(Debug, Default)]
pub struct MemoryKeyValueStore {
    values: RwLock<HashMap<String, String>>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let values = self.values.read().unwrap_or_else(|p| p.into_inner());
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut values = self.values.write().unwrap_or_else(|p| p.into_inner());
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoredEntries {
    #[serde(default)]
    entries: BTreeMap<String, String>,
}

/// Profile-scoped store persisted as a TOML file.
pub struct FileKeyValueStore {
    document: TomlDocument<StoredEntries>,
}

impl FileKeyValueStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            document: TomlDocument::new(path),
        }
    }
}

impl KeyValueStore for FileKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self
            .document
            .load()?
            .and_then(|stored| stored.entries.get(key).cloned()))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.document.update(StoredEntries::default(), |stored| {
            stored.entries.insert(key.to_string(), value.to_string());
        })?;
        tracing::debug!(
            "[FileKeyValueStore] Wrote '{}' to {}",
            key,
            self.document.path().display()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_memory_store_get_set() {
        let store = MemoryKeyValueStore::new();
        assert_eq!(store.get("k").unwrap(), None);
        store.set("k", "v").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("v"));
    }

    #[test]
    fn test_file_store_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("interactions.toml");

        let store = FileKeyValueStore::new(path.clone());
        store.set("templr_liked_ids", r#"["-a"]"#).unwrap();
        store.set("templr_viewed_ids", r#"["-a","-b"]"#).unwrap();
        drop(store);

        let reopened = FileKeyValueStore::new(path);
        assert_eq!(
            reopened.get("templr_liked_ids").unwrap().as_deref(),
            Some(r#"["-a"]"#)
        );
        assert_eq!(
            reopened.get("templr_viewed_ids").unwrap().as_deref(),
            Some(r#"["-a","-b"]"#)
        );
        assert_eq!(reopened.get("other").unwrap(), None);
    }
}
