//! Remote document store contract.
//!
//! The realtime database is a path-addressed JSON tree. Listings live under a
//! single collection path, one child per listing keyed by a generated push key.

use crate::error::Result;
use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::mpsc;

/// A point-in-time copy of the data at one path.
#[derive(Debug, Clone, PartialEq)]
pub struct DataSnapshot {
    path: String,
    value: Option<Value>,
}

impl DataSnapshot {
    pub fn new(path: impl Into<String>, value: Option<Value>) -> Self {
        Self {
            path: path.into(),
            value,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    /// Whether any data lives at the path. Null and empty objects count as absent.
    pub fn exists(&self) -> bool {
        match &self.value {
            None | Some(Value::Null) => false,
            Some(Value::Object(map)) => !map.is_empty(),
            Some(_) => true,
        }
    }

    /// Direct children ordered by key.
    ///
    /// Push keys sort in generation order, so this is insertion order.
    pub fn children(&self) -> Vec<(&str, &Value)> {
        let mut children: Vec<(&str, &Value)> = match &self.value {
            Some(Value::Object(map)) => map.iter().map(|(k, v)| (k.as_str(), v)).collect(),
            _ => Vec::new(),
        };
        children.sort_by(|a, b| a.0.cmp(b.0));
        children
    }
}

/// Joins a collection path and a child key.
pub fn child_path(parent: &str, key: &str) -> String {
    format!("{}/{}", parent.trim_end_matches('/'), key)
}

/// Hosted realtime document store.
///
/// # Implementation Notes
///
/// - `watch` must deliver the current snapshot first, then one full snapshot
///   of the watched path after every write that touches it, in write order.
///   A watcher whose receiver is dropped is detached.
/// - `update` is a shallow merge: keys in `fields` replace the same keys at
///   `path`; other keys are untouched. The merge is atomic and produces a
///   single notification.
/// - `update_existing` checks that data lives at `path` and merges in the
///   same atomic step; a concurrent `remove` either wins outright or loses
///   outright, and an absent path is never recreated.
/// - Keys from `generate_key` sort in generation order.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Subscribes to the subtree at `path`.
    async fn watch(&self, path: &str) -> Result<mpsc::UnboundedReceiver<DataSnapshot>>;

    /// Generates a fresh, chronologically ordered child key.
    fn generate_key(&self) -> String;

    /// Appends `value` under a generated key and returns the key.
    async fn push(&self, path: &str, value: Value) -> Result<String>;

    /// Shallow-merges `fields` into the object at `path`.
    async fn update(&self, path: &str, fields: Map<String, Value>) -> Result<()>;

    /// Shallow-merges `fields` into the object at `path` only if data exists
    /// there. Returns `false`, writing nothing, when the path is absent.
    async fn update_existing(&self, path: &str, fields: Map<String, Value>) -> Result<bool>;

    /// Removes the data at `path`. Removing a missing path is not an error.
    async fn remove(&self, path: &str) -> Result<()>;

    /// Single-shot read of `path`.
    async fn get_once(&self, path: &str) -> Result<DataSnapshot>;
}
