//! In-process realtime document store.
//!
//! Holds the whole database as one JSON tree and fans snapshots out to
//! watchers after each write, mirroring the hosted store's listener
//! semantics. Used for local development and by the test suites.

use crate::push_id::PushIdGenerator;
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use templr_core::listing::{DataSnapshot, DocumentStore};
use templr_core::{Result, TemplrError};
use tokio::sync::mpsc;

struct Watcher {
    segments: Vec<String>,
    path: String,
    sender: mpsc::UnboundedSender<DataSnapshot>,
}

struct StoreState {
    root: Value,
    watchers: Vec<Watcher>,
}

/// Document store backed by an in-memory JSON tree.
pub struct MemoryDocumentStore {
    state: Mutex<StoreState>,
    keys: PushIdGenerator,
    offline: AtomicBool,
    writes: AtomicUsize,
}

impl Default for MemoryDocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(StoreState {
                root: Value::Object(Map::new()),
                watchers: Vec::new(),
            }),
            keys: PushIdGenerator::new(),
            offline: AtomicBool::new(false),
            writes: AtomicUsize::new(0),
        }
    }

    /// Makes every subsequent call fail with `DataAccess` until restored.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Number of successful writes (`push`, `update`, `update_existing`,
    /// `remove`).
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Number of attached watchers.
    pub fn watcher_count(&self) -> usize {
        let mut state = self.lock();
        state.watchers.retain(|w| !w.sender.is_closed());
        state.watchers.len()
    }

    /// Synchronous read for assertions.
    pub fn value_at(&self, path: &str) -> Option<Value> {
        let state = self.lock();
        lookup(&state.root, &segments(path)).cloned()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(|p| p.into_inner())
    }

    fn ensure_online(&self, operation: &str, path: &str) -> Result<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(TemplrError::data_access(format!(
                "{} '{}' failed: client is offline",
                operation, path
            )));
        }
        Ok(())
    }

    /// Applies `mutate` to the tree under the state lock and notifies every
    /// watcher whose path overlaps `written`. A `mutate` returning `Ok(false)`
    /// leaves the tree untouched and notifies nobody.
    fn write<F>(&self, written: &[String], mutate: F) -> Result<bool>
    where
        F: FnOnce(&mut Value) -> Result<bool>,
    {
        let mut state = self.lock();
        if !mutate(&mut state.root)? {
            return Ok(false);
        }
        prune_empty(&mut state.root);
        self.writes.fetch_add(1, Ordering::SeqCst);

        let StoreState { root, watchers } = &mut *state;
        let root: &Value = root;
        watchers.retain(|watcher| {
            if !overlaps(&watcher.segments, written) {
                return !watcher.sender.is_closed();
            }
            let value = lookup(root, &watcher.segments).cloned();
            watcher
                .sender
                .send(DataSnapshot::new(watcher.path.clone(), value))
                .is_ok()
        });
        Ok(true)
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn watch(&self, path: &str) -> Result<mpsc::UnboundedReceiver<DataSnapshot>> {
        self.ensure_online("watch", path)?;

        let (tx, rx) = mpsc::unbounded_channel();
        let segs = segments(path);
        let mut state = self.lock();
        let current = lookup(&state.root, &segs).cloned();
        let _ = tx.send(DataSnapshot::new(path, current));
        state.watchers.push(Watcher {
            segments: segs,
            path: path.to_string(),
            sender: tx,
        });

        tracing::debug!("[MemoryDocumentStore] Watching '{}'", path);
        Ok(rx)
    }

    fn generate_key(&self) -> String {
        self.keys.next_id()
    }

    async fn push(&self, path: &str, value: Value) -> Result<String> {
        self.ensure_online("push", path)?;
        if value.is_null() {
            return Err(TemplrError::invalid_input("Cannot push a null value"));
        }

        let key = self.generate_key();
        let mut target = segments(path);
        target.push(key.clone());
        self.write(&target, |root| {
            set_at(root, &target, value);
            Ok(true)
        })?;
        Ok(key)
    }

    async fn update(&self, path: &str, fields: Map<String, Value>) -> Result<()> {
        self.ensure_online("update", path)?;
        if fields.is_empty() {
            return Ok(());
        }

        let segs = segments(path);
        self.write(&segs, |root| {
            merge_at(root, &segs, path, fields)?;
            Ok(true)
        })?;
        Ok(())
    }

    async fn update_existing(&self, path: &str, fields: Map<String, Value>) -> Result<bool> {
        self.ensure_online("update", path)?;

        let segs = segments(path);
        if fields.is_empty() {
            let state = self.lock();
            return Ok(DataSnapshot::new(path, lookup(&state.root, &segs).cloned()).exists());
        }

        self.write(&segs, |root| {
            if !DataSnapshot::new(path, lookup(root, &segs).cloned()).exists() {
                return Ok(false);
            }
            merge_at(root, &segs, path, fields)?;
            Ok(true)
        })
    }

    async fn remove(&self, path: &str) -> Result<()> {
        self.ensure_online("remove", path)?;
        let segs = segments(path);
        self.write(&segs, |root| {
            remove_at(root, &segs);
            Ok(true)
        })?;
        Ok(())
    }

    async fn get_once(&self, path: &str) -> Result<DataSnapshot> {
        self.ensure_online("read", path)?;
        Ok(DataSnapshot::new(path, self.value_at(path)))
    }
}

fn segments(path: &str) -> Vec<String> {
    path.split('/')
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn overlaps(a: &[String], b: &[String]) -> bool {
    a.iter().zip(b.iter()).all(|(x, y)| x == y)
}

fn lookup<'a>(root: &'a Value, segs: &[String]) -> Option<&'a Value> {
    let mut current = root;
    for seg in segs {
        current = current.as_object()?.get(seg)?;
    }
    Some(current)
}

fn set_at(root: &mut Value, segs: &[String], value: Value) {
    let Some((last, parents)) = segs.split_last() else {
        *root = value;
        return;
    };

    let mut current = root;
    for seg in parents {
        if !current.is_object() {
            *current = Value::Object(Map::new());
        }
        let Value::Object(map) = current else {
            return;
        };
        current = map
            .entry(seg.clone())
            .or_insert_with(|| Value::Object(Map::new()));
    }
    if !current.is_object() {
        *current = Value::Object(Map::new());
    }
    if let Value::Object(map) = current {
        map.insert(last.clone(), value);
    }
}

/// Shallow-merges `fields` into the object at `segs`. Null values delete
/// their key.
fn merge_at(root: &mut Value, segs: &[String], path: &str, fields: Map<String, Value>) -> Result<()> {
    if lookup(root, segs).is_some_and(|existing| !existing.is_object()) {
        return Err(TemplrError::data_access(format!(
            "Cannot merge fields into non-object at '{}'",
            path
        )));
    }
    for (key, value) in fields {
        let mut child = segs.to_vec();
        child.push(key);
        if value.is_null() {
            remove_at(root, &child);
        } else {
            set_at(root, &child, value);
        }
    }
    Ok(())
}

fn remove_at(root: &mut Value, segs: &[String]) {
    let Some((last, parents)) = segs.split_last() else {
        *root = Value::Object(Map::new());
        return;
    };

    let mut current = root;
    for seg in parents {
        match current.as_object_mut().and_then(|map| map.get_mut(seg)) {
            Some(next) => current = next,
            None => return,
        }
    }
    if let Some(map) = current.as_object_mut() {
        map.remove(last);
    }
}

/// Drops empty objects and nulls below the root; the hosted store never
/// keeps them.
fn prune_empty(value: &mut Value) {
    if let Value::Object(map) = value {
        for child in map.values_mut() {
            prune_empty(child);
        }
        map.retain(|_, child| match child {
            Value::Null => false,
            Value::Object(inner) => !inner.is_empty(),
            _ => true,
        });
    }
}
