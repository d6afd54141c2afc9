//! Live listing snapshots.
//!
//! Each subscription watches the listing collection and hands its handler the
//! complete, decoded collection after every change, newest first.

use serde_json::Map;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use templr_core::config::StoreSettings;
use templr_core::listing::{DataSnapshot, DocumentStore, Listing, demo_listings};
use templr_core::{Result, Subscription, TemplrError};
use tokio::sync::Mutex;

/// Decodes a collection snapshot into listings, most recently created first.
///
/// Records that fail to decode are skipped with a warning.
pub fn decode_snapshot(snapshot: &DataSnapshot) -> Vec<Listing> {
    let mut listings: Vec<Listing> = snapshot
        .children()
        .into_iter()
        .filter_map(|(key, record)| match Listing::from_record(key, record) {
            Ok(listing) => Some(listing),
            Err(e) => {
                tracing::warn!(
                    "[ListingSynchronizer] Skipping malformed listing '{}': {}",
                    key,
                    e
                );
                None
            }
        })
        .collect();
    listings.reverse();
    listings
}

/// Maintains live listing snapshots and seeds an empty collection once.
pub struct ListingSynchronizer {
    store: Arc<dyn DocumentStore>,
    settings: StoreSettings,
    seed_lock: Arc<Mutex<()>>,
}

impl ListingSynchronizer {
    pub fn new(store: Arc<dyn DocumentStore>, settings: StoreSettings) -> Self {
        Self {
            store,
            settings,
            seed_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Opens a live subscription to the listing collection.
    ///
    /// Waits for the first snapshot and delivers it before returning, so the
    /// handler has run at least once when this resolves. If that first
    /// snapshot is empty and seeding is enabled, the demonstration listings
    /// are written and arrive in the next snapshot. Later snapshots are
    /// delivered in order from a background task until the subscription is
    /// unsubscribed.
    ///
    /// # Errors
    ///
    /// Returns `DataAccess` if the store refuses the watch or closes it before
    /// the first snapshot.
    pub async fn subscribe_to_listings<F>(&self, handler: F) -> Result<Subscription>
    where
        F: Fn(&[Listing]) + Send + Sync + 'static,
    {
        let path = self.settings.listings_path.clone();
        let mut snapshots = self.store.watch(&path).await?;
        let first = snapshots.recv().await.ok_or_else(|| {
            TemplrError::data_access(format!(
                "Watch on '{}' closed before the first snapshot",
                path
            ))
        })?;

        handler(&decode_snapshot(&first));

        if !first.exists() && self.settings.seed_demo_listings {
            if let Err(e) = self.seed_if_empty().await {
                tracing::error!("[ListingSynchronizer] Seeding '{}' failed: {}", path, e);
            }
        }

        let active = Arc::new(AtomicBool::new(true));
        let forwarding = {
            let active = active.clone();
            tokio::spawn(async move {
                while let Some(snapshot) = snapshots.recv().await {
                    if !active.load(Ordering::SeqCst) {
                        break;
                    }
                    handler(&decode_snapshot(&snapshot));
                }
                tracing::debug!(target: "templr::listings", "[ListingSynchronizer] Watch on '{}' ended", path);
            })
        };

        let abort = forwarding.abort_handle();
        Ok(Subscription::new(active, move || abort.abort()))
    }

    /// Single-shot read of the current collection, newest first.
    pub async fn fetch_listings(&self) -> Result<Vec<Listing>> {
        let snapshot = self.store.get_once(&self.settings.listings_path).await?;
        Ok(decode_snapshot(&snapshot))
    }

    /// Writes the demonstration listings if the collection is empty.
    ///
    /// Returns whether anything was written. Concurrent callers serialize on
    /// a lock and each re-checks existence with a single-shot read, so at most
    /// one of them writes. All records go out in one merge, so watchers see
    /// the full set in a single snapshot.
    pub async fn seed_if_empty(&self) -> Result<bool> {
        let _guard = self.seed_lock.lock().await;
        let path = &self.settings.listings_path;

        if self.store.get_once(path).await?.exists() {
            tracing::debug!("[ListingSynchronizer] '{}' already populated, not seeding", path);
            return Ok(false);
        }

        let mut records = Map::new();
        for listing in demo_listings() {
            records.insert(self.store.generate_key(), listing.to_record()?);
        }
        let count = records.len();
        self.store.update(path, records).await?;

        tracing::info!("[ListingSynchronizer] Seeded '{}' with {} demo listings", path, count);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use templr_core::listing::DEMO_LISTING_COUNT;
    use templr_infrastructure::MemoryDocumentStore;
    use tokio::sync::mpsc;

    fn settings(seed: bool) -> StoreSettings {
        StoreSettings {
            seed_demo_listings: seed,
            ..StoreSettings::default()
        }
    }

    async fn subscribe(
        sync: &ListingSynchronizer,
    ) -> (Subscription, mpsc::UnboundedReceiver<Vec<Listing>>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let sub = sync
            .subscribe_to_listings(move |listings| {
                let _ = tx.send(listings.to_vec());
            })
            .await
            .unwrap();
        (sub, rx)
    }

    #[test]
    fn test_decode_reverses_and_skips_malformed() {
        let snapshot = DataSnapshot::new(
            "templates",
            Some(json!({
                "-a": {"title": "First", "category": "Blog"},
                "-b": {"title": "Broken", "category": "Nonsense"},
                "-c": {"title": "Third", "category": "SaaS"},
            })),
        );
        let listings = decode_snapshot(&snapshot);
        let ids: Vec<&str> = listings.iter().map(|l| l.id.as_str()).collect();
        assert_eq!(ids, vec!["-c", "-a"]);
    }

    #[tokio::test]
    async fn test_empty_collection_is_seeded_once() {
        let store = Arc::new(MemoryDocumentStore::new());
        let sync = ListingSynchronizer::new(store.clone(), settings(true));

        let (sub, mut rx) = subscribe(&sync).await;
        assert!(rx.recv().await.unwrap().is_empty());
        let seeded = rx.recv().await.unwrap();
        assert_eq!(seeded.len(), DEMO_LISTING_COUNT);

        // A second subscriber sees a populated collection and adds nothing.
        let (sub2, mut rx2) = subscribe(&sync).await;
        assert_eq!(rx2.recv().await.unwrap().len(), DEMO_LISTING_COUNT);
        assert_eq!(sync.fetch_listings().await.unwrap().len(), DEMO_LISTING_COUNT);
        assert!(!sync.seed_if_empty().await.unwrap());

        sub.unsubscribe();
        sub2.unsubscribe();
    }

    #[tokio::test]
    async fn test_concurrent_seeding_writes_once() {
        let store = Arc::new(MemoryDocumentStore::new());
        let sync = Arc::new(ListingSynchronizer::new(store.clone(), settings(true)));

        let a = tokio::spawn({
            let sync = sync.clone();
            async move { sync.seed_if_empty().await.unwrap() }
        });
        let b = tokio::spawn({
            let sync = sync.clone();
            async move { sync.seed_if_empty().await.unwrap() }
        });
        let wrote = [a.await.unwrap(), b.await.unwrap()];

        assert_eq!(wrote.iter().filter(|w| **w).count(), 1);
        assert_eq!(sync.fetch_listings().await.unwrap().len(), DEMO_LISTING_COUNT);
        assert_eq!(store.write_count(), 1);
    }

    #[tokio::test]
    async fn test_seeding_disabled_leaves_collection_empty() {
        let store = Arc::new(MemoryDocumentStore::new());
        let sync = ListingSynchronizer::new(store.clone(), settings(false));

        let (sub, mut rx) = subscribe(&sync).await;
        assert!(rx.recv().await.unwrap().is_empty());
        assert_eq!(store.write_count(), 0);
        sub.unsubscribe();
    }

    #[tokio::test]
    async fn test_snapshots_are_newest_first() {
        let store = Arc::new(MemoryDocumentStore::new());
        let sync = ListingSynchronizer::new(store.clone(), settings(false));
        let (sub, mut rx) = subscribe(&sync).await;
        rx.recv().await.unwrap();

        store
            .push("templates", json!({"title": "Old", "category": "Blog"}))
            .await
            .unwrap();
        store
            .push("templates", json!({"title": "New", "category": "Blog"}))
            .await
            .unwrap();

        rx.recv().await.unwrap();
        let titles: Vec<String> = rx
            .recv()
            .await
            .unwrap()
            .into_iter()
            .map(|l| l.title)
            .collect();
        assert_eq!(titles, vec!["New", "Old"]);
        sub.unsubscribe();
    }

    #[tokio::test]
    async fn test_unsubscribe_is_idempotent_and_stops_delivery() {
        let store = Arc::new(MemoryDocumentStore::new());
        let sync = ListingSynchronizer::new(store.clone(), settings(false));
        let (sub, mut rx) = subscribe(&sync).await;
        rx.recv().await.unwrap();

        sub.unsubscribe();
        sub.unsubscribe();
        assert!(!sub.is_active());

        store
            .push("templates", json!({"title": "Late", "category": "Blog"}))
            .await
            .unwrap();
        // The forwarding task is gone, so the sender is dropped and nothing arrives.
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_watch_failure_is_reported() {
        let store = Arc::new(MemoryDocumentStore::new());
        store.set_offline(true);
        let sync = ListingSynchronizer::new(store, settings(true));

        let err = sync.subscribe_to_listings(|_| {}).await.unwrap_err();
        assert!(matches!(err, TemplrError::DataAccess(_)));
    }
}
