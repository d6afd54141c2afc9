//! Likes and views, gated by the local interaction cache.

use crate::listing_mutator::ListingMutator;
use std::sync::Arc;
use templr_core::Result;
use templr_core::interaction::{Interaction, InteractionCache, InteractionKeys, KeyValueStore};
use templr_core::listing::{Listing, ListingPatch};
use tokio::sync::Mutex;

/// Records likes and views for this profile.
///
/// The cache lock is held across the remote write, so two calls for the same
/// listing never both increment.
pub struct InteractionTracker {
    mutator: Arc<ListingMutator>,
    local: Arc<dyn KeyValueStore>,
    keys: InteractionKeys,
    cache: Mutex<InteractionCache>,
}

impl InteractionTracker {
    /// Creates a tracker, loading the cached id sets from `local`.
    pub fn new(
        mutator: Arc<ListingMutator>,
        local: Arc<dyn KeyValueStore>,
        keys: InteractionKeys,
    ) -> Self {
        let cache = InteractionCache::load(local.as_ref(), &keys);
        Self {
            mutator,
            local,
            keys,
            cache: Mutex::new(cache),
        }
    }

    /// Counts a view of `listing` once per profile.
    ///
    /// Returns `true` if the counter was incremented, `false` if this profile
    /// had already viewed the listing. The listing is marked viewed before the
    /// write and unmarked if the write fails.
    pub async fn record_view(&self, listing: &Listing) -> Result<bool> {
        let mut cache = self.cache.lock().await;
        if !cache.mark_viewed(&listing.id) {
            return Ok(false);
        }

        let patch = ListingPatch::views(listing.views.saturating_add(1));
        if let Err(e) = self.mutator.update_listing(&listing.id, &patch).await {
            cache.unmark_viewed(&listing.id);
            return Err(e);
        }

        if let Err(e) = cache.save_viewed(self.local.as_ref(), &self.keys) {
            tracing::warn!("[InteractionTracker] Failed to persist viewed ids: {}", e);
        }
        Ok(true)
    }

    /// Likes or unlikes `listing` for this profile.
    ///
    /// Returns whether the listing is liked afterwards. Unliking never takes
    /// the counter below zero.
    pub async fn toggle_like(&self, listing: &Listing) -> Result<bool> {
        let mut cache = self.cache.lock().await;
        let liked = cache.is_liked(&listing.id);
        let likes = if liked {
            listing.likes.saturating_sub(1)
        } else {
            listing.likes.saturating_add(1)
        };

        self.mutator
            .update_listing(&listing.id, &ListingPatch::likes(likes))
            .await?;

        let now_liked = cache.toggle_liked(&listing.id);
        if let Err(e) = cache.save_liked(self.local.as_ref(), &self.keys) {
            tracing::warn!("[InteractionTracker] Failed to persist liked ids: {}", e);
        }
        Ok(now_liked)
    }

    pub async fn interaction(&self, listing_id: &str) -> Interaction {
        self.cache.lock().await.interaction(listing_id)
    }

    pub async fn is_liked(&self, listing_id: &str) -> bool {
        self.cache.lock().await.is_liked(listing_id)
    }
}
