//! Creator statistics and the moderation queue.

use crate::listing_mutator::ListingMutator;
use crate::listing_synchronizer::ListingSynchronizer;
use serde::Serialize;
use std::sync::Arc;
use templr_core::Result;
use templr_core::listing::{Listing, ListingStatus};
use templr_core::session::Session;

/// Aggregates over one creator's listings.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatorStats {
    pub listings: usize,
    pub total_sales: u64,
    pub total_earnings: f64,
    pub total_views: u64,
    pub total_likes: u64,
}

impl CreatorStats {
    /// Sums the listings whose author is `author`.
    pub fn for_author(listings: &[Listing], author: &str) -> Self {
        listings
            .iter()
            .filter(|l| l.author == author)
            .fold(Self::default(), |mut stats, l| {
                stats.listings += 1;
                stats.total_sales += l.sales;
                stats.total_earnings += l.earnings;
                stats.total_views += l.views;
                stats.total_likes += l.likes;
                stats
            })
    }
}

/// Listings awaiting moderation, in snapshot order.
pub fn moderation_queue(listings: &[Listing]) -> Vec<&Listing> {
    listings
        .iter()
        .filter(|l| l.status == ListingStatus::Pending)
        .collect()
}

/// Dashboard view over the live collection.
pub struct CreatorDashboard {
    listings: Arc<ListingSynchronizer>,
    mutator: Arc<ListingMutator>,
}

impl CreatorDashboard {
    pub fn new(listings: Arc<ListingSynchronizer>, mutator: Arc<ListingMutator>) -> Self {
        Self { listings, mutator }
    }

    /// Stats for the creator behind `session`, matched by the author name
    /// their listings were published under.
    pub async fn stats_for(&self, session: &Session) -> Result<CreatorStats> {
        let listings = self.listings.fetch_listings().await?;
        Ok(CreatorStats::for_author(
            &listings,
            &self.mutator.author_for(session),
        ))
    }

    pub async fn pending(&self) -> Result<Vec<Listing>> {
        let listings = self.listings.fetch_listings().await?;
        Ok(moderation_queue(&listings).into_iter().cloned().collect())
    }

    pub async fn approve(&self, id: &str, actor: Option<&Session>) -> Result<()> {
        self.mutator.approve(id, actor).await
    }

    pub async fn reject(&self, id: &str, actor: Option<&Session>) -> Result<()> {
        self.mutator.reject(id, actor).await
    }

    pub async fn delete(&self, id: &str, actor: Option<&Session>) -> Result<()> {
        self.mutator.delete_listing(id, actor).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use templr_core::config::{ListingDefaults, ModerationSettings, StoreSettings};
    use templr_core::listing::{Category, NewListing, demo_listings};
    use templr_infrastructure::MemoryDocumentStore;

    #[test]
    fn test_stats_sum_only_the_authors_listings() {
        let mut listings = demo_listings();
        listings[0].author = "Ada".into();
        listings[0].sales = 3;
        listings[0].earnings = 1497.0;
        listings[0].views = 10;
        listings[1].author = "Ada".into();
        listings[1].sales = 1;
        listings[1].earnings = 0.5;

        let stats = CreatorStats::for_author(&listings, "Ada");
        assert_eq!(stats.listings, 2);
        assert_eq!(stats.total_sales, 4);
        assert_eq!(stats.total_earnings, 1497.5);
        assert!(stats.total_views >= 10);

        assert_eq!(CreatorStats::for_author(&listings, "Nobody"), CreatorStats::default());
    }

    #[test]
    fn test_queue_holds_only_pending() {
        let mut listings = demo_listings();
        listings[2].status = ListingStatus::Pending;
        listings[5].status = ListingStatus::Rejected;

        let queue = moderation_queue(&listings);
        assert_eq!(queue.len(), 1);
        assert_eq!(queue[0].title, listings[2].title);
    }

    #[tokio::test]
    async fn test_approving_from_the_queue_empties_it() {
        let store = Arc::new(MemoryDocumentStore::new());
        let settings = StoreSettings {
            seed_demo_listings: false,
            ..StoreSettings::default()
        };
        let listings = Arc::new(ListingSynchronizer::new(store.clone(), settings.clone()));
        let mutator = Arc::new(ListingMutator::new(
            store,
            &settings,
            ListingDefaults::default(),
            ModerationSettings::default(),
        ));
        let dashboard = CreatorDashboard::new(listings, mutator.clone());

        let id = mutator
            .create_listing(
                NewListing {
                    title: "Pulse".into(),
                    category: Some(Category::Dashboard),
                    ..NewListing::default()
                },
                Some("Ada"),
            )
            .await
            .unwrap();

        let pending = dashboard.pending().await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, id);

        let ada = Session {
            user_id: "u1".into(),
            email: None,
            display_name: Some("Ada".into()),
            avatar_url: None,
        };
        dashboard.approve(&id, Some(&ada)).await.unwrap();
        assert!(dashboard.pending().await.unwrap().is_empty());

        assert_eq!(dashboard.stats_for(&ada).await.unwrap().listings, 1);
    }

    #[tokio::test]
    async fn test_unnamed_creator_stats_match_anonymous_listings() {
        let store = Arc::new(MemoryDocumentStore::new());
        let settings = StoreSettings {
            seed_demo_listings: false,
            ..StoreSettings::default()
        };
        let listings = Arc::new(ListingSynchronizer::new(store.clone(), settings.clone()));
        let mutator = Arc::new(ListingMutator::new(
            store,
            &settings,
            ListingDefaults::default(),
            ModerationSettings::default(),
        ));
        let dashboard = CreatorDashboard::new(listings, mutator.clone());

        let unnamed = Session {
            user_id: "u2".into(),
            email: Some("n@b.com".into()),
            display_name: None,
            avatar_url: None,
        };
        mutator
            .create_listing(
                NewListing {
                    title: "Quiet Kit".into(),
                    category: Some(Category::UiKit),
                    ..NewListing::default()
                },
                unnamed.display_name.as_deref(),
            )
            .await
            .unwrap();

        let stats = dashboard.stats_for(&unnamed).await.unwrap();
        assert_eq!(stats.listings, 1);
    }
}
