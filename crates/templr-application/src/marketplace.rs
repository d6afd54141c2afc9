//! Wires the use cases together from one configuration.

use crate::asset_uploader::AssetUploader;
use crate::dashboard::CreatorDashboard;
use crate::interactions::InteractionTracker;
use crate::listing_mutator::ListingMutator;
use crate::listing_synchronizer::ListingSynchronizer;
use crate::publish::{PublishRequest, PublishUseCase};
use crate::session_manager::SessionManager;
use std::sync::Arc;
use templr_core::config::TemplrConfig;
use templr_core::interaction::KeyValueStore;
use templr_core::listing::{DocumentStore, Listing};
use templr_core::session::IdentityProvider;
use templr_core::storage::BlobStore;
use templr_core::{Result, TemplrError};
use templr_infrastructure::{
    MemoryBlobStore, MemoryDocumentStore, MemoryIdentityProvider, MemoryKeyValueStore,
};

/// The four services the client talks to.
#[derive(Clone)]
pub struct Backends {
    pub identity: Arc<dyn IdentityProvider>,
    pub documents: Arc<dyn DocumentStore>,
    pub blobs: Arc<dyn BlobStore>,
    pub local: Arc<dyn KeyValueStore>,
}

impl Backends {
    /// In-process backends for local development and demos.
    pub fn in_memory() -> Self {
        Self {
            identity: Arc::new(MemoryIdentityProvider::new()),
            documents: Arc::new(MemoryDocumentStore::new()),
            blobs: Arc::new(MemoryBlobStore::new()),
            local: Arc::new(MemoryKeyValueStore::new()),
        }
    }
}

/// Client-side entry point of the marketplace.
///
/// Actions that need a signed-in principal (publishing, liking) check the
/// session manager's state before touching any other service.
pub struct Marketplace {
    config: TemplrConfig,
    sessions: SessionManager,
    listings: Arc<ListingSynchronizer>,
    mutator: Arc<ListingMutator>,
    uploader: Arc<AssetUploader>,
    interactions: InteractionTracker,
    publisher: PublishUseCase,
    dashboard: CreatorDashboard,
}

impl Marketplace {
    /// Builds every component. Must be called inside a Tokio runtime.
    pub fn new(config: TemplrConfig, backends: Backends) -> Self {
        let sessions = SessionManager::new(backends.identity, config.profile.clone());
        let listings = Arc::new(ListingSynchronizer::new(
            backends.documents.clone(),
            config.store.clone(),
        ));
        let mutator = Arc::new(ListingMutator::new(
            backends.documents,
            &config.store,
            config.listing_defaults.clone(),
            config.moderation.clone(),
        ));
        let uploader = Arc::new(AssetUploader::new(
            backends.blobs,
            config.upload.start_timeout(),
        ));
        let interactions = InteractionTracker::new(
            mutator.clone(),
            backends.local,
            config.interaction.clone(),
        );
        let publisher = PublishUseCase::new(
            uploader.clone(),
            mutator.clone(),
            config.store.uploads_prefix.clone(),
            config.upload.deadline(),
        );
        let dashboard = CreatorDashboard::new(listings.clone(), mutator.clone());

        tracing::debug!(
            "[Marketplace] Ready (listings at '{}', moderation {:?})",
            config.store.listings_path,
            config.moderation.policy
        );

        Self {
            config,
            sessions,
            listings,
            mutator,
            uploader,
            interactions,
            publisher,
            dashboard,
        }
    }

    pub fn config(&self) -> &TemplrConfig {
        &self.config
    }

    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    pub fn listings(&self) -> &ListingSynchronizer {
        &self.listings
    }

    pub fn mutator(&self) -> &ListingMutator {
        &self.mutator
    }

    pub fn uploader(&self) -> &AssetUploader {
        &self.uploader
    }

    pub fn interactions(&self) -> &InteractionTracker {
        &self.interactions
    }

    pub fn dashboard(&self) -> &CreatorDashboard {
        &self.dashboard
    }

    /// Publishes as the current session.
    pub async fn publish<P>(&self, request: PublishRequest, on_progress: P) -> Result<String>
    where
        P: FnMut(f64) + Send,
    {
        let session = self.sessions.current_session().await;
        self.publisher
            .publish(session.as_ref(), request, on_progress)
            .await
    }

    /// Toggles a like as the current session.
    pub async fn toggle_like(&self, listing: &Listing) -> Result<bool> {
        if self.sessions.current_session().await.is_none() {
            return Err(TemplrError::SignInRequired(
                "Sign in to like templates".to_string(),
            ));
        }
        self.interactions.toggle_like(listing).await
    }

    /// Counts a view; open to anonymous visitors.
    pub async fn record_view(&self, listing: &Listing) -> Result<bool> {
        self.interactions.record_view(listing).await
    }

    /// Approves a listing as the current session.
    pub async fn approve(&self, id: &str) -> Result<()> {
        let session = self.sessions.current_session().await;
        self.dashboard.approve(id, session.as_ref()).await
    }

    /// Rejects a listing as the current session.
    pub async fn reject(&self, id: &str) -> Result<()> {
        let session = self.sessions.current_session().await;
        self.dashboard.reject(id, session.as_ref()).await
    }

    /// Deletes a listing as the current session.
    pub async fn delete(&self, id: &str) -> Result<()> {
        let session = self.sessions.current_session().await;
        self.dashboard.delete(id, session.as_ref()).await
    }
}
