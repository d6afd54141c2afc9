//! Create, update, moderate and delete listing records.
//!
//! Every write is a single append or a single shallow merge. Nothing is
//! patched locally; changes reach the UI through the next snapshot.

use std::sync::Arc;
use templr_core::config::{ListingDefaults, ModerationSettings, StoreSettings};
use templr_core::listing::{
    DocumentStore, Listing, ListingPatch, ListingStatus, NewListing, child_path,
};
use templr_core::session::Session;
use templr_core::{Result, TemplrError};

const ENTITY: &str = "listing";
const EXTERNAL_LINK_FILE_NAME: &str = "External Link";
const EXTERNAL_LINK_FILE_TYPE: &str = "link";

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Writes listing records to the document store.
pub struct ListingMutator {
    store: Arc<dyn DocumentStore>,
    listings_path: String,
    defaults: ListingDefaults,
    moderation: ModerationSettings,
}

impl ListingMutator {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        settings: &StoreSettings,
        defaults: ListingDefaults,
        moderation: ModerationSettings,
    ) -> Self {
        Self {
            store,
            listings_path: settings.listings_path.clone(),
            defaults,
            moderation,
        }
    }

    fn path_of(&self, id: &str) -> Result<String> {
        if id.trim().is_empty() || id.contains('/') {
            return Err(TemplrError::invalid_input(format!("Invalid listing id '{}'", id)));
        }
        Ok(child_path(&self.listings_path, id))
    }

    /// Creates a listing in `pending` state with zeroed counters.
    ///
    /// # Arguments
    ///
    /// * `data` - Listing fields; title and category are required
    /// * `author` - Creator display name; blank or missing becomes the
    ///   anonymous author
    ///
    /// # Returns
    ///
    /// The store-assigned id of the new listing.
    ///
    /// # Errors
    ///
    /// Returns `Validation` when the title or category is missing.
    pub async fn create_listing(&self, data: NewListing, author: Option<&str>) -> Result<String> {
        let category = data.validate()?;

        let listing = Listing {
            id: String::new(),
            title: data.title.trim().to_string(),
            author: self.defaults.author_for(author),
            image_url: non_blank(data.image_url)
                .unwrap_or_else(|| self.defaults.placeholder_image_url.clone()),
            category,
            description: non_blank(Some(data.description))
                .unwrap_or_else(|| self.defaults.description.clone()),
            price: data.price,
            status: ListingStatus::Pending,
            likes: 0,
            views: 0,
            sales: 0,
            earnings: 0.0,
            file_url: Some(
                non_blank(data.file_url)
                    .unwrap_or_else(|| self.defaults.placeholder_file_url.clone()),
            ),
            file_name: Some(
                non_blank(data.file_name).unwrap_or_else(|| EXTERNAL_LINK_FILE_NAME.to_string()),
            ),
            file_type: Some(
                non_blank(data.file_type).unwrap_or_else(|| EXTERNAL_LINK_FILE_TYPE.to_string()),
            ),
            created_at: Some(chrono::Utc::now().timestamp_millis()),
        };

        let id = self
            .store
            .push(&self.listings_path, listing.to_record()?)
            .await?;
        tracing::info!("[ListingMutator] Created listing {} ('{}')", id, listing.title);
        Ok(id)
    }

    /// Author name that [`create_listing`](Self::create_listing) records for `session`.
    pub fn author_for(&self, session: &Session) -> String {
        self.defaults.author_for(session.display_name.as_deref())
    }

    /// Reads one listing.
    pub async fn get_listing(&self, id: &str) -> Result<Listing> {
        let snapshot = self.store.get_once(&self.path_of(id)?).await?;
        match snapshot.value() {
            Some(record) if snapshot.exists() => Listing::from_record(id, record),
            _ => Err(TemplrError::not_found(ENTITY, id)),
        }
    }

    /// Shallow-merges `patch` onto an existing listing.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the listing does not exist; nothing is written.
    pub async fn update_listing(&self, id: &str, patch: &ListingPatch) -> Result<()> {
        let path = self.path_of(id)?;
        if !self.store.update_existing(&path, patch.to_fields()?).await? {
            return Err(TemplrError::not_found(ENTITY, id));
        }
        tracing::debug!("[ListingMutator] Updated listing {}", id);
        Ok(())
    }

    /// Moves a listing to `status` under the moderation policy.
    ///
    /// Re-applying the current status succeeds without writing.
    ///
    /// # Errors
    ///
    /// - `SignInRequired` without an actor
    /// - `Forbidden` if `actor` may not moderate
    /// - `NotFound` if the listing does not exist
    /// - `InvalidTransition` for moves other than out of `pending`
    pub async fn moderate(
        &self,
        id: &str,
        status: ListingStatus,
        actor: Option<&Session>,
    ) -> Result<()> {
        self.authorize(actor, "moderate listings")?;

        let current = self.get_listing(id).await?;
        if current.status == status {
            return Ok(());
        }
        if !current.status.can_transition_to(status) {
            return Err(TemplrError::InvalidTransition {
                id: id.to_string(),
                from: current.status.to_string(),
                to: status.to_string(),
            });
        }

        self.update_listing(id, &ListingPatch::status(status)).await?;
        tracing::info!(
            "[ListingMutator] Listing {} moved {} -> {}",
            id,
            current.status,
            status
        );
        Ok(())
    }

    pub async fn approve(&self, id: &str, actor: Option<&Session>) -> Result<()> {
        self.moderate(id, ListingStatus::Approved, actor).await
    }

    pub async fn reject(&self, id: &str, actor: Option<&Session>) -> Result<()> {
        self.moderate(id, ListingStatus::Rejected, actor).await
    }

    /// Removes a listing. Irreversible; callers confirm with the user first.
    pub async fn delete_listing(&self, id: &str, actor: Option<&Session>) -> Result<()> {
        self.authorize(actor, "delete listings")?;
        let path = self.path_of(id)?;
        self.store.remove(&path).await?;
        tracing::info!("[ListingMutator] Deleted listing {}", id);
        Ok(())
    }

    fn authorize(&self, actor: Option<&Session>, action: &str) -> Result<()> {
        let actor = actor
            .ok_or_else(|| TemplrError::SignInRequired(format!("Sign in to {}", action)))?;
        if self.moderation.allows(actor.email.as_deref()) {
            Ok(())
        } else {
            tracing::warn!(
                "[ListingMutator] Refused to {} for {}",
                action,
                actor.user_id
            );
            Err(TemplrError::Forbidden(format!("Not allowed to {}", action)))
        }
    }
}
