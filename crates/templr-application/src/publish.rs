//! Publishing a new template: authorization, upload, listing creation.

use crate::asset_uploader::AssetUploader;
use crate::listing_mutator::ListingMutator;
use std::sync::Arc;
use std::time::Duration;
use templr_core::listing::{Category, NewListing, Price};
use templr_core::session::Session;
use templr_core::storage::UploadFile;
use templr_core::{Result, TemplrError, TimeoutKind};

/// What the creator filled in on the upload form.
#[derive(Debug, Clone, Default)]
pub struct PublishRequest {
    pub title: String,
    pub category: Option<Category>,
    pub description: String,
    /// Raw price input; blank means free
    pub price: Option<String>,
    /// Asset to upload, if any
    pub file: Option<UploadFile>,
    /// Used as the download URL when no file is uploaded
    pub external_link: Option<String>,
}

/// Runs the publish flow for a signed-in creator.
pub struct PublishUseCase {
    uploader: Arc<AssetUploader>,
    mutator: Arc<ListingMutator>,
    uploads_prefix: String,
    deadline: Duration,
}

impl PublishUseCase {
    pub fn new(
        uploader: Arc<AssetUploader>,
        mutator: Arc<ListingMutator>,
        uploads_prefix: impl Into<String>,
        deadline: Duration,
    ) -> Self {
        Self {
            uploader,
            mutator,
            uploads_prefix: uploads_prefix.into(),
            deadline,
        }
    }

    /// Validates the request, uploads its asset and creates a pending listing.
    ///
    /// # Returns
    ///
    /// The id of the created listing.
    ///
    /// # Errors
    ///
    /// - `SignInRequired` without a session, before anything else
    /// - `InvalidInput` for a missing title, category, or asset/link
    /// - any upload error; `Timeout` with [`TimeoutKind::Deadline`] if the
    ///   whole upload outlives the deadline
    pub async fn publish<P>(
        &self,
        session: Option<&Session>,
        request: PublishRequest,
        on_progress: P,
    ) -> Result<String>
    where
        P: FnMut(f64) + Send,
    {
        let session = session.ok_or_else(|| {
            TemplrError::SignInRequired("Sign in to publish a template".to_string())
        })?;

        if request.title.trim().is_empty() {
            return Err(TemplrError::invalid_input("Title is required"));
        }
        let category = request
            .category
            .ok_or_else(|| TemplrError::invalid_input("Category is required"))?;
        let external_link = request
            .external_link
            .filter(|link| !link.trim().is_empty());
        if request.file.is_none() && external_link.is_none() {
            return Err(TemplrError::invalid_input(
                "Choose a file to upload or provide an external link",
            ));
        }

        let mut listing = NewListing {
            title: request.title,
            category: Some(category),
            description: request.description,
            price: Price::from_input(request.price.as_deref()),
            image_url: None,
            file_url: external_link,
            file_name: None,
            file_type: None,
        };

        if let Some(file) = request.file {
            let destination = format!(
                "{}/{}_{}",
                self.uploads_prefix.trim_end_matches('/'),
                chrono::Utc::now().timestamp_millis(),
                file.name
            );
            let url = self.upload_within_deadline(&file, &destination, on_progress).await?;

            if file.is_image() {
                listing.image_url = Some(url.clone());
            }
            listing.file_type = file.extension().map(str::to_string);
            listing.file_name = Some(file.name.clone());
            listing.file_url = Some(url);
        }

        self.mutator
            .create_listing(listing, session.display_name.as_deref())
            .await
    }

    async fn upload_within_deadline<P>(
        &self,
        file: &UploadFile,
        destination: &str,
        on_progress: P,
    ) -> Result<String>
    where
        P: FnMut(f64) + Send,
    {
        match tokio::time::timeout(
            self.deadline,
            self.uploader.upload(file, destination, on_progress),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(
                    "[PublishUseCase] Upload to {} exceeded {:?}",
                    destination,
                    self.deadline
                );
                Err(TemplrError::timeout(
                    TimeoutKind::Deadline,
                    self.deadline,
                    format!("Upload to {} did not finish in time", destination),
                ))
            }
        }
    }
}
