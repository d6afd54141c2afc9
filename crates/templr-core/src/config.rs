//! Client configuration model.
//!
//! Every field has a default, so an empty or partial `config.toml` is valid.

use crate::interaction::InteractionKeys;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct TemplrConfig {
    pub store: StoreSettings,
    pub upload: UploadPolicy,
    pub interaction: InteractionKeys,
    pub profile: ProfileSettings,
    pub listing_defaults: ListingDefaults,
    pub moderation: ModerationSettings,
}

/// Paths inside the hosted document and blob stores.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct StoreSettings {
    /// Collection path of listing records
    pub listings_path: String,
    /// Blob path prefix for uploaded assets
    pub uploads_prefix: String,
    /// Seed an empty collection with demonstration listings
    pub seed_demo_listings: bool,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            listings_path: "templates".to_string(),
            uploads_prefix: "uploads".to_string(),
            seed_demo_listings: true,
        }
    }
}

/// Deadlines applied to asset uploads.
///
/// `start_timeout_secs` is the watchdog window for the first progress event.
/// `deadline_secs` bounds the whole upload as seen by the publishing flow.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct UploadPolicy {
    pub start_timeout_secs: u64,
    pub deadline_secs: u64,
}

impl UploadPolicy {
    pub fn start_timeout(&self) -> Duration {
        Duration::from_secs(self.start_timeout_secs)
    }

    pub fn deadline(&self) -> Duration {
        Duration::from_secs(self.deadline_secs)
    }
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self {
            start_timeout_secs: 20,
            deadline_secs: 60,
        }
    }
}

/// Profile values generated at sign-up.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct ProfileSettings {
    /// Avatar service; receives `name` and `background` query parameters
    pub avatar_base_url: String,
}

impl Default for ProfileSettings {
    fn default() -> Self {
        Self {
            avatar_base_url: "https://ui-avatars.com/api/".to_string(),
        }
    }
}

/// Fallback values for listing fields the creator left empty.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct ListingDefaults {
    pub placeholder_image_url: String,
    pub placeholder_file_url: String,
    pub anonymous_author: String,
    pub description: String,
}

impl Default for ListingDefaults {
    fn default() -> Self {
        Self {
            placeholder_image_url: "https://picsum.photos/seed/placeholder/600/400".to_string(),
            placeholder_file_url: "https://example.com/download-placeholder.zip".to_string(),
            anonymous_author: "Anonymous".to_string(),
            description: "No description provided.".to_string(),
        }
    }
}

impl ListingDefaults {
    /// Author recorded for a creator with `display_name`; blank or missing
    /// names become [`anonymous_author`](Self::anonymous_author).
    pub fn author_for(&self, display_name: Option<&str>) -> String {
        display_name
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or(self.anonymous_author.as_str())
            .to_string()
    }
}

/// Who may approve, reject or delete listings.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ModerationPolicy {
    /// Any signed-in principal.
    #[default]
    Open,
    /// Only sessions whose email is listed in `admin_emails`.
    Admins,
}

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct ModerationSettings {
    pub policy: ModerationPolicy,
    pub admin_emails: Vec<String>,
}

impl ModerationSettings {
    /// Whether a session with `email` may moderate under this policy.
    pub fn allows(&self, email: Option<&str>) -> bool {
        match self.policy {
            ModerationPolicy::Open => true,
            ModerationPolicy::Admins => email.is_some_and(|email| {
                self.admin_emails
                    .iter()
                    .any(|admin| admin.eq_ignore_ascii_case(email))
            }),
        }
    }
}
