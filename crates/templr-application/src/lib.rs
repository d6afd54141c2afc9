//! Application layer for Templr.
//!
//! Use cases that coordinate the domain types with the hosted services:
//! sessions, live listings, uploads, listing writes, local interactions,
//! publishing and the creator dashboard.

pub mod asset_uploader;
pub mod dashboard;
pub mod interactions;
pub mod listing_mutator;
pub mod listing_synchronizer;
pub mod marketplace;
pub mod publish;
pub mod session_manager;

pub use asset_uploader::{AssetUploader, classify_storage_error};
pub use dashboard::{CreatorDashboard, CreatorStats, moderation_queue};
pub use interactions::InteractionTracker;
pub use listing_mutator::ListingMutator;
pub use listing_synchronizer::{ListingSynchronizer, decode_snapshot};
pub use marketplace::{Backends, Marketplace};
pub use publish::{PublishRequest, PublishUseCase};
pub use session_manager::{SessionChange, SessionManager};
