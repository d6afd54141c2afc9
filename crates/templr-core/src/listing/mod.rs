//! Listing domain module.
//!
//! # Module Structure
//!
//! - `model`: Listing record, status, category, create/patch inputs
//! - `price`: Price value and input formatting
//! - `store`: Remote document store trait and snapshots
//! - `seed`: Demonstration listings for first-run environments
//! - `filter`: Gallery category/search filter

mod filter;
mod model;
mod price;
mod seed;
mod store;

pub use filter::ListingFilter;
pub use model::{Category, Listing, ListingPatch, ListingStatus, NewListing};
pub use price::{CURRENCY_SYMBOL, FREE_LABEL, Price};
pub use seed::{DEMO_LISTING_COUNT, demo_listings};
pub use store::{DataSnapshot, DocumentStore, child_path};
