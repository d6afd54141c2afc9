//! Local interaction domain module.
//!
//! - `cache`: Liked/viewed id sets and their persistence format
//! - `store`: Key-value persistence trait

mod cache;
mod store;

pub use cache::{Interaction, InteractionCache, InteractionKeys};
pub use store::KeyValueStore;
