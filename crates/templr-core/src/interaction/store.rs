//! Local key-value persistence contract.

use crate::error::Result;

/// String key-value storage scoped to one browsing profile.
///
/// Survives restarts, never shared across devices.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;

    fn set(&self, key: &str, value: &str) -> Result<()>;
}
