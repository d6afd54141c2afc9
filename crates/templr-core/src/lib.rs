//! Domain layer for the Templr marketplace client.
//!
//! Holds the models (sessions, listings, uploads, local interactions), the
//! shared error type, configuration, and the contracts the client expects
//! from the hosted identity provider, document store, blob store and local
//! key-value storage.

pub mod config;
pub mod error;
pub mod interaction;
pub mod listing;
pub mod session;
pub mod storage;
pub mod subscription;

// Re-export common error type
pub use error::{Result, TemplrError, TimeoutKind};
pub use subscription::{HandlerRegistry, Subscription};
