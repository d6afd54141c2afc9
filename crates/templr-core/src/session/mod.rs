//! Session domain module.
//!
//! # Module Structure
//!
//! - `model`: Session, Principal and auth change events
//! - `provider`: Identity provider trait and its error type

mod model;
mod provider;

pub use model::{AuthChangeEvent, DEFAULT_DISPLAY_NAME, Principal, Session};
pub use provider::{AuthError, AuthErrorKind, IdentityProvider, ProfileUpdate};
