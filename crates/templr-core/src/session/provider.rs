//! Identity provider contract.
//!
//! Defines what the session layer expects from the hosted authentication
//! service. Implementations live in the infrastructure crate.

use super::model::Principal;
use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::broadcast;

/// Machine-readable reason attached to an [`AuthError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthErrorKind {
    InvalidCredentials,
    AccountDisabled,
    DuplicateIdentifier,
    WeakSecret,
    Network,
    Other,
}

impl std::fmt::Display for AuthErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            AuthErrorKind::InvalidCredentials => "Invalid credentials",
            AuthErrorKind::AccountDisabled => "Account disabled",
            AuthErrorKind::DuplicateIdentifier => "Account already exists",
            AuthErrorKind::WeakSecret => "Weak password",
            AuthErrorKind::Network => "Network error",
            AuthErrorKind::Other => "Authentication failed",
        };
        f.write_str(label)
    }
}

/// Error reported by the identity provider. Surfaced verbatim to callers.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind}: {message}")]
pub struct AuthError {
    pub kind: AuthErrorKind,
    pub message: String,
}

impl AuthError {
    pub fn new(kind: AuthErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Profile fields that can be changed after sign-up.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub display_name: Option<String>,
    pub photo_url: Option<String>,
}

/// Hosted identity provider.
///
/// # Implementation Notes
///
/// - `current_principal` must be a cheap, synchronous read of the provider's
///   cached state; the session manager calls it while holding its own lock.
/// - Every state change (sign-in, sign-up, profile update, sign-out, token
///   invalidation) must be announced on the `watch` channel. The payload is
///   advisory; subscribers re-read `current_principal`.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Authenticates an existing principal.
    async fn sign_in(&self, identifier: &str, secret: &str) -> Result<Principal, AuthError>;

    /// Creates a new principal and signs it in.
    async fn sign_up(&self, identifier: &str, secret: &str) -> Result<Principal, AuthError>;

    /// Updates the signed-in principal's profile.
    async fn update_profile(&self, update: ProfileUpdate) -> Result<Principal, AuthError>;

    /// Ends the provider session.
    async fn sign_out(&self) -> Result<(), AuthError>;

    /// The principal the provider currently considers signed in.
    fn current_principal(&self) -> Option<Principal>;

    /// Subscribes to principal changes.
    fn watch(&self) -> broadcast::Receiver<Option<Principal>>;
}
