//! Session domain model.
//!
//! A [`Session`] is the client-side view of an authenticated principal. The
//! identity provider speaks in [`Principal`]s; the session manager adapts them
//! into sessions and is the only component that writes session state.

use serde::{Deserialize, Serialize};

/// Display name used when the principal has none.
pub const DEFAULT_DISPLAY_NAME: &str = "User";

/// A principal as reported by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    /// Opaque, provider-assigned user identifier
    pub uid: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub photo_url: Option<String>,
}

impl Principal {
    pub fn new(uid: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            email: None,
            display_name: None,
            photo_url: None,
        }
    }
}

/// An authenticated session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Opaque user identifier
    pub user_id: String,
    /// Email address, if the provider exposes one
    pub email: Option<String>,
    /// Display name chosen at sign-up
    pub display_name: Option<String>,
    /// Avatar image URL
    pub avatar_url: Option<String>,
}

impl Session {
    /// Returns the display name, or [`DEFAULT_DISPLAY_NAME`] when unset or blank.
    pub fn display_name_or_default(&self) -> &str {
        match self.display_name.as_deref() {
            Some(name) if !name.trim().is_empty() => name,
            _ => DEFAULT_DISPLAY_NAME,
        }
    }
}

impl From<Principal> for Session {
    fn from(principal: Principal) -> Self {
        Self {
            user_id: principal.uid,
            email: principal.email.filter(|e| !e.is_empty()),
            display_name: principal.display_name.filter(|n| !n.is_empty()),
            avatar_url: principal.photo_url.filter(|u| !u.is_empty()),
        }
    }
}

/// Kind of session transition delivered to subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthChangeEvent {
    /// A session became present, or a different principal took over.
    SignedIn,
    /// The session ended (sign-out or token invalidation).
    SignedOut,
    /// Same principal, changed profile fields.
    UserUpdated,
}

impl AuthChangeEvent {
    /// Classifies the move from `previous` to `next`.
    ///
    /// Returns `None` when nothing observable changed.
    pub fn between(previous: Option<&Session>, next: Option<&Session>) -> Option<Self> {
        match (previous, next) {
            (None, None) => None,
            (Some(_), None) => Some(Self::SignedOut),
            (None, Some(_)) => Some(Self::SignedIn),
            (Some(prev), Some(next)) if prev.user_id != next.user_id => Some(Self::SignedIn),
            (Some(prev), Some(next)) if prev != next => Some(Self::UserUpdated),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(uid: &str, name: Option<&str>) -> Session {
        Session {
            user_id: uid.to_string(),
            email: None,
            display_name: name.map(str::to_string),
            avatar_url: None,
        }
    }

    #[test]
    fn test_display_name_fallback() {
        assert_eq!(session("u1", None).display_name_or_default(), "User");
        assert_eq!(session("u1", Some("  ")).display_name_or_default(), "User");
        assert_eq!(session("u1", Some("Ada")).display_name_or_default(), "Ada");
    }

    #[test]
    fn test_from_principal_drops_empty_fields() {
        let principal = Principal {
            uid: "u1".into(),
            email: Some(String::new()),
            display_name: Some("Ada".into()),
            photo_url: Some(String::new()),
        };
        let session = Session::from(principal);
        assert_eq!(session.email, None);
        assert_eq!(session.avatar_url, None);
        assert_eq!(session.display_name.as_deref(), Some("Ada"));
    }

    #[test]
    fn test_transition_classification() {
        let a = session("u1", None);
        let a_named = session("u1", Some("Ada"));
        let b = session("u2", None);

        assert_eq!(AuthChangeEvent::between(None, None), None);
        assert_eq!(
            AuthChangeEvent::between(None, Some(&a)),
            Some(AuthChangeEvent::SignedIn)
        );
        assert_eq!(
            AuthChangeEvent::between(Some(&a), None),
            Some(AuthChangeEvent::SignedOut)
        );
        assert_eq!(
            AuthChangeEvent::between(Some(&a), Some(&b)),
            Some(AuthChangeEvent::SignedIn)
        );
        assert_eq!(
            AuthChangeEvent::between(Some(&a), Some(&a_named)),
            Some(AuthChangeEvent::UserUpdated)
        );
        assert_eq!(AuthChangeEvent::between(Some(&a), Some(&a)), None);
    }
}
