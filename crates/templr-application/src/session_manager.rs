//! Session manager: the single writer of session state.
//!
//! Wraps the identity provider's sign-in, sign-up and sign-out calls and turns
//! principal changes into a push stream of [`SessionChange`]s.

use serde::Serialize;
use std::sync::{Arc, Mutex};
use templr_core::config::ProfileSettings;
use templr_core::session::{
    AuthChangeEvent, IdentityProvider, Principal, ProfileUpdate, Session,
};
use templr_core::subscription::Handler;
use templr_core::{HandlerRegistry, Result, Subscription, TemplrError};
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use url::Url;

/// One session transition as delivered to subscribers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionChange {
    pub event: AuthChangeEvent,
    pub session: Option<Session>,
}

#[derive(Default)]
struct LocalSession {
    session: Option<Session>,
    /// Principal the provider failed to sign out. Ignored until the provider
    /// reports absence or another principal.
    dismissed: Option<String>,
}

struct SessionState {
    local: tokio::sync::Mutex<LocalSession>,
    handlers: HandlerRegistry<SessionChange>,
}

impl SessionState {
    /// Re-reads the provider's principal and publishes the transition, if any.
    ///
    /// `explicit` marks a sync that follows a client sign-in or sign-up, which
    /// lifts any earlier dismissal. Handlers run while the state lock is held,
    /// so deliveries are strictly ordered and never overlap.
    async fn sync_from(&self, provider: &dyn IdentityProvider, explicit: bool) {
        let mut local = self.local.lock().await;
        if explicit {
            local.dismissed = None;
        }
        let mut next = provider.current_principal().map(Session::from);
        match (&local.dismissed, &next) {
            (Some(uid), Some(session)) if *uid == session.user_id => next = None,
            _ => local.dismissed = None,
        }

        if let Some(event) = AuthChangeEvent::between(local.session.as_ref(), next.as_ref()) {
            tracing::debug!("[SessionManager] {:?}", event);
            local.session = next.clone();
            self.handlers.dispatch(&SessionChange {
                event,
                session: next,
            });
        }
    }

    async fn clear(&self, dismissed: Option<String>) {
        let mut local = self.local.lock().await;
        local.dismissed = dismissed;
        if local.session.take().is_some() {
            self.handlers.dispatch(&SessionChange {
                event: AuthChangeEvent::SignedOut,
                session: None,
            });
        }
    }
}

/// Owns the live session and notifies subscribers of every transition.
///
/// Must be created inside a Tokio runtime: it spawns a listener that follows
/// provider-side changes such as token invalidation.
pub struct SessionManager {
    provider: Arc<dyn IdentityProvider>,
    profile: ProfileSettings,
    state: Arc<SessionState>,
    listener: Mutex<Option<JoinHandle<()>>>,
}

impl SessionManager {
    /// Creates a manager, adopting whatever principal the provider already holds.
    pub fn new(provider: Arc<dyn IdentityProvider>, profile: ProfileSettings) -> Self {
        let state = Arc::new(SessionState {
            local: tokio::sync::Mutex::new(LocalSession {
                session: provider.current_principal().map(Session::from),
                dismissed: None,
            }),
            handlers: HandlerRegistry::new(),
        });

        let mut principal_changes = provider.watch();
        let listener = {
            let provider = provider.clone();
            let state = state.clone();
            tokio::spawn(async move {
                loop {
                    match principal_changes.recv().await {
                        Ok(_) | Err(RecvError::Lagged(_)) => {
                            state.sync_from(provider.as_ref(), false).await;
                        }
                        Err(RecvError::Closed) => break,
                    }
                }
                tracing::debug!(target: "templr::session", "[SessionManager] Provider stream closed");
            })
        };

        Self {
            provider,
            profile,
            state,
            listener: Mutex::new(Some(listener)),
        }
    }

    /// Returns the current session, if any.
    pub async fn current_session(&self) -> Option<Session> {
        self.state.local.lock().await.session.clone()
    }

    /// Authenticates with an identifier and secret.
    ///
    /// # Errors
    ///
    /// Returns [`TemplrError::Auth`] with the provider's error, unchanged. The
    /// session stays absent.
    pub async fn sign_in_with_password(&self, identifier: &str, secret: &str) -> Result<Session> {
        let principal = self
            .provider
            .sign_in(identifier, secret)
            .await
            .inspect_err(|e| tracing::warn!("[SessionManager] Sign-in failed: {}", e))?;

        self.state.sync_from(self.provider.as_ref(), true).await;
        tracing::info!("[SessionManager] Signed in {}", principal.uid);
        Ok(Session::from(principal))
    }

    /// Creates an account, then sets its display name and a generated avatar.
    ///
    /// # Arguments
    ///
    /// * `identifier` - Email address of the new account
    /// * `secret` - Password
    /// * `display_name` - Name shown on listings; also seeds the avatar image
    ///
    /// # Errors
    ///
    /// Returns [`TemplrError::Auth`] for duplicate identifiers, weak secrets or
    /// network failures. If the profile update fails after the account was
    /// created, that error is returned and the session reflects the bare account.
    pub async fn sign_up_with_password(
        &self,
        identifier: &str,
        secret: &str,
        display_name: &str,
    ) -> Result<Session> {
        self.provider
            .sign_up(identifier, secret)
            .await
            .inspect_err(|e| tracing::warn!("[SessionManager] Sign-up failed: {}", e))?;

        let update = ProfileUpdate {
            display_name: Some(display_name.to_string()),
            photo_url: Some(self.avatar_url(display_name)?),
        };
        let updated = self.provider.update_profile(update).await;

        self.state.sync_from(self.provider.as_ref(), true).await;

        let principal: Principal = updated
            .inspect_err(|e| tracing::warn!("[SessionManager] Profile update failed: {}", e))?;
        tracing::info!("[SessionManager] Created account {}", principal.uid);
        Ok(Session::from(principal))
    }

    /// Ends the session. A no-op without a session.
    ///
    /// Provider failures are logged and swallowed; the local session is
    /// cleared regardless.
    pub async fn sign_out(&self) {
        if self.current_session().await.is_none() {
            tracing::debug!("[SessionManager] Sign-out without a session, nothing to do");
            return;
        }

        let dismissed = match self.provider.sign_out().await {
            Ok(()) => None,
            Err(e) => {
                tracing::error!("[SessionManager] Sign-out failed at provider: {}", e);
                self.provider.current_principal().map(|p| p.uid)
            }
        };
        self.state.clear(dismissed).await;
    }

    /// Registers `handler` for session transitions.
    ///
    /// The handler is invoked once immediately with `SignedIn` or `SignedOut`
    /// for the current state, then on every later transition until the
    /// returned subscription is unsubscribed.
    pub async fn subscribe_to_session_changes<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&SessionChange) + Send + Sync + 'static,
    {
        let handler: Handler<SessionChange> = Arc::new(handler);

        let local = self.state.local.lock().await;
        let initial = SessionChange {
            event: if local.session.is_some() {
                AuthChangeEvent::SignedIn
            } else {
                AuthChangeEvent::SignedOut
            },
            session: local.session.clone(),
        };
        handler(&initial);
        self.state.handlers.register(handler)
    }

    fn avatar_url(&self, display_name: &str) -> Result<String> {
        let mut url = Url::parse(&self.profile.avatar_base_url).map_err(|e| {
            TemplrError::config(format!(
                "Invalid avatar_base_url '{}': {}",
                self.profile.avatar_base_url, e
            ))
        })?;
        url.query_pairs_mut()
            .append_pair("name", display_name)
            .append_pair("background", "random");
        Ok(url.into())
    }
}

impl Drop for SessionManager {
    fn drop(&mut self) {
        let listener = self
            .listener
            .get_mut()
            .unwrap_or_else(|p| p.into_inner())
            .take();
        if let Some(listener) = listener {
            listener.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex as StdMutex;
    use templr_core::session::AuthErrorKind;
    use templr_infrastructure::MemoryIdentityProvider;

    fn manager() -> (Arc<MemoryIdentityProvider>, SessionManager) {
        let provider = Arc::new(MemoryIdentityProvider::new());
        let manager = SessionManager::new(provider.clone(), ProfileSettings::default());
        (provider, manager)
    }

    fn recorder() -> (
        Arc<StdMutex<Vec<SessionChange>>>,
        impl Fn(&SessionChange) + Send + Sync + 'static,
    ) {
        let seen = Arc::new(StdMutex::new(Vec::new()));
        let sink = seen.clone();
        (seen, move |change: &SessionChange| {
            sink.lock().unwrap().push(change.clone())
        })
    }

    #[tokio::test]
    async fn test_subscribe_delivers_current_state_immediately() {
        let (_provider, manager) = manager();
        let (seen, handler) = recorder();

        let sub = manager.subscribe_to_session_changes(handler).await;
        {
            let seen = seen.lock().unwrap();
            assert_eq!(seen.len(), 1);
            assert_eq!(seen[0].event, AuthChangeEvent::SignedOut);
            assert!(seen[0].session.is_none());
        }
        sub.unsubscribe();
    }

    #[tokio::test]
    async fn test_sign_up_sets_profile_and_avatar() {
        let (_provider, manager) = manager();
        let session = manager
            .sign_up_with_password("a@b.com", "pw", "Ada Lovelace")
            .await
            .unwrap();

        assert_eq!(session.display_name.as_deref(), Some("Ada Lovelace"));
        assert_eq!(
            session.avatar_url.as_deref(),
            Some("https://ui-avatars.com/api/?name=Ada+Lovelace&background=random")
        );
        assert_eq!(manager.current_session().await, Some(session));
    }

    #[tokio::test]
    async fn test_sign_in_failure_surfaces_auth_error_and_keeps_session_absent() {
        let (provider, manager) = manager();
        provider.add_account("a@b.com", "pw", None);

        let err = manager
            .sign_in_with_password("a@b.com", "wrong")
            .await
            .unwrap_err();
        match err {
            TemplrError::Auth(auth) => assert_eq!(auth.kind, AuthErrorKind::InvalidCredentials),
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(manager.current_session().await.is_none());
    }

    #[tokio::test]
    async fn test_sign_out_without_session_is_noop() {
        let (_provider, manager) = manager();
        let (seen, handler) = recorder();
        let _sub = manager.subscribe_to_session_changes(handler).await;

        manager.sign_out().await;
        manager.sign_out().await;
        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_sign_out_failure_is_swallowed_and_session_cleared() {
        let (provider, manager) = manager();
        provider.add_account("a@b.com", "pw", None);
        manager.sign_in_with_password("a@b.com", "pw").await.unwrap();

        provider.set_sign_out_failure(true);
        manager.sign_out().await;
        assert!(manager.current_session().await.is_none());

        // Late provider notifications for the same principal stay ignored.
        tokio::task::yield_now().await;
        assert!(manager.current_session().await.is_none());
        assert!(provider.current_principal().is_some());

        // Signing in again is honored.
        provider.set_sign_out_failure(false);
        manager.sign_in_with_password("a@b.com", "pw").await.unwrap();
        assert!(manager.current_session().await.is_some());
    }

    #[tokio::test]
    async fn test_transitions_are_delivered_once_each() {
        let (provider, manager) = manager();
        provider.add_account("a@b.com", "pw", Some("Ada"));
        let (seen, handler) = recorder();
        let _sub = manager.subscribe_to_session_changes(handler).await;

        manager.sign_in_with_password("a@b.com", "pw").await.unwrap();
        manager.sign_out().await;
        // Let the provider listener drain its queued notifications.
        tokio::task::yield_now().await;
        tokio::task::yield_now().await;

        let events: Vec<AuthChangeEvent> =
            seen.lock().unwrap().iter().map(|c| c.event).collect();
        assert_eq!(
            events,
            vec![
                AuthChangeEvent::SignedOut,
                AuthChangeEvent::SignedIn,
                AuthChangeEvent::SignedOut
            ]
        );
    }

    #[tokio::test]
    async fn test_provider_invalidation_signs_out() {
        let (provider, manager) = manager();
        provider.add_account("a@b.com", "pw", None);
        manager.sign_in_with_password("a@b.com", "pw").await.unwrap();

        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let _sub = manager
            .subscribe_to_session_changes(move |change| {
                let _ = tx.send(change.event);
            })
            .await;
        assert_eq!(rx.recv().await, Some(AuthChangeEvent::SignedIn));

        provider.invalidate_session();
        assert_eq!(rx.recv().await, Some(AuthChangeEvent::SignedOut));
        assert!(manager.current_session().await.is_none());
    }

    #[tokio::test]
    async fn test_unsubscribed_handler_receives_nothing_more() {
        let (provider, manager) = manager();
        provider.add_account("a@b.com", "pw", None);
        let (seen, handler) = recorder();

        let sub = manager.subscribe_to_session_changes(handler).await;
        sub.unsubscribe();
        sub.unsubscribe();

        manager.sign_in_with_password("a@b.com", "pw").await.unwrap();
        assert_eq!(seen.lock().unwrap().len(), 1);
    }
}
