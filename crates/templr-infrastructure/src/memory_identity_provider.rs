//! In-process identity provider.
//!
//! Keeps accounts in memory and announces every principal change on a
//! broadcast channel. Secrets are stored as given; this provider exists for
//! local development and tests, never for real credentials.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use templr_core::session::{AuthError, AuthErrorKind, IdentityProvider, Principal, ProfileUpdate};
use tokio::sync::broadcast;

const DEFAULT_MIN_SECRET_LEN: usize = 1;
const WATCH_CAPACITY: usize = 64;

struct Account {
    principal: Principal,
    secret: String,
    disabled: bool,
}

#[derive(Default)]
struct ProviderState {
    /// Keyed by lowercased identifier
    accounts: HashMap<String, Account>,
    current: Option<Principal>,
    offline: bool,
    fail_sign_out: bool,
}

/// Identity provider holding accounts in memory.
pub struct MemoryIdentityProvider {
    state: Mutex<ProviderState>,
    events: broadcast::Sender<Option<Principal>>,
    min_secret_len: usize,
}

impl Default for MemoryIdentityProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryIdentityProvider {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(WATCH_CAPACITY);
        Self {
            state: Mutex::new(ProviderState::default()),
            events,
            min_secret_len: DEFAULT_MIN_SECRET_LEN,
        }
    }

    /// Rejects sign-up secrets shorter than `len` with `WeakSecret`.
    pub fn with_min_secret_len(mut self, len: usize) -> Self {
        self.min_secret_len = len;
        self
    }

    /// Registers an account without signing it in.
    pub fn add_account(&self, identifier: &str, secret: &str, display_name: Option<&str>) -> Principal {
        let mut principal = Principal::new(uuid::Uuid::new_v4().simple().to_string());
        principal.email = Some(identifier.to_string());
        principal.display_name = display_name.map(str::to_string);

        let mut state = self.lock();
        state.accounts.insert(
            identifier.to_lowercase(),
            Account {
                principal: principal.clone(),
                secret: secret.to_string(),
                disabled: false,
            },
        );
        principal
    }

    pub fn disable_account(&self, identifier: &str) {
        if let Some(account) = self.lock().accounts.get_mut(&identifier.to_lowercase()) {
            account.disabled = true;
        }
    }

    /// Simulates losing (or regaining) connectivity to the provider.
    pub fn set_offline(&self, offline: bool) {
        self.lock().offline = offline;
    }

    /// Makes the next sign-outs fail at the provider.
    pub fn set_sign_out_failure(&self, fail: bool) {
        self.lock().fail_sign_out = fail;
    }

    /// Ends the provider session without a client request, as when a token
    /// is revoked remotely.
    pub fn invalidate_session(&self) {
        self.lock().current = None;
        self.announce(None);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ProviderState> {
        self.state.lock().unwrap_or_else(|p| p.into_inner())
    }

    fn announce(&self, principal: Option<Principal>) {
        // No receivers is fine.
        let _ = self.events.send(principal);
    }

    fn ensure_online(state: &ProviderState) -> Result<(), AuthError> {
        if state.offline {
            return Err(AuthError::new(
                AuthErrorKind::Network,
                "A network error has occurred",
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl IdentityProvider for MemoryIdentityProvider {
    async fn sign_in(&self, identifier: &str, secret: &str) -> Result<Principal, AuthError> {
        let principal = {
            let mut state = self.lock();
            Self::ensure_online(&state)?;

            let account = state
                .accounts
                .get(&identifier.to_lowercase())
                .filter(|account| account.secret == secret)
                .ok_or_else(|| {
                    AuthError::new(
                        AuthErrorKind::InvalidCredentials,
                        "The email or password is incorrect",
                    )
                })?;
            if account.disabled {
                return Err(AuthError::new(
                    AuthErrorKind::AccountDisabled,
                    "This account has been disabled",
                ));
            }

            let principal = account.principal.clone();
            state.current = Some(principal.clone());
            principal
        };

        tracing::debug!("[MemoryIdentityProvider] Signed in {}", principal.uid);
        self.announce(Some(principal.clone()));
        Ok(principal)
    }

    async fn sign_up(&self, identifier: &str, secret: &str) -> Result<Principal, AuthError> {
        let principal = {
            let mut state = self.lock();
            Self::ensure_online(&state)?;

            let identifier = identifier.trim();
            if !identifier.contains('@') {
                return Err(AuthError::new(
                    AuthErrorKind::Other,
                    "The email address is badly formatted",
                ));
            }
            if secret.chars().count() < self.min_secret_len {
                return Err(AuthError::new(
                    AuthErrorKind::WeakSecret,
                    format!(
                        "Password should be at least {} characters",
                        self.min_secret_len
                    ),
                ));
            }
            let key = identifier.to_lowercase();
            if state.accounts.contains_key(&key) {
                return Err(AuthError::new(
                    AuthErrorKind::DuplicateIdentifier,
                    "The email address is already in use by another account",
                ));
            }

            let mut principal = Principal::new(uuid::Uuid::new_v4().simple().to_string());
            principal.email = Some(identifier.to_string());
            state.accounts.insert(
                key,
                Account {
                    principal: principal.clone(),
                    secret: secret.to_string(),
                    disabled: false,
                },
            );
            state.current = Some(principal.clone());
            principal
        };

        tracing::debug!("[MemoryIdentityProvider] Created {}", principal.uid);
        self.announce(Some(principal.clone()));
        Ok(principal)
    }

    async fn update_profile(&self, update: ProfileUpdate) -> Result<Principal, AuthError> {
        let principal = {
            let mut state = self.lock();
            Self::ensure_online(&state)?;

            let mut principal = state.current.clone().ok_or_else(|| {
                AuthError::new(AuthErrorKind::Other, "No user is currently signed in")
            })?;
            if let Some(name) = update.display_name {
                principal.display_name = Some(name);
            }
            if let Some(url) = update.photo_url {
                principal.photo_url = Some(url);
            }

            if let Some(account) = state
                .accounts
                .values_mut()
                .find(|account| account.principal.uid == principal.uid)
            {
                account.principal = principal.clone();
            }
            state.current = Some(principal.clone());
            principal
        };

        self.announce(Some(principal.clone()));
        Ok(principal)
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        {
            let mut state = self.lock();
            Self::ensure_online(&state)?;
            if state.fail_sign_out {
                return Err(AuthError::new(
                    AuthErrorKind::Other,
                    "Sign-out request was rejected",
                ));
            }
            state.current = None;
        }

        self.announce(None);
        Ok(())
    }

    fn current_principal(&self) -> Option<Principal> {
        self.lock().current.clone()
    }

    fn watch(&self) -> broadcast::Receiver<Option<Principal>> {
        self.events.subscribe()
    }
}
