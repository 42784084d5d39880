//! Credential Store: the signed-in principal, its permission set and the
//! long-lived session tokens. The store is an explicit, cloneable container
//! passed to the gateway at construction so tests get isolated instances.
//!
//! Invariants:
//! - At most one credential is held at a time.
//! - Replacement swaps tokens and principal together under one write lock.
//! - Every mutation is mirrored to the configured [`TokenStorage`]; the step-up
//!   action token never passes through here.

pub mod navigator;
pub mod storage;

pub use navigator::{Navigator, RouteTracker};
pub use storage::{FileTokenStorage, MemoryTokenStorage, StoredSession, TokenStorage};

use crate::error::ApiError;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeSet,
    sync::{Arc, PoisonError, RwLock},
};
use tracing::{debug, warn};

/// The admin account a session belongs to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Principal {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

#[derive(Clone, Debug)]
pub struct SessionCredential {
    pub principal: Principal,
    pub permissions: BTreeSet<String>,
    access_token: SecretString,
    refresh_token: Option<SecretString>,
}

impl SessionCredential {
    #[must_use]
    pub fn new(
        principal: Principal,
        permissions: impl IntoIterator<Item = String>,
        access_token: SecretString,
        refresh_token: Option<SecretString>,
    ) -> Self {
        Self {
            principal,
            permissions: permissions.into_iter().collect(),
            access_token,
            refresh_token,
        }
    }

    #[must_use]
    pub const fn access_token(&self) -> &SecretString {
        &self.access_token
    }

    #[must_use]
    pub const fn refresh_token(&self) -> Option<&SecretString> {
        self.refresh_token.as_ref()
    }

    fn to_stored(&self) -> StoredSession {
        StoredSession {
            principal: self.principal.clone(),
            permissions: self.permissions.iter().cloned().collect(),
            access_token: self.access_token.expose_secret().to_string(),
            refresh_token: self
                .refresh_token
                .as_ref()
                .map(|token| token.expose_secret().to_string()),
        }
    }

    fn from_stored(stored: StoredSession) -> Self {
        Self {
            principal: stored.principal,
            permissions: stored.permissions.into_iter().collect(),
            access_token: SecretString::from(stored.access_token),
            refresh_token: stored.refresh_token.map(SecretString::from),
        }
    }
}

#[derive(Clone)]
pub struct CredentialStore {
    current: Arc<RwLock<Option<SessionCredential>>>,
    storage: Arc<dyn TokenStorage>,
}

impl CredentialStore {
    /// Creates an empty store backed by `storage`. Nothing is loaded.
    #[must_use]
    pub fn new(storage: Arc<dyn TokenStorage>) -> Self {
        Self {
            current: Arc::new(RwLock::new(None)),
            storage,
        }
    }

    /// Creates an empty store that never touches durable storage.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryTokenStorage::default()))
    }

    /// Creates a store and hydrates it from `storage`.
    ///
    /// # Errors
    /// Returns `ApiError::Config` if the persisted session cannot be read.
    pub fn restore(storage: Arc<dyn TokenStorage>) -> Result<Self, ApiError> {
        let stored = storage
            .load()
            .map_err(|err| ApiError::Config(format!("Failed to read stored session: {err}")))?;
        let store = Self::new(storage);
        if let Some(stored) = stored {
            debug!("restored session from client storage");
            *store.write() = Some(SessionCredential::from_stored(stored));
        }
        Ok(store)
    }

    /// Replaces the held credential (token and principal together).
    pub fn replace(&self, credential: SessionCredential) {
        let stored = credential.to_stored();
        *self.write() = Some(credential);
        if let Err(err) = self.storage.save(&stored) {
            warn!("Failed to persist session: {err}");
        }
    }

    /// Swaps the session tokens after a refresh, keeping the principal.
    /// A `None` refresh token keeps the current one (no rotation).
    /// Returns `false` if there is no session to update.
    pub fn rotate_tokens(&self, access_token: SecretString, refresh_token: Option<SecretString>) -> bool {
        let stored = {
            let mut guard = self.write();
            let Some(current) = guard.as_mut() else {
                return false;
            };
            current.access_token = access_token;
            if let Some(refresh_token) = refresh_token {
                current.refresh_token = Some(refresh_token);
            }
            current.to_stored()
        };
        if let Err(err) = self.storage.save(&stored) {
            warn!("Failed to persist rotated session: {err}");
        }
        true
    }

    /// Drops the held credential and wipes client storage.
    pub fn clear(&self) {
        *self.write() = None;
        if let Err(err) = self.storage.clear() {
            warn!("Failed to clear stored session: {err}");
        }
    }

    #[must_use]
    pub fn access_token(&self) -> Option<SecretString> {
        self.read().as_ref().map(|credential| credential.access_token.clone())
    }

    #[must_use]
    pub fn refresh_token(&self) -> Option<SecretString> {
        self.read()
            .as_ref()
            .and_then(|credential| credential.refresh_token.clone())
    }

    #[must_use]
    pub fn principal(&self) -> Option<Principal> {
        self.read().as_ref().map(|credential| credential.principal.clone())
    }

    #[must_use]
    pub fn permissions(&self) -> BTreeSet<String> {
        self.read()
            .as_ref()
            .map(|credential| credential.permissions.clone())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn has_permission(&self, permission: &str) -> bool {
        self.read()
            .as_ref()
            .is_some_and(|credential| credential.permissions.contains(permission))
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.read().is_some()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Option<SessionCredential>> {
        self.current.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Option<SessionCredential>> {
        self.current.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for CredentialStore {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("CredentialStore")
            .field("authenticated", &self.is_authenticated())
            .finish_non_exhaustive()
    }
}
