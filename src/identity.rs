use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::watch;

use crate::models::{Role, UserIdentity};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityError {
    #[error("session has not finished hydrating")]
    NotHydrated,
    #[error("identity store unavailable: {0}")]
    Unavailable(String),
}

/// IdentityProvider
///
/// The session source a guard is given at mount time. Guards only read from it;
/// signing in and out belongs to whoever owns the provider.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Resolves once the session has been restored from storage, successfully or not.
    async fn hydrated(&self);

    fn is_authenticated(&self) -> bool;

    fn current_user(&self) -> Result<Option<UserIdentity>, IdentityError>;
}

/// Shared handle to whichever identity provider the host injects.
pub type IdentityState = Arc<dyn IdentityProvider>;

/// The identity a guard should act on. Lookup failures and "authenticated but
/// no user object" both count as signed out.
pub fn resolve_identity(provider: &dyn IdentityProvider) -> Option<UserIdentity> {
    if !provider.is_authenticated() {
        return None;
    }
    match provider.current_user() {
        Ok(Some(user)) => Some(user),
        Ok(None) => {
            tracing::warn!("session reports authenticated but holds no user");
            None
        }
        Err(e) => {
            tracing::warn!(error = %e, "identity lookup failed, treating session as signed out");
            None
        }
    }
}

pub fn resolve_role(provider: &dyn IdentityProvider) -> Option<Role> {
    resolve_identity(provider).map(|user| user.role)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionSnapshot {
    Hydrating,
    Ready(Option<UserIdentity>),
    Failed(String),
}

/// SessionStore
///
/// In-process identity provider. Hydration state and the current user live in a
/// single `watch` channel, so `hydrated()` is a real completion signal rather
/// than a timer.
pub struct SessionStore {
    tx: watch::Sender<SessionSnapshot>,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    /// A store that is still restoring its session.
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(SessionSnapshot::Hydrating);
        Self { tx }
    }

    /// A store that is already hydrated with the given session.
    pub fn with_session(identity: Option<UserIdentity>) -> Self {
        let store = Self::new();
        store.hydrate(identity);
        store
    }

    pub fn hydrate(&self, identity: Option<UserIdentity>) {
        self.tx.send_replace(SessionSnapshot::Ready(identity));
    }

    pub fn sign_in(&self, identity: UserIdentity) {
        tracing::debug!(user_id = %identity.user_id, role = %identity.role, "session signed in");
        self.hydrate(Some(identity));
    }

    pub fn sign_out(&self) {
        tracing::debug!("session signed out");
        self.hydrate(None);
    }

    /// Marks the backing store as unreachable or its payload as malformed.
    pub fn fail(&self, reason: impl Into<String>) {
        self.tx.send_replace(SessionSnapshot::Failed(reason.into()));
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.tx.subscribe()
    }
}

#[async_trait]
impl IdentityProvider for SessionStore {
    async fn hydrated(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives as long as `self`, so this only returns once hydrated.
        let _ = rx
            .wait_for(|snapshot| !matches!(snapshot, SessionSnapshot::Hydrating))
            .await;
    }

    fn is_authenticated(&self) -> bool {
        matches!(&*self.tx.borrow(), SessionSnapshot::Ready(Some(_)))
    }

    fn current_user(&self) -> Result<Option<UserIdentity>, IdentityError> {
        match &*self.tx.borrow() {
            SessionSnapshot::Hydrating => Err(IdentityError::NotHydrated),
            SessionSnapshot::Ready(user) => Ok(user.clone()),
            SessionSnapshot::Failed(reason) => Err(IdentityError::Unavailable(reason.clone())),
        }
    }
}
