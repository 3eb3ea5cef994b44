//! Session state shared by the request client and the navigation guards.
//!
//! All reads and writes go through one [`SessionHolder`]. The in-memory
//! [`SessionStore`] serializes mutations behind a single `RwLock`, so a guard
//! reading a [`SessionSnapshot`] never observes a half-applied update.

mod principal;
mod service;

pub use principal::Principal;
pub use service::{Credentials, PasswordChange, Registration, SessionInitializer, SessionService};

use async_trait::async_trait;
use tokio::sync::RwLock;

/// Consistent copy of the session at one instant
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionSnapshot {
    pub principal: Option<Principal>,
    pub initialized: bool,
    pub loading: bool,
}

impl SessionSnapshot {
    pub fn is_authenticated(&self) -> bool {
        self.principal.is_some()
    }
}

/// Narrow mutation API over the process-wide session.
///
/// `mark_initialized` is one-way: once a session check has completed the
/// holder stays initialized for the rest of the page/process lifetime.
#[async_trait]
pub trait SessionHolder: Send + Sync {
    async fn principal(&self) -> Option<Principal>;
    async fn set_principal(&self, principal: Option<Principal>);
    async fn is_initialized(&self) -> bool;
    async fn mark_initialized(&self);
    async fn is_loading(&self) -> bool;
    async fn set_loading(&self, loading: bool);
    async fn snapshot(&self) -> SessionSnapshot;

    async fn is_authenticated(&self) -> bool {
        self.principal().await.is_some()
    }
}

/// In-memory session holder
#[derive(Debug, Default)]
pub struct SessionStore {
    state: RwLock<SessionSnapshot>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed with a principal restored from elsewhere; still uninitialized,
    /// so the first guard evaluation verifies it with the backend.
    pub fn with_principal(principal: Principal) -> Self {
        Self {
            state: RwLock::new(SessionSnapshot {
                principal: Some(principal),
                ..SessionSnapshot::default()
            }),
        }
    }
}

#[async_trait]
impl SessionHolder for SessionStore {
    async fn principal(&self) -> Option<Principal> {
        self.state.read().await.principal.clone()
    }

    async fn set_principal(&self, principal: Option<Principal>) {
        let mut state = self.state.write().await;
        match (&state.principal, &principal) {
            (Some(_), None) => tracing::debug!("session principal cleared"),
            (None, Some(p)) => tracing::debug!(email = ?p.email, "session principal set"),
            _ => {}
        }
        state.principal = principal;
    }

    async fn is_initialized(&self) -> bool {
        self.state.read().await.initialized
    }

    async fn mark_initialized(&self) {
        self.state.write().await.initialized = true;
    }

    async fn is_loading(&self) -> bool {
        self.state.read().await.loading
    }

    async fn set_loading(&self, loading: bool) {
        self.state.write().await.loading = loading;
    }

    async fn snapshot(&self) -> SessionSnapshot {
        self.state.read().await.clone()
    }
}
