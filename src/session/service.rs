use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::api::{ApiClient, AuthApi};
use crate::config::{ClientConfig, NavigationConfig};
use crate::error::ClientError;
use crate::flight::SingleFlight;
use crate::session::{Principal, SessionHolder};

#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub phone: String,
    pub accept_terms: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordChange {
    pub current_password: String,
    pub new_password: String,
    pub confirm_password: String,
}

/// Lazily performs the first session check; consumed by the guard chain
#[async_trait]
pub trait SessionInitializer: Send + Sync {
    async fn ensure_initialized(&self);
}

/// Session actions: check, login, register, logout, profile updates.
/// Cheap to clone; clones share the same holder and in-flight check.
#[derive(Clone)]
pub struct SessionService {
    api: AuthApi,
    session: Arc<dyn SessionHolder>,
    navigation: NavigationConfig,
    init: Arc<SingleFlight<bool>>,
    last_error: Arc<RwLock<Option<String>>>,
}

impl SessionService {
    pub fn new(client: ApiClient, config: &ClientConfig) -> Self {
        let session = client.session().clone();
        Self {
            api: AuthApi::new(client, config.session.clone()),
            session,
            navigation: config.navigation.clone(),
            init: Arc::new(SingleFlight::new()),
            last_error: Arc::new(RwLock::new(None)),
        }
    }

    pub fn session(&self) -> &Arc<dyn SessionHolder> {
        &self.session
    }

    pub fn client(&self) -> &ApiClient {
        self.api.client()
    }

    /// Run the first session check. Skipped once initialized; concurrent
    /// callers share one backend call and observe the same result.
    pub async fn initialize(&self) {
        if self.session.is_initialized().await {
            return;
        }
        let service = self.clone();
        self.init
            .run(move || async move {
                // A flight may have completed after the check above
                if service.session.is_initialized().await {
                    return service.session.is_authenticated().await;
                }
                service.check_status().await
            })
            .await;
    }

    /// Ask the backend who is logged in. Always leaves the session
    /// initialized and not loading, whatever the outcome.
    pub async fn check_status(&self) -> bool {
        self.session.set_loading(true).await;

        let principal = match self.api.me().await {
            Ok(principal) => principal,
            Err(err) => {
                tracing::warn!(error = %err, "session check failed");
                None
            }
        };
        let authenticated = principal.is_some();
        self.session.set_principal(principal).await;

        self.session.set_loading(false).await;
        self.session.mark_initialized().await;

        tracing::debug!(authenticated, "session check completed");
        authenticated
    }

    pub async fn login(&self, credentials: &Credentials) -> Result<Principal, ClientError> {
        self.session.set_loading(true).await;
        self.clear_error().await;

        let result = self.api.login(credentials).await;
        match &result {
            Ok(principal) => {
                tracing::info!(email = %credentials.email, "logged in");
                self.session.set_principal(Some(principal.clone())).await;
                self.session.mark_initialized().await;
            }
            Err(err) => self.record_error(err).await,
        }

        self.session.set_loading(false).await;
        result
    }

    /// Register, then log in with the same credentials
    pub async fn register(&self, registration: &Registration) -> Result<Principal, ClientError> {
        self.clear_error().await;
        if let Err(err) = self.api.register(registration).await {
            self.record_error(&err).await;
            return Err(err);
        }
        self.login(&Credentials::new(&registration.email, &registration.password))
            .await
    }

    /// Invalidate the server session (best effort) and always clear local state
    pub async fn logout(&self) {
        if let Err(err) = self.api.logout().await {
            tracing::warn!(error = %err, "logout request failed");
        }
        self.session.set_principal(None).await;
        tracing::info!("logged out");

        let location = self.client().location();
        if !self.navigation.is_public_path(&location.current_path()) {
            location.assign(&self.navigation.login_path);
        }
    }

    pub async fn update_profile(&self, changes: &Value) -> Result<Principal, ClientError> {
        self.session.set_loading(true).await;
        self.clear_error().await;

        let result = match self.api.update_profile(changes).await {
            Ok(updated) => {
                let mut principal = self.session.principal().await.unwrap_or_default();
                principal.merge(updated);
                self.session.set_principal(Some(principal.clone())).await;
                Ok(principal)
            }
            Err(err) => {
                self.record_error(&err).await;
                Err(err)
            }
        };

        self.session.set_loading(false).await;
        result
    }

    pub async fn change_password(&self, change: &PasswordChange) -> Result<(), ClientError> {
        self.clear_error().await;
        let result = self.api.change_password(change).await;
        if let Err(err) = &result {
            self.record_error(err).await;
        }
        result
    }

    /// Message of the last failed action, for display
    pub async fn last_error(&self) -> Option<String> {
        self.last_error.read().await.clone()
    }

    pub async fn clear_error(&self) {
        *self.last_error.write().await = None;
    }

    async fn record_error(&self, err: &ClientError) {
        tracing::debug!(error = %err, code = err.error_code(), "session action failed");
        *self.last_error.write().await = Some(err.message().to_string());
    }
}

#[async_trait]
impl SessionInitializer for SessionService {
    async fn ensure_initialized(&self) {
        self.initialize().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::router::{Location, MemoryLocation};
    use crate::session::SessionStore;
    use crate::testing::{Reply, ScriptedTransport};
    use crate::session::SessionSnapshot;
    use serde_json::json;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;
    use tokio::sync::Notify;

    struct Harness {
        service: SessionService,
        transport: Arc<ScriptedTransport>,
        session: Arc<SessionStore>,
        location: Arc<MemoryLocation>,
    }

    fn harness(path: &str) -> Harness {
        let config = ClientConfig::development();
        let transport = Arc::new(ScriptedTransport::new());
        let session = Arc::new(SessionStore::new());
        let location = Arc::new(MemoryLocation::new(path));
        let client = ApiClient::new(&config, transport.clone(), session.clone(), location.clone());
        Harness {
            service: SessionService::new(client, &config),
            transport,
            session,
            location,
        }
    }

    /// Holder whose next `is_initialized` read parks until released
    #[derive(Default)]
    struct StallingHolder {
        inner: SessionStore,
        armed: AtomicBool,
        stalled: Notify,
        release: Notify,
    }

    #[async_trait]
    impl SessionHolder for StallingHolder {
        async fn principal(&self) -> Option<Principal> {
            self.inner.principal().await
        }

        async fn set_principal(&self, principal: Option<Principal>) {
            self.inner.set_principal(principal).await
        }

        async fn is_initialized(&self) -> bool {
            let initialized = self.inner.is_initialized().await;
            if self.armed.swap(false, Ordering::SeqCst) {
                self.stalled.notify_one();
                self.release.notified().await;
            }
            initialized
        }

        async fn mark_initialized(&self) {
            self.inner.mark_initialized().await
        }

        async fn is_loading(&self) -> bool {
            self.inner.is_loading().await
        }

        async fn set_loading(&self, loading: bool) {
            self.inner.set_loading(loading).await
        }

        async fn snapshot(&self) -> SessionSnapshot {
            self.inner.snapshot().await
        }
    }

    fn user_body() -> Value {
        json!({"success": true, "user": {"id": 1, "name": "Ana", "email": "ana@example.com"}})
    }

    #[tokio::test]
    async fn check_status_sets_principal_and_initializes() {
        let h = harness("/");
        h.transport.reply("GET", "/auth/me", Reply::json(200, user_body()));

        assert!(h.service.check_status().await);

        let snap = h.session.snapshot().await;
        assert!(snap.initialized);
        assert!(!snap.loading);
        assert_eq!(snap.principal.unwrap().name.as_deref(), Some("Ana"));
    }

    #[tokio::test]
    async fn failed_check_still_initializes() {
        let h = harness("/");
        h.transport.reply("GET", "/auth/me", Reply::json(500, json!({"message": "db down"})));

        assert!(!h.service.check_status().await);

        let snap = h.session.snapshot().await;
        assert!(snap.initialized);
        assert!(snap.principal.is_none());
    }

    #[tokio::test]
    async fn concurrent_initialize_checks_once() {
        let h = harness("/");
        h.transport.reply(
            "GET",
            "/auth/me",
            Reply::json(200, user_body()).delayed(Duration::from_millis(40)),
        );

        let a = h.service.clone();
        let b = h.service.clone();
        tokio::join!(a.initialize(), b.initialize());

        assert_eq!(h.transport.count("GET", "/auth/me"), 1);
        assert!(h.session.is_authenticated().await);

        // Already initialized: no further checks
        h.service.initialize().await;
        assert_eq!(h.transport.count("GET", "/auth/me"), 1);
    }

    #[tokio::test]
    async fn late_initialize_after_completed_check_does_not_repeat_it() {
        let config = ClientConfig::development();
        let transport = Arc::new(ScriptedTransport::new());
        transport.reply(
            "GET",
            "/auth/me",
            Reply::json(200, user_body()).delayed(Duration::from_millis(10)),
        );
        let session = Arc::new(StallingHolder::default());
        let location = Arc::new(MemoryLocation::new("/"));
        let client = ApiClient::new(&config, transport.clone(), session.clone(), location);
        let service = SessionService::new(client, &config);

        // The late caller reads "not initialized", then stalls before joining
        session.armed.store(true, Ordering::SeqCst);
        let late = tokio::spawn({
            let service = service.clone();
            async move { service.initialize().await }
        });
        session.stalled.notified().await;

        service.initialize().await;
        assert_eq!(transport.count("GET", "/auth/me"), 1);

        session.release.notify_one();
        late.await.unwrap();

        assert_eq!(transport.count("GET", "/auth/me"), 1);
        assert!(session.is_authenticated().await);
    }

    #[tokio::test]
    async fn failed_login_records_error() {
        let h = harness("/login");
        h.transport.reply(
            "POST",
            "/auth/login",
            Reply::json(400, json!({"success": false, "message": "Credenciais inválidas"})),
        );

        let err = h.service.login(&Credentials::new("x@y.z", "bad")).await.unwrap_err();

        assert_eq!(err.status(), Some(400));
        assert_eq!(h.service.last_error().await.as_deref(), Some("Credenciais inválidas"));
        assert!(!h.session.is_loading().await);

        h.service.clear_error().await;
        assert!(h.service.last_error().await.is_none());
    }

    #[tokio::test]
    async fn register_logs_in_afterwards() {
        let h = harness("/cadastro");
        h.transport.reply("POST", "/auth/register", Reply::json(201, json!({"success": true})));
        h.transport.reply("POST", "/auth/login", Reply::json(200, user_body()));

        let principal = h
            .service
            .register(&Registration {
                name: "Ana".into(),
                email: "ana@example.com".into(),
                password: "pw".into(),
                confirm_password: "pw".into(),
                phone: "11 90000-0000".into(),
                accept_terms: true,
            })
            .await
            .unwrap();

        assert_eq!(principal.email.as_deref(), Some("ana@example.com"));
        assert!(h.session.is_authenticated().await);
        let login_body = h.transport.requests()[1].body.clone().unwrap();
        assert_eq!(login_body, json!({"email": "ana@example.com", "password": "pw"}));
    }

    #[tokio::test]
    async fn logout_clears_even_when_request_fails() {
        let h = harness("/portfolio");
        h.session
            .set_principal(Some(Principal { name: Some("Ana".into()), ..Principal::default() }))
            .await;
        h.transport.reply("POST", "/auth/logout", Reply::network("offline"));

        h.service.logout().await;

        assert!(!h.session.is_authenticated().await);
        assert_eq!(h.location.current_path(), "/login");
    }

    #[tokio::test]
    async fn update_profile_merges_into_principal() {
        let h = harness("/perfil");
        h.session
            .set_principal(Some(Principal {
                name: Some("Ana".into()),
                email: Some("ana@example.com".into()),
                ..Principal::default()
            }))
            .await;
        h.transport.reply(
            "PUT",
            "/auth/profile",
            Reply::json(200, json!({"success": true, "user": {"phone": "11 95555-0000"}})),
        );

        let updated = h
            .service
            .update_profile(&json!({"phone": "11 95555-0000"}))
            .await
            .unwrap();

        assert_eq!(updated.name.as_deref(), Some("Ana"));
        assert_eq!(updated.phone.as_deref(), Some("11 95555-0000"));
        assert_eq!(h.session.principal().await, Some(updated));
    }
}
