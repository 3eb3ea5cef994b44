//! Resilient request client.
//!
//! Every call gets the security header and a bounded timeout. A 401 on a
//! first attempt triggers one session refresh followed by one retry; any
//! other failure, or a 401 that survives the refresh, is surfaced to the
//! caller unchanged. An unrecoverable 401 invalidates the session and
//! forces the login page unless the user is already on a public path.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::time::timeout;
use uuid::Uuid;

use crate::api::envelope::Envelope;
use crate::api::transport::{HttpRequest, HttpResponse, HttpTransport, Transport, TransportError};
use crate::config::{ApiConfig, ClientConfig, NavigationConfig};
use crate::error::ClientError;
use crate::flight::SingleFlight;
use crate::router::Location;
use crate::session::SessionHolder;

/// Which attempt of a logical request this is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attempt {
    First,
    Retry,
}

/// One logical request threaded through the recovery path. The attempt
/// only moves `First -> Retry`, so a request is retried at most once.
#[derive(Debug, Clone)]
pub struct PendingRequest {
    pub id: Uuid,
    pub request: HttpRequest,
    pub attempt: Attempt,
}

impl PendingRequest {
    pub fn new(request: HttpRequest) -> Self {
        Self {
            id: Uuid::new_v4(),
            request,
            attempt: Attempt::First,
        }
    }

    /// A request that has already been through one refresh
    pub fn retried(request: HttpRequest) -> Self {
        Self {
            attempt: Attempt::Retry,
            ..Self::new(request)
        }
    }

    pub fn is_retry(&self) -> bool {
        self.attempt == Attempt::Retry
    }

    pub fn into_retry(self) -> Self {
        Self {
            attempt: Attempt::Retry,
            ..self
        }
    }
}

/// Transport plus per-request policy; never refers back to the client
struct Dispatcher {
    transport: Arc<dyn Transport>,
    api: ApiConfig,
}

struct ClientInner {
    dispatcher: Arc<Dispatcher>,
    session: Arc<dyn SessionHolder>,
    location: Arc<dyn Location>,
    navigation: NavigationConfig,
    refresh_path: Arc<str>,
    coalesce_refresh: bool,
    refresh: SingleFlight<bool>,
}

#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ClientInner>,
}

impl ApiClient {
    pub fn new(
        config: &ClientConfig,
        transport: Arc<dyn Transport>,
        session: Arc<dyn SessionHolder>,
        location: Arc<dyn Location>,
    ) -> Self {
        Self {
            inner: Arc::new(ClientInner {
                dispatcher: Arc::new(Dispatcher {
                    transport,
                    api: config.api.clone(),
                }),
                session,
                location,
                navigation: config.navigation.clone(),
                refresh_path: Arc::from(config.session.refresh_path.as_str()),
                coalesce_refresh: config.session.coalesce_refresh,
                refresh: SingleFlight::new(),
            }),
        }
    }

    /// Client over the reqwest transport for `config.api.base_url`
    pub fn connect(
        config: &ClientConfig,
        session: Arc<dyn SessionHolder>,
        location: Arc<dyn Location>,
    ) -> Result<Self, TransportError> {
        let transport = HttpTransport::new(&config.api)?;
        Ok(Self::new(config, Arc::new(transport), session, location))
    }

    pub fn session(&self) -> &Arc<dyn SessionHolder> {
        &self.inner.session
    }

    pub fn location(&self) -> &Arc<dyn Location> {
        &self.inner.location
    }

    /// Send a fresh request through the recovery protocol
    pub async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ClientError> {
        self.send_pending(PendingRequest::new(request)).await
    }

    pub async fn send_pending(&self, mut pending: PendingRequest) -> Result<HttpResponse, ClientError> {
        loop {
            match self.inner.dispatcher.dispatch(&pending).await {
                Err(err) if err.is_unauthorized() => {
                    if pending.is_retry() {
                        tracing::warn!(request_id = %pending.id, "401 after session refresh, giving up");
                        self.invalidate_session().await;
                        return Err(err);
                    }
                    if !self.refresh_session().await {
                        self.invalidate_session().await;
                        return Err(err);
                    }
                    tracing::debug!(request_id = %pending.id, "session refreshed, retrying request");
                    pending = pending.into_retry();
                }
                other => return other,
            }
        }
    }

    /// Send and unwrap the `{success, data, message}` envelope
    pub async fn call<T: DeserializeOwned>(&self, request: HttpRequest) -> Result<Envelope<T>, ClientError> {
        let response = self.send(request).await?;
        Envelope::from_value(response.body)?.into_result()
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<Envelope<T>, ClientError> {
        self.call(HttpRequest::get(path)).await
    }

    pub async fn post<T: DeserializeOwned>(&self, path: &str, body: Option<Value>) -> Result<Envelope<T>, ClientError> {
        let mut request = HttpRequest::post(path);
        request.body = body;
        self.call(request).await
    }

    pub async fn put<T: DeserializeOwned>(&self, path: &str, body: Value) -> Result<Envelope<T>, ClientError> {
        self.call(HttpRequest::put(path).json(body)).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<Envelope<T>, ClientError> {
        self.call(HttpRequest::delete(path)).await
    }

    /// Exchange the current session cookie for a renewed one. Concurrent
    /// callers share a single backend call when coalescing is enabled.
    pub async fn refresh_session(&self) -> bool {
        let inner = &self.inner;
        if inner.coalesce_refresh {
            let dispatcher = inner.dispatcher.clone();
            let path = inner.refresh_path.clone();
            inner
                .refresh
                .run(move || async move { dispatcher.refresh(&path).await })
                .await
        } else {
            inner.dispatcher.refresh(&inner.refresh_path).await
        }
    }

    /// Clear the principal and, off public paths, force the login page
    async fn invalidate_session(&self) {
        let inner = &self.inner;
        inner.session.set_principal(None).await;

        let current = inner.location.current_path();
        tracing::info!(path = %current, "session invalidated");

        if !inner.navigation.is_public_path(&current) {
            inner.location.assign(&inner.navigation.login_path);
        }
    }
}

impl Dispatcher {
    // The refresh call bypasses recovery: a failed refresh is never refreshed or retried
    async fn refresh(&self, path: &str) -> bool {
        let pending = PendingRequest::new(HttpRequest::post(path));
        match self.dispatch(&pending).await {
            Ok(response) if response.body.get("success").and_then(Value::as_bool) == Some(true) => {
                tracing::info!("session refreshed");
                true
            }
            Ok(response) => {
                tracing::warn!(status = response.status, "session refresh rejected");
                false
            }
            Err(err) => {
                tracing::error!(error = %err, "session refresh failed");
                false
            }
        }
    }

    fn prepare(&self, request: &HttpRequest) -> HttpRequest {
        let (name, value) = &self.api.security_header;
        let mut prepared = request.clone();
        if prepared.header_value(name).is_none() {
            prepared.headers.push((name.clone(), value.clone()));
        }
        prepared
    }

    /// One transport round trip, classified. No recovery here.
    async fn dispatch(&self, pending: &PendingRequest) -> Result<HttpResponse, ClientError> {
        let request = self.prepare(&pending.request);

        if self.api.enable_request_logging {
            tracing::debug!(
                request_id = %pending.id,
                attempt = ?pending.attempt,
                body = ?request.body,
                "→ {} {}", request.method, request.path
            );
        }

        let response = match timeout(self.api.timeout(), self.transport.execute(&request)).await {
            Ok(Ok(response)) => response,
            Ok(Err(err)) => {
                tracing::error!(request_id = %pending.id, error = %err, "{} {} failed", request.method, request.path);
                return Err(ClientError::Network(err.to_string()));
            }
            Err(_) => {
                tracing::error!(request_id = %pending.id, "{} {} timed out", request.method, request.path);
                return Err(ClientError::Network(format!(
                    "request timed out after {:?}",
                    self.api.timeout()
                )));
            }
        };

        if response.is_success() {
            if self.api.enable_request_logging {
                tracing::debug!(
                    request_id = %pending.id,
                    status = response.status,
                    "← {} {}", request.method, request.path
                );
            }
            return Ok(response);
        }

        let message = response
            .message()
            .map(str::to_string)
            .unwrap_or_else(|| format!("{} {} returned {}", request.method, request.path, response.status));

        match response.status {
            403 => tracing::warn!(request_id = %pending.id, %message, "access denied"),
            status if status >= 500 => tracing::error!(request_id = %pending.id, status, %message, "server error"),
            status => tracing::debug!(request_id = %pending.id, status, %message, "request rejected"),
        }

        Err(ClientError::from_status(response.status, message))
    }
}
