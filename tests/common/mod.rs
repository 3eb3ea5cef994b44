#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

use investidor_client::api::ApiClient;
use investidor_client::config::ClientConfig;
use investidor_client::router::MemoryLocation;
use investidor_client::session::{SessionService, SessionStore};

pub const EMAIL: &str = "ana@example.com";
pub const PASSWORD: &str = "s3nh4";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token {
    Valid,
    Expired,
}

/// Shared state of the fake backend; tests inspect and steer it directly
#[derive(Default)]
pub struct Backend {
    sessions: Mutex<HashMap<String, Token>>,
    next_token: AtomicUsize,
    pub refresh_disabled: AtomicBool,
    pub me_calls: AtomicUsize,
    pub refresh_calls: AtomicUsize,
    pub login_calls: AtomicUsize,
    pub logout_calls: AtomicUsize,
    pub portfolio_calls: AtomicUsize,
    pub missing_header: AtomicUsize,
}

impl Backend {
    /// Every known session cookie becomes expired (refreshable)
    pub fn expire_sessions(&self) {
        for token in self.sessions.lock().unwrap().values_mut() {
            *token = Token::Expired;
        }
    }

    pub fn disable_refresh(&self) {
        self.refresh_disabled.store(true, Ordering::SeqCst);
    }

    pub fn active_sessions(&self) -> usize {
        self.sessions.lock().unwrap().values().filter(|t| **t == Token::Valid).count()
    }

    fn observe(&self, headers: &HeaderMap) {
        let ok = headers
            .get("x-requested-with")
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v == "XMLHttpRequest");
        if !ok {
            self.missing_header.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn token(&self, headers: &HeaderMap) -> Option<(String, Token)> {
        let cookies = headers.get(header::COOKIE)?.to_str().ok()?;
        let sid = cookies
            .split(';')
            .filter_map(|c| c.trim().split_once('='))
            .find(|(name, _)| *name == "sid")
            .map(|(_, value)| value.to_string())?;
        let state = self.sessions.lock().unwrap().get(&sid).copied()?;
        Some((sid, state))
    }

    fn is_valid(&self, headers: &HeaderMap) -> bool {
        matches!(self.token(headers), Some((_, Token::Valid)))
    }
}

pub fn hits(counter: &AtomicUsize) -> usize {
    counter.load(Ordering::SeqCst)
}

pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    pub backend: Arc<Backend>,
}

impl TestServer {
    /// Config pointing at this server, with fast timeouts
    pub fn config(&self) -> ClientConfig {
        let mut config = ClientConfig::for_base_url(&self.base_url);
        config.api.timeout_secs = 5;
        config
    }

    /// Session service over the real reqwest transport, starting at `path`
    pub fn service(&self, path: &str) -> Result<(SessionService, Arc<MemoryLocation>)> {
        let config = self.config();
        let location = Arc::new(MemoryLocation::new(path));
        let client = ApiClient::connect(&config, Arc::new(SessionStore::new()), location.clone())?;
        Ok((SessionService::new(client, &config), location))
    }
}

/// Start a fresh fake backend on a free port. Each test gets its own so
/// counters never leak between tests.
pub async fn start_server() -> Result<TestServer> {
    let port = portpicker::pick_unused_port().context("failed to pick free port")?;
    let backend = Arc::new(Backend::default());

    let app = Router::new()
        .route("/api/auth/login", post(login))
        .route("/api/auth/logout", post(logout))
        .route("/api/auth/me", get(me))
        .route("/api/auth/refresh", post(refresh))
        .route("/api/portfolio", get(portfolio))
        .with_state(backend.clone());

    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
        .await
        .context("failed to bind fake backend")?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    Ok(TestServer {
        port,
        base_url: format!("http://127.0.0.1:{}/api", port),
        backend,
    })
}

fn user() -> Value {
    json!({
        "id": 1,
        "name": "Ana Souza",
        "email": EMAIL,
        "phone": "11 98888-7777",
        "emailVerified": true,
        "permissions": ["portfolio:read"]
    })
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({"success": false, "message": "Sessão expirada"})),
    )
        .into_response()
}

async fn login(State(backend): State<Arc<Backend>>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    backend.observe(&headers);
    backend.login_calls.fetch_add(1, Ordering::SeqCst);

    if body["email"] != EMAIL || body["password"] != PASSWORD {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"success": false, "message": "Credenciais inválidas"})),
        )
            .into_response();
    }

    let sid = format!("sess-{}", backend.next_token.fetch_add(1, Ordering::SeqCst));
    backend.sessions.lock().unwrap().insert(sid.clone(), Token::Valid);

    (
        [(header::SET_COOKIE, format!("sid={}; HttpOnly; Path=/", sid))],
        Json(json!({"success": true, "message": "Login realizado", "user": user()})),
    )
        .into_response()
}

async fn logout(State(backend): State<Arc<Backend>>, headers: HeaderMap) -> Response {
    backend.observe(&headers);
    backend.logout_calls.fetch_add(1, Ordering::SeqCst);
    if let Some((sid, _)) = backend.token(&headers) {
        backend.sessions.lock().unwrap().remove(&sid);
    }
    Json(json!({"success": true})).into_response()
}

async fn me(State(backend): State<Arc<Backend>>, headers: HeaderMap) -> Response {
    backend.observe(&headers);
    backend.me_calls.fetch_add(1, Ordering::SeqCst);
    if !backend.is_valid(&headers) {
        return unauthorized();
    }
    Json(json!({"success": true, "user": user()})).into_response()
}

async fn refresh(State(backend): State<Arc<Backend>>, headers: HeaderMap) -> Response {
    backend.observe(&headers);
    backend.refresh_calls.fetch_add(1, Ordering::SeqCst);
    // Slow enough for concurrent callers to pile up behind one refresh
    tokio::time::sleep(std::time::Duration::from_millis(30)).await;

    if backend.refresh_disabled.load(Ordering::SeqCst) {
        return unauthorized();
    }
    match backend.token(&headers) {
        Some((sid, _)) => {
            backend.sessions.lock().unwrap().insert(sid, Token::Valid);
            Json(json!({"success": true})).into_response()
        }
        None => unauthorized(),
    }
}

async fn portfolio(State(backend): State<Arc<Backend>>, headers: HeaderMap) -> Response {
    backend.observe(&headers);
    backend.portfolio_calls.fetch_add(1, Ordering::SeqCst);
    if !backend.is_valid(&headers) {
        return unauthorized();
    }
    Json(json!({
        "success": true,
        "data": {"positions": [{"ticker": "PETR4", "quantity": 100}, {"ticker": "ITUB4", "quantity": 50}]}
    }))
    .into_response()
}
