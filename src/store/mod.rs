//! Containers for server-backed data.
//!
//! A [`Resource`] holds the last response for one target. Every `load`
//! takes a ticket; only the newest ticket may write, so a slow response
//! from an older request never overwrites fresher state.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::error::ClientError;

#[derive(Debug, Clone, PartialEq)]
pub struct ResourceState<T> {
    pub data: Option<T>,
    pub loading: bool,
    pub error: Option<String>,
    pub last_update: Option<DateTime<Utc>>,
}

impl<T> Default for ResourceState<T> {
    fn default() -> Self {
        Self {
            data: None,
            loading: false,
            error: None,
            last_update: None,
        }
    }
}

/// Outcome of one `load` call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Committed,
    /// A newer load was started; this response was dropped
    Stale,
}

pub struct Resource<T> {
    name: String,
    state: RwLock<ResourceState<T>>,
    seq: AtomicU64,
}

impl<T: Clone + Send + Sync> Resource<T> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: RwLock::new(ResourceState::default()),
            seq: AtomicU64::new(0),
        }
    }

    pub async fn state(&self) -> ResourceState<T> {
        self.state.read().await.clone()
    }

    pub async fn data(&self) -> Option<T> {
        self.state.read().await.data.clone()
    }

    /// Run `fetch` and store its result if no newer load started meanwhile
    pub async fn load<F>(&self, fetch: F) -> LoadOutcome
    where
        F: Future<Output = Result<T, ClientError>>,
    {
        let ticket = self.seq.fetch_add(1, Ordering::SeqCst) + 1;
        {
            let mut state = self.state.write().await;
            state.loading = true;
            state.error = None;
        }

        let result = fetch.await;

        let mut state = self.state.write().await;
        if self.seq.load(Ordering::SeqCst) != ticket {
            tracing::debug!(resource = %self.name, ticket, "dropping stale response");
            return LoadOutcome::Stale;
        }

        match result {
            Ok(data) => {
                state.data = Some(data);
                state.last_update = Some(Utc::now());
            }
            Err(err) => {
                tracing::debug!(resource = %self.name, error = %err, "load failed");
                state.error = Some(err.message().to_string());
            }
        }
        state.loading = false;
        LoadOutcome::Committed
    }

    /// Replace the data locally, invalidating any load still in flight
    pub async fn set(&self, data: T) {
        self.seq.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state.write().await;
        state.data = Some(data);
        state.loading = false;
        state.error = None;
        state.last_update = Some(Utc::now());
    }

    pub async fn clear(&self) {
        self.seq.fetch_add(1, Ordering::SeqCst);
        *self.state.write().await = ResourceState::default();
    }

    pub async fn clear_error(&self) {
        self.state.write().await.error = None;
    }
}
