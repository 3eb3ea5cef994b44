use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::RwLock;

use crate::config::{ClientConfig, NavigationConfig};
use crate::error::NavigationError;
use crate::guard::{GuardChain, GuardDecision};
use crate::router::{Location, RouteTable, Target};
use crate::session::SessionService;

/// The route the application last settled on
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CurrentRoute {
    pub name: String,
    pub path: String,
    pub full_path: String,
    pub title: Option<String>,
    pub description: Option<String>,
}

impl From<&Target> for CurrentRoute {
    fn from(target: &Target) -> Self {
        Self {
            name: target.name.clone(),
            path: target.path.clone(),
            full_path: target.full_path.clone(),
            title: target.meta.title.clone(),
            description: target.meta.description.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationOutcome {
    Completed(CurrentRoute),
    /// A newer navigation started before this one finished; nothing applied
    Superseded,
}

/// Resolves paths, runs the guard chain and follows redirects until a
/// navigation settles. Only the most recently started navigation commits.
pub struct Navigator {
    table: RouteTable,
    chain: GuardChain,
    location: Arc<dyn Location>,
    max_redirects: usize,
    generation: AtomicU64,
    current: RwLock<Option<CurrentRoute>>,
}

impl Navigator {
    pub fn new(
        table: RouteTable,
        chain: GuardChain,
        location: Arc<dyn Location>,
        config: &NavigationConfig,
    ) -> Self {
        Self {
            table,
            chain,
            location,
            max_redirects: config.max_redirects,
            generation: AtomicU64::new(0),
            current: RwLock::new(None),
        }
    }

    /// Standard route table and guard chain wired to a session service
    pub fn standard(config: &ClientConfig, service: SessionService) -> Self {
        let session = service.session().clone();
        let location = service.client().location().clone();
        let chain = GuardChain::standard(&config.navigation, Arc::new(service), session);
        Self::new(RouteTable::standard(), chain, location, &config.navigation)
    }

    pub fn table(&self) -> &RouteTable {
        &self.table
    }

    pub fn chain(&self) -> &GuardChain {
        &self.chain
    }

    pub async fn current(&self) -> Option<CurrentRoute> {
        self.current.read().await.clone()
    }

    /// Run the guard chain once for a path without following redirects
    pub async fn decide(&self, path: &str) -> GuardDecision {
        self.chain.decide(&self.table.resolve(path)).await
    }

    pub async fn navigate(&self, path: &str) -> Result<NavigationOutcome, NavigationError> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let mut target = self.table.resolve(path);
        let mut hops = 0;

        loop {
            tracing::debug!(
                from = %self.location.current_path(),
                to = %target.full_path,
                route = %target.name,
                "navigating"
            );

            let decision = self.chain.decide(&target).await;
            if self.is_stale(generation) {
                tracing::debug!(path, "navigation superseded");
                return Ok(NavigationOutcome::Superseded);
            }

            let GuardDecision::Redirect(redirect) = decision else {
                break;
            };

            hops += 1;
            if hops > self.max_redirects {
                tracing::warn!(path, hops = self.max_redirects, "redirect loop");
                return Err(NavigationError::RedirectLoop {
                    path: path.to_string(),
                    hops: self.max_redirects,
                });
            }

            let href = self
                .table
                .href(&redirect.route, &redirect.query)
                .unwrap_or_else(|| redirect.route.clone());
            target = self.table.resolve(&href);
        }

        let mut current = self.current.write().await;
        if self.is_stale(generation) {
            tracing::debug!(path, "navigation superseded");
            return Ok(NavigationOutcome::Superseded);
        }

        let route = CurrentRoute::from(&target);
        self.location.push(&target.full_path);
        *current = Some(route.clone());

        tracing::info!(
            route = %route.name,
            path = %route.full_path,
            title = route.title.as_deref().unwrap_or(""),
            "navigation completed"
        );
        Ok(NavigationOutcome::Completed(route))
    }

    fn is_stale(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) != generation
    }
}
