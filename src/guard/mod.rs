//! Navigation guard chain.
//!
//! Guards run in registration order against a resolved [`Target`] and the
//! current [`SessionSnapshot`]. The first guard that does not answer
//! [`GuardDecision::Proceed`] decides the navigation; later guards never run.
//! The session is initialized lazily, right before the first guard that
//! reads it for the target. Pages with no access requirements never
//! trigger a session check.

mod guards;

pub use guards::{
    AuthenticationGuard, CompleteProfileGuard, EmailVerifiedGuard, GuestOnlyGuard,
    MaintenanceGuard, PermissionGuard,
};

use std::fmt;
use std::sync::Arc;

use crate::config::NavigationConfig;
use crate::router::Target;
use crate::session::{SessionHolder, SessionInitializer, SessionSnapshot};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RedirectReason {
    Maintenance,
    AlreadyAuthenticated,
    Unauthenticated,
    MissingPermission(String),
    EmailUnverified,
    IncompleteProfile,
}

impl fmt::Display for RedirectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Maintenance => write!(f, "maintenance mode"),
            Self::AlreadyAuthenticated => write!(f, "already authenticated"),
            Self::Unauthenticated => write!(f, "authentication required"),
            Self::MissingPermission(p) => write!(f, "missing permission '{}'", p),
            Self::EmailUnverified => write!(f, "email not verified"),
            Self::IncompleteProfile => write!(f, "profile incomplete"),
        }
    }
}

/// Named route to go to instead, with its query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    pub route: String,
    pub query: Vec<(String, String)>,
    pub reason: RedirectReason,
}

impl Redirect {
    pub fn new(route: &str, reason: RedirectReason) -> Self {
        Self {
            route: route.to_string(),
            query: Vec::new(),
            reason,
        }
    }

    pub fn with_query(mut self, key: &str, value: &str) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Proceed,
    Redirect(Redirect),
}

impl GuardDecision {
    pub fn redirect(&self) -> Option<&Redirect> {
        match self {
            Self::Proceed => None,
            Self::Redirect(r) => Some(r),
        }
    }
}

pub struct GuardContext<'a> {
    pub target: &'a Target,
    pub session: &'a SessionSnapshot,
}

/// One access rule evaluated during navigation
pub trait Guard: Send + Sync {
    fn name(&self) -> &'static str;

    /// Whether `check` reads the session for this target. The session is
    /// initialized before the first guard that answers true.
    fn needs_session(&self, target: &Target) -> bool;

    fn check(&self, ctx: &GuardContext<'_>) -> GuardDecision;
}

pub type GuardBox = Box<dyn Guard>;

pub struct GuardChain {
    guards: Vec<GuardBox>,
    initializer: Arc<dyn SessionInitializer>,
    session: Arc<dyn SessionHolder>,
}

impl GuardChain {
    /// Empty chain; every navigation proceeds
    pub fn new(initializer: Arc<dyn SessionInitializer>, session: Arc<dyn SessionHolder>) -> Self {
        Self {
            guards: Vec::new(),
            initializer,
            session,
        }
    }

    /// Maintenance, guest-only, authentication, permission, verified email,
    /// complete profile; in that order
    pub fn standard(
        config: &NavigationConfig,
        initializer: Arc<dyn SessionInitializer>,
        session: Arc<dyn SessionHolder>,
    ) -> Self {
        Self::new(initializer, session)
            .with_guard(MaintenanceGuard::new(config.maintenance_mode, &config.maintenance_route))
            .with_guard(GuestOnlyGuard::new(&config.landing_route))
            .with_guard(AuthenticationGuard::new(&config.login_route))
            .with_guard(PermissionGuard::new(&config.forbidden_route))
            .with_guard(EmailVerifiedGuard::new(&config.email_verification_route))
            .with_guard(CompleteProfileGuard::new(
                &config.profile_setup_route,
                config.required_profile_fields.clone(),
            ))
    }

    pub fn with_guard(mut self, guard: impl Guard + 'static) -> Self {
        tracing::debug!("Registered guard '{}'", guard.name());
        self.guards.push(Box::new(guard));
        self
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.guards.iter().map(|g| g.name()).collect()
    }

    /// Decide a navigation, initializing the session at most once and only
    /// when a guard that reads it for this target is reached
    pub async fn decide(&self, target: &Target) -> GuardDecision {
        let mut snapshot = self.session.snapshot().await;
        let mut initialized = false;

        for guard in &self.guards {
            if !initialized && guard.needs_session(target) {
                self.initializer.ensure_initialized().await;
                snapshot = self.session.snapshot().await;
                initialized = true;
            }

            let decision = run_guard(guard.as_ref(), target, &snapshot);
            if decision != GuardDecision::Proceed {
                return decision;
            }
        }

        GuardDecision::Proceed
    }

    /// Decide against a given snapshot without touching the session
    pub fn evaluate(&self, target: &Target, session: &SessionSnapshot) -> GuardDecision {
        self.guards
            .iter()
            .map(|guard| run_guard(guard.as_ref(), target, session))
            .find(|decision| *decision != GuardDecision::Proceed)
            .unwrap_or(GuardDecision::Proceed)
    }
}

fn run_guard(guard: &dyn Guard, target: &Target, session: &SessionSnapshot) -> GuardDecision {
    let decision = guard.check(&GuardContext { target, session });
    match &decision {
        GuardDecision::Proceed => {
            tracing::trace!(guard = guard.name(), route = %target.name, "guard passed");
        }
        GuardDecision::Redirect(r) => {
            tracing::debug!(
                guard = guard.name(),
                route = %target.name,
                to = %r.route,
                reason = %r.reason,
                "guard redirected"
            );
        }
    }
    decision
}
