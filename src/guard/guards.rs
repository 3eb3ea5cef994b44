use crate::guard::{Guard, GuardContext, GuardDecision, Redirect, RedirectReason};
use crate::router::Target;

/// Sends every navigation to the maintenance page while maintenance is on
pub struct MaintenanceGuard {
    enabled: bool,
    route: String,
}

impl MaintenanceGuard {
    pub fn new(enabled: bool, route: &str) -> Self {
        Self {
            enabled,
            route: route.to_string(),
        }
    }
}

impl Guard for MaintenanceGuard {
    fn name(&self) -> &'static str {
        "maintenance"
    }

    fn needs_session(&self, _target: &Target) -> bool {
        false
    }

    fn check(&self, ctx: &GuardContext<'_>) -> GuardDecision {
        if self.enabled && ctx.target.name != self.route {
            return GuardDecision::Redirect(Redirect::new(&self.route, RedirectReason::Maintenance));
        }
        GuardDecision::Proceed
    }
}

/// Keeps logged-in users away from login and registration pages
pub struct GuestOnlyGuard {
    landing_route: String,
}

impl GuestOnlyGuard {
    pub fn new(landing_route: &str) -> Self {
        Self {
            landing_route: landing_route.to_string(),
        }
    }
}

impl Guard for GuestOnlyGuard {
    fn name(&self) -> &'static str {
        "guest_only"
    }

    fn needs_session(&self, target: &Target) -> bool {
        target.meta.guest_only
    }

    fn check(&self, ctx: &GuardContext<'_>) -> GuardDecision {
        if ctx.target.meta.guest_only && ctx.session.is_authenticated() {
            return GuardDecision::Redirect(Redirect::new(
                &self.landing_route,
                RedirectReason::AlreadyAuthenticated,
            ));
        }
        GuardDecision::Proceed
    }
}

pub struct AuthenticationGuard {
    login_route: String,
}

impl AuthenticationGuard {
    pub fn new(login_route: &str) -> Self {
        Self {
            login_route: login_route.to_string(),
        }
    }
}

impl Guard for AuthenticationGuard {
    fn name(&self) -> &'static str {
        "authentication"
    }

    fn needs_session(&self, target: &Target) -> bool {
        target.meta.needs_authentication()
    }

    fn check(&self, ctx: &GuardContext<'_>) -> GuardDecision {
        if ctx.target.meta.needs_authentication() && !ctx.session.is_authenticated() {
            return GuardDecision::Redirect(
                Redirect::new(&self.login_route, RedirectReason::Unauthenticated)
                    .with_query("redirect", &ctx.target.full_path),
            );
        }
        GuardDecision::Proceed
    }
}

pub struct PermissionGuard {
    forbidden_route: String,
}

impl PermissionGuard {
    pub fn new(forbidden_route: &str) -> Self {
        Self {
            forbidden_route: forbidden_route.to_string(),
        }
    }
}

impl Guard for PermissionGuard {
    fn name(&self) -> &'static str {
        "permission"
    }

    fn needs_session(&self, target: &Target) -> bool {
        target.meta.permission.is_some()
    }

    fn check(&self, ctx: &GuardContext<'_>) -> GuardDecision {
        let Some(permission) = ctx.target.meta.permission.as_deref() else {
            return GuardDecision::Proceed;
        };
        let granted = ctx
            .session
            .principal
            .as_ref()
            .is_some_and(|p| p.has_permission(permission));

        if granted {
            GuardDecision::Proceed
        } else {
            GuardDecision::Redirect(
                Redirect::new(
                    &self.forbidden_route,
                    RedirectReason::MissingPermission(permission.to_string()),
                )
                .with_query("requiredPermission", permission),
            )
        }
    }
}

pub struct EmailVerifiedGuard {
    verification_route: String,
}

impl EmailVerifiedGuard {
    pub fn new(verification_route: &str) -> Self {
        Self {
            verification_route: verification_route.to_string(),
        }
    }
}

impl Guard for EmailVerifiedGuard {
    fn name(&self) -> &'static str {
        "email_verified"
    }

    fn needs_session(&self, target: &Target) -> bool {
        target.meta.requires_verified_email
    }

    fn check(&self, ctx: &GuardContext<'_>) -> GuardDecision {
        if !ctx.target.meta.requires_verified_email {
            return GuardDecision::Proceed;
        }
        let verified = ctx.session.principal.as_ref().is_some_and(|p| p.email_verified);
        if verified {
            GuardDecision::Proceed
        } else {
            GuardDecision::Redirect(
                Redirect::new(&self.verification_route, RedirectReason::EmailUnverified)
                    .with_query("redirect", &ctx.target.full_path),
            )
        }
    }
}

pub struct CompleteProfileGuard {
    setup_route: String,
    required_fields: Vec<String>,
}

impl CompleteProfileGuard {
    pub fn new(setup_route: &str, required_fields: Vec<String>) -> Self {
        Self {
            setup_route: setup_route.to_string(),
            required_fields,
        }
    }
}

impl Guard for CompleteProfileGuard {
    fn name(&self) -> &'static str {
        "complete_profile"
    }

    fn needs_session(&self, target: &Target) -> bool {
        target.meta.requires_complete_profile
    }

    fn check(&self, ctx: &GuardContext<'_>) -> GuardDecision {
        if !ctx.target.meta.requires_complete_profile {
            return GuardDecision::Proceed;
        }
        let complete = ctx
            .session
            .principal
            .as_ref()
            .is_some_and(|p| p.is_profile_complete(&self.required_fields));
        if complete {
            GuardDecision::Proceed
        } else {
            GuardDecision::Redirect(
                Redirect::new(&self.setup_route, RedirectReason::IncompleteProfile)
                    .with_query("redirect", &ctx.target.full_path),
            )
        }
    }
}
