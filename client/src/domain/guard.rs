//! Navigation admission guard.
//!
//! Every navigation intent passes through [`NavigationGuard::admit`]. The
//! guard settles the session first (bootstrapping from the persisted store
//! when no identity is held), then checks the target route's requirements.
//! It always terminates in an [`Admission`]: bootstrap failures are logged
//! and the navigation proceeds as signed out.

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use super::{LOGIN_PATH, Location, REDIRECT_PARAM, RouteTable, SessionState};

/// Message shown when a non-administrator targets an admin route.
pub const ADMIN_ONLY_MESSAGE: &str =
    "Insufficient permissions: this page is available to administrators only.";

/// Why a navigation was redirected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DenialReason {
    /// The route needs a signed-in session.
    AuthRequired,
    /// The route needs an administrator.
    AdminRequired,
}

impl DenialReason {
    /// Stable reason code, also used as the login redirect query value.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::AuthRequired => "auth_required",
            Self::AdminRequired => "admin_required",
        }
    }
}

impl fmt::Display for DenialReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Blocking message the user must see before a redirect takes effect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    /// Denial that produced the notice.
    pub reason: DenialReason,
    /// Human-readable text.
    pub message: String,
}

/// Guard decision for one navigation attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    /// Navigation may complete at `location`.
    Admit {
        /// Admitted target.
        location: Location,
    },
    /// Navigation must go to `location` instead.
    Redirect {
        /// Replacement target.
        location: Location,
        /// Why the original target was refused.
        reason: DenialReason,
        /// Notice to show before redirecting.
        notice: Option<Notice>,
    },
}

impl Admission {
    /// Whether the target was admitted as-is.
    pub fn is_admitted(&self) -> bool {
        matches!(self, Self::Admit { .. })
    }

    /// Location the navigation ends up at after this decision.
    pub fn location(&self) -> &Location {
        match self {
            Self::Admit { location } | Self::Redirect { location, .. } => location,
        }
    }
}

/// Decides whether navigation to a location may proceed.
#[derive(Clone)]
pub struct NavigationGuard {
    session: Arc<SessionState>,
    routes: Arc<RouteTable>,
}

impl NavigationGuard {
    /// Build a guard over `session` and the static `routes`.
    pub fn new(session: Arc<SessionState>, routes: Arc<RouteTable>) -> Self {
        Self { session, routes }
    }

    /// Session state the guard reads.
    pub fn session(&self) -> &Arc<SessionState> {
        &self.session
    }

    /// Route table the guard reads.
    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    /// Decide the fate of a navigation to `target`.
    pub async fn admit(&self, target: &Location) -> Admission {
        if !self.session.is_logged_in() {
            if let Err(err) = self.session.settle().await {
                debug!(error = %err, target = %target, "evaluating navigation as signed out");
            }
        }

        if self.routes.is_bypass(target) {
            debug!(target = %target, "admitted bypass route");
            return Admission::Admit {
                location: target.clone(),
            };
        }

        let requirement = self.routes.requirement_for(target);
        if requirement.requires_auth && !self.session.is_logged_in() {
            let reason = DenialReason::AuthRequired;
            debug!(target = %target, reason = %reason, "redirecting to login");
            return Admission::Redirect {
                location: Location::from_path(LOGIN_PATH).with_query(REDIRECT_PARAM, reason.code()),
                reason,
                notice: None,
            };
        }

        if requirement.requires_admin && !self.session.is_admin() {
            let reason = DenialReason::AdminRequired;
            debug!(target = %target, reason = %reason, "redirecting to root");
            return Admission::Redirect {
                location: Location::root(),
                reason,
                notice: Some(Notice {
                    reason,
                    message: ADMIN_ONLY_MESSAGE.to_owned(),
                }),
            };
        }

        debug!(target = %target, "admitted");
        Admission::Admit {
            location: target.clone(),
        }
    }
}
