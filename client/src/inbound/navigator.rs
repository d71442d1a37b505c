//! Navigation effect handler.
//!
//! The guard only decides; the navigator applies decisions. It follows
//! redirects until a route is admitted, shows blocking notices through the
//! [`NoticeSink`] port and records the current location.

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{info, warn};

use crate::domain::ports::NoticeSink;
use crate::domain::{Admission, DenialReason, Location, NavigationGuard, Notice, SignedOut};

/// Redirect hops followed before a navigation is abandoned.
pub const MAX_REDIRECTS: usize = 8;

/// Navigation failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NavigationError {
    /// Redirects did not settle on an admitted route.
    #[error("navigation to {target} did not settle after {hops} redirects")]
    RedirectLoop {
        /// Original target.
        target: Location,
        /// Redirects followed.
        hops: usize,
    },
}

/// One redirect taken on the way to the final location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    /// Location that was refused.
    pub from: Location,
    /// Replacement location.
    pub to: Location,
    /// Why `from` was refused.
    pub reason: DenialReason,
}

/// Result of a completed navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationOutcome {
    /// Where the navigation ended.
    pub location: Location,
    /// Redirects followed, in order.
    pub redirects: Vec<Redirect>,
    /// Notices shown along the way.
    pub notices: Vec<Notice>,
}

impl NavigationOutcome {
    /// Whether the original target was admitted without redirects.
    pub fn admitted_directly(&self) -> bool {
        self.redirects.is_empty()
    }
}

/// Applies guard decisions and tracks the current location.
pub struct Navigator {
    guard: NavigationGuard,
    notices: Arc<dyn NoticeSink>,
    current: RwLock<Location>,
}

impl Navigator {
    /// Start at the root location.
    pub fn new(guard: NavigationGuard, notices: Arc<dyn NoticeSink>) -> Self {
        Self {
            guard,
            notices,
            current: RwLock::new(Location::root()),
        }
    }

    /// Current location.
    pub fn current(&self) -> Location {
        self.current.read().clone()
    }

    /// Guard this navigator consults.
    pub fn guard(&self) -> &NavigationGuard {
        &self.guard
    }

    /// Navigate to `target`, following guard redirects.
    ///
    /// # Errors
    ///
    /// Returns [`NavigationError::RedirectLoop`] when more than
    /// [`MAX_REDIRECTS`] redirects are issued; the current location is left
    /// unchanged.
    pub async fn navigate(&self, target: Location) -> Result<NavigationOutcome, NavigationError> {
        let mut redirects = Vec::new();
        let mut notices = Vec::new();
        let mut next = target.clone();

        loop {
            match self.guard.admit(&next).await {
                Admission::Admit { location } => {
                    *self.current.write() = location.clone();
                    info!(location = %location, redirects = redirects.len(), "navigated");
                    return Ok(NavigationOutcome {
                        location,
                        redirects,
                        notices,
                    });
                }
                Admission::Redirect {
                    location,
                    reason,
                    notice,
                } => {
                    if redirects.len() == MAX_REDIRECTS {
                        warn!(target = %target, hops = MAX_REDIRECTS, "redirect loop");
                        return Err(NavigationError::RedirectLoop {
                            target,
                            hops: MAX_REDIRECTS,
                        });
                    }
                    if let Some(notice) = notice {
                        self.notices.show(&notice);
                        notices.push(notice);
                    }
                    redirects.push(Redirect {
                        from: next,
                        to: location.clone(),
                        reason,
                    });
                    next = location;
                }
            }
        }
    }

    /// Apply a sign-out: move to its redirect without consulting the guard.
    pub fn complete_sign_out(&self, signed_out: SignedOut) -> Location {
        let location = signed_out.redirect;
        *self.current.write() = location.clone();
        info!(location = %location, "signed out");
        location
    }
}
