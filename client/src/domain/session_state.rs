//! Authoritative in-memory session for one page lifetime.
//!
//! `SessionState` owns the current [`Session`] and its [`EntitlementSet`],
//! writes identity changes through to the [`SessionStore`], and runs the
//! cold-start bootstrap that adopts a persisted session.
//!
//! Mutations are single-writer. A short `parking_lot` lock guards each field
//! assignment and is never held across an `.await`. A generation counter,
//! bumped on every login and logout, lets an in-flight bootstrap notice that
//! the identity changed underneath it and discard its stale read. An explicit
//! login or logout also settles the page lifetime: a later bootstrap leaves
//! the store unread.

use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use super::ports::{SessionStore, SessionStoreError};
use super::{
    AccessToken, EntitlementSet, ItemId, Location, Session, SessionEvent, SessionEvents, UserId,
    UserRecord,
};

/// Bootstrap failure: the persisted store could not be read.
///
/// Corrupt or missing records are not failures; they load as absent.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("session bootstrap failed: {0}")]
pub struct BootstrapError(#[from] pub SessionStoreError);

/// What a bootstrap run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BootstrapOutcome {
    /// A session was already active; the store was not read.
    AlreadySignedIn,
    /// The persisted session was adopted.
    Restored {
        /// Identifier of the restored user.
        user_id: UserId,
    },
    /// Nothing usable was persisted; the session stays signed out.
    NoSession,
    /// A login or logout determined the identity before or during the read,
    /// so the persisted record was not adopted.
    Superseded,
}

/// Result of [`SessionState::logout`]: where the application should go next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedOut {
    /// Location to move to, always the root.
    pub redirect: Location,
    /// Set when the persisted mirror could not be cleared. The next page
    /// lifetime may restore the old session.
    pub store_error: Option<SessionStoreError>,
}

/// Identity epoch: changes on every login and logout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionGeneration(u64);

#[derive(Debug, Default)]
struct Inner {
    session: Session,
    entitlements: EntitlementSet,
    generation: u64,
}

/// Injected session context shared by the guard and use-case services.
pub struct SessionState {
    inner: RwLock<Inner>,
    store: Arc<dyn SessionStore>,
    events: SessionEvents,
    bootstrap: OnceCell<Result<BootstrapOutcome, BootstrapError>>,
}

impl SessionState {
    /// Build a signed-out, unsettled session state.
    pub fn new(store: Arc<dyn SessionStore>, events: SessionEvents) -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
            store,
            events,
            bootstrap: OnceCell::new(),
        }
    }

    /// Event channel this state publishes on.
    pub fn events(&self) -> &SessionEvents {
        &self.events
    }

    /// Adopt `user`/`token` as the current identity.
    ///
    /// The in-memory switch happens before the first suspension point, so
    /// [`Self::is_logged_in`] is `true` as soon as this future is polled.
    /// Entitlements are reset. The returned error reports a failed
    /// write-through; the in-memory session is signed in regardless.
    pub async fn login(&self, user: UserRecord, token: AccessToken) -> Result<(), SessionStoreError> {
        let user_id = user.id().clone();
        let persisted = {
            let mut inner = self.inner.write();
            inner.session.sign_in(user, token);
            inner.entitlements.clear();
            inner.generation += 1;
            inner.session.persisted().cloned()
        };
        info!(user_id = %user_id, "signed in");
        self.events.publish(SessionEvent::SignedIn { user_id });

        match persisted {
            Some(record) => self.store.save(&record).await,
            None => Ok(()),
        }
    }

    /// Sign out: clear the identity, entitlements and persisted mirror, then
    /// publish [`SessionEvent::SignedOut`] followed by [`SessionEvent::Reset`].
    ///
    /// In-memory state is cleared even when the store fails; the failure is
    /// logged and reported in [`SignedOut::store_error`].
    pub async fn logout(&self) -> SignedOut {
        let previous = {
            let mut inner = self.inner.write();
            let previous = inner.session.user_id().cloned();
            inner.session.sign_out();
            inner.entitlements.clear();
            inner.generation += 1;
            previous
        };
        let store_error = self.store.clear().await.err();

        match &previous {
            Some(user_id) => info!(user_id = %user_id, "signed out"),
            None => debug!("sign-out requested without an active session"),
        }
        if let Some(err) = &store_error {
            warn!(error = %err, "saved session could not be removed");
        }
        self.events.publish(SessionEvent::SignedOut);
        self.events.publish(SessionEvent::Reset);

        SignedOut {
            redirect: Location::root(),
            store_error,
        }
    }

    /// Recover a persisted session after a cold start.
    ///
    /// A no-op while signed in, and after any login or logout in this page
    /// lifetime. Otherwise the store is read and, if it holds a record, that
    /// record becomes the session without contacting the identity provider.
    ///
    /// # Errors
    /// Returns [`BootstrapError`] when the store backend fails; the session
    /// stays signed out.
    pub async fn init(&self) -> Result<BootstrapOutcome, BootstrapError> {
        let generation = {
            let inner = self.inner.read();
            if inner.session.is_logged_in() {
                return Ok(BootstrapOutcome::AlreadySignedIn);
            }
            if inner.generation != 0 {
                debug!("identity already determined; persisted session not read");
                return Ok(BootstrapOutcome::Superseded);
            }
            inner.generation
        };

        let Some(record) = self.store.load().await? else {
            return Ok(BootstrapOutcome::NoSession);
        };

        let user_id = record.user.id().clone();
        {
            let mut inner = self.inner.write();
            if inner.generation != generation || inner.session.is_logged_in() {
                debug!("discarding persisted session read superseded by a newer identity");
                return Ok(BootstrapOutcome::Superseded);
            }
            inner.session = Session::from_persisted(record);
            inner.entitlements.clear();
        }
        info!(user_id = %user_id, "restored persisted session");
        self.events.publish(SessionEvent::Restored {
            user_id: user_id.clone(),
        });
        Ok(BootstrapOutcome::Restored { user_id })
    }

    /// Run [`Self::init`] at most once for this page lifetime.
    ///
    /// Concurrent callers await the same in-flight run and all receive its
    /// result. A failed run is logged, published as
    /// [`SessionEvent::BootstrapFailed`] and not retried.
    pub async fn settle(&self) -> Result<BootstrapOutcome, BootstrapError> {
        self.bootstrap
            .get_or_init(|| async {
                let result = self.init().await;
                if let Err(err) = &result {
                    warn!(error = %err, "session bootstrap failed; continuing signed out");
                    self.events.publish(SessionEvent::BootstrapFailed {
                        message: err.to_string(),
                    });
                }
                result
            })
            .await
            .clone()
    }

    /// Whether the identity is conclusively known for this page lifetime:
    /// [`Self::settle`] completed, or a login or logout happened.
    pub fn is_settled(&self) -> bool {
        self.bootstrap.initialized() || self.inner.read().generation != 0
    }

    /// Current identity epoch.
    pub fn generation(&self) -> SessionGeneration {
        SessionGeneration(self.inner.read().generation)
    }

    /// Record ownership of `item`. Returns `true` when it was newly added.
    pub fn add_purchase(&self, item: ItemId) -> bool {
        self.inner.write().entitlements.insert(item)
    }

    /// Record ownership of `item` only if no login or logout happened since
    /// `generation` was taken.
    ///
    /// Returns `None` when the identity moved on, otherwise whether the item
    /// was newly added.
    pub fn add_purchase_in(&self, generation: SessionGeneration, item: ItemId) -> Option<bool> {
        let mut inner = self.inner.write();
        (inner.generation == generation.0).then(|| inner.entitlements.insert(item))
    }

    /// Whether the current session owns `item`.
    pub fn has_purchased(&self, item: &ItemId) -> bool {
        self.inner.read().entitlements.contains(item)
    }

    /// Snapshot of the entitlement set.
    pub fn entitlements(&self) -> EntitlementSet {
        self.inner.read().entitlements.clone()
    }

    /// Snapshot of the session.
    pub fn session(&self) -> Session {
        self.inner.read().session.clone()
    }

    /// `true` while a token is held.
    pub fn is_logged_in(&self) -> bool {
        self.inner.read().session.is_logged_in()
    }

    /// `true` only for signed-in administrators.
    pub fn is_admin(&self) -> bool {
        self.inner.read().session.is_admin()
    }

    /// Profile name, or `"Guest"`.
    pub fn display_name(&self) -> String {
        self.inner.read().session.display_name().to_owned()
    }

    /// Current user record.
    pub fn user(&self) -> Option<UserRecord> {
        self.inner.read().session.user().cloned()
    }

    /// Current session token.
    pub fn token(&self) -> Option<AccessToken> {
        self.inner.read().session.token().cloned()
    }
}

#[cfg(test)]
mod tests;
