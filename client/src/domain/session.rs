//! Session value and its durable mirror.
//!
//! A session is either logged out or carries both a user record and a token.
//! Holding the two together in one optional identity makes an orphaned token
//! (or a user without a token) unrepresentable.

use serde::{Deserialize, Serialize};

use super::{AccessToken, Role, UserId, UserRecord, GUEST_DISPLAY_NAME};

/// Durable mirror of a signed-in session: the `token` and `userRecord`
/// slots of the persisted session store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedSession {
    /// Session token issued by the identity provider.
    pub token: AccessToken,
    /// User fields captured at login.
    pub user: UserRecord,
}

/// Authenticated identity and credential currently active in the client.
///
/// # Examples
/// ```
/// use client::domain::{AccessToken, Session, UserId, UserRecord};
///
/// let mut session = Session::default();
/// assert!(!session.is_logged_in());
/// assert_eq!(session.display_name(), "Guest");
///
/// let user = UserRecord::new(UserId::new("u-1").unwrap(), "ada@example.com").with_name("Ada");
/// session.sign_in(user, AccessToken::new("t").unwrap());
/// assert!(session.is_logged_in());
/// assert_eq!(session.display_name(), "Ada");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    identity: Option<PersistedSession>,
}

impl Session {
    /// Build a session from a persisted record.
    pub fn from_persisted(record: PersistedSession) -> Self {
        Self {
            identity: Some(record),
        }
    }

    /// Replace the identity with `user`/`token`.
    pub fn sign_in(&mut self, user: UserRecord, token: AccessToken) {
        self.identity = Some(PersistedSession { token, user });
    }

    /// Drop the identity.
    pub fn sign_out(&mut self) {
        self.identity = None;
    }

    /// `true` while a token is present.
    pub fn is_logged_in(&self) -> bool {
        self.identity.is_some()
    }

    /// Current user record.
    pub fn user(&self) -> Option<&UserRecord> {
        self.identity.as_ref().map(|identity| &identity.user)
    }

    /// Current user identifier.
    pub fn user_id(&self) -> Option<&UserId> {
        self.user().map(UserRecord::id)
    }

    /// Current session token.
    pub fn token(&self) -> Option<&AccessToken> {
        self.identity.as_ref().map(|identity| &identity.token)
    }

    /// Current role; logged-out sessions have none.
    pub fn role(&self) -> Option<Role> {
        self.user().map(UserRecord::role)
    }

    /// `true` only for signed-in administrators.
    pub fn is_admin(&self) -> bool {
        self.role() == Some(Role::Admin)
    }

    /// Profile name, or `"Guest"` when none is known.
    pub fn display_name(&self) -> &str {
        self.user()
            .and_then(UserRecord::name)
            .unwrap_or(GUEST_DISPLAY_NAME)
    }

    /// Persistable view of the identity.
    pub fn persisted(&self) -> Option<&PersistedSession> {
        self.identity.as_ref()
    }
}
