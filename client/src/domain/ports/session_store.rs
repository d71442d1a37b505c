//! Ports for the persisted session mirror.
//!
//! `SlotStorage` is the raw durable surface: two string slots that survive a
//! page reload (browser local storage, a directory on disk, a map in tests).
//! `SessionStore` is what session state talks to: whole-session save, clear
//! and load with the all-or-nothing guarantees layered on top of the slots.

use async_trait::async_trait;

use crate::domain::PersistedSession;

use super::define_port_error;

/// Slot holding the opaque session token.
pub const TOKEN_SLOT: &str = "pbr_token";
/// Slot holding the serialised user record.
pub const USER_RECORD_SLOT: &str = "pbr_user";

define_port_error! {
    /// Errors raised by slot storage backends.
    pub enum SlotStorageError {
        /// The backing store could not be reached or refused the operation.
        Backend { message: String } => "session slot storage failed: {message}",
    }
}

define_port_error! {
    /// Errors raised by session store implementations.
    pub enum SessionStoreError {
        /// The slot backend failed.
        Backend { message: String } => "session store backend failed: {message}",
        /// The user record could not be serialised.
        Serialization { message: String } => "session record serialisation failed: {message}",
    }
}

impl From<SlotStorageError> for SessionStoreError {
    fn from(value: SlotStorageError) -> Self {
        match value {
            SlotStorageError::Backend { message } => Self::backend(message),
        }
    }
}

/// Durable string-keyed slots.
///
/// Access is single-writer and last-write-wins; implementations need no
/// cross-call coordination.
#[cfg_attr(test, mockall::automock)]
pub trait SlotStorage: Send + Sync {
    /// Read a slot; `Ok(None)` when it was never written or was removed.
    fn get(&self, key: &str) -> Result<Option<String>, SlotStorageError>;

    /// Write a slot, replacing any prior value.
    fn set(&self, key: &str, value: &str) -> Result<(), SlotStorageError>;

    /// Remove a slot; removing an absent slot succeeds.
    fn remove(&self, key: &str) -> Result<(), SlotStorageError>;
}

/// Session-level persistence used by session state.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Persist `session`, replacing any prior value. Never leaves a partial
    /// write behind: if the record cannot be serialised nothing is written.
    async fn save(&self, session: &PersistedSession) -> Result<(), SessionStoreError>;

    /// Remove the persisted session. Idempotent.
    async fn clear(&self) -> Result<(), SessionStoreError>;

    /// Read the persisted session.
    ///
    /// Returns `Ok(None)` when either slot is missing or the record is
    /// corrupt; only backend failures surface as errors.
    async fn load(&self) -> Result<Option<PersistedSession>, SessionStoreError>;
}
