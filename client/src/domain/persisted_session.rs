//! Session store layered over two durable string slots.
//!
//! The token and the JSON user record are written under
//! [`TOKEN_SLOT`] and [`USER_RECORD_SLOT`]. Writes are all-or-nothing from the
//! reader's point of view: the record is serialised before either slot is
//! touched, and a failed second write rolls the first one back.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use crate::domain::ports::{
    SessionStore, SessionStoreError, SlotStorage, TOKEN_SLOT, USER_RECORD_SLOT,
};
use crate::domain::{AccessToken, PersistedSession, UserRecord};

/// [`SessionStore`] backed by any [`SlotStorage`].
#[derive(Clone)]
pub struct PersistedSessionStore {
    slots: Arc<dyn SlotStorage>,
}

impl PersistedSessionStore {
    /// Wrap a slot backend.
    pub fn new(slots: Arc<dyn SlotStorage>) -> Self {
        Self { slots }
    }
}

#[async_trait]
impl SessionStore for PersistedSessionStore {
    async fn save(&self, session: &PersistedSession) -> Result<(), SessionStoreError> {
        let record = serde_json::to_string(&session.user)
            .map_err(|err| SessionStoreError::serialization(err.to_string()))?;

        self.slots.set(TOKEN_SLOT, session.token.as_str())?;
        if let Err(err) = self.slots.set(USER_RECORD_SLOT, &record) {
            if let Err(rollback) = self.slots.remove(TOKEN_SLOT) {
                warn!(error = %rollback, "failed to roll back session token slot");
            }
            return Err(err.into());
        }
        Ok(())
    }

    async fn clear(&self) -> Result<(), SessionStoreError> {
        let token = self.slots.remove(TOKEN_SLOT);
        let record = self.slots.remove(USER_RECORD_SLOT);
        token?;
        record?;
        Ok(())
    }

    async fn load(&self) -> Result<Option<PersistedSession>, SessionStoreError> {
        let Some(raw_token) = self.slots.get(TOKEN_SLOT)? else {
            return Ok(None);
        };
        let Some(raw_record) = self.slots.get(USER_RECORD_SLOT)? else {
            return Ok(None);
        };

        let Ok(token) = AccessToken::new(raw_token) else {
            warn!("persisted session token is blank; treating session as absent");
            return Ok(None);
        };
        match serde_json::from_str::<UserRecord>(&raw_record) {
            Ok(user) => Ok(Some(PersistedSession { token, user })),
            Err(err) => {
                warn!(error = %err, "persisted user record is corrupt; treating session as absent");
                Ok(None)
            }
        }
    }
}
