//! Application-wide session events.
//!
//! Stateful components subscribe here and discard their own state on
//! [`SessionEvent::Reset`] instead of relying on a full page reload.

use tokio::sync::broadcast;

use super::UserId;

const DEFAULT_CAPACITY: usize = 32;

/// Session lifecycle notifications.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// A user signed in during this page lifetime.
    SignedIn {
        /// Identifier of the signed-in user.
        user_id: UserId,
    },
    /// Bootstrap adopted a persisted session.
    Restored {
        /// Identifier of the restored user.
        user_id: UserId,
    },
    /// The session was cleared.
    SignedOut,
    /// Every component should drop per-user state.
    Reset,
    /// Bootstrap failed and the session continues signed out.
    BootstrapFailed {
        /// Rendered bootstrap error.
        message: String,
    },
}

/// Broadcast channel carrying [`SessionEvent`]s.
#[derive(Debug, Clone)]
pub struct SessionEvents {
    sender: broadcast::Sender<SessionEvent>,
}

impl Default for SessionEvents {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl SessionEvents {
    /// Build a channel buffering at most `capacity` events per lagging
    /// subscriber.
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Subscribe to events published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.sender.subscribe()
    }

    /// Publish `event`; having no subscribers is fine.
    pub fn publish(&self, event: SessionEvent) {
        let _ = self.sender.send(event);
    }
}
