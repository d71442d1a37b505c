//! Port for user-visible blocking notices (toasts, alerts).

use parking_lot::Mutex;

use crate::domain::Notice;

/// Surface that shows a notice to the user.
#[cfg_attr(test, mockall::automock)]
pub trait NoticeSink: Send + Sync {
    /// Show `notice`.
    fn show(&self, notice: &Notice);
}

/// Sink that keeps every notice it receives, in order.
#[derive(Debug, Default)]
pub struct RecordingNoticeSink {
    shown: Mutex<Vec<Notice>>,
}

impl RecordingNoticeSink {
    /// Notices shown so far.
    pub fn shown(&self) -> Vec<Notice> {
        self.shown.lock().clone()
    }
}

impl NoticeSink for RecordingNoticeSink {
    fn show(&self, notice: &Notice) {
        self.shown.lock().push(notice.clone());
    }
}
