//! Status/result model — the single `(message, ok)` pair the
//! presentation layer observes.

use std::sync::Arc;
use tokio::sync::watch;

/// The current user-visible status. Overwritten whole; no history.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Status {
    pub message: String,
    pub ok: bool,
}

/// Clone-safe writer handle for the status pair.
///
/// Every update replaces the pair atomically; concurrent writers race
/// and the last write wins, which is the model's contract for
/// overlapping uploads.
#[derive(Clone)]
pub struct StatusModel {
    tx: Arc<watch::Sender<Status>>,
}

impl StatusModel {
    pub fn new() -> (Self, watch::Receiver<Status>) {
        let (tx, rx) = watch::channel(Status::default());
        (Self { tx: Arc::new(tx) }, rx)
    }

    /// Replace the current pair.
    pub fn set(&self, message: impl Into<String>, ok: bool) {
        let status = Status {
            message: message.into(),
            ok,
        };
        tracing::debug!(message = %status.message, ok = status.ok, "status updated");
        // send_replace: the pair must update even with no observer attached.
        self.tx.send_replace(status);
    }

    /// Snapshot of the current pair.
    pub fn current(&self) -> Status {
        self.tx.borrow().clone()
    }

    /// A new observer of status updates.
    pub fn subscribe(&self) -> watch::Receiver<Status> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_overwrites_whole_pair() {
        let (model, rx) = StatusModel::new();
        model.set("Camera started", true);
        model.set("No match", false);
        let status = rx.borrow().clone();
        assert_eq!(status.message, "No match");
        assert!(!status.ok);
    }

    #[test]
    fn test_last_write_wins() {
        let (model, rx) = StatusModel::new();
        let a = model.clone();
        let b = model.clone();
        a.set("tick A", true);
        b.set("tick B", false);
        assert_eq!(rx.borrow().message, "tick B");
    }
}
