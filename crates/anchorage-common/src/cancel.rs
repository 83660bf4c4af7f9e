//! Cooperative cancellation for concurrent pipeline jobs.
//!
//! A [`CancelToken`] is cloned into every job; jobs select on
//! [`CancelToken::cancelled`] at their blocking points so that
//! waiting-but-not-yet-started work aborts promptly while in-flight work
//! is allowed to finish.

use std::sync::Arc;

use tokio::sync::watch;

/// Clonable cancellation signal shared by all jobs of one run.
#[derive(Debug, Clone)]
pub struct CancelToken {
    sender: Arc<watch::Sender<bool>>,
    receiver: watch::Receiver<bool>,
}

impl CancelToken {
    /// Creates a new, not-yet-cancelled token.
    #[must_use]
    pub fn new() -> Self {
        let (sender, receiver) = watch::channel(false);
        Self {
            sender: Arc::new(sender),
            receiver,
        }
    }

    /// Signals cancellation to every clone of this token.
    ///
    /// Idempotent; later calls are no-ops.
    pub fn cancel(&self) {
        let _ = self.sender.send_replace(true);
    }

    /// Returns whether cancellation has been signalled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        *self.receiver.borrow()
    }

    /// Completes when cancellation is signalled.
    ///
    /// Completes immediately if the token is already cancelled.
    pub async fn cancelled(&self) {
        let mut receiver = self.receiver.clone();
        // The sender lives inside this token, so `changed` cannot observe a
        // closed channel while any clone is still alive.
        while !*receiver.borrow_and_update() {
            if receiver.changed().await.is_err() {
                return;
            }
        }
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}
