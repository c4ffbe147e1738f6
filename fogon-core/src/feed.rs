//! src/feed.rs
//!
//! Unsubscribe token shared by every listener task in the crate. Listener
//! loops select on the paired watch receiver and re-check it immediately
//! before invoking a callback, so once `unsubscribe` returns no new callback
//! starts; a callback already executing is allowed to finish.

use tokio::sync::watch;

/// Handle that tears down one subscription's listener task.
pub struct Subscription {
    shutdown_tx: watch::Sender<bool>,
}

impl Subscription {
    /// Creates the token and the shutdown receiver its listener task watches.
    pub(crate) fn channel() -> (Self, watch::Receiver<bool>) {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        (Self { shutdown_tx }, shutdown_rx)
    }

    /// Stops the listener. Safe to call more than once; later calls are
    /// no-ops.
    pub fn unsubscribe(&self) {
        // send_replace still flips the flag when the listener already exited
        // and dropped its receiver.
        self.shutdown_tx.send_replace(true);
    }

    pub fn is_stopped(&self) -> bool {
        *self.shutdown_tx.borrow()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unsubscribe_twice_is_harmless() {
        let (subscription, mut shutdown_rx) = Subscription::channel();
        assert!(!subscription.is_stopped());

        subscription.unsubscribe();
        subscription.unsubscribe();

        assert!(subscription.is_stopped());
        shutdown_rx.changed().await.expect("sender still alive");
        assert!(*shutdown_rx.borrow());
    }

    #[tokio::test]
    async fn unsubscribe_after_listener_exit_is_harmless() {
        let (subscription, shutdown_rx) = Subscription::channel();
        drop(shutdown_rx);
        subscription.unsubscribe();
        subscription.unsubscribe();
        assert!(subscription.is_stopped());
    }
}
