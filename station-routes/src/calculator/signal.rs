//! Cooperative cancellation and manual retry signals.

use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use tokio::sync::{Notify, watch};

/// Cooperative cancellation flag shared between a session and one epoch.
///
/// Cancelling never aborts a request already in flight; the calculator
/// checks the token around every request and delay and stops there.
#[derive(Debug, Clone)]
pub struct CancelToken {
    state: Arc<watch::Sender<bool>>,
}

impl CancelToken {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self {
            state: Arc::new(tx),
        }
    }

    /// Mark the token cancelled. Idempotent.
    pub fn cancel(&self) {
        self.state.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.state.borrow()
    }

    /// Resolves once the token is cancelled.
    pub async fn cancelled(&self) {
        let mut rx = self.state.subscribe();
        // The sender lives as long as `self`, so this only returns on cancel.
        let _ = rx.wait_for(|cancelled| *cancelled).await;
    }

    /// Sleep for `duration` unless cancelled first.
    ///
    /// Returns `true` if the full delay elapsed and the token is still live.
    pub async fn sleep(&self, duration: Duration) -> bool {
        tokio::select! {
            _ = tokio::time::sleep(duration) => !self.is_cancelled(),
            _ = self.cancelled() => false,
        }
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

/// Request to start the next retry pass now instead of after the back-off.
///
/// A trigger fired while no pass is waiting is remembered and consumed by
/// the next back-off. One still pending when a batch ends is left for the
/// owner to collect with [`RetryTrigger::take_pending`].
#[derive(Debug, Clone, Default)]
pub struct RetryTrigger {
    notify: Arc<Notify>,
}

impl RetryTrigger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fire(&self) {
        self.notify.notify_one();
    }

    pub async fn fired(&self) {
        self.notify.notified().await;
    }

    /// Consume a remembered trigger without waiting.
    ///
    /// Returns whether one was pending.
    pub fn take_pending(&self) -> bool {
        self.notify.notified().now_or_never().is_some()
    }
}
