//! Cancellable debounce timer
//!
//! Each `schedule` replaces the pending value and restarts the delay; only a
//! value that survives the full delay is delivered on the receiver.

use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::trace;

pub struct Debouncer<T> {
    delay: Duration,
    settled_tx: mpsc::UnboundedSender<T>,
    pending: Option<CancellationToken>,
}

impl<T: Send + 'static> Debouncer<T> {
    /// Create a debouncer and the receiver its settled values arrive on
    pub fn new(delay: Duration) -> (Self, mpsc::UnboundedReceiver<T>) {
        let (settled_tx, settled_rx) = mpsc::unbounded_channel();
        (
            Self {
                delay,
                settled_tx,
                pending: None,
            },
            settled_rx,
        )
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Restart the timer with `value`; any earlier pending value is dropped
    pub fn schedule(&mut self, value: T) {
        self.cancel();

        let token = CancellationToken::new();
        let timer_token = token.clone();
        let settled_tx = self.settled_tx.clone();
        let delay = self.delay;

        tokio::spawn(async move {
            tokio::select! {
                _ = timer_token.cancelled() => {
                    trace!("Debounce timer cancelled");
                }
                _ = tokio::time::sleep(delay) => {
                    // Receiver gone: owner shut down
                    let _ = settled_tx.send(value);
                }
            }
        });

        self.pending = Some(token);
    }

    /// Drop the pending value, if any
    pub fn cancel(&mut self) {
        if let Some(token) = self.pending.take() {
            token.cancel();
        }
    }
}

impl<T> Drop for Debouncer<T> {
    fn drop(&mut self) {
        if let Some(token) = self.pending.take() {
            token.cancel();
        }
    }
}
