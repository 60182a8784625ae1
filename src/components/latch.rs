//! # Notifying boolean gate.
//!
//! [`Latch`] is the suspension primitive behind the component state machine:
//! a boolean flag whose `wait()` suspends cooperatively until the flag is
//! true. Built on [`tokio::sync::watch`] so that:
//!
//! - setting the flag wakes **every** waiter (broadcast semantics);
//! - a waiter that arrives after the flag was set completes immediately;
//! - no wakeup is ever lost between a check and a suspend.
//!
//! Each component cell carries three latches: `active`, `released`, and
//! `faulted` (the failure side-channel that keeps concurrent joins settleable).

use tokio::sync::watch;

/// Boolean flag with broadcast wait-until-true.
#[derive(Debug)]
pub(crate) struct Latch {
    tx: watch::Sender<bool>,
}

impl Latch {
    /// Creates a latch with the given initial value.
    pub(crate) fn new(initial: bool) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx }
    }

    /// Sets the flag, waking all current waiters if it became true.
    pub(crate) fn set(&self, value: bool) {
        self.tx.send_replace(value);
    }

    /// Returns the current value.
    pub(crate) fn get(&self) -> bool {
        *self.tx.borrow()
    }

    /// Suspends until the flag is true. Completes immediately if it already is.
    pub(crate) async fn wait(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives in `self` for the duration of this borrow, so the
        // channel cannot close mid-wait.
        let _ = rx.wait_for(|ready| *ready).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn test_wait_completes_when_already_set() {
        let latch = Latch::new(true);
        latch.wait().await;
        assert!(latch.get());
    }

    #[tokio::test]
    async fn test_wait_suspends_until_set() {
        let latch = Arc::new(Latch::new(false));
        let waiter = {
            let latch = Arc::clone(&latch);
            tokio::spawn(async move { latch.wait().await })
        };

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(!waiter.is_finished());

        latch.set(true);
        waiter.await.unwrap();
    }

    #[tokio::test]
    async fn test_wakes_all_waiters() {
        let latch = Arc::new(Latch::new(false));
        let waiters: Vec<_> = (0..4)
            .map(|_| {
                let latch = Arc::clone(&latch);
                tokio::spawn(async move { latch.wait().await })
            })
            .collect();

        latch.set(true);
        for w in waiters {
            w.await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_reset() {
        let latch = Latch::new(true);
        latch.set(false);
        assert!(!latch.get());
        latch.set(true);
        assert!(latch.get());
    }
}
