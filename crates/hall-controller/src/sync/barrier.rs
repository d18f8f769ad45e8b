//! Session barrier: holds admitted participants until the session ends.
//!
//! The "session over" flag lives inside a `watch` channel, so checking the
//! flag and starting to wait happen against the same guarded value. A task
//! that arrives after the end signal sees `true` and returns at once; a task
//! that arrives before it is woken by the send. There is no window between
//! the two.

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::errors::{HcError, SyncMisuse};

/// One-shot, persisted broadcast.
#[derive(Debug)]
pub struct SessionBarrier {
    over: watch::Sender<bool>,
}

impl Default for SessionBarrier {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionBarrier {
    #[must_use]
    pub fn new() -> Self {
        let (over, _) = watch::channel(false);
        Self { over }
    }

    /// Declare the session over and release every current and future waiter.
    ///
    /// # Errors
    ///
    /// Returns `Misuse(SessionReended)` if the session was already over.
    pub fn signal_end(&self) -> Result<(), HcError> {
        let flipped = self.over.send_if_modified(|over| {
            if *over {
                false
            } else {
                *over = true;
                true
            }
        });

        if !flipped {
            error!(target: "hc.barrier", "Session end signalled twice");
            return Err(SyncMisuse::SessionReended.into());
        }

        info!(
            target: "hc.barrier",
            waiters = self.over.receiver_count(),
            "Session end signalled"
        );
        Ok(())
    }

    /// Wait until the session is over.
    ///
    /// Returns immediately if the session already ended, even when `cancel`
    /// has fired.
    ///
    /// # Errors
    ///
    /// Returns `Cancelled` if `cancel` fires first.
    pub async fn await_end(&self, cancel: &CancellationToken) -> Result<(), HcError> {
        let mut over = self.over.subscribe();
        if *over.borrow_and_update() {
            return Ok(());
        }

        tokio::select! {
            biased;
            // Both can be ready at once; the end signal wins.
            () = cancel.cancelled() => {
                if *self.over.borrow() {
                    Ok(())
                } else {
                    Err(HcError::Cancelled)
                }
            }
            result = over.wait_for(|over| *over) => result
                .map(|_| ())
                .map_err(|_| HcError::Internal("session barrier dropped".to_string())),
        }
    }

    #[must_use]
    pub fn is_over(&self) -> bool {
        *self.over.borrow()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn test_all_waiters_released_together() {
        let barrier = Arc::new(SessionBarrier::new());
        let cancel = CancellationToken::new();

        let waiters: Vec<_> = (0..50)
            .map(|_| {
                let barrier = Arc::clone(&barrier);
                let cancel = cancel.clone();
                tokio::spawn(async move { barrier.await_end(&cancel).await })
            })
            .collect();

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(waiters.iter().all(|w| !w.is_finished()));

        barrier.signal_end().unwrap();
        for waiter in waiters {
            waiter.await.unwrap().unwrap();
        }
        assert!(barrier.is_over());
    }

    #[tokio::test]
    async fn test_late_arrival_returns_immediately() {
        let barrier = SessionBarrier::new();
        barrier.signal_end().unwrap();

        // Even with the token already cancelled the persisted flag wins
        let cancel = CancellationToken::new();
        cancel.cancel();
        barrier.await_end(&cancel).await.unwrap();
    }

    #[test]
    fn test_second_signal_is_misuse() {
        let barrier = SessionBarrier::new();
        barrier.signal_end().unwrap();

        let result = barrier.signal_end();
        assert!(matches!(
            result,
            Err(HcError::Misuse(SyncMisuse::SessionReended))
        ));
        assert!(barrier.is_over());
    }

    #[tokio::test]
    async fn test_cancel_releases_waiter() {
        let barrier = Arc::new(SessionBarrier::new());
        let cancel = CancellationToken::new();

        let waiter = {
            let barrier = Arc::clone(&barrier);
            let cancel = cancel.clone();
            tokio::spawn(async move { barrier.await_end(&cancel).await })
        };

        tokio::task::yield_now().await;
        cancel.cancel();

        assert!(matches!(waiter.await.unwrap(), Err(HcError::Cancelled)));
        assert!(!barrier.is_over());
    }

    #[tokio::test]
    async fn test_end_then_cancel_still_releases_parked_waiter() {
        let barrier = Arc::new(SessionBarrier::new());
        let cancel = CancellationToken::new();

        let waiter = {
            let barrier = Arc::clone(&barrier);
            let cancel = cancel.clone();
            tokio::spawn(async move { barrier.await_end(&cancel).await })
        };

        // Park the waiter, then make both branches ready before it is polled
        tokio::task::yield_now().await;
        assert!(!waiter.is_finished());
        barrier.signal_end().unwrap();
        cancel.cancel();

        waiter.await.unwrap().unwrap();
        assert!(barrier.is_over());
    }

    #[tokio::test]
    async fn test_signal_racing_subscribe_is_not_lost() {
        for _ in 0..200 {
            let barrier = Arc::new(SessionBarrier::new());
            let cancel = CancellationToken::new();

            let waiter = {
                let barrier = Arc::clone(&barrier);
                let cancel = cancel.clone();
                tokio::spawn(async move { barrier.await_end(&cancel).await })
            };
            barrier.signal_end().unwrap();

            tokio::time::timeout(Duration::from_secs(1), waiter)
                .await
                .expect("waiter must not miss the end signal")
                .unwrap()
                .unwrap();
        }
    }
}
