//! Admission gate: holds participants until the event starts.
//!
//! A counting release rather than a broadcast flag. The gate starts with
//! zero permits and is topped up exactly once with one permit per
//! participant, so every participant gets exactly one admission no matter
//! when it started waiting. Permits are consumed for good; they are never
//! returned to the pool.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::errors::{HcError, SyncMisuse};

/// Proof that a participant passed the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GatePass {
    /// 1-based position in the order permits were granted.
    pub order: u32,
}

/// One-shot counting gate.
#[derive(Debug)]
pub struct AdmissionGate {
    permits: Semaphore,
    opened: AtomicBool,
    /// Permits the gate was opened with.
    limit: AtomicU32,
    /// Permits handed out so far.
    granted: AtomicU32,
}

impl Default for AdmissionGate {
    fn default() -> Self {
        Self::new()
    }
}

impl AdmissionGate {
    /// Create a closed gate with no permits.
    #[must_use]
    pub fn new() -> Self {
        Self {
            permits: Semaphore::new(0),
            opened: AtomicBool::new(false),
            limit: AtomicU32::new(0),
            granted: AtomicU32::new(0),
        }
    }

    /// Open the gate and release `n` admissions.
    ///
    /// # Errors
    ///
    /// Returns `Misuse(GateReopened)` if the gate was already opened. The
    /// permit pool is left untouched in that case.
    pub fn open(&self, n: u32) -> Result<(), HcError> {
        if self
            .opened
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            error!(target: "hc.gate", requested = n, "Admission gate opened twice");
            return Err(SyncMisuse::GateReopened.into());
        }

        // Limit must be visible before any permit is granted
        self.limit.store(n, Ordering::Release);
        self.permits.add_permits(n as usize);

        info!(target: "hc.gate", permits = n, "Admission gate opened");
        Ok(())
    }

    /// Wait until the gate is open and take one permit.
    ///
    /// # Errors
    ///
    /// - `Cancelled` if `cancel` fires before a permit is granted
    /// - `Misuse(PermitOverdraw)` if more permits were granted than released
    pub async fn await_open(&self, cancel: &CancellationToken) -> Result<GatePass, HcError> {
        let permit = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(HcError::Cancelled),
            permit = self.permits.acquire() => permit
                .map_err(|_| HcError::Internal("admission gate closed".to_string()))?,
        };
        permit.forget();

        let granted = self.granted.fetch_add(1, Ordering::AcqRel) + 1;
        let limit = self.limit.load(Ordering::Acquire);
        if granted > limit {
            error!(target: "hc.gate", granted, limit, "Admission gate overdrawn");
            return Err(SyncMisuse::PermitOverdraw { granted, limit }.into());
        }

        Ok(GatePass { order: granted })
    }

    /// Whether `open` has been called.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.opened.load(Ordering::Acquire)
    }

    /// Permits handed out so far.
    #[must_use]
    pub fn granted(&self) -> u32 {
        self.granted.load(Ordering::Acquire)
    }

    /// Permits still waiting to be claimed.
    #[must_use]
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn test_waiters_blocked_until_open() {
        let gate = Arc::new(AdmissionGate::new());
        let cancel = CancellationToken::new();

        let waiter = {
            let gate = Arc::clone(&gate);
            let cancel = cancel.clone();
            tokio::spawn(async move { gate.await_open(&cancel).await })
        };

        tokio::task::yield_now().await;
        assert!(!waiter.is_finished());
        assert!(!gate.is_open());

        gate.open(1).unwrap();
        let pass = waiter.await.unwrap().unwrap();

        assert_eq!(pass.order, 1);
        assert_eq!(gate.granted(), 1);
        assert_eq!(gate.available(), 0);
    }

    #[tokio::test]
    async fn test_late_arrival_after_open_proceeds() {
        let gate = AdmissionGate::new();
        let cancel = CancellationToken::new();

        gate.open(2).unwrap();
        let first = gate.await_open(&cancel).await.unwrap();
        let second = gate.await_open(&cancel).await.unwrap();

        assert_eq!((first.order, second.order), (1, 2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_releases_exactly_n() {
        let gate = Arc::new(AdmissionGate::new());
        let cancel = CancellationToken::new();

        let waiters: Vec<_> = (0..5)
            .map(|_| {
                let gate = Arc::clone(&gate);
                let cancel = cancel.clone();
                tokio::spawn(async move { gate.await_open(&cancel).await })
            })
            .collect();

        gate.open(3).unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;

        let finished = waiters.iter().filter(|w| w.is_finished()).count();
        assert_eq!(finished, 3);
        assert_eq!(gate.granted(), 3);

        // Remaining waiters stay parked until cancelled
        cancel.cancel();
        let mut cancelled = 0;
        for waiter in waiters {
            if let Err(HcError::Cancelled) = waiter.await.unwrap() {
                cancelled += 1;
            }
        }
        assert_eq!(cancelled, 2);
        assert_eq!(gate.granted(), 3);
    }

    #[test]
    fn test_second_open_is_misuse() {
        let gate = AdmissionGate::new();
        gate.open(10).unwrap();

        let result = gate.open(10);
        assert!(matches!(
            result,
            Err(HcError::Misuse(SyncMisuse::GateReopened))
        ));
        assert_eq!(gate.available(), 10, "second open must not add permits");
    }

    #[tokio::test]
    async fn test_cancel_before_open() {
        let gate = AdmissionGate::new();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = gate.await_open(&cancel).await;
        assert!(matches!(result, Err(HcError::Cancelled)));
        assert_eq!(gate.granted(), 0);
    }
}
