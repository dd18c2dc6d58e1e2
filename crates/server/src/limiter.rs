//! Admission control for the index endpoint

use crate::latency::race_cancellation;
use slowrepo_errors::ServeError;
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio_util::sync::CancellationToken;

/// Counting semaphore bounding concurrent index requests
///
/// The pool size is fixed at construction. Clones share the same pool.
#[derive(Debug, Clone)]
pub struct AdmissionLimiter {
    semaphore: Arc<Semaphore>,
    capacity: usize,
}

/// One borrowed admission slot, returned to the pool on drop
#[derive(Debug)]
#[must_use = "dropping the permit immediately releases the admission slot"]
pub struct AdmissionPermit {
    _permit: OwnedSemaphorePermit,
}

impl AdmissionPermit {
    /// Return the slot to the pool
    pub fn release(self) {}
}

impl AdmissionLimiter {
    /// Create a limiter with `permits` slots (at least one)
    #[must_use]
    pub fn new(permits: usize) -> Self {
        let capacity = permits.clamp(1, Semaphore::MAX_PERMITS);
        Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            capacity,
        }
    }

    /// Total number of slots
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Slots not currently borrowed
    #[must_use]
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Wait for a free slot or for `cancel` to fire
    ///
    /// A cancelled wait leaves the pool untouched.
    ///
    /// # Errors
    ///
    /// Returns `ServeError::Cancelled` if the token fired first, or
    /// `AdmissionRejected` if the pool has been closed.
    pub async fn acquire(&self, cancel: &CancellationToken) -> Result<AdmissionPermit, ServeError> {
        let permit = race_cancellation(cancel, self.semaphore.clone().acquire_owned())
            .await?
            .map_err(|_| ServeError::AdmissionRejected {
                message: "admission limiter is closed".to_string(),
            })?;
        Ok(AdmissionPermit { _permit: permit })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_capacity_is_at_least_one() {
        assert_eq!(AdmissionLimiter::new(0).capacity(), 1);
        assert_eq!(AdmissionLimiter::new(4).capacity(), 4);
        assert_eq!(AdmissionLimiter::new(4).available(), 4);
    }

    #[tokio::test]
    async fn test_permit_returned_on_drop() {
        let limiter = AdmissionLimiter::new(2);
        let cancel = CancellationToken::new();

        let first = limiter.acquire(&cancel).await.unwrap();
        let second = limiter.acquire(&cancel).await.unwrap();
        assert_eq!(limiter.available(), 0);

        first.release();
        assert_eq!(limiter.available(), 1);
        drop(second);
        assert_eq!(limiter.available(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_waiter_admitted_after_release() {
        let limiter = AdmissionLimiter::new(1);
        let cancel = CancellationToken::new();
        let held = limiter.acquire(&cancel).await.unwrap();

        let waiter = tokio::spawn({
            let limiter = limiter.clone();
            let cancel = cancel.clone();
            async move { limiter.acquire(&cancel).await.map(AdmissionPermit::release) }
        });

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!waiter.is_finished());

        drop(held);
        assert_eq!(waiter.await.unwrap(), Ok(()));
        assert_eq!(limiter.available(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_wait_consumes_nothing() {
        let limiter = AdmissionLimiter::new(1);
        let held = limiter.acquire(&CancellationToken::new()).await.unwrap();

        let cancel = CancellationToken::new();
        let waiter = tokio::spawn({
            let limiter = limiter.clone();
            let cancel = cancel.clone();
            async move { limiter.acquire(&cancel).await.map(AdmissionPermit::release) }
        });

        tokio::time::sleep(Duration::from_millis(10)).await;
        cancel.cancel();
        assert_eq!(waiter.await.unwrap(), Err(ServeError::Cancelled));

        drop(held);
        assert_eq!(limiter.available(), 1);
    }
}
