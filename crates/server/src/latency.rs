//! Simulated backend latency

use slowrepo_errors::ServeError;
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Run `work` unless `cancel` fires first
///
/// The losing branch is dropped. When both are ready at the same poll,
/// cancellation wins.
///
/// # Errors
///
/// Returns `ServeError::Cancelled` if the token fired before `work` finished.
pub async fn race_cancellation<F>(
    cancel: &CancellationToken,
    work: F,
) -> Result<F::Output, ServeError>
where
    F: Future,
{
    tokio::select! {
        biased;
        () = cancel.cancelled() => Err(ServeError::Cancelled),
        output = work => Ok(output),
    }
}

/// Sleep for `duration` or until `cancel` fires
///
/// A zero duration returns at once without touching the timer wheel or the
/// token.
///
/// # Errors
///
/// Returns `ServeError::Cancelled` if the token fired first.
pub async fn delay(duration: Duration, cancel: &CancellationToken) -> Result<(), ServeError> {
    if duration.is_zero() {
        return Ok(());
    }
    race_cancellation(cancel, tokio::time::sleep(duration)).await
}

/// Fixed delay applied to every admitted index request
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LatencyInjector {
    duration: Duration,
}

impl LatencyInjector {
    #[must_use]
    pub fn new(duration: Duration) -> Self {
        Self { duration }
    }

    /// An injector that never waits
    #[must_use]
    pub fn disabled() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn duration(&self) -> Duration {
        self.duration
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        !self.duration.is_zero()
    }

    /// Apply the configured delay
    ///
    /// # Errors
    ///
    /// Returns `ServeError::Cancelled` if `cancel` fired during the delay.
    pub async fn delay(&self, cancel: &CancellationToken) -> Result<(), ServeError> {
        delay(self.duration, cancel).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn test_zero_delay_ignores_cancelled_token() {
        let cancel = CancellationToken::new();
        cancel.cancel();

        let start = Instant::now();
        assert!(delay(Duration::ZERO, &cancel).await.is_ok());
        assert!(LatencyInjector::disabled().delay(&cancel).await.is_ok());
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_delay_runs_full_duration() {
        let injector = LatencyInjector::new(Duration::from_millis(500));
        assert!(injector.is_enabled());

        let start = Instant::now();
        injector.delay(&CancellationToken::new()).await.unwrap();
        assert_eq!(start.elapsed(), Duration::from_millis(500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_cuts_delay_short() {
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            trigger.cancel();
        });

        let start = Instant::now();
        let result = delay(Duration::from_secs(5), &cancel).await;
        assert_eq!(result, Err(ServeError::Cancelled));
        assert_eq!(start.elapsed(), Duration::from_millis(100));
    }

    #[tokio::test]
    async fn test_race_prefers_cancellation_when_both_ready() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = race_cancellation(&cancel, std::future::ready(7)).await;
        assert_eq!(result, Err(ServeError::Cancelled));

        let result = race_cancellation(&CancellationToken::new(), std::future::ready(7)).await;
        assert_eq!(result, Ok(7));
    }
}
