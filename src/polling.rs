//! Generic "wait until done" loop for long-running remote operations.

use crate::types::{DEFAULT_POLL_INTERVAL, DEFAULT_POLL_TIMEOUT, MIN_POLL_INTERVAL, PollingError};
use std::future::Future;
use std::time::Duration;
use tokio::time::{Instant, sleep};
use tokio_util::sync::CancellationToken;

/// Options for [`poll_until`]
#[derive(Debug, Clone, Default)]
pub struct PollOptions {
    /// Wait between probes (default 10s). Values below 10s are raised to 10s.
    pub poll_interval: Option<Duration>,
    /// Overall deadline (default 5 minutes)
    pub timeout: Option<Duration>,
    /// Checked before every probe
    pub cancellation: Option<CancellationToken>,
}

impl PollOptions {
    /// Effective interval after applying the minimum
    pub fn interval(&self) -> Duration {
        self.poll_interval
            .unwrap_or(Duration::from_millis(DEFAULT_POLL_INTERVAL))
            .max(Duration::from_millis(MIN_POLL_INTERVAL))
    }

    pub fn deadline(&self) -> Duration {
        self.timeout
            .unwrap_or(Duration::from_millis(DEFAULT_POLL_TIMEOUT))
    }

    fn is_cancelled(&self) -> bool {
        self.cancellation
            .as_ref()
            .is_some_and(CancellationToken::is_cancelled)
    }
}

/// A completed poll
#[derive(Debug, Clone, PartialEq)]
pub struct PollOutcome<T> {
    pub result: T,
    pub attempts: u32,
    pub duration: Duration,
}

/// Calls `probe` until `is_complete` accepts its result.
///
/// The first probe runs immediately; the deadline is only checked between
/// probes, so at least one probe always happens. Errors from `probe` are
/// returned as-is without retrying.
///
/// # Errors
///
/// - [`PollingError::Aborted`] if the cancellation token fires before a probe
/// - [`PollingError::Timeout`] if the deadline passes without completion
/// - any error returned by `probe`
///
/// # Example
///
/// ```no_run
/// use kadoa_sdk::{PollOptions, RealtimeError, poll_until};
/// use std::time::Duration;
///
/// # async fn fetch_status() -> Result<String, RealtimeError> { Ok("FINISHED".into()) }
/// # async fn example() -> Result<(), RealtimeError> {
/// let outcome = poll_until(
///     fetch_status,
///     |status: &String| status == "FINISHED",
///     PollOptions {
///         timeout: Some(Duration::from_secs(600)),
///         ..Default::default()
///     },
/// )
/// .await?;
/// println!("finished after {} attempts", outcome.attempts);
/// # Ok(())
/// # }
/// ```
pub async fn poll_until<T, E, P, Fut, C>(
    mut probe: P,
    is_complete: C,
    options: PollOptions,
) -> Result<PollOutcome<T>, E>
where
    P: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    C: Fn(&T) -> bool,
    E: From<PollingError>,
{
    let interval = options.interval();
    let timeout = options.deadline();
    let start = Instant::now();
    let mut attempts: u32 = 0;

    while start.elapsed() < timeout {
        if options.is_cancelled() {
            tracing::debug!("Polling aborted after {} attempts", attempts);
            return Err(PollingError::Aborted.into());
        }

        attempts += 1;
        let current = probe().await?;

        if is_complete(&current) {
            return Ok(PollOutcome {
                result: current,
                attempts,
                duration: start.elapsed(),
            });
        }

        tracing::debug!(
            "Poll attempt {} incomplete, next in {}ms",
            attempts,
            interval.as_millis()
        );

        match &options.cancellation {
            Some(token) => {
                tokio::select! {
                    _ = sleep(interval) => {}
                    _ = token.cancelled() => {}
                }
            }
            None => sleep(interval).await,
        }
    }

    let duration = start.elapsed();
    tracing::warn!(
        "Polling timed out after {}ms ({} attempts)",
        timeout.as_millis(),
        attempts
    );
    Err(PollingError::Timeout {
        timeout_ms: timeout.as_millis() as u64,
        attempts,
        duration_ms: duration.as_millis() as u64,
    }
    .into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RealtimeError;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn counting_probe(
        calls: &Arc<AtomicU32>,
    ) -> impl FnMut() -> std::future::Ready<Result<u32, RealtimeError>> {
        let calls = Arc::clone(calls);
        move || std::future::ready(Ok(calls.fetch_add(1, Ordering::SeqCst) + 1))
    }

    #[test]
    fn test_interval_is_clamped_to_minimum() {
        let options = PollOptions {
            poll_interval: Some(Duration::from_millis(500)),
            ..Default::default()
        };
        assert_eq!(options.interval(), Duration::from_secs(10));

        let options = PollOptions {
            poll_interval: Some(Duration::from_secs(30)),
            ..Default::default()
        };
        assert_eq!(options.interval(), Duration::from_secs(30));
        assert_eq!(PollOptions::default().deadline(), Duration::from_secs(300));
    }

    #[tokio::test(start_paused = true)]
    async fn test_returns_on_first_complete_result() {
        let calls = Arc::new(AtomicU32::new(0));

        let outcome = poll_until(
            counting_probe(&calls),
            |n: &u32| *n >= 3,
            PollOptions {
                poll_interval: Some(Duration::from_millis(1)),
                timeout: Some(Duration::from_secs(3600)),
                cancellation: None,
            },
        )
        .await
        .unwrap();

        assert_eq!(outcome.result, 3);
        assert_eq!(outcome.attempts, 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        // Two clamped sleeps between three probes
        assert!(outcome.duration >= Duration::from_secs(20));
        assert!(outcome.duration < Duration::from_secs(21));
    }

    #[tokio::test(start_paused = true)]
    async fn test_short_timeout_probes_once_then_times_out() {
        let calls = Arc::new(AtomicU32::new(0));

        let err = poll_until(
            counting_probe(&calls),
            |_: &u32| false,
            PollOptions {
                timeout: Some(Duration::from_millis(50)),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        match err {
            RealtimeError::Polling(PollingError::Timeout {
                timeout_ms,
                attempts,
                duration_ms,
            }) => {
                assert_eq!(timeout_ms, 50);
                assert_eq!(attempts, 1);
                assert!(duration_ms >= 10_000);
            }
            other => panic!("expected timeout, got {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_probe_error_propagates_without_retry() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);

        let err = poll_until(
            move || {
                counter.fetch_add(1, Ordering::SeqCst);
                async { Err::<u32, RealtimeError>(RealtimeError::Auth("revoked".to_string())) }
            },
            |_: &u32| true,
            PollOptions::default(),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, RealtimeError::Auth(ref m) if m == "revoked"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_before_first_probe() {
        let calls = Arc::new(AtomicU32::new(0));
        let token = CancellationToken::new();
        token.cancel();

        let err = poll_until(
            counting_probe(&calls),
            |_: &u32| true,
            PollOptions {
                cancellation: Some(token),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();

        assert!(matches!(err, RealtimeError::Polling(PollingError::Aborted)));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_while_waiting() {
        let calls = Arc::new(AtomicU32::new(0));
        let token = CancellationToken::new();

        let canceller = token.clone();
        tokio::spawn(async move {
            sleep(Duration::from_secs(3)).await;
            canceller.cancel();
        });

        let started = Instant::now();
        let err = poll_until(
            counting_probe(&calls),
            |_: &u32| false,
            PollOptions {
                cancellation: Some(token),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();

        assert!(matches!(err, RealtimeError::Polling(PollingError::Aborted)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(started.elapsed() < Duration::from_secs(10));
    }
}
