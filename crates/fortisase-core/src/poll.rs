// ── Eventual-consistency poller ──
//
// Some backend applies are asynchronous: the object exists immediately but
// a status field settles later. `poll_until` waits with exponential
// backoff, bounded by an attempt count and a deadline, and stops as soon
// as the caller's cancellation token fires.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::CoreError;

#[derive(Debug, Clone, PartialEq)]
pub struct PollPolicy {
    pub initial_interval: Duration,
    pub max_interval: Duration,
    pub multiplier: f64,
    pub max_attempts: u32,
    /// Total time budget across all sleeps.
    pub deadline: Option<Duration>,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            initial_interval: Duration::from_secs(10),
            max_interval: Duration::from_secs(60),
            multiplier: 1.5,
            max_attempts: 10,
            deadline: Some(Duration::from_secs(15 * 60)),
        }
    }
}

impl PollPolicy {
    /// Constant interval, no deadline.
    pub fn fixed(interval: Duration, max_attempts: u32) -> Self {
        Self {
            initial_interval: interval,
            max_interval: interval,
            multiplier: 1.0,
            max_attempts,
            deadline: None,
        }
    }

    pub fn next_interval(&self, current: Duration) -> Duration {
        let scaled = current.as_secs_f64() * self.multiplier.max(1.0);
        Duration::try_from_secs_f64(scaled)
            .unwrap_or(self.max_interval)
            .min(self.max_interval)
    }

    /// The sleep before each attempt, ignoring the deadline.
    pub fn intervals(&self) -> impl Iterator<Item = Duration> + '_ {
        std::iter::successors(Some(self.initial_interval), |d| Some(self.next_interval(*d)))
            .take(usize::try_from(self.max_attempts).unwrap_or(usize::MAX))
    }
}

/// Outcome of one probe.
#[derive(Debug, Clone, PartialEq)]
pub enum PollStatus<T> {
    Ready(T),
    /// Not settled yet; carries what was observed, for the timeout error.
    Pending(String),
}

/// Sleep, probe, repeat until the probe is ready.
///
/// The probe receives the 1-based attempt number. Probe errors end the
/// poll immediately.
pub async fn poll_until<T, F, Fut>(
    policy: &PollPolicy,
    cancel: &CancellationToken,
    what: &str,
    mut probe: F,
) -> Result<T, CoreError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<PollStatus<T>, CoreError>>,
{
    let started = Instant::now();
    let mut interval = policy.initial_interval;
    let mut last_observed = String::from("nothing");
    let mut attempts = 0;

    while attempts < policy.max_attempts {
        if let Some(deadline) = policy.deadline {
            if started.elapsed() + interval > deadline {
                debug!(what, attempts, "poll deadline reached");
                break;
            }
        }

        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                return Err(CoreError::Cancelled { what: what.to_owned() });
            }
            () = tokio::time::sleep(interval) => {}
        }

        attempts += 1;
        match probe(attempts).await? {
            PollStatus::Ready(value) => {
                debug!(what, attempts, "settled");
                return Ok(value);
            }
            PollStatus::Pending(observed) => {
                debug!(what, attempts, %observed, "still pending");
                last_observed = observed;
            }
        }
        interval = policy.next_interval(interval);
    }

    Err(CoreError::PollTimeout {
        what: what.to_owned(),
        attempts,
        last_observed,
    })
}

/// One cancellable wait, for operations with nothing to poll.
pub async fn settle(delay: Duration, cancel: &CancellationToken, what: &str) -> Result<(), CoreError> {
    debug!(what, ?delay, "waiting for backend to settle");
    tokio::select! {
        biased;
        () = cancel.cancelled() => Err(CoreError::Cancelled { what: what.to_owned() }),
        () = tokio::time::sleep(delay) => Ok(()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    fn counter() -> Arc<AtomicU32> {
        Arc::new(AtomicU32::new(0))
    }

    #[test]
    fn default_intervals_back_off_and_cap() {
        let secs: Vec<f64> = PollPolicy::default()
            .intervals()
            .map(|d| d.as_secs_f64())
            .collect();
        assert_eq!(secs.len(), 10);
        assert!((secs[0] - 10.0).abs() < 1e-9);
        assert!((secs[1] - 15.0).abs() < 1e-9);
        assert!((secs[2] - 22.5).abs() < 1e-9);
        assert!(secs[5..].iter().all(|s| (s - 60.0).abs() < 1e-9));
    }

    #[tokio::test(start_paused = true)]
    async fn stops_as_soon_as_ready() {
        let calls = counter();
        let seen = Arc::clone(&calls);
        let out = poll_until(
            &PollPolicy::default(),
            &CancellationToken::new(),
            "service connection",
            move |attempt| {
                seen.fetch_add(1, Ordering::SeqCst);
                async move {
                    Ok(if attempt == 3 {
                        PollStatus::Ready("success")
                    } else {
                        PollStatus::Pending("pending".into())
                    })
                }
            },
        )
        .await
        .unwrap();
        assert_eq!(out, "success");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_max_attempts() {
        let calls = counter();
        let seen = Arc::clone(&calls);
        let policy = PollPolicy {
            deadline: None,
            ..PollPolicy::default()
        };
        let err = poll_until::<(), _, _>(&policy, &CancellationToken::new(), "apply", move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
            async { Ok(PollStatus::Pending("in_progress".into())) }
        })
        .await
        .unwrap_err();

        assert_eq!(calls.load(Ordering::SeqCst), 10);
        match err {
            CoreError::PollTimeout {
                attempts,
                last_observed,
                ..
            } => {
                assert_eq!(attempts, 10);
                assert_eq!(last_observed, "in_progress");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_cuts_attempts_short() {
        let calls = counter();
        let seen = Arc::clone(&calls);
        let policy = PollPolicy {
            deadline: Some(Duration::from_secs(30)),
            ..PollPolicy::default()
        };
        // 10s + 15s fit in 30s; the third sleep (22.5s) does not.
        let err = poll_until::<(), _, _>(&policy, &CancellationToken::new(), "apply", move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
            async { Ok(PollStatus::Pending("pending".into())) }
        })
        .await
        .unwrap_err();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(matches!(err, CoreError::PollTimeout { attempts: 2, .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn probe_error_is_terminal() {
        let err = poll_until::<(), _, _>(
            &PollPolicy::default(),
            &CancellationToken::new(),
            "apply",
            |_| async {
                Err(CoreError::PollFailed {
                    what: "apply".into(),
                    state: "failed".into(),
                })
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, CoreError::PollFailed { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_interrupts_the_wait() {
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(5)).await;
            trigger.cancel();
        });

        let err = poll_until::<(), _, _>(&PollPolicy::default(), &cancel, "apply", |_| async {
            Ok(PollStatus::Pending("pending".into()))
        })
        .await
        .unwrap_err();
        assert!(matches!(err, CoreError::Cancelled { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn settle_waits_then_returns() {
        let start = Instant::now();
        settle(Duration::from_secs(30), &CancellationToken::new(), "disconnect")
            .await
            .unwrap();
        assert!(start.elapsed() >= Duration::from_secs(30));
    }

    #[tokio::test]
    async fn settle_is_cancellable() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = settle(Duration::from_secs(3600), &cancel, "disconnect")
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Cancelled { .. }));
    }
}
