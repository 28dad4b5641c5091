use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, warn};

/// Bounded polling with linear backoff: attempt `i` (0-based) is followed by
/// a pause of `base_delay * (1 + i)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub warmup: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
            warmup: Duration::ZERO,
        }
    }

    pub fn with_warmup(mut self, warmup: Duration) -> Self {
        self.warmup = warmup;
        self
    }

    pub fn delay_for(&self, attempt_index: u32) -> Duration {
        self.base_delay.saturating_mul(attempt_index.saturating_add(1))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 30,
            base_delay: Duration::from_secs(2),
            warmup: Duration::from_secs(10),
        }
    }
}

/// How a single attempt went wrong.
#[derive(Debug)]
pub enum AttemptError<E> {
    /// Worth another try.
    Transient(E),
    /// Stop polling immediately.
    Fatal(E),
}

#[derive(Debug, Error)]
pub enum PollError<E: std::fmt::Display> {
    #[error("no usable result after {attempts} attempts")]
    Exhausted { attempts: u32, last_error: Option<E> },
    #[error("polling aborted: {0}")]
    Aborted(E),
}

/// Calls `poll` until `is_ready` accepts its result, the attempt budget runs
/// out, or an attempt fails fatally. Sleeps between attempts, never after the
/// last one.
pub async fn poll_until<T, E, F, Fut, P>(
    policy: &RetryPolicy,
    mut poll: F,
    is_ready: P,
) -> Result<T, PollError<E>>
where
    E: std::fmt::Display,
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, AttemptError<E>>>,
    P: Fn(&T) -> bool,
{
    if !policy.warmup.is_zero() {
        tokio::time::sleep(policy.warmup).await;
    }

    let mut last_error = None;

    for attempt in 0..policy.max_attempts {
        match poll(attempt).await {
            Ok(value) if is_ready(&value) => return Ok(value),
            Ok(_) => {
                debug!(attempt, "poll result not ready yet");
            }
            Err(AttemptError::Transient(e)) => {
                warn!(attempt, error = %e, "poll attempt failed");
                last_error = Some(e);
            }
            Err(AttemptError::Fatal(e)) => return Err(PollError::Aborted(e)),
        }

        if attempt + 1 < policy.max_attempts {
            tokio::time::sleep(policy.delay_for(attempt)).await;
        }
    }

    Err(PollError::Exhausted {
        attempts: policy.max_attempts,
        last_error,
    })
}
