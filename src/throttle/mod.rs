//! Client-side request pacing.
//!
//! Pacing is the only built-in backoff mechanism: it runs proactively before
//! each request, never reactively after a failure. Two independent minimum
//! intervals are enforced, one between any two requests and one between any
//! two write requests (POST/PATCH/PUT/DELETE).

use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// Monotonic time source with a sleep capability.
///
/// Injected into the requester so pacing can be tested against virtual time
/// (see `mocks::ManualClock`) without real sleeping.
#[async_trait]
pub trait Clock: Send + Sync {
    /// Monotonic elapsed time since the clock's origin.
    fn now(&self) -> Duration;

    /// Sleeps for the given duration.
    async fn sleep(&self, wait: Duration);
}

/// Wall clock backed by `std::time::Instant` and `tokio::time::sleep`.
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    /// Creates a new system clock.
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }

    async fn sleep(&self, wait: Duration) {
        tokio::time::sleep(wait).await;
    }
}

/// Pacing timestamps. Instants are durations from the clock origin.
#[derive(Debug, Default)]
struct ThrottleState {
    last_request: Option<Duration>,
    last_write: Option<Duration>,
}

/// Enforces minimum intervals between outgoing requests.
///
/// The state lock spans the compute-sleep-stamp sequence, so two concurrent
/// callers can never both observe a stale timestamp and both skip sleeping.
pub struct Throttle {
    seconds_between_requests: Option<Duration>,
    seconds_between_writes: Option<Duration>,
    clock: Arc<dyn Clock>,
    state: Mutex<ThrottleState>,
}

impl Throttle {
    /// Creates a new throttle. A `None` interval disables that check.
    pub fn new(
        seconds_between_requests: Option<Duration>,
        seconds_between_writes: Option<Duration>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            seconds_between_requests,
            seconds_between_writes,
            clock,
            state: Mutex::new(ThrottleState::default()),
        }
    }

    /// Returns true if any pacing interval is configured.
    pub fn is_enabled(&self) -> bool {
        self.seconds_between_requests.is_some() || self.seconds_between_writes.is_some()
    }

    /// Waits out the configured intervals, then stamps the issue time.
    /// Returns the time actually waited.
    ///
    /// Timestamps mark the moment the request is issued (post-sleep), not the
    /// moment its response returns, which keeps the lock off the network I/O
    /// path while preserving the interval guarantee.
    pub async fn acquire(&self, is_write: bool) -> Duration {
        let mut state = self.state.lock().await;
        let now = self.clock.now();

        let mut wait = Duration::ZERO;
        if let (Some(min), Some(last)) = (self.seconds_between_requests, state.last_request) {
            wait = wait.max(min.saturating_sub(now.saturating_sub(last)));
        }
        if is_write {
            if let (Some(min), Some(last)) = (self.seconds_between_writes, state.last_write) {
                wait = wait.max(min.saturating_sub(now.saturating_sub(last)));
            }
        }

        if !wait.is_zero() {
            tracing::debug!(wait_ms = wait.as_millis() as u64, is_write, "pacing request");
            self.clock.sleep(wait).await;
        }

        let issued_at = self.clock.now();
        state.last_request = Some(issued_at);
        if is_write {
            state.last_write = Some(issued_at);
        }
        wait
    }
}

impl fmt::Debug for Throttle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Throttle")
            .field("seconds_between_requests", &self.seconds_between_requests)
            .field("seconds_between_writes", &self.seconds_between_writes)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::ManualClock;

    fn secs(s: u64) -> Duration {
        Duration::from_secs(s)
    }

    #[tokio::test]
    async fn unthrottled_never_sleeps() {
        let clock = Arc::new(ManualClock::new());
        let throttle = Throttle::new(None, None, clock.clone());
        assert!(!throttle.is_enabled());

        for _ in 0..3 {
            throttle.acquire(false).await;
        }
        throttle.acquire(true).await;

        assert!(clock.sleeps().is_empty());
    }

    #[tokio::test]
    async fn successive_reads_wait_out_the_request_interval() {
        let clock = Arc::new(ManualClock::new());
        let throttle = Throttle::new(Some(secs(1)), None, clock.clone());

        throttle.acquire(false).await;
        throttle.acquire(false).await;
        throttle.acquire(false).await;

        assert_eq!(clock.sleeps(), vec![secs(1), secs(1)]);
    }

    #[tokio::test]
    async fn writes_wait_out_the_remaining_write_interval() {
        let clock = Arc::new(ManualClock::new());
        let throttle = Throttle::new(Some(secs(1)), Some(secs(3)), clock.clone());

        // read, write, read, write with no time passing between calls
        throttle.acquire(false).await;
        throttle.acquire(true).await;
        throttle.acquire(false).await;
        throttle.acquire(true).await;

        // the second write is 2s after the first, so it owes 2 more seconds,
        // not just the 1s request interval
        assert_eq!(clock.sleeps(), vec![secs(1), secs(1), secs(2)]);
    }

    #[tokio::test]
    async fn write_interval_alone_does_not_pace_reads() {
        let clock = Arc::new(ManualClock::new());
        let throttle = Throttle::new(None, Some(secs(3)), clock.clone());

        throttle.acquire(false).await;
        throttle.acquire(false).await;
        throttle.acquire(true).await;
        throttle.acquire(true).await;

        assert_eq!(clock.sleeps(), vec![secs(3)]);
    }

    #[tokio::test]
    async fn elapsed_time_reduces_the_wait() {
        let clock = Arc::new(ManualClock::new());
        let throttle = Throttle::new(Some(secs(5)), None, clock.clone());

        throttle.acquire(false).await;
        clock.advance(secs(3));
        throttle.acquire(false).await;

        assert_eq!(clock.sleeps(), vec![secs(2)]);
    }
}
