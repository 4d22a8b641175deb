//! Observability: request observer hooks and lightweight metrics.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Observer hooks invoked by the requester around each HTTP call.
///
/// Injected at construction time; defaults to [`TracingObserver`]. Tests can
/// inject `mocks::RecordingObserver` to assert on the redirect diagnostic
/// record without capturing log output.
pub trait RequestObserver: Send + Sync {
    /// Called before a request is issued.
    fn on_request(&self, id: Uuid, method: &str, url: &str) {
        let _ = (id, method, url);
    }

    /// Called when a same-host path-only redirect is followed.
    fn on_redirect(&self, id: Uuid, from_path: &str, to_path: &str) {
        let _ = (id, from_path, to_path);
    }

    /// Called when a response is received.
    fn on_response(&self, id: Uuid, status: u16, elapsed: Duration) {
        let _ = (id, status, elapsed);
    }
}

/// Observer that emits `tracing` events.
pub struct TracingObserver;

impl RequestObserver for TracingObserver {
    fn on_request(&self, id: Uuid, method: &str, url: &str) {
        debug!(request_id = %id, method, url, "issuing request");
    }

    fn on_redirect(&self, id: Uuid, from_path: &str, to_path: &str) {
        info!(
            request_id = %id,
            "Following server redirection from {} to {}",
            from_path,
            to_path
        );
    }

    fn on_response(&self, id: Uuid, status: u16, elapsed: Duration) {
        if status >= 400 {
            warn!(request_id = %id, status, elapsed_ms = elapsed.as_millis() as u64, "request failed");
        } else {
            debug!(request_id = %id, status, elapsed_ms = elapsed.as_millis() as u64, "request completed");
        }
    }
}

/// Observer that does nothing.
pub struct NoopObserver;

impl RequestObserver for NoopObserver {}

/// Metrics collector for requester operations.
#[derive(Debug, Default)]
pub struct Metrics {
    /// Total requests issued.
    requests_total: AtomicU64,
    /// Requests that produced an error.
    requests_failed: AtomicU64,
    /// Redirects followed.
    redirects_followed: AtomicU64,
    /// Requests that had to wait on pacing.
    throttle_waits: AtomicU64,
    /// Total request latency in microseconds.
    latency_total_us: AtomicU64,
    /// Request count for latency calculation.
    latency_count: AtomicU64,
}

impl Metrics {
    /// Creates a new metrics collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an issued request.
    pub fn record_request(&self) {
        self.requests_total.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a failed request.
    pub fn record_failure(&self) {
        self.requests_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a followed redirect.
    pub fn record_redirect(&self) {
        self.redirects_followed.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a request delayed by pacing.
    pub fn record_throttle_wait(&self) {
        self.throttle_waits.fetch_add(1, Ordering::Relaxed);
    }

    /// Records request latency.
    pub fn record_latency(&self, elapsed: Duration) {
        self.latency_total_us
            .fetch_add(elapsed.as_micros() as u64, Ordering::Relaxed);
        self.latency_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Gets the total request count.
    pub fn total_requests(&self) -> u64 {
        self.requests_total.load(Ordering::Relaxed)
    }

    /// Gets the failed request count.
    pub fn failed_requests(&self) -> u64 {
        self.requests_failed.load(Ordering::Relaxed)
    }

    /// Gets the count of redirects followed.
    pub fn redirects_followed(&self) -> u64 {
        self.redirects_followed.load(Ordering::Relaxed)
    }

    /// Gets the count of requests delayed by pacing.
    pub fn throttle_waits(&self) -> u64 {
        self.throttle_waits.load(Ordering::Relaxed)
    }

    /// Gets the average latency in microseconds.
    pub fn average_latency_us(&self) -> u64 {
        let total = self.latency_total_us.load(Ordering::Relaxed);
        let count = self.latency_count.load(Ordering::Relaxed);
        if count == 0 {
            0
        } else {
            total / count
        }
    }

    /// Gets a snapshot of all metrics.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            requests_total: self.total_requests(),
            requests_failed: self.failed_requests(),
            redirects_followed: self.redirects_followed(),
            throttle_waits: self.throttle_waits(),
            average_latency_us: self.average_latency_us(),
        }
    }
}

/// A snapshot of metrics at a point in time.
#[derive(Debug, Clone)]
pub struct MetricsSnapshot {
    /// Total requests issued.
    pub requests_total: u64,
    /// Requests that produced an error.
    pub requests_failed: u64,
    /// Redirects followed.
    pub redirects_followed: u64,
    /// Requests delayed by pacing.
    pub throttle_waits: u64,
    /// Average latency in microseconds.
    pub average_latency_us: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metrics_counters() {
        let metrics = Metrics::new();
        metrics.record_request();
        metrics.record_request();
        metrics.record_failure();
        metrics.record_redirect();
        metrics.record_throttle_wait();
        metrics.record_latency(Duration::from_micros(100));
        metrics.record_latency(Duration::from_micros(300));

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.requests_total, 2);
        assert_eq!(snapshot.requests_failed, 1);
        assert_eq!(snapshot.redirects_followed, 1);
        assert_eq!(snapshot.throttle_waits, 1);
        assert_eq!(snapshot.average_latency_us, 200);
    }

    #[test]
    fn average_latency_with_no_samples() {
        let metrics = Metrics::new();
        assert_eq!(metrics.average_latency_us(), 0);
    }
}
