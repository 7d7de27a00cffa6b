//! Client-side counters for publish, fetch and connection activity

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use once_cell::sync::Lazy;

/// Client metrics collector
#[derive(Debug, Default)]
pub struct ClientMetrics {
    // Producer metrics
    pub messages_published: AtomicU64,
    pub bytes_published: AtomicU64,
    pub publish_errors: AtomicU64,
    pub publish_latency_sum: AtomicU64,
    pub publish_latency_count: AtomicU64,

    // Consumer metrics
    pub messages_fetched: AtomicU64,
    pub bytes_fetched: AtomicU64,
    pub fetch_errors: AtomicU64,
    pub checksum_failures: AtomicU64,
    pub fetch_latency_sum: AtomicU64,
    pub fetch_latency_count: AtomicU64,

    // Connection metrics
    pub connections_created: AtomicU64,
    pub connections_failed: AtomicU64,
    pub connection_errors: AtomicU64,
}

impl ClientMetrics {
    /// Record a produce request written to the broker
    pub fn record_publish(&self, message_count: u64, byte_count: u64, latency: Duration) {
        self.messages_published
            .fetch_add(message_count, Ordering::Relaxed);
        self.bytes_published.fetch_add(byte_count, Ordering::Relaxed);
        self.publish_latency_sum
            .fetch_add(latency.as_micros() as u64, Ordering::Relaxed);
        self.publish_latency_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_publish_error(&self) {
        self.publish_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a fetch; `byte_count` is the message set bytes consumed
    pub fn record_fetch(&self, message_count: u64, byte_count: u64, latency: Duration) {
        self.messages_fetched
            .fetch_add(message_count, Ordering::Relaxed);
        self.bytes_fetched.fetch_add(byte_count, Ordering::Relaxed);
        self.fetch_latency_sum
            .fetch_add(latency.as_micros() as u64, Ordering::Relaxed);
        self.fetch_latency_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_fetch_error(&self) {
        self.fetch_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a message set rejected for a checksum mismatch
    pub fn record_checksum_failure(&self) {
        self.checksum_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_connection_created(&self) {
        self.connections_created.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_connection_failed(&self) {
        self.connections_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_connection_error(&self) {
        self.connection_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Average publish latency in microseconds
    pub fn average_publish_latency_us(&self) -> f64 {
        average(&self.publish_latency_sum, &self.publish_latency_count)
    }

    /// Average fetch latency in microseconds
    pub fn average_fetch_latency_us(&self) -> f64 {
        average(&self.fetch_latency_sum, &self.fetch_latency_count)
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            messages_published: self.messages_published.load(Ordering::Relaxed),
            bytes_published: self.bytes_published.load(Ordering::Relaxed),
            publish_errors: self.publish_errors.load(Ordering::Relaxed),
            average_publish_latency_us: self.average_publish_latency_us(),
            messages_fetched: self.messages_fetched.load(Ordering::Relaxed),
            bytes_fetched: self.bytes_fetched.load(Ordering::Relaxed),
            fetch_errors: self.fetch_errors.load(Ordering::Relaxed),
            checksum_failures: self.checksum_failures.load(Ordering::Relaxed),
            average_fetch_latency_us: self.average_fetch_latency_us(),
            connections_created: self.connections_created.load(Ordering::Relaxed),
            connections_failed: self.connections_failed.load(Ordering::Relaxed),
            connection_errors: self.connection_errors.load(Ordering::Relaxed),
        }
    }
}

fn average(sum: &AtomicU64, count: &AtomicU64) -> f64 {
    let sum = sum.load(Ordering::Relaxed);
    let count = count.load(Ordering::Relaxed);

    if count == 0 {
        0.0
    } else {
        sum as f64 / count as f64
    }
}

/// Snapshot of metrics at a point in time
#[derive(Debug, Clone)]
pub struct MetricsSnapshot {
    pub messages_published: u64,
    pub bytes_published: u64,
    pub publish_errors: u64,
    pub average_publish_latency_us: f64,
    pub messages_fetched: u64,
    pub bytes_fetched: u64,
    pub fetch_errors: u64,
    pub checksum_failures: u64,
    pub average_fetch_latency_us: f64,
    pub connections_created: u64,
    pub connections_failed: u64,
    pub connection_errors: u64,
}

/// Measures one publish or fetch round
pub struct Timer {
    start: Instant,
}

impl Timer {
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn elapsed(self) -> Duration {
        self.start.elapsed()
    }
}

static GLOBAL_METRICS: Lazy<Arc<ClientMetrics>> = Lazy::new(|| Arc::new(ClientMetrics::default()));

/// Process-wide metrics shared by every producer and consumer
pub fn global_metrics() -> Arc<ClientMetrics> {
    GLOBAL_METRICS.clone()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_publish_and_fetch() {
        let metrics = ClientMetrics::default();
        metrics.record_publish(3, 120, Duration::from_micros(100));
        metrics.record_publish(1, 30, Duration::from_micros(300));
        metrics.record_fetch(5, 400, Duration::from_micros(50));
        metrics.record_checksum_failure();
        metrics.record_fetch_error();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.messages_published, 4);
        assert_eq!(snapshot.bytes_published, 150);
        assert_eq!(snapshot.average_publish_latency_us, 200.0);
        assert_eq!(snapshot.messages_fetched, 5);
        assert_eq!(snapshot.bytes_fetched, 400);
        assert_eq!(snapshot.checksum_failures, 1);
        assert_eq!(snapshot.fetch_errors, 1);
        assert_eq!(snapshot.average_fetch_latency_us, 50.0);
    }

    #[test]
    fn test_averages_without_samples() {
        let metrics = ClientMetrics::default();
        assert_eq!(metrics.average_publish_latency_us(), 0.0);
        assert_eq!(metrics.average_fetch_latency_us(), 0.0);
    }

    #[test]
    fn test_global_metrics_is_shared() {
        assert!(Arc::ptr_eq(&global_metrics(), &global_metrics()));
    }
}
