//! Transport Performance Metrics
//!
//! Per-transport send accounting. Counters are atomics updated on every send;
//! only the last-activity timestamp sits behind a lock.

use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Performance metrics tracker for transport operations
#[derive(Clone, Default)]
pub struct MetricsTracker {
    messages_sent: Arc<AtomicU64>,
    bytes_sent: Arc<AtomicU64>,
    errors: Arc<AtomicU64>,
    latency_total_ns: Arc<AtomicU64>,
    last_latency_ns: Arc<AtomicU64>,
    last_send: Arc<RwLock<Option<Instant>>>,
}

impl MetricsTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a completed send
    #[inline]
    pub fn record_send(&self, bytes: usize, latency_ns: u64) {
        self.messages_sent.fetch_add(1, Ordering::Release);
        self.bytes_sent.fetch_add(bytes as u64, Ordering::Release);
        self.latency_total_ns.fetch_add(latency_ns, Ordering::Release);
        self.last_latency_ns.store(latency_ns, Ordering::Release);
        *self.last_send.write() = Some(Instant::now());
    }

    /// Record a failed send
    #[inline]
    pub fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::Release);
    }

    /// Get current metrics snapshot
    pub fn get_snapshot(&self) -> super::TransportMetrics {
        let messages_sent = self.messages_sent.load(Ordering::Acquire);
        let latency_total = self.latency_total_ns.load(Ordering::Acquire);

        super::TransportMetrics {
            messages_sent,
            bytes_sent: self.bytes_sent.load(Ordering::Acquire),
            errors: self.errors.load(Ordering::Acquire),
            last_send_latency_ns: self.last_latency_ns.load(Ordering::Acquire),
            avg_send_latency_ns: latency_total.checked_div(messages_sent).unwrap_or(0),
            last_activity: *self.last_send.read(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_averages() {
        let metrics = MetricsTracker::new();
        assert!(metrics.get_snapshot().last_activity.is_none());

        metrics.record_send(100, 1_000);
        metrics.record_send(50, 3_000);
        metrics.record_error();

        let snap = metrics.get_snapshot();
        assert_eq!(snap.messages_sent, 2);
        assert_eq!(snap.bytes_sent, 150);
        assert_eq!(snap.errors, 1);
        assert_eq!(snap.avg_send_latency_ns, 2_000);
        assert_eq!(snap.last_send_latency_ns, 3_000);
        assert!(snap.last_activity.is_some());
    }
}
