//! # Statistics Aggregator
//!
//! ## Purpose
//!
//! Lock-free counters shared by beacon senders, listener readers and parser
//! workers, plus a point-in-time [`NetworkStats`] snapshot for reporting.
//!
//! Every field is an independent atomic. A snapshot reads them one by one, so
//! it is not transactional: counters updated during the read may be off by the
//! in-flight operations. Floating point aggregates are stored as `f64` bit
//! patterns in `AtomicU64` and updated with compare-and-swap loops.
//!
//! ## Cache Heuristic
//!
//! A parse faster than [`CACHE_HIT_THRESHOLD_US`] counts as a cache hit,
//! anything slower as a miss. The hit rate is informational only.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Parses faster than this many microseconds count as cache hits
pub const CACHE_HIT_THRESHOLD_US: f64 = 10.0;

/// Shared, concurrently updated performance counters
#[derive(Debug)]
pub struct StatsAggregator {
    packets_sent: AtomicU64,
    packets_received: AtomicU64,
    bytes_sent: AtomicU64,
    bytes_transmitted: AtomicU64,
    active_connections: AtomicU64,
    connections_accepted: AtomicU64,

    parse_count: AtomicU64,
    parse_total_us: AtomicU64,
    parse_min_us: AtomicU64,
    parse_max_us: AtomicU64,

    latency_count: AtomicU64,
    latency_total_ms: AtomicU64,

    decode_operations: AtomicU64,
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,

    frames_dropped: AtomicU64,
    batches_received: AtomicU64,
    heartbeats_received: AtomicU64,
    critical_received: AtomicU64,
}

/// Point-in-time view of [`StatsAggregator`]
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NetworkStats {
    pub packets_sent: u64,
    pub packets_received: u64,
    pub bytes_sent: u64,
    /// Bytes received by listener readers
    pub bytes_transmitted: u64,
    pub active_connections: u64,
    pub connections_accepted: u64,
    pub min_parse_time_us: f64,
    pub max_parse_time_us: f64,
    pub avg_parse_time_us: f64,
    pub parse_count: u64,
    pub avg_latency_ms: f64,
    pub decode_operations: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub frames_dropped: u64,
    pub batches_received: u64,
    pub heartbeats_received: u64,
    pub critical_received: u64,
}

impl NetworkStats {
    /// Cache hit rate as a percentage, 0 when nothing was parsed
    pub fn cache_hit_rate(&self) -> f64 {
        let total = self.cache_hits + self.cache_misses;
        if total == 0 {
            return 0.0;
        }
        (self.cache_hits as f64 / total as f64) * 100.0
    }
}

impl StatsAggregator {
    pub fn new() -> Self {
        Self {
            packets_sent: AtomicU64::new(0),
            packets_received: AtomicU64::new(0),
            bytes_sent: AtomicU64::new(0),
            bytes_transmitted: AtomicU64::new(0),
            active_connections: AtomicU64::new(0),
            connections_accepted: AtomicU64::new(0),
            parse_count: AtomicU64::new(0),
            parse_total_us: AtomicU64::new(0f64.to_bits()),
            // Sentinel so the first sample always becomes the minimum
            parse_min_us: AtomicU64::new(f64::INFINITY.to_bits()),
            parse_max_us: AtomicU64::new(0f64.to_bits()),
            latency_count: AtomicU64::new(0),
            latency_total_ms: AtomicU64::new(0f64.to_bits()),
            decode_operations: AtomicU64::new(0),
            cache_hits: AtomicU64::new(0),
            cache_misses: AtomicU64::new(0),
            frames_dropped: AtomicU64::new(0),
            batches_received: AtomicU64::new(0),
            heartbeats_received: AtomicU64::new(0),
            critical_received: AtomicU64::new(0),
        }
    }

    /// One frame written by a beacon transport
    #[inline]
    pub fn record_packet_sent(&self, bytes: usize) {
        self.packets_sent.fetch_add(1, Ordering::Relaxed);
        self.bytes_sent.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    /// One successful socket read on a listener connection
    #[inline]
    pub fn record_packet_received(&self, bytes: usize) {
        self.packets_received.fetch_add(1, Ordering::Relaxed);
        self.bytes_transmitted.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    pub fn connection_opened(&self) {
        self.active_connections.fetch_add(1, Ordering::Relaxed);
        self.connections_accepted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn connection_closed(&self) {
        let _ = self
            .active_connections
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| n.checked_sub(1));
    }

    /// Record one parse duration and classify it for the cache heuristic
    pub fn record_parse(&self, duration_us: f64) {
        self.parse_count.fetch_add(1, Ordering::Relaxed);
        update_f64(&self.parse_total_us, |total| Some(total + duration_us));
        update_f64(&self.parse_min_us, |min| (duration_us < min).then_some(duration_us));
        update_f64(&self.parse_max_us, |max| (duration_us > max).then_some(duration_us));

        if duration_us < CACHE_HIT_THRESHOLD_US {
            self.cache_hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.cache_misses.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Record one end-to-end latency sample in milliseconds
    pub fn record_latency(&self, latency_ms: f64) {
        self.latency_count.fetch_add(1, Ordering::Relaxed);
        update_f64(&self.latency_total_ms, |total| Some(total + latency_ms));
    }

    #[inline]
    pub fn record_decode(&self) {
        self.decode_operations.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_frame_dropped(&self) {
        self.frames_dropped.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_batch(&self) {
        self.batches_received.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_heartbeat(&self, is_critical: bool) {
        self.heartbeats_received.fetch_add(1, Ordering::Relaxed);
        if is_critical {
            self.critical_received.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn active_connections(&self) -> u64 {
        self.active_connections.load(Ordering::Relaxed)
    }

    /// Read every counter and derive the averages
    pub fn snapshot(&self) -> NetworkStats {
        let parse_count = self.parse_count.load(Ordering::Relaxed);
        let parse_total = load_f64(&self.parse_total_us);
        let min = load_f64(&self.parse_min_us);
        let latency_count = self.latency_count.load(Ordering::Relaxed);
        let latency_total = load_f64(&self.latency_total_ms);

        NetworkStats {
            packets_sent: self.packets_sent.load(Ordering::Relaxed),
            packets_received: self.packets_received.load(Ordering::Relaxed),
            bytes_sent: self.bytes_sent.load(Ordering::Relaxed),
            bytes_transmitted: self.bytes_transmitted.load(Ordering::Relaxed),
            active_connections: self.active_connections.load(Ordering::Relaxed),
            connections_accepted: self.connections_accepted.load(Ordering::Relaxed),
            min_parse_time_us: if min.is_finite() { min } else { 0.0 },
            max_parse_time_us: load_f64(&self.parse_max_us),
            avg_parse_time_us: average(parse_total, parse_count),
            parse_count,
            avg_latency_ms: average(latency_total, latency_count),
            decode_operations: self.decode_operations.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.cache_misses.load(Ordering::Relaxed),
            frames_dropped: self.frames_dropped.load(Ordering::Relaxed),
            batches_received: self.batches_received.load(Ordering::Relaxed),
            heartbeats_received: self.heartbeats_received.load(Ordering::Relaxed),
            critical_received: self.critical_received.load(Ordering::Relaxed),
        }
    }
}

impl Default for StatsAggregator {
    fn default() -> Self {
        Self::new()
    }
}

#[inline]
fn load_f64(cell: &AtomicU64) -> f64 {
    f64::from_bits(cell.load(Ordering::Relaxed))
}

/// CAS loop over an `f64` stored as bits; `f` returns `None` to leave it unchanged
#[inline]
fn update_f64(cell: &AtomicU64, mut f: impl FnMut(f64) -> Option<f64>) {
    let _ = cell.fetch_update(Ordering::AcqRel, Ordering::Relaxed, |bits| {
        f(f64::from_bits(bits)).map(f64::to_bits)
    });
}

fn average(total: f64, count: u64) -> f64 {
    if count == 0 {
        0.0
    } else {
        total / count as f64
    }
}
