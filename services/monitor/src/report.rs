//! Periodic performance report

use beacon::BeaconTransmitter;
use network::{ActiveFlag, NetworkStats, StatsAggregator};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::info;

/// Log one snapshot, with beacon counters when a beacon runs
pub fn log_report(stats: &NetworkStats, beacon: Option<&BeaconTransmitter>) {
    info!(
        packets_sent = stats.packets_sent,
        packets_received = stats.packets_received,
        bytes_sent = stats.bytes_sent,
        bytes_received = stats.bytes_transmitted,
        active_connections = stats.active_connections,
        heartbeats = stats.heartbeats_received,
        critical = stats.critical_received,
        batches = stats.batches_received,
        frames_dropped = stats.frames_dropped,
        "Traffic"
    );
    info!(
        parse_count = stats.parse_count,
        min_parse_us = stats.min_parse_time_us,
        avg_parse_us = stats.avg_parse_time_us,
        max_parse_us = stats.max_parse_time_us,
        avg_latency_ms = stats.avg_latency_ms,
        cache_hit_pct = stats.cache_hit_rate(),
        "Parsing"
    );
    if let Some(beacon) = beacon {
        info!(
            source_id = %beacon.config().source_id,
            sequence = beacon.sequence_counter(),
            batch_id = beacon.batch_counter(),
            pending = beacon.pending_len(),
            "Beacon"
        );
    }
}

pub(crate) async fn report_loop(
    stats: Arc<StatsAggregator>,
    beacon: Option<Arc<BeaconTransmitter>>,
    period: Duration,
    active: ActiveFlag,
) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // First tick completes immediately
    ticker.tick().await;

    while active.is_active() {
        tokio::select! {
            _ = ticker.tick() => log_report(&stats.snapshot(), beacon.as_deref()),
            _ = active.cancelled() => break,
        }
    }
}
