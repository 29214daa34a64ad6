//! Wall-clock timestamps for heartbeat generation and latency measurement
//!
//! Beacons stamp each heartbeat with [`safe_system_timestamp_ns`]; listeners
//! stamp each frame on receipt and subtract. Both sides read the system clock,
//! so latency is only meaningful between hosts with synchronized clocks.

use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::warn;

/// Nanoseconds since the Unix epoch, 0 if the clock is set before 1970
pub fn safe_system_timestamp_ns() -> u64 {
    match SystemTime::now().duration_since(UNIX_EPOCH) {
        Ok(duration) => safe_duration_to_ns(duration),
        Err(e) => {
            warn!(error = %e, "System time before UNIX epoch");
            0
        }
    }
}

/// Convert a duration to nanoseconds, saturating at `u64::MAX` (year 2554)
#[inline]
pub fn safe_duration_to_ns(duration: Duration) -> u64 {
    u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX)
}

/// Milliseconds between a producer timestamp and a receive timestamp, clamped at 0
#[inline]
pub fn latency_ms(sent_ns: u64, received_ns: u64) -> f64 {
    received_ns.saturating_sub(sent_ns) as f64 / 1_000_000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamp_is_recent() {
        let ts = safe_system_timestamp_ns();
        assert!(ts > 1_600_000_000_000_000_000); // After 2020
    }

    #[test]
    fn test_duration_conversion_saturates() {
        assert_eq!(safe_duration_to_ns(Duration::from_micros(3)), 3_000);
        assert_eq!(safe_duration_to_ns(Duration::MAX), u64::MAX);
    }

    #[test]
    fn test_latency_clamps_clock_skew() {
        assert_eq!(latency_ms(1_000_000, 3_500_000), 2.5);
        assert_eq!(latency_ms(5_000_000, 1_000_000), 0.0);
    }
}
