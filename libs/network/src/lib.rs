//! Network Infrastructure
//!
//! Shared plumbing for the heartbeat mesh: outbound beacon transports, the
//! lock-free handoff queue, the stream framer, cooperative cancellation and
//! the statistics aggregator.

pub mod error;
pub mod framing;
pub mod lifecycle;
pub mod queue;
pub mod stats;
pub mod time;
pub mod transports;

// Re-export commonly used types
pub use error::{FramingError, Result, TransportError};
pub use framing::{StreamFramer, DEFAULT_MAX_PENDING_BYTES};
pub use lifecycle::ActiveFlag;
pub use queue::HandoffQueue;
pub use stats::{NetworkStats, StatsAggregator, CACHE_HIT_THRESHOLD_US};
pub use time::{latency_ms, safe_duration_to_ns, safe_system_timestamp_ns};
pub use transports::{
    Transport, TransportFactory, TransportInfo, TransportMetrics, TransportType,
};

// Constants for configuration
pub const DEFAULT_TCP_BUFFER_SIZE: usize = 64 * 1024; // 64KB
pub const DEFAULT_CONNECTION_TIMEOUT_SECS: u64 = 5;
