//! # Litehaus Beacon
//!
//! Emits heartbeats at a fixed cadence to one listener. With a batch size
//! above one, heartbeats are queued and a second task groups them into
//! batches every 10 ms.
//!
//! ## Architecture Role
//!
//! ```text
//! pacing task → HeartbeatMessage ─┬─ batch_size ≤ 1 → Transport
//!                                 └─ HandoffQueue → batch task → Transport
//! ```

pub mod error;
pub mod transmitter;

pub use error::{BeaconError, Result};
pub use transmitter::{BeaconConfig, BeaconTransmitter, BATCH_FLUSH_INTERVAL};
