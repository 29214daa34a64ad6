//! # Wire Constants - Heartbeat Format Values
//!
//! ## Purpose
//!
//! Key names and fixed values shared by the encoder, the shape detection and the
//! batch ratio calculation. These values define the wire contract between
//! beacons and listeners and must stay stable across releases.

/// `message_type` value carried by every heartbeat
pub const HEARTBEAT_MESSAGE_TYPE: &str = "heartbeat";

/// Nominal size of an unbatched heartbeat, used only for the compression ratio
pub const NOMINAL_MESSAGE_SIZE: u64 = 400;

/// Every heartbeat whose sequence number is a multiple of this is critical
pub const CRITICAL_SEQUENCE_INTERVAL: u32 = 100;

/// Keys whose joint presence identifies a single heartbeat frame
pub const SINGLE_SHAPE_KEYS: [&str; 2] = ["source_id", "message_type"];

/// Keys whose joint presence identifies a batch frame
pub const BATCH_SHAPE_KEYS: [&str; 2] = ["batch_id", "messages"];
