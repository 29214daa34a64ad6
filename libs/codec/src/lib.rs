//! # Litehaus Wire Codec
//!
//! ## Purpose
//!
//! The "rules" layer of the heartbeat mesh: message structures, the JSON
//! encoding a beacon writes and the permissive decoding a listener applies.
//!
//! ## Architecture Role
//!
//! ```text
//! services/beacon → [codec] → libs/network → services/listener
//!       ↑              ↓            ↓               ↓
//!  Heartbeats    JSON frames    Transport      WireMessage
//! ```
//!
//! ## What This Crate Does NOT Contain
//! - Stream framing (belongs in `network::framing`)
//! - Socket management or connection handling

pub mod builder;
pub mod constants;
pub mod error;
pub mod message;
pub mod parser;

pub use builder::{encode_batch, encode_heartbeat, seal_batch, seal_heartbeat};
pub use constants::{HEARTBEAT_MESSAGE_TYPE, NOMINAL_MESSAGE_SIZE};
pub use error::{CodecError, Result};
pub use message::{
    capability_tag, compression_ratio, is_critical_sequence, BatchMessage, HeartbeatMessage,
};
pub use parser::{decode, detect_shape, FrameKind, WireMessage};
