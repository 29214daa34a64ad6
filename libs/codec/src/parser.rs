//! # Frame Parser - Shape Detection and Permissive Decode
//!
//! ## Purpose
//!
//! Turns one framed JSON object into a [`WireMessage`]. The parser first
//! detects which shape the object has, then decodes it permissively:
//!
//! - `source_id` and `message_type` both present → single heartbeat
//! - otherwise `batch_id` and `messages` both present → batch
//! - otherwise → [`CodecError::UnrecognizedFormat`]
//!
//! Missing keys, and keys carrying an unexpected JSON type, decode to zero
//! values. Unknown keys are ignored. Once the shape is known, decoding the
//! object cannot fail.
//!
//! ## Performance Profile
//!
//! - **Allocation**: one intermediate `serde_json::Value` per frame
//! - **Thread Safety**: stateless, safe to call from any number of workers

use crate::constants::{BATCH_SHAPE_KEYS, SINGLE_SHAPE_KEYS};
use crate::error::{CodecError, Result};
use crate::message::{BatchMessage, HeartbeatMessage};
use serde::Deserialize;
use serde_json::{Map, Value};

/// A decoded frame
#[derive(Debug, Clone, PartialEq)]
pub enum WireMessage {
    Single(HeartbeatMessage),
    Batch(BatchMessage),
}

/// Which of the two wire shapes a frame had
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameKind {
    Single,
    Batch,
}

impl std::fmt::Display for FrameKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FrameKind::Single => write!(f, "single"),
            FrameKind::Batch => write!(f, "batch"),
        }
    }
}

impl WireMessage {
    pub fn kind(&self) -> FrameKind {
        match self {
            WireMessage::Single(_) => FrameKind::Single,
            WireMessage::Batch(_) => FrameKind::Batch,
        }
    }

    /// Number of heartbeats carried by this frame
    pub fn message_count(&self) -> usize {
        match self {
            WireMessage::Single(_) => 1,
            WireMessage::Batch(batch) => batch.len(),
        }
    }

    /// Batch id, if this frame is a batch
    pub fn batch_id(&self) -> Option<u32> {
        match self {
            WireMessage::Single(_) => None,
            WireMessage::Batch(batch) => Some(batch.batch_id),
        }
    }

    /// Flatten into heartbeats, preserving batch order
    pub fn into_messages(self) -> Vec<HeartbeatMessage> {
        match self {
            WireMessage::Single(msg) => vec![msg],
            WireMessage::Batch(batch) => batch.messages,
        }
    }
}

/// Detect the shape of a parsed object
pub fn detect_shape(object: &Map<String, Value>) -> Option<FrameKind> {
    if SINGLE_SHAPE_KEYS.iter().all(|key| object.contains_key(*key)) {
        Some(FrameKind::Single)
    } else if BATCH_SHAPE_KEYS.iter().all(|key| object.contains_key(*key)) {
        Some(FrameKind::Batch)
    } else {
        None
    }
}

/// Decode one frame
pub fn decode(frame: &[u8]) -> Result<WireMessage> {
    let value: Value =
        serde_json::from_slice(frame).map_err(|e| CodecError::malformed(&e, frame.len()))?;

    let kind = match &value {
        Value::Object(object) => detect_shape(object),
        _ => None,
    };

    // Field readers are lenient, so an object of either shape always decodes
    match kind {
        Some(FrameKind::Single) => HeartbeatMessage::deserialize(value)
            .map(WireMessage::Single)
            .map_err(|e| CodecError::malformed(&e, frame.len())),
        Some(FrameKind::Batch) => BatchMessage::deserialize(value)
            .map(WireMessage::Batch)
            .map_err(|e| CodecError::malformed(&e, frame.len())),
        None => Err(CodecError::unrecognized(&value)),
    }
}
