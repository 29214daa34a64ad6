//! # Heartbeat Message Types
//!
//! ## Purpose
//!
//! Plain data structures for the two wire shapes: a single [`HeartbeatMessage`]
//! and a [`BatchMessage`] grouping several heartbeats. Both derive serde with
//! `#[serde(default)]` and read every field through a [`lenient`] reader, so a
//! frame missing a key, or carrying it with an unexpected JSON type, still
//! decodes with the zero value in that field. Integer fields accept any JSON
//! number: floats such as `1.7e+18` are truncated and out-of-range values
//! saturate.
//!
//! ## Architecture Role
//!
//! ```text
//! beacon → [HeartbeatMessage / BatchMessage] → builder → wire bytes
//!                                                 ↓
//! listener ← WireMessage ← parser ← frame bytes ←─┘
//! ```

use crate::constants::{CRITICAL_SEQUENCE_INTERVAL, HEARTBEAT_MESSAGE_TYPE, NOMINAL_MESSAGE_SIZE};
use serde::{Deserialize, Serialize};

/// A single status message emitted by a beacon
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct HeartbeatMessage {
    #[serde(deserialize_with = "lenient::string")]
    pub source_id: String,
    #[serde(deserialize_with = "lenient::string")]
    pub message_type: String,
    /// Producer clock, nanoseconds since the Unix epoch
    #[serde(deserialize_with = "lenient::u64")]
    pub timestamp_ns: u64,
    #[serde(deserialize_with = "lenient::string")]
    pub payload: String,
    #[serde(deserialize_with = "lenient::u32")]
    pub sequence_number: u32,
    #[serde(deserialize_with = "lenient::bool")]
    pub is_critical: bool,
    /// Informational capability tag, carries no behavior
    #[serde(deserialize_with = "lenient::u32")]
    pub simd_capability: u32,
    /// Filled by the receiver; always 0 when sent
    #[serde(deserialize_with = "lenient::f64")]
    pub parse_time_us: f64,
    /// Encoded size in bytes, filled after encoding
    #[serde(deserialize_with = "lenient::u32")]
    pub message_size: u32,
}

impl HeartbeatMessage {
    /// Build a heartbeat ready to send, deriving criticality from the sequence
    pub fn new(
        source_id: impl Into<String>,
        sequence_number: u32,
        timestamp_ns: u64,
        payload: impl Into<String>,
    ) -> Self {
        Self {
            source_id: source_id.into(),
            message_type: HEARTBEAT_MESSAGE_TYPE.to_string(),
            timestamp_ns,
            payload: payload.into(),
            sequence_number,
            is_critical: is_critical_sequence(sequence_number),
            simd_capability: capability_tag(),
            parse_time_us: 0.0,
            message_size: 0,
        }
    }

    /// Builder-style override for the capability tag
    pub fn with_capability(mut self, tag: u32) -> Self {
        self.simd_capability = tag;
        self
    }
}

/// An ordered group of heartbeats sent as one unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct BatchMessage {
    #[serde(deserialize_with = "lenient::messages")]
    pub messages: Vec<HeartbeatMessage>,
    #[serde(deserialize_with = "lenient::u32")]
    pub batch_id: u32,
    #[serde(deserialize_with = "lenient::u64")]
    pub compression_ratio: u64,
}

impl BatchMessage {
    pub fn new(batch_id: u32, messages: Vec<HeartbeatMessage>) -> Self {
        Self {
            messages,
            batch_id,
            compression_ratio: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

/// `sequence % 100 == 0`; sequence 0 is critical
#[inline]
pub fn is_critical_sequence(sequence_number: u32) -> bool {
    sequence_number % CRITICAL_SEQUENCE_INTERVAL == 0
}

/// Estimated size saving of a batch over sending its members one by one
///
/// `(count * 400 * 100) / serialized_len`, 0 when either input is 0.
pub fn compression_ratio(message_count: usize, serialized_len: usize) -> u64 {
    if message_count == 0 || serialized_len == 0 {
        return 0;
    }
    (message_count as u64).saturating_mul(NOMINAL_MESSAGE_SIZE * 100) / serialized_len as u64
}

/// Vector-width tag of the build target
///
/// 512, 256, 128 for AVX-512, AVX2 and SSE2 builds, 0 otherwise. Reported in
/// heartbeats as an informational value only.
pub fn capability_tag() -> u32 {
    if cfg!(target_feature = "avx512f") {
        512
    } else if cfg!(target_feature = "avx2") {
        256
    } else if cfg!(any(target_feature = "sse2", target_feature = "neon")) {
        128
    } else {
        0
    }
}

/// Field readers that never fail on a JSON type mismatch
///
/// Each reader takes whatever JSON value is present and converts it to the
/// field type, falling back to the type's zero value.
mod lenient {
    use super::HeartbeatMessage;
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    fn to_u64(value: &Value) -> u64 {
        match value {
            // `as` truncates toward zero, saturates and maps NaN to 0
            Value::Number(n) => n.as_u64().unwrap_or_else(|| n.as_f64().map_or(0, |f| f as u64)),
            _ => 0,
        }
    }

    pub(super) fn u64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
        Ok(to_u64(&Value::deserialize(deserializer)?))
    }

    pub(super) fn u32<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
        let value = to_u64(&Value::deserialize(deserializer)?);
        Ok(u32::try_from(value).unwrap_or(u32::MAX))
    }

    pub(super) fn f64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        Ok(Value::deserialize(deserializer)?.as_f64().unwrap_or_default())
    }

    pub(super) fn bool<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        Ok(Value::deserialize(deserializer)?.as_bool().unwrap_or_default())
    }

    pub(super) fn string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::String(s) => Ok(s),
            _ => Ok(String::new()),
        }
    }

    /// A non-array decodes as no messages; a non-object element as a zeroed heartbeat
    pub(super) fn messages<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Vec<HeartbeatMessage>, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::Array(items) => Ok(items
                .into_iter()
                .map(|item| HeartbeatMessage::deserialize(item).unwrap_or_default())
                .collect()),
            _ => Ok(Vec::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_criticality_boundaries() {
        for seq in [0, 100, 200, 4_294_967_200] {
            assert!(is_critical_sequence(seq), "seq {} should be critical", seq);
        }
        for seq in [1, 99, 101, 199] {
            assert!(!is_critical_sequence(seq), "seq {} should not be critical", seq);
        }
    }

    #[test]
    fn test_new_heartbeat_fields() {
        let msg = HeartbeatMessage::new("beacon-a", 200, 1_000, "hello");
        assert_eq!(msg.message_type, "heartbeat");
        assert!(msg.is_critical);
        assert_eq!(msg.parse_time_us, 0.0);
        assert_eq!(msg.message_size, 0);

        let msg = HeartbeatMessage::new("beacon-a", 201, 1_000, "hello").with_capability(7);
        assert!(!msg.is_critical);
        assert_eq!(msg.simd_capability, 7);
    }

    #[test]
    fn test_compression_ratio() {
        assert_eq!(compression_ratio(10, 2000), 200);
        assert_eq!(compression_ratio(0, 2000), 0);
        assert_eq!(compression_ratio(10, 0), 0);
        assert_eq!(compression_ratio(1, 400), 100);
    }

    #[test]
    fn test_batch_len() {
        let batch = BatchMessage::new(3, vec![HeartbeatMessage::default(); 4]);
        assert_eq!(batch.len(), 4);
        assert!(!batch.is_empty());
        assert!(BatchMessage::default().is_empty());
    }
}
