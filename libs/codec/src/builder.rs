//! # Frame Builder - Heartbeat and Batch Encoding
//!
//! ## Purpose
//!
//! Serializes messages into self-delimited JSON objects. Each encoded frame is
//! exactly one JSON object, so the listener's brace-depth framer can recover
//! it from a byte stream without any length prefix.
//!
//! Sealing a batch encodes it twice: once to measure the serialized length the
//! compression ratio is computed from, and again with the ratio filled in.

use crate::error::{CodecError, Result};
use crate::message::{compression_ratio, BatchMessage, HeartbeatMessage};

/// Encode one heartbeat as a JSON object
pub fn encode_heartbeat(message: &HeartbeatMessage) -> Result<Vec<u8>> {
    serde_json::to_vec(message).map_err(|e| CodecError::Encode(e.to_string()))
}

/// Encode a batch exactly as it stands, without touching its ratio
pub fn encode_batch(batch: &BatchMessage) -> Result<Vec<u8>> {
    serde_json::to_vec(batch).map_err(|e| CodecError::Encode(e.to_string()))
}

/// Fill in `message_size` from a measured encoding and return the final bytes
///
/// The size recorded is the length of the frame with `message_size` still 0,
/// the frame actually sent carries that value.
pub fn seal_heartbeat(message: &mut HeartbeatMessage) -> Result<Vec<u8>> {
    let measured = encode_heartbeat(message)?;
    message.message_size = u32::try_from(measured.len()).unwrap_or(u32::MAX);
    encode_heartbeat(message)
}

/// Compute the compression ratio from a measured encoding and return the final bytes
pub fn seal_batch(batch: &mut BatchMessage) -> Result<Vec<u8>> {
    batch.compression_ratio = 0;
    let measured = encode_batch(batch)?;
    batch.compression_ratio = compression_ratio(batch.len(), measured.len());
    encode_batch(batch)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(seq: u32) -> HeartbeatMessage {
        HeartbeatMessage::new("beacon-test", seq, 1_700_000_000_000_000_000, "status ok")
    }

    #[test]
    fn test_encoded_heartbeat_is_single_object() {
        let bytes = encode_heartbeat(&sample(1)).unwrap();
        assert_eq!(bytes.first(), Some(&b'{'));
        assert_eq!(bytes.last(), Some(&b'}'));

        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        for key in [
            "source_id",
            "message_type",
            "timestamp_ns",
            "payload",
            "sequence_number",
            "is_critical",
            "simd_capability",
            "parse_time_us",
            "message_size",
        ] {
            assert!(value.get(key).is_some(), "missing key {}", key);
        }
    }

    #[test]
    fn test_string_escaping() {
        let mut msg = sample(1);
        msg.payload = "quote\" backslash\\ nl\n tab\t bell\u{7}".to_string();
        let text = String::from_utf8(encode_heartbeat(&msg).unwrap()).unwrap();
        assert!(text.contains(r#"quote\""#));
        assert!(text.contains(r"backslash\\"));
        assert!(text.contains(r"nl\n"));
        assert!(text.contains(r"tab\t"));
        assert!(text.contains(r"bell\u0007"));
    }

    #[test]
    fn test_seal_heartbeat_records_size() {
        let mut msg = sample(5);
        let bytes = seal_heartbeat(&mut msg).unwrap();
        assert!(msg.message_size > 0);
        // The recorded size can differ from the final length only by the digits of the size itself
        let diff = bytes.len() as i64 - msg.message_size as i64;
        assert!((0..=10).contains(&diff));
    }

    #[test]
    fn test_seal_batch_sets_ratio() {
        let mut batch = BatchMessage::new(1, (0..10).map(sample).collect());
        let bytes = seal_batch(&mut batch).unwrap();
        assert!(batch.compression_ratio > 0);

        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value["compression_ratio"], batch.compression_ratio);
        assert_eq!(value["messages"].as_array().map(Vec::len), Some(10));
    }

    #[test]
    fn test_seal_empty_batch() {
        let mut batch = BatchMessage::new(9, Vec::new());
        seal_batch(&mut batch).unwrap();
        assert_eq!(batch.compression_ratio, 0);
    }
}
