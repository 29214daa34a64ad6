//! Wire-level errors for heartbeat frame processing
//!
//! Every variant is recoverable: a frame that fails to decode is logged and
//! dropped by the caller, it never poisons the worker that decoded it.

use thiserror::Error;

/// Frame encoding and decoding errors with diagnostic context
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CodecError {
    /// Frame bytes are not valid JSON (or not valid UTF-8)
    #[error("Malformed frame: {description} (frame: {frame_size} bytes, line {line}, column {column})")]
    Malformed {
        description: String,
        frame_size: usize,
        line: usize,
        column: usize,
    },

    /// Frame parsed as JSON but matches neither the heartbeat nor the batch shape
    #[error("Unrecognized message format: {found} (expected source_id+message_type or batch_id+messages)")]
    UnrecognizedFormat { found: String },

    /// Serialization failed
    #[error("Encode error: {0}")]
    Encode(String),
}

impl CodecError {
    /// Build a malformed-frame error from a serde_json failure
    pub fn malformed(err: &serde_json::Error, frame_size: usize) -> Self {
        Self::Malformed {
            description: err.to_string(),
            frame_size,
            line: err.line(),
            column: err.column(),
        }
    }

    /// Build an unrecognized-format error describing what was found instead
    pub fn unrecognized(value: &serde_json::Value) -> Self {
        let found = match value {
            serde_json::Value::Object(map) => {
                let mut keys: Vec<&str> = map.keys().map(String::as_str).collect();
                keys.sort_unstable();
                keys.truncate(8);
                format!("object with keys [{}]", keys.join(", "))
            }
            serde_json::Value::Array(_) => "array".to_string(),
            serde_json::Value::String(_) => "string".to_string(),
            serde_json::Value::Number(_) => "number".to_string(),
            serde_json::Value::Bool(_) => "bool".to_string(),
            serde_json::Value::Null => "null".to_string(),
        };
        Self::UnrecognizedFormat { found }
    }

    /// Whether the frame was well-formed JSON of an unknown shape
    pub fn is_unrecognized(&self) -> bool {
        matches!(self, Self::UnrecognizedFormat { .. })
    }
}

/// Result type for codec operations
pub type Result<T> = std::result::Result<T, CodecError>;
