//! Transport Error Types
//!
//! Error handling for beacon transports, listener sockets and stream framing.

use std::net::SocketAddr;
use thiserror::Error;

/// Main transport error type
#[derive(Error, Debug)]
pub enum TransportError {
    /// Network connectivity errors
    #[error("Network error: {message}")]
    Network {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Connection management errors
    #[error("Connection error: {message} (remote: {remote_addr:?})")]
    Connection {
        message: String,
        remote_addr: Option<SocketAddr>,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Payload rejected before it reached the socket
    #[error("Protocol error: {message}")]
    Protocol { message: String },

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Configuration {
        message: String,
        field: Option<String>,
    },

    /// Transport timeout errors
    #[error("Timeout error: {operation} exceeded {timeout_ms}ms")]
    Timeout { operation: String, timeout_ms: u64 },

    /// Socket send buffer was full; the frame was not sent
    #[error("Send buffer full: dropped {frame_bytes}-byte frame after {written} bytes")]
    Backpressure { frame_bytes: usize, written: usize },
}

/// Result type alias for transport operations
pub type Result<T> = std::result::Result<T, TransportError>;

impl TransportError {
    /// Create a network error
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
            source: None,
        }
    }

    /// Create a network error with source
    pub fn network_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Network {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a connection error with source
    pub fn connection_with_source(
        message: impl Into<String>,
        remote_addr: Option<SocketAddr>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Connection {
            message: message.into(),
            remote_addr,
            source: Some(Box::new(source)),
        }
    }

    /// Create a protocol error
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn configuration(message: impl Into<String>, field: Option<&str>) -> Self {
        Self::Configuration {
            message: message.into(),
            field: field.map(|s| s.to_string()),
        }
    }

    /// Create a timeout error
    pub fn timeout(operation: impl Into<String>, timeout_ms: u64) -> Self {
        Self::Timeout {
            operation: operation.into(),
            timeout_ms,
        }
    }

    pub fn backpressure(frame_bytes: usize, written: usize) -> Self {
        Self::Backpressure {
            frame_bytes,
            written,
        }
    }

    /// Whether a full send buffer caused the frame to be dropped
    pub fn is_backpressure(&self) -> bool {
        matches!(self, Self::Backpressure { .. })
    }

    /// Whether the error came from the socket layer rather than local validation
    pub fn is_network(&self) -> bool {
        matches!(
            self,
            Self::Network { .. } | Self::Connection { .. } | Self::Timeout { .. }
        )
    }
}

/// Stream framing errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FramingError {
    /// Pending bytes without a frame boundary exceeded the configured cap
    #[error("Framing buffer overflow: {pending} bytes pending without a complete frame (limit {limit})")]
    BufferOverflow { pending: usize, limit: usize },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_source_is_chained() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let err = TransportError::network_with_source("Failed to connect", io);
        assert!(err.is_network());
        assert_eq!(err.to_string(), "Network error: Failed to connect");
        assert!(err.source().is_some());
    }

    #[test]
    fn test_backpressure_is_not_a_network_failure() {
        let err = TransportError::backpressure(65_536, 0);
        assert!(err.is_backpressure());
        assert!(!err.is_network());
        assert_eq!(
            err.to_string(),
            "Send buffer full: dropped 65536-byte frame after 0 bytes"
        );
    }
}
