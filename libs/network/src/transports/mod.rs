//! Beacon Transport Layer
//!
//! Outbound transports a beacon writes encoded frames to. Frames are sent as
//! raw bytes with no length prefix: every frame is a self-delimited JSON
//! object, so the receiving side recovers boundaries with the stream framer.

use crate::{Result, TransportError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::time::Instant;

pub mod metrics;
pub mod tcp;
pub mod udp;

pub use metrics::MetricsTracker;
pub use tcp::{TcpConfig, TcpTransport};
pub use udp::{UdpConfig, UdpTransport};

/// Outbound frame transport used by the beacon transmitter
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send one frame, returning the number of bytes written
    ///
    /// Never waits on a full socket buffer: the frame is dropped and
    /// [`TransportError::Backpressure`] returned instead.
    async fn send(&self, frame: &[u8]) -> Result<usize>;

    /// Release the underlying socket; later sends may reconnect
    async fn close(&self) -> Result<()> {
        Ok(())
    }

    /// Get transport-specific information
    fn transport_info(&self) -> TransportInfo;

    /// Get performance metrics
    fn metrics(&self) -> TransportMetrics;
}

/// Transport type enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TransportType {
    /// TCP stream, connected lazily on first send
    #[default]
    Tcp,
    /// UDP datagrams, one frame per datagram
    Udp,
}

impl std::fmt::Display for TransportType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransportType::Tcp => write!(f, "tcp"),
            TransportType::Udp => write!(f, "udp"),
        }
    }
}

impl std::str::FromStr for TransportType {
    type Err = TransportError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "tcp" => Ok(TransportType::Tcp),
            "udp" => Ok(TransportType::Udp),
            other => Err(TransportError::configuration(
                format!("Unknown transport '{}', expected tcp or udp", other),
                Some("transport"),
            )),
        }
    }
}

/// Transport information for monitoring
#[derive(Debug, Clone)]
pub struct TransportInfo {
    pub transport_type: TransportType,
    pub local_address: Option<SocketAddr>,
    pub remote_address: SocketAddr,
    pub connected: bool,
}

/// Transport performance metrics
#[derive(Debug, Clone, Default)]
pub struct TransportMetrics {
    pub messages_sent: u64,
    pub bytes_sent: u64,
    pub errors: u64,
    pub last_send_latency_ns: u64,
    pub avg_send_latency_ns: u64,
    pub last_activity: Option<Instant>,
}

/// Transport factory for creating transport instances
pub struct TransportFactory;

impl TransportFactory {
    /// Create an outbound transport of the requested type
    ///
    /// TCP connects lazily, so this only fails for UDP when the local socket
    /// cannot be bound or connected.
    pub async fn create_transport(
        transport_type: TransportType,
        remote_address: SocketAddr,
    ) -> Result<Box<dyn Transport>> {
        match transport_type {
            TransportType::Tcp => Ok(Box::new(TcpTransport::new(remote_address))),
            TransportType::Udp => {
                let config = UdpConfig {
                    remote_address,
                    ..UdpConfig::default()
                };
                Ok(Box::new(UdpTransport::new(config).await?))
            }
        }
    }
}
