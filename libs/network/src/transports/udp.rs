//! UDP Beacon Transport
//!
//! Connected UDP socket sending one frame per datagram. Useful when a lost
//! heartbeat is preferable to head-of-line blocking; there is no retransmit.
//! Sends never wait: a datagram the socket cannot take right now is dropped.

use crate::safe_duration_to_ns;
use crate::{Result, TransportError};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::net::SocketAddr;
use std::time::Instant;
use tokio::net::UdpSocket;
use tracing::{debug, info};

/// Largest payload a single IPv4 UDP datagram can carry
pub const MAX_DATAGRAM_SIZE: usize = 65507;

/// UDP transport configuration
#[derive(Debug, Clone)]
pub struct UdpConfig {
    /// Local address to bind to
    pub bind_address: SocketAddr,
    /// Destination of every datagram
    pub remote_address: SocketAddr,
    /// Maximum frame size
    pub max_message_size: usize,
}

impl Default for UdpConfig {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from(([0, 0, 0, 0], 0)),
            remote_address: SocketAddr::from(([127, 0, 0, 1], 9001)),
            max_message_size: MAX_DATAGRAM_SIZE,
        }
    }
}

/// UDP transport for datagram communication
pub struct UdpTransport {
    config: UdpConfig,
    socket: UdpSocket,
    metrics: super::MetricsTracker,
}

impl UdpTransport {
    /// Bind and connect the socket
    pub async fn new(config: UdpConfig) -> Result<Self> {
        if config.max_message_size > MAX_DATAGRAM_SIZE {
            return Err(TransportError::configuration(
                format!("UDP max message size cannot exceed {} bytes", MAX_DATAGRAM_SIZE),
                Some("max_message_size"),
            ));
        }

        let socket = UdpSocket::bind(config.bind_address).await.map_err(|e| {
            TransportError::network_with_source(
                format!("Failed to bind UDP socket on {}", config.bind_address),
                e,
            )
        })?;

        socket.connect(config.remote_address).await.map_err(|e| {
            TransportError::network_with_source(
                format!("Failed to connect UDP socket to {}", config.remote_address),
                e,
            )
        })?;
        // Sends use try_send, which needs write readiness already observed
        socket.writable().await.map_err(|e| {
            TransportError::network_with_source("UDP socket never became writable", e)
        })?;
        info!(remote = %config.remote_address, "UDP socket connected");

        Ok(Self {
            config,
            socket,
            metrics: super::MetricsTracker::new(),
        })
    }

    /// Get local socket address
    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.socket
            .local_addr()
            .map_err(|e| TransportError::network_with_source("Failed to get local address", e))
    }
}

#[async_trait]
impl super::Transport for UdpTransport {
    async fn send(&self, frame: &[u8]) -> Result<usize> {
        if frame.len() > self.config.max_message_size {
            self.metrics.record_error();
            return Err(TransportError::protocol(format!(
                "Message size {} exceeds maximum {}",
                frame.len(),
                self.config.max_message_size
            )));
        }

        let start = Instant::now();
        let result = self.socket.try_send(frame).map_err(|e| match e.kind() {
            ErrorKind::WouldBlock => TransportError::backpressure(frame.len(), 0),
            _ => TransportError::network_with_source("Failed to send UDP packet", e),
        });

        match result {
            Ok(bytes_sent) => {
                self.metrics
                    .record_send(bytes_sent, safe_duration_to_ns(start.elapsed()));
                debug!(bytes = bytes_sent, "Sent UDP datagram");
                Ok(bytes_sent)
            }
            Err(e) => {
                self.metrics.record_error();
                Err(e)
            }
        }
    }

    fn transport_info(&self) -> super::TransportInfo {
        super::TransportInfo {
            transport_type: super::TransportType::Udp,
            local_address: self.socket.local_addr().ok(),
            remote_address: self.config.remote_address,
            connected: true,
        }
    }

    fn metrics(&self) -> super::TransportMetrics {
        self.metrics.get_snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::super::Transport;
    use super::*;

    #[tokio::test]
    async fn test_one_frame_per_datagram() {
        let receiver = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let config = UdpConfig {
            bind_address: "127.0.0.1:0".parse().unwrap(),
            remote_address: receiver.local_addr().unwrap(),
            ..UdpConfig::default()
        };
        let transport = UdpTransport::new(config).await.unwrap();

        let frame = br#"{"source_id":"a","message_type":"heartbeat"}"#;
        assert_eq!(transport.send(frame).await.unwrap(), frame.len());

        let mut buf = [0u8; 1024];
        let (n, from) = receiver.recv_from(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], &frame[..]);
        assert_eq!(from, transport.local_addr().unwrap());
        assert_eq!(transport.metrics().messages_sent, 1);
    }

    #[tokio::test]
    async fn test_oversized_frame_rejected() {
        let config = UdpConfig {
            bind_address: "127.0.0.1:0".parse().unwrap(),
            remote_address: "127.0.0.1:9".parse().unwrap(),
            max_message_size: 16,
            ..UdpConfig::default()
        };
        let transport = UdpTransport::new(config).await.unwrap();
        let err = transport.send(&[b' '; 17]).await.unwrap_err();
        assert!(matches!(err, TransportError::Protocol { .. }));
        assert_eq!(transport.metrics().errors, 1);
    }

    #[tokio::test]
    async fn test_config_cap_validated() {
        let config = UdpConfig {
            max_message_size: MAX_DATAGRAM_SIZE + 1,
            ..UdpConfig::default()
        };
        assert!(matches!(
            UdpTransport::new(config).await,
            Err(TransportError::Configuration { .. })
        ));
    }
}
