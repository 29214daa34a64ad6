//! TCP Beacon Transport
//!
//! Client-side TCP stream to a listener. The connection is established lazily
//! on the first send. Frames are written as-is, without a length prefix, and
//! never wait for socket buffer space: a frame that does not fit is dropped
//! with [`TransportError::Backpressure`]. If only part of it fit, the stream
//! now ends mid-object, so the connection is dropped and the next send
//! reconnects. Any other write failure drops the connection too.

use crate::safe_duration_to_ns;
use crate::{Result, TransportError};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::net::SocketAddr;
use std::time::{Duration, Instant};
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// TCP transport configuration
#[derive(Debug, Clone)]
pub struct TcpConfig {
    /// Listener to connect to
    pub remote_address: SocketAddr,
    /// Connection timeout
    pub connect_timeout: Duration,
}

impl TcpConfig {
    pub fn new(remote_address: SocketAddr) -> Self {
        Self {
            remote_address,
            connect_timeout: Duration::from_secs(crate::DEFAULT_CONNECTION_TIMEOUT_SECS),
        }
    }
}

/// Open stream plus the bookkeeping reported in debug logs
struct TcpConnection {
    stream: TcpStream,
    peer_addr: SocketAddr,
    local_addr: Option<SocketAddr>,
    connected_at: Instant,
    bytes_sent: u64,
}

impl TcpConnection {
    fn try_send_frame(&mut self, frame: &[u8]) -> Result<()> {
        let mut written = 0;
        while written < frame.len() {
            match self.stream.try_write(&frame[written..]) {
                Ok(0) => {
                    return Err(TransportError::connection_with_source(
                        "TCP stream accepted no bytes",
                        Some(self.peer_addr),
                        std::io::Error::from(ErrorKind::WriteZero),
                    ))
                }
                Ok(n) => written += n,
                Err(e) if e.kind() == ErrorKind::WouldBlock => {
                    return Err(TransportError::backpressure(frame.len(), written))
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => {
                    return Err(TransportError::connection_with_source(
                        "Failed to write frame",
                        Some(self.peer_addr),
                        e,
                    ))
                }
            }
        }

        self.bytes_sent += frame.len() as u64;

        debug!(
            peer = %self.peer_addr,
            bytes = frame.len(),
            total_sent = self.bytes_sent,
            "Sent frame over TCP"
        );
        Ok(())
    }
}

/// Lazily connected TCP beacon transport
pub struct TcpTransport {
    config: TcpConfig,
    connection: Mutex<Option<TcpConnection>>,
    metrics: super::MetricsTracker,
}

impl TcpTransport {
    pub fn new(remote_address: SocketAddr) -> Self {
        Self::from_config(TcpConfig::new(remote_address))
    }

    pub fn from_config(config: TcpConfig) -> Self {
        Self {
            config,
            connection: Mutex::new(None),
            metrics: super::MetricsTracker::new(),
        }
    }

    async fn connect(&self) -> Result<TcpConnection> {
        let remote_addr = self.config.remote_address;
        debug!(%remote_addr, "Connecting to TCP listener");

        let stream = tokio::time::timeout(self.config.connect_timeout, TcpStream::connect(remote_addr))
            .await
            .map_err(|_| {
                TransportError::timeout("TCP connect", self.config.connect_timeout.as_millis() as u64)
            })?
            .map_err(|e| {
                TransportError::connection_with_source("Failed to connect to TCP listener", Some(remote_addr), e)
            })?;

        if let Err(e) = stream.set_nodelay(true) {
            warn!("Failed to set TCP_NODELAY: {}", e);
        }

        let local_addr = stream.local_addr().ok();
        info!(%remote_addr, local = ?local_addr, "Connected to TCP listener");

        Ok(TcpConnection {
            stream,
            peer_addr: remote_addr,
            local_addr,
            connected_at: Instant::now(),
            bytes_sent: 0,
        })
    }

    /// Whether a stream is currently open
    pub fn is_connected(&self) -> bool {
        self.connection
            .try_lock()
            .map(|guard| guard.is_some())
            .unwrap_or(true)
    }
}

#[async_trait]
impl super::Transport for TcpTransport {
    async fn send(&self, frame: &[u8]) -> Result<usize> {
        let start = Instant::now();
        let mut guard = self.connection.lock().await;

        if guard.is_none() {
            match self.connect().await {
                Ok(connection) => *guard = Some(connection),
                Err(e) => {
                    self.metrics.record_error();
                    return Err(e);
                }
            }
        }

        let result = match guard.as_mut() {
            Some(connection) => connection.try_send_frame(frame),
            None => Err(TransportError::network("Connection not established")),
        };

        match result {
            Ok(()) => {
                self.metrics
                    .record_send(frame.len(), safe_duration_to_ns(start.elapsed()));
                Ok(frame.len())
            }
            Err(e) => {
                // A whole frame skipped leaves the stream on a frame boundary
                let clean_skip = matches!(e, TransportError::Backpressure { written: 0, .. });
                if !clean_skip {
                    if let Some(connection) = guard.take() {
                        warn!(
                            peer = %connection.peer_addr,
                            connected_for_ms = connection.connected_at.elapsed().as_millis() as u64,
                            error = %e,
                            "Dropping TCP connection after failed write"
                        );
                    }
                }
                self.metrics.record_error();
                Err(e)
            }
        }
    }

    async fn close(&self) -> Result<()> {
        let mut guard = self.connection.lock().await;
        if let Some(mut connection) = guard.take() {
            if let Err(e) = connection.stream.shutdown().await {
                warn!("Error shutting down TCP connection: {}", e);
            }
            info!(peer = %connection.peer_addr, "Closed TCP connection");
        }
        Ok(())
    }

    fn transport_info(&self) -> super::TransportInfo {
        let (connected, local_address) = match self.connection.try_lock() {
            Ok(guard) => (guard.is_some(), guard.as_ref().and_then(|c| c.local_addr)),
            // A send holds the lock, so a stream is open or being opened
            Err(_) => (true, None),
        };
        super::TransportInfo {
            transport_type: super::TransportType::Tcp,
            local_address,
            remote_address: self.config.remote_address,
            connected,
        }
    }

    fn metrics(&self) -> super::TransportMetrics {
        self.metrics.get_snapshot()
    }
}
