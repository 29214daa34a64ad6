//! Listener settings

use crate::error::{ListenerError, Result};
use std::net::SocketAddr;

/// Listener configuration
#[derive(Debug, Clone)]
pub struct ListenerConfig {
    pub bind_address: SocketAddr,
    /// Parser worker tasks draining the handoff queue
    pub parse_workers: usize,
    /// Soft cap: exceeding it is logged, connections are still accepted
    pub max_connections: usize,
    /// Per-connection cap on bytes buffered without a complete frame
    pub max_frame_bytes: usize,
    /// Size of each connection's receive buffer
    pub recv_buffer_bytes: usize,
    /// Observations buffered per subscriber before the slowest one lags
    pub observation_capacity: usize,
}

impl ListenerConfig {
    pub fn new(bind_address: SocketAddr) -> Self {
        Self {
            bind_address,
            parse_workers: 4,
            max_connections: 100,
            max_frame_bytes: network::DEFAULT_MAX_PENDING_BYTES,
            recv_buffer_bytes: network::DEFAULT_TCP_BUFFER_SIZE,
            observation_capacity: 1024,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.parse_workers == 0 {
            return Err(ListenerError::Config("parse_workers must be at least 1".to_string()));
        }
        if self.recv_buffer_bytes == 0 {
            return Err(ListenerError::Config("recv_buffer_bytes must be at least 1".to_string()));
        }
        if self.observation_capacity == 0 {
            return Err(ListenerError::Config(
                "observation_capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
