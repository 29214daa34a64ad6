//! # Listener Error Types
//!
//! Only setup reaches the caller. Per-connection and per-frame failures are
//! logged where they happen and never stop the listener.

use std::net::SocketAddr;
use thiserror::Error;

/// Listener operation errors
#[derive(Error, Debug)]
pub enum ListenerError {
    /// Socket could not be bound
    #[error("Failed to bind listener on {address}: {source}")]
    Bind {
        address: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    /// Settings the listener cannot run with
    #[error("Invalid listener configuration: {0}")]
    Config(String),

    /// IO errors from tokio operations
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for listener operations
pub type Result<T> = std::result::Result<T, ListenerError>;
