//! Beacon error types

use thiserror::Error;

/// Errors surfaced by beacon setup
///
/// Only setup can fail. Once running, send failures are logged and the
/// heartbeat is skipped.
#[derive(Error, Debug)]
pub enum BeaconError {
    /// Transport could not be created
    #[error("Transport error: {0}")]
    Transport(#[from] network::TransportError),

    /// Configuration values the transmitter cannot run with
    #[error("Invalid beacon configuration: {0}")]
    Config(String),
}

/// Result type alias for beacon operations
pub type Result<T> = std::result::Result<T, BeaconError>;
