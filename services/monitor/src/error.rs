//! Monitor startup errors

use thiserror::Error;

/// A role failed to come up
#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("Configuration error: {0}")]
    Config(#[from] monitor_config::ConfigError),

    #[error("Beacon failed to start: {0}")]
    Beacon(#[from] beacon::BeaconError),

    #[error("Listener failed to start: {0}")]
    Listener(#[from] listener::ListenerError),
}

pub type Result<T> = std::result::Result<T, MonitorError>;
