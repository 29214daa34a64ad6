//! # Litehaus Configuration
//!
//! Settings shared by the beacon and listener roles, loaded in layers:
//!
//! 1. Built-in defaults
//! 2. Optional TOML file
//! 3. `LITEHAUS__*` environment variables (e.g. `LITEHAUS__TARGET_PORT=9100`)
//! 4. Command-line overrides applied by the binary
//!
//! ## Usage
//!
//! ```no_run
//! use monitor_config::MonitorConfig;
//!
//! let config = MonitorConfig::load(None).expect("valid configuration");
//! println!("beacon → {}:{}", config.target_host, config.target_port);
//! ```

pub mod error;
pub mod monitor;

// Re-export commonly used types
pub use error::{ConfigError, Result};
pub use monitor::{MonitorConfig, RunMode, ENV_PREFIX};
pub use network::TransportType;
