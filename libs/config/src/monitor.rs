//! Monitor Configuration
//!
//! One flat settings struct covers both roles. Every field has a default, so
//! a file or environment only needs to name what it changes.

use crate::error::{ConfigError, Result};
use config_rs::{Config, Environment, File, FileFormat};
use network::TransportType;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::net::{SocketAddr, ToSocketAddrs};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

/// Environment variable prefix; nested keys use the same `__` separator
pub const ENV_PREFIX: &str = "LITEHAUS";

const ENV_SEPARATOR: &str = "__";

/// Which roles a process runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    Beacon,
    Listener,
    #[default]
    Both,
}

impl RunMode {
    pub fn runs_beacon(self) -> bool {
        matches!(self, RunMode::Beacon | RunMode::Both)
    }

    pub fn runs_listener(self) -> bool {
        matches!(self, RunMode::Listener | RunMode::Both)
    }
}

impl std::fmt::Display for RunMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunMode::Beacon => write!(f, "beacon"),
            RunMode::Listener => write!(f, "listener"),
            RunMode::Both => write!(f, "both"),
        }
    }
}

/// Settings for beacon transmission and listener ingestion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub mode: RunMode,

    // Beacon side
    pub target_host: String,
    pub target_port: u16,
    pub transport: TransportType,
    pub beacon_interval_ms: u64,
    pub batch_size: usize,
    pub source_id: String,
    pub enable_compression: bool,
    /// Declared for wire compatibility; no encryption is applied
    pub enable_encryption: bool,

    // Listener side
    pub listen_host: String,
    /// 0 binds an ephemeral port
    pub listen_port: u16,
    pub max_connections: usize,
    pub parse_threads: usize,
    pub max_frame_bytes: usize,
    pub recv_buffer_bytes: usize,

    // Reporting
    pub report_interval_secs: u64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            mode: RunMode::Both,
            target_host: "127.0.0.1".to_string(),
            target_port: 9001,
            transport: TransportType::Tcp,
            beacon_interval_ms: 1000,
            batch_size: 10,
            source_id: "litehaus-beacon".to_string(),
            enable_compression: true,
            enable_encryption: false,
            listen_host: "0.0.0.0".to_string(),
            listen_port: 9000,
            max_connections: 100,
            parse_threads: default_parse_threads(),
            max_frame_bytes: network::DEFAULT_MAX_PENDING_BYTES,
            recv_buffer_bytes: network::DEFAULT_TCP_BUFFER_SIZE,
            report_interval_secs: 10,
        }
    }
}

fn default_parse_threads() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

impl MonitorConfig {
    /// Load defaults, then `path` if given, then `LITEHAUS__*` variables
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with_env(path, None)
    }

    /// Like [`load`](Self::load) but reads variables from `env` instead of the process
    pub fn load_with_env(path: Option<&Path>, env: Option<HashMap<String, String>>) -> Result<Self> {
        let config = Self::load_layers(path, env)?;
        config.validate()?;
        Ok(config)
    }

    /// Merge the file and environment layers without validating
    ///
    /// For callers that apply further overrides (command-line flags) and
    /// call [`validate`](Self::validate) on the final result.
    pub fn load_unvalidated(path: Option<&Path>) -> Result<Self> {
        Self::load_layers(path, None)
    }

    /// Merge layers; `env` replaces the process environment when given
    pub fn load_layers(path: Option<&Path>, env: Option<HashMap<String, String>>) -> Result<Self> {
        let mut builder = Config::builder();

        if let Some(path) = path {
            if !path.exists() {
                return Err(ConfigError::NotFound {
                    path: path.to_path_buf(),
                });
            }
            info!(path = %path.display(), "Loading configuration file");
            builder = builder.add_source(File::from(path).format(FileFormat::Toml).required(true));
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator(ENV_SEPARATOR)
                .separator(ENV_SEPARATOR)
                .try_parsing(true)
                .source(env),
        );

        let config: MonitorConfig = builder.build()?.try_deserialize()?;
        debug!(?config, "Configuration layers merged");
        Ok(config)
    }

    /// Parse settings from TOML text, defaults filling any gaps
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: MonitorConfig = Config::builder()
            .add_source(File::from_str(text, FileFormat::Toml))
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Render the effective settings as TOML
    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Reject values no role can run with
    pub fn validate(&self) -> Result<()> {
        if self.mode.runs_beacon() {
            if self.target_host.trim().is_empty() {
                return Err(ConfigError::invalid("target_host", "must not be empty"));
            }
            if self.target_port == 0 {
                return Err(ConfigError::invalid("target_port", "must be non-zero"));
            }
            if self.beacon_interval_ms == 0 {
                return Err(ConfigError::invalid("beacon_interval_ms", "must be at least 1"));
            }
            if self.batch_size == 0 {
                return Err(ConfigError::invalid("batch_size", "must be at least 1"));
            }
            if self.source_id.is_empty() {
                return Err(ConfigError::invalid("source_id", "must not be empty"));
            }
        }

        if self.mode.runs_listener() {
            if self.parse_threads == 0 {
                return Err(ConfigError::invalid("parse_threads", "must be at least 1"));
            }
            if self.max_connections == 0 {
                return Err(ConfigError::invalid("max_connections", "must be at least 1"));
            }
            if self.recv_buffer_bytes == 0 {
                return Err(ConfigError::invalid("recv_buffer_bytes", "must be at least 1"));
            }
            if self.max_frame_bytes < self.recv_buffer_bytes {
                return Err(ConfigError::invalid(
                    "max_frame_bytes",
                    format!("must be at least recv_buffer_bytes ({})", self.recv_buffer_bytes),
                ));
            }
        }

        if self.report_interval_secs == 0 {
            return Err(ConfigError::invalid("report_interval_secs", "must be at least 1"));
        }
        Ok(())
    }

    /// Resolve the beacon destination
    pub fn target_addr(&self) -> Result<SocketAddr> {
        resolve(&self.target_host, self.target_port)
    }

    /// Resolve the listener bind address
    pub fn listen_addr(&self) -> Result<SocketAddr> {
        resolve(&self.listen_host, self.listen_port)
    }

    pub fn beacon_interval(&self) -> Duration {
        Duration::from_millis(self.beacon_interval_ms)
    }

    pub fn report_interval(&self) -> Duration {
        Duration::from_secs(self.report_interval_secs)
    }
}

fn resolve(host: &str, port: u16) -> Result<SocketAddr> {
    let address = format!("{}:{}", host, port);
    let mut candidates = (host, port)
        .to_socket_addrs()
        .map_err(|source| ConfigError::Address {
            address: address.clone(),
            source,
        })?;
    candidates.next().ok_or_else(|| ConfigError::Address {
        address,
        source: std::io::Error::new(std::io::ErrorKind::NotFound, "no addresses returned"),
    })
}
