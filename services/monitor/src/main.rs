//! Litehaus monitor binary
//!
//! Usage:
//!   litehaus --mode both
//!   litehaus --mode listener --listen-port 9000 --parse-threads 8
//!   litehaus --mode beacon --target-host 10.0.0.5 --batch-size 1 --transport udp
//!   litehaus --config monitor.toml --json-logs

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use litehaus_monitor::Monitor;
use monitor_config::{MonitorConfig, RunMode, TransportType};
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Mode {
    Beacon,
    Listener,
    Both,
}

impl From<Mode> for RunMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Beacon => RunMode::Beacon,
            Mode::Listener => RunMode::Listener,
            Mode::Both => RunMode::Both,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "litehaus")]
#[command(about = "Litehaus heartbeat beacon and listener")]
#[command(version)]
struct Args {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Roles to run
    #[arg(short, long, value_enum)]
    mode: Option<Mode>,

    /// Host the beacon sends to
    #[arg(long)]
    target_host: Option<String>,

    /// Port the beacon sends to
    #[arg(long)]
    target_port: Option<u16>,

    /// Port the listener binds (0 picks a free port)
    #[arg(long)]
    listen_port: Option<u16>,

    /// Address the listener binds
    #[arg(long)]
    listen_host: Option<String>,

    /// Milliseconds between heartbeats
    #[arg(long)]
    interval_ms: Option<u64>,

    /// Heartbeats per batch (1 disables batching)
    #[arg(long)]
    batch_size: Option<usize>,

    /// Parser worker count
    #[arg(long)]
    parse_threads: Option<usize>,

    /// Connections accepted before warnings are logged
    #[arg(long)]
    max_connections: Option<usize>,

    /// Beacon transport (tcp or udp)
    #[arg(long)]
    transport: Option<TransportType>,

    /// Source identifier carried in every heartbeat
    #[arg(long)]
    source_id: Option<String>,

    /// Seconds between performance reports
    #[arg(long)]
    report_interval_secs: Option<u64>,

    /// Log level when RUST_LOG is unset (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Enable JSON logging format
    #[arg(long)]
    json_logs: bool,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    print_config: bool,
}

impl Args {
    fn apply(&self, config: &mut MonitorConfig) {
        if let Some(mode) = self.mode {
            config.mode = mode.into();
        }
        if let Some(host) = &self.target_host {
            config.target_host = host.clone();
        }
        if let Some(port) = self.target_port {
            config.target_port = port;
        }
        if let Some(host) = &self.listen_host {
            config.listen_host = host.clone();
        }
        if let Some(port) = self.listen_port {
            config.listen_port = port;
        }
        if let Some(interval) = self.interval_ms {
            config.beacon_interval_ms = interval;
        }
        if let Some(size) = self.batch_size {
            config.batch_size = size;
        }
        if let Some(threads) = self.parse_threads {
            config.parse_threads = threads;
        }
        if let Some(max) = self.max_connections {
            config.max_connections = max;
        }
        if let Some(transport) = self.transport {
            config.transport = transport;
        }
        if let Some(source_id) = &self.source_id {
            config.source_id = source_id.clone();
        }
        if let Some(secs) = self.report_interval_secs {
            config.report_interval_secs = secs;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args);

    let config = effective_config(&args)?;

    if args.print_config {
        print!("{}", config.to_toml_string()?);
        return Ok(());
    }

    info!("Starting Litehaus monitor");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let monitor = Monitor::start(config).await.map_err(|e| {
        error!("Failed to start monitor: {}", e);
        e
    })?;

    tokio::signal::ctrl_c()
        .await
        .context("installing Ctrl-C handler")?;
    info!("Received shutdown signal");

    monitor.shutdown().await;
    Ok(())
}

/// File and environment layers, then flags, validated once at the end
fn effective_config(args: &Args) -> Result<MonitorConfig> {
    let mut config =
        MonitorConfig::load_unvalidated(args.config.as_deref()).context("loading configuration")?;
    args.apply(&mut config);
    config.validate().context("validating configuration")?;
    Ok(config)
}

fn init_logging(args: &Args) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(args.json_logs.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!args.json_logs).then(|| tracing_subscriber::fmt::layer()))
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn parse(extra: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("litehaus").chain(extra.iter().copied())).unwrap()
    }

    #[test]
    fn test_flags_fix_invalid_file_values() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "batch_size = 0\ntarget_port = 0").unwrap();
        let path = file.path().to_str().unwrap();

        let args = parse(&["--config", path, "--batch-size", "5", "--target-port", "9100"]);
        let config = effective_config(&args).unwrap();
        assert_eq!(config.batch_size, 5);
        assert_eq!(config.target_port, 9100);

        let args = parse(&["--config", path, "--batch-size", "5"]);
        assert!(effective_config(&args).is_err());
    }

    #[test]
    fn test_flags_override_defaults() {
        let args = parse(&["--mode", "listener", "--listen-port", "0", "--transport", "udp"]);
        let config = effective_config(&args).unwrap();
        assert_eq!(config.mode, RunMode::Listener);
        assert_eq!(config.listen_port, 0);
        assert_eq!(config.transport, TransportType::Udp);
    }
}
