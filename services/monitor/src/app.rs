//! # Monitor Orchestration
//!
//! Brings up the roles the run mode asks for around one shared
//! [`StatsAggregator`], plus the report task, and hands back a
//! [`MonitorHandle`] that owns all of them.

use crate::error::Result;
use crate::report::{log_report, report_loop};
use beacon::{BeaconConfig, BeaconTransmitter};
use listener::{Listener, ListenerConfig, Observation};
use monitor_config::MonitorConfig;
use network::{ActiveFlag, NetworkStats, StatsAggregator};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Beacon settings derived from the monitor configuration
pub fn beacon_config(config: &MonitorConfig) -> Result<BeaconConfig> {
    Ok(BeaconConfig {
        source_id: config.source_id.clone(),
        target: config.target_addr()?,
        transport: config.transport,
        interval: config.beacon_interval(),
        batch_size: config.batch_size,
    })
}

/// Listener settings derived from the monitor configuration
pub fn listener_config(config: &MonitorConfig) -> Result<ListenerConfig> {
    Ok(ListenerConfig {
        parse_workers: config.parse_threads,
        max_connections: config.max_connections,
        max_frame_bytes: config.max_frame_bytes,
        recv_buffer_bytes: config.recv_buffer_bytes,
        ..ListenerConfig::new(config.listen_addr()?)
    })
}

/// Entry point for running a monitor
pub struct Monitor;

impl Monitor {
    /// Validate, bind and start every enabled role.
    ///
    /// The listener starts first so a beacon aimed at it in `both` mode
    /// finds it accepting. If the beacon then fails, the listener is stopped
    /// before the error is returned.
    pub async fn start(config: MonitorConfig) -> Result<MonitorHandle> {
        config.validate()?;
        let stats = Arc::new(StatsAggregator::new());

        let listener = if config.mode.runs_listener() {
            let listener = Listener::bind(listener_config(&config)?, Arc::clone(&stats)).await?;
            listener.start();
            Some(listener)
        } else {
            None
        };

        let beacon = if config.mode.runs_beacon() {
            let started: Result<BeaconTransmitter> = match beacon_config(&config) {
                Ok(beacon_config) => BeaconTransmitter::connect(beacon_config, Arc::clone(&stats))
                    .await
                    .map_err(Into::into),
                Err(e) => Err(e),
            };
            match started {
                Ok(beacon) => {
                    beacon.start();
                    Some(Arc::new(beacon))
                }
                Err(e) => {
                    if let Some(listener) = &listener {
                        listener.stop().await;
                    }
                    return Err(e);
                }
            }
        } else {
            None
        };

        let report_active = ActiveFlag::new();
        report_active.activate();
        let report_task = tokio::spawn(report_loop(
            Arc::clone(&stats),
            beacon.clone(),
            config.report_interval(),
            report_active.clone(),
        ));

        info!(
            mode = %config.mode,
            listen = ?listener.as_ref().map(Listener::local_addr),
            target = ?beacon.as_ref().map(|b| b.config().target),
            report_interval_secs = config.report_interval_secs,
            "Monitor running"
        );

        Ok(MonitorHandle {
            config,
            stats,
            listener,
            beacon,
            report_active,
            report_task,
        })
    }
}

/// Owner of a running monitor's roles
pub struct MonitorHandle {
    config: MonitorConfig,
    stats: Arc<StatsAggregator>,
    listener: Option<Listener>,
    beacon: Option<Arc<BeaconTransmitter>>,
    report_active: ActiveFlag,
    report_task: JoinHandle<()>,
}

impl MonitorHandle {
    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    pub fn stats(&self) -> &Arc<StatsAggregator> {
        &self.stats
    }

    /// Address the listener bound, if this monitor listens
    pub fn listen_addr(&self) -> Option<SocketAddr> {
        self.listener.as_ref().map(Listener::local_addr)
    }

    /// Subscribe to decoded heartbeats, if this monitor listens
    pub fn subscribe(&self) -> Option<broadcast::Receiver<Observation>> {
        self.listener.as_ref().map(Listener::subscribe)
    }

    pub fn beacon(&self) -> Option<&BeaconTransmitter> {
        self.beacon.as_deref()
    }

    pub fn snapshot(&self) -> NetworkStats {
        self.stats.snapshot()
    }

    /// Stop the beacon, then the listener, then reporting; log a final
    /// report and return it.
    pub async fn shutdown(self) -> NetworkStats {
        if let Some(beacon) = &self.beacon {
            beacon.stop().await;
        }
        if let Some(listener) = &self.listener {
            listener.stop().await;
        }

        self.report_active.deactivate();
        if let Err(e) = self.report_task.await {
            warn!(error = %e, "Report task ended abnormally");
        }

        let last = self.stats.snapshot();
        log_report(&last, self.beacon.as_deref());
        info!("Monitor stopped");
        last
    }
}
