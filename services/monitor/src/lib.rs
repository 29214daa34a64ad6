//! # Litehaus Monitor
//!
//! Process-level wiring for the heartbeat mesh: one [`Monitor::start`] call
//! brings up a beacon, a listener or both from a [`MonitorConfig`], sharing
//! one statistics aggregator and logging a report every
//! `report_interval_secs`.
//!
//! [`MonitorConfig`]: monitor_config::MonitorConfig

pub mod app;
pub mod error;
pub mod report;

pub use app::{beacon_config, listener_config, Monitor, MonitorHandle};
pub use error::{MonitorError, Result};
pub use report::log_report;
