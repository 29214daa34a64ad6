//! # Litehaus Listener
//!
//! Ingests heartbeat streams from any number of beacons over TCP, recovers
//! frames, decodes them on a worker pool and aggregates statistics.
//!
//! ## Usage
//!
//! ```no_run
//! # async fn run() -> listener::Result<()> {
//! use listener::{Listener, ListenerConfig};
//! use network::StatsAggregator;
//! use std::sync::Arc;
//!
//! let stats = Arc::new(StatsAggregator::new());
//! let listener = Listener::bind(ListenerConfig::new("0.0.0.0:9000".parse().unwrap()), stats).await?;
//! let mut observations = listener.subscribe();
//! listener.start();
//! while let Ok(observation) = observations.recv().await {
//!     println!("{} #{}", observation.message.source_id, observation.message.sequence_number);
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
mod connection;
pub mod error;
pub mod server;
pub mod worker;

pub use config::ListenerConfig;
pub use error::{ListenerError, Result};
pub use server::Listener;
pub use worker::{Observation, ParseJob, IDLE_POLL_INTERVAL};
