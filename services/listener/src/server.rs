//! # Listener Server
//!
//! Owns the bound socket, the accept loop and the parser worker pool.
//!
//! ```text
//! accept loop ─spawn→ reader per connection ─ParseJob→ HandoffQueue
//!                                                          ↓
//!                  broadcast::Sender<Observation> ← parser workers × N
//! ```
//!
//! `bind` is the only fallible step. After `start`, every failure is logged
//! and contained to the connection or frame it happened on.

use crate::config::ListenerConfig;
use crate::connection::{handle_connection, ReaderLimits};
use crate::error::{ListenerError, Result};
use crate::worker::{parser_worker, ListenerContext, Observation};
use network::{ActiveFlag, HandoffQueue, StatsAggregator};
use parking_lot::Mutex;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, error, info, warn};

/// Pause after a failed accept before trying again
const ACCEPT_RETRY_DELAY: Duration = Duration::from_millis(10);

/// TCP heartbeat listener
pub struct Listener {
    config: ListenerConfig,
    socket: Arc<TcpListener>,
    local_addr: SocketAddr,
    ctx: Arc<ListenerContext>,
    active: ActiveFlag,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl Listener {
    /// Bind the listening socket; nothing runs until [`start`](Self::start)
    pub async fn bind(config: ListenerConfig, stats: Arc<StatsAggregator>) -> Result<Self> {
        config.validate()?;

        let socket = TcpListener::bind(config.bind_address)
            .await
            .map_err(|source| ListenerError::Bind {
                address: config.bind_address,
                source,
            })?;
        let local_addr = socket.local_addr()?;
        info!(%local_addr, "Listener bound");

        let (observations, _) = broadcast::channel(config.observation_capacity);

        Ok(Self {
            config,
            socket: Arc::new(socket),
            local_addr,
            ctx: Arc::new(ListenerContext {
                queue: HandoffQueue::new(),
                stats,
                observations,
            }),
            active: ActiveFlag::new(),
            tasks: Mutex::new(Vec::new()),
        })
    }

    /// Address actually bound, including the port chosen for port 0
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Spawn the accept loop and parser workers. Returns `false` if already running.
    pub fn start(&self) -> bool {
        if !self.active.activate() {
            return false;
        }

        let mut tasks = self.tasks.lock();
        tasks.push(tokio::spawn(accept_loop(
            Arc::clone(&self.socket),
            Arc::clone(&self.ctx),
            ReaderLimits {
                recv_buffer_bytes: self.config.recv_buffer_bytes,
                max_frame_bytes: self.config.max_frame_bytes,
            },
            self.config.max_connections,
            self.active.clone(),
        )));
        for worker_id in 0..self.config.parse_workers {
            tasks.push(tokio::spawn(parser_worker(
                worker_id,
                Arc::clone(&self.ctx),
                self.active.clone(),
            )));
        }

        info!(
            local_addr = %self.local_addr,
            parse_workers = self.config.parse_workers,
            max_connections = self.config.max_connections,
            "Listener started"
        );
        true
    }

    /// Stop accepting, close every connection and join every task.
    /// Returns `false` if not running.
    ///
    /// Frames still queued for parsing are dropped.
    pub async fn stop(&self) -> bool {
        if !self.active.deactivate() {
            return false;
        }

        let tasks: Vec<_> = self.tasks.lock().drain(..).collect();
        for task in tasks {
            if let Err(e) = task.await {
                error!(error = %e, "Listener task ended abnormally");
            }
        }

        let dropped = self.ctx.queue.drain();
        info!(local_addr = %self.local_addr, dropped, "Listener stopped");
        true
    }

    pub fn is_active(&self) -> bool {
        self.active.is_active()
    }

    /// Receive an [`Observation`] for every heartbeat decoded from now on
    pub fn subscribe(&self) -> broadcast::Receiver<Observation> {
        self.ctx.observations.subscribe()
    }

    pub fn stats(&self) -> &Arc<StatsAggregator> {
        &self.ctx.stats
    }

    /// Frames waiting for a parser worker
    pub fn queued_frames(&self) -> usize {
        self.ctx.queue.len()
    }
}

async fn accept_loop(
    socket: Arc<TcpListener>,
    ctx: Arc<ListenerContext>,
    limits: ReaderLimits,
    max_connections: usize,
    active: ActiveFlag,
) {
    let mut readers = JoinSet::new();

    while active.is_active() {
        tokio::select! {
            accepted = socket.accept() => match accepted {
                Ok((stream, peer)) => {
                    let current = ctx.stats.active_connections();
                    if current >= max_connections as u64 {
                        warn!(%peer, current, max_connections, "Connection count above configured maximum");
                    }
                    if let Err(e) = stream.set_nodelay(true) {
                        debug!(%peer, "Failed to set TCP_NODELAY: {}", e);
                    }
                    ctx.stats.connection_opened();
                    readers.spawn(handle_connection(
                        stream,
                        peer,
                        Arc::clone(&ctx),
                        limits,
                        active.clone(),
                    ));
                }
                Err(e) => {
                    warn!(error = %e, "Accept failed");
                    tokio::time::sleep(ACCEPT_RETRY_DELAY).await;
                }
            },
            Some(finished) = readers.join_next(), if !readers.is_empty() => {
                if let Err(e) = finished {
                    error!(error = %e, "Connection reader panicked");
                }
            }
            _ = active.cancelled() => break,
        }
    }

    // Readers observe the same flag and exit on their own
    while let Some(finished) = readers.join_next().await {
        if let Err(e) = finished {
            error!(error = %e, "Connection reader panicked");
        }
    }
    debug!("Accept loop exited");
}
