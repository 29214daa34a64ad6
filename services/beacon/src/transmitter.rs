//! Beacon transmitter: pacing loop, batching loop and best-effort sends

use crate::error::{BeaconError, Result};
use codec::{capability_tag, seal_batch, seal_heartbeat, BatchMessage, HeartbeatMessage};
use network::{
    safe_system_timestamp_ns, ActiveFlag, HandoffQueue, StatsAggregator, Transport,
    TransportFactory, TransportType,
};
use parking_lot::Mutex;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// How often the batching task drains queued heartbeats
pub const BATCH_FLUSH_INTERVAL: Duration = Duration::from_millis(10);

/// Beacon settings
#[derive(Debug, Clone)]
pub struct BeaconConfig {
    pub source_id: String,
    pub target: SocketAddr,
    pub transport: TransportType,
    pub interval: Duration,
    /// 1 sends every heartbeat on its own
    pub batch_size: usize,
}

impl BeaconConfig {
    pub fn new(target: SocketAddr) -> Self {
        Self {
            source_id: "litehaus-beacon".to_string(),
            target,
            transport: TransportType::Tcp,
            interval: Duration::from_millis(1000),
            batch_size: 10,
        }
    }

    fn validate(&self) -> Result<()> {
        if self.interval.is_zero() {
            return Err(BeaconError::Config("interval must be non-zero".to_string()));
        }
        if self.batch_size == 0 {
            return Err(BeaconError::Config("batch_size must be at least 1".to_string()));
        }
        Ok(())
    }

    fn batching(&self) -> bool {
        self.batch_size > 1
    }
}

/// State shared by the pacing and batching tasks
struct BeaconCore {
    config: BeaconConfig,
    transport: Arc<dyn Transport>,
    stats: Arc<StatsAggregator>,
    sequence: AtomicU32,
    batch_counter: AtomicU32,
    pending: HandoffQueue<HeartbeatMessage>,
    capability: u32,
}

impl BeaconCore {
    fn next_heartbeat(&self) -> HeartbeatMessage {
        let sequence = self.sequence.fetch_add(1, Ordering::AcqRel);
        let payload = format!("Litehaus - SIMD:{} Seq:{}", self.capability, sequence);
        HeartbeatMessage::new(
            self.config.source_id.as_str(),
            sequence,
            safe_system_timestamp_ns(),
            payload,
        )
        .with_capability(self.capability)
    }

    async fn emit(&self) {
        let heartbeat = self.next_heartbeat();
        if self.config.batching() {
            self.pending.enqueue(heartbeat);
        } else {
            self.send_single(heartbeat).await;
        }
    }

    async fn send_single(&self, mut heartbeat: HeartbeatMessage) {
        let start = Instant::now();
        let frame = match seal_heartbeat(&mut heartbeat) {
            Ok(frame) => frame,
            Err(e) => {
                warn!(sequence = heartbeat.sequence_number, error = %e, "Failed to encode heartbeat");
                return;
            }
        };
        let serialize_us = start.elapsed().as_micros() as u64;

        match self.transport.send(&frame).await {
            Ok(bytes) => {
                self.stats.record_packet_sent(bytes);
                if heartbeat.is_critical {
                    info!(sequence = heartbeat.sequence_number, bytes, serialize_us, "Critical beacon sent");
                } else {
                    debug!(sequence = heartbeat.sequence_number, bytes, serialize_us, "Beacon sent");
                }
            }
            Err(e) if e.is_backpressure() => {
                debug!(sequence = heartbeat.sequence_number, error = %e, "Beacon dropped, receiver not draining");
            }
            Err(e) => {
                warn!(sequence = heartbeat.sequence_number, error = %e, "Beacon send failed");
            }
        }
    }

    async fn send_batch(&self, messages: Vec<HeartbeatMessage>) {
        let start = Instant::now();
        let batch_id = self.batch_counter.fetch_add(1, Ordering::AcqRel);
        let mut batch = BatchMessage::new(batch_id, messages);
        let frame = match seal_batch(&mut batch) {
            Ok(frame) => frame,
            Err(e) => {
                warn!(batch_id, error = %e, "Failed to encode batch");
                return;
            }
        };
        let serialize_us = start.elapsed().as_micros() as u64;

        match self.transport.send(&frame).await {
            Ok(bytes) => {
                self.stats.record_packet_sent(bytes);
                debug!(
                    batch_id,
                    messages = batch.len(),
                    bytes,
                    serialize_us,
                    compression_ratio = batch.compression_ratio,
                    "Batch sent"
                );
            }
            Err(e) if e.is_backpressure() => {
                debug!(batch_id, messages = batch.len(), error = %e, "Batch dropped, receiver not draining");
            }
            Err(e) => {
                warn!(batch_id, messages = batch.len(), error = %e, "Batch send failed");
            }
        }
    }
}

/// Paced heartbeat emitter
///
/// `start` and `stop` are idempotent. The first heartbeat goes out as soon as
/// the pacing task runs; later ones every `interval` after the previous.
pub struct BeaconTransmitter {
    core: Arc<BeaconCore>,
    active: ActiveFlag,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl BeaconTransmitter {
    /// Build a transmitter over an existing transport
    pub fn new(
        config: BeaconConfig,
        transport: Arc<dyn Transport>,
        stats: Arc<StatsAggregator>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            core: Arc::new(BeaconCore {
                config,
                transport,
                stats,
                sequence: AtomicU32::new(0),
                batch_counter: AtomicU32::new(0),
                pending: HandoffQueue::new(),
                capability: capability_tag(),
            }),
            active: ActiveFlag::new(),
            tasks: Mutex::new(Vec::new()),
        })
    }

    /// Create the configured transport and build a transmitter over it
    pub async fn connect(config: BeaconConfig, stats: Arc<StatsAggregator>) -> Result<Self> {
        config.validate()?;
        let transport = TransportFactory::create_transport(config.transport, config.target).await?;
        Self::new(config, Arc::from(transport), stats)
    }

    /// Spawn the pacing task, plus the batching task when batching.
    /// Returns `false` if already running.
    pub fn start(&self) -> bool {
        if !self.active.activate() {
            return false;
        }

        let mut tasks = self.tasks.lock();
        tasks.push(tokio::spawn(pacing_loop(
            Arc::clone(&self.core),
            self.active.clone(),
        )));
        if self.core.config.batching() {
            tasks.push(tokio::spawn(batch_loop(
                Arc::clone(&self.core),
                self.active.clone(),
            )));
        }

        info!(
            source_id = %self.core.config.source_id,
            target = %self.core.config.target,
            transport = %self.core.config.transport,
            interval_ms = self.core.config.interval.as_millis() as u64,
            batch_size = self.core.config.batch_size,
            simd = self.core.capability,
            "Beacon activated"
        );
        true
    }

    /// Stop both tasks and wait for them. Returns `false` if not running.
    ///
    /// Heartbeats still queued for batching are dropped.
    pub async fn stop(&self) -> bool {
        if !self.active.deactivate() {
            return false;
        }

        let tasks: Vec<_> = self.tasks.lock().drain(..).collect();
        for task in tasks {
            if let Err(e) = task.await {
                warn!(error = %e, "Beacon task ended abnormally");
            }
        }

        let dropped = self.core.pending.drain();
        if let Err(e) = self.core.transport.close().await {
            warn!(error = %e, "Failed to close beacon transport");
        }

        info!(
            sent_sequences = self.sequence_counter(),
            batches = self.batch_counter(),
            dropped,
            "Beacon stopped"
        );
        true
    }

    pub fn is_active(&self) -> bool {
        self.active.is_active()
    }

    /// Next sequence number to be assigned
    pub fn sequence_counter(&self) -> u32 {
        self.core.sequence.load(Ordering::Acquire)
    }

    /// Next batch id to be assigned
    pub fn batch_counter(&self) -> u32 {
        self.core.batch_counter.load(Ordering::Acquire)
    }

    /// Heartbeats waiting for the batching task
    pub fn pending_len(&self) -> usize {
        self.core.pending.len()
    }

    pub fn config(&self) -> &BeaconConfig {
        &self.core.config
    }
}

async fn pacing_loop(core: Arc<BeaconCore>, active: ActiveFlag) {
    let mut next_beacon = tokio::time::Instant::now();

    while active.is_active() {
        let now = tokio::time::Instant::now();
        if now >= next_beacon {
            // A connect in progress must not hold up stop
            tokio::select! {
                _ = core.emit() => {}
                _ = active.cancelled() => break,
            }
            next_beacon = now + core.config.interval;
        }

        tokio::select! {
            _ = tokio::time::sleep_until(next_beacon) => {}
            _ = active.cancelled() => break,
        }
    }
    debug!("Beacon pacing loop exited");
}

async fn batch_loop(core: Arc<BeaconCore>, active: ActiveFlag) {
    while active.is_active() {
        let messages = core.pending.dequeue_up_to(core.config.batch_size);
        if !messages.is_empty() {
            tokio::select! {
                _ = core.send_batch(messages) => {}
                _ = active.cancelled() => break,
            }
        }

        tokio::select! {
            _ = tokio::time::sleep(BATCH_FLUSH_INTERVAL) => {}
            _ = active.cancelled() => break,
        }
    }
    debug!("Beacon batch loop exited");
}
