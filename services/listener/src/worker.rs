//! # Parser Workers
//!
//! A fixed pool of tasks drains the shared handoff queue. Each job is one
//! framed JSON object; the worker decodes it, times the decode, feeds the
//! statistics aggregator and publishes one [`Observation`] per heartbeat.
//!
//! Decode failures drop the frame and bump `frames_dropped`; a worker never
//! exits because of a bad frame.

use bytes::Bytes;
use codec::{decode, FrameKind, HeartbeatMessage};
use network::{latency_ms, ActiveFlag, HandoffQueue, StatsAggregator};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

/// Worker sleep when the queue is empty
pub const IDLE_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// One framed object waiting to be decoded
#[derive(Debug, Clone)]
pub struct ParseJob {
    pub frame: Bytes,
    pub peer: SocketAddr,
    /// Listener clock when the bytes completing this frame arrived
    pub received_at_ns: u64,
}

/// A decoded heartbeat as seen by the listener
#[derive(Debug, Clone)]
pub struct Observation {
    /// Shape of the frame the heartbeat arrived in
    pub kind: FrameKind,
    pub batch_id: Option<u32>,
    /// The heartbeat with `parse_time_us` filled in
    pub message: HeartbeatMessage,
    pub peer: SocketAddr,
    /// `None` when the heartbeat carried no timestamp
    pub latency_ms: Option<f64>,
}

/// State every reader and worker shares
pub(crate) struct ListenerContext {
    pub(crate) queue: HandoffQueue<ParseJob>,
    pub(crate) stats: Arc<StatsAggregator>,
    pub(crate) observations: broadcast::Sender<Observation>,
}

impl ListenerContext {
    pub(crate) fn process(&self, job: ParseJob) {
        let start = Instant::now();
        let decoded = decode(&job.frame);
        let parse_time_us = start.elapsed().as_nanos() as f64 / 1_000.0;
        self.stats.record_decode();

        let message = match decoded {
            Ok(message) => message,
            Err(e) => {
                self.stats.record_frame_dropped();
                warn!(peer = %job.peer, frame_bytes = job.frame.len(), error = %e, "Dropping undecodable frame");
                return;
            }
        };

        self.stats.record_parse(parse_time_us);
        let kind = message.kind();
        let batch_id = message.batch_id();
        if kind == FrameKind::Batch {
            self.stats.record_batch();
            debug!(
                peer = %job.peer,
                batch_id,
                messages = message.message_count(),
                parse_time_us,
                "Batch received"
            );
        }

        for mut heartbeat in message.into_messages() {
            heartbeat.parse_time_us = parse_time_us;

            let latency = (heartbeat.timestamp_ns > 0)
                .then(|| latency_ms(heartbeat.timestamp_ns, job.received_at_ns));
            if let Some(latency) = latency {
                self.stats.record_latency(latency);
            }
            self.stats.record_heartbeat(heartbeat.is_critical);

            if heartbeat.is_critical {
                info!(
                    peer = %job.peer,
                    source_id = %heartbeat.source_id,
                    sequence = heartbeat.sequence_number,
                    latency_ms = latency.unwrap_or_default(),
                    "Critical heartbeat received"
                );
            } else {
                debug!(
                    peer = %job.peer,
                    source_id = %heartbeat.source_id,
                    sequence = heartbeat.sequence_number,
                    parse_time_us,
                    "Heartbeat received"
                );
            }

            // No subscribers is fine
            let _ = self.observations.send(Observation {
                kind,
                batch_id,
                message: heartbeat,
                peer: job.peer,
                latency_ms: latency,
            });
        }
    }
}

pub(crate) async fn parser_worker(worker_id: usize, ctx: Arc<ListenerContext>, active: ActiveFlag) {
    debug!(worker_id, "Parser worker started");
    let mut processed = 0u64;

    while active.is_active() {
        match ctx.queue.dequeue() {
            Some(job) => {
                ctx.process(job);
                processed += 1;
                // Let readers run between long stretches of back-to-back frames
                if processed % 256 == 0 {
                    tokio::task::yield_now().await;
                }
            }
            None => {
                tokio::select! {
                    _ = tokio::time::sleep(IDLE_POLL_INTERVAL) => {}
                    _ = active.cancelled() => break,
                }
            }
        }
    }
    debug!(worker_id, processed, "Parser worker exited");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> (ListenerContext, broadcast::Receiver<Observation>) {
        let (tx, rx) = broadcast::channel(16);
        (
            ListenerContext {
                queue: HandoffQueue::new(),
                stats: Arc::new(StatsAggregator::new()),
                observations: tx,
            },
            rx,
        )
    }

    fn job(frame: &'static [u8], received_at_ns: u64) -> ParseJob {
        ParseJob {
            frame: Bytes::from_static(frame),
            peer: "127.0.0.1:5000".parse().unwrap(),
            received_at_ns,
        }
    }

    #[test]
    fn test_single_frame_observed() {
        let (ctx, mut rx) = context();
        ctx.process(job(
            br#"{"source_id":"X","message_type":"heartbeat","sequence_number":100,"timestamp_ns":1000000}"#,
            4_000_000,
        ));

        let observation = rx.try_recv().unwrap();
        assert_eq!(observation.kind, FrameKind::Single);
        assert_eq!(observation.batch_id, None);
        assert_eq!(observation.message.source_id, "X");
        assert_eq!(observation.latency_ms, Some(3.0));
        assert!(observation.message.parse_time_us >= 0.0);

        let snap = ctx.stats.snapshot();
        assert_eq!(snap.heartbeats_received, 1);
        assert_eq!(snap.parse_count, 1);
        assert_eq!(snap.decode_operations, 1);
        assert_eq!(snap.avg_latency_ms, 3.0);
    }

    #[test]
    fn test_batch_frame_fans_out() {
        let (ctx, mut rx) = context();
        ctx.process(job(
            br#"{"batch_id":9,"messages":[{"sequence_number":200,"is_critical":true},{"sequence_number":201}],"compression_ratio":150}"#,
            1,
        ));

        let first = rx.try_recv().unwrap();
        let second = rx.try_recv().unwrap();
        assert_eq!(first.kind, FrameKind::Batch);
        assert_eq!(first.batch_id, Some(9));
        assert_eq!(first.message.sequence_number, 200);
        assert_eq!(second.message.sequence_number, 201);
        // Members carry no timestamp
        assert_eq!(first.latency_ms, None);

        let snap = ctx.stats.snapshot();
        assert_eq!(snap.batches_received, 1);
        assert_eq!(snap.heartbeats_received, 2);
        assert_eq!(snap.critical_received, 1);
        assert_eq!(snap.parse_count, 1);
    }

    #[test]
    fn test_bad_frames_dropped() {
        let (ctx, mut rx) = context();
        ctx.process(job(br#"{"hello":"world"}"#, 1));
        ctx.process(job(br#"{"source_id":"#, 1));

        assert!(rx.try_recv().is_err());
        let snap = ctx.stats.snapshot();
        assert_eq!(snap.frames_dropped, 2);
        assert_eq!(snap.decode_operations, 2);
        assert_eq!(snap.parse_count, 0);
    }
}
