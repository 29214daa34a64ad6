//! Integration tests for the network crate
//!
//! Drives the pieces the listener is assembled from over real sockets:
//! beacon transport → TCP stream → framer → handoff queue → decoder.
//! Uses real connections, no mocks.

use codec::{decode, encode_heartbeat, seal_batch, BatchMessage, HeartbeatMessage, WireMessage};
use network::transports::{TcpTransport, Transport};
use network::{HandoffQueue, StatsAggregator, StreamFramer, DEFAULT_TCP_BUFFER_SIZE};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::net::TcpListener;

#[tokio::test]
async fn test_transport_to_framer_to_queue() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let queue = Arc::new(HandoffQueue::new());
    let stats = Arc::new(StatsAggregator::new());

    let reader = {
        let queue = Arc::clone(&queue);
        let stats = Arc::clone(&stats);
        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut framer = StreamFramer::new();
            let mut buf = vec![0u8; DEFAULT_TCP_BUFFER_SIZE];
            let mut frames = Vec::new();
            loop {
                let n = stream.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                stats.record_packet_received(n);
                framer.push(&buf[..n], &mut frames).unwrap();
                for frame in frames.drain(..) {
                    queue.enqueue(frame);
                }
            }
        })
    };

    let transport = TcpTransport::new(addr);
    for seq in 0..5 {
        let msg = HeartbeatMessage::new("it-beacon", seq, 42, "payload {with braces}");
        transport.send(&encode_heartbeat(&msg).unwrap()).await.unwrap();
    }
    let mut batch = BatchMessage::new(
        1,
        (5..8).map(|s| HeartbeatMessage::new("it-beacon", s, 42, "b")).collect(),
    );
    transport.send(&seal_batch(&mut batch).unwrap()).await.unwrap();
    transport.close().await.unwrap();

    tokio::time::timeout(Duration::from_secs(5), reader)
        .await
        .expect("reader finishes")
        .unwrap();

    assert_eq!(queue.len(), 6);
    let mut sequences = Vec::new();
    while let Some(frame) = queue.dequeue() {
        match decode(&frame).unwrap() {
            WireMessage::Single(msg) => sequences.push(msg.sequence_number),
            WireMessage::Batch(batch) => {
                assert_eq!(batch.batch_id, 1);
                sequences.extend(batch.messages.iter().map(|m| m.sequence_number));
            }
        }
    }
    assert_eq!(sequences, (0..8).collect::<Vec<_>>());
    assert!(stats.snapshot().bytes_transmitted > 0);
}
