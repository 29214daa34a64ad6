//! Two monitors over loopback: one listening, one beaconing at it

use litehaus_monitor::Monitor;
use monitor_config::{MonitorConfig, RunMode};
use std::time::Duration;

#[tokio::test]
async fn test_beacon_monitor_feeds_listener_monitor() {
    let listening = Monitor::start(MonitorConfig {
        mode: RunMode::Listener,
        listen_host: "127.0.0.1".to_string(),
        listen_port: 0,
        parse_threads: 2,
        ..MonitorConfig::default()
    })
    .await
    .unwrap();
    let listen_addr = listening.listen_addr().unwrap();
    let mut observations = listening.subscribe().unwrap();

    let beaconing = Monitor::start(MonitorConfig {
        mode: RunMode::Beacon,
        target_host: "127.0.0.1".to_string(),
        target_port: listen_addr.port(),
        beacon_interval_ms: 5,
        batch_size: 4,
        source_id: "monitor-e2e".to_string(),
        ..MonitorConfig::default()
    })
    .await
    .unwrap();

    let mut received = 0;
    while received < 8 {
        let observation = tokio::time::timeout(Duration::from_secs(5), observations.recv())
            .await
            .expect("heartbeats arrive")
            .unwrap();
        assert_eq!(observation.message.source_id, "monitor-e2e");
        assert_eq!(observation.kind, codec::FrameKind::Batch);
        received += 1;
    }

    let beacon_stats = beaconing.shutdown().await;
    assert!(beacon_stats.packets_sent >= 2);
    assert_eq!(beacon_stats.packets_received, 0);

    let listener_stats = listening.shutdown().await;
    assert!(listener_stats.batches_received >= 2);
    assert!(listener_stats.heartbeats_received >= 8);
    assert_eq!(listener_stats.active_connections, 0);
}
