//! # Runtime Flow Tests
//!
//! Background work wired the way the binary wires it:
//!
//! ```text
//! [BrokerLink] ──BrokerMessage──→ [ingest task] ──→ [PathRegistry]
//!                                        │
//!                                        ↓
//!                               [InMemoryEventBus] → subscribers
//!
//! [MetricsSimulator / RepositoryMonitor] ──tick──→ [PathRegistry] + bus
//! ```

#[cfg(test)]
use std::sync::Arc;

#[cfg(test)]
use std::time::Duration;

#[cfg(test)]
use tempfile::TempDir;

#[cfg(test)]
use hmi_03_simulator::SequenceRandomSource;

#[cfg(test)]
use hmi_runtime::{HmiRuntime, RuntimeConfig};

#[cfg(test)]
use shared_bus::{HmiEvent, Subscription};

#[cfg(test)]
const WAIT: Duration = Duration::from_secs(2);

#[cfg(test)]
fn runtime(dir: &TempDir, tweak: impl FnOnce(&mut RuntimeConfig)) -> HmiRuntime {
    let mut config = RuntimeConfig::default();
    config.storage.base_path = dir.path().to_path_buf();
    config.broker.enabled = false;
    config.gateway.http.enabled = false;
    tweak(&mut config);
    HmiRuntime::with_random_source(config, Arc::new(SequenceRandomSource::neutral())).unwrap()
}

/// Next event matching `pick`, skipping anything else
#[cfg(test)]
async fn next_matching<T>(
    subscription: &mut Subscription,
    mut pick: impl FnMut(HmiEvent) -> Option<T>,
) -> T {
    tokio::time::timeout(WAIT, async {
        loop {
            let event = subscription.recv().await.expect("bus closed");
            if let Some(found) = pick(event) {
                return found;
            }
        }
    })
    .await
    .expect("timed out waiting for event")
}

// =============================================================================
// BROKER INGEST
// =============================================================================

#[cfg(test)]
mod broker_ingest {
    use super::*;
    use chrono::Utc;
    use hmi_04_broker_link::{BrokerMessage, StatusReport};
    use hmi_runtime::ingest::spawn_broker_ingest;
    use serde_json::json;
    use shared_bus::EventFilter;
    use tokio::sync::{broadcast, watch};

    #[tokio::test]
    async fn test_status_and_alarm_reach_subscribers() {
        let dir = TempDir::new().unwrap();
        let rt = runtime(&dir, |_| {});
        let mut events = rt.bus().subscribe(EventFilter::all());

        let (messages_tx, messages_rx) = broadcast::channel(8);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = spawn_broker_ingest(messages_rx, rt.registry(), rt.bus(), shutdown_rx);

        messages_tx
            .send(BrokerMessage::Status {
                plc_id: "PLC1".into(),
                report: StatusReport {
                    status: "Fault".into(),
                    timestamp: Utc::now(),
                    metadata: json!({}),
                },
            })
            .unwrap();
        messages_tx
            .send(BrokerMessage::Alarm {
                plc_id: "PLC_SERVER".into(),
                alarm: json!({ "alarmId": "Overheat", "message": "Cabinet too hot", "priority": 900 }),
            })
            .unwrap();

        let tag = next_matching(&mut events, |e| match e {
            HmiEvent::TagValueUpdated(tag) => Some(tag),
            _ => None,
        })
        .await;
        assert_eq!(tag.value, "Fault");

        let alarm = next_matching(&mut events, |e| match e {
            HmiEvent::AlarmRaised(alarm) => Some(alarm),
            _ => None,
        })
        .await;
        assert_eq!(
            alarm.alarm_path,
            "Enterprise/Site1/Industrial/PLC_SERVER/Alarms/Overheat"
        );
        assert!(rt
            .registry()
            .active_alarms()
            .iter()
            .any(|a| a.alarm_path == alarm.alarm_path));

        shutdown_tx.send(true).unwrap();
        handle.await.unwrap();
    }
}

// =============================================================================
// PERIODIC TASKS
// =============================================================================

#[cfg(test)]
mod periodic {
    use super::*;
    use hmi_01_uns_registry::seed::metric_tags;
    use shared_bus::{EventFilter, EventTopic};

    #[tokio::test]
    async fn test_started_runtime_pushes_metrics() {
        let dir = TempDir::new().unwrap();
        let rt = runtime(&dir, |config| {
            config.simulator.metrics_interval = Duration::from_millis(20);
            config.deployment.enabled = false;
        });
        let mut metrics = rt
            .bus()
            .subscribe(EventFilter::topics(vec![EventTopic::Metrics]));

        let handles = rt.start().await;
        let update = next_matching(&mut metrics, |e| match e {
            HmiEvent::MetricsUpdate(m) => Some(m),
            _ => None,
        })
        .await;
        rt.shutdown(handles).await;

        // A neutral random source leaves every walk where it started
        assert_eq!(update.cpu_usage, 25.3);
        let cpu = rt.registry().get_tag(metric_tags::CPU_USAGE).unwrap();
        assert_eq!(cpu.value, "25.3");
    }

    #[tokio::test]
    async fn test_repository_tick_writes_area_tags() {
        use hmi_02_fs_scanner::RepositoryScanner;
        use hmi_03_simulator::RepositoryMonitor;
        use shared_types::REPOSITORY_AREAS;

        let dir = TempDir::new().unwrap();
        for name in ["index.ts", "routes.ts", "storage.ts"] {
            std::fs::create_dir_all(dir.path().join("server")).unwrap();
            std::fs::write(dir.path().join("server").join(name), "export {}").unwrap();
        }
        let rt = runtime(&dir, |_| {});

        let monitor = RepositoryMonitor::new(rt.registry(), RepositoryScanner::new(dir.path()));
        let stats = monitor.tick(chrono::Utc::now()).await;
        assert_eq!(stats.len(), REPOSITORY_AREAS.len());

        let server = REPOSITORY_AREAS.iter().find(|a| a.path == "server").unwrap();
        let count = rt
            .registry()
            .get_tag(&server.system_tag_path("FileCount"))
            .unwrap();
        assert_eq!(count.value, "3");
    }

    #[tokio::test]
    async fn test_run_until_returns_after_signal() {
        let dir = TempDir::new().unwrap();
        let rt = runtime(&dir, |_| {});

        rt.run_until(tokio::time::sleep(Duration::from_millis(50)))
            .await
            .unwrap();
        assert!(dir.path().join("server/.plc/plc-config.json").exists());
    }
}
