//! Broker inbound messages → registry → push channel.

use chrono::Utc;
use hmi_01_uns_registry::PathRegistry;
use hmi_04_broker_link::{apply_message, BrokerMessage};
use shared_bus::{EventPublisher, HmiEvent};
use std::sync::Arc;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Apply every inbound broker message to the registry and broadcast the
/// resulting tag writes and alarms. Stops on shutdown or when the link's
/// message channel closes.
pub fn spawn_broker_ingest(
    mut messages: broadcast::Receiver<BrokerMessage>,
    registry: Arc<PathRegistry>,
    publisher: Arc<dyn EventPublisher>,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            tokio::select! {
                received = messages.recv() => match received {
                    Ok(message) => {
                        ingest(&registry, publisher.as_ref(), &message).await;
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Broker ingest lagged, messages dropped");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }
        info!("Broker ingest stopped");
    })
}

/// Apply one message and publish what changed. Returns the number of
/// events published.
pub async fn ingest(
    registry: &PathRegistry,
    publisher: &dyn EventPublisher,
    message: &BrokerMessage,
) -> usize {
    let ingested = apply_message(registry, message, Utc::now());
    if ingested.is_empty() {
        return 0;
    }

    let mut published = 0;
    for tag in ingested.tags {
        publisher.publish(HmiEvent::TagValueUpdated(tag)).await;
        published += 1;
    }
    if let Some(alarm) = ingested.alarm {
        publisher.publish(HmiEvent::AlarmRaised(alarm)).await;
        published += 1;
    }
    debug!(published, "Broker message applied");
    published
}

#[cfg(test)]
mod tests {
    use super::*;
    use hmi_01_uns_registry::seed_registry;
    use hmi_04_broker_link::StatusReport;
    use serde_json::json;
    use shared_bus::{EventFilter, InMemoryEventBus};

    fn seeded() -> (Arc<PathRegistry>, Arc<InMemoryEventBus>) {
        let registry = Arc::new(PathRegistry::new());
        seed_registry(&registry).unwrap();
        (registry, Arc::new(InMemoryEventBus::new()))
    }

    #[tokio::test]
    async fn test_status_message_updates_tag_and_broadcasts() {
        let (registry, bus) = seeded();
        let mut subscription = bus.subscribe(EventFilter::all());

        let message = BrokerMessage::Status {
            plc_id: "PLC1".into(),
            report: StatusReport {
                status: "Warning".into(),
                timestamp: Utc::now(),
                metadata: json!({}),
            },
        };
        assert_eq!(ingest(&registry, bus.as_ref(), &message).await, 1);

        match subscription.try_recv().unwrap() {
            Some(HmiEvent::TagValueUpdated(tag)) => {
                assert!(tag.tag_path.ends_with("/PLC1/System/Status"));
                assert_eq!(tag.value, "Warning");
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_remote_alarm_is_raised() {
        let (registry, bus) = seeded();
        let message = BrokerMessage::Alarm {
            plc_id: "PLC_CLIENT".into(),
            alarm: json!({ "alarmId": "A1", "message": "Disk full", "priority": 800 }),
        };
        assert_eq!(ingest(&registry, bus.as_ref(), &message).await, 1);

        let alarm = registry
            .get_alarm("Enterprise/Site1/Industrial/PLC_CLIENT/Alarms/A1")
            .unwrap();
        assert!(alarm.is_pending());
        assert_eq!(alarm.priority, 800);
    }

    #[tokio::test]
    async fn test_ingest_task_stops_on_shutdown() {
        let (registry, bus) = seeded();
        let (_messages_tx, messages_rx) = broadcast::channel(4);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let handle = spawn_broker_ingest(messages_rx, registry, bus, shutdown_rx);
        shutdown_tx.send(true).unwrap();
        handle.await.unwrap();
    }
}
