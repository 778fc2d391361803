//! # Broker Link Service
//!
//! Owns the connection state and the live transport. Publishing never fails
//! towards the caller: when the link is not `Connected` a publish is logged
//! at debug and dropped.

use std::sync::Arc;

use chrono::Utc;
use parking_lot::RwLock;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::{broadcast, mpsc, watch};
use tracing::{debug, info, warn};

use crate::config::BrokerConfig;
use crate::domain::messages::{BrokerMessage, PlcTelemetry, ScadaCommand, StatusReport};
use crate::domain::topic::{Topic, SUBSCRIPTIONS};
use crate::error::BrokerError;
use crate::ports::{BrokerConnector, BrokerTransport, Frame};

/// Connection state of the link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    /// Broker unreachable or lost; running without it.
    Degraded,
}

pub struct BrokerLink {
    config: BrokerConfig,
    connector: Arc<dyn BrokerConnector>,
    state: Arc<watch::Sender<ConnectionState>>,
    transport: Arc<RwLock<Option<Arc<dyn BrokerTransport>>>>,
    messages: broadcast::Sender<BrokerMessage>,
}

impl BrokerLink {
    pub fn new(config: BrokerConfig, connector: Arc<dyn BrokerConnector>) -> Self {
        let (state, _) = watch::channel(ConnectionState::Disconnected);
        let (messages, _) = broadcast::channel(config.inbound_capacity.max(1));
        Self {
            config,
            connector,
            state: Arc::new(state),
            transport: Arc::new(RwLock::new(None)),
            messages,
        }
    }

    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    pub fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.state.subscribe()
    }

    /// Decoded inbound messages.
    pub fn subscribe(&self) -> broadcast::Receiver<BrokerMessage> {
        self.messages.subscribe()
    }

    /// Attempt a connection within the configured timeout.
    ///
    /// Resolves to the resulting state; failure yields `Degraded`, never an
    /// error.
    pub async fn connect(&self) -> ConnectionState {
        if !self.config.enabled {
            debug!("Broker link disabled");
            self.set_state(ConnectionState::Degraded);
            return ConnectionState::Degraded;
        }

        self.set_state(ConnectionState::Connecting);
        info!(url = %self.config.url, "Connecting to broker");

        let (inbound_tx, inbound_rx) = mpsc::channel(self.config.inbound_capacity.max(1));
        let attempt = tokio::time::timeout(
            self.config.connect_timeout,
            self.connector.connect(inbound_tx),
        )
        .await
        .unwrap_or_else(|_| Err(BrokerError::Timeout(self.config.connect_timeout)));

        let transport = match attempt {
            Ok(transport) => transport,
            Err(e) => {
                warn!(error = %e, "Broker unavailable, continuing without it");
                self.set_state(ConnectionState::Degraded);
                return ConnectionState::Degraded;
            }
        };

        for pattern in SUBSCRIPTIONS {
            if let Err(e) = transport
                .send(Frame::Subscribe {
                    topic: pattern.to_string(),
                })
                .await
            {
                warn!(topic = pattern, error = %e, "Broker subscription failed");
                self.set_state(ConnectionState::Degraded);
                return ConnectionState::Degraded;
            }
        }

        *self.transport.write() = Some(transport);
        self.set_state(ConnectionState::Connected);
        info!("Broker connected");

        tokio::spawn(dispatch_inbound(
            inbound_rx,
            self.messages.clone(),
            Arc::clone(&self.state),
            Arc::clone(&self.transport),
        ));
        ConnectionState::Connected
    }

    pub fn disconnect(&self) {
        self.set_state(ConnectionState::Disconnected);
        if self.transport.write().take().is_some() {
            info!("Broker link closed");
        }
    }

    pub async fn publish_telemetry(&self, telemetry: &PlcTelemetry) -> bool {
        let mut telemetry = telemetry.clone();
        telemetry.timestamp = Utc::now();
        let topic = Topic::PlcTelemetry(telemetry.plc_id.clone());
        self.publish(topic, &telemetry).await
    }

    pub async fn publish_status(&self, plc_id: &str, status: &str, metadata: Option<Value>) -> bool {
        let report = StatusReport {
            status: status.to_string(),
            timestamp: Utc::now(),
            metadata: metadata.unwrap_or_else(|| Value::Object(Default::default())),
        };
        self.publish(Topic::PlcStatus(plc_id.to_string()), &report).await
    }

    /// Publish an alarm object, stamped with the current time.
    pub async fn publish_alarm(&self, plc_id: &str, alarm: Value) -> bool {
        let mut alarm = alarm;
        if let Value::Object(fields) = &mut alarm {
            fields.insert("timestamp".into(), Value::String(Utc::now().to_rfc3339()));
        }
        self.publish(Topic::Alarm(plc_id.to_string()), &alarm).await
    }

    pub async fn send_command(&self, command: &ScadaCommand) -> bool {
        let mut payload = match serde_json::to_value(command) {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, "Unserializable command");
                return false;
            }
        };
        if let Value::Object(fields) = &mut payload {
            fields.insert("timestamp".into(), Value::String(Utc::now().to_rfc3339()));
            fields.insert("sourceId".into(), Value::String(self.config.client_id.clone()));
        }
        let sent = self
            .publish(Topic::Command(command.target_plc.clone()), &payload)
            .await;
        if sent {
            info!(plc = %command.target_plc, command = ?command.command, "Command sent");
        }
        sent
    }

    async fn publish<T: Serialize>(&self, topic: Topic, payload: &T) -> bool {
        let transport = match (self.is_connected(), self.transport.read().clone()) {
            (true, Some(transport)) => transport,
            _ => {
                debug!(topic = %topic, "Broker not connected, dropping publish");
                return false;
            }
        };

        let payload = match serde_json::to_value(payload) {
            Ok(v) => v,
            Err(e) => {
                warn!(topic = %topic, error = %e, "Unserializable broker payload");
                return false;
            }
        };

        match transport
            .send(Frame::Publish {
                topic: topic.to_string(),
                payload,
            })
            .await
        {
            Ok(()) => true,
            Err(e) => {
                warn!(topic = %topic, error = %e, "Broker publish failed");
                self.transport.write().take();
                mark_degraded(&self.state);
                false
            }
        }
    }

    fn set_state(&self, next: ConnectionState) {
        self.state.send_if_modified(|current| {
            if *current == next {
                false
            } else {
                debug!(from = ?*current, to = ?next, "Broker link state change");
                *current = next;
                true
            }
        });
    }
}

fn mark_degraded(state: &watch::Sender<ConnectionState>) {
    state.send_if_modified(|current| {
        if *current == ConnectionState::Connected {
            *current = ConnectionState::Degraded;
            true
        } else {
            false
        }
    });
}

async fn dispatch_inbound(
    mut inbound: mpsc::Receiver<Frame>,
    messages: broadcast::Sender<BrokerMessage>,
    state: Arc<watch::Sender<ConnectionState>>,
    transport: Arc<RwLock<Option<Arc<dyn BrokerTransport>>>>,
) {
    while let Some(frame) = inbound.recv().await {
        let Frame::Publish { topic, payload } = frame else {
            continue;
        };
        match BrokerMessage::decode(&topic, payload) {
            Ok(message) => {
                // No receivers is fine; nobody is listening yet.
                let _ = messages.send(message);
            }
            Err(e) => warn!(topic = %topic, error = %e, "Unhandled broker message"),
        }
    }

    if *state.borrow() == ConnectionState::Connected {
        warn!("Broker connection lost, continuing without it");
        transport.write().take();
        mark_degraded(&state);
    }
}
