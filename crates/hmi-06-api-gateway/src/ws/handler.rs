//! WebSocket push channel.
//!
//! Each connection receives `INITIAL_DATA` on connect, then every event
//! published on the bus. Client commands are `{type, data}` envelopes;
//! replies to `GET_*` commands go to the requester only, acknowledgements
//! and new operations are broadcast through the bus.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use shared_bus::{ClientCommand, EventFilter, EventPublisher, HmiEvent, InitialSnapshot};
use shared_types::directory_summaries;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, error, info, warn};

use crate::router::AppState;

static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// `GET /ws` upgrade handler
pub async fn ws_upgrade(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    let max_message_size = state.websocket.max_message_size;
    ws.max_message_size(max_message_size)
        .on_upgrade(move |socket| PushConnection::new(state).handle(socket))
}

/// Full state sent to a client right after it connects.
pub fn initial_snapshot(state: &AppState) -> HmiEvent {
    HmiEvent::InitialData(InitialSnapshot {
        directories: directory_summaries(&state.registry.all_nodes()),
        alarms: state.registry.active_alarms(),
        metrics: state.metrics.snapshot(),
        operations: state.operations.list(),
    })
}

/// Execute one client command.
///
/// Returns the reply addressed to the requester, if any. Malformed or
/// failing commands are logged and produce no reply.
pub async fn handle_command(state: &AppState, text: &str) -> Option<HmiEvent> {
    let command: ClientCommand = match serde_json::from_str(text) {
        Ok(command) => command,
        Err(e) => {
            warn!(error = %e, "Ignoring malformed push-channel command");
            return None;
        }
    };
    state.gateway_metrics.record_ws_command();

    match command {
        ClientCommand::GetDirectories => Some(HmiEvent::DirectoriesUpdate(directory_summaries(
            &state.registry.all_nodes(),
        ))),
        ClientCommand::GetFiles { path } => match state.scanner.scan(&path).await {
            Ok(structure) => Some(HmiEvent::FilesUpdate(structure)),
            Err(e) => {
                warn!(path = %path, error = %e, "GET_FILES scan failed");
                None
            }
        },
        ClientCommand::AcknowledgeAlarm { alarm_path } => {
            match state.registry.acknowledge_alarm(&alarm_path) {
                Some(alarm) => {
                    info!(alarm = %alarm.alarm_path, "Alarm acknowledged over push channel");
                    state.bus.publish(HmiEvent::AlarmAcknowledged(alarm)).await;
                }
                None => warn!(alarm = %alarm_path, "Acknowledge for unknown alarm"),
            }
            None
        }
        ClientCommand::CreateOperation(request) => {
            let operation = state.operations.create(request).await;
            debug!(operation = %operation.id, "Operation created over push channel");
            None
        }
    }
}

/// One connected push-channel client
pub struct PushConnection {
    state: AppState,
    connection_id: u64,
}

impl PushConnection {
    pub fn new(state: AppState) -> Self {
        Self {
            state,
            connection_id: NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed),
        }
    }

    pub fn connection_id(&self) -> u64 {
        self.connection_id
    }

    /// Drive the connection until the client leaves or a send fails
    pub async fn handle(self, mut socket: WebSocket) {
        let metrics = self.state.gateway_metrics.clone();
        metrics.record_ws_connect();
        let mut subscription = self.state.bus.subscribe(EventFilter::all());
        info!(connection_id = self.connection_id, "Push client connected");

        if self.send(&mut socket, &initial_snapshot(&self.state)).await {
            loop {
                tokio::select! {
                    incoming = socket.recv() => {
                        let text = match incoming {
                            Some(Ok(Message::Text(text))) => text,
                            Some(Ok(Message::Binary(data))) => match String::from_utf8(data) {
                                Ok(text) => text,
                                Err(_) => {
                                    warn!(connection_id = self.connection_id, "Ignoring non UTF-8 frame");
                                    continue;
                                }
                            },
                            Some(Ok(Message::Close(_))) | None => break,
                            // Ping/pong are answered by the socket itself
                            Some(Ok(_)) => continue,
                            Some(Err(e)) => {
                                debug!(connection_id = self.connection_id, error = %e, "Push socket error");
                                break;
                            }
                        };

                        if let Some(reply) = handle_command(&self.state, &text).await {
                            if !self.send(&mut socket, &reply).await {
                                break;
                            }
                        }
                    }
                    event = subscription.recv() => {
                        let Some(event) = event else { break };
                        if !self.send(&mut socket, &event).await {
                            break;
                        }
                    }
                }
            }
        }

        metrics.record_ws_disconnect();
        info!(connection_id = self.connection_id, "Push client disconnected");
    }

    /// Serialize and send one event. Returns `false` when the socket is gone.
    async fn send(&self, socket: &mut WebSocket, event: &HmiEvent) -> bool {
        let text = match serde_json::to_string(event) {
            Ok(text) => text,
            Err(e) => {
                error!(kind = event.kind(), error = %e, "Failed to encode push event");
                return true;
            }
        };

        match socket.send(Message::Text(text)).await {
            Ok(()) => {
                self.state.gateway_metrics.record_ws_message();
                true
            }
            Err(e) => {
                debug!(connection_id = self.connection_id, error = %e, "Push send failed");
                false
            }
        }
    }
}
