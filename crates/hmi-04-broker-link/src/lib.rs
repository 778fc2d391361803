//! # Broker Link
//!
//! Optional connection to an industrial telemetry broker. The gateway runs
//! the same with or without it: any connection failure or timeout leaves the
//! link in [`ConnectionState::Degraded`] and every publish becomes a no-op.
//!
//! ## State machine
//!
//! ```text
//! Disconnected ──connect()──→ Connecting ──ok──→ Connected
//!                                  │                 │
//!                          error / timeout      peer closed / send error
//!                                  ↓                 ↓
//!                              Degraded ←────────────┘
//! ```
//!
//! State changes are observable through [`BrokerLink::watch_state`].
//!
//! ## Topics
//!
//! | Topic | Direction | Payload |
//! |-------|-----------|---------|
//! | `industrial/plc/<id>/telemetry` | both | [`PlcTelemetry`] |
//! | `industrial/plc/<id>/status` | both | [`StatusReport`] |
//! | `industrial/alarms/<id>` | both | free-form alarm object |
//! | `industrial/events/<source>` | inbound | free-form event object |
//! | `industrial/commands/<plc>` | outbound | [`ScadaCommand`] |
//!
//! The shipped transport speaks newline-delimited JSON over TCP; see
//! [`adapters::tcp`].

pub mod adapters;
pub mod config;
pub mod domain;
pub mod error;
pub mod ingest;
pub mod ports;
pub mod service;

pub use adapters::tcp::TcpConnector;
pub use config::BrokerConfig;
pub use domain::messages::{
    determine_plc_status, BrokerMessage, CommandKind, PlcTelemetry, ScadaCommand, StatusReport,
};
pub use domain::topic::{Topic, SUBSCRIPTIONS};
pub use error::BrokerError;
pub use ingest::{apply_message, Ingested};
pub use ports::{BrokerConnector, BrokerTransport, Frame};
pub use service::{BrokerLink, ConnectionState};
