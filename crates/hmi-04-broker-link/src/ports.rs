//! Transport port.
//!
//! The link only needs to push frames out and receive frames in; how they are
//! carried is up to the adapter.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::error::BrokerError;

/// One unit on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum Frame {
    Publish { topic: String, payload: Value },
    Subscribe { topic: String },
}

/// An established connection.
#[async_trait]
pub trait BrokerTransport: Send + Sync {
    async fn send(&self, frame: Frame) -> Result<(), BrokerError>;
}

/// Opens connections. Inbound publish frames are delivered on `inbound`;
/// the sender is dropped when the peer goes away.
#[async_trait]
pub trait BrokerConnector: Send + Sync {
    async fn connect(
        &self,
        inbound: mpsc::Sender<Frame>,
    ) -> Result<Arc<dyn BrokerTransport>, BrokerError>;
}
