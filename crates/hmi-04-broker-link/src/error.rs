//! Error types for the broker link

use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BrokerError {
    #[error("Invalid broker URL: {0}")]
    InvalidUrl(String),

    #[error("Connection to {addr} failed: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Connection timed out after {0:?}")]
    Timeout(Duration),

    #[error("Broker link is not connected")]
    NotConnected,

    #[error("Unrecognized topic: {0}")]
    InvalidTopic(String),

    #[error("Malformed payload on {topic}: {source}")]
    Payload {
        topic: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Transport error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
