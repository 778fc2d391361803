//! Broker link configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::BrokerError;

/// Connect timeout applied when none is configured.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrokerConfig {
    /// Whether to attempt a connection at all.
    pub enabled: bool,
    /// `mqtt://host:port`, `tcp://host:port` or bare `host:port`.
    pub url: String,
    pub client_id: String,
    #[serde(with = "millis")]
    pub connect_timeout: Duration,
    /// Capacity of the inbound message fan-out.
    pub inbound_capacity: usize,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            url: "mqtt://localhost:1883".to_string(),
            client_id: "scada_master".to_string(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            inbound_capacity: 256,
        }
    }
}

impl BrokerConfig {
    /// `host:port` extracted from [`Self::url`].
    pub fn socket_addr(&self) -> Result<String, BrokerError> {
        let rest = match self.url.split_once("://") {
            Some(("mqtt" | "tcp", rest)) => rest,
            Some(_) => return Err(BrokerError::InvalidUrl(self.url.clone())),
            None => self.url.as_str(),
        };
        let addr = rest.trim_end_matches('/');
        match addr.rsplit_once(':') {
            Some((host, port)) if !host.is_empty() && port.parse::<u16>().is_ok() => {
                Ok(addr.to_string())
            }
            _ => Err(BrokerError::InvalidUrl(self.url.clone())),
        }
    }

    pub fn validate(&self) -> Result<(), BrokerError> {
        if self.enabled {
            self.socket_addr()?;
        }
        if self.connect_timeout.is_zero() {
            return Err(BrokerError::InvalidUrl(
                "connect_timeout must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}

mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}
