//! Newline-delimited JSON frames over TCP.
//!
//! Each line is one [`Frame`]. Lines that fail to decode are logged and
//! skipped; the connection stays up.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::BrokerError;
use crate::ports::{BrokerConnector, BrokerTransport, Frame};

#[derive(Debug, Clone)]
pub struct TcpConnector {
    addr: String,
}

impl TcpConnector {
    pub fn new(addr: impl Into<String>) -> Self {
        Self { addr: addr.into() }
    }
}

#[async_trait]
impl BrokerConnector for TcpConnector {
    async fn connect(
        &self,
        inbound: mpsc::Sender<Frame>,
    ) -> Result<Arc<dyn BrokerTransport>, BrokerError> {
        let stream = TcpStream::connect(&self.addr)
            .await
            .map_err(|source| BrokerError::Connect {
                addr: self.addr.clone(),
                source,
            })?;
        stream.set_nodelay(true)?;
        let (read, write) = stream.into_split();

        let reader = tokio::spawn(read_frames(read, inbound));
        Ok(Arc::new(TcpTransport {
            writer: Mutex::new(write),
            reader,
        }))
    }
}

async fn read_frames(read: OwnedReadHalf, inbound: mpsc::Sender<Frame>) {
    let mut lines = BufReader::new(read).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                if line.trim().is_empty() {
                    continue;
                }
                match serde_json::from_str::<Frame>(&line) {
                    Ok(frame) => {
                        if inbound.send(frame).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => warn!(error = %e, "Dropping undecodable broker frame"),
                }
            }
            Ok(None) => {
                debug!("Broker closed the connection");
                break;
            }
            Err(e) => {
                warn!(error = %e, "Broker read failed");
                break;
            }
        }
    }
}

struct TcpTransport {
    writer: Mutex<OwnedWriteHalf>,
    reader: JoinHandle<()>,
}

#[async_trait]
impl BrokerTransport for TcpTransport {
    async fn send(&self, frame: Frame) -> Result<(), BrokerError> {
        let mut line = serde_json::to_vec(&frame)?;
        line.push(b'\n');
        let mut writer = self.writer.lock().await;
        writer.write_all(&line).await?;
        writer.flush().await?;
        Ok(())
    }
}

impl Drop for TcpTransport {
    fn drop(&mut self) {
        self.reader.abort();
    }
}
