//! # Publishing
//!
//! Producers hold an `Arc<dyn EventPublisher>`; the gateway additionally
//! needs the concrete [`InMemoryEventBus`] to hand out subscriptions.

use crate::events::{EventFilter, HmiEvent};
use crate::subscriber::Subscription;
use crate::DEFAULT_CHANNEL_CAPACITY;
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::broadcast;
use tracing::{debug, trace};

/// Sink for dashboard events.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Fan `event` out to every live subscription. Returns how many
    /// receivers were handed the event before filtering.
    async fn publish(&self, event: HmiEvent) -> usize;

    /// Events accepted since construction, delivered or not.
    fn events_published(&self) -> u64;
}

/// Process-local bus over a `tokio::sync::broadcast` channel.
pub struct InMemoryEventBus {
    sender: broadcast::Sender<HmiEvent>,
    events_published: AtomicU64,
    capacity: usize,
}

impl InMemoryEventBus {
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Bus buffering `capacity` events per subscriber (minimum 1).
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender,
            events_published: AtomicU64::new(0),
            capacity,
        }
    }

    /// Open a subscription. Only events published after this call are seen.
    #[must_use]
    pub fn subscribe(&self, filter: EventFilter) -> Subscription {
        debug!(topics = ?filter.topics, "Dashboard subscription opened");
        Subscription::new(self.sender.subscribe(), filter)
    }

    /// Live subscriptions, including ones that filter everything out.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for InMemoryEventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventPublisher for InMemoryEventBus {
    async fn publish(&self, event: HmiEvent) -> usize {
        let kind = event.kind();
        self.events_published.fetch_add(1, Ordering::Relaxed);

        match self.sender.send(event) {
            Ok(receivers) => {
                trace!(event = kind, receivers, "Event published");
                receivers
            }
            // Nobody is connected; dashboards pick up state on their next snapshot.
            Err(_) => {
                trace!(event = kind, "Event dropped (no receivers)");
                0
            }
        }
    }

    fn events_published(&self) -> u64 {
        self.events_published.load(Ordering::Relaxed)
    }
}
