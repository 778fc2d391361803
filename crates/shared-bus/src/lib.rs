//! # Shared Bus - Dashboard Event Bus
//!
//! Carries push-channel events from the producers (simulator, registry
//! writes, broker ingest) to every connected dashboard client.
//!
//! ```text
//! ┌──────────────┐                    ┌──────────────┐
//! │  Simulator   │                    │  WebSocket   │
//! │  REST writes │    publish()       │  clients     │
//! │              │ ──────┐            │              │
//! └──────────────┘       │            └──────────────┘
//!                        ▼                    ↑
//!                  ┌──────────────┐          │
//!                  │  Event Bus   │          │
//!                  │  (broadcast) │ ─────────┘
//!                  └──────────────┘  subscribe()
//! ```
//!
//! Every event serializes to the `{type, data}` envelope expected by the
//! dashboard. Slow subscribers skip lagged events rather than blocking
//! producers.

pub mod events;
pub mod publisher;
pub mod subscriber;

pub use events::{ClientCommand, EventFilter, EventTopic, HmiEvent, InitialSnapshot};
pub use publisher::{EventPublisher, InMemoryEventBus};
pub use subscriber::{Subscription, SubscriptionError};

/// Events buffered per subscriber before the slowest one starts lagging.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 256;
