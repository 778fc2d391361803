//! Middleware stack for the gateway.
//!
//! Layer order: Request → Cors → Tracing → Metrics → Timeout → BodyLimit → Handler

pub mod cors;
pub mod metrics;
pub mod tracing;

pub use self::cors::create_cors_layer;
pub use self::metrics::{track_requests, GatewayMetrics, MetricsSnapshot};
pub use self::tracing::TracingLayer;
