//! HMI-06 API Gateway - REST and WebSocket surface of the dashboard.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                    API GATEWAY (hmi-06)                    │
//! ├────────────────────────────────────────────────────────────┤
//! │   REST /api/*        /hmi/*            WebSocket /ws       │
//! │        │                │                    │             │
//! │  ┌─────┴────────────────┴────────────────────┴──────┐      │
//! │  │  Cors → Tracing → Metrics → Timeout → BodyLimit  │      │
//! │  └─────┬────────────────┬────────────────────┬──────┘      │
//! └────────┼────────────────┼────────────────────┼─────────────┘
//!          ▼                ▼                    ▼
//!   hmi-01 registry   hmi-05 artifacts    shared-bus events
//!   hmi-02 scanner                        hmi-03 simulator
//! ```
//!
//! Lookups that miss answer 404, malformed input 400 and anything else 500,
//! always with a `{message, error}` JSON body.
//!
//! # Usage
//!
//! ```ignore
//! use hmi_06_api_gateway::{ApiGatewayService, AppState, GatewayConfig};
//!
//! let service = ApiGatewayService::new(GatewayConfig::default(), state)?;
//! service.run(shutdown_rx).await?;
//! ```

#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod domain;
pub mod middleware;
pub mod rest;
pub mod router;
pub mod service;
pub mod ws;

// Re-exports for public API
pub use domain::config::GatewayConfig;
pub use domain::error::{ApiError, ApiResult, GatewayError};
pub use middleware::GatewayMetrics;
pub use router::{build_router, AppState};
pub use service::ApiGatewayService;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
