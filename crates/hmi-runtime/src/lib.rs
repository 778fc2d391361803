//! # FileSystem HMI Runtime
//!
//! Wires the subsystems into one process.
//!
//! ```text
//!   hmi-03 simulator ──METRICS/OPERATION──┐
//!   hmi-03 monitor ──tags──→ hmi-01 ──────┤
//!   hmi-04 broker ──ingest──→ hmi-01 ─────┼──→ shared-bus ──→ hmi-06 /ws
//!   hmi-06 REST writes ───────────────────┘
//! ```
//!
//! ## Modules
//!
//! - `config` - `RuntimeConfig` from `HMI_*` environment variables
//! - `runtime` - subsystem construction, periodic tasks, shutdown
//! - `ingest` - broker messages applied to the registry

pub mod config;
pub mod ingest;
pub mod runtime;

pub use config::{RuntimeConfig, RuntimeConfigError};
pub use runtime::HmiRuntime;
