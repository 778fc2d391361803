//! # FileSystem HMI Test Suite
//!
//! Cross-crate flows that no single crate can exercise on its own.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── gateway_flow.rs   # REST writes → registry → push channel
//!     ├── scanner_cache.rs  # TTL cache, ancestor invalidation, search
//!     └── runtime_flow.rs   # Broker ingest, simulators, runtime lifecycle
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p hmi-tests
//!
//! # By flow
//! cargo test -p hmi-tests integration::gateway_flow::
//! cargo test -p hmi-tests integration::scanner_cache::
//! ```

#![allow(dead_code)]

pub mod integration;
