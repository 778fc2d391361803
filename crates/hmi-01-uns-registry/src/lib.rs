//! # UNS Path Registry
//!
//! In-memory Unified Namespace: five independent tables keyed by
//! slash-delimited paths.
//!
//! | Table | Key | Queries |
//! |-------|-----|---------|
//! | nodes | `nodeId` | exact lookup, direct children |
//! | tags | `tagPath` | exact lookup, by owning node |
//! | alarms | `alarmPath` | exact lookup, active-and-unacknowledged |
//! | views | `viewPath` | exact lookup, by parent path |
//! | system config | `configPath` | exact lookup, read-only guard on write |
//!
//! ## Write semantics
//!
//! `create_*` on an existing path is an upsert: the stored id and creation
//! timestamp are kept, every other field is replaced. Tag writes through
//! [`PathRegistry::update_tag_value`] only touch value, quality and
//! timestamp.
//!
//! Listings come back ordered by path, so a parent always precedes its
//! descendants.
//!
//! ## Module Structure
//!
//! ```text
//! domain/validation.rs - insert payload checks
//! ports/outbound.rs    - TimeSource
//! service.rs           - PathRegistry
//! seed.rs              - startup fixtures
//! ```

pub mod domain;
pub mod error;
pub mod ports;
pub mod seed;
pub mod service;

pub use error::RegistryError;
pub use ports::outbound::{SystemTimeSource, TimeSource};
pub use seed::seed_registry;
pub use service::PathRegistry;

/// Default number of samples requested from tag history.
pub const DEFAULT_HISTORY_LIMIT: usize = 100;
