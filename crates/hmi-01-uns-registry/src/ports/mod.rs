//! Ports for the path registry.

pub mod outbound;
