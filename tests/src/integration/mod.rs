//! Cross-crate integration flows.

pub mod gateway_flow;
pub mod runtime_flow;
pub mod scanner_cache;
