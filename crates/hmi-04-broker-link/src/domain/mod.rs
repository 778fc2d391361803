//! Broker domain: topics and payloads.

pub mod messages;
pub mod topic;
