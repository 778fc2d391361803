//! # Dashboard Simulator
//!
//! Keeps the dashboard looking alive. Nothing here models a real process:
//! metrics are bounded random walks, operations advance by random steps, and
//! controller tags follow plain directory statistics.
//!
//! | Task | Period | Effect |
//! |------|--------|--------|
//! | [`MetricsSimulator`] | 2 s | walk gateway metrics, write metric tags, push `METRICS_UPDATE` |
//! | [`OperationQueue`] | 1 s | advance operations, push `OPERATION_UPDATED` |
//! | [`RepositoryMonitor`] | 5 s | scan areas, write controller tags, refresh `.plc` config, publish telemetry |
//!
//! All randomness comes through [`RandomSource`], so a test can replace it
//! with [`SequenceRandomSource`] and get exact values.

pub mod metrics;
pub mod monitor;
pub mod operations;
pub mod random;
pub mod runner;
pub mod walk;

pub use metrics::{MetricWalks, MetricsSimulator};
pub use monitor::RepositoryMonitor;
pub use operations::OperationQueue;
pub use random::{RandomSource, SequenceRandomSource, ThreadRandomSource};
pub use runner::spawn_periodic;
pub use walk::RandomWalk;
