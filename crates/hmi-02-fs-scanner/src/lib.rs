//! # File System Scanner
//!
//! File-system facing half of the gateway.
//!
//! - [`DirectoryScanner`]: single-level listings under a base directory with
//!   a short TTL cache, file reads, mutations that invalidate the cache up
//!   the ancestor chain, and recursive regex search.
//! - [`RepositoryScanner`]: recursive statistics for the monitored
//!   repository areas.
//!
//! All paths are relative to the configured base and use `/` separators.

pub mod cache;
pub mod entry;
pub mod error;
pub mod paths;
pub mod repository;
pub mod scanner;

pub use cache::{CacheStats, ScanCache, DEFAULT_SCAN_TTL};
pub use error::ScanError;
pub use repository::RepositoryScanner;
pub use scanner::{DirectoryScanner, MAX_READ_BYTES};
