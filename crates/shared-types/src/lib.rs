//! # Shared Types Crate
//!
//! Domain entities exchanged between the registry, the scanner, the simulator
//! and the gateway. Every type serializes to the camelCase JSON shape the
//! dashboard client consumes.
//!
//! ## Clusters
//!
//! - **Namespace** (`uns`): `UnsNode`, `UnsTag`, `TagAlarm`, `PerspectiveView`,
//!   `SystemConfigEntry`
//! - **File system** (`filesystem`): `FilePathItem`, `DirectoryStructure`,
//!   `DirectoryStats`
//! - **Simulation** (`operations`): `FileOperation`, `SystemMetrics`
//! - **Controllers** (`plc`): `RepositoryArea`, `PlcStatus`, `PlcSystemSnapshot`

pub mod filesystem;
pub mod operations;
pub mod plc;
pub mod uns;

pub use filesystem::*;
pub use operations::*;
pub use plc::*;
pub use uns::*;

/// Separator used by every hierarchical path in the namespace.
pub const PATH_SEPARATOR: char = '/';

/// Returns the parent of a slash-delimited path, or `None` for a root segment.
///
/// ```
/// use shared_types::parent_path;
/// assert_eq!(parent_path("Enterprise/Site1/Area"), Some("Enterprise/Site1"));
/// assert_eq!(parent_path("Enterprise"), None);
/// ```
#[must_use]
pub fn parent_path(path: &str) -> Option<&str> {
    path.rfind(PATH_SEPARATOR).map(|idx| &path[..idx])
}

/// Returns the last segment of a slash-delimited path.
#[must_use]
pub fn leaf_name(path: &str) -> &str {
    path.rsplit(PATH_SEPARATOR).next().unwrap_or(path)
}
