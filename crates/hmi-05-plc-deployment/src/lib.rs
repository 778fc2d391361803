//! # PLC Deployment Artifacts
//!
//! Writes a virtual controller's files into every monitored repository area
//! and keeps its status block current.
//!
//! ```text
//! <area>/
//! ├── .plc/
//! │   ├── plc-config.json    identity, scan rate, tags.system
//! │   ├── ladder-logic.txt   rung listing
//! │   ├── io-mapping.json    I/O points, registers, timers
//! │   ├── watchdog.log       appended on every status update
//! │   └── scan-cycle.log
//! └── .hmi/
//!     ├── perspective-view.json
//!     └── index.html         polls plc-config.json via the gateway
//! ```
//!
//! The artifacts are decorative. Nothing reads them back except the
//! gateway, which serves three of them verbatim.

pub mod deployer;
pub mod error;
pub mod templates;

pub use deployer::{Artifact, DeploymentReport, PlcDeployer};
pub use error::DeploymentError;
pub use templates::PlcProfile;

/// Controller directory inside an area.
pub const PLC_DIR: &str = ".plc";
/// Operator screen directory inside an area.
pub const HMI_DIR: &str = ".hmi";
