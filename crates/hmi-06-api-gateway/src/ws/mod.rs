//! Push channel.

pub mod handler;

pub use handler::{handle_command, initial_snapshot, ws_upgrade, PushConnection};
