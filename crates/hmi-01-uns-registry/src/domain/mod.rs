//! Domain rules applied before anything is written to the registry.

pub mod validation;

pub use validation::{
    validate_alarm, validate_config, validate_node, validate_path, validate_tag, validate_view,
};
