//! Insert payload validation.
//!
//! Paths must be non-empty, must not start or end with `/` and must not
//! contain empty segments. Parent existence is not checked here; the
//! registry only warns about dangling parents.

use shared_types::{
    NewPerspectiveView, NewSystemConfig, NewTagAlarm, NewUnsNode, NewUnsTag, PATH_SEPARATOR,
};

use crate::error::RegistryError;

/// Check the shape of a hierarchical path.
pub fn validate_path(field: &str, path: &str) -> Result<(), RegistryError> {
    if path.trim().is_empty() {
        return Err(RegistryError::validation(format!("{field} is required")));
    }
    if path.split(PATH_SEPARATOR).any(|segment| segment.is_empty()) {
        return Err(RegistryError::validation(format!(
            "{field} '{path}' contains an empty segment"
        )));
    }
    Ok(())
}

fn require(field: &str, value: &str) -> Result<(), RegistryError> {
    if value.trim().is_empty() {
        return Err(RegistryError::validation(format!("{field} is required")));
    }
    Ok(())
}

pub fn validate_node(node: &NewUnsNode) -> Result<(), RegistryError> {
    validate_path("nodeId", &node.node_id)?;
    require("name", &node.name)?;

    if let Some(parent) = node.parent_node_id.as_deref() {
        validate_path("parentNodeId", parent)?;
        let expected = format!("{parent}{PATH_SEPARATOR}{}", node.name);
        if node.node_id != expected {
            return Err(RegistryError::validation(format!(
                "nodeId '{}' must equal '{expected}'",
                node.node_id
            )));
        }
    }
    Ok(())
}

pub fn validate_tag(tag: &NewUnsTag) -> Result<(), RegistryError> {
    validate_path("tagPath", &tag.tag_path)?;
    validate_path("nodeId", &tag.node_id)?;
    require("tagName", &tag.tag_name)
}

pub fn validate_alarm(alarm: &NewTagAlarm) -> Result<(), RegistryError> {
    validate_path("alarmPath", &alarm.alarm_path)?;
    validate_path("tagPath", &alarm.tag_path)
}

pub fn validate_view(view: &NewPerspectiveView) -> Result<(), RegistryError> {
    validate_path("viewPath", &view.view_path)?;
    require("viewName", &view.view_name)?;
    if let Some(parent) = view.parent_path.as_deref() {
        validate_path("parentPath", parent)?;
    }
    Ok(())
}

pub fn validate_config(config: &NewSystemConfig) -> Result<(), RegistryError> {
    validate_path("configPath", &config.config_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::{NodeType, Quality, TagDataType};

    fn node(path: &str, parent: Option<&str>, name: &str) -> NewUnsNode {
        NewUnsNode {
            node_id: path.into(),
            parent_node_id: parent.map(String::from),
            name: name.into(),
            node_type: NodeType::Area,
            description: None,
            metadata: serde_json::json!({}),
        }
    }

    #[test]
    fn test_path_shape() {
        assert!(validate_path("p", "Enterprise/Site1").is_ok());
        assert!(validate_path("p", "").is_err());
        assert!(validate_path("p", "   ").is_err());
        assert!(validate_path("p", "/Enterprise").is_err());
        assert!(validate_path("p", "Enterprise/").is_err());
        assert!(validate_path("p", "A//B").is_err());
    }

    #[test]
    fn test_node_must_sit_under_parent() {
        assert!(validate_node(&node("E/S", Some("E"), "S")).is_ok());
        assert!(validate_node(&node("E/X", Some("E"), "S")).is_err());
        assert!(validate_node(&node("E", None, "E")).is_ok());
        assert!(validate_node(&node("E", None, "")).is_err());
    }

    #[test]
    fn test_tag_requires_owner() {
        let tag = NewUnsTag {
            tag_path: "E/S/Status".into(),
            node_id: String::new(),
            tag_name: "Status".into(),
            data_type: TagDataType::String,
            value: String::new(),
            quality: Quality::Good,
            historize: false,
            metadata: serde_json::json!({}),
        };
        let err = validate_tag(&tag).unwrap_err();
        assert!(matches!(err, RegistryError::Validation(msg) if msg.contains("nodeId")));
    }
}
