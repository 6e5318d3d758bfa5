//! Camera component configuration.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Value of a convertible configuration field.
///
/// Only [`PropValue::Symbol`] is looked up in the conversion table; native
/// codes and booleans are forwarded as given.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropValue {
    Enabled(bool),
    Code(i64),
    Symbol(String),
}

impl PropValue {
    /// Shorthand for a symbolic value.
    pub fn symbol(name: impl Into<String>) -> Self {
        PropValue::Symbol(name.into())
    }

    fn to_value(&self) -> Value {
        match self {
            PropValue::Enabled(flag) => Value::Bool(*flag),
            PropValue::Code(code) => Value::from(*code),
            PropValue::Symbol(name) => Value::String(name.clone()),
        }
    }
}

/// Configuration of a camera component instance.
///
/// Unknown keys are collected into `extra` and forwarded untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CameraConfig {
    /// Capture-facing selection.
    #[serde(rename = "type")]
    pub facing: PropValue,
    /// Flash behavior.
    pub flash_mode: PropValue,
    /// Focus behavior.
    pub auto_focus: PropValue,
    /// Zoom factor, 0.0 to 1.0.
    pub zoom: f64,
    /// Aspect ratio, e.g. `"4:3"`. Dropped on platforms without ratio selection.
    pub ratio: String,
    /// Manual focus depth, 0.0 to 1.0.
    pub focus_depth: f64,
    /// Title of the permission dialog.
    pub permission_dialog_title: String,
    /// Body of the permission dialog.
    pub permission_dialog_message: String,
    /// Additional props passed straight through to the surface.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            facing: PropValue::symbol("back"),
            flash_mode: PropValue::symbol("off"),
            auto_focus: PropValue::symbol("on"),
            zoom: 0.0,
            ratio: "4:3".to_string(),
            focus_depth: 0.0,
            permission_dialog_title: String::new(),
            permission_dialog_message: String::new(),
            extra: Map::new(),
        }
    }
}

impl CameraConfig {
    /// Validates the numeric ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.zoom) {
            return Err(ConfigError::InvalidZoom(self.zoom));
        }
        if !(0.0..=1.0).contains(&self.focus_depth) {
            return Err(ConfigError::InvalidFocusDepth(self.focus_depth));
        }
        Ok(())
    }

    /// Builds the prop mapping handed to the translator.
    ///
    /// The permission dialog strings are consumed by the permission gate
    /// and are not part of the surface props.
    pub fn to_props(&self) -> Map<String, Value> {
        let mut props = self.extra.clone();
        props.insert("type".into(), self.facing.to_value());
        props.insert("flashMode".into(), self.flash_mode.to_value());
        props.insert("autoFocus".into(), self.auto_focus.to_value());
        props.insert("zoom".into(), json!(self.zoom));
        props.insert("ratio".into(), Value::String(self.ratio.clone()));
        props.insert("focusDepth".into(), json!(self.focus_depth));
        props
    }
}

/// Configuration loading and validation errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid zoom {0} (must be 0.0-1.0)")]
    InvalidZoom(f64),
    #[error("invalid focus depth {0} (must be 0.0-1.0)")]
    InvalidFocusDepth(f64),
    #[error("failed to read config file: {0}")]
    FileReadError(String),
    #[error("failed to parse config file: {0}")]
    ParseError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_valid() {
        let config = CameraConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.ratio, "4:3");
        assert_eq!(config.facing, PropValue::symbol("back"));
    }

    #[test]
    fn test_zoom_out_of_range_invalid() {
        let config = CameraConfig {
            zoom: 1.5,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::InvalidZoom(_))));
    }

    #[test]
    fn test_mixed_value_types_deserialize() {
        let config: CameraConfig = serde_json::from_str(
            r#"{"type": 1, "flashMode": "torch", "autoFocus": true, "testID": "cam"}"#,
        )
        .unwrap();
        assert_eq!(config.facing, PropValue::Code(1));
        assert_eq!(config.flash_mode, PropValue::symbol("torch"));
        assert_eq!(config.auto_focus, PropValue::Enabled(true));
        assert_eq!(config.extra.get("testID"), Some(&json!("cam")));
        assert_eq!(config.zoom, 0.0);
    }

    #[test]
    fn test_props_exclude_dialog_strings() {
        let config = CameraConfig {
            permission_dialog_title: "Camera".into(),
            ..Default::default()
        };
        let props = config.to_props();
        assert!(props.get("permissionDialogTitle").is_none());
        assert_eq!(props.get("flashMode"), Some(&json!("off")));
        assert_eq!(props.get("ratio"), Some(&json!("4:3")));
    }
}
