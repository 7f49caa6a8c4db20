use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{PresetError, PresetResult};

/// Identifier of the synthetic record that restores a layer to its defaults
pub const RESTORE_DEFAULT_ID: &str = "__default__";

/// Label of the synthetic restore record
pub const RESTORE_DEFAULT_LABEL: &str = "Restore to Default";

/// A named bundle of layer display options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preset {
    /// Preset identifier
    pub id: String,
    /// Display label
    #[serde(default)]
    pub label: String,
    /// Whether this preset is applied automatically to new layers
    #[serde(default)]
    pub default: bool,
    /// Layer options applied by the preset
    #[serde(default)]
    pub layer_options: Map<String, Value>,
    /// Free-form tags
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// Filter key this preset was saved for
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter_key: Option<String>,
}

impl Preset {
    /// Create a preset with empty options
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            default: false,
            layer_options: Map::new(),
            tags: Vec::new(),
            filter_key: None,
        }
    }

    /// Mark the preset as the default
    pub fn with_default(mut self, default: bool) -> Self {
        self.default = default;
        self
    }

    /// The record appended to non-empty preset lists that resets layer options
    pub fn restore_default() -> Self {
        Self::new(RESTORE_DEFAULT_ID, RESTORE_DEFAULT_LABEL)
    }

    pub fn is_restore_default(&self) -> bool {
        self.id == RESTORE_DEFAULT_ID
    }
}

/// Parse a preset file body. The body must be a JSON array of preset records.
pub fn parse_presets(text: &str) -> PresetResult<Vec<Preset>> {
    serde_json::from_str(text)
        .map_err(|e| PresetError::parse(format!("Invalid preset list: {}", e)))
}

/// First record flagged as default, if any
pub fn find_default(presets: &[Preset]) -> Option<&Preset> {
    presets.iter().find(|p| p.default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_presets() {
        let text = r#"[
            {"id": "a", "label": "A", "layerOptions": {"opacity": 0.5}},
            {"id": "b", "label": "B", "default": true, "tags": ["x"], "extra": 1}
        ]"#;
        let presets = parse_presets(text).unwrap();
        assert_eq!(presets.len(), 2);
        assert_eq!(presets[0].layer_options.get("opacity"), Some(&json!(0.5)));
        assert!(!presets[0].default);
        assert!(presets[1].default);
        assert_eq!(presets[1].tags, vec!["x".to_string()]);
    }

    #[test]
    fn test_parse_rejects_non_array() {
        let err = parse_presets(r#"{"id": "a"}"#).unwrap_err();
        assert!(matches!(err, PresetError::Parse(_)));

        let err = parse_presets("not json").unwrap_err();
        assert!(err.to_string().starts_with("Parse error"));
    }

    #[test]
    fn test_find_default() {
        let presets = vec![
            Preset::new("a", "A"),
            Preset::new("b", "B").with_default(true),
            Preset::new("c", "C").with_default(true),
        ];
        assert_eq!(find_default(&presets).map(|p| p.id.as_str()), Some("b"));
        assert!(find_default(&presets[..1]).is_none());
    }

    #[test]
    fn test_restore_default_record() {
        let preset = Preset::restore_default();
        assert!(preset.is_restore_default());
        assert!(!preset.default);
        assert!(preset.layer_options.is_empty());
    }
}
