use std::path::{Path, PathBuf};
use serde::{Deserialize, Serialize};

use crate::error::{PresetError, PresetResult};
use crate::logging::LogLevel;

/// Configuration for the preset loader
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PresetConfig {
    /// Where persisted settings live
    pub settings_path: PathBuf,
    /// Connect timeout for preset requests, in seconds
    pub connect_timeout: u64,
    /// Total request timeout, in seconds
    pub request_timeout: u64,
    /// Default log level
    pub log_level: LogLevel,
    /// Preset files registered at startup
    pub sources: Vec<SourceSpec>,
    /// Known layers
    pub layers: Vec<LayerSpec>,
}

impl Default for PresetConfig {
    fn default() -> Self {
        Self {
            settings_path: PathBuf::from("layer-presets.settings.json"),
            connect_timeout: 10,
            request_timeout: 30,
            log_level: LogLevel::Info,
            sources: Vec::new(),
            layers: Vec::new(),
        }
    }
}

/// A preset file to register for a preset type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceSpec {
    pub preset_type: String,
    pub url: String,
}

/// A layer known to the registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerSpec {
    pub id: String,
    #[serde(default)]
    pub filter_key: Option<String>,
}

impl PresetConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> PresetResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config = Self::from_toml(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Create config from TOML string
    pub fn from_toml(content: &str) -> PresetResult<Self> {
        toml::from_str(content)
            .map_err(|e| PresetError::Config(format!("Failed to parse config: {}", e)))
    }

    /// Convert config to TOML string
    pub fn to_toml(&self) -> PresetResult<String> {
        toml::to_string(self)
            .map_err(|e| PresetError::Config(format!("Failed to serialize config: {}", e)))
    }

    /// Validate the configuration
    pub fn validate(&self) -> PresetResult<()> {
        if self.connect_timeout == 0 || self.request_timeout == 0 {
            return Err(PresetError::config("Timeouts must be greater than zero"));
        }

        for source in &self.sources {
            if source.preset_type.trim().is_empty() {
                return Err(PresetError::config(format!(
                    "Source {} has an empty preset type",
                    source.url
                )));
            }
            if source.url.trim().is_empty() {
                return Err(PresetError::config(format!(
                    "Source for type {} has an empty url",
                    source.preset_type
                )));
            }
        }

        if let Some(layer) = self.layers.iter().find(|l| l.id.trim().is_empty()) {
            return Err(PresetError::config(format!(
                "Layer with filter key {:?} has an empty id",
                layer.filter_key
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let config = PresetConfig::from_toml(
            r#"
            settings_path = "/tmp/presets.json"
            request_timeout = 5
            log_level = "debug"

            [[sources]]
            preset_type = "roads"
            url = "https://example.com/roads.json"

            [[layers]]
            id = "layer-1"
            filter_key = "roads"
            "#,
        )
        .unwrap();

        assert_eq!(config.settings_path, PathBuf::from("/tmp/presets.json"));
        assert_eq!(config.connect_timeout, 10);
        assert_eq!(config.request_timeout, 5);
        assert_eq!(config.log_level, LogLevel::Debug);
        assert_eq!(config.sources.len(), 1);
        assert_eq!(config.layers[0].filter_key.as_deref(), Some("roads"));
        config.validate().unwrap();
    }

    #[test]
    fn test_validate_rejects_empty_source() {
        let mut config = PresetConfig::default();
        config.sources.push(SourceSpec {
            preset_type: "roads".to_string(),
            url: " ".to_string(),
        });
        assert!(matches!(config.validate(), Err(PresetError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let config = PresetConfig {
            request_timeout: 0,
            ..PresetConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_toml_round_trip() {
        let config = PresetConfig::default();
        let parsed = PresetConfig::from_toml(&config.to_toml().unwrap()).unwrap();
        assert_eq!(parsed.request_timeout, config.request_timeout);
    }
}
