use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::fs;
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::{PresetError, PresetResult};

/// Settings key holding saved presets, as an object of filter key to preset list
pub const LAYER_PRESETS_KEY: &str = "layer.presets";

/// Settings key holding the layer ids that already received a default preset
pub const APPLIED_DEFAULTS_KEY: &str = "layer.presets.applied";

/// Key/value persistence for preset state
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Read a value
    async fn get(&self, key: &str) -> PresetResult<Option<Value>>;

    /// Write a value
    async fn set(&self, key: &str, value: Value) -> PresetResult<()>;

    /// Read a value, falling back to `default` when missing
    async fn get_or(&self, key: &str, default: Value) -> PresetResult<Value> {
        Ok(self.get(key).await?.unwrap_or(default))
    }
}

/// In-memory settings backend
#[derive(Debug, Default)]
pub struct MemorySettings {
    values: RwLock<HashMap<String, Value>>,
}

impl MemorySettings {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SettingsStore for MemorySettings {
    async fn get(&self, key: &str) -> PresetResult<Option<Value>> {
        Ok(self.values.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> PresetResult<()> {
        self.values.write().await.insert(key.to_string(), value);
        Ok(())
    }
}

/// Settings persisted as a single JSON object on disk
#[derive(Debug)]
pub struct FileSettings {
    path: PathBuf,
    values: RwLock<Map<String, Value>>,
}

impl FileSettings {
    /// Open settings at `path`, reading existing values if the file exists
    pub async fn open(path: impl AsRef<Path>) -> PresetResult<Self> {
        let path = path.as_ref().to_path_buf();
        let values = if fs::try_exists(&path).await? {
            let json = fs::read_to_string(&path)
                .await
                .map_err(|e| PresetError::settings(format!("Failed to read settings file: {}", e)))?;
            match serde_json::from_str::<Value>(&json)? {
                Value::Object(map) => map,
                other => {
                    return Err(PresetError::settings(format!(
                        "Settings file must hold a JSON object, found {}",
                        other
                    )))
                }
            }
        } else {
            debug!("No settings file at {}, starting empty", path.display());
            Map::new()
        };

        Ok(Self {
            path,
            values: RwLock::new(values),
        })
    }

    async fn save(&self, values: &Map<String, Value>) -> PresetResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await.map_err(|e| {
                    PresetError::settings(format!("Failed to create settings directory: {}", e))
                })?;
            }
        }
        let json = serde_json::to_string_pretty(values)?;
        fs::write(&self.path, json)
            .await
            .map_err(|e| PresetError::settings(format!("Failed to write settings file: {}", e)))
    }
}

#[async_trait]
impl SettingsStore for FileSettings {
    async fn get(&self, key: &str) -> PresetResult<Option<Value>> {
        Ok(self.values.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> PresetResult<()> {
        let mut values = self.values.write().await;
        values.insert(key.to_string(), value);
        self.save(&values).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_memory_settings() {
        let settings = MemorySettings::new();
        assert_eq!(settings.get("a").await.unwrap(), None);
        assert_eq!(settings.get_or("a", json!({})).await.unwrap(), json!({}));

        settings.set("a", json!({"x": true})).await.unwrap();
        assert_eq!(settings.get("a").await.unwrap(), Some(json!({"x": true})));
    }

    #[tokio::test]
    async fn test_file_settings_persist() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");

        let settings = FileSettings::open(&path).await.unwrap();
        settings.set(APPLIED_DEFAULTS_KEY, json!({"l1": true})).await.unwrap();
        assert!(path.exists());

        let reopened = FileSettings::open(&path).await.unwrap();
        assert_eq!(
            reopened.get(APPLIED_DEFAULTS_KEY).await.unwrap(),
            Some(json!({"l1": true}))
        );
    }

    #[tokio::test]
    async fn test_file_settings_rejects_non_object() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "[1, 2]").unwrap();

        let err = FileSettings::open(&path).await.unwrap_err();
        assert!(matches!(err, PresetError::Settings(_)));
    }
}
