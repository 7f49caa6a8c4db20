//! Core types and collaborator traits for layer preset loading.
//!
//! The cache itself lives in `preset-cache`; this crate holds everything the
//! cache talks to: preset records, the error type, configuration, settings
//! persistence and the layer/feature-action/command seams.

use async_trait::async_trait;

pub mod config;
pub mod error;
pub mod layer;
pub mod logging;
pub mod preset;
pub mod settings;

// Re-export commonly used types
pub use crate::config::{LayerSpec, PresetConfig, SourceSpec};
pub use crate::error::{PresetError, PresetResult};
pub use crate::layer::{Filterable, Layer, LayerInfo, LayerRegistry, MemoryLayerRegistry};
pub use crate::logging::{init_logging, LogLevel};
pub use crate::preset::{find_default, parse_presets, Preset};
pub use crate::settings::{FileSettings, MemorySettings, SettingsStore};

/// Retrieves the raw body of a preset file
#[async_trait]
pub trait PresetFetcher: Send + Sync {
    /// Fetch `url` and return its text
    async fn fetch(&self, url: &str) -> PresetResult<String>;
}

/// Loads the default feature actions of a layer
#[async_trait]
pub trait FeatureActionLoader: Send + Sync {
    /// Completes once defaults for `layer_id` are loaded. Callers await this
    /// whether it succeeds or not.
    async fn load_defaults(&self, layer_id: &str) -> PresetResult<()>;
}

/// Applies a preset's layer options to a layer
pub trait CommandExecutor: Send + Sync {
    fn apply(&self, layer_id: &str, preset: &Preset);
}

/// Feature-action loader for applications without feature actions
#[derive(Debug, Default, Clone, Copy)]
pub struct NoFeatureActions;

#[async_trait]
impl FeatureActionLoader for NoFeatureActions {
    async fn load_defaults(&self, _layer_id: &str) -> PresetResult<()> {
        Ok(())
    }
}

/// Command executor that only records applied presets in the log
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingExecutor;

impl CommandExecutor for LoggingExecutor {
    fn apply(&self, layer_id: &str, preset: &Preset) {
        tracing::info!(
            layer = %layer_id,
            preset = %preset.id,
            options = preset.layer_options.len(),
            "Applying preset"
        );
    }
}
