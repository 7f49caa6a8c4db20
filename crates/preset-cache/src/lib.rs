//! Single-flight, merge-on-reload preset cache for map layers.
//!
//! Preset files are fetched at most once per url. Lists registered for the same
//! preset type are merged with the newest registration first, and layers can
//! have their default preset applied exactly once.

pub mod cache;
pub mod fetch;

pub use cache::{handle_load_error, PresetCache, PresetCacheBuilder, PresetFuture, PresetList};
pub use fetch::UrlFetcher;

use std::sync::Arc;

use preset_core::error::PresetResult;
use preset_core::{FileSettings, LayerInfo, MemoryLayerRegistry, PresetConfig};

/// Build a cache from configuration: file-backed settings, a url fetcher with
/// the configured timeouts and a registry holding the configured layers.
///
/// Configured sources are registered before returning.
pub async fn create_cache(config: &PresetConfig) -> PresetResult<PresetCache> {
    config.validate()?;

    let fetcher = UrlFetcher::new(config.connect_timeout, config.request_timeout)?;
    let settings = FileSettings::open(&config.settings_path).await?;

    let layers = MemoryLayerRegistry::new();
    for layer in &config.layers {
        layers.insert(Arc::new(LayerInfo::new(layer.id.clone(), layer.filter_key.clone())));
    }

    let cache = PresetCache::builder()
        .fetcher(Arc::new(fetcher))
        .settings(Arc::new(settings))
        .layers(Arc::new(layers))
        .build()?;

    for source in &config.sources {
        cache.register_preset(&source.preset_type, &source.url).await;
    }

    Ok(cache)
}
