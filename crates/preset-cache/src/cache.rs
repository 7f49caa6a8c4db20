use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt, Shared};
use serde_json::{Map, Value};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, error, info, warn};

use preset_core::error::{PresetError, PresetResult};
use preset_core::settings::{APPLIED_DEFAULTS_KEY, LAYER_PRESETS_KEY};
use preset_core::{
    find_default, parse_presets, CommandExecutor, FeatureActionLoader, LayerRegistry,
    LoggingExecutor, MemoryLayerRegistry, MemorySettings, NoFeatureActions, Preset,
    PresetFetcher, SettingsStore,
};

/// Resolved preset list shared by every caller awaiting the same key
pub type PresetList = Arc<Vec<Preset>>;

/// Shared, single-flight future for one cache key
pub type PresetFuture = Shared<BoxFuture<'static, PresetList>>;

/// Log a preset load failure and return the normalized message.
///
/// Accepts anything printable: plain strings, `PresetError`s or foreign errors.
pub fn handle_load_error(reason: impl fmt::Display) -> String {
    let message = reason.to_string();
    let message = if message.trim().is_empty() {
        "Unknown error while loading presets".to_string()
    } else {
        message
    };
    error!("Failed to load presets: {}", message);
    message
}

/// Builder for [`PresetCache`]
pub struct PresetCacheBuilder {
    fetcher: Option<Arc<dyn PresetFetcher>>,
    layers: Option<Arc<dyn LayerRegistry>>,
    settings: Option<Arc<dyn SettingsStore>>,
    feature_actions: Option<Arc<dyn FeatureActionLoader>>,
    executor: Option<Arc<dyn CommandExecutor>>,
}

impl PresetCacheBuilder {
    /// Create new cache builder
    pub fn new() -> Self {
        Self {
            fetcher: None,
            layers: None,
            settings: None,
            feature_actions: None,
            executor: None,
        }
    }

    /// Set the preset file fetcher (required)
    pub fn fetcher(mut self, fetcher: Arc<dyn PresetFetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    /// Set the layer registry used to resolve filter keys
    pub fn layers(mut self, layers: Arc<dyn LayerRegistry>) -> Self {
        self.layers = Some(layers);
        self
    }

    /// Set the settings store for saved presets and applied defaults
    pub fn settings(mut self, settings: Arc<dyn SettingsStore>) -> Self {
        self.settings = Some(settings);
        self
    }

    /// Set the feature-action loader awaited before defaults are applied
    pub fn feature_actions(mut self, loader: Arc<dyn FeatureActionLoader>) -> Self {
        self.feature_actions = Some(loader);
        self
    }

    /// Set the executor that applies default presets
    pub fn executor(mut self, executor: Arc<dyn CommandExecutor>) -> Self {
        self.executor = Some(executor);
        self
    }

    /// Build cache with current configuration
    pub fn build(self) -> PresetResult<PresetCache> {
        let fetcher = self
            .fetcher
            .ok_or_else(|| PresetError::config("Preset fetcher not specified"))?;

        Ok(PresetCache {
            inner: Arc::new(Inner {
                fetcher,
                layers: self
                    .layers
                    .unwrap_or_else(|| Arc::new(MemoryLayerRegistry::new())),
                settings: self
                    .settings
                    .unwrap_or_else(|| Arc::new(MemorySettings::new())),
                feature_actions: self
                    .feature_actions
                    .unwrap_or_else(|| Arc::new(NoFeatureActions)),
                executor: self.executor.unwrap_or_else(|| Arc::new(LoggingExecutor)),
                presets: RwLock::new(HashMap::new()),
                requested: RwLock::new(HashSet::new()),
                applied: Mutex::new(HashSet::new()),
            }),
        })
    }
}

impl Default for PresetCacheBuilder {
    fn default() -> Self {
        Self::new()
    }
}

struct Inner {
    fetcher: Arc<dyn PresetFetcher>,
    layers: Arc<dyn LayerRegistry>,
    settings: Arc<dyn SettingsStore>,
    feature_actions: Arc<dyn FeatureActionLoader>,
    executor: Arc<dyn CommandExecutor>,
    /// One future per preset type or layer id
    presets: RwLock<HashMap<String, PresetFuture>>,
    /// Every url ever requested
    requested: RwLock<HashSet<String>>,
    /// Layer ids handled by this process. The lock also serializes
    /// read-modify-write of the applied-defaults setting.
    applied: Mutex<HashSet<String>>,
}

impl Inner {
    fn load_url(&self, url: String) -> BoxFuture<'static, PresetResult<Vec<Preset>>> {
        let fetcher = self.fetcher.clone();
        async move {
            let text = fetcher.fetch(&url).await?;
            parse_presets(&text).map_err(|e| match e {
                PresetError::Parse(msg) => PresetError::parse(format!("{} ({})", msg, url)),
                other => other,
            })
        }
        .boxed()
    }

    /// Presets saved in settings for the layer's filter key
    async fn saved_presets(&self, id: &str) -> PresetResult<Vec<Preset>> {
        let filter_key = match self.layers.filter_key(id) {
            Some(key) => key,
            None => return Ok(Vec::new()),
        };

        let saved = self
            .settings
            .get_or(LAYER_PRESETS_KEY, Value::Object(Map::new()))
            .await?;

        match saved.get(&filter_key) {
            Some(list) => Ok(serde_json::from_value(list.clone()).map_err(|e| {
                PresetError::parse(format!("Invalid saved presets for {}: {}", filter_key, e))
            })?),
            None => Ok(Vec::new()),
        }
    }

    fn init_future(inner: &Arc<Inner>, id: String, apply_default: bool) -> PresetFuture {
        let inner = inner.clone();
        async move {
            let mut presets = inner.saved_presets(&id).await.unwrap_or_else(|e| {
                handle_load_error(&e);
                Vec::new()
            });
            if !presets.is_empty() {
                presets.push(Preset::restore_default());
            }

            if let Err(e) = inner.feature_actions.load_defaults(&id).await {
                warn!(layer = %id, "Default feature actions failed to load: {}", e);
            }

            if apply_default {
                if let Err(e) = inner.apply_defaults(&id, &presets).await {
                    handle_load_error(&e);
                }
            }

            Arc::new(presets)
        }
        .boxed()
        .shared()
    }

    async fn apply_defaults(&self, id: &str, presets: &[Preset]) -> PresetResult<bool> {
        let mut handled = self.applied.lock().await;
        if handled.contains(id) {
            debug!(layer = %id, "Default preset already applied");
            return Ok(false);
        }

        let mut applied = match self
            .settings
            .get_or(APPLIED_DEFAULTS_KEY, Value::Object(Map::new()))
            .await?
        {
            Value::Object(map) => map,
            other => {
                warn!("Discarding malformed applied-defaults setting: {}", other);
                Map::new()
            }
        };

        handled.insert(id.to_string());
        if applied.get(id).and_then(Value::as_bool).unwrap_or(false) {
            debug!(layer = %id, "Default preset already applied");
            return Ok(false);
        }

        // Mark before executing so a failed write cannot lead to a second apply
        applied.insert(id.to_string(), Value::Bool(true));
        if let Err(e) = self
            .settings
            .set(APPLIED_DEFAULTS_KEY, Value::Object(applied))
            .await
        {
            warn!(layer = %id, "Failed to persist applied default: {}", e);
        }

        match find_default(presets) {
            Some(preset) => {
                info!(layer = %id, preset = %preset.id, "Applying default preset");
                self.executor.apply(id, preset);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

/// Chain a new load after an existing entry. New records come first.
///
/// A failed load resolves to the previous value.
fn merge(
    previous: PresetFuture,
    load: BoxFuture<'static, PresetResult<Vec<Preset>>>,
) -> PresetFuture {
    async move {
        match load.await {
            Ok(mut loaded) => {
                let old = previous.await;
                loaded.extend(old.iter().cloned());
                Arc::new(loaded)
            }
            Err(e) => {
                handle_load_error(&e);
                previous.await
            }
        }
    }
    .boxed()
    .shared()
}

fn first_load(load: BoxFuture<'static, PresetResult<Vec<Preset>>>) -> PresetFuture {
    async move {
        match load.await {
            Ok(loaded) => Arc::new(loaded),
            Err(e) => {
                handle_load_error(&e);
                Arc::new(Vec::new())
            }
        }
    }
    .boxed()
    .shared()
}

/// Drive a future to completion in the background so its side effects run
/// even when nobody awaits the entry.
fn drive(future: PresetFuture) {
    tokio::spawn(future);
}

/// Cached, single-flight preset lists keyed by preset type or layer id.
///
/// Cloning is cheap and yields a handle to the same cache. All methods must be
/// called from within a Tokio runtime.
#[derive(Clone)]
pub struct PresetCache {
    inner: Arc<Inner>,
}

impl PresetCache {
    pub fn builder() -> PresetCacheBuilder {
        PresetCacheBuilder::new()
    }

    /// Register a preset file for `preset_type`.
    ///
    /// Each url is fetched at most once for the lifetime of the cache, failed
    /// fetches included. Records from a later registration are placed before
    /// the ones already cached for the type.
    pub async fn register_preset(&self, preset_type: &str, url: &str) {
        if !self.inner.requested.write().await.insert(url.to_string()) {
            debug!(preset_type = %preset_type, url = %url, "Presets already requested");
            return;
        }
        info!(preset_type = %preset_type, url = %url, "Registering presets");

        let load = self.inner.load_url(url.to_string());
        let future = {
            let mut presets = self.inner.presets.write().await;
            let future = match presets.get(preset_type).cloned() {
                Some(previous) => merge(previous, load),
                None => first_load(load),
            };
            presets.insert(preset_type.to_string(), future.clone());
            future
        };
        drive(future);
    }

    /// The shared future for `id`, initializing it if absent
    pub async fn presets_future(&self, id: &str, apply_default: bool) -> PresetFuture {
        if let Some(future) = self.inner.presets.read().await.get(id) {
            debug!(key = %id, "Preset cache hit");
            return future.clone();
        }

        let mut presets = self.inner.presets.write().await;
        // Another caller may have initialized the key between the two locks
        if let Some(future) = presets.get(id) {
            return future.clone();
        }

        let future = Inner::init_future(&self.inner, id.to_string(), apply_default);
        presets.insert(id.to_string(), future.clone());
        drive(future.clone());
        future
    }

    /// Presets for a preset type or layer id
    pub async fn get_presets(&self, id: &str, apply_default: bool) -> PresetList {
        self.presets_future(id, apply_default).await.await
    }

    /// Build the entry for a layer from its saved presets, replacing any
    /// existing entry.
    ///
    /// The future waits for the layer's default feature actions, applies the
    /// default preset when `apply_default` is set, then yields the saved
    /// presets followed by a restore-to-default record (when any exist).
    pub async fn init_preset(&self, id: &str, apply_default: bool) -> PresetFuture {
        let future = Inner::init_future(&self.inner, id.to_string(), apply_default);
        self.inner
            .presets
            .write()
            .await
            .insert(id.to_string(), future.clone());
        drive(future.clone());
        future
    }

    /// Apply the first default preset to layer `id`, once per layer.
    ///
    /// The layer is marked as handled even when no preset is flagged default,
    /// and the mark is written before the preset is executed. A failed write is
    /// logged; the layer stays handled for the life of this cache. Returns
    /// whether a preset was executed.
    pub async fn apply_defaults(&self, id: &str, presets: &[Preset]) -> PresetResult<bool> {
        self.inner.apply_defaults(id, presets).await
    }

    /// Whether `url` was ever requested
    pub async fn is_requested(&self, url: &str) -> bool {
        self.inner.requested.read().await.contains(url)
    }

    /// Whether an entry exists for `key`
    pub async fn contains(&self, key: &str) -> bool {
        self.inner.presets.read().await.contains_key(key)
    }

    /// Drop every cached entry and forget requested urls
    pub async fn dispose(&self) {
        self.inner.presets.write().await.clear();
        self.inner.requested.write().await.clear();
        debug!("Preset cache disposed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct EchoFetcher;

    #[async_trait]
    impl PresetFetcher for EchoFetcher {
        async fn fetch(&self, url: &str) -> PresetResult<String> {
            Ok(format!(r#"[{{"id": "{}"}}]"#, url))
        }
    }

    fn cache() -> PresetCache {
        PresetCache::builder()
            .fetcher(Arc::new(EchoFetcher))
            .build()
            .unwrap()
    }

    #[test]
    fn test_builder_requires_fetcher() {
        assert!(matches!(
            PresetCacheBuilder::new().build(),
            Err(PresetError::Config(_))
        ));
    }

    #[test]
    fn test_handle_load_error_normalizes() {
        assert_eq!(handle_load_error("boom"), "boom");
        assert_eq!(
            handle_load_error(PresetError::network("offline")),
            "Network error: offline"
        );
        assert_eq!(handle_load_error("  "), "Unknown error while loading presets");
    }

    #[tokio::test]
    async fn test_register_then_get() {
        let cache = cache();
        cache.register_preset("roads", "u1").await;
        assert!(cache.is_requested("u1").await);
        assert!(cache.contains("roads").await);

        let presets = cache.get_presets("roads", false).await;
        assert_eq!(presets.len(), 1);
        assert_eq!(presets[0].id, "u1");
    }

    #[tokio::test]
    async fn test_dispose_clears_state() {
        let cache = cache();
        cache.register_preset("roads", "u1").await;
        cache.dispose().await;

        assert!(!cache.is_requested("u1").await);
        assert!(!cache.contains("roads").await);
    }
}
