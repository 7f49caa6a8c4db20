use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Capability of layers whose presets are grouped by a filter key
pub trait Filterable: Send + Sync {
    /// Key shared by layers that use the same preset sets
    fn filter_key(&self) -> Option<String>;
}

/// A map layer as seen by the preset cache
pub trait Layer: Send + Sync {
    /// Layer identifier
    fn id(&self) -> &str;

    /// Query the filter capability. Layers without it return `None`.
    fn as_filterable(&self) -> Option<&dyn Filterable> {
        None
    }
}

/// Lookup of live layers by id
pub trait LayerRegistry: Send + Sync {
    fn layer(&self, id: &str) -> Option<Arc<dyn Layer>>;

    /// Resolve the filter key of a layer, if the layer exists and is filterable
    fn filter_key(&self, id: &str) -> Option<String> {
        self.layer(id)
            .and_then(|layer| layer.as_filterable().and_then(|f| f.filter_key()))
    }
}

/// Plain layer description
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerInfo {
    pub id: String,
    pub filter_key: Option<String>,
}

impl LayerInfo {
    pub fn new(id: impl Into<String>, filter_key: Option<String>) -> Self {
        Self {
            id: id.into(),
            filter_key,
        }
    }
}

impl Layer for LayerInfo {
    fn id(&self) -> &str {
        &self.id
    }

    fn as_filterable(&self) -> Option<&dyn Filterable> {
        if self.filter_key.is_some() {
            Some(self)
        } else {
            None
        }
    }
}

impl Filterable for LayerInfo {
    fn filter_key(&self) -> Option<String> {
        self.filter_key.clone()
    }
}

/// In-memory layer registry
#[derive(Default)]
pub struct MemoryLayerRegistry {
    layers: RwLock<HashMap<String, Arc<dyn Layer>>>,
}

impl MemoryLayerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a layer
    pub fn insert(&self, layer: Arc<dyn Layer>) {
        let mut layers = self.layers.write().unwrap_or_else(|e| e.into_inner());
        layers.insert(layer.id().to_string(), layer);
    }
}

impl LayerRegistry for MemoryLayerRegistry {
    fn layer(&self, id: &str) -> Option<Arc<dyn Layer>> {
        let layers = self.layers.read().unwrap_or_else(|e| e.into_inner());
        layers.get(id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct PlainLayer;

    impl Layer for PlainLayer {
        fn id(&self) -> &str {
            "plain"
        }
    }

    #[test]
    fn test_filter_key_lookup() {
        let registry = MemoryLayerRegistry::new();
        registry.insert(Arc::new(LayerInfo::new("l1", Some("csv#roads".to_string()))));
        registry.insert(Arc::new(LayerInfo::new("l2", None)));
        registry.insert(Arc::new(PlainLayer));

        assert_eq!(registry.filter_key("l1").as_deref(), Some("csv#roads"));
        assert_eq!(registry.filter_key("l2"), None);
        assert_eq!(registry.filter_key("plain"), None);
        assert_eq!(registry.filter_key("missing"), None);
    }
}
