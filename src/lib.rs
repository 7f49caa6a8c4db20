//! Cached preset loading for map layers.
//!
//! This crate ties together the core types and the preset cache and provides
//! the `layer-presets` command-line tool.

pub use preset_cache as cache;
pub use preset_core as core;

pub use preset_cache::{create_cache, PresetCache};
pub use preset_core::PresetConfig;
