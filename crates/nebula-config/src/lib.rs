//! Configuration system for the Nebula world generator.
//!
//! Provides the tunable world-generation settings and diagnostics options,
//! persisted to disk as RON files with forward/backward compatible
//! serialization and hot-reload detection.

mod config;
mod error;

pub use config::{
    BiomeConfig, BiomeSelection, CacheConfig, CaveConfig, Config, DebugConfig, DecorationConfig,
    TerrainConfig, WORLD_HEIGHT, WorldGenConfig,
};
pub use error::ConfigError;
