//! Errors reported while constructing a world generator.

use nebula_config::ConfigError;

use crate::biome::BiomeTableError;

/// A problem in the static biome, decoration or ore catalogs.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error(transparent)]
    Biomes(#[from] BiomeTableError),

    /// A decoration entry is malformed.
    #[error("decoration '{name}': {reason}")]
    Decoration { name: String, reason: &'static str },

    /// An ore distribution is malformed.
    #[error("ore '{name}': {reason}")]
    Ore { name: String, reason: &'static str },
}

/// Errors from [`crate::WorldGenerator::new`].
#[derive(Debug, thiserror::Error)]
pub enum WorldGenError {
    #[error("invalid world generation config: {0}")]
    Config(#[from] ConfigError),

    #[error("invalid catalog: {0}")]
    Catalog(#[from] CatalogError),
}
