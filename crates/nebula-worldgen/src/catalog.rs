//! Static generation tables: biomes, decorations and ores.

use nebula_config::TerrainConfig;

use crate::biome::BiomeTable;
use crate::decoration::{Decoration, default_decorations};
use crate::error::CatalogError;
use crate::ore::{OreDistribution, default_ore_distributions};

/// Immutable tables shared by every generation call.
pub struct Catalog {
    biomes: BiomeTable,
    decorations: Vec<Decoration>,
    ores: Vec<OreDistribution>,
}

impl Catalog {
    pub fn new(biomes: BiomeTable, decorations: Vec<Decoration>, ores: Vec<OreDistribution>) -> Self {
        Self {
            biomes,
            decorations,
            ores,
        }
    }

    /// Built-in biomes, decorations and ores.
    pub fn standard(terrain: &TerrainConfig) -> Self {
        Self::new(
            BiomeTable::standard(terrain),
            default_decorations(),
            default_ore_distributions(),
        )
    }

    /// Check every table. Called once when a generator is built.
    pub fn validate(&self, terrain: &TerrainConfig) -> Result<(), CatalogError> {
        self.biomes.validate(terrain)?;
        for decoration in &self.decorations {
            if let Some(reason) = decoration.problem() {
                return Err(CatalogError::Decoration {
                    name: decoration.name().to_owned(),
                    reason,
                });
            }
        }
        for ore in &self.ores {
            if let Some(reason) = ore.problem() {
                return Err(CatalogError::Ore {
                    name: ore.name.clone(),
                    reason,
                });
            }
        }
        Ok(())
    }

    pub fn biomes(&self) -> &BiomeTable {
        &self.biomes
    }

    /// Decorations in placement priority order.
    pub fn decorations(&self) -> &[Decoration] {
        &self.decorations
    }

    pub fn ores(&self) -> &[OreDistribution] {
        &self.ores
    }
}
