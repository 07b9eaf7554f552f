//! Climate-driven biome selection with river override and boundary transitions.

use nebula_config::{BiomeConfig, BiomeSelection};

use super::def::BiomeId;
use super::registry::{BiomeTable, LAND_FALLBACK, OCEAN_FALLBACK};
use super::scoring::{BiomeInput, best_of, range_score, voronoi_distance};
use crate::seed::{WorldSeed, hash_unit, offsets};

/// Probe distances and transition weights, nearest first.
pub const TRANSITION_RINGS: [(i32, f32); 3] = [(4, 0.45), (8, 0.30), (12, 0.15)];

/// Farthest neighbour a transition probe reads.
pub const TRANSITION_REACH: i32 = 12;

const AXES: [(i32, i32); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];

/// Picks biomes from climate, structure and neighbouring biomes.
pub struct ClimateBiomeSelector {
    config: BiomeConfig,
    sea_level: i32,
    roll_seed: WorldSeed,
}

impl ClimateBiomeSelector {
    pub fn new(seed: WorldSeed, config: BiomeConfig, sea_level: i32) -> Self {
        Self {
            config,
            sea_level,
            roll_seed: seed.derive(offsets::TRANSITION),
        }
    }

    /// Strategy used for full-resolution columns.
    pub fn strategy(&self) -> BiomeSelection {
        self.config.selection
    }

    /// Climate biome before river and transition overrides.
    ///
    /// Never fails: if no candidate qualifies the ocean or land fallback is
    /// returned, whose gates cover every column of their kind.
    pub fn base_biome(
        &self,
        table: &BiomeTable,
        input: &BiomeInput,
        strategy: BiomeSelection,
    ) -> BiomeId {
        let candidates = table.iter().filter(|d| d.id.is_ocean() == input.is_ocean);
        let best = match strategy {
            BiomeSelection::RangeScoring => best_of(candidates, |d| range_score(d, input)),
            BiomeSelection::Voronoi => best_of(candidates, |d| voronoi_distance(d, input)),
        };
        match best {
            Some(def) => def.id,
            None if input.is_ocean => OCEAN_FALLBACK,
            None => LAND_FALLBACK,
        }
    }

    /// Whether a column is carved into a river biome.
    pub fn is_river(&self, table: &BiomeTable, input: &BiomeInput) -> bool {
        !input.is_ocean
            && input.river > self.config.river_threshold
            && input.height <= self.sea_level + self.config.river_max_height
            && input.admitted_by(table.get(BiomeId::River))
    }

    /// Final biome for a full-resolution column.
    ///
    /// `neighbor_base` returns the base biome of any world column; it is
    /// probed along the four axes at each ring of [`TRANSITION_RINGS`].
    pub fn finalize(
        &self,
        table: &BiomeTable,
        base: BiomeId,
        input: &BiomeInput,
        x: i32,
        z: i32,
        mut neighbor_base: impl FnMut(i32, i32) -> BiomeId,
    ) -> BiomeId {
        if self.is_river(table, input) {
            return BiomeId::River;
        }
        if !self.config.transitions {
            return base;
        }

        for (radius, weight) in TRANSITION_RINGS {
            for (dx, dz) in AXES {
                let neighbor = neighbor_base(x + dx * radius, z + dz * radius);
                if neighbor == base {
                    continue;
                }
                let Some(transition) = table.transition_for(base, neighbor) else {
                    continue;
                };
                // Nearest registered boundary decides, whether or not the roll hits.
                let hit = hash_unit(self.roll_seed, x, z) < weight;
                if hit && input.admitted_by(table.get(transition)) {
                    return transition;
                }
                return base;
            }
        }
        base
    }

    /// Biome for a coarse LOD sample: range scoring plus river override, no transitions.
    pub fn select_lod(&self, table: &BiomeTable, input: &BiomeInput) -> BiomeId {
        if self.is_river(table, input) {
            return BiomeId::River;
        }
        self.base_biome(table, input, BiomeSelection::RangeScoring)
    }
}
