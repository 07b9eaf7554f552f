//! Biome table: maps [`BiomeId`] to [`BiomeDef`], plus the transition rules
//! between adjacent biomes.

use hashbrown::HashMap;

use nebula_config::TerrainConfig;

use super::def::{Band, BiomeDef, BiomeId, ClimateRange, StructuralGates, VoronoiAnchor};
use crate::chunk::Block;

/// Biome used when no biome qualifies for an ocean column.
pub const OCEAN_FALLBACK: BiomeId = BiomeId::Ocean;
/// Biome used when no biome qualifies for a land column.
pub const LAND_FALLBACK: BiomeId = BiomeId::Plains;

/// Errors found while building or validating a biome table.
#[derive(Debug, thiserror::Error)]
pub enum BiomeTableError {
    /// A biome was registered twice.
    #[error("duplicate biome: {0}")]
    Duplicate(&'static str),

    /// A biome has no definition.
    #[error("missing biome definition: {0}")]
    Missing(&'static str),

    /// A fallback biome's gates reject some columns it must cover.
    #[error("fallback biome {biome} cannot cover every {kind} column")]
    FallbackGates {
        biome: &'static str,
        kind: &'static str,
    },

    /// A Voronoi anchor has a non-positive weight.
    #[error("biome {0} has a non-positive anchor weight")]
    AnchorWeight(&'static str),

    /// A transition rule is malformed.
    #[error("invalid transition {a} / {b} -> {result}")]
    Transition {
        a: &'static str,
        b: &'static str,
        result: &'static str,
    },
}

/// All biome definitions plus unordered transition rules.
pub struct BiomeTable {
    biomes: Vec<Option<BiomeDef>>,
    transitions: HashMap<(BiomeId, BiomeId), BiomeId>,
    name_to_id: HashMap<&'static str, BiomeId>,
}

fn pair_key(a: BiomeId, b: BiomeId) -> (BiomeId, BiomeId) {
    if a <= b { (a, b) } else { (b, a) }
}

impl BiomeTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self {
            biomes: vec![None; BiomeId::COUNT],
            transitions: HashMap::new(),
            name_to_id: HashMap::new(),
        }
    }

    /// Registers a biome definition.
    ///
    /// # Errors
    ///
    /// Returns [`BiomeTableError::Duplicate`] if the id already has a definition.
    pub fn register(&mut self, def: BiomeDef) -> Result<(), BiomeTableError> {
        let slot = &mut self.biomes[def.id.index()];
        if slot.is_some() {
            return Err(BiomeTableError::Duplicate(def.id.name()));
        }
        self.name_to_id.insert(def.id.name(), def.id);
        *slot = Some(def);
        Ok(())
    }

    /// Registers an unordered transition: a boundary between `a` and `b`
    /// may blend into `result`.
    pub fn add_transition(&mut self, a: BiomeId, b: BiomeId, result: BiomeId) {
        self.transitions.insert(pair_key(a, b), result);
    }

    /// Transition biome for a boundary between `a` and `b`, in either order.
    pub fn transition_for(&self, a: BiomeId, b: BiomeId) -> Option<BiomeId> {
        self.transitions.get(&pair_key(a, b)).copied()
    }

    /// Returns the definition for the given biome.
    ///
    /// # Panics
    ///
    /// Panics if `id` was never registered. A table that passed
    /// [`BiomeTable::validate`] defines every id.
    pub fn get(&self, id: BiomeId) -> &BiomeDef {
        match &self.biomes[id.index()] {
            Some(def) => def,
            None => panic!("biome {} is not registered", id.name()),
        }
    }

    /// Looks up a biome by name.
    pub fn lookup_by_name(&self, name: &str) -> Option<BiomeId> {
        self.name_to_id.get(name).copied()
    }

    /// Iterate registered definitions in id order.
    pub fn iter(&self) -> impl Iterator<Item = &BiomeDef> {
        self.biomes.iter().flatten()
    }

    /// Returns the number of registered biomes.
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// Returns `true` if no biomes are registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Check completeness, fallback coverage, anchors and transitions.
    pub fn validate(&self, terrain: &TerrainConfig) -> Result<(), BiomeTableError> {
        for id in BiomeId::ALL {
            if self.biomes[id.index()].is_none() {
                return Err(BiomeTableError::Missing(id.name()));
            }
        }

        // Ocean floors range over [1, sea - 2]; land columns over [1, max_height].
        let ocean = &self.get(OCEAN_FALLBACK).gates;
        let ocean_ok = ocean.y_min <= 1
            && ocean.y_max >= terrain.sea_level - 2
            && ocean.max_slope == i32::MAX
            && ocean.continentalness.min <= 0.0
            && ocean.continentalness.max >= terrain.ocean_threshold;
        if !ocean_ok {
            return Err(BiomeTableError::FallbackGates {
                biome: OCEAN_FALLBACK.name(),
                kind: "ocean",
            });
        }
        let land = &self.get(LAND_FALLBACK).gates;
        let land_ok = land.y_min <= 1
            && land.y_max >= terrain.max_height
            && land.max_slope == i32::MAX
            && land.continentalness.min <= terrain.ocean_threshold
            && land.continentalness.max == f32::INFINITY;
        if !land_ok {
            return Err(BiomeTableError::FallbackGates {
                biome: LAND_FALLBACK.name(),
                kind: "land",
            });
        }

        for def in self.iter() {
            if let Some(anchor) = def.anchor
                && anchor.weight <= 0.0
            {
                return Err(BiomeTableError::AnchorWeight(def.id.name()));
            }
        }

        for (&(a, b), &result) in &self.transitions {
            if a == b || result == a || result == b || result.is_ocean() || a.is_ocean() || b.is_ocean()
            {
                return Err(BiomeTableError::Transition {
                    a: a.name(),
                    b: b.name(),
                    result: result.name(),
                });
            }
        }
        Ok(())
    }

    /// The built-in biome set, with gates tied to the terrain parameters.
    pub fn standard(terrain: &TerrainConfig) -> Self {
        let sea = terrain.sea_level;
        let land = Band::at_least(terrain.ocean_threshold);
        let highland = Band::at_least(terrain.inland_high_threshold);
        let any = i32::MAX;

        let gates = |y_min: i32, y_max: i32, max_slope: i32, continentalness: Band| {
            StructuralGates {
                y_min,
                y_max,
                max_slope,
                continentalness,
            }
        };
        let climate = |t: (f32, f32), h: (f32, f32), e: (i32, i32), priority: i32| {
            Some(ClimateRange {
                temperature: Band::new(t.0, t.1),
                humidity: Band::new(h.0, h.1),
                elevation: Band::new(e.0 as f32, e.1 as f32),
                priority,
            })
        };
        let anchor = |heat: f32, humidity: f32, weight: f32| {
            Some(VoronoiAnchor {
                heat,
                humidity,
                weight,
            })
        };
        let def = |id, surface, filler, filler_depth, climate, anchor, gates, map_color| BiomeDef {
            id,
            surface,
            filler,
            filler_depth,
            climate,
            anchor,
            gates,
            map_color,
        };

        let deep_max = 0.18f32.min(terrain.ocean_threshold);
        let defs = [
            def(
                BiomeId::DeepOcean,
                Block::Gravel,
                Block::Gravel,
                3,
                climate((0.0, 1.0), (0.0, 1.0), (0, sea - 20), 1),
                anchor(50.0, 50.0, 4.0),
                gates(0, sea - 20, any, Band::new(0.0, deep_max)),
                [16, 32, 96],
            ),
            def(
                BiomeId::Ocean,
                Block::Sand,
                Block::Sand,
                3,
                climate((0.0, 1.0), (0.0, 1.0), (0, sea - 1), 0),
                anchor(50.0, 50.0, 3.0),
                gates(0, sea - 1, any, Band::new(0.0, terrain.ocean_threshold)),
                [32, 64, 160],
            ),
            def(
                BiomeId::River,
                Block::Sand,
                Block::Dirt,
                3,
                None,
                None,
                gates(0, sea + 3, any, land),
                [48, 112, 208],
            ),
            def(
                BiomeId::Plains,
                Block::Grass,
                Block::Dirt,
                3,
                climate((0.3, 0.7), (0.2, 0.6), (sea - 10, sea + 60), 0),
                anchor(55.0, 45.0, 2.0),
                gates(0, i32::MAX, any, land),
                [128, 184, 88],
            ),
            def(
                BiomeId::DryPlains,
                Block::Grass,
                Block::Dirt,
                2,
                None,
                None,
                gates(0, i32::MAX, 6, land),
                [176, 176, 96],
            ),
            def(
                BiomeId::Forest,
                Block::Grass,
                Block::Dirt,
                3,
                climate((0.35, 0.75), (0.5, 0.9), (sea - 10, sea + 70), 0),
                anchor(58.0, 68.0, 1.4),
                gates(0, i32::MAX, any, land),
                [40, 120, 40],
            ),
            def(
                BiomeId::Taiga,
                Block::Podzol,
                Block::Dirt,
                3,
                climate((0.1, 0.4), (0.4, 0.9), (sea - 10, sea + 80), 0),
                anchor(25.0, 62.0, 1.2),
                gates(0, i32::MAX, any, land),
                [48, 96, 80],
            ),
            def(
                BiomeId::Tundra,
                Block::Snow,
                Block::Dirt,
                2,
                climate((0.0, 0.25), (0.0, 0.6), (sea - 10, sea + 70), 0),
                anchor(8.0, 35.0, 1.1),
                gates(0, i32::MAX, any, land),
                [216, 224, 232],
            ),
            def(
                BiomeId::Desert,
                Block::Sand,
                Block::Sandstone,
                4,
                climate((0.7, 1.0), (0.0, 0.3), (sea - 10, sea + 50), 0),
                anchor(88.0, 12.0, 1.3),
                gates(0, i32::MAX, any, land),
                [232, 208, 136],
            ),
            def(
                BiomeId::Savanna,
                Block::Grass,
                Block::Dirt,
                3,
                climate((0.6, 0.9), (0.2, 0.5), (sea - 10, sea + 50), 0),
                anchor(74.0, 34.0, 1.1),
                gates(0, i32::MAX, any, land),
                [184, 168, 72],
            ),
            def(
                BiomeId::Jungle,
                Block::Grass,
                Block::Dirt,
                3,
                climate((0.7, 1.0), (0.65, 1.0), (sea - 10, sea + 60), 0),
                anchor(88.0, 84.0, 1.1),
                gates(0, i32::MAX, any, land),
                [24, 152, 24],
            ),
            def(
                BiomeId::Swamp,
                Block::Mud,
                Block::Dirt,
                3,
                climate((0.45, 0.8), (0.75, 1.0), (sea - 6, sea + 5), 1),
                anchor(62.0, 88.0, 1.0),
                gates(0, sea + 5, 2, land),
                [72, 96, 56],
            ),
            def(
                BiomeId::Foothills,
                Block::Grass,
                Block::Dirt,
                2,
                None,
                None,
                gates(sea + 12, i32::MAX, any, land),
                [136, 152, 104],
            ),
            def(
                BiomeId::Mountains,
                Block::Stone,
                Block::Stone,
                1,
                climate((0.2, 0.7), (0.0, 1.0), (sea + 35, 255), 2),
                anchor(42.0, 40.0, 3.0),
                gates(sea + 35, i32::MAX, any, highland),
                [128, 128, 128],
            ),
            def(
                BiomeId::SnowyPeaks,
                Block::Snow,
                Block::Stone,
                1,
                climate((0.0, 0.45), (0.0, 1.0), (sea + 70, 255), 3),
                anchor(22.0, 40.0, 4.0),
                gates(sea + 70, i32::MAX, any, highland),
                [240, 240, 255],
            ),
        ];

        let mut table = Self::new();
        for def in defs {
            table
                .register(def)
                .expect("standard biome ids are distinct");
        }

        table.add_transition(BiomeId::Desert, BiomeId::Forest, BiomeId::DryPlains);
        table.add_transition(BiomeId::Desert, BiomeId::Plains, BiomeId::DryPlains);
        table.add_transition(BiomeId::Desert, BiomeId::Jungle, BiomeId::Savanna);
        table.add_transition(BiomeId::Tundra, BiomeId::Forest, BiomeId::Taiga);
        table.add_transition(BiomeId::Plains, BiomeId::Mountains, BiomeId::Foothills);
        table.add_transition(BiomeId::Forest, BiomeId::Mountains, BiomeId::Foothills);
        table.add_transition(BiomeId::Taiga, BiomeId::Mountains, BiomeId::Foothills);
        table
    }
}

impl Default for BiomeTable {
    fn default() -> Self {
        Self::new()
    }
}
