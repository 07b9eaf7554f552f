//! Biome system: definitions, the biome table, climate scoring and selection.
//!
//! Columns get a climate biome by weighted Voronoi or range scoring, gated by
//! structural constraints, then a river override and probabilistic
//! transition biomes along registered boundaries.

mod def;
mod registry;
mod scoring;
mod selector;

pub use def::{Band, BiomeDef, BiomeId, ClimateRange, StructuralGates, VoronoiAnchor};
pub use registry::{BiomeTable, BiomeTableError, LAND_FALLBACK, OCEAN_FALLBACK};
pub use scoring::{BiomeInput, range_score, voronoi_distance};
pub use selector::{ClimateBiomeSelector, TRANSITION_REACH, TRANSITION_RINGS};
