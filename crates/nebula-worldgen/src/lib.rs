//! Procedural world generation: seeded noise fields, structure-first terrain
//! shaping, climate biomes, surface layers, caves, ores, decorations and
//! initial lighting, with region and LOD caches for chunk-scale and distant
//! terrain requests.

mod catalog;
mod cave;
mod chunk;
mod column;
mod decoration;
mod error;
mod generator;
mod light;
mod lod;
mod noise_field;
mod ore;
mod region;
mod sampler;
mod seed;
mod structure;
mod surface;

pub mod biome;
pub mod debug_viz;

pub use catalog::Catalog;
pub use cave::{CaveCarver, CaveColumns, CaveMask};
pub use chunk::{Block, CHUNK_AREA, CHUNK_HEIGHT, CHUNK_SIZE, CHUNK_VOLUME, Chunk, ChunkCoord};
pub use column::{ColumnInfo, ColumnMeta, ColumnPipeline, ShapedColumn};
pub use decoration::{
    Decoration, DecorationPlacer, DecorationSite, PlacementRule, SchematicBlock,
    default_decorations,
};
pub use error::{CatalogError, WorldGenError};
pub use generator::{GenerationStatus, WorldGenerator};
pub use light::{ChunkLight, VoxelLight, compute_skylight, light_chunk, propagate_block_light};
pub use lod::{
    LOD_CACHE_MAX_ENTRIES, LOD_TILE_SAMPLES, LodBuffer, LodCache, MAX_LOD_LEVEL, lod_step,
    lod_tile_span,
};
pub use noise_field::{NoiseField, NoiseKind, NoiseParams};
pub use ore::{OreDistribution, OreDistributor, default_ore_distributions};
pub use region::{
    GenRegion, REGION_CHUNKS, REGION_MARGIN, REGION_SIZE, RegionCache, RegionCoord, WORLD_LIMIT,
};
pub use sampler::{ColumnSample, Field, NoiseSampler};
pub use seed::{WorldSeed, hash_chunk};
pub use structure::{CoastalSurfaceType, ColumnShape, StructuralClassifier};
pub use surface::{ColumnLayers, SurfaceBuilder};
