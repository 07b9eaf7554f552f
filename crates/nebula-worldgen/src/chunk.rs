//! Chunk storage filled by the generator.
//!
//! A chunk is a 16 x 256 x 16 column of [`Block`]s plus a per-column biome
//! and surface height, and a parallel light array. Storage is Y-major so a
//! single column scan walks a fixed stride.

use crate::biome::BiomeId;
use crate::light::ChunkLight;

/// Chunk width and depth in blocks.
pub const CHUNK_SIZE: usize = 16;
/// Chunk height in blocks (world Y range `0..CHUNK_HEIGHT`).
pub const CHUNK_HEIGHT: usize = nebula_config::WORLD_HEIGHT as usize;
/// Columns per chunk.
pub const CHUNK_AREA: usize = CHUNK_SIZE * CHUNK_SIZE;
/// Voxels per chunk.
pub const CHUNK_VOLUME: usize = CHUNK_AREA * CHUNK_HEIGHT;

/// Block types produced by world generation.
#[repr(u8)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Block {
    #[default]
    Air = 0,
    Bedrock,
    Stone,
    Dirt,
    Grass,
    Podzol,
    Mud,
    Sand,
    Sandstone,
    Gravel,
    Clay,
    Snow,
    Water,
    Lava,
    CoalOre,
    IronOre,
    GoldOre,
    DiamondOre,
    OakLog,
    OakLeaves,
    SpruceLog,
    SpruceLeaves,
    JungleLog,
    JungleLeaves,
    AcaciaLog,
    AcaciaLeaves,
    Cactus,
    TallGrass,
    Flower,
    DeadBush,
}

impl Block {
    /// Blocks skylight completely and stops block light propagation.
    pub fn is_opaque(self) -> bool {
        !matches!(
            self,
            Block::Air
                | Block::Water
                | Block::Lava
                | Block::OakLeaves
                | Block::SpruceLeaves
                | Block::JungleLeaves
                | Block::AcaciaLeaves
                | Block::TallGrass
                | Block::Flower
                | Block::DeadBush
        )
    }

    /// Solid terrain that caves may carve through.
    pub fn is_terrain(self) -> bool {
        matches!(
            self,
            Block::Stone
                | Block::Dirt
                | Block::Grass
                | Block::Podzol
                | Block::Mud
                | Block::Sand
                | Block::Sandstone
                | Block::Gravel
                | Block::Clay
                | Block::Snow
        )
    }

    /// Water attenuates skylight by one level per voxel.
    pub fn is_water(self) -> bool {
        self == Block::Water
    }

    /// Emitted block light level.
    pub fn light_emission(self) -> u8 {
        match self {
            Block::Lava => 15,
            _ => 0,
        }
    }

    /// Tree trunk blocks.
    pub fn is_log(self) -> bool {
        matches!(
            self,
            Block::OakLog | Block::SpruceLog | Block::JungleLog | Block::AcaciaLog
        )
    }
}

/// Chunk position in chunk units.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ChunkCoord {
    pub x: i32,
    pub z: i32,
}

impl ChunkCoord {
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// Chunk containing the world column `(wx, wz)`.
    pub fn from_block(wx: i32, wz: i32) -> Self {
        Self {
            x: wx.div_euclid(CHUNK_SIZE as i32),
            z: wz.div_euclid(CHUNK_SIZE as i32),
        }
    }

    /// World X of the chunk's first column.
    pub fn world_x(self) -> i32 {
        self.x * CHUNK_SIZE as i32
    }

    /// World Z of the chunk's first column.
    pub fn world_z(self) -> i32 {
        self.z * CHUNK_SIZE as i32
    }

    /// Whether world column `(wx, wz)` lies in this chunk.
    pub fn contains(self, wx: i32, wz: i32) -> bool {
        Self::from_block(wx, wz) == self
    }
}

#[inline]
fn voxel_index(x: usize, y: usize, z: usize) -> usize {
    (y * CHUNK_SIZE + z) * CHUNK_SIZE + x
}

#[inline]
fn column_index(x: usize, z: usize) -> usize {
    z * CHUNK_SIZE + x
}

/// A generated (or pending) chunk.
pub struct Chunk {
    coord: ChunkCoord,
    blocks: Box<[Block]>,
    biomes: Box<[BiomeId]>,
    heights: Box<[i32]>,
    light: ChunkLight,
    generated: bool,
}

impl Chunk {
    /// Create an empty (all air, not generated) chunk.
    pub fn new(coord: ChunkCoord) -> Self {
        Self {
            coord,
            blocks: vec![Block::Air; CHUNK_VOLUME].into_boxed_slice(),
            biomes: vec![BiomeId::default(); CHUNK_AREA].into_boxed_slice(),
            heights: vec![0; CHUNK_AREA].into_boxed_slice(),
            light: ChunkLight::new(),
            generated: false,
        }
    }

    pub fn coord(&self) -> ChunkCoord {
        self.coord
    }

    /// Whether generation ran to completion on this chunk.
    pub fn is_generated(&self) -> bool {
        self.generated
    }

    pub(crate) fn set_generated(&mut self, generated: bool) {
        self.generated = generated;
    }

    /// Clear all contents back to air and mark the chunk as not generated.
    pub fn reset(&mut self) {
        self.blocks.fill(Block::Air);
        self.biomes.fill(BiomeId::default());
        self.heights.fill(0);
        self.light.clear();
        self.generated = false;
    }

    /// Block at local coordinates. Out-of-range positions read as air.
    pub fn get(&self, x: usize, y: usize, z: usize) -> Block {
        if x >= CHUNK_SIZE || y >= CHUNK_HEIGHT || z >= CHUNK_SIZE {
            return Block::Air;
        }
        self.blocks[voxel_index(x, y, z)]
    }

    /// Set the block at local coordinates. Out-of-range writes are ignored.
    pub fn set(&mut self, x: usize, y: usize, z: usize, block: Block) {
        if x >= CHUNK_SIZE || y >= CHUNK_HEIGHT || z >= CHUNK_SIZE {
            tracing::warn!("chunk {:?}: ignored write outside bounds at ({x}, {y}, {z})", self.coord);
            return;
        }
        self.blocks[voxel_index(x, y, z)] = block;
    }

    /// Biome of a local column.
    pub fn biome(&self, x: usize, z: usize) -> BiomeId {
        self.biomes[column_index(x, z)]
    }

    pub(crate) fn set_biome(&mut self, x: usize, z: usize, biome: BiomeId) {
        self.biomes[column_index(x, z)] = biome;
    }

    /// Generated terrain surface height of a local column (before decorations).
    pub fn surface_height(&self, x: usize, z: usize) -> i32 {
        self.heights[column_index(x, z)]
    }

    pub(crate) fn set_surface_height(&mut self, x: usize, z: usize, height: i32) {
        self.heights[column_index(x, z)] = height;
    }

    /// Y of the highest non-air block in a local column, if any.
    pub fn top_block_y(&self, x: usize, z: usize) -> Option<usize> {
        (0..CHUNK_HEIGHT).rev().find(|&y| self.get(x, y, z) != Block::Air)
    }

    /// All blocks in storage order.
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// All column biomes in storage order.
    pub fn biomes(&self) -> &[BiomeId] {
        &self.biomes
    }

    pub fn light(&self) -> &ChunkLight {
        &self.light
    }

    /// Blocks and light borrowed together for the lighting pass.
    pub(crate) fn blocks_and_light_mut(&mut self) -> (&[Block], &mut ChunkLight) {
        (&self.blocks, &mut self.light)
    }

    /// Count voxels of the given block type.
    pub fn count(&self, block: Block) -> usize {
        self.blocks.iter().filter(|b| **b == block).count()
    }
}

/// Storage index of a local voxel, shared with the lighting pass.
pub(crate) fn index_of(x: usize, y: usize, z: usize) -> usize {
    voxel_index(x, y, z)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_chunk_is_air_and_not_generated() {
        let chunk = Chunk::new(ChunkCoord::new(3, -2));
        assert!(!chunk.is_generated());
        assert_eq!(chunk.count(Block::Air), CHUNK_VOLUME);
        assert_eq!(chunk.coord(), ChunkCoord::new(3, -2));
    }

    #[test]
    fn test_get_set_roundtrip() {
        let mut chunk = Chunk::new(ChunkCoord::default());
        chunk.set(1, 200, 15, Block::Stone);
        assert_eq!(chunk.get(1, 200, 15), Block::Stone);
        assert_eq!(chunk.get(15, 200, 1), Block::Air, "axes must not be swapped");
    }

    #[test]
    fn test_out_of_bounds_access() {
        let mut chunk = Chunk::new(ChunkCoord::default());
        chunk.set(16, 0, 0, Block::Stone);
        assert_eq!(chunk.get(16, 0, 0), Block::Air);
        assert_eq!(chunk.get(0, 256, 0), Block::Air);
        assert_eq!(chunk.count(Block::Stone), 0);
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut chunk = Chunk::new(ChunkCoord::default());
        chunk.set(0, 0, 0, Block::Bedrock);
        chunk.set_surface_height(0, 0, 70);
        chunk.set_generated(true);
        chunk.reset();
        assert!(!chunk.is_generated());
        assert_eq!(chunk.get(0, 0, 0), Block::Air);
        assert_eq!(chunk.surface_height(0, 0), 0);
    }

    #[test]
    fn test_top_block() {
        let mut chunk = Chunk::new(ChunkCoord::default());
        assert_eq!(chunk.top_block_y(4, 4), None);
        chunk.set(4, 10, 4, Block::Dirt);
        chunk.set(4, 3, 4, Block::Stone);
        assert_eq!(chunk.top_block_y(4, 4), Some(10));
    }

    #[test]
    fn test_chunk_coord_negative_blocks() {
        assert_eq!(ChunkCoord::from_block(-1, -16), ChunkCoord::new(-1, -1));
        assert_eq!(ChunkCoord::from_block(-17, 15), ChunkCoord::new(-2, 0));
        assert_eq!(ChunkCoord::new(-2, 3).world_x(), -32);
        assert!(ChunkCoord::new(-1, 0).contains(-16, 0));
        assert!(!ChunkCoord::new(-1, 0).contains(0, 0));
    }

    #[test]
    fn test_block_properties() {
        assert!(Block::Stone.is_opaque());
        assert!(!Block::Water.is_opaque());
        assert!(!Block::OakLeaves.is_opaque());
        assert_eq!(Block::Lava.light_emission(), 15);
        assert_eq!(Block::Stone.light_emission(), 0);
        assert!(Block::SpruceLog.is_log());
        assert!(Block::Grass.is_terrain());
        assert!(!Block::Bedrock.is_terrain(), "bedrock is never carved");
    }
}
