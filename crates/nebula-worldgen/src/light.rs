//! Initial chunk lighting: skylight column scan and block-light flood fill.
//!
//! Each voxel stores two 4-bit light levels packed into a single byte:
//! the high nibble for skylight and the low nibble for block (emissive) light.
//! Skylight starts at 15 above the column and drops to zero at the first
//! opaque block; water takes one level per voxel. Block light floods out of
//! emissive blocks via BFS with -1 decay per step, blocked by opaque voxels.
//! Light only propagates within the chunk; cross-chunk spread belongs to the
//! engine's lighting system.

use std::collections::VecDeque;

use crate::chunk::{Block, CHUNK_HEIGHT, CHUNK_SIZE, CHUNK_VOLUME, Chunk, index_of};

/// Packed light value: high nibble = skylight, low nibble = block light.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct VoxelLight(pub u8);

impl VoxelLight {
    /// Maximum light level for either channel.
    pub const MAX_LEVEL: u8 = 15;

    /// Returns the skylight level (0–15).
    pub fn sunlight(self) -> u8 {
        (self.0 >> 4) & 0xF
    }

    /// Returns the block light level (0–15).
    pub fn block_light(self) -> u8 {
        self.0 & 0xF
    }

    /// Sets the skylight level (0–15).
    pub fn set_sunlight(&mut self, level: u8) {
        debug_assert!(level <= 15);
        self.0 = (self.0 & 0x0F) | (level << 4);
    }

    /// Sets the block light level (0–15).
    pub fn set_block_light(&mut self, level: u8) {
        debug_assert!(level <= 15);
        self.0 = (self.0 & 0xF0) | (level & 0x0F);
    }
}

/// Per-voxel light data for one chunk, in the same order as its blocks.
pub struct ChunkLight {
    data: Box<[VoxelLight]>,
}

impl ChunkLight {
    /// A fully dark light map.
    pub fn new() -> Self {
        Self {
            data: vec![VoxelLight(0); CHUNK_VOLUME].into_boxed_slice(),
        }
    }

    /// Light at local coordinates.
    pub fn get(&self, x: usize, y: usize, z: usize) -> VoxelLight {
        self.data[index_of(x, y, z)]
    }

    /// Raw values in storage order.
    pub fn raw(&self) -> &[VoxelLight] {
        &self.data
    }

    /// Reset everything to dark.
    pub fn clear(&mut self) {
        self.data.fill(VoxelLight(0));
    }

    fn clear_block_light(&mut self) {
        for light in self.data.iter_mut() {
            light.set_block_light(0);
        }
    }
}

impl Default for ChunkLight {
    fn default() -> Self {
        Self::new()
    }
}

/// The six axis-aligned neighbour offsets.
const NEIGHBORS_6: [(i32, i32, i32); 6] = [
    (1, 0, 0),
    (-1, 0, 0),
    (0, 1, 0),
    (0, -1, 0),
    (0, 0, 1),
    (0, 0, -1),
];

fn in_bounds(x: i32, y: i32, z: i32) -> bool {
    let s = CHUNK_SIZE as i32;
    (0..s).contains(&x) && (0..CHUNK_HEIGHT as i32).contains(&y) && (0..s).contains(&z)
}

/// Vertical skylight scan.
pub fn compute_skylight(blocks: &[Block], light: &mut ChunkLight) {
    for z in 0..CHUNK_SIZE {
        for x in 0..CHUNK_SIZE {
            let mut level = VoxelLight::MAX_LEVEL;
            for y in (0..CHUNK_HEIGHT).rev() {
                let idx = index_of(x, y, z);
                let block = blocks[idx];
                if block.is_opaque() {
                    level = 0;
                } else if block.is_water() {
                    level = level.saturating_sub(1);
                }
                light.data[idx].set_sunlight(level);
            }
        }
    }
}

/// Flood block light from every emissive block in the chunk.
///
/// Returns `false` when the BFS queue could not be allocated; block light is
/// then left dark for the whole chunk rather than half-propagated.
pub fn propagate_block_light(blocks: &[Block], light: &mut ChunkLight) -> bool {
    flood_block_light(blocks, light, |queue, additional| queue.try_reserve(additional).is_ok())
}

type Cell = (u8, u8, u8);

fn flood_block_light(
    blocks: &[Block],
    light: &mut ChunkLight,
    mut reserve: impl FnMut(&mut VecDeque<Cell>, usize) -> bool,
) -> bool {
    let sources: usize = blocks.iter().filter(|b| b.light_emission() > 0).count();
    if sources == 0 {
        return true;
    }

    let mut queue: VecDeque<Cell> = VecDeque::new();
    if !reserve(&mut queue, sources) {
        tracing::warn!("block light skipped: could not allocate a queue for {sources} sources");
        light.clear_block_light();
        return false;
    }

    for y in 0..CHUNK_HEIGHT {
        for z in 0..CHUNK_SIZE {
            for x in 0..CHUNK_SIZE {
                let idx = index_of(x, y, z);
                let emission = blocks[idx].light_emission();
                if emission > 0 {
                    light.data[idx].set_block_light(emission);
                    queue.push_back((x as u8, y as u8, z as u8));
                }
            }
        }
    }

    while let Some((x, y, z)) = queue.pop_front() {
        let current = light.data[index_of(x as usize, y as usize, z as usize)].block_light();
        if current <= 1 {
            continue;
        }
        let new_level = current - 1;

        for (dx, dy, dz) in NEIGHBORS_6 {
            let (nx, ny, nz) = (x as i32 + dx, y as i32 + dy, z as i32 + dz);
            if !in_bounds(nx, ny, nz) {
                continue;
            }
            let idx = index_of(nx as usize, ny as usize, nz as usize);
            if blocks[idx].is_opaque() || light.data[idx].block_light() >= new_level {
                continue;
            }
            light.data[idx].set_block_light(new_level);

            let additional = queue.len().max(64);
            if queue.len() == queue.capacity() && !reserve(&mut queue, additional) {
                tracing::warn!("block light skipped: BFS queue growth failed");
                light.clear_block_light();
                return false;
            }
            queue.push_back((nx as u8, ny as u8, nz as u8));
        }
    }
    true
}

/// Compute initial skylight and block light for a freshly generated chunk.
pub fn light_chunk(chunk: &mut Chunk) {
    let (blocks, light) = chunk.blocks_and_light_mut();
    light.clear();
    compute_skylight(blocks, light);
    propagate_block_light(blocks, light);
}
