//! Renderers for column maps, LOD tiles and chunk slices.

use super::MapMode;
use super::image::DebugImage;
use crate::biome::{BiomeId, BiomeTable};
use crate::chunk::{Block, CHUNK_HEIGHT, CHUNK_SIZE, Chunk};
use crate::column::ColumnInfo;
use crate::generator::WorldGenerator;
use crate::lod::{LOD_TILE_SAMPLES, LodBuffer};

/// Render a `size` pixel map whose top-left pixel is world column `origin`,
/// one pixel per `step` blocks.
pub fn render_column_map(
    generator: &WorldGenerator,
    origin: (i32, i32),
    size: (u32, u32),
    step: i32,
    mode: MapMode,
) -> DebugImage {
    let (width, height) = size;
    let step = step.max(1);
    let sea_level = generator.config().terrain.sea_level;
    let table = generator.catalog().biomes();
    let mut image = DebugImage::new(width, height);
    for py in 0..height {
        for px in 0..width {
            let x = origin.0 + px as i32 * step;
            let z = origin.1 + py as i32 * step;
            let info = generator.column_info(x, z);
            image.put(px, py, info_color(&info, mode, sea_level, table));
        }
    }
    image
}

/// Render a coarse tile, one pixel per sample.
pub fn render_lod_tile(
    buffer: &LodBuffer,
    mode: MapMode,
    sea_level: i32,
    table: &BiomeTable,
) -> DebugImage {
    let side = LOD_TILE_SAMPLES as u32;
    let mut image = DebugImage::new(side, side);
    for iz in 0..LOD_TILE_SAMPLES {
        for ix in 0..LOD_TILE_SAMPLES {
            let color = info_color(buffer.get(ix, iz), mode, sea_level, table);
            image.put(ix as u32, iz as u32, color);
        }
    }
    image
}

/// Vertical X/Y slice of a chunk at local `z`; the top row is the world top.
pub fn render_chunk_slice(chunk: &Chunk, z: usize) -> DebugImage {
    let mut image = DebugImage::new(CHUNK_SIZE as u32, CHUNK_HEIGHT as u32);
    for y in 0..CHUNK_HEIGHT {
        for x in 0..CHUNK_SIZE {
            let row = (CHUNK_HEIGHT - 1 - y) as u32;
            image.put(x as u32, row, block_color(chunk.get(x, y, z)));
        }
    }
    image
}

fn info_color(info: &ColumnInfo, mode: MapMode, sea_level: i32, table: &BiomeTable) -> [u8; 3] {
    match mode {
        MapMode::Height => height_to_color(info.height, sea_level),
        MapMode::Biome => biome_color(info.biome, table),
    }
}

/// Elevation colour: deep water, shallow water, beach, lowland, highland, snow.
pub fn height_to_color(height: i32, sea_level: i32) -> [u8; 3] {
    let above = height - sea_level;
    match above {
        ..=-20 => [0, 0, 128],
        -19..=-1 => [30, 80, 200],
        0..=2 => [220, 200, 130],
        3..=40 => {
            let t = (above - 3) as f32 / 37.0;
            [
                (30.0 + t * 80.0) as u8,
                (160.0 - t * 40.0) as u8,
                (30.0 + t * 20.0) as u8,
            ]
        }
        41..=100 => {
            let t = (above - 41) as f32 / 59.0;
            [
                (110.0 + t * 40.0) as u8,
                (120.0 - t * 50.0) as u8,
                (50.0 + t * 20.0) as u8,
            ]
        }
        _ => {
            let t = ((above - 101) as f32 / 70.0).min(1.0);
            let base = (150.0 + t * 105.0) as u8;
            [base, base, base]
        }
    }
}

/// Map colour of a biome from its definition.
pub fn biome_color(biome: BiomeId, table: &BiomeTable) -> [u8; 3] {
    table.get(biome).map_color
}

/// Colour of a block in chunk slices.
pub fn block_color(block: Block) -> [u8; 3] {
    match block {
        Block::Air => [170, 210, 255],
        Block::Bedrock => [30, 30, 30],
        Block::Stone => [120, 120, 120],
        Block::Dirt | Block::Mud => [120, 85, 55],
        Block::Grass | Block::Podzol => [80, 150, 50],
        Block::Sand | Block::Sandstone => [220, 200, 130],
        Block::Gravel | Block::Clay => [150, 140, 135],
        Block::Snow => [245, 245, 250],
        Block::Water => [30, 80, 200],
        Block::Lava => [230, 90, 20],
        Block::CoalOre => [50, 50, 50],
        Block::IronOre => [180, 100, 60],
        Block::GoldOre => [255, 215, 0],
        Block::DiamondOre => [100, 200, 255],
        b if b.is_log() => [100, 70, 40],
        Block::Cactus => [40, 130, 40],
        _ => [40, 110, 40],
    }
}
