//! Surface layering: which block sits at each Y of a column before caves.

use crate::biome::BiomeTable;
use crate::chunk::Block;
use crate::column::ColumnMeta;
use crate::structure::CoastalSurfaceType;

/// Land columns at least this steep and this far above sea level show bare stone.
const STEEP_SLOPE: i32 = 6;
const STEEP_MIN_ABOVE_SEA: i32 = 20;

/// Resolved layers of one column.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ColumnLayers {
    pub surface: Block,
    pub filler: Block,
    /// Filler layers directly below the surface block.
    pub filler_depth: i32,
}

/// Assigns surface, filler, stone, water and bedrock to columns.
pub struct SurfaceBuilder {
    sea_level: i32,
}

impl SurfaceBuilder {
    pub fn new(sea_level: i32) -> Self {
        Self { sea_level }
    }

    /// Surface and filler of a column.
    pub fn layers(&self, meta: &ColumnMeta, table: &BiomeTable) -> ColumnLayers {
        let layer = |surface, filler, filler_depth| ColumnLayers {
            surface,
            filler,
            filler_depth,
        };

        if meta.height < self.sea_level {
            let depth = self.sea_level - meta.height;
            return if meta.is_ocean {
                match depth {
                    ..=8 => layer(Block::Sand, Block::Sand, 3),
                    9..=20 => layer(Block::Clay, Block::Clay, 2),
                    _ => layer(Block::Gravel, Block::Gravel, 2),
                }
            } else {
                // Lake and river beds.
                match depth {
                    ..=2 => layer(Block::Dirt, Block::Dirt, 3),
                    3..=5 => layer(Block::Gravel, Block::Dirt, 2),
                    _ => layer(Block::Clay, Block::Clay, 2),
                }
            };
        }

        match meta.coastal {
            CoastalSurfaceType::SandBeach => return layer(Block::Sand, Block::Sand, 4),
            CoastalSurfaceType::GravelBeach => return layer(Block::Gravel, Block::Gravel, 3),
            CoastalSurfaceType::Cliff => return layer(Block::Stone, Block::Stone, 0),
            CoastalSurfaceType::None => {}
        }

        let def = table.get(meta.biome);
        if meta.slope >= STEEP_SLOPE
            && meta.height >= self.sea_level + STEEP_MIN_ABOVE_SEA
            && def.surface != Block::Snow
        {
            return layer(Block::Stone, Block::Stone, 0);
        }
        layer(def.surface, def.filler, def.filler_depth)
    }

    /// Block at `y` in a column with the given height and layers.
    pub fn block_at(&self, y: i32, height: i32, layers: &ColumnLayers) -> Block {
        if y == 0 {
            Block::Bedrock
        } else if y > height {
            if y <= self.sea_level { Block::Water } else { Block::Air }
        } else if y == height {
            layers.surface
        } else if y >= height - layers.filler_depth {
            layers.filler
        } else {
            Block::Stone
        }
    }
}
