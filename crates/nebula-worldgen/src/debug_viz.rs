//! Debug maps of generated terrain.
//!
//! Provides [`DebugImage`] plus renderers for column maps (height or biome,
//! sampled through [`crate::WorldGenerator::column_info`] so they match the
//! terrain), coarse LOD tiles and vertical slices of generated chunks.

mod image;
mod renderers;

pub use self::image::{DebugImage, UNSAMPLED};
pub use renderers::{
    biome_color, block_color, height_to_color, render_chunk_slice, render_column_map,
    render_lod_tile,
};

/// What a column map shows.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MapMode {
    /// Elevation bands relative to sea level.
    #[default]
    Height,
    /// Biome map colours from the biome table.
    Biome,
}
