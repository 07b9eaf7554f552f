//! Per-column pipeline: noise sample, shape, slope, biome and coastal type.
//!
//! Both the region builder (which works on whole grids) and the single-column
//! query path go through these functions, so a column's metadata is the same
//! no matter which path produced it.

use nebula_config::{BiomeSelection, WorldGenConfig};

use crate::biome::{BiomeId, BiomeInput, BiomeTable, ClimateBiomeSelector};
use crate::sampler::{ColumnSample, NoiseSampler};
use crate::seed::WorldSeed;
use crate::structure::{CoastalSurfaceType, ColumnShape, StructuralClassifier};

/// Noise sample plus the shape derived from it.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ShapedColumn {
    pub sample: ColumnSample,
    pub shape: ColumnShape,
}

/// Everything later stages read about a column.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ColumnMeta {
    pub height: i32,
    pub slope: i32,
    pub is_ocean: bool,
    pub continentalness: f32,
    pub erosion: f32,
    pub temperature: f32,
    pub humidity: f32,
    pub river: f32,
    pub variant: f32,
    pub vegetation: f32,
    /// Climate biome before river and transition overrides.
    pub base_biome: BiomeId,
    pub biome: BiomeId,
    pub coastal: CoastalSurfaceType,
}

/// Public summary of a column for external queries.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ColumnInfo {
    pub height: i32,
    pub biome: BiomeId,
    pub is_ocean: bool,
    pub temperature: f32,
    pub humidity: f32,
    pub continentalness: f32,
}

impl From<&ColumnMeta> for ColumnInfo {
    fn from(meta: &ColumnMeta) -> Self {
        Self {
            height: meta.height,
            biome: meta.biome,
            is_ocean: meta.is_ocean,
            temperature: meta.temperature,
            humidity: meta.humidity,
            continentalness: meta.continentalness,
        }
    }
}

/// Shared column-level stages of the generator.
pub struct ColumnPipeline {
    sampler: NoiseSampler,
    classifier: StructuralClassifier,
    selector: ClimateBiomeSelector,
}

impl ColumnPipeline {
    pub fn new(config: &WorldGenConfig) -> Self {
        let seed = WorldSeed::new(config.seed);
        Self {
            sampler: NoiseSampler::new(seed, &config.terrain),
            classifier: StructuralClassifier::new(config.terrain.clone()),
            selector: ClimateBiomeSelector::new(
                seed,
                config.biomes.clone(),
                config.terrain.sea_level,
            ),
        }
    }

    pub fn sampler(&self) -> &NoiseSampler {
        &self.sampler
    }

    pub fn classifier(&self) -> &StructuralClassifier {
        &self.classifier
    }

    pub fn selector(&self) -> &ClimateBiomeSelector {
        &self.selector
    }

    /// Sample and shape one column.
    pub fn shaped(&self, x: i32, z: i32, reduction: u32) -> ShapedColumn {
        let sample = self.sampler.column(x, z, reduction);
        let shape = self.classifier.shape(&sample);
        ShapedColumn { sample, shape }
    }

    /// Slope of a column whose own height is already known, sampling its
    /// neighbours `step` blocks away.
    pub fn slope_at(&self, x: i32, z: i32, height: i32, step: i32, reduction: u32) -> i32 {
        let h = |dx: i32, dz: i32| {
            self.classifier
                .height_at(&self.sampler, x + dx * step, z + dz * step, reduction)
        };
        StructuralClassifier::slope(height, [h(1, 0), h(-1, 0), h(0, 1), h(0, -1)])
    }

    pub fn biome_input(&self, column: &ShapedColumn, slope: i32) -> BiomeInput {
        BiomeInput {
            temperature: column.sample.temperature,
            humidity: column.sample.humidity,
            height: column.shape.height,
            slope,
            continentalness: column.sample.continentalness,
            river: column.sample.river,
            is_ocean: column.shape.is_ocean,
        }
    }

    /// Climate biome of a shaped column under the full-resolution strategy.
    pub fn base_biome(&self, table: &BiomeTable, column: &ShapedColumn, slope: i32) -> BiomeId {
        let input = self.biome_input(column, slope);
        self.selector
            .base_biome(table, &input, self.selector.strategy())
    }

    /// Climate biome of any world column, sampled directly.
    pub fn base_biome_at(&self, table: &BiomeTable, x: i32, z: i32) -> BiomeId {
        let column = self.shaped(x, z, 0);
        let slope = self.slope_at(x, z, column.shape.height, 1, 0);
        self.base_biome(table, &column, slope)
    }

    /// Final metadata of a column given its base biome and a source of
    /// neighbouring base biomes.
    pub fn meta(
        &self,
        table: &BiomeTable,
        column: &ShapedColumn,
        slope: i32,
        base_biome: BiomeId,
        x: i32,
        z: i32,
        neighbor_base: impl FnMut(i32, i32) -> BiomeId,
    ) -> ColumnMeta {
        let input = self.biome_input(column, slope);
        let biome = self
            .selector
            .finalize(table, base_biome, &input, x, z, neighbor_base);
        let s = &column.sample;
        ColumnMeta {
            height: column.shape.height,
            slope,
            is_ocean: column.shape.is_ocean,
            continentalness: s.continentalness,
            erosion: s.erosion,
            temperature: s.temperature,
            humidity: s.humidity,
            river: s.river,
            variant: s.variant,
            vegetation: s.vegetation,
            base_biome,
            biome,
            coastal: self
                .classifier
                .coastal_type(&column.shape, slope, s.erosion, s.continentalness),
        }
    }

    /// Full metadata of one column, sampling everything it depends on.
    pub fn column_meta(&self, table: &BiomeTable, x: i32, z: i32) -> ColumnMeta {
        let column = self.shaped(x, z, 0);
        let slope = self.slope_at(x, z, column.shape.height, 1, 0);
        let base = self.base_biome(table, &column, slope);
        self.meta(table, &column, slope, base, x, z, |nx, nz| {
            self.base_biome_at(table, nx, nz)
        })
    }

    /// Coarse column for LOD tiles: reduced octaves, range scoring, no transitions.
    pub fn lod_info(&self, table: &BiomeTable, column: &ShapedColumn, slope: i32) -> ColumnInfo {
        let input = self.biome_input(column, slope);
        ColumnInfo {
            height: column.shape.height,
            biome: self.selector.select_lod(table, &input),
            is_ocean: column.shape.is_ocean,
            temperature: column.sample.temperature,
            humidity: column.sample.humidity,
            continentalness: column.sample.continentalness,
        }
    }

    /// Biome selection strategy used at full resolution.
    pub fn strategy(&self) -> BiomeSelection {
        self.selector.strategy()
    }
}
