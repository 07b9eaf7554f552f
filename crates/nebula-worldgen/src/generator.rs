//! The world generator: turns a seed and a chunk coordinate into blocks.
//!
//! Stages run in a fixed order per chunk: column metadata (from the region
//! cache), surface layers with caves and ores, decorations, then lighting.
//! Everything except the two caches is immutable after construction, so one
//! generator can be shared by any number of worker threads.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use nebula_config::{Config, WorldGenConfig};

use crate::biome::BiomeTable;
use crate::catalog::Catalog;
use crate::cave::{CaveCarver, CaveColumns};
use crate::chunk::{Block, CHUNK_AREA, CHUNK_HEIGHT, CHUNK_SIZE, Chunk, ChunkCoord};
use crate::column::{ColumnInfo, ColumnMeta, ColumnPipeline, ShapedColumn};
use crate::decoration::{DecorationPlacer, DecorationSite};
use crate::error::WorldGenError;
use crate::light::light_chunk;
use crate::lod::{LOD_TILE_SAMPLES, LodBuffer, LodCache};
use crate::ore::OreDistributor;
use crate::region::{GenRegion, RegionCache, RegionCoord, chunk_in_world, column_in_world};
use crate::seed::WorldSeed;
use crate::structure::StructuralClassifier;
use crate::surface::SurfaceBuilder;

/// Outcome of [`WorldGenerator::generate`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GenerationStatus {
    /// Every stage ran; the chunk is marked generated.
    Completed,
    /// The stop flag was observed; the chunk is not marked generated.
    Cancelled,
    /// The chunk lies beyond [`crate::WORLD_LIMIT`]; it is left empty and
    /// not marked generated.
    OutOfWorld,
}

/// Deterministic, thread-safe terrain generator.
pub struct WorldGenerator {
    config: WorldGenConfig,
    seed: WorldSeed,
    catalog: Catalog,
    pipeline: ColumnPipeline,
    surface: SurfaceBuilder,
    carver: CaveCarver,
    ores: OreDistributor,
    decorations: DecorationPlacer,
    regions: RegionCache,
    lod: LodCache,
    trace_timings: bool,
}

impl WorldGenerator {
    /// Build a generator with the built-in catalog.
    pub fn new(config: &WorldGenConfig) -> Result<Self, WorldGenError> {
        Self::with_catalog(config, Catalog::standard(&config.terrain))
    }

    /// Build a generator from a full [`Config`], honouring its debug settings.
    pub fn from_config(config: &Config) -> Result<Self, WorldGenError> {
        let mut generator = Self::new(&config.worldgen)?;
        generator.trace_timings = config.debug.trace_chunk_timings;
        Ok(generator)
    }

    /// Build a generator with a custom catalog. Config and catalog are both
    /// validated here; nothing is validated again during generation.
    pub fn with_catalog(config: &WorldGenConfig, catalog: Catalog) -> Result<Self, WorldGenError> {
        config.validate()?;
        catalog.validate(&config.terrain)?;

        let seed = WorldSeed::new(config.seed);
        let sea_level = config.terrain.sea_level;
        let generator = Self {
            seed,
            pipeline: ColumnPipeline::new(config),
            surface: SurfaceBuilder::new(sea_level),
            carver: CaveCarver::new(seed, config.caves.clone(), sea_level),
            ores: OreDistributor::new(seed, catalog.ores()),
            decorations: DecorationPlacer::new(
                seed,
                &config.decorations,
                sea_level,
                catalog.decorations(),
            ),
            regions: RegionCache::new(config.cache.region_capacity, config.cache.shards),
            lod: LodCache::new(config.cache.lod_radius, config.cache.recenter_distance),
            catalog,
            config: config.clone(),
            trace_timings: false,
        };
        tracing::info!(
            "world generator ready: seed {}, {} biomes, {} decorations, {} ores, {:?} selection",
            config.seed,
            generator.catalog.biomes().len(),
            generator.catalog.decorations().len(),
            generator.ores.ore_count(),
            generator.pipeline.strategy(),
        );
        Ok(generator)
    }

    pub fn seed(&self) -> u64 {
        self.seed.value()
    }

    pub fn config(&self) -> &WorldGenConfig {
        &self.config
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    fn table(&self) -> &BiomeTable {
        self.catalog.biomes()
    }

    fn region(&self, coord: RegionCoord) -> Arc<GenRegion> {
        self.regions
            .get_or_build(coord, || GenRegion::build(&self.pipeline, self.table(), coord))
    }

    /// Column metadata from a region, or sampled directly outside it.
    fn meta_in(&self, region: &GenRegion, x: i32, z: i32) -> ColumnMeta {
        match region.meta(x, z) {
            Some(meta) => *meta,
            None => self.pipeline.column_meta(self.table(), x, z),
        }
    }

    /// Fill `chunk` with terrain, caves, ores, decorations and light.
    ///
    /// `stop` is checked at every Z row. On cancellation the chunk keeps
    /// whatever was written so far and stays marked as not generated.
    pub fn generate(&self, chunk: &mut Chunk, stop: &AtomicBool) -> GenerationStatus {
        let start = Instant::now();
        chunk.reset();
        let coord = chunk.coord();
        if !chunk_in_world(coord) {
            tracing::warn!("chunk ({}, {}) is outside the world limit", coord.x, coord.z);
            return GenerationStatus::OutOfWorld;
        }
        let (x0, z0) = (coord.world_x(), coord.world_z());
        let region = self.region(RegionCoord::from_chunk(coord));
        if stop.load(Ordering::Relaxed) {
            return self.cancelled(coord);
        }

        let mut metas = Vec::with_capacity(CHUNK_AREA);
        let mut heights = [0; CHUNK_AREA];
        for lz in 0..CHUNK_SIZE {
            for lx in 0..CHUNK_SIZE {
                let meta = self.meta_in(&region, x0 + lx as i32, z0 + lz as i32);
                heights[lz * CHUNK_SIZE + lx] = meta.height;
                chunk.set_surface_height(lx, lz, meta.height);
                chunk.set_biome(lx, lz, meta.biome);
                metas.push(meta);
            }
        }

        let caves = self.config.caves.enabled.then(|| {
            let columns = CaveColumns::new(self.pipeline.sampler(), coord, heights);
            let worms = self.carver.worm_mask(
                self.pipeline.sampler(),
                self.pipeline.classifier(),
                coord,
                &columns,
            );
            (columns, worms)
        });
        if stop.load(Ordering::Relaxed) {
            return self.cancelled(coord);
        }

        let sea_level = self.config.terrain.sea_level;
        for lz in 0..CHUNK_SIZE {
            if stop.load(Ordering::Relaxed) {
                return self.cancelled(coord);
            }
            for lx in 0..CHUNK_SIZE {
                let meta = &metas[lz * CHUNK_SIZE + lx];
                let layers = self.surface.layers(meta, self.table());
                let top = meta.height.max(sea_level).min(CHUNK_HEIGHT as i32 - 1);
                let (wx, wz) = (x0 + lx as i32, z0 + lz as i32);
                for y in 0..=top {
                    let mut block = self.surface.block_at(y, meta.height, &layers);
                    if let Some((columns, worms)) = &caves
                        && block.is_terrain()
                        && self.carver.carves(
                            self.pipeline.sampler(),
                            worms.as_ref(),
                            columns,
                            coord,
                            lx,
                            y,
                            lz,
                        )
                    {
                        block = self.carver.fill_block(y, meta.height);
                    } else if block == Block::Stone && y < meta.height - 1 {
                        block = self
                            .ores
                            .sample_ore(wx, y, wz, meta.height)
                            .unwrap_or(Block::Stone);
                    }
                    if block != Block::Air {
                        chunk.set(lx, y as usize, lz, block);
                    }
                }
            }
        }

        if self.config.decorations.enabled {
            let site_at = |x: i32, z: i32| {
                let meta = self.meta_in(&region, x, z);
                let layers = self.surface.layers(&meta, self.table());
                Some(DecorationSite {
                    height: meta.height,
                    biome: meta.biome,
                    surface: layers.surface,
                    slope: meta.slope,
                    variant: meta.variant,
                    vegetation: meta.vegetation,
                })
            };
            if !self.decorations.decorate_chunk(
                chunk,
                self.catalog.decorations(),
                site_at,
                stop,
            ) {
                return self.cancelled(coord);
            }
        }

        light_chunk(chunk);
        chunk.set_generated(true);

        if self.trace_timings {
            tracing::trace!(
                "generated chunk ({}, {}) in {:.2} ms",
                coord.x,
                coord.z,
                start.elapsed().as_secs_f64() * 1000.0
            );
        }
        GenerationStatus::Completed
    }

    fn cancelled(&self, coord: ChunkCoord) -> GenerationStatus {
        tracing::debug!("generation of chunk ({}, {}) cancelled", coord.x, coord.z);
        GenerationStatus::Cancelled
    }

    /// Fill a coarse tile for distant terrain. No caves, decorations or light.
    ///
    /// The tile covers `[tile * span, (tile + 1) * span)` on each axis, where
    /// the span is [`crate::lod_tile_span`] of `lod_level`.
    pub fn generate_heightmap_only(
        &self,
        buffer: &mut LodBuffer,
        tile_x: i32,
        tile_z: i32,
        lod_level: u32,
    ) {
        buffer.prepare(tile_x, tile_z, lod_level);
        if !buffer.in_world() {
            return;
        }
        let level = buffer.level();
        let step = buffer.step();
        let (ox, oz) = buffer.origin();

        let mut grid: Option<Vec<ShapedColumn>> = None;
        for iz in 0..LOD_TILE_SAMPLES {
            for ix in 0..LOD_TILE_SAMPLES {
                let (x, z) = buffer.world_position(ix, iz);
                let info = self.lod.get_or_insert_with(x, z, level, || {
                    let grid = grid.get_or_insert_with(|| self.lod_grid(ox, oz, step, level));
                    self.lod_sample(grid, ix, iz, step)
                });
                buffer.set(ix, iz, info);
            }
        }
    }

    /// Shaped columns of a tile plus a one-sample border for slope.
    fn lod_grid(&self, ox: i32, oz: i32, step: i32, level: u32) -> Vec<ShapedColumn> {
        let side = LOD_TILE_SAMPLES as i32 + 2;
        let mut grid = Vec::with_capacity((side * side) as usize);
        for gz in -1..side - 1 {
            for gx in -1..side - 1 {
                grid.push(self.pipeline.shaped(ox + gx * step, oz + gz * step, level));
            }
        }
        grid
    }

    fn lod_sample(&self, grid: &[ShapedColumn], ix: usize, iz: usize, step: i32) -> ColumnInfo {
        let side = LOD_TILE_SAMPLES + 2;
        let at = |gx: usize, gz: usize| &grid[gz * side + gx];
        let (gx, gz) = (ix + 1, iz + 1);
        let column = at(gx, gz);
        let slope = StructuralClassifier::slope(
            column.shape.height,
            [
                at(gx + 1, gz).shape.height,
                at(gx - 1, gz).shape.height,
                at(gx, gz + 1).shape.height,
                at(gx, gz - 1).shape.height,
            ],
        ) / step;
        self.pipeline.lod_info(self.table(), column, slope)
    }

    /// Height, biome and climate of a world column, exactly as `generate`
    /// produces them.
    pub fn column_info(&self, x: i32, z: i32) -> ColumnInfo {
        if !column_in_world(x, z) {
            return ColumnInfo::default();
        }
        let region = self.region(RegionCoord::from_chunk(ChunkCoord::from_block(x, z)));
        ColumnInfo::from(&self.meta_in(&region, x, z))
    }

    /// Coarse sample from the LOD cache, or [`ColumnInfo::default`] if it is
    /// not cached.
    pub fn cached_lod_sample(&self, x: i32, z: i32, lod_level: u32) -> ColumnInfo {
        self.lod.peek(x, z, lod_level)
    }

    /// Recenter the LOD cache on the player if they moved far enough.
    pub fn maybe_recenter_cache(&self, player_x: f64, player_z: f64) -> bool {
        self.lod.maybe_recenter(player_x, player_z)
    }

    /// Regions currently held by the region cache.
    pub fn cached_regions(&self) -> usize {
        self.regions.len()
    }
}
