//! Generation regions and the sharded region cache.
//!
//! A [`GenRegion`] holds the final column metadata of a 5 x 5 chunk area
//! plus a margin ring wide enough for decoration footprints. It is built
//! from three nested grids: shaped columns (one extra ring for slope), base
//! biomes (the transition probe reach) and final metadata. Every cell goes
//! through the same [`ColumnPipeline`] functions as a single-column query.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use hashbrown::HashMap;

use crate::biome::{BiomeId, BiomeTable, TRANSITION_REACH};
use crate::chunk::{CHUNK_SIZE, ChunkCoord};
use crate::column::{ColumnMeta, ColumnPipeline, ShapedColumn};
use crate::seed::mix64;
use crate::structure::StructuralClassifier;

/// Chunks per region side.
pub const REGION_CHUNKS: i32 = 5;
/// Blocks per region side.
pub const REGION_SIZE: i32 = REGION_CHUNKS * CHUNK_SIZE as i32;
/// Extra metadata ring around the region, covering decoration reach.
pub const REGION_MARGIN: i32 = 8;

/// Largest absolute world column coordinate the generator serves. Region
/// grids and neighbour probes around a column stay inside `i32` below it.
pub const WORLD_LIMIT: i32 = 1 << 30;

/// Whether world column `(x, z)` lies inside [`WORLD_LIMIT`].
pub fn column_in_world(x: i32, z: i32) -> bool {
    (-WORLD_LIMIT..WORLD_LIMIT).contains(&x) && (-WORLD_LIMIT..WORLD_LIMIT).contains(&z)
}

/// Whether every column of `chunk` lies inside [`WORLD_LIMIT`].
pub fn chunk_in_world(chunk: ChunkCoord) -> bool {
    let limit = i64::from(WORLD_LIMIT);
    let inside = |c: i32| {
        let first = i64::from(c) * CHUNK_SIZE as i64;
        first >= -limit && first + CHUNK_SIZE as i64 <= limit
    };
    inside(chunk.x) && inside(chunk.z)
}

/// Region grid coordinate.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct RegionCoord {
    pub x: i32,
    pub z: i32,
}

impl RegionCoord {
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// Region containing a chunk.
    pub fn from_chunk(chunk: ChunkCoord) -> Self {
        Self {
            x: chunk.x.div_euclid(REGION_CHUNKS),
            z: chunk.z.div_euclid(REGION_CHUNKS),
        }
    }

    /// World X of the region's first block column.
    pub fn world_x(self) -> i32 {
        self.x * REGION_SIZE
    }

    /// World Z of the region's first block column.
    pub fn world_z(self) -> i32 {
        self.z * REGION_SIZE
    }
}

/// Square grid of cells addressed by world column.
struct Grid<T> {
    origin_x: i32,
    origin_z: i32,
    side: i32,
    cells: Vec<T>,
}

impl<T> Grid<T> {
    fn build(origin_x: i32, origin_z: i32, side: i32, mut f: impl FnMut(i32, i32) -> T) -> Self {
        let mut cells = Vec::with_capacity((side * side) as usize);
        for z in origin_z..origin_z + side {
            for x in origin_x..origin_x + side {
                cells.push(f(x, z));
            }
        }
        Self {
            origin_x,
            origin_z,
            side,
            cells,
        }
    }

    fn get(&self, x: i32, z: i32) -> Option<&T> {
        let (ix, iz) = (x - self.origin_x, z - self.origin_z);
        if !(0..self.side).contains(&ix) || !(0..self.side).contains(&iz) {
            return None;
        }
        self.cells.get((iz * self.side + ix) as usize)
    }
}

/// Column metadata for one region and its margin.
pub struct GenRegion {
    coord: RegionCoord,
    meta: Grid<ColumnMeta>,
}

impl GenRegion {
    /// Sample, classify and select biomes for every column of the region.
    pub fn build(pipeline: &ColumnPipeline, table: &BiomeTable, coord: RegionCoord) -> Self {
        let meta_side = REGION_SIZE + 2 * REGION_MARGIN;
        let (mx, mz) = (coord.world_x() - REGION_MARGIN, coord.world_z() - REGION_MARGIN);

        let base_side = meta_side + 2 * TRANSITION_REACH;
        let (bx, bz) = (mx - TRANSITION_REACH, mz - TRANSITION_REACH);

        let shaped = Grid::build(bx - 1, bz - 1, base_side + 2, |x, z| {
            pipeline.shaped(x, z, 0)
        });

        // Every cell of the inner grids has its four neighbours inside `shaped`.
        let column = |x: i32, z: i32| -> (ShapedColumn, i32) {
            let col = shaped.get(x, z).copied().unwrap_or_else(|| pipeline.shaped(x, z, 0));
            let h = |x, z| {
                shaped
                    .get(x, z)
                    .map(|c| c.shape.height)
                    .unwrap_or_else(|| pipeline.shaped(x, z, 0).shape.height)
            };
            let slope = StructuralClassifier::slope(
                col.shape.height,
                [h(x + 1, z), h(x - 1, z), h(x, z + 1), h(x, z - 1)],
            );
            (col, slope)
        };

        let base = Grid::build(bx, bz, base_side, |x, z| {
            let (col, slope) = column(x, z);
            pipeline.base_biome(table, &col, slope)
        });

        let meta = Grid::build(mx, mz, meta_side, |x, z| {
            let (col, slope) = column(x, z);
            let own = base.get(x, z).copied().unwrap_or(BiomeId::default());
            pipeline.meta(table, &col, slope, own, x, z, |nx, nz| match base.get(nx, nz) {
                Some(&b) => b,
                None => pipeline.base_biome_at(table, nx, nz),
            })
        });

        tracing::debug!(
            "built region ({}, {}) with {} columns",
            coord.x,
            coord.z,
            meta.cells.len()
        );
        Self { coord, meta }
    }

    pub fn coord(&self) -> RegionCoord {
        self.coord
    }

    /// Metadata of a world column, if it lies inside the region or its margin.
    pub fn meta(&self, x: i32, z: i32) -> Option<&ColumnMeta> {
        self.meta.get(x, z)
    }
}

struct CacheEntry {
    region: Arc<GenRegion>,
    last_used: u64,
}

struct LruShard {
    entries: HashMap<RegionCoord, CacheEntry>,
}

impl LruShard {
    fn evict_to(&mut self, capacity: usize) {
        while self.entries.len() > capacity {
            let Some(oldest) = self
                .entries
                .iter()
                .min_by_key(|(_, e)| e.last_used)
                .map(|(k, _)| *k)
            else {
                break;
            };
            self.entries.remove(&oldest);
        }
    }
}

/// Sharded least-recently-used cache of generation regions.
///
/// Entries are handed out as `Arc`s, so evicting a region never frees it
/// while a generator is still reading it.
pub struct RegionCache {
    shards: Vec<Mutex<LruShard>>,
    shard_capacity: usize,
    tick: AtomicU64,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl RegionCache {
    /// `capacity` is split evenly across `shards` (each shard holds at least one region).
    pub fn new(capacity: usize, shards: usize) -> Self {
        let shards = shards.max(1);
        Self {
            shards: (0..shards)
                .map(|_| {
                    Mutex::new(LruShard {
                        entries: HashMap::new(),
                    })
                })
                .collect(),
            shard_capacity: capacity.div_ceil(shards).max(1),
            tick: AtomicU64::new(0),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    fn shard(&self, coord: RegionCoord) -> MutexGuard<'_, LruShard> {
        let h = mix64(((coord.x as u32 as u64) << 32) | coord.z as u32 as u64);
        let index = (h % self.shards.len() as u64) as usize;
        // A panic mid-update leaves the map itself consistent.
        self.shards[index]
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn next_tick(&self) -> u64 {
        self.tick.fetch_add(1, Ordering::Relaxed)
    }

    /// Cached region, refreshing its recency.
    pub fn get(&self, coord: RegionCoord) -> Option<Arc<GenRegion>> {
        let tick = self.next_tick();
        let mut shard = self.shard(coord);
        shard.entries.get_mut(&coord).map(|entry| {
            entry.last_used = tick;
            Arc::clone(&entry.region)
        })
    }

    /// Cached region, or build and insert it.
    ///
    /// `build` runs without holding the shard lock. If another thread
    /// inserts the same region meanwhile, its value is kept and returned.
    pub fn get_or_build(
        &self,
        coord: RegionCoord,
        build: impl FnOnce() -> GenRegion,
    ) -> Arc<GenRegion> {
        if let Some(region) = self.get(coord) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return region;
        }
        self.misses.fetch_add(1, Ordering::Relaxed);

        let built = Arc::new(build());
        let tick = self.next_tick();
        let mut shard = self.shard(coord);
        if let Some(existing) = shard.entries.get_mut(&coord) {
            existing.last_used = tick;
            return Arc::clone(&existing.region);
        }
        shard.entries.insert(
            coord,
            CacheEntry {
                region: Arc::clone(&built),
                last_used: tick,
            },
        );
        shard.evict_to(self.shard_capacity);
        built
    }

    /// Number of cached regions.
    pub fn len(&self) -> usize {
        self.shards
            .iter()
            .map(|s| s.lock().unwrap_or_else(PoisonError::into_inner).entries.len())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Upper bound on cached regions.
    pub fn capacity(&self) -> usize {
        self.shard_capacity * self.shards.len()
    }

    /// `(hits, misses)` since construction.
    pub fn stats(&self) -> (u64, u64) {
        (
            self.hits.load(Ordering::Relaxed),
            self.misses.load(Ordering::Relaxed),
        )
    }

    pub fn clear(&self) {
        for shard in &self.shards {
            shard
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .entries
                .clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nebula_config::WorldGenConfig;

    fn setup() -> (ColumnPipeline, BiomeTable) {
        let config = WorldGenConfig::default();
        (
            ColumnPipeline::new(&config),
            BiomeTable::standard(&config.terrain),
        )
    }

    #[test]
    fn test_region_coord_from_chunk() {
        assert_eq!(RegionCoord::from_chunk(ChunkCoord::new(0, 4)), RegionCoord::new(0, 0));
        assert_eq!(RegionCoord::from_chunk(ChunkCoord::new(5, -1)), RegionCoord::new(1, -1));
        assert_eq!(RegionCoord::from_chunk(ChunkCoord::new(-5, -6)), RegionCoord::new(-1, -2));
        assert_eq!(RegionCoord::new(-1, 2).world_x(), -80);
        assert_eq!(RegionCoord::new(-1, 2).world_z(), 160);
    }

    #[test]
    fn test_world_limit_checks() {
        assert!(column_in_world(0, 0));
        assert!(column_in_world(-WORLD_LIMIT, WORLD_LIMIT - 1));
        assert!(!column_in_world(WORLD_LIMIT, 0));
        assert!(!column_in_world(0, i32::MIN));
        let last = WORLD_LIMIT / CHUNK_SIZE as i32;
        assert!(chunk_in_world(ChunkCoord::new(last - 1, -last)));
        assert!(!chunk_in_world(ChunkCoord::new(last, 0)));
        assert!(!chunk_in_world(ChunkCoord::new(0, i32::MIN)));
    }

    #[test]
    fn test_region_meta_matches_direct_path() {
        let (p, table) = setup();
        let region = GenRegion::build(&p, &table, RegionCoord::new(0, 0));
        for (x, z) in [(0, 0), (79, 79), (-8, 40), (87, -8), (33, 51)] {
            let cached = region.meta(x, z).copied();
            assert_eq!(cached, Some(p.column_meta(&table, x, z)), "column ({x}, {z})");
        }
        assert!(region.meta(-9, 0).is_none(), "outside the margin");
        assert!(region.meta(0, 88).is_none(), "outside the margin");
    }

    #[test]
    fn test_shared_edge_agrees_between_regions() {
        let (p, table) = setup();
        let a = GenRegion::build(&p, &table, RegionCoord::new(0, 0));
        let b = GenRegion::build(&p, &table, RegionCoord::new(0, 1));
        // Both regions cover rows 72..88 through their margins.
        for x in (0..80).step_by(7) {
            for z in [79, 80] {
                assert_eq!(a.meta(x, z), b.meta(x, z), "column ({x}, {z})");
            }
        }
    }

    fn tiny_region(coord: RegionCoord) -> GenRegion {
        GenRegion {
            coord,
            meta: Grid::build(0, 0, 1, |_, _| ColumnMeta::default()),
        }
    }

    #[test]
    fn test_cache_hit_returns_same_region() {
        let cache = RegionCache::new(4, 2);
        let a = cache.get_or_build(RegionCoord::new(1, 2), || tiny_region(RegionCoord::new(1, 2)));
        let b = cache.get_or_build(RegionCoord::new(1, 2), || panic!("should be cached"));
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(cache.stats(), (1, 1));
    }

    #[test]
    fn test_cache_capacity_bounded() {
        let cache = RegionCache::new(8, 4);
        for i in 0..100 {
            let c = RegionCoord::new(i, -i);
            cache.get_or_build(c, || tiny_region(c));
            assert!(cache.len() <= cache.capacity(), "cache grew past capacity");
        }
        assert!(!cache.is_empty());
    }

    #[test]
    fn test_least_recently_used_evicted_first() {
        let cache = RegionCache::new(2, 1);
        let (a, b, c) = (RegionCoord::new(0, 0), RegionCoord::new(1, 0), RegionCoord::new(2, 0));
        cache.get_or_build(a, || tiny_region(a));
        cache.get_or_build(b, || tiny_region(b));
        assert!(cache.get(a).is_some());
        cache.get_or_build(c, || tiny_region(c));
        assert!(cache.get(a).is_some(), "recently used region kept");
        assert!(cache.get(b).is_none(), "least recently used region evicted");
    }

    #[test]
    fn test_evicted_region_stays_readable() {
        let cache = RegionCache::new(1, 1);
        let a = RegionCoord::new(0, 0);
        let held = cache.get_or_build(a, || tiny_region(a));
        let b = RegionCoord::new(9, 9);
        cache.get_or_build(b, || tiny_region(b));
        assert!(cache.get(a).is_none());
        assert_eq!(held.coord(), a);
    }

    #[test]
    fn test_concurrent_builds_agree() {
        let cache = RegionCache::new(4, 2);
        let c = RegionCoord::new(3, 3);
        let regions: Vec<Arc<GenRegion>> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..4)
                .map(|_| s.spawn(|| cache.get_or_build(c, || tiny_region(c))))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        let cached = cache.get(c).unwrap();
        assert_eq!(cache.len(), 1);
        // Callers that lost the race get the first inserted value back.
        for region in &regions {
            assert!(Arc::ptr_eq(region, &cached), "duplicate region handed out");
        }
    }
}
