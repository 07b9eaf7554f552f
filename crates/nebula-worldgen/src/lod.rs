//! Coarse height/biome tiles for distant terrain and their sample cache.
//!
//! A tile at LOD level `n` samples every `2 << n` blocks with `n` octaves
//! dropped from every detail field. Biomes come from range scoring with
//! the river override but no transitions.

use std::sync::{Mutex, MutexGuard, PoisonError};

use hashbrown::HashMap;

use crate::column::ColumnInfo;
use crate::region::WORLD_LIMIT;

/// Samples per tile side.
pub const LOD_TILE_SAMPLES: usize = 40;
/// Highest supported LOD level.
pub const MAX_LOD_LEVEL: u32 = 8;
/// Maximum coarse samples kept by the LOD cache.
pub const LOD_CACHE_MAX_ENTRIES: usize = 262_144;

/// Block distance between samples at a LOD level.
pub fn lod_step(level: u32) -> i32 {
    2 << level.min(MAX_LOD_LEVEL)
}

/// World span of one tile side at a LOD level.
pub fn lod_tile_span(level: u32) -> i32 {
    LOD_TILE_SAMPLES as i32 * lod_step(level)
}

/// One coarse tile, filled by the generator.
#[derive(Clone, Debug)]
pub struct LodBuffer {
    samples: Vec<ColumnInfo>,
    tile_x: i32,
    tile_z: i32,
    level: u32,
}

impl LodBuffer {
    pub fn new() -> Self {
        Self {
            samples: vec![ColumnInfo::default(); LOD_TILE_SAMPLES * LOD_TILE_SAMPLES],
            tile_x: 0,
            tile_z: 0,
            level: 0,
        }
    }

    pub(crate) fn prepare(&mut self, tile_x: i32, tile_z: i32, level: u32) {
        self.tile_x = tile_x;
        self.tile_z = tile_z;
        self.level = level.min(MAX_LOD_LEVEL);
        self.samples.fill(ColumnInfo::default());
    }

    pub(crate) fn set(&mut self, ix: usize, iz: usize, info: ColumnInfo) {
        self.samples[iz * LOD_TILE_SAMPLES + ix] = info;
    }

    /// Sample at tile-local indices.
    pub fn get(&self, ix: usize, iz: usize) -> &ColumnInfo {
        &self.samples[iz * LOD_TILE_SAMPLES + ix]
    }

    /// All samples, row-major by Z.
    pub fn samples(&self) -> &[ColumnInfo] {
        &self.samples
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn step(&self) -> i32 {
        lod_step(self.level)
    }

    /// World column of the first sample.
    pub fn origin(&self) -> (i32, i32) {
        let span = lod_tile_span(self.level);
        (self.tile_x.saturating_mul(span), self.tile_z.saturating_mul(span))
    }

    /// Whether the whole tile lies inside [`WORLD_LIMIT`]. Tiles outside
    /// it are left filled with the default sample.
    pub fn in_world(&self) -> bool {
        let span = i64::from(lod_tile_span(self.level));
        let limit = i64::from(WORLD_LIMIT);
        let inside = |tile: i32| {
            let first = i64::from(tile) * span;
            first >= -limit && first + span <= limit
        };
        inside(self.tile_x) && inside(self.tile_z)
    }

    /// World column of the sample at tile-local indices.
    pub fn world_position(&self, ix: usize, iz: usize) -> (i32, i32) {
        let (ox, oz) = self.origin();
        let step = self.step();
        (
            ox.saturating_add(ix as i32 * step),
            oz.saturating_add(iz as i32 * step),
        )
    }
}

impl Default for LodBuffer {
    fn default() -> Self {
        Self::new()
    }
}

type LodKey = (i32, i32, u32);

struct LodCacheInner {
    samples: HashMap<LodKey, ColumnInfo>,
    center: (f64, f64),
}

/// Coarse column cache around the player, keyed by sample position and level.
pub struct LodCache {
    inner: Mutex<LodCacheInner>,
    radius: i32,
    recenter_distance: f64,
}

impl LodCache {
    pub fn new(radius: i32, recenter_distance: f64) -> Self {
        Self {
            inner: Mutex::new(LodCacheInner {
                samples: HashMap::new(),
                center: (0.0, 0.0),
            }),
            radius,
            recenter_distance,
        }
    }

    fn lock(&self) -> MutexGuard<'_, LodCacheInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn in_range(&self, center: (f64, f64), x: i32, z: i32) -> bool {
        (x as f64 - center.0).abs() <= self.radius as f64
            && (z as f64 - center.1).abs() <= self.radius as f64
    }

    /// Cached sample, or [`ColumnInfo::default`] if it is absent or outside
    /// the cached area.
    pub fn peek(&self, x: i32, z: i32, level: u32) -> ColumnInfo {
        let inner = self.lock();
        if !self.in_range(inner.center, x, z) {
            return ColumnInfo::default();
        }
        inner.samples.get(&(x, z, level)).copied().unwrap_or_default()
    }

    /// Cached sample, computing and caching it when missing. Samples outside
    /// the cached area, or beyond the entry limit, are computed but not kept.
    pub fn get_or_insert_with(
        &self,
        x: i32,
        z: i32,
        level: u32,
        compute: impl FnOnce() -> ColumnInfo,
    ) -> ColumnInfo {
        if let Some(hit) = self.get(x, z, level) {
            return hit;
        }
        let info = compute();
        let mut inner = self.lock();
        if self.in_range(inner.center, x, z) && inner.samples.len() < LOD_CACHE_MAX_ENTRIES {
            inner.samples.insert((x, z, level), info);
        }
        info
    }

    /// Cached sample, if present.
    pub fn get(&self, x: i32, z: i32, level: u32) -> Option<ColumnInfo> {
        self.lock().samples.get(&(x, z, level)).copied()
    }

    /// Move the cached area to the player once they have moved far enough,
    /// dropping samples that fall outside. Returns whether it moved.
    pub fn maybe_recenter(&self, player_x: f64, player_z: f64) -> bool {
        let mut inner = self.lock();
        let (cx, cz) = inner.center;
        let moved = ((player_x - cx).powi(2) + (player_z - cz).powi(2)).sqrt();
        if moved < self.recenter_distance {
            return false;
        }
        inner.center = (player_x, player_z);
        let before = inner.samples.len();
        let radius = self.radius as f64;
        inner.samples.retain(|&(x, z, _), _| {
            (x as f64 - player_x).abs() <= radius && (z as f64 - player_z).abs() <= radius
        });
        tracing::info!(
            "recentered LOD cache at ({player_x:.0}, {player_z:.0}), kept {} of {before} samples",
            inner.samples.len()
        );
        true
    }

    pub fn len(&self) -> usize {
        self.lock().samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn center(&self) -> (f64, f64) {
        self.lock().center
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::biome::BiomeId;

    fn info(height: i32) -> ColumnInfo {
        ColumnInfo {
            height,
            biome: BiomeId::Plains,
            ..Default::default()
        }
    }

    #[test]
    fn test_lod_step_and_span() {
        assert_eq!(lod_step(0), 2);
        assert_eq!(lod_step(3), 16);
        assert_eq!(lod_tile_span(0), 80, "level 0 tile matches one region");
        assert_eq!(lod_step(50), lod_step(MAX_LOD_LEVEL));
    }

    #[test]
    fn test_buffer_positions() {
        let mut buf = LodBuffer::new();
        buf.prepare(-1, 2, 1);
        assert_eq!(buf.step(), 4);
        assert_eq!(buf.origin(), (-160, 320));
        assert_eq!(buf.world_position(3, 1), (-148, 324));
        buf.set(3, 1, info(70));
        assert_eq!(buf.get(3, 1).height, 70);
        assert_eq!(buf.samples().len(), LOD_TILE_SAMPLES * LOD_TILE_SAMPLES);
    }

    #[test]
    fn test_tiles_past_world_limit() {
        let mut buf = LodBuffer::new();
        buf.prepare(0, -1, 3);
        assert!(buf.in_world());
        let last = WORLD_LIMIT / lod_tile_span(3);
        buf.prepare(last - 1, 0, 3);
        assert!(buf.in_world(), "last whole tile before the limit");
        buf.prepare(i32::MAX, i32::MIN, MAX_LOD_LEVEL);
        assert!(!buf.in_world());
        assert_eq!(buf.origin(), (i32::MAX, i32::MIN), "origin saturates instead of overflowing");
        assert_eq!(buf.world_position(39, 39).0, i32::MAX);
    }

    #[test]
    fn test_cache_computes_once() {
        let cache = LodCache::new(1024, 256.0);
        let mut calls = 0;
        for _ in 0..3 {
            let got = cache.get_or_insert_with(10, 20, 1, || {
                calls += 1;
                info(77)
            });
            assert_eq!(got.height, 77);
        }
        assert_eq!(calls, 1);
        assert_eq!(cache.peek(10, 20, 1).height, 77);
        assert_eq!(cache.peek(10, 20, 2), ColumnInfo::default(), "levels are separate");
    }

    #[test]
    fn test_out_of_range_peek_is_sentinel() {
        let cache = LodCache::new(100, 50.0);
        let got = cache.get_or_insert_with(500, 0, 0, || info(90));
        assert_eq!(got.height, 90, "computed value still returned");
        assert!(cache.is_empty(), "out-of-range sample not cached");
        assert_eq!(cache.peek(500, 0, 0), ColumnInfo::default());
    }

    #[test]
    fn test_recenter_threshold_and_retain() {
        let cache = LodCache::new(100, 50.0);
        cache.get_or_insert_with(0, 0, 0, || info(1));
        cache.get_or_insert_with(90, 0, 0, || info(2));
        assert!(!cache.maybe_recenter(30.0, 0.0), "below recenter distance");
        assert!(cache.maybe_recenter(150.0, 0.0));
        assert_eq!(cache.center(), (150.0, 0.0));
        assert_eq!(cache.len(), 1, "sample at x = 0 dropped");
        assert_eq!(cache.peek(90, 0, 0).height, 2);
    }
}
