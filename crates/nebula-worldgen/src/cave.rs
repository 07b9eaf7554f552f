//! Cave carving: worm tunnels plus 3D noise cavities.
//!
//! Worms are spawned per source chunk from a ChaCha8 stream and walked with
//! noise steering. A target chunk replays every worm whose source lies within
//! reach, so a tunnel crossing a chunk border is carved identically on both
//! sides no matter which chunk is generated first. Each worm draws its own
//! seed from the source stream, so skipping a worm that cannot reach the
//! target never changes the others.
//!
//! Carving is gated per column by a 2D region value and never happens at
//! Y = 0 or within `min_surface_depth` of the surface.

use glam::Vec3;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use nebula_config::CaveConfig;

use crate::chunk::{Block, CHUNK_AREA, CHUNK_HEIGHT, CHUNK_SIZE, CHUNK_VOLUME, ChunkCoord, index_of};
use crate::noise_field::smoothstep;
use crate::sampler::{Field, NoiseSampler};
use crate::seed::{WorldSeed, chunk_rng, det_cos, det_sin, offsets};
use crate::structure::StructuralClassifier;

/// How strongly steering noise bends the worm each step.
const STEER_STRENGTH: f32 = 0.35;
/// Chance per step of a radius change.
const RADIUS_CHANGE_CHANCE: f32 = 0.08;
/// Steering samples are taken at these offsets so each axis gets independent noise.
const STEER_OFFSETS: [Vec3; 3] = [
    Vec3::new(0.0, 0.0, 0.0),
    Vec3::new(101.3, 57.1, 13.7),
    Vec3::new(-43.9, 211.5, 77.3),
];

/// Per-column inputs of the target chunk.
pub struct CaveColumns {
    heights: [i32; CHUNK_AREA],
    region: [f32; CHUNK_AREA],
}

impl CaveColumns {
    /// Sample the region gate for every column of `coord`.
    pub fn new(sampler: &NoiseSampler, coord: ChunkCoord, heights: [i32; CHUNK_AREA]) -> Self {
        let mut region = [0.0; CHUNK_AREA];
        for lz in 0..CHUNK_SIZE {
            for lx in 0..CHUNK_SIZE {
                region[lz * CHUNK_SIZE + lx] = sampler.cave_region(
                    coord.world_x() + lx as i32,
                    coord.world_z() + lz as i32,
                );
            }
        }
        Self { heights, region }
    }

    pub fn height(&self, lx: usize, lz: usize) -> i32 {
        self.heights[lz * CHUNK_SIZE + lx]
    }

    pub fn region(&self, lx: usize, lz: usize) -> f32 {
        self.region[lz * CHUNK_SIZE + lx]
    }
}

/// One bit per voxel of a chunk: set where a worm carved.
pub struct CaveMask {
    bits: Vec<u64>,
}

impl CaveMask {
    /// Allocate an empty mask, or `None` if the allocation fails.
    pub fn try_new() -> Option<Self> {
        let words = CHUNK_VOLUME / 64;
        let mut bits = Vec::new();
        bits.try_reserve_exact(words).ok()?;
        bits.resize(words, 0);
        Some(Self { bits })
    }

    pub fn get(&self, x: usize, y: usize, z: usize) -> bool {
        let i = index_of(x, y, z);
        self.bits[i / 64] & (1 << (i % 64)) != 0
    }

    fn set(&mut self, x: usize, y: usize, z: usize) {
        let i = index_of(x, y, z);
        self.bits[i / 64] |= 1 << (i % 64);
    }

    /// Number of carved voxels.
    pub fn count(&self) -> usize {
        self.bits.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Whether every voxel set in `other` is also set here.
    pub fn contains_all(&self, other: &CaveMask) -> bool {
        self.bits
            .iter()
            .zip(&other.bits)
            .all(|(a, b)| a & b == *b)
    }
}

/// A tunnel-carving agent.
pub struct Worm {
    pub position: Vec3,
    pub direction: Vec3,
    pub radius: f32,
    pub steps: u32,
    rng: ChaCha8Rng,
}

/// Carves worms and cavities into chunks.
pub struct CaveCarver {
    seed: WorldSeed,
    config: CaveConfig,
    sea_level: i32,
    reach: f32,
    source_radius: i32,
}

impl CaveCarver {
    pub fn new(seed: WorldSeed, config: CaveConfig, sea_level: i32) -> Self {
        let reach =
            config.worm_max_steps as f32 * config.worm_step_length + config.worm_max_radius + 1.0;
        let source_radius = (reach / CHUNK_SIZE as f32).ceil() as i32;
        Self {
            seed,
            config,
            sea_level,
            reach,
            source_radius,
        }
    }

    pub fn config(&self) -> &CaveConfig {
        &self.config
    }

    /// Farthest distance, in blocks, a worm can carve from its spawn point.
    pub fn reach(&self) -> f32 {
        self.reach
    }

    /// Source chunks within this Chebyshev radius may carve into a target.
    pub fn source_radius(&self) -> i32 {
        self.source_radius
    }

    /// Whether a voxel may be carved at all.
    pub fn can_carve(&self, y: i32, height: i32, region: f32) -> bool {
        region >= self.config.region_threshold
            && y >= 1
            && y <= height - self.config.min_surface_depth
    }

    /// What a carved voxel becomes.
    pub fn fill_block(&self, y: i32, height: i32) -> Block {
        if height < self.sea_level && y <= self.sea_level {
            Block::Water
        } else if y <= self.config.lava_level {
            Block::Lava
        } else {
            Block::Air
        }
    }

    /// Noise cavity test for a voxel that already passed [`Self::can_carve`].
    pub fn is_cavity(&self, sampler: &NoiseSampler, x: i32, y: i32, z: i32, region: f32) -> bool {
        let c = &self.config;
        let yf = y as f32;
        let band = smoothstep(c.cavity_y_min as f32, c.cavity_y_min as f32 + 8.0, yf)
            * (1.0 - smoothstep(c.cavity_y_max as f32 - 12.0, c.cavity_y_max as f32, yf));
        if band <= 0.0 {
            return false;
        }
        let openness = ((region - c.region_threshold) / (1.0 - c.region_threshold)).clamp(0.0, 1.0);
        let threshold = c.cavity_threshold - 0.2 * openness;
        let n = sampler.sample_3d(Field::CaveCavity, x as f64, y as f64, z as f64, 0);
        n * band > threshold
    }

    /// Worms spawned by one source chunk. Pure in `(seed, source)`.
    pub fn spawn_worms(
        &self,
        sampler: &NoiseSampler,
        classifier: &StructuralClassifier,
        source: ChunkCoord,
    ) -> Vec<Worm> {
        let c = &self.config;
        let mut rng = chunk_rng(self.seed, offsets::WORM_SPAWN, source.x, source.z);
        if c.max_worms_per_chunk == 0 || rng.random::<f32>() >= c.worm_chance {
            return Vec::new();
        }
        let count = rng.random_range(1..=c.max_worms_per_chunk);

        let surface = classifier.height_at(
            sampler,
            source.world_x() + CHUNK_SIZE as i32 / 2,
            source.world_z() + CHUNK_SIZE as i32 / 2,
            0,
        );
        let ceiling = c
            .worm_y_max
            .min(surface - c.min_surface_depth - c.worm_max_radius.ceil() as i32);

        let mut worms = Vec::new();
        for _ in 0..count {
            let mut wrng = ChaCha8Rng::seed_from_u64(rng.random());
            if ceiling <= c.worm_y_min {
                continue;
            }
            let position = Vec3::new(
                source.world_x() as f32 + wrng.random_range(0.0..CHUNK_SIZE as f32),
                wrng.random_range(c.worm_y_min as f32..ceiling as f32),
                source.world_z() as f32 + wrng.random_range(0.0..CHUNK_SIZE as f32),
            );
            let yaw = wrng.random_range(0.0..std::f32::consts::TAU);
            let pitch = wrng.random_range(-0.25f32..0.25);
            let direction = Vec3::new(
                det_cos(yaw) * det_cos(pitch),
                det_sin(pitch),
                det_sin(yaw) * det_cos(pitch),
            );
            let radius = wrng.random_range(c.worm_min_radius..=c.worm_max_radius);
            let steps = wrng.random_range(c.worm_min_steps..=c.worm_max_steps);
            worms.push(Worm {
                position,
                direction,
                radius,
                steps,
                rng: wrng,
            });
        }
        worms
    }

    /// Walk a worm, carving every step that overlaps `target` into `mask`.
    pub fn carve_worm(
        &self,
        sampler: &NoiseSampler,
        mut worm: Worm,
        target: ChunkCoord,
        columns: &CaveColumns,
        mask: &mut CaveMask,
    ) {
        let c = &self.config;
        let min = Vec3::new(target.world_x() as f32, 0.0, target.world_z() as f32);
        let max = min + Vec3::new(CHUNK_SIZE as f32, CHUNK_HEIGHT as f32, CHUNK_SIZE as f32);

        // Worms that start out of reach never touch the target.
        let nearest = worm.position.clamp(min, max);
        if nearest.distance(worm.position) > self.reach {
            return;
        }

        let y_lo = c.worm_y_min as f32;
        let y_hi = c.worm_y_max as f32;
        for _ in 0..worm.steps {
            let r = worm.radius;
            if worm.position.x + r >= min.x
                && worm.position.x - r < max.x
                && worm.position.z + r >= min.z
                && worm.position.z - r < max.z
            {
                self.carve_sphere(worm.position, r, target, columns, mask);
            }

            worm.position += worm.direction * c.worm_step_length;
            worm.position.y = worm.position.y.clamp(y_lo, y_hi);

            let p = worm.position;
            let steer = |o: Vec3| {
                sampler.sample_3d(
                    Field::WormSteer,
                    (p.x + o.x) as f64,
                    (p.y + o.y) as f64,
                    (p.z + o.z) as f64,
                    0,
                )
            };
            let bend = Vec3::new(
                steer(STEER_OFFSETS[0]),
                steer(STEER_OFFSETS[1]),
                steer(STEER_OFFSETS[2]),
            );
            let mut dir = worm.direction + bend * STEER_STRENGTH;
            dir.y *= 1.0 - c.vertical_damping;
            if p.y <= y_lo + r + 2.0 && dir.y < 0.0 {
                dir.y = -dir.y * 0.5;
            } else if p.y >= y_hi - r - 2.0 && dir.y > 0.0 {
                dir.y = -dir.y * 0.5;
            }
            worm.direction = dir.try_normalize().unwrap_or(worm.direction);

            if worm.rng.random::<f32>() < RADIUS_CHANGE_CHANCE {
                let delta = worm.rng.random_range(-0.4f32..0.4);
                worm.radius = (worm.radius + delta).clamp(c.worm_min_radius, c.worm_max_radius);
            }
        }
    }

    fn carve_sphere(
        &self,
        center: Vec3,
        radius: f32,
        target: ChunkCoord,
        columns: &CaveColumns,
        mask: &mut CaveMask,
    ) {
        let x0 = target.world_x();
        let z0 = target.world_z();
        let lx_min = ((center.x - radius).floor() as i32 - x0).max(0);
        let lx_max = ((center.x + radius).ceil() as i32 - x0).min(CHUNK_SIZE as i32 - 1);
        let lz_min = ((center.z - radius).floor() as i32 - z0).max(0);
        let lz_max = ((center.z + radius).ceil() as i32 - z0).min(CHUNK_SIZE as i32 - 1);
        let y_min = ((center.y - radius).floor() as i32).max(1);
        let y_max = ((center.y + radius).ceil() as i32).min(CHUNK_HEIGHT as i32 - 1);
        let r2 = radius * radius;

        for lz in lz_min..=lz_max {
            for lx in lx_min..=lx_max {
                let (ux, uz) = (lx as usize, lz as usize);
                let height = columns.height(ux, uz);
                let region = columns.region(ux, uz);
                let dx = (x0 + lx) as f32 + 0.5 - center.x;
                let dz = (z0 + lz) as f32 + 0.5 - center.z;
                for y in y_min..=y_max {
                    let dy = y as f32 + 0.5 - center.y;
                    if dx * dx + dy * dy + dz * dz <= r2 && self.can_carve(y, height, region) {
                        mask.set(ux, y as usize, uz);
                    }
                }
            }
        }
    }

    /// Carve every worm whose source chunk is within reach of `target`.
    ///
    /// Returns `None` when the mask cannot be allocated; the caller then
    /// falls back to cavities only.
    pub fn worm_mask(
        &self,
        sampler: &NoiseSampler,
        classifier: &StructuralClassifier,
        target: ChunkCoord,
        columns: &CaveColumns,
    ) -> Option<CaveMask> {
        let Some(mut mask) = CaveMask::try_new() else {
            tracing::warn!("chunk {target:?}: worm mask allocation failed, carving cavities only");
            return None;
        };
        let r = self.source_radius;
        for sz in target.z - r..=target.z + r {
            for sx in target.x - r..=target.x + r {
                let source = ChunkCoord::new(sx, sz);
                for worm in self.spawn_worms(sampler, classifier, source) {
                    self.carve_worm(sampler, worm, target, columns, &mut mask);
                }
            }
        }
        Some(mask)
    }

    /// Mask of only the worms spawned by `source`, carved into `target`.
    pub fn source_mask(
        &self,
        sampler: &NoiseSampler,
        classifier: &StructuralClassifier,
        source: ChunkCoord,
        target: ChunkCoord,
        columns: &CaveColumns,
    ) -> Option<CaveMask> {
        let mut mask = CaveMask::try_new()?;
        for worm in self.spawn_worms(sampler, classifier, source) {
            self.carve_worm(sampler, worm, target, columns, &mut mask);
        }
        Some(mask)
    }

    /// Whether the voxel at local `(lx, y, lz)` of `target` is carved.
    pub fn carves(
        &self,
        sampler: &NoiseSampler,
        worms: Option<&CaveMask>,
        columns: &CaveColumns,
        target: ChunkCoord,
        lx: usize,
        y: i32,
        lz: usize,
    ) -> bool {
        let height = columns.height(lx, lz);
        let region = columns.region(lx, lz);
        if !self.can_carve(y, height, region) {
            return false;
        }
        if worms.is_some_and(|m| m.get(lx, y as usize, lz)) {
            return true;
        }
        self.is_cavity(
            sampler,
            target.world_x() + lx as i32,
            y,
            target.world_z() + lz as i32,
            region,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nebula_config::TerrainConfig;

    struct Setup {
        sampler: NoiseSampler,
        classifier: StructuralClassifier,
    }

    fn setup(seed: u64) -> Setup {
        let terrain = TerrainConfig::default();
        Setup {
            sampler: NoiseSampler::new(WorldSeed::new(seed), &terrain),
            classifier: StructuralClassifier::new(terrain),
        }
    }

    fn columns_for(s: &Setup, coord: ChunkCoord) -> CaveColumns {
        let mut heights = [0; CHUNK_AREA];
        for lz in 0..CHUNK_SIZE {
            for lx in 0..CHUNK_SIZE {
                heights[lz * CHUNK_SIZE + lx] = s.classifier.height_at(
                    &s.sampler,
                    coord.world_x() + lx as i32,
                    coord.world_z() + lz as i32,
                    0,
                );
            }
        }
        CaveColumns::new(&s.sampler, coord, heights)
    }

    fn eager_config() -> CaveConfig {
        CaveConfig {
            worm_chance: 1.0,
            region_threshold: 0.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_source_radius_covers_reach() {
        let carver = CaveCarver::new(WorldSeed::new(1), CaveConfig::default(), 64);
        assert!(carver.source_radius() as f32 * CHUNK_SIZE as f32 >= carver.reach());
    }

    #[test]
    fn test_can_carve_protects_surface_and_bedrock() {
        let carver = CaveCarver::new(WorldSeed::new(1), CaveConfig::default(), 64);
        let depth = CaveConfig::default().min_surface_depth;
        assert!(!carver.can_carve(0, 80, 1.0), "bedrock row is never carved");
        assert!(!carver.can_carve(80 - depth + 1, 80, 1.0));
        assert!(carver.can_carve(80 - depth, 80, 1.0));
        assert!(!carver.can_carve(30, 80, 0.0), "closed region");
    }

    #[test]
    fn test_fill_block() {
        let carver = CaveCarver::new(WorldSeed::new(1), CaveConfig::default(), 64);
        assert_eq!(carver.fill_block(5, 80), Block::Lava);
        assert_eq!(carver.fill_block(30, 80), Block::Air);
        assert_eq!(carver.fill_block(30, 50), Block::Water, "under an ocean floor");
        assert_eq!(carver.fill_block(5, 30), Block::Water, "water wins below lava level");
    }

    #[test]
    fn test_spawn_is_deterministic() {
        let s = setup(3);
        let carver = CaveCarver::new(WorldSeed::new(3), eager_config(), 64);
        let a = carver.spawn_worms(&s.sampler, &s.classifier, ChunkCoord::new(2, -4));
        let b = carver.spawn_worms(&s.sampler, &s.classifier, ChunkCoord::new(2, -4));
        assert_eq!(a.len(), b.len());
        for (wa, wb) in a.iter().zip(&b) {
            assert_eq!(wa.position, wb.position);
            assert_eq!(wa.direction, wb.direction);
            assert_eq!(wa.steps, wb.steps);
        }
    }

    #[test]
    fn test_worm_mask_respects_protection() {
        let s = setup(5);
        let carver = CaveCarver::new(WorldSeed::new(5), eager_config(), 64);
        let coord = ChunkCoord::new(0, 0);
        let columns = columns_for(&s, coord);
        let mask = carver
            .worm_mask(&s.sampler, &s.classifier, coord, &columns)
            .unwrap();
        let depth = carver.config().min_surface_depth;
        for lz in 0..CHUNK_SIZE {
            for lx in 0..CHUNK_SIZE {
                let h = columns.height(lx, lz);
                assert!(!mask.get(lx, 0, lz));
                for y in (h - depth + 1).max(0)..CHUNK_HEIGHT as i32 {
                    assert!(!mask.get(lx, y as usize, lz), "carved at y={y} under surface {h}");
                }
            }
        }
    }

    #[test]
    fn test_worm_crossing_border_is_carved_in_neighbour() {
        // Find a seed where a worm from (5, 5) tunnels into (5, 6).
        let source = ChunkCoord::new(5, 5);
        let target = ChunkCoord::new(5, 6);
        let mut found = false;
        for seed in 0..64 {
            let s = setup(seed);
            let carver = CaveCarver::new(WorldSeed::new(seed), eager_config(), 64);
            let columns = columns_for(&s, target);
            let single = carver
                .source_mask(&s.sampler, &s.classifier, source, target, &columns)
                .unwrap();
            if single.count() == 0 {
                continue;
            }
            found = true;

            // Generating the target alone replays the source's worm.
            let full = carver
                .worm_mask(&s.sampler, &s.classifier, target, &columns)
                .unwrap();
            assert!(full.contains_all(&single), "seed {seed}: worm missing from target");

            // And again after touching the source chunk first.
            let _ = carver.worm_mask(&s.sampler, &s.classifier, source, &columns_for(&s, source));
            let again = carver
                .worm_mask(&s.sampler, &s.classifier, target, &columns)
                .unwrap();
            assert_eq!(again.count(), full.count());
            break;
        }
        assert!(found, "no seed in range produced a border-crossing worm");
    }

    #[test]
    fn test_cavities_need_depth_band() {
        let s = setup(8);
        let carver = CaveCarver::new(WorldSeed::new(8), CaveConfig::default(), 64);
        for x in 0..64 {
            assert!(!carver.is_cavity(&s.sampler, x, 2, 0, 1.0), "below the band");
            assert!(!carver.is_cavity(&s.sampler, x, 100, 0, 1.0), "above the band");
        }
    }

    #[test]
    fn test_cavity_only_carving_keeps_protection() {
        // Carving without a worm mask, as after a failed mask allocation.
        let s = setup(12);
        let config = CaveConfig {
            region_threshold: 0.0,
            cavity_threshold: -1.0,
            ..Default::default()
        };
        let carver = CaveCarver::new(WorldSeed::new(12), config, 64);
        let depth = carver.config().min_surface_depth;
        let coord = ChunkCoord::new(3, -2);
        let columns = columns_for(&s, coord);
        let mut carved = 0;
        for lz in 0..CHUNK_SIZE {
            for lx in 0..CHUNK_SIZE {
                let h = columns.height(lx, lz);
                for y in 0..CHUNK_HEIGHT as i32 {
                    if carver.carves(&s.sampler, None, &columns, coord, lx, y, lz) {
                        assert!(y >= 1, "bedrock row carved at ({lx}, {lz})");
                        assert!(y <= h - depth, "carved at y={y} under surface {h}");
                        carved += 1;
                    }
                }
            }
        }
        assert!(carved > 0, "cavities should still carve without worms");
    }

    #[test]
    fn test_cavities_are_sparse() {
        let s = setup(9);
        let carver = CaveCarver::new(WorldSeed::new(9), CaveConfig::default(), 64);
        let mut open = 0;
        let mut total = 0;
        for x in (0..256).step_by(3) {
            for y in (10..70).step_by(3) {
                total += 1;
                if carver.is_cavity(&s.sampler, x, y, x / 2, 0.6) {
                    open += 1;
                }
            }
        }
        assert!(open * 4 < total, "cavities fill too much: {open}/{total}");
    }

    #[test]
    fn test_mask_bits() {
        let mut mask = CaveMask::try_new().unwrap();
        assert_eq!(mask.count(), 0);
        mask.set(3, 100, 7);
        assert!(mask.get(3, 100, 7));
        assert!(!mask.get(7, 100, 3));
        assert_eq!(mask.count(), 1);
    }
}
