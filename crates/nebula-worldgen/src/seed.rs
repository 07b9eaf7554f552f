//! Deterministic seeded generation utilities.
//!
//! Provides sub-seed derivation from the world seed, per-chunk RNG streams,
//! stateless coordinate hashing for per-column dice rolls, and deterministic
//! math via `libm` so worm tunnels and peak compression are bit-identical
//! across platforms.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::chunk::Chunk;

// ---------------------------------------------------------------------------
// Sub-seed offsets
// ---------------------------------------------------------------------------

/// Fixed offsets mixed into the world seed so every consumer draws from an
/// independent stream. Changing any value changes every world.
pub mod offsets {
    /// Domain warp, X displacement.
    pub const WARP_X: u64 = 0x1001;
    /// Domain warp, Z displacement.
    pub const WARP_Z: u64 = 0x1002;
    /// Continentalness.
    pub const CONTINENTALNESS: u64 = 0x1010;
    /// Erosion.
    pub const EROSION: u64 = 0x1011;
    /// Peaks and valleys (ridged).
    pub const PEAKS: u64 = 0x1012;
    /// Macro temperature band.
    pub const TEMPERATURE_MACRO: u64 = 0x1020;
    /// Local temperature band.
    pub const TEMPERATURE_LOCAL: u64 = 0x1021;
    /// Macro humidity band.
    pub const HUMIDITY_MACRO: u64 = 0x1022;
    /// Local humidity band.
    pub const HUMIDITY_LOCAL: u64 = 0x1023;
    /// River channels.
    pub const RIVER: u64 = 0x1030;
    /// Ridge lines.
    pub const RIDGE: u64 = 0x1031;
    /// Mid-frequency hills.
    pub const HILLS: u64 = 0x1032;
    /// Fine surface jitter.
    pub const DETAIL: u64 = 0x1033;
    /// Seabed undulation.
    pub const SEABED: u64 = 0x1034;
    /// Decoration sub-biome variant.
    pub const VARIANT: u64 = 0x1040;
    /// Regional vegetation multiplier.
    pub const VEGETATION: u64 = 0x1041;
    /// 2D cave region gate.
    pub const CAVE_REGION: u64 = 0x1050;
    /// 3D cave cavities.
    pub const CAVE_CAVITY: u64 = 0x1051;
    /// 3D worm steering.
    pub const WORM_STEER: u64 = 0x1052;
    /// Worm spawn stream.
    pub const WORM_SPAWN: u64 = 0x2001;
    /// Transition biome rolls.
    pub const TRANSITION: u64 = 0x2002;
    /// Decoration probability rolls (xor-ed with the catalog index).
    pub const DECORATION_ROLL: u64 = 0x3000;
    /// Decoration spacing grid jitter (xor-ed with the catalog index).
    pub const DECORATION_GRID: u64 = 0x4000;
    /// Ore veins (added to each ore's own offset).
    pub const ORE: u64 = 0x5000;
}

// ---------------------------------------------------------------------------
// Seed derivation
// ---------------------------------------------------------------------------

/// Root seed of a world.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct WorldSeed(pub u64);

impl WorldSeed {
    /// Wrap a raw seed.
    pub const fn new(seed: u64) -> Self {
        Self(seed)
    }

    /// Returns the raw seed value.
    pub const fn value(self) -> u64 {
        self.0
    }

    /// Derive an independent sub-seed for the given purpose offset.
    pub const fn derive(self, offset: u64) -> Self {
        Self(mix64(self.0 ^ offset.wrapping_mul(0x9E37_79B9_7F4A_7C15)))
    }

    /// 32-bit seed for a `noise` generator, derived from the given offset.
    pub const fn noise_seed(self, offset: u64) -> u32 {
        let derived = self.derive(offset).0;
        (derived ^ (derived >> 32)) as u32
    }
}

/// SplitMix64 finalizer. Stable across toolchains, unlike `DefaultHasher`.
pub const fn mix64(mut z: u64) -> u64 {
    z = z.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Hash a 2D integer coordinate under a seed.
pub fn hash_coords(seed: WorldSeed, x: i32, z: i32) -> u64 {
    let packed = (x as u32 as u64) | ((z as u32 as u64) << 32);
    mix64(seed.0 ^ mix64(packed))
}

/// Uniform value in `[0, 1)` for a coordinate, independent of evaluation order.
pub fn hash_unit(seed: WorldSeed, x: i32, z: i32) -> f32 {
    (hash_coords(seed, x, z) >> 40) as f32 / (1u64 << 24) as f32
}

/// Derive a deterministic RNG for one chunk and purpose.
///
/// The returned RNG produces an identical sequence for the same
/// `(seed, purpose, cx, cz)`, regardless of thread or call order.
pub fn chunk_rng(seed: WorldSeed, purpose: u64, cx: i32, cz: i32) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(hash_coords(seed.derive(purpose), cx, cz))
}

// ---------------------------------------------------------------------------
// Deterministic math (libm)
// ---------------------------------------------------------------------------

/// Deterministic sine using libm (not platform libc).
#[inline]
pub fn det_sin(x: f32) -> f32 {
    libm::sinf(x)
}

/// Deterministic cosine using libm.
#[inline]
pub fn det_cos(x: f32) -> f32 {
    libm::cosf(x)
}

/// Deterministic exponential using libm.
#[inline]
pub fn det_exp(x: f32) -> f32 {
    libm::expf(x)
}

/// Deterministic sqrt using libm.
#[inline]
pub fn det_sqrt(x: f32) -> f32 {
    libm::sqrtf(x)
}

// ---------------------------------------------------------------------------
// Verification
// ---------------------------------------------------------------------------

/// Hash every block, biome and light value of a chunk for determinism comparison.
pub fn hash_chunk(chunk: &Chunk) -> u64 {
    let mut hasher = DefaultHasher::new();
    for block in chunk.blocks() {
        (*block as u8).hash(&mut hasher);
    }
    for biome in chunk.biomes() {
        (*biome as u8).hash(&mut hasher);
    }
    for light in chunk.light().raw() {
        light.0.hash(&mut hasher);
    }
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::RngCore;

    #[test]
    fn test_derive_deterministic() {
        let seed = WorldSeed::new(999);
        assert_eq!(seed.derive(7), seed.derive(7), "same offset must give same sub-seed");
    }

    #[test]
    fn test_derive_offsets_differ() {
        let seed = WorldSeed::new(42);
        assert_ne!(
            seed.derive(offsets::CONTINENTALNESS),
            seed.derive(offsets::EROSION),
            "distinct purposes must produce distinct sub-seeds"
        );
    }

    #[test]
    fn test_derive_world_seeds_differ() {
        assert_ne!(
            WorldSeed::new(0).derive(offsets::RIVER),
            WorldSeed::new(1).derive(offsets::RIVER),
            "different world seeds should produce different sub-seeds"
        );
    }

    #[test]
    fn test_mix64_is_stable() {
        // Pinned values: a change here silently changes every generated world.
        assert_eq!(mix64(0), 0xE220_A839_7B1D_CDAF);
        assert_eq!(mix64(1), 0x910A_2DEC_8902_5CC1);
    }

    #[test]
    fn test_hash_unit_range() {
        let seed = WorldSeed::new(5);
        for x in -50..50 {
            for z in -50..50 {
                let v = hash_unit(seed, x, z);
                assert!((0.0..1.0).contains(&v), "hash_unit out of range: {v}");
            }
        }
    }

    #[test]
    fn test_hash_coords_distinguishes_axes() {
        let seed = WorldSeed::new(5);
        assert_ne!(hash_coords(seed, 1, 2), hash_coords(seed, 2, 1));
        assert_ne!(hash_coords(seed, -1, 0), hash_coords(seed, 0, -1));
    }

    #[test]
    fn test_chacha8_rng_deterministic() {
        let seed = WorldSeed::new(42);
        let mut rng_a = chunk_rng(seed, offsets::WORM_SPAWN, 10, -20);
        let mut rng_b = chunk_rng(seed, offsets::WORM_SPAWN, 10, -20);

        for _ in 0..1000 {
            assert_eq!(
                rng_a.next_u64(),
                rng_b.next_u64(),
                "ChaCha8Rng sequences must match for same seed"
            );
        }
    }

    #[test]
    fn test_chunk_rng_differs_per_chunk() {
        let seed = WorldSeed::new(42);
        let a = chunk_rng(seed, offsets::WORM_SPAWN, 0, 0).next_u64();
        let b = chunk_rng(seed, offsets::WORM_SPAWN, 0, 1).next_u64();
        assert_ne!(a, b, "adjacent chunks should get different streams");
    }

    #[test]
    fn test_deterministic_math_functions() {
        let x = 1.234_567_f32;
        assert_eq!(det_sin(x), det_sin(x), "det_sin must be deterministic");
        assert_eq!(det_cos(x), det_cos(x), "det_cos must be deterministic");
        assert_eq!(det_exp(x), det_exp(x), "det_exp must be deterministic");
        assert_eq!(det_sqrt(x), det_sqrt(x), "det_sqrt must be deterministic");
    }
}
