//! Ore vein distribution.
//!
//! Uses per-ore-type 3D noise fields to replace stone with ore veins inside
//! configured Y bands and below a minimum depth under the surface.

use noise::{NoiseFn, Simplex};

use crate::chunk::Block;
use crate::seed::{WorldSeed, offsets};

/// Configuration for a single ore type's underground distribution.
#[derive(Clone, Debug, PartialEq)]
pub struct OreDistribution {
    /// Block placed for this ore.
    pub block: Block,
    /// Human-readable name for logging/debugging.
    pub name: String,
    /// Lowest Y where this ore can appear.
    pub min_y: i32,
    /// Highest Y where this ore can appear.
    pub max_y: i32,
    /// Minimum depth below the column surface.
    pub min_depth: i32,
    /// Noise threshold for ore placement. Voxels where noise > threshold
    /// become ore. Higher threshold = rarer ore. Range: \[0.0, 1.0\].
    pub noise_threshold: f64,
    /// Spatial scale of ore veins (noise frequency).
    /// Smaller values = larger veins, larger values = smaller veins.
    pub vein_scale: f64,
    /// Seed offset to decorrelate this ore's noise from other ore types.
    pub seed_offset: u64,
}

impl OreDistribution {
    /// Human-readable problem with this distribution, if any.
    pub fn problem(&self) -> Option<&'static str> {
        if self.min_y < 1 || self.min_y > self.max_y {
            Some("Y band must satisfy 1 <= min_y <= max_y")
        } else if !(0.0..=1.0).contains(&self.noise_threshold) {
            Some("noise_threshold must be in [0, 1]")
        } else if self.vein_scale <= 0.0 {
            Some("vein_scale must be positive")
        } else if self.block == Block::Stone || self.block == Block::Air {
            Some("ore block must differ from stone and air")
        } else {
            None
        }
    }
}

/// Runtime data for one ore type, including the pre-initialized noise function.
struct OreDistributionRuntime {
    config: OreDistribution,
    noise: Simplex,
}

/// Distributes ore veins in subsurface terrain using 3D noise.
pub struct OreDistributor {
    /// All registered ore distributions, in priority order (first match wins).
    ores: Vec<OreDistributionRuntime>,
}

impl OreDistributor {
    /// Create a new ore distributor with the given world seed and ore configs.
    pub fn new(seed: WorldSeed, ore_configs: &[OreDistribution]) -> Self {
        let ores = ore_configs
            .iter()
            .map(|config| {
                let noise = Simplex::new(seed.noise_seed(offsets::ORE + config.seed_offset));
                OreDistributionRuntime {
                    config: config.clone(),
                    noise,
                }
            })
            .collect();

        Self { ores }
    }

    /// Query which ore (if any) should replace a stone voxel at world `(x, y, z)`
    /// in a column whose surface is at `surface_height`.
    pub fn sample_ore(&self, x: i32, y: i32, z: i32, surface_height: i32) -> Option<Block> {
        let depth = surface_height - y;
        if depth <= 0 {
            return None;
        }

        for ore_rt in &self.ores {
            let cfg = &ore_rt.config;

            if y < cfg.min_y || y > cfg.max_y || depth < cfg.min_depth {
                continue;
            }

            let noise_val = ore_rt.noise.get([
                x as f64 * cfg.vein_scale,
                y as f64 * cfg.vein_scale,
                z as f64 * cfg.vein_scale,
            ]);

            // Normalize from [-1, 1] to [0, 1].
            let normalized = (noise_val + 1.0) * 0.5;

            if normalized > cfg.noise_threshold {
                return Some(cfg.block);
            }
        }

        None
    }

    /// Count the number of registered ore types.
    pub fn ore_count(&self) -> usize {
        self.ores.len()
    }
}

/// Returns the default ore set, from common shallow coal to rare deep diamond.
pub fn default_ore_distributions() -> Vec<OreDistribution> {
    vec![
        OreDistribution {
            block: Block::CoalOre,
            name: "coal".into(),
            min_y: 5,
            max_y: 128,
            min_depth: 3,
            noise_threshold: 0.86,
            vein_scale: 0.09,
            seed_offset: 0x0001,
        },
        OreDistribution {
            block: Block::IronOre,
            name: "iron".into(),
            min_y: 5,
            max_y: 72,
            min_depth: 4,
            noise_threshold: 0.88,
            vein_scale: 0.11,
            seed_offset: 0x0002,
        },
        OreDistribution {
            block: Block::GoldOre,
            name: "gold".into(),
            min_y: 5,
            max_y: 32,
            min_depth: 8,
            noise_threshold: 0.93,
            vein_scale: 0.15,
            seed_offset: 0x0003,
        },
        OreDistribution {
            block: Block::DiamondOre,
            name: "diamond".into(),
            min_y: 2,
            max_y: 16,
            min_depth: 12,
            noise_threshold: 0.95,
            vein_scale: 0.20,
            seed_offset: 0x0004,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_distributor() -> OreDistributor {
        OreDistributor::new(WorldSeed::new(42), &default_ore_distributions())
    }

    #[test]
    fn test_ores_appear_within_y_bands() {
        let dist = test_distributor();
        let ores = default_ore_distributions();
        let surface = 150;

        for x in 0..40 {
            for z in 0..40 {
                for y in 1..150 {
                    if let Some(block) = dist.sample_ore(x * 3, y, z * 3, surface) {
                        let cfg = ores.iter().find(|o| o.block == block).unwrap();
                        assert!(
                            y >= cfg.min_y && y <= cfg.max_y,
                            "Ore '{}' found at y={y}, but allowed band is [{}, {}]",
                            cfg.name,
                            cfg.min_y,
                            cfg.max_y
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn test_no_ore_above_surface() {
        let dist = test_distributor();
        for x in 0..100 {
            assert_eq!(dist.sample_ore(x, 60, 0, 60), None);
            assert_eq!(dist.sample_ore(x, 61, 0, 60), None);
        }
    }

    #[test]
    fn test_ore_deterministic() {
        let a = test_distributor();
        let b = test_distributor();
        for x in 0..30 {
            for y in 5..60 {
                assert_eq!(a.sample_ore(x, y, -x, 100), b.sample_ore(x, y, -x, 100));
            }
        }
    }

    #[test]
    fn test_some_ore_generated() {
        let dist = test_distributor();
        let mut found = 0;
        for x in 0..32 {
            for z in 0..32 {
                for y in 5..60 {
                    if dist.sample_ore(x, y, z, 100).is_some() {
                        found += 1;
                    }
                }
            }
        }
        assert!(found > 0, "expected some ore in 56k voxels");
        assert!(found < 32 * 32 * 55 / 5, "ore is far too common: {found}");
    }

    #[test]
    fn test_ore_count() {
        assert_eq!(test_distributor().ore_count(), 4);
    }

    #[test]
    fn test_default_distributions_valid() {
        for ore in default_ore_distributions() {
            assert_eq!(ore.problem(), None, "{} is invalid", ore.name);
        }
    }

    #[test]
    fn test_invalid_distribution_detected() {
        let mut ore = default_ore_distributions().remove(0);
        ore.max_y = 0;
        assert!(ore.problem().is_some());
    }
}
