//! Structural terrain classification.
//!
//! Turns a column's noise sample into a surface height: ocean floors from
//! continentalness, banded land elevation, mountain and ridge lift gated to
//! the continental interior, erosion- and elevation-attenuated hills, river
//! channels, and exponential compression of the highest peaks. Also derives
//! slope and the coastal surface override.

use nebula_config::TerrainConfig;

use crate::noise_field::{inverse_lerp, lerp, smoothstep};
use crate::sampler::{ColumnSample, NoiseSampler};
use crate::seed::det_exp;

/// Coastal surface override for columns right above the waterline.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CoastalSurfaceType {
    #[default]
    None,
    SandBeach,
    GravelBeach,
    Cliff,
}

/// Height and structure of one column.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ColumnShape {
    /// Surface height: the Y of the topmost terrain block.
    pub height: i32,
    /// Continentalness below the ocean threshold.
    pub is_ocean: bool,
    /// Mountain plus ridge lift, in blocks, before compression.
    pub lift: f32,
}

/// Classifies columns into ocean or land and computes their height.
pub struct StructuralClassifier {
    config: TerrainConfig,
}

impl StructuralClassifier {
    pub fn new(config: TerrainConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TerrainConfig {
        &self.config
    }

    /// Continentalness below the ocean threshold is ocean.
    pub fn is_ocean(&self, continentalness: f32) -> bool {
        continentalness < self.config.ocean_threshold
    }

    /// Ocean floor height. Non-decreasing in `continentalness` for a fixed
    /// `seabed`, and never above `sea_level - 2`.
    pub fn ocean_floor_height(&self, continentalness: f32, seabed: f32) -> i32 {
        let t = &self.config;
        let shelf = smoothstep(0.0, t.ocean_threshold, continentalness);
        let floor = lerp(t.deep_ocean_floor as f32, t.shelf_floor as f32, shelf) + seabed * 1.5;
        (floor.floor() as i32).clamp(1, t.sea_level - 2)
    }

    /// Banded base elevation of land before lift and hills.
    pub fn land_base_height(&self, continentalness: f32) -> f32 {
        let t = &self.config;
        let sea = t.sea_level as f32;
        let c = continentalness;
        if c < t.inland_low_threshold {
            lerp(sea + 1.0, sea + 6.0, inverse_lerp(t.ocean_threshold, t.inland_low_threshold, c))
        } else if c < t.inland_high_threshold {
            lerp(sea + 6.0, sea + 16.0, inverse_lerp(t.inland_low_threshold, t.inland_high_threshold, c))
        } else if c < t.core_threshold {
            lerp(sea + 16.0, sea + 30.0, inverse_lerp(t.inland_high_threshold, t.core_threshold, c))
        } else {
            lerp(sea + 30.0, sea + 44.0, inverse_lerp(t.core_threshold, 1.0, c))
        }
    }

    /// Mountain lift. Zero unless continentalness exceeds the inland-high threshold.
    pub fn mountain_lift(&self, continentalness: f32, peaks: f32, erosion: f32) -> f32 {
        let t = &self.config;
        let interior = smoothstep(t.inland_high_threshold, t.core_threshold, continentalness);
        let rough = 1.0 - smoothstep(0.25, 0.55, erosion);
        interior * smoothstep(0.62, 0.9, peaks) * rough * t.mountain_height
    }

    /// Ridge lift. Zero unless continentalness exceeds the inland-high threshold.
    pub fn ridge_lift(&self, continentalness: f32, ridge: f32, erosion: f32) -> f32 {
        let t = &self.config;
        let interior = smoothstep(t.inland_high_threshold, 1.0, continentalness);
        let rough = 1.0 - smoothstep(0.25, 0.55, erosion);
        interior * smoothstep(0.75, 0.95, ridge) * rough * t.ridge_height
    }

    /// Exponentially compress heights above the compression start so peaks
    /// approach, but never exceed, `max_height`.
    pub fn compress_peaks(&self, height: f32) -> f32 {
        let start = self.config.peak_compression_start as f32;
        let range = (self.config.max_height - self.config.peak_compression_start) as f32;
        if height <= start || range <= 0.0 {
            return height;
        }
        start + range * (1.0 - det_exp(-(height - start) / range))
    }

    /// Height and structure of a column from its noise sample.
    pub fn shape(&self, sample: &ColumnSample) -> ColumnShape {
        let t = &self.config;
        let c = sample.continentalness;
        if self.is_ocean(c) {
            return ColumnShape {
                height: self.ocean_floor_height(c, sample.seabed),
                is_ocean: true,
                lift: 0.0,
            };
        }

        let sea = t.sea_level as f32;
        let lift = self.mountain_lift(c, sample.peaks, sample.erosion)
            + self.ridge_lift(c, sample.ridge, sample.erosion);
        let mut h = self.land_base_height(c) + lift;

        let altitude = 1.0 - 0.7 * smoothstep(sea + 40.0, sea + 100.0, h);
        h += sample.hills * t.hills_amplitude * (1.0 - 0.6 * sample.erosion) * altitude;
        h += sample.detail * t.detail_amplitude * (1.0 - 0.5 * sample.erosion) * altitude;

        // Rivers cut toward their bed; mountains resist.
        let bed = sea - t.river_bed_depth as f32;
        let cut = sample.river * (1.0 - smoothstep(0.0, 24.0, lift));
        if h > bed {
            h = lerp(h, bed, cut);
        }

        let h = self.compress_peaks(h);
        ColumnShape {
            height: (h.floor() as i32).clamp(1, t.max_height),
            is_ocean: false,
            lift,
        }
    }

    /// Surface height of any world column, sampling the noise on the fly.
    pub fn height_at(&self, sampler: &NoiseSampler, x: i32, z: i32, reduction: u32) -> i32 {
        self.shape(&sampler.column(x, z, reduction)).height
    }

    /// Max absolute height difference to the four axis neighbours.
    pub fn slope(height: i32, neighbors: [i32; 4]) -> i32 {
        neighbors
            .iter()
            .map(|n| (height - n).abs())
            .max()
            .unwrap_or(0)
    }

    /// Coastal surface override for a land column.
    pub fn coastal_type(
        &self,
        shape: &ColumnShape,
        slope: i32,
        erosion: f32,
        continentalness: f32,
    ) -> CoastalSurfaceType {
        let t = &self.config;
        if shape.is_ocean {
            return CoastalSurfaceType::None;
        }
        let above = shape.height - t.sea_level;
        if !(0..=t.beach_max_height_above_sea).contains(&above)
            || continentalness >= t.ocean_threshold + t.coast_band
        {
            return CoastalSurfaceType::None;
        }
        if slope >= t.cliff_min_slope {
            CoastalSurfaceType::Cliff
        } else if slope <= t.beach_max_slope {
            if erosion < t.gravel_erosion_max {
                CoastalSurfaceType::GravelBeach
            } else {
                CoastalSurfaceType::SandBeach
            }
        } else {
            CoastalSurfaceType::None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed::WorldSeed;

    fn classifier() -> StructuralClassifier {
        StructuralClassifier::new(TerrainConfig::default())
    }

    fn land_sample(c: f32) -> ColumnSample {
        ColumnSample {
            continentalness: c,
            erosion: 0.5,
            peaks: 0.5,
            ridge: 0.5,
            ..Default::default()
        }
    }

    #[test]
    fn test_ocean_floor_monotonic_in_continentalness() {
        let cl = classifier();
        let threshold = cl.config().ocean_threshold;
        for seabed in [-1.0, -0.3, 0.0, 0.4, 1.0] {
            let mut prev = i32::MIN;
            let steps = 300;
            for i in 0..steps {
                let c = threshold * i as f32 / steps as f32;
                let h = cl.ocean_floor_height(c, seabed);
                assert!(h >= prev, "floor fell from {prev} to {h} at c={c} seabed={seabed}");
                assert!(h <= cl.config().sea_level - 2, "floor {h} too close to sea level");
                prev = h;
            }
        }
    }

    #[test]
    fn test_ocean_shape_below_sea() {
        let cl = classifier();
        let shape = cl.shape(&ColumnSample {
            continentalness: 0.1,
            seabed: 1.0,
            ..Default::default()
        });
        assert!(shape.is_ocean);
        assert!(shape.height <= 62);
    }

    #[test]
    fn test_no_lift_below_inland_high() {
        let cl = classifier();
        let t = cl.config().clone();
        for i in 0..=50 {
            let c = t.ocean_threshold
                + (t.inland_high_threshold - t.ocean_threshold) * i as f32 / 50.0;
            for peaks in [0.0, 0.5, 0.95, 1.0] {
                assert_eq!(cl.mountain_lift(c, peaks, 0.0), 0.0, "mountain at c={c}");
                assert_eq!(cl.ridge_lift(c, peaks, 0.0), 0.0, "ridge at c={c}");
            }
        }
        assert!(cl.mountain_lift(0.9, 1.0, 0.0) > 0.0);
        assert!(cl.ridge_lift(0.9, 1.0, 0.0) > 0.0);
    }

    #[test]
    fn test_erosion_flattens_mountains() {
        let cl = classifier();
        assert!(cl.mountain_lift(0.9, 1.0, 0.0) > cl.mountain_lift(0.9, 1.0, 0.5));
        assert_eq!(cl.mountain_lift(0.9, 1.0, 0.9), 0.0);
    }

    #[test]
    fn test_land_base_bands_increase() {
        let cl = classifier();
        let mut prev = f32::MIN;
        for i in 30..=100 {
            let h = cl.land_base_height(i as f32 / 100.0);
            assert!(h >= prev, "base height dropped at c={}", i as f32 / 100.0);
            prev = h;
        }
        assert!(cl.land_base_height(0.30) > cl.config().sea_level as f32);
    }

    #[test]
    fn test_peak_compression_is_asymptotic() {
        let cl = classifier();
        let t = cl.config();
        assert_eq!(cl.compress_peaks(100.0), 100.0);
        let a = cl.compress_peaks(200.0);
        let b = cl.compress_peaks(400.0);
        let c = cl.compress_peaks(10_000.0);
        assert!(a < b && b <= c);
        assert!(c <= t.max_height as f32);
        assert!(a > t.peak_compression_start as f32);
    }

    #[test]
    fn test_land_heights_within_world() {
        let cl = classifier();
        let max = cl.config().max_height;
        let sample = ColumnSample {
            continentalness: 1.0,
            erosion: 0.0,
            peaks: 1.0,
            ridge: 1.0,
            hills: 1.0,
            detail: 1.0,
            ..Default::default()
        };
        let shape = cl.shape(&sample);
        assert!(shape.height <= max);
        assert!(shape.height > 150, "tallest column should be compressed, got {}", shape.height);
    }

    #[test]
    fn test_river_cuts_toward_bed() {
        let cl = classifier();
        let mut sample = land_sample(0.45);
        let dry = cl.shape(&sample).height;
        sample.river = 1.0;
        let wet = cl.shape(&sample).height;
        assert!(wet < dry);
        let bed = cl.config().sea_level - cl.config().river_bed_depth;
        assert!((wet - bed).abs() <= 1, "river column {wet} should sit on the bed {bed}");
    }

    #[test]
    fn test_slope() {
        assert_eq!(StructuralClassifier::slope(70, [70, 70, 70, 70]), 0);
        assert_eq!(StructuralClassifier::slope(70, [68, 75, 70, 71]), 5);
    }

    #[test]
    fn test_coastal_types() {
        let cl = classifier();
        let beach = ColumnShape {
            height: 65,
            is_ocean: false,
            lift: 0.0,
        };
        assert_eq!(cl.coastal_type(&beach, 1, 0.6, 0.31), CoastalSurfaceType::SandBeach);
        assert_eq!(cl.coastal_type(&beach, 1, 0.1, 0.31), CoastalSurfaceType::GravelBeach);
        assert_eq!(cl.coastal_type(&beach, 6, 0.6, 0.31), CoastalSurfaceType::Cliff);
        assert_eq!(cl.coastal_type(&beach, 3, 0.6, 0.31), CoastalSurfaceType::None);
        assert_eq!(
            cl.coastal_type(&beach, 1, 0.6, 0.5),
            CoastalSurfaceType::None,
            "inland columns are not coast"
        );
        let high = ColumnShape { height: 80, ..beach };
        assert_eq!(cl.coastal_type(&high, 1, 0.6, 0.31), CoastalSurfaceType::None);
        let ocean = ColumnShape { is_ocean: true, ..beach };
        assert_eq!(cl.coastal_type(&ocean, 1, 0.6, 0.1), CoastalSurfaceType::None);
    }

    #[test]
    fn test_height_at_matches_shape() {
        let cl = classifier();
        let sampler = NoiseSampler::new(WorldSeed::new(9), cl.config());
        for i in 0..20 {
            let (x, z) = (i * 37, -i * 11);
            assert_eq!(
                cl.height_at(&sampler, x, z, 0),
                cl.shape(&sampler.column(x, z, 0)).height
            );
        }
    }
}
