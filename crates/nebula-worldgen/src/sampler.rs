//! Named noise fields used by every stage of the terrain pipeline.
//!
//! The sampler owns one seeded [`NoiseField`] per [`Field`] and exposes a
//! domain-warped per-column bundle ([`ColumnSample`]) so the structural
//! classifier, the biome selector and the decoration placer all read the
//! same values for a column.

use nebula_config::TerrainConfig;

use crate::noise_field::{NoiseField, NoiseParams, smoothstep};
use crate::seed::{WorldSeed, offsets};

/// Every noise field the pipeline reads.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Field {
    WarpX,
    WarpZ,
    Continentalness,
    Erosion,
    Peaks,
    TemperatureMacro,
    TemperatureLocal,
    HumidityMacro,
    HumidityLocal,
    River,
    Ridge,
    Hills,
    Detail,
    Seabed,
    Variant,
    Vegetation,
    CaveRegion,
    CaveCavity,
    WormSteer,
}

impl Field {
    /// All fields, in storage order.
    pub const ALL: [Field; 19] = [
        Field::WarpX,
        Field::WarpZ,
        Field::Continentalness,
        Field::Erosion,
        Field::Peaks,
        Field::TemperatureMacro,
        Field::TemperatureLocal,
        Field::HumidityMacro,
        Field::HumidityLocal,
        Field::River,
        Field::Ridge,
        Field::Hills,
        Field::Detail,
        Field::Seabed,
        Field::Variant,
        Field::Vegetation,
        Field::CaveRegion,
        Field::CaveCavity,
        Field::WormSteer,
    ];

    /// Static parameters of this field.
    pub fn params(self) -> NoiseParams {
        match self {
            Field::WarpX => NoiseParams::fbm(offsets::WARP_X, 320.0, 3),
            Field::WarpZ => NoiseParams::fbm(offsets::WARP_Z, 320.0, 3),
            Field::Continentalness => {
                NoiseParams::fbm(offsets::CONTINENTALNESS, 1600.0, 6).with_mapping(0.5, 1.1)
            }
            Field::Erosion => NoiseParams::fbm(offsets::EROSION, 700.0, 4).with_mapping(0.5, 1.0),
            Field::Peaks => NoiseParams::ridged(offsets::PEAKS, 520.0, 5),
            Field::TemperatureMacro => NoiseParams::fbm(offsets::TEMPERATURE_MACRO, 2400.0, 3),
            Field::TemperatureLocal => NoiseParams::fbm(offsets::TEMPERATURE_LOCAL, 280.0, 3),
            Field::HumidityMacro => NoiseParams::fbm(offsets::HUMIDITY_MACRO, 2200.0, 3),
            Field::HumidityLocal => NoiseParams::fbm(offsets::HUMIDITY_LOCAL, 260.0, 3),
            Field::River => NoiseParams::fbm(offsets::RIVER, 1100.0, 4)
                .with_persistence(0.45)
                .abs(),
            Field::Ridge => NoiseParams::ridged(offsets::RIDGE, 260.0, 4),
            Field::Hills => NoiseParams::fbm(offsets::HILLS, 140.0, 4),
            Field::Detail => NoiseParams::fbm(offsets::DETAIL, 28.0, 3),
            Field::Seabed => NoiseParams::fbm(offsets::SEABED, 70.0, 2),
            Field::Variant => NoiseParams::fbm(offsets::VARIANT, 96.0, 2)
                .with_mapping(0.5, 1.0)
                .eased(),
            Field::Vegetation => {
                NoiseParams::fbm(offsets::VEGETATION, 420.0, 2).with_mapping(1.0, 0.8)
            }
            Field::CaveRegion => {
                NoiseParams::fbm(offsets::CAVE_REGION, 180.0, 3).with_mapping(0.5, 1.0)
            }
            Field::CaveCavity => NoiseParams::fbm(offsets::CAVE_CAVITY, 56.0, 3)
                .with_spread([56.0, 36.0, 56.0])
                .with_mapping(0.5, 1.0),
            Field::WormSteer => NoiseParams::fbm(offsets::WORM_STEER, 22.0, 2),
        }
    }
}

/// Raw per-column field values after domain warping.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ColumnSample {
    /// Continentalness in `[0, 1]`.
    pub continentalness: f32,
    /// Erosion in `[0, 1]`. High erosion flattens terrain.
    pub erosion: f32,
    /// Peaks/valleys in roughly `[0, 1]`.
    pub peaks: f32,
    /// Temperature in `[0, 1]`.
    pub temperature: f32,
    /// Humidity in `[0, 1]`.
    pub humidity: f32,
    /// River mask in `[0, 1]`; 1 at the channel centre.
    pub river: f32,
    /// Ridge lines in roughly `[0, 1]`.
    pub ridge: f32,
    /// Hills in roughly `[-1, 1]`.
    pub hills: f32,
    /// Fine detail in roughly `[-1, 1]`.
    pub detail: f32,
    /// Seabed undulation in roughly `[-1, 1]`.
    pub seabed: f32,
    /// Decoration variant selector in `[0, 1]`.
    pub variant: f32,
    /// Regional vegetation multiplier in `[0.25, 1.75]`.
    pub vegetation: f32,
}

/// Seeded collection of every pipeline noise field.
pub struct NoiseSampler {
    seed: WorldSeed,
    fields: Vec<NoiseField>,
    warp_strength: f64,
    river_width: f32,
}

impl NoiseSampler {
    /// Build every field from the world seed.
    pub fn new(seed: WorldSeed, terrain: &TerrainConfig) -> Self {
        let fields = Field::ALL
            .iter()
            .map(|field| NoiseField::new(seed, field.params()))
            .collect();
        Self {
            seed,
            fields,
            warp_strength: terrain.warp_strength as f64,
            river_width: terrain.river_width,
        }
    }

    /// World seed the fields were derived from.
    pub fn seed(&self) -> WorldSeed {
        self.seed
    }

    /// The underlying field for `field`.
    pub fn field(&self, field: Field) -> &NoiseField {
        &self.fields[field as usize]
    }

    /// Sample a 2D field at raw (unwarped) world coordinates.
    pub fn sample(&self, field: Field, x: f64, z: f64, reduction: u32) -> f32 {
        self.field(field).sample_2d(x, z, reduction)
    }

    /// Sample a 3D field at world coordinates.
    pub fn sample_3d(&self, field: Field, x: f64, y: f64, z: f64, reduction: u32) -> f32 {
        self.field(field).sample_3d(x, y, z, reduction)
    }

    /// Domain-warped coordinates for a column.
    ///
    /// The warp is always sampled at full octave count so coastlines of
    /// coarse LOD tiles line up with full-resolution chunks.
    pub fn warp(&self, x: f64, z: f64) -> (f64, f64) {
        let dx = self.sample(Field::WarpX, x, z, 0) as f64 * self.warp_strength;
        let dz = self.sample(Field::WarpZ, x, z, 0) as f64 * self.warp_strength;
        (x + dx, z + dz)
    }

    /// Sample every 2D field for one column.
    pub fn column(&self, x: i32, z: i32, reduction: u32) -> ColumnSample {
        let (wx, wz) = self.warp(x as f64, z as f64);
        let s = |field| self.sample(field, wx, wz, reduction);

        let temperature = 0.5
            + 0.9 * (0.75 * s(Field::TemperatureMacro) + 0.25 * s(Field::TemperatureLocal));
        let humidity =
            0.5 + 0.9 * (0.75 * s(Field::HumidityMacro) + 0.25 * s(Field::HumidityLocal));

        ColumnSample {
            continentalness: s(Field::Continentalness).clamp(0.0, 1.0),
            erosion: s(Field::Erosion).clamp(0.0, 1.0),
            peaks: s(Field::Peaks).clamp(0.0, 1.0),
            temperature: temperature.clamp(0.0, 1.0),
            humidity: humidity.clamp(0.0, 1.0),
            river: 1.0 - smoothstep(0.0, self.river_width, s(Field::River)),
            ridge: s(Field::Ridge).clamp(0.0, 1.0),
            hills: s(Field::Hills),
            detail: s(Field::Detail),
            seabed: s(Field::Seabed),
            variant: s(Field::Variant).clamp(0.0, 1.0),
            vegetation: s(Field::Vegetation).clamp(0.25, 1.75),
        }
    }

    /// 2D cave region gate value for a column, in `[0, 1]`.
    pub fn cave_region(&self, x: i32, z: i32) -> f32 {
        self.sample(Field::CaveRegion, x as f64, z as f64, 0).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sampler(seed: u64) -> NoiseSampler {
        NoiseSampler::new(WorldSeed::new(seed), &TerrainConfig::default())
    }

    #[test]
    fn test_field_storage_order_matches_discriminants() {
        for (i, field) in Field::ALL.iter().enumerate() {
            assert_eq!(*field as usize, i, "{field:?} stored at the wrong index");
        }
    }

    #[test]
    fn test_field_seed_offsets_unique() {
        let mut offsets: Vec<u64> = Field::ALL.iter().map(|f| f.params().seed_offset).collect();
        offsets.sort_unstable();
        offsets.dedup();
        assert_eq!(offsets.len(), Field::ALL.len(), "every field needs its own sub-seed");
    }

    #[test]
    fn test_column_deterministic_across_instances() {
        let a = sampler(7);
        let b = sampler(7);
        for i in -20..20 {
            assert_eq!(a.column(i * 13, i * -7, 0), b.column(i * 13, i * -7, 0));
        }
    }

    #[test]
    fn test_column_value_ranges() {
        let s = sampler(11);
        for i in 0..400 {
            let c = s.column(i * 97 - 20_000, i * 53 - 10_000, 0);
            assert!((0.0..=1.0).contains(&c.continentalness));
            assert!((0.0..=1.0).contains(&c.erosion));
            assert!((0.0..=1.0).contains(&c.temperature));
            assert!((0.0..=1.0).contains(&c.humidity));
            assert!((0.0..=1.0).contains(&c.river));
            assert!((0.25..=1.75).contains(&c.vegetation));
        }
    }

    #[test]
    fn test_warp_displacement_bounded() {
        let s = sampler(3);
        let limit = TerrainConfig::default().warp_strength as f64 * 1.05;
        for i in 0..200 {
            let x = i as f64 * 31.0;
            let (wx, wz) = s.warp(x, -x);
            assert!((wx - x).abs() <= limit && (wz + x).abs() <= limit);
        }
    }

    #[test]
    fn test_seeds_produce_different_worlds() {
        let a = sampler(1);
        let b = sampler(2);
        let differs = (0..50).any(|i| a.column(i * 100, 0, 0) != b.column(i * 100, 0, 0));
        assert!(differs);
    }

    #[test]
    fn test_continentalness_has_ocean_and_land() {
        let s = sampler(42);
        let threshold = TerrainConfig::default().ocean_threshold;
        let (mut ocean, mut land) = (0, 0);
        for i in 0..60 {
            for j in 0..60 {
                let c = s.column(i * 400, j * 400, 0).continentalness;
                if c < threshold {
                    ocean += 1;
                } else {
                    land += 1;
                }
            }
        }
        assert!(ocean > 0 && land > 0, "ocean={ocean} land={land}");
    }
}
