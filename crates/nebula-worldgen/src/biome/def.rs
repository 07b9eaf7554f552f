//! Biome identifiers and definitions.

use crate::chunk::Block;

/// Every biome the generator can emit.
#[repr(u8)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BiomeId {
    DeepOcean = 0,
    #[default]
    Ocean,
    River,
    Plains,
    DryPlains,
    Forest,
    Taiga,
    Tundra,
    Desert,
    Savanna,
    Jungle,
    Swamp,
    Foothills,
    Mountains,
    SnowyPeaks,
}

impl BiomeId {
    /// Number of biome identifiers.
    pub const COUNT: usize = 15;

    /// All identifiers in discriminant order.
    pub const ALL: [BiomeId; Self::COUNT] = [
        BiomeId::DeepOcean,
        BiomeId::Ocean,
        BiomeId::River,
        BiomeId::Plains,
        BiomeId::DryPlains,
        BiomeId::Forest,
        BiomeId::Taiga,
        BiomeId::Tundra,
        BiomeId::Desert,
        BiomeId::Savanna,
        BiomeId::Jungle,
        BiomeId::Swamp,
        BiomeId::Foothills,
        BiomeId::Mountains,
        BiomeId::SnowyPeaks,
    ];

    /// Dense index for per-biome tables.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Stable snake_case name.
    pub fn name(self) -> &'static str {
        match self {
            BiomeId::DeepOcean => "deep_ocean",
            BiomeId::Ocean => "ocean",
            BiomeId::River => "river",
            BiomeId::Plains => "plains",
            BiomeId::DryPlains => "dry_plains",
            BiomeId::Forest => "forest",
            BiomeId::Taiga => "taiga",
            BiomeId::Tundra => "tundra",
            BiomeId::Desert => "desert",
            BiomeId::Savanna => "savanna",
            BiomeId::Jungle => "jungle",
            BiomeId::Swamp => "swamp",
            BiomeId::Foothills => "foothills",
            BiomeId::Mountains => "mountains",
            BiomeId::SnowyPeaks => "snowy_peaks",
        }
    }

    /// Ocean biomes only ever appear on ocean columns.
    pub fn is_ocean(self) -> bool {
        matches!(self, BiomeId::DeepOcean | BiomeId::Ocean)
    }
}

/// A closed `[min, max]` interval.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Band {
    pub min: f32,
    pub max: f32,
}

impl Band {
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// Unbounded above.
    pub const fn at_least(min: f32) -> Self {
        Self {
            min,
            max: f32::INFINITY,
        }
    }

    /// `min <= v <= max`.
    pub fn contains(self, v: f32) -> bool {
        self.min <= v && v <= self.max
    }

    /// `min <= v < max`. Used where adjacent bands must not overlap.
    pub fn contains_half_open(self, v: f32) -> bool {
        self.min <= v && v < self.max
    }

    pub fn center(self) -> f32 {
        (self.min + self.max) * 0.5
    }

    /// Distance from the centre, `0` at the centre and `1` at either edge.
    pub fn normalized_distance(self, v: f32) -> f32 {
        let half = (self.max - self.min) * 0.5;
        if half <= 0.0 {
            return 0.0;
        }
        (v - self.center()).abs() / half
    }
}

/// Hard structural constraints a column must meet for a biome to apply.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StructuralGates {
    /// Lowest admitted surface height.
    pub y_min: i32,
    /// Highest admitted surface height.
    pub y_max: i32,
    /// Steepest admitted slope.
    pub max_slope: i32,
    /// Admitted continentalness, half-open.
    pub continentalness: Band,
}

impl StructuralGates {
    /// Whether a column with this structure may take the biome.
    pub fn admits(&self, height: i32, slope: i32, continentalness: f32) -> bool {
        (self.y_min..=self.y_max).contains(&height)
            && slope <= self.max_slope
            && self.continentalness.contains_half_open(continentalness)
    }
}

/// Climate envelope used by range scoring.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClimateRange {
    pub temperature: Band,
    pub humidity: Band,
    /// Surface height envelope, in blocks.
    pub elevation: Band,
    /// Higher priority wins near-ties.
    pub priority: i32,
}

/// Weighted anchor in heat/humidity space, both axes in `0..=100`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VoronoiAnchor {
    pub heat: f32,
    pub humidity: f32,
    /// Distances to this anchor are divided by the weight.
    pub weight: f32,
}

/// Full descriptor for a biome type.
#[derive(Clone, Debug, PartialEq)]
pub struct BiomeDef {
    pub id: BiomeId,
    /// Block placed on the terrain surface.
    pub surface: Block,
    /// Block for the layers immediately below the surface.
    pub filler: Block,
    /// Number of filler layers under the surface block.
    pub filler_depth: i32,
    /// `None` for biomes that are only reached by override or transition.
    pub climate: Option<ClimateRange>,
    /// `None` for biomes without a Voronoi anchor.
    pub anchor: Option<VoronoiAnchor>,
    pub gates: StructuralGates,
    /// RGB used by debug maps.
    pub map_color: [u8; 3],
}
