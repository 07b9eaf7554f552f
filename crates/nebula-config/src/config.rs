//! Configuration structs with sensible defaults and RON persistence.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Vertical extent of a world in blocks; block Y runs over `0..WORLD_HEIGHT`.
pub const WORLD_HEIGHT: i32 = 256;

/// Top-level configuration: world generation plus diagnostics.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// World generation settings.
    pub worldgen: WorldGenConfig,
    /// Debug/development settings.
    pub debug: DebugConfig,
}

/// Debug/development configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    /// Log level override (e.g., "debug", "info", "warn").
    pub log_level: String,
    /// Emit a trace event with the elapsed time of every generated chunk.
    pub trace_chunk_timings: bool,
}

/// Everything the terrain pipeline needs besides its static catalogs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WorldGenConfig {
    /// Root seed. Every noise field derives its own sub-seed from this.
    pub seed: u64,
    /// Terrain shape and coastline parameters.
    pub terrain: TerrainConfig,
    /// Biome selection parameters.
    pub biomes: BiomeConfig,
    /// Cave carving parameters.
    pub caves: CaveConfig,
    /// Vegetation and feature placement.
    pub decorations: DecorationConfig,
    /// Region and LOD cache sizing.
    pub cache: CacheConfig,
}

/// Terrain shape parameters, in blocks unless noted otherwise.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TerrainConfig {
    /// Water fills every non-solid voxel at or below this Y.
    pub sea_level: i32,
    /// Continentalness below this value is ocean. Range `(0, 1)`.
    pub ocean_threshold: f32,
    /// Start of the inland-low elevation band.
    pub inland_low_threshold: f32,
    /// Start of the inland-high band. Mountains and ridges need more than this.
    pub inland_high_threshold: f32,
    /// Start of the continental core band.
    pub core_threshold: f32,
    /// Ocean floor height at continentalness 0.
    pub deep_ocean_floor: i32,
    /// Ocean floor height right at the ocean threshold.
    pub shelf_floor: i32,
    /// Maximum lift added by mountains before peak compression.
    pub mountain_height: f32,
    /// Maximum lift added by ridge lines.
    pub ridge_height: f32,
    /// Amplitude of mid-frequency hills.
    pub hills_amplitude: f32,
    /// Amplitude of fine surface jitter.
    pub detail_amplitude: f32,
    /// Width of the river channel in raw noise units (smaller = narrower).
    pub river_width: f32,
    /// River beds sit this many blocks below sea level.
    pub river_bed_depth: i32,
    /// Heights above this are exponentially compressed toward `max_height`.
    pub peak_compression_start: i32,
    /// Asymptotic ceiling for compressed peaks.
    pub max_height: i32,
    /// Domain warp displacement, in blocks.
    pub warp_strength: f32,
    /// Coastal overrides never apply higher than this above sea level.
    pub beach_max_height_above_sea: i32,
    /// Width of the continentalness band above the ocean threshold that counts as coast.
    pub coast_band: f32,
    /// Beaches need a slope at or below this.
    pub beach_max_slope: i32,
    /// Coastal columns at or above this slope become cliffs.
    pub cliff_min_slope: i32,
    /// Coastal columns with erosion below this get gravel instead of sand.
    pub gravel_erosion_max: f32,
}

/// Strategy used to pick full-resolution biomes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum BiomeSelection {
    /// Nearest weighted anchor in heat/humidity space.
    Voronoi,
    /// Lowest normalised distance to a climate range centre.
    RangeScoring,
}

/// Biome selection parameters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BiomeConfig {
    /// Full-resolution strategy. LOD tiles always use range scoring.
    pub selection: BiomeSelection,
    /// River mask value above which a low column becomes a river.
    pub river_threshold: f32,
    /// Columns higher than `sea_level + river_max_height` are never rivers.
    pub river_max_height: i32,
    /// Inject transition biomes along registered biome boundaries.
    pub transitions: bool,
}

/// Cave carving parameters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CaveConfig {
    /// Master switch.
    pub enabled: bool,
    /// Columns whose 2D region value is below this never carve.
    pub region_threshold: f32,
    /// Nothing is carved within this many blocks of the column surface.
    pub min_surface_depth: i32,
    /// Probability that a chunk spawns any worms.
    pub worm_chance: f32,
    /// Upper bound on worms spawned by one chunk.
    pub max_worms_per_chunk: u32,
    /// Minimum worm length in steps.
    pub worm_min_steps: u32,
    /// Maximum worm length in steps.
    pub worm_max_steps: u32,
    /// Distance travelled per worm step.
    pub worm_step_length: f32,
    /// Smallest tunnel radius.
    pub worm_min_radius: f32,
    /// Largest tunnel radius.
    pub worm_max_radius: f32,
    /// Lowest Y a worm may occupy.
    pub worm_y_min: i32,
    /// Highest Y a worm may occupy.
    pub worm_y_max: i32,
    /// Fraction of the vertical direction component removed every step.
    pub vertical_damping: f32,
    /// Base threshold for noise cavities. Higher = fewer cavities.
    pub cavity_threshold: f32,
    /// Bottom of the cavity depth band.
    pub cavity_y_min: i32,
    /// Top of the cavity depth band.
    pub cavity_y_max: i32,
    /// Carved voxels at or below this Y fill with lava.
    pub lava_level: i32,
}

/// Vegetation and feature placement.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DecorationConfig {
    /// Master switch.
    pub enabled: bool,
    /// Global multiplier on every decoration probability.
    pub vegetation_scale: f32,
}

/// Region and LOD cache sizing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum number of generation regions kept across all shards.
    pub region_capacity: usize,
    /// Number of independently locked shards in the region cache.
    pub shards: usize,
    /// Radius, in blocks, of the coarse LOD cache around its centre.
    pub lod_radius: i32,
    /// The player must move this far from the LOD centre to trigger a recenter.
    pub recenter_distance: f64,
}

// --- Default implementations ---

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            trace_chunk_timings: false,
        }
    }
}

impl Default for WorldGenConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            terrain: TerrainConfig::default(),
            biomes: BiomeConfig::default(),
            caves: CaveConfig::default(),
            decorations: DecorationConfig::default(),
            cache: CacheConfig::default(),
        }
    }
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            sea_level: 64,
            ocean_threshold: 0.30,
            inland_low_threshold: 0.38,
            inland_high_threshold: 0.55,
            core_threshold: 0.72,
            deep_ocean_floor: 28,
            shelf_floor: 57,
            mountain_height: 72.0,
            ridge_height: 22.0,
            hills_amplitude: 9.0,
            detail_amplitude: 2.5,
            river_width: 0.06,
            river_bed_depth: 3,
            peak_compression_start: 150,
            max_height: 236,
            warp_strength: 40.0,
            beach_max_height_above_sea: 3,
            coast_band: 0.06,
            beach_max_slope: 2,
            cliff_min_slope: 4,
            gravel_erosion_max: 0.3,
        }
    }
}

impl Default for BiomeConfig {
    fn default() -> Self {
        Self {
            selection: BiomeSelection::Voronoi,
            river_threshold: 0.55,
            river_max_height: 3,
            transitions: true,
        }
    }
}

impl Default for CaveConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            region_threshold: 0.42,
            min_surface_depth: 6,
            worm_chance: 0.35,
            max_worms_per_chunk: 2,
            worm_min_steps: 24,
            worm_max_steps: 56,
            worm_step_length: 1.0,
            worm_min_radius: 1.6,
            worm_max_radius: 3.2,
            worm_y_min: 10,
            worm_y_max: 96,
            vertical_damping: 0.35,
            cavity_threshold: 0.78,
            cavity_y_min: 8,
            cavity_y_max: 72,
            lava_level: 8,
        }
    }
}

impl Default for DecorationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            vegetation_scale: 1.0,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            region_capacity: 32,
            shards: 8,
            lod_radius: 1024,
            recenter_distance: 256.0,
        }
    }
}

// --- Validation ---

impl WorldGenConfig {
    /// Check that thresholds and bands are ordered and non-degenerate.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let t = &self.terrain;
        let ordered = 0.0 < t.ocean_threshold
            && t.ocean_threshold < t.inland_low_threshold
            && t.inland_low_threshold < t.inland_high_threshold
            && t.inland_high_threshold < t.core_threshold
            && t.core_threshold < 1.0;
        if !ordered {
            return Err(ConfigError::Invalid(
                "continentalness thresholds must satisfy 0 < ocean < inland_low < inland_high < core < 1"
                    .into(),
            ));
        }
        if !(0 < t.deep_ocean_floor && t.deep_ocean_floor < t.shelf_floor && t.shelf_floor < t.sea_level) {
            return Err(ConfigError::Invalid(
                "ocean floors must satisfy 0 < deep_ocean_floor < shelf_floor < sea_level".into(),
            ));
        }
        if t.peak_compression_start >= t.max_height {
            return Err(ConfigError::Invalid(
                "peak_compression_start must be below max_height".into(),
            ));
        }
        if t.max_height >= WORLD_HEIGHT || t.sea_level >= WORLD_HEIGHT {
            return Err(ConfigError::Invalid(format!(
                "max_height and sea_level must be below the world height {WORLD_HEIGHT}"
            )));
        }
        if t.coast_band <= 0.0 || t.river_width <= 0.0 {
            return Err(ConfigError::Invalid(
                "coast_band and river_width must be positive".into(),
            ));
        }

        let c = &self.caves;
        if c.min_surface_depth < 1 {
            return Err(ConfigError::Invalid("min_surface_depth must be at least 1".into()));
        }
        if c.worm_min_steps > c.worm_max_steps
            || c.worm_min_radius > c.worm_max_radius
            || c.worm_min_radius <= 0.0
            || c.worm_step_length <= 0.0
        {
            return Err(ConfigError::Invalid(
                "worm step and radius ranges must be positive and ordered".into(),
            ));
        }
        if c.worm_y_min < 1 || c.worm_y_min >= c.worm_y_max {
            return Err(ConfigError::Invalid(
                "worm Y band must satisfy 1 <= worm_y_min < worm_y_max".into(),
            ));
        }
        if c.cavity_y_min < 1 || c.cavity_y_min >= c.cavity_y_max {
            return Err(ConfigError::Invalid(
                "cavity Y band must satisfy 1 <= cavity_y_min < cavity_y_max".into(),
            ));
        }
        if c.worm_y_max >= WORLD_HEIGHT || c.cavity_y_max >= WORLD_HEIGHT {
            return Err(ConfigError::Invalid(format!(
                "cave Y bands must end below the world height {WORLD_HEIGHT}"
            )));
        }

        let k = &self.cache;
        if k.region_capacity == 0 || k.shards == 0 || k.lod_radius <= 0 {
            return Err(ConfigError::Invalid(
                "cache capacity, shard count and LOD radius must be positive".into(),
            ));
        }
        Ok(())
    }
}

// --- Load / Save / Reload ---

impl Config {
    /// Load config from the given directory, or create a default config file.
    pub fn load_or_create(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join("config.ron");

        if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path).map_err(ConfigError::ReadError)?;
            let config: Config = ron::from_str(&contents).map_err(ConfigError::ParseError)?;
            config.worldgen.validate()?;
            log::info!("Loaded config from {}", config_path.display());
            Ok(config)
        } else {
            let config = Config::default();
            config.save(config_dir)?;
            log::info!("Created default config at {}", config_path.display());
            Ok(config)
        }
    }

    /// Save config to the given directory as `config.ron`.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        std::fs::create_dir_all(config_dir).map_err(ConfigError::WriteError)?;

        let config_path = config_dir.join("config.ron");
        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(3)
            .separate_tuple_members(true)
            .enumerate_arrays(false);

        let serialized =
            ron::ser::to_string_pretty(self, pretty).map_err(ConfigError::SerializeError)?;

        std::fs::write(&config_path, serialized).map_err(ConfigError::WriteError)?;
        Ok(())
    }

    /// Hot-reload: returns `Some(new_config)` if the file changed, `None` otherwise.
    ///
    /// A changed `worldgen` section only takes effect for generators built afterwards;
    /// running generators keep the settings they were constructed with.
    pub fn reload(&self, config_dir: &Path) -> Result<Option<Self>, ConfigError> {
        let config_path = config_dir.join("config.ron");
        let contents = std::fs::read_to_string(&config_path).map_err(ConfigError::ReadError)?;
        let new_config: Config = ron::from_str(&contents).map_err(ConfigError::ParseError)?;
        new_config.worldgen.validate()?;

        if &new_config != self {
            log::info!("Config reloaded with changes");
            Ok(Some(new_config))
        } else {
            Ok(None)
        }
    }
}
