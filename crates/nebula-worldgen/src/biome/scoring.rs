//! Climate scoring strategies: range scoring and weighted Voronoi.

use super::def::BiomeDef;

/// Everything biome selection reads about a column.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BiomeInput {
    /// Temperature in `[0, 1]`.
    pub temperature: f32,
    /// Humidity in `[0, 1]`.
    pub humidity: f32,
    /// Surface height.
    pub height: i32,
    /// Max height difference to the four axis neighbours.
    pub slope: i32,
    pub continentalness: f32,
    /// River mask in `[0, 1]`.
    pub river: f32,
    pub is_ocean: bool,
}

impl BiomeInput {
    /// Whether `def`'s structural gates admit this column.
    pub fn admitted_by(&self, def: &BiomeDef) -> bool {
        def.gates
            .admits(self.height, self.slope, self.continentalness)
    }
}

/// Range score of `def` for a column. Lower is better; `None` rejects.
///
/// The score is the mean normalized distance to the centre of the
/// temperature, humidity and elevation envelopes, with a small bonus per
/// priority step.
pub fn range_score(def: &BiomeDef, input: &BiomeInput) -> Option<f32> {
    let climate = def.climate.as_ref()?;
    if !input.admitted_by(def) {
        return None;
    }
    let height = input.height as f32;
    if !climate.temperature.contains(input.temperature)
        || !climate.humidity.contains(input.humidity)
        || !climate.elevation.contains(height)
    {
        return None;
    }
    let distance = (climate.temperature.normalized_distance(input.temperature)
        + climate.humidity.normalized_distance(input.humidity)
        + climate.elevation.normalized_distance(height))
        / 3.0;
    Some(distance - climate.priority as f32 * 0.05)
}

/// Weighted distance from the column to `def`'s anchor in 0-100 heat/humidity
/// space. `None` when the biome has no anchor or its gates reject the column.
pub fn voronoi_distance(def: &BiomeDef, input: &BiomeInput) -> Option<f32> {
    let anchor = def.anchor.as_ref()?;
    if !input.admitted_by(def) {
        return None;
    }
    let dh = input.temperature * 100.0 - anchor.heat;
    let dm = input.humidity * 100.0 - anchor.humidity;
    Some(crate::seed::det_sqrt(dh * dh + dm * dm) / anchor.weight)
}

/// Pick the lowest-valued candidate. Ties keep the earlier candidate.
pub fn best_of<'a>(
    defs: impl Iterator<Item = &'a BiomeDef>,
    mut value: impl FnMut(&BiomeDef) -> Option<f32>,
) -> Option<&'a BiomeDef> {
    let mut best: Option<(&BiomeDef, f32)> = None;
    for def in defs {
        if let Some(v) = value(def)
            && best.is_none_or(|(_, b)| v < b)
        {
            best = Some((def, v));
        }
    }
    best.map(|(def, _)| def)
}
