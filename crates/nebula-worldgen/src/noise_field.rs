//! Multi-octave noise fields over simplex noise.
//!
//! A [`NoiseField`] composites octaves of simplex noise (fractal Brownian
//! motion or ridged) and maps the result through an optional abs step, an
//! offset/scale pair and an optional ease. Output is always normalized by the amplitude sum
//! of the *full* octave count, so dropping high octaves for a coarse LOD only
//! removes fine detail and never rescales the broad shapes.

use noise::{NoiseFn, Simplex};

use crate::seed::WorldSeed;

/// How octaves are combined.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoiseKind {
    /// Signed fractal Brownian motion, roughly `[-1, 1]`.
    Fbm,
    /// Sum of `1 - |n|` per octave, roughly `[0, 1]`, sharp crests at zero crossings.
    Ridged,
}

/// Post-processing flags.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FieldFlags {
    /// Take the absolute value of the combined signal before mapping.
    pub abs: bool,
    /// Smoothstep the mapped value, clamping it to `[0, 1]`.
    pub eased: bool,
}

/// Parameters of one noise field.
#[derive(Clone, Debug, PartialEq)]
pub struct NoiseParams {
    /// Sub-seed offset mixed into the world seed.
    pub seed_offset: u64,
    /// Octave combination.
    pub kind: NoiseKind,
    /// Wavelength of the first octave per axis `[x, y, z]`, in blocks.
    pub spread: [f64; 3],
    /// Number of octaves at full resolution.
    pub octaves: u32,
    /// Amplitude multiplier between successive octaves.
    pub persistence: f64,
    /// Frequency multiplier between successive octaves.
    pub lacunarity: f64,
    /// Added after scaling.
    pub offset: f32,
    /// Multiplies the normalized signal.
    pub scale: f32,
    /// Abs and ease post-processing.
    pub flags: FieldFlags,
}

impl NoiseParams {
    /// Signed fBm with the same spread on every axis, offset 0 and scale 1.
    pub fn fbm(seed_offset: u64, spread: f64, octaves: u32) -> Self {
        Self {
            seed_offset,
            kind: NoiseKind::Fbm,
            spread: [spread; 3],
            octaves,
            persistence: 0.5,
            lacunarity: 2.0,
            offset: 0.0,
            scale: 1.0,
            flags: FieldFlags::default(),
        }
    }

    /// Ridged multi-octave noise with the same spread on every axis.
    pub fn ridged(seed_offset: u64, spread: f64, octaves: u32) -> Self {
        Self {
            kind: NoiseKind::Ridged,
            ..Self::fbm(seed_offset, spread, octaves)
        }
    }

    /// Set a per-axis spread.
    pub fn with_spread(mut self, spread: [f64; 3]) -> Self {
        self.spread = spread;
        self
    }

    /// Set the octave persistence.
    pub fn with_persistence(mut self, persistence: f64) -> Self {
        self.persistence = persistence;
        self
    }

    /// Set the output mapping `offset + scale * signal`.
    pub fn with_mapping(mut self, offset: f32, scale: f32) -> Self {
        self.offset = offset;
        self.scale = scale;
        self
    }

    /// Take the absolute value before mapping.
    pub fn abs(mut self) -> Self {
        self.flags.abs = true;
        self
    }

    /// Smoothstep the mapped value. The mapping should target `[0, 1]`.
    pub fn eased(mut self) -> Self {
        self.flags.eased = true;
        self
    }
}

/// A seeded, parameterized multi-octave noise field.
pub struct NoiseField {
    noise: Simplex,
    params: NoiseParams,
    amplitude_sum: f64,
}

impl NoiseField {
    /// Create a field whose noise seed is derived from `seed` and the params' offset.
    pub fn new(seed: WorldSeed, params: NoiseParams) -> Self {
        let noise = Simplex::new(seed.noise_seed(params.seed_offset));
        let amplitude_sum = amplitude_sum(params.octaves.max(1), params.persistence);
        Self {
            noise,
            params,
            amplitude_sum,
        }
    }

    /// Sample the field in 2D (`x`, `z`), dropping `reduction` high octaves.
    pub fn sample_2d(&self, x: f64, z: f64, reduction: u32) -> f32 {
        let fx = x / self.params.spread[0];
        let fz = z / self.params.spread[2];
        let raw = self.accumulate(reduction, |freq| self.noise.get([fx * freq, fz * freq]));
        self.finish(raw)
    }

    /// Sample the field in 3D, dropping `reduction` high octaves.
    pub fn sample_3d(&self, x: f64, y: f64, z: f64, reduction: u32) -> f32 {
        let fx = x / self.params.spread[0];
        let fy = y / self.params.spread[1];
        let fz = z / self.params.spread[2];
        let raw = self.accumulate(reduction, |freq| {
            self.noise.get([fx * freq, fy * freq, fz * freq])
        });
        self.finish(raw)
    }

    /// Octaves actually evaluated for a given reduction. Never fewer than one.
    pub fn octaves_for(&self, reduction: u32) -> u32 {
        self.params.octaves.saturating_sub(reduction).max(1)
    }

    /// Amplitude sum of the full octave count, used as the normalizer.
    pub fn max_amplitude(&self) -> f64 {
        self.amplitude_sum
    }

    /// Return a reference to the field parameters.
    pub fn params(&self) -> &NoiseParams {
        &self.params
    }

    fn accumulate(&self, reduction: u32, octave: impl Fn(f64) -> f64) -> f64 {
        let mut total = 0.0;
        let mut frequency = 1.0;
        let mut amplitude = 1.0;

        for _ in 0..self.octaves_for(reduction) {
            let n = octave(frequency);
            total += match self.params.kind {
                NoiseKind::Fbm => n,
                NoiseKind::Ridged => 1.0 - n.abs(),
            } * amplitude;

            frequency *= self.params.lacunarity;
            amplitude *= self.params.persistence;
        }

        total / self.amplitude_sum
    }

    fn finish(&self, raw: f64) -> f32 {
        let mut v = raw as f32;
        if self.params.flags.abs {
            v = v.abs();
        }
        let mapped = self.params.offset + self.params.scale * v;
        if self.params.flags.eased {
            smoothstep(0.0, 1.0, mapped)
        } else {
            mapped
        }
    }
}

fn amplitude_sum(octaves: u32, persistence: f64) -> f64 {
    let mut sum = 0.0;
    let mut amp = 1.0;
    for _ in 0..octaves {
        sum += amp;
        amp *= persistence;
    }
    sum
}

// ---------------------------------------------------------------------------
// Shaping helpers shared across the pipeline
// ---------------------------------------------------------------------------

/// Hermite smoothstep of `x` between `edge0` and `edge1`, clamped to `[0, 1]`.
#[inline]
pub fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    if edge1 <= edge0 {
        return if x < edge0 { 0.0 } else { 1.0 };
    }
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Linear interpolation.
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Position of `x` between `a` and `b`, clamped to `[0, 1]`.
#[inline]
pub fn inverse_lerp(a: f32, b: f32, x: f32) -> f32 {
    if b == a {
        return 0.0;
    }
    ((x - a) / (b - a)).clamp(0.0, 1.0)
}
