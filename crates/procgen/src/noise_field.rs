//! Seeded 1D gradient noise for terrain height perturbation.
//!
//! Samples a single row of the `noise` crate's 2D Perlin field. Perlin's
//! quintic s-curve keeps the result C¹ across lattice boundaries.

use noise::{NoiseFn, Perlin};

/// Fixed y coordinate of the sampled row. Off the lattice so vertical
/// gradients still contribute.
const NOISE_ROW: f64 = 0.31;

/// Deterministic 1D noise. Immutable after construction.
#[derive(Debug, Clone)]
pub struct NoiseField {
    seed: u32,
    perlin: Perlin,
}

impl NoiseField {
    pub fn new(seed: u32) -> Self {
        Self {
            seed,
            perlin: Perlin::new(seed),
        }
    }

    /// Single-octave noise at `x * frequency`, in `[-1, 1]`.
    pub fn sample(&self, x: f32, frequency: f32) -> f32 {
        let v = self.perlin.get([(x * frequency) as f64, NOISE_ROW]);
        (v as f32).clamp(-1.0, 1.0)
    }

    /// Fractal sum of `octaves` samples. Each octave doubles the frequency
    /// and multiplies the amplitude by `persistence`; the sum is divided by
    /// the total amplitude, so the result stays in `[-1, 1]`.
    pub fn octave_sample(&self, x: f32, frequency: f32, octaves: u32, persistence: f32) -> f32 {
        let mut total = 0.0;
        let mut amplitude = 1.0;
        let mut max_amplitude = 0.0;
        let mut freq = frequency;

        for _ in 0..octaves {
            total += self.sample(x, freq) * amplitude;
            max_amplitude += amplitude;
            amplitude *= persistence;
            freq *= 2.0;
        }

        if max_amplitude > 0.0 {
            (total / max_amplitude).clamp(-1.0, 1.0)
        } else {
            0.0
        }
    }

    pub fn seed(&self) -> u32 {
        self.seed
    }
}
