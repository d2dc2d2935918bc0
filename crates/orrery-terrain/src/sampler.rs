//! Fixed-seed noise sampler: simplex primitive, fractal composition, height policy.

use glam::Vec3;
use noise::{NoiseFn, Simplex};

use crate::params::{NoiseKind, TerrainParams};

/// Seed for the shared gradient-noise permutation table. Surface detail is a
/// constant of the system; two samplers always agree on every point.
const NOISE_SEED: u32 = 289;

/// Evaluates terrain heights from 3D simplex noise.
///
/// The sampler owns the noise primitive's permutation table, built once from
/// [`NOISE_SEED`]. Every method is a pure function of its arguments: the same
/// parameters and position always produce a bit-identical result.
pub struct TerrainSampler {
    noise: Simplex,
}

impl TerrainSampler {
    /// Create a sampler over the fixed permutation table.
    pub fn new() -> Self {
        Self {
            noise: Simplex::new(NOISE_SEED),
        }
    }

    /// Raw 3D simplex noise at `point`, in \[-1, 1\].
    pub fn noise3(&self, point: Vec3) -> f32 {
        self.noise
            .get([point.x as f64, point.y as f64, point.z as f64]) as f32
    }

    /// Multi-octave fractal noise, normalized to \[-1, 1\].
    ///
    /// Octave `i` samples at `point / current_period` with weight `a`, where
    /// `a` starts at 1 and is multiplied by `persistence` each octave while
    /// the period is divided by `lacunarity`. The sum is divided by the
    /// accumulated weight so the bound holds for any octave count.
    /// Zero octaves yield 0 (no division by zero).
    pub fn fractal(
        &self,
        point: Vec3,
        period: f32,
        persistence: f32,
        lacunarity: f32,
        octaves: u32,
    ) -> f32 {
        if octaves == 0 {
            return 0.0;
        }

        let mut sum = 0.0;
        let mut amplitude = 1.0;
        let mut max_amplitude = 0.0;
        let mut current_period = period;

        for _ in 0..octaves {
            sum += amplitude * self.noise3(point / current_period);
            max_amplitude += amplitude;
            amplitude *= persistence;
            current_period /= lacunarity;
        }

        sum / max_amplitude
    }

    /// Terrain height at `point` under `params`.
    ///
    /// Applies the height policy for `params.kind`, adds `params.offset`,
    /// and floors the result at zero so the surface never dips below the
    /// body's base radius. Fractal kinds with zero octaves are defined as
    /// height 0.
    pub fn height(&self, params: &TerrainParams, point: Vec3) -> f32 {
        if params.octaves == 0 && params.kind != NoiseKind::Simplex {
            return 0.0;
        }

        let shaped = match params.kind {
            NoiseKind::Simplex => params.amplitude * self.noise3(point / params.period),
            NoiseKind::BillowedFractal => {
                let n = self.fractal(
                    point,
                    params.period,
                    params.persistence,
                    params.lacunarity,
                    params.octaves,
                );
                // Remap [-1, 1] to [0, 1]; the power sharpens the upper end
                // into isolated continents.
                params.amplitude * (((n + 1.0) * 0.5).max(0.0)).powf(params.sharpness)
            }
            NoiseKind::RidgedFractal => {
                let n = self.fractal(
                    point,
                    params.period,
                    params.persistence,
                    params.lacunarity,
                    params.octaves,
                );
                params.amplitude * ((1.0 - n.abs()).max(0.0)).powf(params.sharpness)
            }
        };

        (shaped + params.offset).max(0.0)
    }
}

impl Default for TerrainSampler {
    fn default() -> Self {
        Self::new()
    }
}
