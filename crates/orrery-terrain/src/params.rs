//! Terrain parameter records and setup-time validation.

/// Errors produced when validating terrain parameters at scene setup.
#[derive(Debug, thiserror::Error)]
pub enum TerrainError {
    /// Amplitude must be zero or positive.
    #[error("terrain amplitude must be non-negative, got {0}")]
    NegativeAmplitude(f32),

    /// Period divides the sample position; zero or negative values are meaningless.
    #[error("terrain period must be strictly positive, got {0}")]
    NonPositivePeriod(f32),

    /// Lacunarity divides the per-octave period.
    #[error("terrain lacunarity must be strictly positive, got {0}")]
    NonPositiveLacunarity(f32),
}

/// Which height policy shapes the raw noise.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoiseKind {
    /// A single octave of simplex noise scaled by amplitude. Signed relief.
    Simplex,
    /// Fractal noise remapped to \[0, 1\] and raised to `sharpness`.
    /// Produces broad, peaked continents.
    BillowedFractal,
    /// Fractal noise folded through `1 - |n|` and raised to `sharpness`.
    /// Produces sharp ridge lines.
    RidgedFractal,
}

/// Immutable per-planet terrain parameters.
///
/// One record per orbiting body, created at scene setup and read-only
/// thereafter. Validate with [`TerrainParams::validated`] before use.
#[derive(Clone, Debug)]
pub struct TerrainParams {
    /// Height policy applied to the raw noise.
    pub kind: NoiseKind,
    /// Peak height contribution in units of the body's base radius.
    pub amplitude: f32,
    /// Exponent applied by the fractal policies. Higher values concentrate
    /// elevation into fewer, steeper features.
    pub sharpness: f32,
    /// Constant added after the policy, before the zero floor.
    pub offset: f32,
    /// Spatial scale of the lowest octave. Sample positions are divided by
    /// the current period, so larger periods mean broader features.
    pub period: f32,
    /// Amplitude multiplier between successive octaves. Default: 0.5.
    pub persistence: f32,
    /// Period divisor between successive octaves. Default: 2.0.
    pub lacunarity: f32,
    /// Number of octaves composited by the fractal policies.
    pub octaves: u32,
}

impl Default for TerrainParams {
    fn default() -> Self {
        Self {
            kind: NoiseKind::BillowedFractal,
            amplitude: 0.1,
            sharpness: 2.5,
            offset: 0.0,
            period: 0.6,
            persistence: 0.5,
            lacunarity: 2.0,
            octaves: 6,
        }
    }
}

impl TerrainParams {
    /// Validate the record for use at scene setup.
    ///
    /// Returns the record unchanged on success so it can be threaded through
    /// construction with `?`.
    pub fn validated(self) -> Result<Self, TerrainError> {
        if self.amplitude < 0.0 {
            return Err(TerrainError::NegativeAmplitude(self.amplitude));
        }
        if self.period <= 0.0 {
            return Err(TerrainError::NonPositivePeriod(self.period));
        }
        if self.lacunarity <= 0.0 {
            return Err(TerrainError::NonPositiveLacunarity(self.lacunarity));
        }
        Ok(self)
    }
}
