//! Procedural terrain heights for planet surfaces.
//!
//! A fixed-seed 3D simplex noise primitive, multi-octave fractal composition,
//! and the height policies (raw, billowed, ridged) that turn noise into
//! never-negative surface elevation. Everything here is deterministic given
//! its inputs; there is no per-planet seed.

mod params;
mod sampler;

pub use params::{NoiseKind, TerrainError, TerrainParams};
pub use sampler::TerrainSampler;
