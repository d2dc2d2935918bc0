//! Scene construction errors. These all fail setup fast; nothing here is
//! recoverable at runtime.

use orrery_terrain::TerrainError;

/// Errors raised while building the orbital scene.
#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    /// A body was placed on a non-positive orbital radius.
    #[error("orbital distance for body {index} must be strictly positive, got {distance}")]
    NonPositiveDistance {
        /// Body index.
        index: usize,
        /// Offending distance.
        distance: f32,
    },

    /// Orbits would cross: distances must grow strictly outward.
    #[error(
        "orbital distances must be strictly increasing: body {index} at {distance} \
         after {previous}"
    )]
    NonIncreasingDistance {
        /// Body index.
        index: usize,
        /// Offending distance.
        distance: f32,
        /// Distance of the previous body.
        previous: f32,
    },

    /// The per-body parameter records fell out of step with the body list.
    #[error(
        "per-body records out of step: {bodies} bodies, {rings} rings, \
         {terrain} terrain records, {shading} shading records"
    )]
    RecordCountMismatch {
        /// Number of orbiting bodies.
        bodies: usize,
        /// Number of trajectory rings.
        rings: usize,
        /// Number of terrain parameter records.
        terrain: usize,
        /// Number of shading parameter records.
        shading: usize,
    },

    /// A terrain parameter record failed validation.
    #[error(transparent)]
    Terrain(#[from] TerrainError),
}
