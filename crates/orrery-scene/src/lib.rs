//! The orbital scene model: a sun, five orbiting bodies with trajectory
//! rings, their material slots and glow tags, and the uniform circular
//! motion that animates them.

mod color;
mod error;
mod node;
mod scene;

pub use color::hsl_to_rgb;
pub use error::SceneError;
pub use node::SceneNode;
pub use scene::{
    AmbientLightDef, OrbitalScene, OrbitingBody, PointLightDef, RING_SEGMENTS, SceneParams,
    TrajectoryRing,
};
