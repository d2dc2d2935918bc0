//! Camera control and the overview/locked transition state machine.
//!
//! Free-orbit controls, easing functions, explicit animation descriptors,
//! and the two-state machine that freezes orbital time while the camera is
//! locked onto a body.

mod animation;
mod easing;
mod orbit;
mod transition;

pub use animation::{AnimOutput, AnimTarget, AnimValue, Animation, AnimationSet};
pub use easing::Easing;
pub use orbit::OrbitControls;
pub use transition::{
    SceneSnapshot, TRANSITION_DURATION, ViewState, ViewTransition,
};
