//! The orrery scene context.
//!
//! [`SceneContext`] owns the whole animated scene (orbital model, camera,
//! controls, transition state machine, and the selective-bloom compositor)
//! and exposes the operations the embedding host drives each frame:
//! `select`, `is_zoomed`, `update`, `render`, and `resize`.

mod context;
mod gpu;

pub use context::{ContextError, SceneContext};
pub use gpu::GpuFrame;
