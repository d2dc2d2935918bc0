//! Rendering for the orbital background scene.
//!
//! CPU side: camera matrices, material slots, mesh generation, the
//! selective-bloom darken/restore orchestration, and render-target sizing.
//! GPU side: wgpu pipelines for scene drawing, the bloom chain, and the
//! skybox, all driven by a single command encoder per frame.

mod bloom;
mod camera;
mod compositor;
mod error;
mod material;
mod mesh;
mod scene_pipeline;
mod skybox;
mod targets;

pub use bloom::{BLOOM_MIX_FACTOR, BloomSettings, SelectiveBloomPipeline};
pub use camera::{Camera, CameraUniform};
pub use compositor::{BloomCompositor, FrameStats, GlowNode};
pub use error::RenderError;
pub use material::{MaterialDef, MaterialSlot, TextureHandle};
pub use mesh::{MeshData, MeshKind, Vertex, generate_icosphere, generate_ring};
pub use scene_pipeline::{LightUniform, MeshId, NodeUniform, SCENE_SHADER_SOURCE, SceneDraw, ScenePipeline};
pub use skybox::{SKYBOX_SHADER_SOURCE, SkyboxPipeline};
pub use targets::TargetExtent;
