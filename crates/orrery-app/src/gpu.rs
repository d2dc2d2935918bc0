//! GPU resources owned by the scene context.
//!
//! The context works headlessly until the host hands over a device; all the
//! state logic (orbits, transitions, the darken/restore contract) runs the
//! same either way.

use std::collections::HashMap;

use orrery_render::{
    BloomSettings, LightUniform, MeshId, MeshKind, ScenePipeline, SelectiveBloomPipeline,
    SkyboxPipeline, TargetExtent, TextureHandle, generate_icosphere, generate_ring,
};
use orrery_scene::{OrbitalScene, RING_SEGMENTS};

/// Subdivision level for the shared body/sun icosphere.
const ICOSPHERE_SUBDIVISIONS: u32 = 3;

/// One frame's GPU handles, borrowed from the host's swapchain loop.
pub struct GpuFrame<'a> {
    /// Command encoder the frame's passes are recorded into.
    pub encoder: &'a mut wgpu::CommandEncoder,
    /// The swapchain view receiving the final tone-mapped image.
    pub surface_view: &'a wgpu::TextureView,
}

/// Device, pipelines, and uploaded meshes.
pub struct GpuState {
    pub(crate) device: wgpu::Device,
    pub(crate) queue: wgpu::Queue,
    pub(crate) scene_pipeline: ScenePipeline,
    pub(crate) bloom: SelectiveBloomPipeline,
    pub(crate) skybox: SkyboxPipeline,
    icosphere: MeshId,
    ring_meshes: HashMap<usize, MeshId>,
}

impl GpuState {
    /// Build every pipeline and upload the scene's meshes.
    pub(crate) fn new(
        device: wgpu::Device,
        queue: wgpu::Queue,
        surface_format: wgpu::TextureFormat,
        extent: TargetExtent,
        settings: BloomSettings,
        scene: &OrbitalScene,
    ) -> Self {
        let bloom = SelectiveBloomPipeline::new(&device, surface_format, extent, settings);

        let point = scene.point_light();
        let ambient = scene.ambient_light();
        let lights = LightUniform {
            point: [point.color[0], point.color[1], point.color[2], point.intensity],
            ambient: [
                ambient.color[0],
                ambient.color[1],
                ambient.color[2],
                ambient.intensity,
            ],
        };
        let mut scene_pipeline =
            ScenePipeline::new(&device, &queue, bloom.hdr_format(), extent, lights);
        let skybox = SkyboxPipeline::new(&device, bloom.hdr_format());

        let icosphere =
            scene_pipeline.upload_mesh(&device, &generate_icosphere(ICOSPHERE_SUBDIVISIONS));
        // Rings carry their radii in the geometry, so each gets its own mesh.
        let mut ring_meshes = HashMap::new();
        for (index, node) in scene.nodes().iter().enumerate() {
            if let MeshKind::Ring { inner, outer } = node.mesh {
                let mesh =
                    scene_pipeline.upload_mesh(&device, &generate_ring(inner, outer, RING_SEGMENTS));
                ring_meshes.insert(index, mesh);
            }
        }
        log::debug!(
            "gpu state ready: icosphere + {} ring meshes",
            ring_meshes.len()
        );

        Self {
            device,
            queue,
            scene_pipeline,
            bloom,
            skybox,
            icosphere,
            ring_meshes,
        }
    }

    /// Upload RGBA pixels under an opaque texture handle.
    pub(crate) fn scene_pipeline_register(
        &mut self,
        handle: TextureHandle,
        pixels: &[[u8; 4]],
        width: u32,
        height: u32,
    ) {
        self.scene_pipeline
            .register_texture(&self.device, &self.queue, handle, pixels, width, height);
    }

    /// Mesh id for the node at `index`.
    pub(crate) fn mesh_for(&self, index: usize, kind: &MeshKind) -> MeshId {
        match kind {
            MeshKind::Icosphere => self.icosphere,
            MeshKind::Ring { .. } => self
                .ring_meshes
                .get(&index)
                .copied()
                .unwrap_or(self.icosphere),
        }
    }
}
