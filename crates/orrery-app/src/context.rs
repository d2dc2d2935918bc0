//! The scene context: one struct owning every piece of the orbital scene.

use std::collections::HashMap;

use glam::Vec3;

use orrery_config::Config;
use orrery_controls::{AnimOutput, AnimTarget, OrbitControls, SceneSnapshot, ViewTransition};
use orrery_planet::bake_surface_texture;
use orrery_render::{
    BloomCompositor, BloomSettings, Camera, FrameStats, MaterialDef, RenderError, SceneDraw,
    TargetExtent, TextureHandle,
};
use orrery_scene::{OrbitalScene, SceneError, SceneParams};
use orrery_terrain::TerrainSampler;

use crate::gpu::{GpuFrame, GpuState};

/// Baked surface textures use handles above this base so they can never
/// collide with handles issued by the external asset loader.
const BAKED_HANDLE_BASE: u32 = 0x8000_0000;

/// Equirectangular bake resolution for the locked-on body.
const SURFACE_TEXTURE_WIDTH: u32 = 512;
const SURFACE_TEXTURE_HEIGHT: u32 = 256;

/// Errors that abort scene construction.
#[derive(Debug, thiserror::Error)]
pub enum ContextError {
    /// The orbital scene rejected its setup parameters.
    #[error("scene construction failed: {0}")]
    Scene(#[from] SceneError),

    /// The initial render-target extent is unusable.
    #[error("render setup failed: {0}")]
    Render(#[from] RenderError),
}

/// A surface texture baked from a body's terrain/shading records.
struct BakedSurface {
    handle: TextureHandle,
    pixels: Vec<[u8; 4]>,
}

/// The animated orbital scene and everything that drives it.
///
/// The embedding host calls [`update`](Self::update) then
/// [`render`](Self::render) once per frame, forwards selection events to
/// [`select`](Self::select), reads [`is_zoomed`](Self::is_zoomed), and calls
/// [`resize`](Self::resize) between frames when the viewport changes.
pub struct SceneContext {
    scene: OrbitalScene,
    camera: Camera,
    controls: OrbitControls,
    transition: ViewTransition,
    compositor: BloomCompositor,
    sampler: TerrainSampler,
    extent: TargetExtent,
    bloom_settings: BloomSettings,
    time_scale: f64,
    show_frame_stats: bool,
    last_now: Option<f64>,
    baked: HashMap<usize, BakedSurface>,
    saved_material: Option<(usize, MaterialDef)>,
    gpu: Option<GpuState>,
}

impl SceneContext {
    /// Build the scene from configuration. Fails fast on invalid setup
    /// parameters; nothing is rendered until the first frame.
    pub fn new(config: &Config) -> Result<Self, ContextError> {
        let scene = OrbitalScene::generate(&SceneParams {
            seed: config.scene.seed,
            body_count: config.scene.body_count,
        })?;
        let extent = TargetExtent::new(config.window.width, config.window.height)?;
        let camera = Camera::overview(extent.aspect_ratio());
        let transition = ViewTransition::new(&camera);

        Ok(Self {
            scene,
            camera,
            controls: OrbitControls::new(),
            transition,
            compositor: BloomCompositor,
            sampler: TerrainSampler::new(),
            extent,
            bloom_settings: BloomSettings {
                threshold: config.bloom.threshold,
                strength: config.bloom.strength,
                radius: config.bloom.radius,
                exposure: config.bloom.exposure,
            },
            time_scale: config.scene.time_scale,
            show_frame_stats: config.debug.show_fps,
            last_now: None,
            baked: HashMap::new(),
            saved_material: None,
            gpu: None,
        })
    }

    /// Create GPU pipelines for the given device and surface format.
    ///
    /// Until this is called the context runs headless: `render(None)` still
    /// exercises the darken/restore contract.
    pub fn init_gpu(
        &mut self,
        device: wgpu::Device,
        queue: wgpu::Queue,
        surface_format: wgpu::TextureFormat,
    ) {
        let mut gpu = GpuState::new(
            device,
            queue,
            surface_format,
            self.extent,
            self.bloom_settings.clone(),
            &self.scene,
        );
        // Textures baked while headless get uploaded now.
        for surface in self.baked.values() {
            gpu.scene_pipeline_register(
                surface.handle,
                &surface.pixels,
                SURFACE_TEXTURE_WIDTH,
                SURFACE_TEXTURE_HEIGHT,
            );
        }
        self.gpu = Some(gpu);
    }

    /// Handle a selection event from the external UI.
    ///
    /// `-1` returns to the overview; `0..body_count` locks onto that body.
    /// Anything else, or a request invalid in the current state, is a silent
    /// no-op.
    pub fn select(&mut self, button: i32) {
        if button < 0 {
            self.exit_locked();
        } else {
            self.enter_locked(button as usize);
        }
    }

    /// Whether the camera is locked onto a body (or transitioning there).
    /// The only state the external UI reads.
    pub fn is_zoomed(&self) -> bool {
        self.transition.is_zoomed()
    }

    /// Advance the scene to wall-clock time `now` (in time units).
    ///
    /// Applies this frame's animation outputs and the auto-rotate while
    /// locked. Orbital motion advances only while not zoomed.
    pub fn update(&mut self, now: f64) {
        let dt = match self.last_now {
            Some(previous) => (now - previous).max(0.0),
            None => 0.0,
        };
        self.last_now = Some(now);

        for output in self.transition.advance(dt) {
            self.apply_animation(output);
        }

        if self.transition.is_zoomed() {
            self.controls.apply_auto_rotate(&mut self.camera, dt);
        } else {
            let t = self.transition.scene_time(now) * self.time_scale;
            self.scene.advance(t);
        }
        self.camera.target = self.controls.target;
    }

    /// Render one frame.
    ///
    /// Runs the selective-bloom sequence: darken pass, glow-scene render,
    /// restore pass (with the nothing-left-shadowed invariant), base-scene
    /// render, and the bloom/composite chain. Without GPU state or a frame,
    /// the material-slot passes still run so the contract holds headlessly.
    pub fn render(&mut self, frame: Option<GpuFrame<'_>>) -> Result<FrameStats, RenderError> {
        let stats = match (&mut self.gpu, frame) {
            (Some(gpu), Some(frame)) => {
                gpu.scene_pipeline
                    .set_camera(&gpu.queue, self.camera.to_uniform());

                let darkened = self.compositor.darken_non_glow(self.scene.nodes_mut());
                let glow_draws = collect_draws(&self.scene, gpu);
                let glow_view = gpu.bloom.glow_scene_view();
                gpu.scene_pipeline.draw(
                    &gpu.device,
                    &gpu.queue,
                    frame.encoder,
                    glow_view,
                    &glow_draws,
                    wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                    "glow-scene",
                );
                let restored = self.compositor.restore_all(self.scene.nodes_mut())?;

                let base_draws = collect_draws(&self.scene, gpu);
                let base_view = gpu.bloom.base_scene_view();
                let load = if gpu.skybox.has_cubemap() {
                    gpu.skybox
                        .draw(&gpu.queue, frame.encoder, base_view, &self.camera);
                    wgpu::LoadOp::Load
                } else {
                    wgpu::LoadOp::Clear(wgpu::Color::BLACK)
                };
                gpu.scene_pipeline.draw(
                    &gpu.device,
                    &gpu.queue,
                    frame.encoder,
                    base_view,
                    &base_draws,
                    load,
                    "base-scene",
                );

                gpu.bloom.execute(frame.encoder, frame.surface_view);
                FrameStats { darkened, restored }
            }
            _ => {
                let darkened = self.compositor.darken_non_glow(self.scene.nodes_mut());
                let restored = self.compositor.restore_all(self.scene.nodes_mut())?;
                FrameStats { darkened, restored }
            }
        };

        if self.show_frame_stats {
            log::debug!(
                "frame: {} darkened, {} restored",
                stats.darkened,
                stats.restored
            );
        }
        Ok(stats)
    }

    /// Resize the viewport.
    ///
    /// Updates the camera aspect and recreates every render target before
    /// the next frame. An unusable size is rejected and the previous
    /// targets are kept.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), RenderError> {
        let changed = match self.extent.resize(width, height) {
            Ok(changed) => changed,
            Err(err) => {
                log::warn!("resize to {width}x{height} rejected: {err}");
                return Err(err);
            }
        };
        if !changed {
            return Ok(());
        }
        self.camera.set_aspect_ratio(width, height);
        if let Some(gpu) = &mut self.gpu {
            gpu.bloom.resize(&gpu.device, self.extent);
            gpu.scene_pipeline.resize(&gpu.device, self.extent);
        }
        log::debug!("viewport resized to {width}x{height}");
        Ok(())
    }

    /// Store the skybox cubemap handle delivered by the asset loader.
    pub fn set_skybox(&mut self, handle: TextureHandle) {
        self.scene.set_skybox(handle);
    }

    /// Attach the sun surface texture delivered by the asset loader.
    pub fn set_sun_texture(&mut self, handle: TextureHandle) {
        self.scene.set_sun_texture(handle);
    }

    /// Upload decoded RGBA pixels for an asset-loader texture handle.
    /// No-op until GPU state exists.
    pub fn upload_texture_pixels(
        &mut self,
        handle: TextureHandle,
        pixels: &[[u8; 4]],
        width: u32,
        height: u32,
    ) {
        match &mut self.gpu {
            Some(gpu) => gpu.scene_pipeline_register(handle, pixels, width, height),
            None => log::debug!("texture upload for {handle:?} ignored: no gpu state"),
        }
    }

    /// Upload the six decoded skybox faces. No-op until GPU state exists.
    pub fn upload_skybox_faces(&mut self, faces: &[Vec<[u8; 4]>; 6], face_size: u32) {
        match &mut self.gpu {
            Some(gpu) => gpu
                .skybox
                .set_cubemap(&gpu.device, &gpu.queue, faces, face_size),
            None => log::debug!("skybox upload ignored: no gpu state"),
        }
    }

    /// The orbital scene, for host-side inspection.
    pub fn scene(&self) -> &OrbitalScene {
        &self.scene
    }

    /// The camera, for host-side inspection.
    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    /// Current render-target extent.
    pub fn extent(&self) -> TargetExtent {
        self.extent
    }

    /// Forward an orbit input delta to the controls.
    pub fn orbit_input(&mut self, delta_yaw: f32, delta_pitch: f32) {
        self.controls.orbit(&mut self.camera, delta_yaw, delta_pitch);
    }

    /// Forward a zoom input to the controls. Gated while locked.
    pub fn zoom_input(&mut self, amount: f32) {
        self.controls.zoom(&mut self.camera, amount);
    }

    /// Forward a pan input to the controls. Gated while locked.
    pub fn pan_input(&mut self, dx: f32, dy: f32) {
        self.controls.pan(&mut self.camera, dx, dy);
    }

    fn enter_locked(&mut self, index: usize) {
        let snapshot = self.snapshot();
        let now = self.last_now.unwrap_or(0.0);
        let started =
            self.transition
                .enter_locked(index, &snapshot, &self.camera, &mut self.controls, now);
        if !started {
            return;
        }

        // The locked-on body swaps to its baked procedural surface; the
        // static material comes back on unlock.
        if let Some(material) = self.baked_material(index)
            && let Some(previous) = self.scene.swap_body_material(index, material)
        {
            self.saved_material = Some((index, previous));
        }
    }

    fn exit_locked(&mut self) {
        let snapshot = self.snapshot();
        let now = self.last_now.unwrap_or(0.0);
        let Some(focus) =
            self.transition
                .exit_locked(&snapshot, &self.camera, &mut self.controls, now)
        else {
            return;
        };

        // Rings reattach before their fade-in animation runs.
        for i in 0..self.scene.body_count() {
            self.scene.set_ring_visible(i, true);
        }
        if let Some((index, material)) = self.saved_material.take() {
            debug_assert_eq!(index, focus);
            self.scene.swap_body_material(index, material);
        }
    }

    /// Bake (or fetch the cached) procedural surface material for a body.
    fn baked_material(&mut self, index: usize) -> Option<MaterialDef> {
        if !self.baked.contains_key(&index) {
            let terrain = self.scene.terrain(index)?.clone();
            let shading = self.scene.shading(index)?.clone();
            let pixels = bake_surface_texture(
                &self.sampler,
                &terrain,
                &shading,
                1.0,
                SURFACE_TEXTURE_WIDTH,
                SURFACE_TEXTURE_HEIGHT,
            );
            let handle = TextureHandle(BAKED_HANDLE_BASE + index as u32);
            if let Some(gpu) = &mut self.gpu {
                gpu.scene_pipeline_register(
                    handle,
                    &pixels,
                    SURFACE_TEXTURE_WIDTH,
                    SURFACE_TEXTURE_HEIGHT,
                );
            }
            self.baked.insert(index, BakedSurface { handle, pixels });
            log::debug!("baked procedural surface for body {index}");
        }

        let surface = self.baked.get(&index)?;
        Some(MaterialDef {
            color: [1.0, 1.0, 1.0],
            unlit: false,
            opacity: 1.0,
            texture: Some(surface.handle),
        })
    }

    fn snapshot(&self) -> SceneSnapshot {
        let count = self.scene.body_count();
        let mut snapshot = SceneSnapshot {
            body_positions: Vec::with_capacity(count),
            body_scales: Vec::with_capacity(count),
            base_scales: Vec::with_capacity(count),
            ring_opacities: Vec::with_capacity(count),
        };
        for i in 0..count {
            snapshot
                .body_positions
                .push(self.scene.body_position(i).unwrap_or(Vec3::ZERO));
            snapshot
                .body_scales
                .push(self.scene.body_scale(i).unwrap_or(1.0));
            snapshot
                .base_scales
                .push(self.scene.body(i).map(|b| b.base_scale).unwrap_or(1.0));
            snapshot
                .ring_opacities
                .push(self.scene.ring_opacity(i).unwrap_or(1.0));
        }
        snapshot
    }

    fn apply_animation(&mut self, output: AnimOutput) {
        match output.target {
            AnimTarget::CameraPosition => {
                if let Some(position) = output.value.as_vector() {
                    self.camera.position = position;
                }
            }
            AnimTarget::ControlsTarget => {
                if let Some(target) = output.value.as_vector() {
                    self.controls.target = target;
                }
            }
            AnimTarget::BodyScale(index) => {
                if let Some(scale) = output.value.as_scalar() {
                    self.scene.set_body_scale(index, scale);
                }
            }
            AnimTarget::RingOpacity(index) => {
                if let Some(opacity) = output.value.as_scalar() {
                    self.scene.set_ring_opacity(index, opacity);
                    // A completed fade-out detaches the ring from the graph.
                    if output.finished && opacity <= f32::EPSILON {
                        self.scene.set_ring_visible(index, false);
                    }
                }
            }
        }
    }
}

/// Collect the draw list for one scene pass: visible nodes with non-zero
/// scale, materials resolved through their slots.
fn collect_draws(scene: &OrbitalScene, gpu: &GpuState) -> Vec<SceneDraw> {
    scene
        .nodes()
        .iter()
        .enumerate()
        .filter(|(_, node)| node.visible && node.scale > 0.0)
        .map(|(index, node)| SceneDraw {
            mesh: gpu.mesh_for(index, &node.mesh),
            model: node.model_matrix(),
            material: node.slot.render_material(),
        })
        .collect()
}
