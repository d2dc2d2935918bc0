//! Selective bloom GPU chain: brightness extract, separable blur, additive
//! merge, and the Reinhard output pass.
//!
//! The scene is drawn twice per frame by [`crate::ScenePipeline`]: once with
//! non-glow nodes darkened (into the glow target feeding this chain) and once
//! normally (into the base target). This module turns those two images into
//! the final frame.

use bytemuck::{Pod, Zeroable};

use crate::targets::TargetExtent;

/// Fixed factor applied to the bloom image in the merge pass.
pub const BLOOM_MIX_FACTOR: f32 = 0.2;

/// Number of horizontal+vertical blur round trips.
const BLUR_ITERATIONS: u32 = 5;

/// 9-tap Gaussian weights (center + 4 mirrored taps), sigma ≈ 1.5.
pub const GAUSSIAN_WEIGHTS: [f32; 5] = [
    0.227_027_03,
    0.194_594_6,
    0.121_621_62,
    0.054_054_055,
    0.016_216_216,
];

/// Bloom tuning parameters.
#[derive(Clone, Debug)]
pub struct BloomSettings {
    /// Luminance floor for the extract pass. The orbital scene keeps this at
    /// 0: darkening non-glow nodes is what restricts the glow. Default: 0.0.
    pub threshold: f32,
    /// Bloom intensity multiplier applied in the merge pass together with
    /// [`BLOOM_MIX_FACTOR`]. Default: 1.0.
    pub strength: f32,
    /// Blur tap offset scale. Default: 0.5.
    pub radius: f32,
    /// Exposure applied by the Reinhard output pass. Default: 1.0.
    pub exposure: f32,
}

impl Default for BloomSettings {
    fn default() -> Self {
        Self {
            threshold: 0.0,
            strength: 1.0,
            radius: 0.5,
            exposure: 1.0,
        }
    }
}

/// GPU uniform mirroring [`BloomSettings`].
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub(crate) struct BloomParams {
    pub threshold: f32,
    pub strength: f32,
    pub radius: f32,
    pub exposure: f32,
}

/// GPU uniform selecting the blur axis.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub(crate) struct BlurParams {
    pub direction: [f32; 2],
    pub _padding: [f32; 2],
}

/// WGSL source for every bloom pass.
pub const BLOOM_SHADER_SOURCE: &str = r#"
struct BloomParams {
    threshold: f32,
    strength: f32,
    radius: f32,
    exposure: f32,
};

struct BlurParams {
    direction: vec2<f32>,
    _padding: vec2<f32>,
};

struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

@group(0) @binding(0) var<uniform> params: BloomParams;
@group(0) @binding(1) var<uniform> blur: BlurParams;
@group(1) @binding(0) var input_tex: texture_2d<f32>;
@group(1) @binding(1) var input_sampler: sampler;
@group(2) @binding(0) var bloom_tex: texture_2d<f32>;
@group(2) @binding(1) var bloom_sampler: sampler;

@vertex
fn vs_fullscreen(@builtin(vertex_index) idx: u32) -> VertexOutput {
    let uv = vec2<f32>(f32((idx << 1u) & 2u), f32(idx & 2u));
    var out: VertexOutput;
    out.position = vec4<f32>(uv * 2.0 - 1.0, 0.0, 1.0);
    out.uv = vec2<f32>(uv.x, 1.0 - uv.y);
    return out;
}

@fragment
fn fs_extract(in: VertexOutput) -> @location(0) vec4<f32> {
    let color = textureSample(input_tex, input_sampler, in.uv).rgb;
    let luminance = dot(color, vec3<f32>(0.2126, 0.7152, 0.0722));
    if luminance <= params.threshold {
        return vec4<f32>(0.0, 0.0, 0.0, 1.0);
    }
    return vec4<f32>(color, 1.0);
}

@fragment
fn fs_blur(in: VertexOutput) -> @location(0) vec4<f32> {
    let dims = vec2<f32>(textureDimensions(input_tex));
    let texel = blur.direction * params.radius / dims;
    let weights = array<f32, 5>(0.22702703, 0.1945946, 0.12162162, 0.054054055, 0.016216216);

    var acc = textureSample(input_tex, input_sampler, in.uv).rgb * weights[0];
    for (var i = 1; i < 5; i = i + 1) {
        let offset = texel * f32(i);
        acc += textureSample(input_tex, input_sampler, in.uv + offset).rgb * weights[i];
        acc += textureSample(input_tex, input_sampler, in.uv - offset).rgb * weights[i];
    }
    return vec4<f32>(acc, 1.0);
}

@fragment
fn fs_merge(in: VertexOutput) -> @location(0) vec4<f32> {
    let base = textureSample(input_tex, input_sampler, in.uv).rgb;
    let glow = textureSample(bloom_tex, bloom_sampler, in.uv).rgb;
    // Additive merge, scaled by the fixed blend factor.
    return vec4<f32>(base + glow * params.strength * 0.2, 1.0);
}

@fragment
fn fs_output(in: VertexOutput) -> @location(0) vec4<f32> {
    let hdr = textureSample(input_tex, input_sampler, in.uv).rgb * params.exposure;
    // Reinhard tone mapping.
    let mapped = hdr / (vec3<f32>(1.0) + hdr);
    return vec4<f32>(mapped, 1.0);
}
"#;

/// One offscreen color target with its sampling bind group.
struct ColorTarget {
    _texture: wgpu::Texture,
    view: wgpu::TextureView,
    bind_group: wgpu::BindGroup,
}

/// The full bloom post-processing chain.
///
/// Owns the glow/base HDR scene targets, the blur ping-pong pair, the merge
/// target, and every fullscreen pipeline. Recreated textures on resize; the
/// bind-group layouts are kept for that purpose.
pub struct SelectiveBloomPipeline {
    settings: BloomSettings,
    extent: TargetExtent,
    hdr_format: wgpu::TextureFormat,

    texture_bgl: wgpu::BindGroupLayout,
    // Two params bind groups differing only in blur axis; non-blur passes
    // use the horizontal one and ignore the axis.
    params_bind_group: wgpu::BindGroup,
    params_buffer: wgpu::Buffer,
    blur_v_bind_group: wgpu::BindGroup,
    sampler: wgpu::Sampler,

    extract_pipeline: wgpu::RenderPipeline,
    blur_pipeline: wgpu::RenderPipeline,
    merge_pipeline: wgpu::RenderPipeline,
    output_pipeline: wgpu::RenderPipeline,

    glow_scene: ColorTarget,
    base_scene: ColorTarget,
    ping: ColorTarget,
    pong: ColorTarget,
    merged: ColorTarget,
}

impl SelectiveBloomPipeline {
    /// Create the chain for the given surface format and initial extent.
    pub fn new(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        extent: TargetExtent,
        settings: BloomSettings,
    ) -> Self {
        let hdr_format = wgpu::TextureFormat::Rgba16Float;

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("bloom-shader"),
            source: wgpu::ShaderSource::Wgsl(BLOOM_SHADER_SOURCE.into()),
        });

        let params_bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("bloom-params-bgl"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: std::num::NonZeroU64::new(16),
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: std::num::NonZeroU64::new(16),
                    },
                    count: None,
                },
            ],
        });

        let texture_bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("bloom-texture-bgl"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let single_input_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("bloom-single-input-layout"),
                bind_group_layouts: &[&params_bgl, &texture_bgl],
                immediate_size: 0,
            });
        let dual_input_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("bloom-dual-input-layout"),
            bind_group_layouts: &[&params_bgl, &texture_bgl, &texture_bgl],
            immediate_size: 0,
        });

        let extract_pipeline = create_fullscreen_pipeline(
            device,
            &shader,
            &single_input_layout,
            "fs_extract",
            hdr_format,
            "bloom-extract",
        );
        let blur_pipeline = create_fullscreen_pipeline(
            device,
            &shader,
            &single_input_layout,
            "fs_blur",
            hdr_format,
            "bloom-blur",
        );
        let merge_pipeline = create_fullscreen_pipeline(
            device,
            &shader,
            &dual_input_layout,
            "fs_merge",
            hdr_format,
            "bloom-merge",
        );
        let output_pipeline = create_fullscreen_pipeline(
            device,
            &shader,
            &single_input_layout,
            "fs_output",
            surface_format,
            "bloom-output",
        );

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("bloom-sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        use wgpu::util::DeviceExt;
        let params_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("bloom-params"),
            contents: bytemuck::cast_slice(&[BloomParams {
                threshold: settings.threshold,
                strength: settings.strength,
                radius: settings.radius,
                exposure: settings.exposure,
            }]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let blur_h_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("bloom-blur-h"),
            contents: bytemuck::cast_slice(&[BlurParams {
                direction: [1.0, 0.0],
                _padding: [0.0; 2],
            }]),
            usage: wgpu::BufferUsages::UNIFORM,
        });
        let blur_v_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("bloom-blur-v"),
            contents: bytemuck::cast_slice(&[BlurParams {
                direction: [0.0, 1.0],
                _padding: [0.0; 2],
            }]),
            usage: wgpu::BufferUsages::UNIFORM,
        });

        let make_params_bg = |blur_buffer: &wgpu::Buffer, label: &str| {
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(label),
                layout: &params_bgl,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: params_buffer.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: blur_buffer.as_entire_binding(),
                    },
                ],
            })
        };
        let params_bind_group = make_params_bg(&blur_h_buffer, "bloom-params-bg");
        let blur_v_bind_group = make_params_bg(&blur_v_buffer, "bloom-blur-v-bg");

        let make_target = |label: &str| {
            create_color_target(device, &texture_bgl, &sampler, hdr_format, extent, label)
        };
        let glow_scene = make_target("bloom-glow-scene");
        let base_scene = make_target("bloom-base-scene");
        let ping = make_target("bloom-ping");
        let pong = make_target("bloom-pong");
        let merged = make_target("bloom-merged");

        Self {
            settings,
            extent,
            hdr_format,
            texture_bgl,
            params_bind_group,
            params_buffer,
            blur_v_bind_group,
            sampler,
            extract_pipeline,
            blur_pipeline,
            merge_pipeline,
            output_pipeline,
            glow_scene,
            base_scene,
            ping,
            pong,
            merged,
        }
    }

    /// The HDR view the darkened-scene pass renders into.
    pub fn glow_scene_view(&self) -> &wgpu::TextureView {
        &self.glow_scene.view
    }

    /// The HDR view the normal scene pass renders into.
    pub fn base_scene_view(&self) -> &wgpu::TextureView {
        &self.base_scene.view
    }

    /// Format of the HDR scene targets.
    pub fn hdr_format(&self) -> wgpu::TextureFormat {
        self.hdr_format
    }

    /// Current target extent.
    pub fn extent(&self) -> TargetExtent {
        self.extent
    }

    /// Current bloom settings.
    pub fn settings(&self) -> &BloomSettings {
        &self.settings
    }

    /// Recreate every offscreen target for a new extent.
    ///
    /// The caller validates the extent; an unchanged extent is a no-op.
    pub fn resize(&mut self, device: &wgpu::Device, extent: TargetExtent) {
        if extent == self.extent {
            return;
        }
        self.extent = extent;
        let make_target = |label: &str| {
            create_color_target(
                device,
                &self.texture_bgl,
                &self.sampler,
                self.hdr_format,
                extent,
                label,
            )
        };
        self.glow_scene = make_target("bloom-glow-scene");
        self.base_scene = make_target("bloom-base-scene");
        self.ping = make_target("bloom-ping");
        self.pong = make_target("bloom-pong");
        self.merged = make_target("bloom-merged");
        log::debug!(
            "bloom targets resized to {}x{}",
            extent.width(),
            extent.height()
        );
    }

    /// Push updated settings to the GPU.
    pub fn update_settings(&mut self, queue: &wgpu::Queue, settings: BloomSettings) {
        queue.write_buffer(
            &self.params_buffer,
            0,
            bytemuck::cast_slice(&[BloomParams {
                threshold: settings.threshold,
                strength: settings.strength,
                radius: settings.radius,
                exposure: settings.exposure,
            }]),
        );
        self.settings = settings;
    }

    /// Run the post chain. The glow and base scene targets must already hold
    /// this frame's two scene renders.
    ///
    /// extract(glow) → blur ×N → merge(base + blur) → output(surface).
    pub fn execute(&self, encoder: &mut wgpu::CommandEncoder, surface_view: &wgpu::TextureView) {
        // Brightness extract from the darkened-scene render.
        self.fullscreen_pass(
            encoder,
            &self.extract_pipeline,
            &self.params_bind_group,
            &self.glow_scene.bind_group,
            None,
            &self.ping.view,
            "bloom-extract",
        );

        // Separable blur round trips: ping → pong → ping.
        for _ in 0..BLUR_ITERATIONS {
            self.fullscreen_pass(
                encoder,
                &self.blur_pipeline,
                &self.params_bind_group,
                &self.ping.bind_group,
                None,
                &self.pong.view,
                "bloom-blur-h",
            );
            self.fullscreen_pass(
                encoder,
                &self.blur_pipeline,
                &self.blur_v_bind_group,
                &self.pong.bind_group,
                None,
                &self.ping.view,
                "bloom-blur-v",
            );
        }

        // Additive merge of the base render and the blurred glow.
        self.fullscreen_pass(
            encoder,
            &self.merge_pipeline,
            &self.params_bind_group,
            &self.base_scene.bind_group,
            Some(&self.ping.bind_group),
            &self.merged.view,
            "bloom-merge",
        );

        // Tone-mapped output to the surface.
        self.fullscreen_pass(
            encoder,
            &self.output_pipeline,
            &self.params_bind_group,
            &self.merged.bind_group,
            None,
            surface_view,
            "bloom-output",
        );
    }

    #[allow(clippy::too_many_arguments)]
    fn fullscreen_pass(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        pipeline: &wgpu::RenderPipeline,
        params_bind_group: &wgpu::BindGroup,
        input: &wgpu::BindGroup,
        second_input: Option<&wgpu::BindGroup>,
        target: &wgpu::TextureView,
        label: &str,
    ) {
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some(label),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });
        pass.set_pipeline(pipeline);
        pass.set_bind_group(0, params_bind_group, &[]);
        pass.set_bind_group(1, input, &[]);
        if let Some(second) = second_input {
            pass.set_bind_group(2, second, &[]);
        }
        pass.draw(0..3, 0..1);
    }
}

/// Build a fullscreen-triangle render pipeline for one fragment entry point.
fn create_fullscreen_pipeline(
    device: &wgpu::Device,
    shader: &wgpu::ShaderModule,
    layout: &wgpu::PipelineLayout,
    fragment_entry: &str,
    target_format: wgpu::TextureFormat,
    label: &str,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_fullscreen"),
            buffers: &[],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        },
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            ..Default::default()
        },
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some(fragment_entry),
            targets: &[Some(wgpu::ColorTargetState {
                format: target_format,
                blend: None,
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        }),
        multiview_mask: None,
        cache: None,
    })
}

/// Create one offscreen color target with its sampling bind group.
fn create_color_target(
    device: &wgpu::Device,
    texture_bgl: &wgpu::BindGroupLayout,
    sampler: &wgpu::Sampler,
    format: wgpu::TextureFormat,
    extent: TargetExtent,
    label: &str,
) -> ColorTarget {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: wgpu::Extent3d {
            width: extent.width(),
            height: extent.height(),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
        view_formats: &[],
    });
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some(label),
        layout: texture_bgl,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
        ],
    });
    ColorTarget {
        _texture: texture,
        view,
        bind_group,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings_match_compositor_tuning() {
        let settings = BloomSettings::default();
        assert_eq!(settings.threshold, 0.0);
        assert_eq!(settings.strength, 1.0);
        assert_eq!(settings.radius, 0.5);
        assert_eq!(settings.exposure, 1.0);
    }

    #[test]
    fn test_mix_factor_is_fixed() {
        assert_eq!(BLOOM_MIX_FACTOR, 0.2);
        assert!(
            BLOOM_SHADER_SOURCE.contains("* 0.2"),
            "The merge shader must apply the fixed blend factor"
        );
    }

    #[test]
    fn test_gaussian_weights_normalized() {
        let sum = GAUSSIAN_WEIGHTS[0] + 2.0 * GAUSSIAN_WEIGHTS[1..].iter().sum::<f32>();
        assert!(
            (sum - 1.0).abs() < 0.01,
            "Gaussian weights should sum to ~1.0, got {sum}"
        );
    }

    #[test]
    fn test_uniform_sizes() {
        assert_eq!(std::mem::size_of::<BloomParams>(), 16);
        assert_eq!(std::mem::size_of::<BlurParams>(), 16);
    }

    #[test]
    fn test_reinhard_maps_into_unit_range() {
        // Mirror of the fs_output math.
        for hdr in [0.0_f32, 0.2, 1.0, 4.0, 100.0] {
            let mapped = hdr / (1.0 + hdr);
            assert!(
                (0.0..1.0).contains(&mapped),
                "Reinhard output escaped [0, 1): {mapped}"
            );
        }
    }

    #[test]
    fn test_reinhard_is_monotonic() {
        let mut prev = -1.0_f32;
        for i in 0..100 {
            let hdr = i as f32 * 0.3;
            let mapped = hdr / (1.0 + hdr);
            assert!(mapped > prev, "Tone mapping must be monotonic");
            prev = mapped;
        }
    }
}
