//! Skybox pass: fills the scene targets with the host-provided cubemap
//! before any geometry is drawn.

use bytemuck::{Pod, Zeroable};
use glam::Mat4;

use crate::camera::Camera;

/// Uniform for the skybox pass: inverse view-projection for direction
/// reconstruction.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct SkyboxUniform {
    /// Inverse of the rotation-only view-projection matrix.
    pub inv_view_proj: [[f32; 4]; 4],
}

impl SkyboxUniform {
    /// Build the uniform from a camera, discarding its translation so the
    /// sky stays at infinity.
    pub fn from_camera(camera: &Camera) -> Self {
        let mut view = camera.view_matrix();
        view.w_axis = glam::Vec4::new(0.0, 0.0, 0.0, 1.0);
        let view_proj = camera.projection_matrix() * view;
        Self {
            inv_view_proj: view_proj.inverse().to_cols_array_2d(),
        }
    }
}

/// WGSL source for the skybox pass.
pub const SKYBOX_SHADER_SOURCE: &str = r#"
struct SkyboxUniform {
    inv_view_proj: mat4x4<f32>,
};

@group(0) @binding(0) var<uniform> skybox: SkyboxUniform;
@group(1) @binding(0) var sky_texture: texture_cube<f32>;
@group(1) @binding(1) var sky_sampler: sampler;

struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) view_dir: vec3<f32>,
};

@vertex
fn vs_skybox(@builtin(vertex_index) idx: u32) -> VertexOutput {
    let uv = vec2<f32>(f32((idx << 1u) & 2u), f32(idx & 2u));
    let ndc = uv * 2.0 - 1.0;

    let clip_far = vec4<f32>(ndc.x, ndc.y, 1.0, 1.0);
    let world = skybox.inv_view_proj * clip_far;

    var out: VertexOutput;
    // Draw at the far plane so scene geometry always wins the depth test.
    out.position = vec4<f32>(ndc.x, ndc.y, 1.0, 1.0);
    out.view_dir = normalize(world.xyz / world.w);
    return out;
}

@fragment
fn fs_skybox(in: VertexOutput) -> @location(0) vec4<f32> {
    return vec4<f32>(textureSample(sky_texture, sky_sampler, in.view_dir).rgb, 1.0);
}
"#;

/// Fullscreen cubemap background pass.
pub struct SkyboxPipeline {
    pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    texture_bgl: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    cubemap_bind_group: Option<wgpu::BindGroup>,
}

impl SkyboxPipeline {
    /// Create the skybox pipeline targeting the HDR scene format.
    pub fn new(device: &wgpu::Device, hdr_format: wgpu::TextureFormat) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("skybox-shader"),
            source: wgpu::ShaderSource::Wgsl(SKYBOX_SHADER_SOURCE.into()),
        });

        let uniform_bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("skybox-uniform-bgl"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: std::num::NonZeroU64::new(64),
                },
                count: None,
            }],
        });

        let texture_bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("skybox-texture-bgl"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::Cube,
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

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("skybox-layout"),
            bind_group_layouts: &[&uniform_bgl, &texture_bgl],
            immediate_size: 0,
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("skybox-pipeline"),
            layout: Some(&layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_skybox"),
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
                module: &shader,
                entry_point: Some("fs_skybox"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: hdr_format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            multiview_mask: None,
            cache: None,
        });

        use wgpu::util::DeviceExt;
        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("skybox-uniform"),
            contents: bytemuck::cast_slice(&[SkyboxUniform {
                inv_view_proj: Mat4::IDENTITY.to_cols_array_2d(),
            }]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("skybox-uniform-bg"),
            layout: &uniform_bgl,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("skybox-sampler"),
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        Self {
            pipeline,
            uniform_buffer,
            uniform_bind_group,
            texture_bgl,
            sampler,
            cubemap_bind_group: None,
        }
    }

    /// Upload the six cubemap faces (each `face_size × face_size` RGBA).
    ///
    /// Face order follows the usual +X, −X, +Y, −Y, +Z, −Z convention.
    pub fn set_cubemap(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        faces: &[Vec<[u8; 4]>; 6],
        face_size: u32,
    ) {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("skybox-cubemap"),
            size: wgpu::Extent3d {
                width: face_size,
                height: face_size,
                depth_or_array_layers: 6,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        for (layer, face) in faces.iter().enumerate() {
            queue.write_texture(
                wgpu::TexelCopyTextureInfo {
                    texture: &texture,
                    mip_level: 0,
                    origin: wgpu::Origin3d {
                        x: 0,
                        y: 0,
                        z: layer as u32,
                    },
                    aspect: wgpu::TextureAspect::All,
                },
                bytemuck::cast_slice(face),
                wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(face_size * 4),
                    rows_per_image: Some(face_size),
                },
                wgpu::Extent3d {
                    width: face_size,
                    height: face_size,
                    depth_or_array_layers: 1,
                },
            );
        }
        let view = texture.create_view(&wgpu::TextureViewDescriptor {
            dimension: Some(wgpu::TextureViewDimension::Cube),
            ..Default::default()
        });
        self.cubemap_bind_group = Some(device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("skybox-cubemap-bg"),
            layout: &self.texture_bgl,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
        }));
    }

    /// Whether a cubemap has been registered.
    pub fn has_cubemap(&self) -> bool {
        self.cubemap_bind_group.is_some()
    }

    /// Draw the background into `target`. A no-op until a cubemap is set;
    /// the caller then falls back to a plain clear.
    pub fn draw(
        &self,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        target: &wgpu::TextureView,
        camera: &Camera,
    ) {
        let Some(cubemap_bind_group) = &self.cubemap_bind_group else {
            return;
        };
        queue.write_buffer(
            &self.uniform_buffer,
            0,
            bytemuck::cast_slice(&[SkyboxUniform::from_camera(camera)]),
        );

        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("skybox"),
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
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &self.uniform_bind_group, &[]);
        pass.set_bind_group(1, cubemap_bind_group, &[]);
        pass.draw(0..3, 0..1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skybox_uniform_discards_translation() {
        let mut camera = Camera::overview(1.0);
        let a = SkyboxUniform::from_camera(&camera);
        camera.position += glam::Vec3::splat(7.0);
        camera.target += glam::Vec3::splat(7.0);
        let b = SkyboxUniform::from_camera(&camera);
        // Same orientation, different position: the sky must not move.
        for (col_a, col_b) in a.inv_view_proj.iter().zip(b.inv_view_proj.iter()) {
            for (x, y) in col_a.iter().zip(col_b.iter()) {
                assert!((x - y).abs() < 1e-4, "Skybox moved with the camera: {x} vs {y}");
            }
        }
    }

    #[test]
    fn test_skybox_uniform_size() {
        assert_eq!(std::mem::size_of::<SkyboxUniform>(), 64);
    }
}
