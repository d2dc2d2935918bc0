//! Forward pipeline drawing the scene meshes into an HDR target.
//!
//! Both per-frame scene renders (the darkened glow pass and the normal base
//! pass) go through this pipeline; only the materials handed in differ.

use std::collections::HashMap;

use bytemuck::{Pod, Zeroable};
use glam::Mat4;

use crate::camera::CameraUniform;
use crate::material::{MaterialDef, TextureHandle};
use crate::mesh::{MeshData, Vertex};
use crate::targets::TargetExtent;

/// WGSL source for the scene pipeline.
pub const SCENE_SHADER_SOURCE: &str = r#"
struct CameraUniform {
    view_proj: mat4x4<f32>,
    camera_pos: vec4<f32>,
};

struct LightUniform {
    // rgb = color, w = intensity. The point light sits at the origin.
    point: vec4<f32>,
    ambient: vec4<f32>,
};

struct NodeUniform {
    model: mat4x4<f32>,
    // rgb = base color, a = opacity.
    color: vec4<f32>,
    // x = unlit, y = textured.
    flags: vec4<f32>,
};

@group(0) @binding(0) var<uniform> camera: CameraUniform;
@group(0) @binding(1) var<uniform> lights: LightUniform;
@group(1) @binding(0) var<uniform> node: NodeUniform;
@group(1) @binding(1) var node_tex: texture_2d<f32>;
@group(1) @binding(2) var node_sampler: sampler;

struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) world_pos: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
};

@vertex
fn vs_scene(
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
) -> VertexOutput {
    let world = node.model * vec4<f32>(position, 1.0);
    var out: VertexOutput;
    out.position = camera.view_proj * world;
    out.world_pos = world.xyz;
    out.normal = normalize((node.model * vec4<f32>(normal, 0.0)).xyz);
    out.uv = uv;
    return out;
}

@fragment
fn fs_scene(in: VertexOutput) -> @location(0) vec4<f32> {
    var base = node.color.rgb;
    if node.flags.y > 0.5 {
        base *= textureSample(node_tex, node_sampler, in.uv).rgb;
    }

    if node.flags.x > 0.5 {
        // Unlit: sun, rings, and the darkened bloom stand-in.
        return vec4<f32>(base, node.color.a);
    }

    // Point light at the origin with inverse-square falloff, plus ambient.
    let dist_sq = max(dot(in.world_pos, in.world_pos), 1.0);
    let to_light = normalize(-in.world_pos);
    let diffuse = max(dot(normalize(in.normal), to_light), 0.0) * lights.point.w / dist_sq;
    let ambient = lights.ambient.rgb * lights.ambient.w;
    let lit = base * (ambient + lights.point.rgb * diffuse);
    return vec4<f32>(lit, node.color.a);
}
"#;

/// GPU uniform for the two scene lights.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct LightUniform {
    /// Point light at the origin: rgb color, w intensity.
    pub point: [f32; 4],
    /// Ambient light: rgb color, w intensity.
    pub ambient: [f32; 4],
}

/// Per-draw GPU uniform.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct NodeUniform {
    /// Model matrix.
    pub model: [[f32; 4]; 4],
    /// rgb base color + opacity.
    pub color: [f32; 4],
    /// x = unlit flag, y = textured flag.
    pub flags: [f32; 4],
}

/// Identifier of a mesh uploaded to the pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MeshId(usize);

/// One draw request for a scene pass.
pub struct SceneDraw {
    /// Which uploaded mesh to draw.
    pub mesh: MeshId,
    /// Model matrix.
    pub model: Mat4,
    /// Material to draw with (already resolved through the material slot).
    pub material: MaterialDef,
}

struct GpuMesh {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
}

struct NodeSlot {
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    texture: Option<TextureHandle>,
}

/// Scene mesh pipeline with per-node uniform slots and a texture registry.
pub struct ScenePipeline {
    pipeline: wgpu::RenderPipeline,
    node_bgl: wgpu::BindGroupLayout,

    camera_buffer: wgpu::Buffer,
    light_buffer: wgpu::Buffer,
    frame_bind_group: wgpu::BindGroup,

    sampler: wgpu::Sampler,
    white_texture_view: wgpu::TextureView,
    textures: HashMap<TextureHandle, wgpu::TextureView>,

    meshes: Vec<GpuMesh>,
    node_slots: Vec<NodeSlot>,

    // Kept alive alongside its view.
    #[allow(dead_code)]
    depth_texture: wgpu::Texture,
    depth_view: wgpu::TextureView,
}

impl ScenePipeline {
    const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

    /// Create the pipeline rendering into `hdr_format` targets.
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        hdr_format: wgpu::TextureFormat,
        extent: TargetExtent,
        lights: LightUniform,
    ) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("scene-shader"),
            source: wgpu::ShaderSource::Wgsl(SCENE_SHADER_SOURCE.into()),
        });

        let frame_bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("scene-frame-bgl"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: std::num::NonZeroU64::new(
                            std::mem::size_of::<CameraUniform>() as u64,
                        ),
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: std::num::NonZeroU64::new(
                            std::mem::size_of::<LightUniform>() as u64,
                        ),
                    },
                    count: None,
                },
            ],
        });

        let node_bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("scene-node-bgl"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: std::num::NonZeroU64::new(
                            std::mem::size_of::<NodeUniform>() as u64,
                        ),
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("scene-pipeline-layout"),
            bind_group_layouts: &[&frame_bgl, &node_bgl],
            immediate_size: 0,
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("scene-pipeline"),
            layout: Some(&layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_scene"),
                buffers: &[Vertex::layout()],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None, // rings are viewed from both sides
                unclipped_depth: false,
                polygon_mode: wgpu::PolygonMode::Fill,
                conservative: false,
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: Self::DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_scene"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: hdr_format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            multiview_mask: None,
            cache: None,
        });

        use wgpu::util::DeviceExt;
        let camera_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("scene-camera"),
            contents: bytemuck::cast_slice(&[CameraUniform {
                view_proj: Mat4::IDENTITY.to_cols_array_2d(),
                camera_pos: [0.0; 4],
            }]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let light_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("scene-lights"),
            contents: bytemuck::cast_slice(&[lights]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let frame_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("scene-frame-bg"),
            layout: &frame_bgl,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: camera_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: light_buffer.as_entire_binding(),
                },
            ],
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("scene-sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let white_texture_view = upload_rgba_texture(device, queue, &[[255; 4]], 1, 1, "scene-white");

        let (depth_texture, depth_view) = create_depth(device, extent);

        Self {
            pipeline,
            node_bgl,
            camera_buffer,
            light_buffer,
            frame_bind_group,
            sampler,
            white_texture_view,
            textures: HashMap::new(),
            meshes: Vec::new(),
            node_slots: Vec::new(),
            depth_texture,
            depth_view,
        }
    }

    /// Upload a mesh and return its id.
    pub fn upload_mesh(&mut self, device: &wgpu::Device, data: &MeshData) -> MeshId {
        use wgpu::util::DeviceExt;
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("scene-mesh-vertices"),
            contents: bytemuck::cast_slice(&data.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("scene-mesh-indices"),
            contents: bytemuck::cast_slice(&data.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        self.meshes.push(GpuMesh {
            vertex_buffer,
            index_buffer,
            index_count: data.indices.len() as u32,
        });
        MeshId(self.meshes.len() - 1)
    }

    /// Register RGBA pixel data under an opaque texture handle.
    pub fn register_texture(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        handle: TextureHandle,
        pixels: &[[u8; 4]],
        width: u32,
        height: u32,
    ) {
        let view = upload_rgba_texture(device, queue, pixels, width, height, "scene-texture");
        self.textures.insert(handle, view);
        // Invalidate node slots bound to this handle so they rebind.
        for slot in &mut self.node_slots {
            if slot.texture == Some(handle) {
                slot.texture = None;
            }
        }
    }

    /// Make sure `count` node slots exist.
    pub fn ensure_node_capacity(&mut self, device: &wgpu::Device, count: usize) {
        use wgpu::util::DeviceExt;
        while self.node_slots.len() < count {
            let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("scene-node-uniform"),
                contents: bytemuck::cast_slice(&[NodeUniform {
                    model: Mat4::IDENTITY.to_cols_array_2d(),
                    color: [1.0; 4],
                    flags: [0.0; 4],
                }]),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            });
            let bind_group = create_node_bind_group(
                device,
                &self.node_bgl,
                &self.sampler,
                &uniform_buffer,
                &self.white_texture_view,
            );
            self.node_slots.push(NodeSlot {
                uniform_buffer,
                bind_group,
                texture: None,
            });
        }
    }

    /// Update the camera uniform for this frame.
    pub fn set_camera(&self, queue: &wgpu::Queue, camera: CameraUniform) {
        queue.write_buffer(&self.camera_buffer, 0, bytemuck::cast_slice(&[camera]));
    }

    /// Update the light uniform.
    pub fn set_lights(&self, queue: &wgpu::Queue, lights: LightUniform) {
        queue.write_buffer(&self.light_buffer, 0, bytemuck::cast_slice(&[lights]));
    }

    /// Recreate the depth buffer for a new extent.
    pub fn resize(&mut self, device: &wgpu::Device, extent: TargetExtent) {
        let (texture, view) = create_depth(device, extent);
        self.depth_texture = texture;
        self.depth_view = view;
    }

    /// Draw one scene pass into `target`.
    ///
    /// `load` controls whether the target is cleared first (the skybox pass
    /// may have filled it already).
    pub fn draw(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        target: &wgpu::TextureView,
        draws: &[SceneDraw],
        load: wgpu::LoadOp<wgpu::Color>,
        label: &str,
    ) {
        self.ensure_node_capacity(device, draws.len());

        // Refresh per-node uniforms and texture bindings before the pass.
        for (i, draw) in draws.iter().enumerate() {
            let textured = draw
                .material
                .texture
                .is_some_and(|h| self.textures.contains_key(&h));
            let uniform = NodeUniform {
                model: draw.model.to_cols_array_2d(),
                color: [
                    draw.material.color[0],
                    draw.material.color[1],
                    draw.material.color[2],
                    draw.material.opacity,
                ],
                flags: [
                    if draw.material.unlit { 1.0 } else { 0.0 },
                    if textured { 1.0 } else { 0.0 },
                    0.0,
                    0.0,
                ],
            };
            queue.write_buffer(
                &self.node_slots[i].uniform_buffer,
                0,
                bytemuck::cast_slice(&[uniform]),
            );

            if self.node_slots[i].texture != draw.material.texture {
                let view = draw
                    .material
                    .texture
                    .and_then(|h| self.textures.get(&h))
                    .unwrap_or(&self.white_texture_view);
                let slot = &mut self.node_slots[i];
                slot.bind_group = create_node_bind_group(
                    device,
                    &self.node_bgl,
                    &self.sampler,
                    &slot.uniform_buffer,
                    view,
                );
                slot.texture = draw.material.texture;
            }
        }

        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some(label),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target,
                resolve_target: None,
                ops: wgpu::Operations {
                    load,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &self.depth_view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &self.frame_bind_group, &[]);
        for (i, draw) in draws.iter().enumerate() {
            let mesh = &self.meshes[draw.mesh.0];
            pass.set_bind_group(1, &self.node_slots[i].bind_group, &[]);
            pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
            pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
            pass.draw_indexed(0..mesh.index_count, 0, 0..1);
        }
    }
}

fn create_node_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    sampler: &wgpu::Sampler,
    uniform_buffer: &wgpu::Buffer,
    texture_view: &wgpu::TextureView,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("scene-node-bg"),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::TextureView(texture_view),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
        ],
    })
}

fn create_depth(
    device: &wgpu::Device,
    extent: TargetExtent,
) -> (wgpu::Texture, wgpu::TextureView) {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("scene-depth"),
        size: wgpu::Extent3d {
            width: extent.width(),
            height: extent.height(),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: ScenePipeline::DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    (texture, view)
}

fn upload_rgba_texture(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    pixels: &[[u8; 4]],
    width: u32,
    height: u32,
    label: &str,
) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8UnormSrgb,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });
    queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            texture: &texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        bytemuck::cast_slice(pixels),
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(width * 4),
            rows_per_image: Some(height),
        },
        wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
    );
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_uniform_is_16_byte_aligned() {
        assert_eq!(std::mem::size_of::<NodeUniform>() % 16, 0);
    }

    #[test]
    fn test_light_uniform_size() {
        assert_eq!(std::mem::size_of::<LightUniform>(), 32);
    }

    #[test]
    fn test_shader_has_both_entry_points() {
        assert!(SCENE_SHADER_SOURCE.contains("fn vs_scene"));
        assert!(SCENE_SHADER_SOURCE.contains("fn fs_scene"));
    }
}
