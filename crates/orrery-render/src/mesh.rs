//! Mesh generation: icospheres for the sun and bodies, flat annuli for the
//! trajectory rings.

use bytemuck::{Pod, Zeroable};
use glam::Vec3;

/// Vertex layout shared by every scene mesh: position, normal, UV.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct Vertex {
    /// Object-space position.
    pub position: [f32; 3],
    /// Object-space normal.
    pub normal: [f32; 3],
    /// Texture coordinates (equirectangular for spheres).
    pub uv: [f32; 2],
}

impl Vertex {
    /// Vertex buffer layout for the scene shader.
    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: 12,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: 24,
                    shader_location: 2,
                    format: wgpu::VertexFormat::Float32x2,
                },
            ],
        }
    }
}

/// Which geometry a scene node draws with.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MeshKind {
    /// Unit icosphere, uniformly scaled per node.
    Icosphere,
    /// Flat annulus in the orbital (XZ) plane at world scale.
    Ring {
        /// Inner radius.
        inner: f32,
        /// Outer radius.
        outer: f32,
    },
}

/// CPU-side mesh data ready for upload.
pub struct MeshData {
    /// Vertex list.
    pub vertices: Vec<Vertex>,
    /// Triangle indices.
    pub indices: Vec<u32>,
}

/// Generate a unit icosphere with the given number of subdivisions.
///
/// Subdivision 3 (~1.3k triangles) is plenty for the small background
/// bodies; the locked-on body shares the same mesh and relies on its baked
/// texture for detail.
pub fn generate_icosphere(subdivisions: u32) -> MeshData {
    let t = (1.0 + 5.0_f32.sqrt()) / 2.0;

    let mut positions: Vec<Vec3> = vec![
        Vec3::new(-1.0, t, 0.0),
        Vec3::new(1.0, t, 0.0),
        Vec3::new(-1.0, -t, 0.0),
        Vec3::new(1.0, -t, 0.0),
        Vec3::new(0.0, -1.0, t),
        Vec3::new(0.0, 1.0, t),
        Vec3::new(0.0, -1.0, -t),
        Vec3::new(0.0, 1.0, -t),
        Vec3::new(t, 0.0, -1.0),
        Vec3::new(t, 0.0, 1.0),
        Vec3::new(-t, 0.0, -1.0),
        Vec3::new(-t, 0.0, 1.0),
    ];
    for p in &mut positions {
        *p = p.normalize();
    }

    let mut indices: Vec<u32> = vec![
        0, 11, 5, 0, 5, 1, 0, 1, 7, 0, 7, 10, 0, 10, 11, 1, 5, 9, 5, 11, 4, 11, 10, 2, 10, 7, 6, 7,
        1, 8, 3, 9, 4, 3, 4, 2, 3, 2, 6, 3, 6, 8, 3, 8, 9, 4, 9, 5, 2, 4, 11, 6, 2, 10, 8, 6, 7, 9,
        8, 1,
    ];

    for _ in 0..subdivisions {
        subdivide(&mut positions, &mut indices);
    }

    let vertices = positions
        .iter()
        .map(|pos| {
            let u = 0.5 + pos.z.atan2(pos.x) / std::f32::consts::TAU;
            let v = 0.5 - pos.y.asin() / std::f32::consts::PI;
            Vertex {
                position: pos.to_array(),
                normal: pos.to_array(),
                uv: [u, v],
            }
        })
        .collect();

    MeshData { vertices, indices }
}

/// Split every triangle into four, caching edge midpoints.
fn subdivide(positions: &mut Vec<Vec3>, indices: &mut Vec<u32>) {
    use std::collections::HashMap;

    let mut midpoints: HashMap<(u32, u32), u32> = HashMap::new();
    let mut next = Vec::with_capacity(indices.len() * 4);

    let mut midpoint = |a: u32, b: u32, positions: &mut Vec<Vec3>| -> u32 {
        let key = if a < b { (a, b) } else { (b, a) };
        if let Some(&idx) = midpoints.get(&key) {
            return idx;
        }
        let mid = (positions[a as usize] + positions[b as usize]).normalize();
        let idx = positions.len() as u32;
        positions.push(mid);
        midpoints.insert(key, idx);
        idx
    };

    for tri in indices.chunks(3) {
        let (a, b, c) = (tri[0], tri[1], tri[2]);
        let ab = midpoint(a, b, positions);
        let bc = midpoint(b, c, positions);
        let ca = midpoint(c, a, positions);
        next.extend_from_slice(&[a, ab, ca]);
        next.extend_from_slice(&[b, bc, ab]);
        next.extend_from_slice(&[c, ca, bc]);
        next.extend_from_slice(&[ab, bc, ca]);
    }

    *indices = next;
}

/// Generate a flat annulus in the XZ plane between `inner` and `outer` radii.
///
/// Normals face +Y; the scene shader draws rings unlit and double-sided, so
/// one winding suffices.
pub fn generate_ring(inner: f32, outer: f32, segments: u32) -> MeshData {
    let mut vertices = Vec::with_capacity((segments as usize + 1) * 2);
    let mut indices = Vec::with_capacity(segments as usize * 6);

    for i in 0..=segments {
        let angle = i as f32 / segments as f32 * std::f32::consts::TAU;
        let (sin, cos) = angle.sin_cos();
        let u = i as f32 / segments as f32;
        vertices.push(Vertex {
            position: [cos * inner, 0.0, sin * inner],
            normal: [0.0, 1.0, 0.0],
            uv: [u, 0.0],
        });
        vertices.push(Vertex {
            position: [cos * outer, 0.0, sin * outer],
            normal: [0.0, 1.0, 0.0],
            uv: [u, 1.0],
        });
    }

    for i in 0..segments {
        let base = i * 2;
        indices.extend_from_slice(&[base, base + 1, base + 2]);
        indices.extend_from_slice(&[base + 2, base + 1, base + 3]);
    }

    MeshData { vertices, indices }
}
