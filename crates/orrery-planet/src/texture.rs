//! Equirectangular surface texture baking.
//!
//! Samples the shaded sphere across longitude/latitude to produce the RGBA
//! texture applied to a body while the camera is locked onto it.

use glam::Vec3;
use orrery_terrain::{TerrainParams, TerrainSampler};

use crate::shading::{ShadingParams, shade_point};

/// Bake a `width × height` equirectangular RGBA texture of the shaded surface.
///
/// Each texel is shaded with a viewer placed along its outward radial
/// direction, which keeps the bake independent of any live camera and fully
/// deterministic. Typical sizes are 512×256 or 1024×512.
pub fn bake_surface_texture(
    sampler: &TerrainSampler,
    terrain: &TerrainParams,
    shading: &ShadingParams,
    radius: f32,
    width: u32,
    height: u32,
) -> Vec<[u8; 4]> {
    let mut pixels = Vec::with_capacity((width * height) as usize);

    for y in 0..height {
        let latitude = std::f32::consts::PI * (0.5 - (y as f32 + 0.5) / height as f32);
        for x in 0..width {
            let longitude = std::f32::consts::TAU * ((x as f32 + 0.5) / width as f32 - 0.5);

            let point = Vec3::new(
                latitude.cos() * longitude.cos(),
                latitude.sin(),
                latitude.cos() * longitude.sin(),
            );
            let normal = point;
            // Longitude direction; degenerate only exactly at the poles,
            // which the half-texel offset above never samples.
            let tangent = Vec3::new(-longitude.sin(), 0.0, longitude.cos());
            let bitangent = normal.cross(tangent).normalize();
            let viewer = point * (radius * 3.0);

            let color = shade_point(
                sampler, terrain, shading, radius, point, normal, tangent, bitangent, viewer,
            );
            pixels.push([
                (color.x.clamp(0.0, 1.0) * 255.0) as u8,
                (color.y.clamp(0.0, 1.0) * 255.0) as u8,
                (color.z.clamp(0.0, 1.0) * 255.0) as u8,
                255,
            ]);
        }
    }

    tracing::debug!(width, height, "baked planet surface texture");
    pixels
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bake_produces_expected_size() {
        let sampler = TerrainSampler::new();
        let pixels = bake_surface_texture(
            &sampler,
            &TerrainParams::default(),
            &ShadingParams::default(),
            1.0,
            64,
            32,
        );
        assert_eq!(pixels.len(), 64 * 32);
    }

    #[test]
    fn test_bake_is_fully_opaque() {
        let sampler = TerrainSampler::new();
        let pixels = bake_surface_texture(
            &sampler,
            &TerrainParams::default(),
            &ShadingParams::default(),
            1.0,
            32,
            16,
        );
        for (i, px) in pixels.iter().enumerate() {
            assert_eq!(px[3], 255, "Texel {i} is not opaque: alpha {}", px[3]);
        }
    }

    #[test]
    fn test_bake_is_deterministic() {
        let sampler = TerrainSampler::new();
        let terrain = TerrainParams::default();
        let shading = ShadingParams::default();
        let a = bake_surface_texture(&sampler, &terrain, &shading, 1.0, 48, 24);
        let b = bake_surface_texture(&sampler, &terrain, &shading, 1.0, 48, 24);
        assert_eq!(a, b, "Two bakes of the same records must match byte-for-byte");
    }

    #[test]
    fn test_bake_has_color_variety() {
        let sampler = TerrainSampler::new();
        // Exaggerated relief so several layers are crossed.
        let terrain = TerrainParams {
            amplitude: 0.25,
            ..Default::default()
        };
        let pixels = bake_surface_texture(
            &sampler,
            &terrain,
            &ShadingParams::default(),
            1.0,
            128,
            64,
        );
        let unique: std::collections::HashSet<[u8; 4]> = pixels.iter().copied().collect();
        assert!(
            unique.len() > 16,
            "Expected a varied surface, got {} unique colors",
            unique.len()
        );
    }
}
