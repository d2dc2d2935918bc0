//! Per-point surface shading: bump-mapped normals, Phong lighting, and
//! five-layer height-based coloring.

use glam::Vec3;
use orrery_terrain::{TerrainParams, TerrainSampler};

/// Per-planet shading parameters, paired 1:1 with a [`TerrainParams`] record.
///
/// Created at scene setup and read-only thereafter.
#[derive(Clone, Debug)]
pub struct ShadingParams {
    /// Layer colors from lowest to highest terrain, linear RGB.
    pub layer_colors: [Vec3; 5],
    /// Heights at which layers 2..=5 take over from the accumulated blend below.
    pub transitions: [f32; 4],
    /// Blend half-width around each transition height.
    pub blends: [f32; 4],
    /// How much the perturbed normal replaces the geometric one.
    /// 0 = geometric normal only, 1 = fully perturbed.
    pub bump_strength: f32,
    /// Tangent-plane offset distance used for the displaced height samples.
    pub bump_offset: f32,
    /// Direction the lit hemisphere faces (surface toward light).
    pub light_direction: Vec3,
    /// Light color, linear RGB.
    pub light_color: Vec3,
    /// Ambient term.
    pub ambient_intensity: f32,
    /// Diffuse scale.
    pub diffuse_intensity: f32,
    /// Specular scale. Fades to zero above the third transition height.
    pub specular_intensity: f32,
    /// Phong exponent.
    pub shininess: f32,
}

impl Default for ShadingParams {
    fn default() -> Self {
        Self {
            layer_colors: [
                Vec3::new(0.05, 0.12, 0.35), // deep water
                Vec3::new(0.12, 0.30, 0.55), // shallows
                Vec3::new(0.22, 0.42, 0.14), // lowland
                Vec3::new(0.45, 0.38, 0.25), // rock
                Vec3::new(0.92, 0.93, 0.95), // snow
            ],
            transitions: [0.02, 0.05, 0.09, 0.14],
            blends: [0.01, 0.015, 0.02, 0.02],
            bump_strength: 0.7,
            bump_offset: 0.004,
            light_direction: Vec3::new(1.0, 0.6, 0.4),
            light_color: Vec3::ONE,
            ambient_intensity: 0.15,
            diffuse_intensity: 1.0,
            specular_intensity: 0.6,
            shininess: 12.0,
        }
    }
}

/// Hermite smoothstep of `x` between `edge0` and `edge1`.
pub fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    if edge0 == edge1 {
        // Degenerate edge pair: step function.
        return if x < edge0 { 0.0 } else { 1.0 };
    }
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

fn reflect(incident: Vec3, normal: Vec3) -> Vec3 {
    incident - 2.0 * incident.dot(normal) * normal
}

/// Shade one surface point of a unit sphere with base radius `radius`.
///
/// `point` is the unit-sphere position; `normal`/`tangent`/`bitangent` form
/// its local frame. `camera_position` is only consulted by the specular term.
/// Pure: identical inputs always produce the identical color.
pub fn shade_point(
    sampler: &TerrainSampler,
    terrain: &TerrainParams,
    shading: &ShadingParams,
    radius: f32,
    point: Vec3,
    normal: Vec3,
    tangent: Vec3,
    bitangent: Vec3,
    camera_position: Vec3,
) -> Vec3 {
    // Height at the point and at two small offsets along the tangent frame.
    let h = sampler.height(terrain, point);
    let dx = shading.bump_offset * tangent;
    let dy = shading.bump_offset * bitangent;
    let h_dx = sampler.height(terrain, point + dx);
    let h_dy = sampler.height(terrain, point + dy);

    // Displaced surface positions reconstruct the bumped normal.
    let pos = point * (radius + h);
    let pos_dx = (point + dx) * (radius + h_dx);
    let pos_dy = (point + dy) * (radius + h_dy);
    let bump_normal = (pos_dx - pos).cross(pos_dy - pos).normalize();
    let n = normal.lerp(bump_normal, shading.bump_strength).normalize();

    let l = -shading.light_direction.normalize();
    let v = (camera_position - pos).normalize();
    let r = reflect(l, n).normalize();

    let diffuse = shading.diffuse_intensity * n.dot(-l).max(0.0);

    // Specular highlights belong to water and low terrain; they fade out
    // entirely above the third transition height.
    let specular_falloff = if shading.transitions[2] > 0.0 {
        ((shading.transitions[2] - h) / shading.transitions[2]).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let specular = specular_falloff
        * shading.specular_intensity
        * v.dot(r).max(0.0).powf(shading.shininess);

    let light = shading.ambient_intensity + diffuse + specular.max(0.0);

    // Blend the five layers bottom-up; each later layer sits on top of the
    // accumulated result, so the top layer only wins past every transition.
    let mut color = shading.layer_colors[0];
    for layer in 0..4 {
        let t = shading.transitions[layer];
        let b = shading.blends[layer];
        color = color.lerp(
            shading.layer_colors[layer + 1],
            smoothstep(t - b, t + b, h),
        );
    }

    light * color * shading.light_color
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame_at(point: Vec3) -> (Vec3, Vec3, Vec3) {
        let normal = point.normalize();
        let helper = if normal.y.abs() < 0.99 { Vec3::Y } else { Vec3::X };
        let tangent = helper.cross(normal).normalize();
        let bitangent = normal.cross(tangent);
        (normal, tangent, bitangent)
    }

    #[test]
    fn test_smoothstep_endpoints() {
        assert_eq!(smoothstep(0.0, 1.0, -0.5), 0.0);
        assert_eq!(smoothstep(0.0, 1.0, 0.0), 0.0);
        assert_eq!(smoothstep(0.0, 1.0, 1.0), 1.0);
        assert_eq!(smoothstep(0.0, 1.0, 2.0), 1.0);
        assert!((smoothstep(0.0, 1.0, 0.5) - 0.5).abs() < f32::EPSILON);
    }

    #[test]
    fn test_smoothstep_degenerate_edges() {
        assert_eq!(smoothstep(0.3, 0.3, 0.2), 0.0);
        assert_eq!(smoothstep(0.3, 0.3, 0.4), 1.0);
    }

    #[test]
    fn test_shade_is_deterministic() {
        let sampler = TerrainSampler::new();
        let terrain = TerrainParams::default();
        let shading = ShadingParams::default();
        let point = Vec3::new(0.3, 0.8, -0.52).normalize();
        let (n, t, b) = frame_at(point);
        let camera = Vec3::new(0.0, 2.0, 5.0);

        let c1 = shade_point(&sampler, &terrain, &shading, 1.0, point, n, t, b, camera);
        let c2 = shade_point(&sampler, &terrain, &shading, 1.0, point, n, t, b, camera);
        assert_eq!(c1, c2, "Identical inputs must shade bit-identically");
    }

    #[test]
    fn test_low_terrain_takes_bottom_layer() {
        let sampler = TerrainSampler::new();
        // Flat planet at height 0: every transition is far above the surface.
        let terrain = TerrainParams {
            amplitude: 0.0,
            offset: 0.0,
            ..Default::default()
        };
        let shading = ShadingParams {
            ambient_intensity: 1.0,
            diffuse_intensity: 0.0,
            specular_intensity: 0.0,
            bump_strength: 0.0,
            light_color: Vec3::ONE,
            ..Default::default()
        };
        let point = Vec3::X;
        let (n, t, b) = frame_at(point);
        let color = shade_point(&sampler, &terrain, &shading, 1.0, point, n, t, b, Vec3::Z * 4.0);
        let expected = shading.layer_colors[0];
        assert!(
            (color - expected).length() < 1e-5,
            "Flat planet should shade as layer 1: {color:?} vs {expected:?}"
        );
    }

    #[test]
    fn test_high_terrain_takes_top_layer() {
        let sampler = TerrainSampler::new();
        // A large constant offset lifts the whole surface above transition 5.
        let terrain = TerrainParams {
            amplitude: 0.0,
            offset: 1.0,
            ..Default::default()
        };
        let shading = ShadingParams {
            ambient_intensity: 1.0,
            diffuse_intensity: 0.0,
            specular_intensity: 0.0,
            bump_strength: 0.0,
            light_color: Vec3::ONE,
            ..Default::default()
        };
        let point = Vec3::new(0.0, 0.6, 0.8);
        let (n, t, b) = frame_at(point);
        let color = shade_point(&sampler, &terrain, &shading, 1.0, point, n, t, b, Vec3::Z * 4.0);
        let expected = shading.layer_colors[4];
        assert!(
            (color - expected).length() < 1e-5,
            "Surface above every transition should shade as layer 5: {color:?}"
        );
    }

    #[test]
    fn test_specular_vanishes_on_high_terrain() {
        let sampler = TerrainSampler::new();
        let shading = ShadingParams {
            ambient_intensity: 0.0,
            diffuse_intensity: 0.0,
            specular_intensity: 5.0,
            bump_strength: 0.0,
            layer_colors: [Vec3::ONE; 5],
            ..Default::default()
        };
        // Surface pinned above transitions[2]: the falloff must kill specular.
        let terrain = TerrainParams {
            amplitude: 0.0,
            offset: shading.transitions[2] + 0.1,
            ..Default::default()
        };
        let point = Vec3::X;
        let (n, t, b) = frame_at(point);
        let color = shade_point(&sampler, &terrain, &shading, 1.0, point, n, t, b, Vec3::X * 5.0);
        assert!(
            color.length() < 1e-6,
            "No specular expected above the third transition, got {color:?}"
        );
    }

    #[test]
    fn test_zero_bump_strength_keeps_geometric_normal() {
        let sampler = TerrainSampler::new();
        let terrain = TerrainParams::default();
        let base = ShadingParams {
            bump_strength: 0.0,
            ..Default::default()
        };
        let wider = ShadingParams {
            bump_offset: base.bump_offset * 4.0,
            ..base.clone()
        };
        let point = Vec3::new(0.48, 0.31, 0.82).normalize();
        let (n, t, b) = frame_at(point);
        let camera = Vec3::new(1.0, 3.0, 2.0);

        // With strength 0 the perturbed normal is discarded, so the bump
        // offset cannot influence lighting. Heights still move the surface
        // point slightly, so compare the dominant lighting term only.
        let c1 = shade_point(&sampler, &terrain, &base, 1.0, point, n, t, b, camera);
        let c2 = shade_point(&sampler, &terrain, &wider, 1.0, point, n, t, b, camera);
        assert!(
            (c1 - c2).length() < 1e-4,
            "bump_strength 0 should make bump_offset irrelevant: {c1:?} vs {c2:?}"
        );
    }

    #[test]
    fn test_ambient_only_scene_scales_with_light_color() {
        let sampler = TerrainSampler::new();
        let terrain = TerrainParams {
            amplitude: 0.0,
            ..Default::default()
        };
        let shading = ShadingParams {
            ambient_intensity: 1.0,
            diffuse_intensity: 0.0,
            specular_intensity: 0.0,
            bump_strength: 0.0,
            light_color: Vec3::new(1.0, 0.5, 0.25),
            ..Default::default()
        };
        let point = Vec3::Z;
        let (n, t, b) = frame_at(point);
        let color = shade_point(&sampler, &terrain, &shading, 1.0, point, n, t, b, Vec3::Y * 3.0);
        let expected = shading.layer_colors[0] * shading.light_color;
        assert!(
            (color - expected).length() < 1e-5,
            "Ambient-only shading should be layer color times light color"
        );
    }
}
