//! Orbital scene setup and kinematics.

use glam::Vec3;
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use orrery_planet::ShadingParams;
use orrery_render::{MaterialDef, MaterialSlot, MeshKind, TextureHandle};
use orrery_terrain::{NoiseKind, TerrainParams};

use crate::error::SceneError;
use crate::node::SceneNode;
use crate::color::hsl_to_rgb;

/// Segment count for the trajectory ring geometry.
pub const RING_SEGMENTS: u32 = 64;

/// Half-width of a trajectory ring.
const RING_HALF_WIDTH: f32 = 0.04;

/// Names for the default five bodies; extra bodies get indexed names.
const BODY_LABELS: [&str; 5] = ["Mercury", "Venus", "Earth", "Mars", "Jupiter"];

/// Scene generation inputs.
#[derive(Clone, Debug)]
pub struct SceneParams {
    /// Seed for the deterministic setup rng.
    pub seed: u64,
    /// Number of orbiting bodies.
    pub body_count: usize,
}

impl Default for SceneParams {
    fn default() -> Self {
        Self {
            seed: 0,
            body_count: 5,
        }
    }
}

/// Kinematic state of one orbiting body.
///
/// `distance`, `phase_angle`, and `angular_velocity` are fixed at setup;
/// only the node's derived position changes per frame.
#[derive(Clone, Debug)]
pub struct OrbitingBody {
    /// Index of the body's node in the scene node list.
    pub node: usize,
    /// Orbital radius.
    pub distance: f32,
    /// Phase angle at scene time zero, radians.
    pub phase_angle: f32,
    /// Angular velocity, radians per scene time unit.
    pub angular_velocity: f32,
    /// Visual scale assigned at setup; restored after a lock ends.
    pub base_scale: f32,
}

impl OrbitingBody {
    /// Position on the orbit at scene time `t`.
    pub fn position_at(&self, t: f64) -> Vec3 {
        let angle = self.phase_angle as f64 + self.angular_velocity as f64 * t;
        Vec3::new(
            (angle.cos() * self.distance as f64) as f32,
            0.0,
            (angle.sin() * self.distance as f64) as f32,
        )
    }
}

/// A body's trajectory ring, paired 1:1 by index.
#[derive(Clone, Debug)]
pub struct TrajectoryRing {
    /// Index of the ring's node in the scene node list.
    pub node: usize,
}

/// The point light at the origin (inside the sun).
#[derive(Clone, Copy, Debug)]
pub struct PointLightDef {
    /// Linear RGB color.
    pub color: [f32; 3],
    /// Intensity with inverse-square falloff.
    pub intensity: f32,
}

/// The soft ambient fill light.
#[derive(Clone, Copy, Debug)]
pub struct AmbientLightDef {
    /// Linear RGB color.
    pub color: [f32; 3],
    /// Intensity multiplier.
    pub intensity: f32,
}

/// The orbital scene: nodes, bodies, rings, per-body surface records, lights,
/// and the opaque asset handles.
pub struct OrbitalScene {
    nodes: Vec<SceneNode>,
    sun: usize,
    bodies: Vec<OrbitingBody>,
    rings: Vec<TrajectoryRing>,
    terrain: Vec<TerrainParams>,
    shading: Vec<ShadingParams>,
    point_light: PointLightDef,
    ambient_light: AmbientLightDef,
    skybox: Option<TextureHandle>,
}

impl OrbitalScene {
    /// Build the scene deterministically from `params`.
    ///
    /// The sun sits at the origin at scale 3 and is the only glow-set member.
    /// Each body gets a random color, a strictly increasing orbital distance,
    /// a random phase in `[0, 2π)`, an angular velocity in `[0.01, 0.02)`,
    /// and a matching trajectory ring.
    pub fn generate(params: &SceneParams) -> Result<Self, SceneError> {
        let mut rng = ChaCha8Rng::seed_from_u64(params.seed);
        let mut nodes = Vec::with_capacity(1 + params.body_count * 2);

        let sun = nodes.len();
        nodes.push(SceneNode {
            name: "Sun".into(),
            mesh: MeshKind::Icosphere,
            position: Vec3::ZERO,
            scale: 3.0,
            visible: true,
            bloom: true,
            slot: MaterialSlot::Active(MaterialDef::unlit([1.0, 0.8, 0.0])),
        });

        let mut bodies = Vec::with_capacity(params.body_count);
        let mut rings = Vec::with_capacity(params.body_count);
        let mut terrain = Vec::with_capacity(params.body_count);
        let mut shading = Vec::with_capacity(params.body_count);

        let mut distance = 5.0_f32;
        let mut scale = 1.0_f32;

        for i in 0..params.body_count {
            let hue = rng.random::<f32>();
            let lightness = rng.random::<f32>() * 0.2 + 0.05;
            let color = hsl_to_rgb(hue, 0.7, lightness);

            // The previous body's scale leaks into the gap, keeping large
            // bodies from crowding their outer neighbor.
            distance += (2.0 + (rng.random::<f32>() * 5.0 + scale)) * 0.6;
            let phase_angle = rng.random::<f32>() * std::f32::consts::TAU;
            let angular_velocity = rng.random::<f32>() * 0.01 + 0.01;
            scale = rng.random::<f32>() * 0.5 + 0.5;

            let label = BODY_LABELS
                .get(i)
                .map(|s| (*s).to_string())
                .unwrap_or_else(|| format!("Body {i}"));

            let body_node = nodes.len();
            nodes.push(SceneNode {
                name: label,
                mesh: MeshKind::Icosphere,
                position: Vec3::new(
                    phase_angle.cos() * distance,
                    0.0,
                    phase_angle.sin() * distance,
                ),
                scale,
                visible: true,
                bloom: false,
                slot: MaterialSlot::Active(MaterialDef::lit(color)),
            });
            bodies.push(OrbitingBody {
                node: body_node,
                distance,
                phase_angle,
                angular_velocity,
                base_scale: scale,
            });

            let ring_node = nodes.len();
            nodes.push(SceneNode {
                name: format!("ring-{i}"),
                mesh: MeshKind::Ring {
                    inner: distance - RING_HALF_WIDTH,
                    outer: distance + RING_HALF_WIDTH,
                },
                position: Vec3::ZERO,
                scale: 1.0,
                visible: true,
                bloom: false,
                slot: MaterialSlot::Active(MaterialDef::unlit([0.667, 0.667, 0.667])),
            });
            rings.push(TrajectoryRing { node: ring_node });

            terrain.push(random_terrain(&mut rng)?);
            shading.push(ShadingParams::default());
        }

        let scene = Self {
            nodes,
            sun,
            bodies,
            rings,
            terrain,
            shading,
            point_light: PointLightDef {
                color: [1.0, 1.0, 1.0],
                intensity: 600.0,
            },
            ambient_light: AmbientLightDef {
                color: [0.376, 0.376, 0.376],
                intensity: 3.0,
            },
            skybox: None,
        };
        scene.validate()?;
        log::debug!(
            "generated orbital scene: {} bodies, seed {}",
            scene.bodies.len(),
            params.seed
        );
        Ok(scene)
    }

    /// Setup-time validation: positive, strictly increasing distances and
    /// per-body record counts in lockstep. Not re-run per frame.
    fn validate(&self) -> Result<(), SceneError> {
        let mut previous = 0.0_f32;
        for (index, body) in self.bodies.iter().enumerate() {
            if body.distance <= 0.0 {
                return Err(SceneError::NonPositiveDistance {
                    index,
                    distance: body.distance,
                });
            }
            if body.distance <= previous {
                return Err(SceneError::NonIncreasingDistance {
                    index,
                    distance: body.distance,
                    previous,
                });
            }
            previous = body.distance;
        }

        if self.bodies.len() != self.rings.len()
            || self.bodies.len() != self.terrain.len()
            || self.bodies.len() != self.shading.len()
        {
            return Err(SceneError::RecordCountMismatch {
                bodies: self.bodies.len(),
                rings: self.rings.len(),
                terrain: self.terrain.len(),
                shading: self.shading.len(),
            });
        }
        Ok(())
    }

    /// Advance every body to its position at scene time `t`.
    ///
    /// Stored phase/velocity/distance never change; only the derived node
    /// positions do. A scene with no bodies is a no-op.
    pub fn advance(&mut self, t: f64) {
        for body in &self.bodies {
            self.nodes[body.node].position = body.position_at(t);
        }
    }

    /// All nodes (render order).
    pub fn nodes(&self) -> &[SceneNode] {
        &self.nodes
    }

    /// Mutable node access for the compositor and animations.
    pub fn nodes_mut(&mut self) -> &mut [SceneNode] {
        &mut self.nodes
    }

    /// Index of the sun node.
    pub fn sun_index(&self) -> usize {
        self.sun
    }

    /// Number of orbiting bodies.
    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    /// Kinematic state of body `index`.
    pub fn body(&self, index: usize) -> Option<&OrbitingBody> {
        self.bodies.get(index)
    }

    /// Current world position of body `index`.
    pub fn body_position(&self, index: usize) -> Option<Vec3> {
        self.bodies.get(index).map(|b| self.nodes[b.node].position)
    }

    /// Terrain record of body `index`.
    pub fn terrain(&self, index: usize) -> Option<&TerrainParams> {
        self.terrain.get(index)
    }

    /// Shading record of body `index`.
    pub fn shading(&self, index: usize) -> Option<&ShadingParams> {
        self.shading.get(index)
    }

    /// Current visual scale of body `index` (animated during transitions).
    pub fn body_scale(&self, index: usize) -> Option<f32> {
        self.bodies.get(index).map(|b| self.nodes[b.node].scale)
    }

    /// Current opacity of ring `index`.
    pub fn ring_opacity(&self, index: usize) -> Option<f32> {
        self.rings.get(index).map(|r| self.nodes[r.node].opacity())
    }

    /// Whether ring `index` is attached to the visible graph.
    pub fn ring_visible(&self, index: usize) -> Option<bool> {
        self.rings.get(index).map(|r| self.nodes[r.node].visible)
    }

    /// Set the visual scale of body `index`.
    pub fn set_body_scale(&mut self, index: usize, scale: f32) {
        if let Some(body) = self.bodies.get(index) {
            self.nodes[body.node].scale = scale.max(0.0);
        }
    }

    /// Set the opacity of ring `index`.
    pub fn set_ring_opacity(&mut self, index: usize, opacity: f32) {
        if let Some(ring) = self.rings.get(index) {
            self.nodes[ring.node].set_opacity(opacity);
        }
    }

    /// Attach or detach ring `index` from the visible graph.
    pub fn set_ring_visible(&mut self, index: usize, visible: bool) {
        if let Some(ring) = self.rings.get(index) {
            self.nodes[ring.node].visible = visible;
        }
    }

    /// Node index of body `index`.
    pub fn body_node(&self, index: usize) -> Option<usize> {
        self.bodies.get(index).map(|b| b.node)
    }

    /// Replace the active material on body `index`, returning the previous
    /// definition (used for the procedural surface swap while locked).
    pub fn swap_body_material(&mut self, index: usize, material: MaterialDef) -> Option<MaterialDef> {
        let node = self.bodies.get(index)?.node;
        let previous = self.nodes[node].slot.definition().clone();
        self.nodes[node].slot = MaterialSlot::Active(material);
        Some(previous)
    }

    /// The point light at the origin.
    pub fn point_light(&self) -> PointLightDef {
        self.point_light
    }

    /// The ambient fill light.
    pub fn ambient_light(&self) -> AmbientLightDef {
        self.ambient_light
    }

    /// Store the skybox cubemap handle delivered by the asset loader.
    pub fn set_skybox(&mut self, handle: TextureHandle) {
        self.skybox = Some(handle);
    }

    /// The skybox handle, if delivered.
    pub fn skybox(&self) -> Option<TextureHandle> {
        self.skybox
    }

    /// Attach the sun surface texture delivered by the asset loader.
    pub fn set_sun_texture(&mut self, handle: TextureHandle) {
        let sun = self.sun;
        self.nodes[sun].slot.definition_mut().texture = Some(handle);
    }
}

/// Randomized but validated terrain record for one body.
fn random_terrain(rng: &mut ChaCha8Rng) -> Result<TerrainParams, SceneError> {
    let kind = match rng.random_range(0..3) {
        0 => NoiseKind::BillowedFractal,
        1 => NoiseKind::RidgedFractal,
        _ => NoiseKind::Simplex,
    };
    let params = TerrainParams {
        kind,
        amplitude: rng.random::<f32>() * 0.1 + 0.05,
        sharpness: rng.random::<f32>() * 2.0 + 1.5,
        offset: 0.0,
        period: rng.random::<f32>() * 0.4 + 0.4,
        persistence: 0.5,
        lacunarity: 2.0,
        octaves: 6,
    };
    Ok(params.validated()?)
}
