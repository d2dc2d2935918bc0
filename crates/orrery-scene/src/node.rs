//! Scene nodes: the flat renderable list the compositor traverses.

use glam::{Mat4, Vec3};
use orrery_render::{GlowNode, MaterialSlot, MeshKind};

/// One renderable in the scene graph.
#[derive(Clone, Debug)]
pub struct SceneNode {
    /// Display name ("Sun", "Earth", "ring-2", ...).
    pub name: String,
    /// Geometry descriptor.
    pub mesh: MeshKind,
    /// World position.
    pub position: Vec3,
    /// Uniform scale. Animated to zero on non-target bodies while locked.
    pub scale: f32,
    /// Detached nodes are skipped by the renderer but keep all their state.
    pub visible: bool,
    /// Glow-set membership. Fixed at setup; only the sun carries it.
    pub bloom: bool,
    /// Material slot driven by the selective-bloom compositor.
    pub slot: MaterialSlot,
}

impl SceneNode {
    /// Model matrix from position and uniform scale.
    pub fn model_matrix(&self) -> Mat4 {
        Mat4::from_translation(self.position) * Mat4::from_scale(Vec3::splat(self.scale))
    }

    /// Current opacity (lives on the material definition).
    pub fn opacity(&self) -> f32 {
        self.slot.definition().opacity
    }

    /// Set the opacity on the underlying material definition.
    pub fn set_opacity(&mut self, opacity: f32) {
        self.slot.definition_mut().opacity = opacity.clamp(0.0, 1.0);
    }
}

impl GlowNode for SceneNode {
    fn in_glow_set(&self) -> bool {
        self.bloom
    }

    fn slot(&self) -> &MaterialSlot {
        &self.slot
    }

    fn slot_mut(&mut self) -> &mut MaterialSlot {
        &mut self.slot
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orrery_render::MaterialDef;

    fn node() -> SceneNode {
        SceneNode {
            name: "test".into(),
            mesh: MeshKind::Icosphere,
            position: Vec3::new(3.0, 0.0, -4.0),
            scale: 2.0,
            visible: true,
            bloom: false,
            slot: MaterialSlot::Active(MaterialDef::lit([0.5, 0.5, 0.5])),
        }
    }

    #[test]
    fn test_model_matrix_applies_scale_then_translation() {
        let n = node();
        let m = n.model_matrix();
        let origin = m.transform_point3(Vec3::ZERO);
        assert!((origin - n.position).length() < 1e-6);
        let unit = m.transform_point3(Vec3::X);
        assert!((unit - (n.position + Vec3::X * 2.0)).length() < 1e-6);
    }

    #[test]
    fn test_opacity_clamped() {
        let mut n = node();
        n.set_opacity(1.7);
        assert_eq!(n.opacity(), 1.0);
        n.set_opacity(-0.3);
        assert_eq!(n.opacity(), 0.0);
    }
}
