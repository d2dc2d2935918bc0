//! Material definitions and the per-node material slot used by the
//! selective-bloom compositor.

/// Opaque handle to an externally loaded texture.
///
/// The core never decodes image data; the embedding host maps handles to GPU
/// resources when it registers them with [`crate::ScenePipeline`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub u32);

/// Renderable surface description for a scene node.
#[derive(Clone, Debug, PartialEq)]
pub struct MaterialDef {
    /// Base color in linear RGB.
    pub color: [f32; 3],
    /// Unlit materials skip the point/ambient lighting entirely
    /// (the sun and the trajectory rings).
    pub unlit: bool,
    /// Opacity: 1.0 opaque, 0.0 invisible. Animated on rings.
    pub opacity: f32,
    /// Optional color texture multiplied over `color`.
    pub texture: Option<TextureHandle>,
}

impl MaterialDef {
    /// Flat black stand-in used while a node is shadowed for the bloom pass.
    pub fn flat_black() -> Self {
        Self {
            color: [0.0, 0.0, 0.0],
            unlit: true,
            opacity: 1.0,
            texture: None,
        }
    }

    /// Lit material of a single color.
    pub fn lit(color: [f32; 3]) -> Self {
        Self {
            color,
            unlit: false,
            opacity: 1.0,
            texture: None,
        }
    }

    /// Unlit material of a single color.
    pub fn unlit(color: [f32; 3]) -> Self {
        Self {
            color,
            unlit: true,
            opacity: 1.0,
            texture: None,
        }
    }
}

/// Per-node material state.
///
/// The bloom darken pass moves `Active` into `ShadowedForBloom`, preserving
/// the original definition structurally; the restore pass pattern-matches it
/// back. There is no side table and nothing keyed by object identity, so a
/// missed restore is directly observable on the node itself.
#[derive(Clone, Debug, PartialEq)]
pub enum MaterialSlot {
    /// The node renders with this material.
    Active(MaterialDef),
    /// The node is temporarily darkened for the bloom pass; the original
    /// material rides along for the restore.
    ShadowedForBloom(MaterialDef),
}

impl MaterialSlot {
    /// Move `Active` to `ShadowedForBloom`. Returns `true` if the slot
    /// changed; an already shadowed slot is left alone.
    pub fn shadow(&mut self) -> bool {
        match self {
            MaterialSlot::Active(def) => {
                let original = std::mem::replace(def, MaterialDef::flat_black());
                *self = MaterialSlot::ShadowedForBloom(original);
                true
            }
            MaterialSlot::ShadowedForBloom(_) => false,
        }
    }

    /// Move `ShadowedForBloom` back to `Active`. Returns `true` if the slot
    /// changed; an active slot is left alone.
    pub fn restore(&mut self) -> bool {
        match self {
            MaterialSlot::Active(_) => false,
            MaterialSlot::ShadowedForBloom(original) => {
                let original = std::mem::replace(original, MaterialDef::flat_black());
                *self = MaterialSlot::Active(original);
                true
            }
        }
    }

    /// Whether the node currently carries the darkened stand-in.
    pub fn is_shadowed(&self) -> bool {
        matches!(self, MaterialSlot::ShadowedForBloom(_))
    }

    /// The material the renderer should draw right now: the real one when
    /// active, flat black while shadowed.
    pub fn render_material(&self) -> MaterialDef {
        match self {
            MaterialSlot::Active(def) => def.clone(),
            MaterialSlot::ShadowedForBloom(_) => MaterialDef::flat_black(),
        }
    }

    /// The underlying material definition regardless of shadow state.
    pub fn definition(&self) -> &MaterialDef {
        match self {
            MaterialSlot::Active(def) | MaterialSlot::ShadowedForBloom(def) => def,
        }
    }

    /// Mutable access to the underlying definition (opacity animation).
    pub fn definition_mut(&mut self) -> &mut MaterialDef {
        match self {
            MaterialSlot::Active(def) | MaterialSlot::ShadowedForBloom(def) => def,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shadow_then_restore_round_trips() {
        let original = MaterialDef::lit([0.2, 0.4, 0.8]);
        let mut slot = MaterialSlot::Active(original.clone());

        assert!(slot.shadow());
        assert!(slot.is_shadowed());
        assert_eq!(slot.render_material(), MaterialDef::flat_black());

        assert!(slot.restore());
        assert!(!slot.is_shadowed());
        assert_eq!(slot.render_material(), original);
    }

    #[test]
    fn test_double_shadow_is_a_no_op() {
        let original = MaterialDef::unlit([1.0, 0.8, 0.0]);
        let mut slot = MaterialSlot::Active(original.clone());
        assert!(slot.shadow());
        assert!(!slot.shadow(), "Second shadow must not re-swap");
        assert!(slot.restore());
        assert_eq!(
            *slot.definition(),
            original,
            "Original material must survive a double shadow attempt"
        );
    }

    #[test]
    fn test_restore_on_active_slot_is_a_no_op() {
        let mut slot = MaterialSlot::Active(MaterialDef::lit([0.5; 3]));
        assert!(!slot.restore());
    }

    #[test]
    fn test_shadowed_slot_keeps_definition_readable() {
        let original = MaterialDef::lit([0.1, 0.9, 0.3]);
        let mut slot = MaterialSlot::Active(original.clone());
        slot.shadow();
        // The definition stays inspectable while the render material is dark.
        assert_eq!(*slot.definition(), original);
    }
}
