//! CPU-side selective-bloom orchestration: the darken and restore traversals
//! and the post-frame invariant.
//!
//! The GPU work in between (bloom chain, composite) lives in
//! [`crate::SelectiveBloomPipeline`]; this module only moves material slots,
//! so the pairing contract is testable without a device.

use crate::error::RenderError;
use crate::material::MaterialSlot;

/// Scene nodes the compositor can traverse.
pub trait GlowNode {
    /// Whether the node belongs to the glow set (renders with its true
    /// material during the bloom pass).
    fn in_glow_set(&self) -> bool;
    /// The node's material slot.
    fn slot(&self) -> &MaterialSlot;
    /// Mutable access to the node's material slot.
    fn slot_mut(&mut self) -> &mut MaterialSlot;
}

/// Counters reported for one completed frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Nodes darkened for the bloom pass.
    pub darkened: usize,
    /// Nodes restored afterwards. Always equals `darkened` on a healthy frame.
    pub restored: usize,
}

/// Drives the darken/restore pair around the bloom render.
///
/// The two traversals must bracket the bloom render atomically: nothing may
/// mutate glow membership or material slots in between. The single-threaded
/// frame loop guarantees that by call order; a threaded embedding must hold
/// one lock across the whole frame.
#[derive(Debug, Default)]
pub struct BloomCompositor;

impl BloomCompositor {
    /// Darken pass: shadow every node outside the glow set.
    ///
    /// Returns the number of nodes darkened.
    pub fn darken_non_glow<N: GlowNode>(&self, nodes: &mut [N]) -> usize {
        let mut darkened = 0;
        for node in nodes.iter_mut() {
            if !node.in_glow_set() && node.slot_mut().shadow() {
                darkened += 1;
            }
        }
        log::trace!("bloom darken pass shadowed {darkened} nodes");
        darkened
    }

    /// Restore pass: return every shadowed node to its active material.
    ///
    /// After this pass no node may remain shadowed; a leak is reported as
    /// [`RenderError::ShadowedMaterialLeak`].
    pub fn restore_all<N: GlowNode>(&self, nodes: &mut [N]) -> Result<usize, RenderError> {
        let mut restored = 0;
        for node in nodes.iter_mut() {
            if node.slot_mut().restore() {
                restored += 1;
            }
        }

        let leaked = nodes.iter().filter(|n| n.slot().is_shadowed()).count();
        if leaked > 0 {
            return Err(RenderError::ShadowedMaterialLeak { count: leaked });
        }
        Ok(restored)
    }

    /// Run the darken/restore pair around a bloom render step.
    ///
    /// `bloom_render` is invoked exactly once while the non-glow nodes are
    /// darkened; it receives the nodes for drawing.
    pub fn bracket_bloom<N: GlowNode>(
        &self,
        nodes: &mut [N],
        bloom_render: impl FnOnce(&mut [N]),
    ) -> Result<FrameStats, RenderError> {
        let darkened = self.darken_non_glow(nodes);
        bloom_render(nodes);
        let restored = self.restore_all(nodes)?;
        debug_assert_eq!(darkened, restored);
        Ok(FrameStats { darkened, restored })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::MaterialDef;

    struct TestNode {
        glow: bool,
        slot: MaterialSlot,
    }

    impl TestNode {
        fn new(glow: bool, color: [f32; 3]) -> Self {
            Self {
                glow,
                slot: MaterialSlot::Active(MaterialDef::lit(color)),
            }
        }
    }

    impl GlowNode for TestNode {
        fn in_glow_set(&self) -> bool {
            self.glow
        }
        fn slot(&self) -> &MaterialSlot {
            &self.slot
        }
        fn slot_mut(&mut self) -> &mut MaterialSlot {
            &mut self.slot
        }
    }

    fn test_scene() -> Vec<TestNode> {
        vec![
            TestNode::new(true, [1.0, 0.8, 0.0]), // sun
            TestNode::new(false, [0.2, 0.3, 0.4]),
            TestNode::new(false, [0.5, 0.1, 0.1]),
            TestNode::new(false, [0.6, 0.6, 0.6]),
        ]
    }

    #[test]
    fn test_darken_skips_glow_set() {
        let compositor = BloomCompositor;
        let mut nodes = test_scene();
        let darkened = compositor.darken_non_glow(&mut nodes);
        assert_eq!(darkened, 3);
        assert!(!nodes[0].slot.is_shadowed(), "Glow node must keep its material");
        for node in &nodes[1..] {
            assert!(node.slot.is_shadowed());
            assert_eq!(node.slot.render_material(), MaterialDef::flat_black());
        }
    }

    #[test]
    fn test_no_node_left_shadowed_after_frame() {
        let compositor = BloomCompositor;
        let mut nodes = test_scene();
        let stats = compositor
            .bracket_bloom(&mut nodes, |_| {})
            .expect("frame should complete");
        assert_eq!(stats.darkened, 3);
        assert_eq!(stats.restored, 3);
        assert!(
            nodes.iter().all(|n| !n.slot.is_shadowed()),
            "Every node must be restored after the frame"
        );
    }

    #[test]
    fn test_materials_survive_the_round_trip() {
        let compositor = BloomCompositor;
        let mut nodes = test_scene();
        let before: Vec<MaterialDef> = nodes.iter().map(|n| n.slot.definition().clone()).collect();
        compositor.bracket_bloom(&mut nodes, |_| {}).unwrap();
        for (node, original) in nodes.iter().zip(&before) {
            assert_eq!(node.slot.definition(), original);
        }
    }

    #[test]
    fn test_bloom_render_sees_darkened_nodes() {
        let compositor = BloomCompositor;
        let mut nodes = test_scene();
        let mut observed = None;
        compositor
            .bracket_bloom(&mut nodes, |nodes| {
                observed = Some(nodes.iter().filter(|n| n.slot().is_shadowed()).count());
            })
            .unwrap();
        assert_eq!(
            observed,
            Some(3),
            "The bloom render must run while non-glow nodes are dark"
        );
    }

    #[test]
    fn test_empty_scene_is_a_no_op() {
        let compositor = BloomCompositor;
        let mut nodes: Vec<TestNode> = Vec::new();
        let stats = compositor.bracket_bloom(&mut nodes, |_| {}).unwrap();
        assert_eq!(stats, FrameStats::default());
    }

    #[test]
    fn test_double_frame_is_stable() {
        let compositor = BloomCompositor;
        let mut nodes = test_scene();
        compositor.bracket_bloom(&mut nodes, |_| {}).unwrap();
        let stats = compositor.bracket_bloom(&mut nodes, |_| {}).unwrap();
        assert_eq!(stats.darkened, 3, "Second frame must darken the same nodes");
        assert!(nodes.iter().all(|n| !n.slot.is_shadowed()));
    }
}
