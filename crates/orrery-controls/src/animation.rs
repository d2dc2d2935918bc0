//! Explicit animation descriptors.
//!
//! Each running animation is a plain record (target, endpoints, duration,
//! progress, easing) stored in a list owned by the transition state machine.
//! The frame update advances the list and hands back typed outputs for the
//! caller to apply, so in-flight animations are inspectable and cancellable.

use glam::Vec3;

use crate::easing::Easing;

/// What an animation writes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimTarget {
    /// The camera's world position.
    CameraPosition,
    /// The orbit-controls look-at target (the camera re-aims every frame).
    ControlsTarget,
    /// Uniform scale of body `i`.
    BodyScale(usize),
    /// Opacity of trajectory ring `i`.
    RingOpacity(usize),
}

/// An animatable value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AnimValue {
    /// Scalar field (scale, opacity).
    Scalar(f32),
    /// Vector field (positions).
    Vector(Vec3),
}

impl AnimValue {
    fn lerp(self, to: AnimValue, t: f32) -> AnimValue {
        match (self, to) {
            (AnimValue::Scalar(a), AnimValue::Scalar(b)) => AnimValue::Scalar(a + (b - a) * t),
            (AnimValue::Vector(a), AnimValue::Vector(b)) => AnimValue::Vector(a.lerp(b, t)),
            // Mismatched endpoints are a construction bug; jump to the end.
            (_, to) => {
                debug_assert!(false, "animation endpoints disagree in type");
                to
            }
        }
    }

    /// The scalar payload, if this is a scalar.
    pub fn as_scalar(self) -> Option<f32> {
        match self {
            AnimValue::Scalar(v) => Some(v),
            AnimValue::Vector(_) => None,
        }
    }

    /// The vector payload, if this is a vector.
    pub fn as_vector(self) -> Option<Vec3> {
        match self {
            AnimValue::Vector(v) => Some(v),
            AnimValue::Scalar(_) => None,
        }
    }
}

/// One running animation.
#[derive(Debug, Clone)]
pub struct Animation {
    /// Field being animated.
    pub target: AnimTarget,
    /// Start value.
    pub from: AnimValue,
    /// End value.
    pub to: AnimValue,
    /// Total duration in time units. Must be positive.
    pub duration: f64,
    /// Progress in time units, monotonically increasing.
    pub elapsed: f64,
    /// Easing curve.
    pub easing: Easing,
}

/// The value an animation produced this frame.
#[derive(Debug, Clone, Copy)]
pub struct AnimOutput {
    /// Field to write.
    pub target: AnimTarget,
    /// Interpolated value.
    pub value: AnimValue,
    /// True on the frame the animation completes; it is removed afterwards.
    pub finished: bool,
}

/// The list of running animations.
#[derive(Debug, Default)]
pub struct AnimationSet {
    animations: Vec<Animation>,
}

impl AnimationSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule an animation. Last writer wins: a prior animation on the
    /// same target is dropped, never blended.
    pub fn schedule(&mut self, animation: Animation) {
        self.animations.retain(|a| a.target != animation.target);
        self.animations.push(animation);
    }

    /// Advance every animation by `dt` and produce this frame's outputs.
    ///
    /// All outputs reflect the same logical instant. Finished animations are
    /// emitted once with `finished = true` and then removed.
    pub fn advance(&mut self, dt: f64) -> Vec<AnimOutput> {
        let mut outputs = Vec::with_capacity(self.animations.len());
        for animation in &mut self.animations {
            animation.elapsed = (animation.elapsed + dt).min(animation.duration);
            let t = if animation.duration > 0.0 {
                (animation.elapsed / animation.duration) as f32
            } else {
                1.0
            };
            outputs.push(AnimOutput {
                target: animation.target,
                value: animation.from.lerp(animation.to, animation.easing.apply(t)),
                finished: animation.elapsed >= animation.duration,
            });
        }
        self.animations.retain(|a| a.elapsed < a.duration);
        outputs
    }

    /// Number of running animations.
    pub fn len(&self) -> usize {
        self.animations.len()
    }

    /// Whether no animation is running.
    pub fn is_empty(&self) -> bool {
        self.animations.is_empty()
    }

    /// Inspect the running animations.
    pub fn iter(&self) -> impl Iterator<Item = &Animation> {
        self.animations.iter()
    }

    /// Drop every running animation.
    pub fn clear(&mut self) {
        self.animations.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scalar_anim(target: AnimTarget, from: f32, to: f32, duration: f64) -> Animation {
        Animation {
            target,
            from: AnimValue::Scalar(from),
            to: AnimValue::Scalar(to),
            duration,
            elapsed: 0.0,
            easing: Easing::Linear,
        }
    }

    #[test]
    fn test_advance_interpolates_and_completes() {
        let mut set = AnimationSet::new();
        set.schedule(scalar_anim(AnimTarget::RingOpacity(0), 1.0, 0.0, 2.0));

        let mid = set.advance(1.0);
        assert_eq!(mid.len(), 1);
        assert!(!mid[0].finished);
        assert!((mid[0].value.as_scalar().unwrap() - 0.5).abs() < 1e-6);

        let end = set.advance(1.0);
        assert!(end[0].finished);
        assert_eq!(end[0].value.as_scalar().unwrap(), 0.0);
        assert!(set.is_empty(), "Finished animations must be removed");
    }

    #[test]
    fn test_overshoot_clamps_to_endpoint() {
        let mut set = AnimationSet::new();
        set.schedule(scalar_anim(AnimTarget::BodyScale(1), 0.8, 0.0, 2.0));
        let out = set.advance(10.0);
        assert!(out[0].finished);
        assert_eq!(out[0].value.as_scalar().unwrap(), 0.0);
    }

    #[test]
    fn test_last_writer_wins_on_same_target() {
        let mut set = AnimationSet::new();
        set.schedule(scalar_anim(AnimTarget::BodyScale(2), 1.0, 0.0, 2.0));
        set.schedule(scalar_anim(AnimTarget::BodyScale(2), 0.3, 0.9, 2.0));
        assert_eq!(set.len(), 1, "A re-targeted field keeps only the new animation");

        let out = set.advance(0.0);
        assert!((out[0].value.as_scalar().unwrap() - 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_different_targets_run_concurrently() {
        let mut set = AnimationSet::new();
        set.schedule(scalar_anim(AnimTarget::BodyScale(0), 1.0, 0.0, 2.0));
        set.schedule(scalar_anim(AnimTarget::BodyScale(1), 1.0, 0.0, 1.0));
        set.schedule(Animation {
            target: AnimTarget::CameraPosition,
            from: AnimValue::Vector(Vec3::ZERO),
            to: AnimValue::Vector(Vec3::new(10.0, 0.0, 0.0)),
            duration: 2.0,
            elapsed: 0.0,
            easing: Easing::Linear,
        });
        assert_eq!(set.len(), 3);

        // The shorter animation completes independently of the others.
        let out = set.advance(1.0);
        let finished: Vec<_> = out.iter().filter(|o| o.finished).collect();
        assert_eq!(finished.len(), 1);
        assert_eq!(finished[0].target, AnimTarget::BodyScale(1));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_progress_is_monotonic() {
        let mut set = AnimationSet::new();
        set.schedule(scalar_anim(AnimTarget::RingOpacity(3), 0.0, 1.0, 2.0));
        let mut prev = -1.0;
        loop {
            let out = set.advance(0.1);
            if out.is_empty() {
                break;
            }
            let v = out[0].value.as_scalar().unwrap();
            assert!(v >= prev, "Animation progress went backwards: {prev} -> {v}");
            prev = v;
            if out[0].finished {
                break;
            }
        }
        assert_eq!(prev, 1.0);
    }

    #[test]
    fn test_zero_duration_completes_immediately() {
        let mut set = AnimationSet::new();
        set.schedule(scalar_anim(AnimTarget::RingOpacity(0), 0.0, 1.0, 0.0));
        let out = set.advance(0.0);
        assert!(out[0].finished);
        assert_eq!(out[0].value.as_scalar().unwrap(), 1.0);
        assert!(set.is_empty());
    }
}
