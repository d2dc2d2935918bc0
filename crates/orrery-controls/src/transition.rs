//! The overview/locked camera state machine.
//!
//! The logical state flips the moment a transition is requested; the visual
//! changes (camera glide, ring fades, body scale-downs) run as animation
//! descriptors advanced by the frame update. While locked, the orbital time
//! base is frozen: the real time spent locked is folded into an accumulated
//! offset on exit, so bodies resume exactly where they stopped.

use glam::Vec3;
use orrery_render::Camera;

use crate::animation::{AnimOutput, AnimTarget, AnimValue, Animation, AnimationSet};
use crate::easing::Easing;
use crate::orbit::OrbitControls;

/// Duration of every lock/unlock animation, in time units.
pub const TRANSITION_DURATION: f64 = 2.0;

/// Camera distance from a locked body, in multiples of the body's scale.
const LOCK_DISTANCE_FACTOR: f32 = 4.0;
/// Camera height above a locked body, in multiples of the body's scale.
const LOCK_HEIGHT_FACTOR: f32 = 2.0;

/// The two logical view states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewState {
    /// Free orbit around the whole scene. The initial state.
    Overview,
    /// Camera locked onto one body; orbital time is frozen.
    Locked,
}

/// What the state machine needs to know about the scene to plan a transition.
#[derive(Debug, Clone)]
pub struct SceneSnapshot {
    /// Current world position of each body.
    pub body_positions: Vec<Vec3>,
    /// Current visual scale of each body's node.
    pub body_scales: Vec<f32>,
    /// Scale each body was assigned at setup, restored on unlock.
    pub base_scales: Vec<f32>,
    /// Current opacity of each trajectory ring.
    pub ring_opacities: Vec<f32>,
}

/// The camera transition state machine.
///
/// Owns the running animation descriptors; the caller advances them once per
/// frame through [`ViewTransition::advance`] and applies the outputs.
#[derive(Debug)]
pub struct ViewTransition {
    state: ViewState,
    focus: Option<usize>,
    transition_start: f64,
    accumulated_offset: f64,
    overview_position: Vec3,
    overview_target: Vec3,
    animations: AnimationSet,
}

impl ViewTransition {
    /// Start in `Overview`, remembering the camera's pose as the one to
    /// glide back to after a lock ends.
    pub fn new(camera: &Camera) -> Self {
        Self {
            state: ViewState::Overview,
            focus: None,
            transition_start: 0.0,
            accumulated_offset: 0.0,
            overview_position: camera.position,
            overview_target: camera.target,
            animations: AnimationSet::new(),
        }
    }

    /// Whether the camera is locked onto a body. Flips immediately on a
    /// transition request, before any animation completes.
    pub fn is_zoomed(&self) -> bool {
        self.state == ViewState::Locked
    }

    /// Current logical state.
    pub fn state(&self) -> ViewState {
        self.state
    }

    /// Index of the locked-on body, while locked.
    pub fn focus(&self) -> Option<usize> {
        self.focus
    }

    /// Effective scene time at wall-clock `now`.
    ///
    /// While locked the result is pinned to the lock instant, so orbital
    /// phase does not advance; in overview it is `now` minus all the time
    /// previously spent locked.
    pub fn scene_time(&self, now: f64) -> f64 {
        match self.state {
            ViewState::Overview => now - self.accumulated_offset,
            ViewState::Locked => self.transition_start - self.accumulated_offset,
        }
    }

    /// Lock onto body `index`.
    ///
    /// Valid only from `Overview` with an index inside the snapshot; any
    /// other request (already locked, out of range) is a silent no-op that
    /// leaves running animations untouched. Returns whether the transition
    /// started.
    pub fn enter_locked(
        &mut self,
        index: usize,
        snapshot: &SceneSnapshot,
        camera: &Camera,
        controls: &mut OrbitControls,
        now: f64,
    ) -> bool {
        if self.state == ViewState::Locked {
            log::debug!("lock request for body {index} ignored: already locked");
            return false;
        }
        if index >= snapshot.body_positions.len() {
            log::debug!(
                "lock request for body {index} ignored: only {} bodies",
                snapshot.body_positions.len()
            );
            return false;
        }

        self.state = ViewState::Locked;
        self.focus = Some(index);
        self.transition_start = now;
        controls.lock();

        let body_position = snapshot.body_positions[index];
        let body_scale = snapshot.base_scales[index];
        self.schedule_vector(
            AnimTarget::CameraPosition,
            camera.position,
            lock_camera_position(body_position, body_scale),
        );
        self.schedule_vector(AnimTarget::ControlsTarget, controls.target, body_position);

        for (i, opacity) in snapshot.ring_opacities.iter().enumerate() {
            self.schedule_scalar(AnimTarget::RingOpacity(i), *opacity, 0.0);
        }
        for (i, scale) in snapshot.body_scales.iter().enumerate() {
            if i != index {
                self.schedule_scalar(AnimTarget::BodyScale(i), *scale, 0.0);
            }
        }

        log::info!("locking camera onto body {index}");
        true
    }

    /// Return to the overview.
    ///
    /// Valid only from `Locked`; a request from `Overview` is a silent
    /// no-op. Folds the time spent locked into the accumulated offset and
    /// returns the index of the formerly focused body.
    pub fn exit_locked(
        &mut self,
        snapshot: &SceneSnapshot,
        camera: &Camera,
        controls: &mut OrbitControls,
        now: f64,
    ) -> Option<usize> {
        if self.state == ViewState::Overview {
            log::debug!("unlock request ignored: already in overview");
            return None;
        }

        self.accumulated_offset += now - self.transition_start;
        self.state = ViewState::Overview;
        let focus = self.focus.take();
        controls.release();

        self.schedule_vector(
            AnimTarget::CameraPosition,
            camera.position,
            self.overview_position,
        );
        self.schedule_vector(
            AnimTarget::ControlsTarget,
            controls.target,
            self.overview_target,
        );
        for (i, opacity) in snapshot.ring_opacities.iter().enumerate() {
            self.schedule_scalar(AnimTarget::RingOpacity(i), *opacity, 1.0);
        }
        for (i, base) in snapshot.base_scales.iter().enumerate() {
            self.schedule_scalar(AnimTarget::BodyScale(i), snapshot.body_scales[i], *base);
        }

        log::info!("returning camera to overview (was locked on {focus:?})");
        focus
    }

    /// Advance all running animations by `dt` and return this frame's
    /// outputs for the caller to apply.
    pub fn advance(&mut self, dt: f64) -> Vec<AnimOutput> {
        self.animations.advance(dt)
    }

    /// The running animation descriptors, for inspection.
    pub fn animations(&self) -> &AnimationSet {
        &self.animations
    }

    fn schedule_scalar(&mut self, target: AnimTarget, from: f32, to: f32) {
        self.animations.schedule(Animation {
            target,
            from: AnimValue::Scalar(from),
            to: AnimValue::Scalar(to),
            duration: TRANSITION_DURATION,
            elapsed: 0.0,
            easing: Easing::CubicInOut,
        });
    }

    fn schedule_vector(&mut self, target: AnimTarget, from: Vec3, to: Vec3) {
        self.animations.schedule(Animation {
            target,
            from: AnimValue::Vector(from),
            to: AnimValue::Vector(to),
            duration: TRANSITION_DURATION,
            elapsed: 0.0,
            easing: Easing::CubicInOut,
        });
    }
}

/// Camera rest position for a locked body: offset outward from the origin
/// and raised, both proportional to the body's size.
fn lock_camera_position(body_position: Vec3, body_scale: f32) -> Vec3 {
    let outward = body_position.normalize_or(Vec3::X);
    body_position + outward * (LOCK_DISTANCE_FACTOR * body_scale)
        + Vec3::Y * (LOCK_HEIGHT_FACTOR * body_scale)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot() -> SceneSnapshot {
        SceneSnapshot {
            body_positions: vec![
                Vec3::new(8.0, 0.0, 0.0),
                Vec3::new(0.0, 0.0, 12.0),
                Vec3::new(-15.0, 0.0, 0.0),
                Vec3::new(0.0, 0.0, -20.0),
                Vec3::new(25.0, 0.0, 0.0),
            ],
            body_scales: vec![0.6, 0.8, 0.7, 0.9, 0.55],
            base_scales: vec![0.6, 0.8, 0.7, 0.9, 0.55],
            ring_opacities: vec![1.0; 5],
        }
    }

    fn machine() -> (ViewTransition, Camera, OrbitControls) {
        let camera = Camera::overview(16.0 / 9.0);
        let transition = ViewTransition::new(&camera);
        (transition, camera, OrbitControls::new())
    }

    #[test]
    fn test_lock_flips_state_immediately() {
        let (mut transition, camera, mut controls) = machine();
        assert!(!transition.is_zoomed());

        let started = transition.enter_locked(1, &snapshot(), &camera, &mut controls, 10.0);
        assert!(started);
        assert!(transition.is_zoomed(), "State must flip before animations finish");
        assert_eq!(transition.focus(), Some(1));
        assert!(!controls.zoom_enabled);
        assert!(controls.auto_rotate);
    }

    #[test]
    fn test_lock_schedules_expected_animations() {
        let (mut transition, camera, mut controls) = machine();
        transition.enter_locked(2, &snapshot(), &camera, &mut controls, 0.0);
        // Camera + controls target + 5 rings + 4 non-target bodies.
        assert_eq!(transition.animations().len(), 11);
        let scales_target: Vec<_> = transition
            .animations()
            .iter()
            .filter_map(|a| match a.target {
                AnimTarget::BodyScale(i) => Some(i),
                _ => None,
            })
            .collect();
        assert!(
            !scales_target.contains(&2),
            "The focused body must keep its scale"
        );
    }

    #[test]
    fn test_double_lock_is_a_no_op_and_keeps_animations() {
        let (mut transition, camera, mut controls) = machine();
        transition.enter_locked(2, &snapshot(), &camera, &mut controls, 0.0);
        transition.advance(0.5);
        let elapsed_before: Vec<f64> =
            transition.animations().iter().map(|a| a.elapsed).collect();

        let started = transition.enter_locked(2, &snapshot(), &camera, &mut controls, 0.5);
        assert!(!started, "Second lock must be rejected");
        assert_eq!(transition.focus(), Some(2));
        let elapsed_after: Vec<f64> =
            transition.animations().iter().map(|a| a.elapsed).collect();
        assert_eq!(
            elapsed_before, elapsed_after,
            "A rejected lock must not restart in-flight animations"
        );
    }

    #[test]
    fn test_retarget_while_locked_is_a_no_op() {
        let (mut transition, camera, mut controls) = machine();
        transition.enter_locked(0, &snapshot(), &camera, &mut controls, 0.0);
        let started = transition.enter_locked(3, &snapshot(), &camera, &mut controls, 1.0);
        assert!(!started);
        assert_eq!(transition.focus(), Some(0), "Focus must not move while locked");
    }

    #[test]
    fn test_out_of_range_lock_is_a_no_op() {
        let (mut transition, camera, mut controls) = machine();
        let started = transition.enter_locked(5, &snapshot(), &camera, &mut controls, 0.0);
        assert!(!started);
        assert!(!transition.is_zoomed());
        assert!(transition.animations().is_empty());
        assert!(controls.zoom_enabled, "Controls must stay in overview mode");
    }

    #[test]
    fn test_unlock_from_overview_is_a_no_op() {
        let (mut transition, camera, mut controls) = machine();
        let focus = transition.exit_locked(&snapshot(), &camera, &mut controls, 4.0);
        assert_eq!(focus, None);
        assert!(!transition.is_zoomed());
        assert!(transition.animations().is_empty());
    }

    #[test]
    fn test_scene_time_is_frozen_while_locked() {
        let (mut transition, camera, mut controls) = machine();
        assert_eq!(transition.scene_time(100.0), 100.0);

        transition.enter_locked(1, &snapshot(), &camera, &mut controls, 100.0);
        let at_lock = transition.scene_time(100.0);
        assert_eq!(at_lock, 100.0);
        assert_eq!(
            transition.scene_time(137.5),
            at_lock,
            "Scene time must not advance while locked"
        );
    }

    #[test]
    fn test_unlock_resumes_scene_time_without_a_jump() {
        let (mut transition, camera, mut controls) = machine();
        transition.enter_locked(1, &snapshot(), &camera, &mut controls, 100.0);
        transition.exit_locked(&snapshot(), &camera, &mut controls, 160.0);

        // Immediately after unlocking, scene time equals the lock instant.
        assert_eq!(transition.scene_time(160.0), 100.0);
        // And keeps advancing at the normal rate from there.
        assert_eq!(transition.scene_time(161.0), 101.0);
    }

    #[test]
    fn test_repeated_cycles_accumulate_the_offset() {
        let (mut transition, camera, mut controls) = machine();
        let snap = snapshot();
        transition.enter_locked(0, &snap, &camera, &mut controls, 10.0);
        transition.exit_locked(&snap, &camera, &mut controls, 15.0);
        transition.enter_locked(1, &snap, &camera, &mut controls, 20.0);
        transition.exit_locked(&snap, &camera, &mut controls, 30.0);
        // 5 + 10 locked seconds removed from the time base.
        assert_eq!(transition.scene_time(30.0), 15.0);
    }

    #[test]
    fn test_unlock_schedules_the_return_animations() {
        let (mut transition, camera, mut controls) = machine();
        let snap = snapshot();
        transition.enter_locked(3, &snap, &camera, &mut controls, 0.0);
        // Let the lock animations run to completion.
        transition.advance(TRANSITION_DURATION + 0.1);
        assert!(transition.animations().is_empty());

        let focus = transition.exit_locked(&snap, &camera, &mut controls, 50.0);
        assert_eq!(focus, Some(3));
        assert!(!transition.is_zoomed());
        // Camera + controls target + 5 rings + all 5 bodies back to base scale.
        assert_eq!(transition.animations().len(), 12);
        assert!(controls.zoom_enabled && !controls.auto_rotate);
    }

    #[test]
    fn test_unlock_mid_flight_overwrites_lock_animations() {
        let (mut transition, camera, mut controls) = machine();
        let snap = snapshot();
        transition.enter_locked(0, &snap, &camera, &mut controls, 0.0);
        transition.advance(0.4);

        transition.exit_locked(&snap, &camera, &mut controls, 0.4);
        // Last writer wins: every lock animation on a shared target has been
        // replaced, none duplicated.
        assert_eq!(transition.animations().len(), 12);
        for animation in transition.animations().iter() {
            assert_eq!(animation.elapsed, 0.0, "{:?} was not restarted", animation.target);
        }
    }

    #[test]
    fn test_lock_camera_position_is_outside_the_body() {
        let position = lock_camera_position(Vec3::new(10.0, 0.0, 0.0), 0.5);
        assert!(
            (position - Vec3::new(10.0, 0.0, 0.0)).length() > 0.5,
            "Camera rest position must sit outside the body"
        );
        assert!(position.y > 0.0, "Camera should settle above the orbital plane");
    }
}
