//! Free-orbit camera controls.
//!
//! The camera circles a look-at target driven by input deltas while the view
//! is in overview; the transition state machine flips the gates and the slow
//! auto-rotate when the camera locks onto a body.

use glam::{Quat, Vec3};
use orrery_render::Camera;

/// Closest the camera may dolly toward the target.
const MIN_ORBIT_RADIUS: f32 = 5.0;
/// Farthest the camera may dolly away; stays inside the far clip plane.
const MAX_ORBIT_RADIUS: f32 = 150.0;
/// Keep the polar angle off the poles so the view never flips.
const POLAR_MARGIN: f32 = 0.05;

/// Orbit-style camera controls around a movable look-at target.
#[derive(Debug, Clone)]
pub struct OrbitControls {
    /// Point the camera orbits and aims at.
    pub target: Vec3,
    /// Rotation speed multiplier for input deltas.
    pub rotate_speed: f32,
    /// Dolly speed multiplier.
    pub zoom_speed: f32,
    /// Pan speed multiplier.
    pub pan_speed: f32,
    /// Dolly gate. Closed while locked onto a body.
    pub zoom_enabled: bool,
    /// Pan gate. Closed while locked onto a body.
    pub pan_enabled: bool,
    /// Slow automatic orbit around the target, on while locked.
    pub auto_rotate: bool,
    /// Auto-rotate rate in radians per time unit.
    pub auto_rotate_speed: f32,
}

impl Default for OrbitControls {
    fn default() -> Self {
        Self {
            target: Vec3::ZERO,
            rotate_speed: 1.0,
            zoom_speed: 0.8,
            pan_speed: 0.8,
            zoom_enabled: true,
            pan_enabled: true,
            auto_rotate: false,
            auto_rotate_speed: 0.5_f32.to_radians(),
        }
    }
}

impl OrbitControls {
    /// Controls in the free-orbit overview configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Close the zoom/pan gates and start the slow auto-rotate.
    ///
    /// The look-at target itself is animated by the transition state machine,
    /// not snapped here.
    pub fn lock(&mut self) {
        self.zoom_enabled = false;
        self.pan_enabled = false;
        self.auto_rotate = true;
    }

    /// Reopen the zoom/pan gates and stop auto-rotating.
    pub fn release(&mut self) {
        self.zoom_enabled = true;
        self.pan_enabled = true;
        self.auto_rotate = false;
    }

    /// Rotate the camera around the target from input deltas (radians).
    ///
    /// The polar angle is clamped away from the poles; the orbit radius is
    /// preserved exactly.
    pub fn orbit(&self, camera: &mut Camera, delta_yaw: f32, delta_pitch: f32) {
        let rel = camera.position - self.target;
        let radius = rel.length();
        if radius <= f32::EPSILON {
            return;
        }
        let mut azimuth = rel.z.atan2(rel.x);
        let mut polar = (rel.y / radius).clamp(-1.0, 1.0).acos();
        azimuth -= delta_yaw * self.rotate_speed;
        polar = (polar - delta_pitch * self.rotate_speed)
            .clamp(POLAR_MARGIN, std::f32::consts::PI - POLAR_MARGIN);

        camera.position = self.target
            + Vec3::new(
                radius * polar.sin() * azimuth.cos(),
                radius * polar.cos(),
                radius * polar.sin() * azimuth.sin(),
            );
        camera.target = self.target;
    }

    /// Dolly toward (`amount > 0`) or away from the target. Gated by
    /// `zoom_enabled`.
    pub fn zoom(&self, camera: &mut Camera, amount: f32) {
        if !self.zoom_enabled {
            return;
        }
        let rel = camera.position - self.target;
        let radius = rel.length();
        if radius <= f32::EPSILON {
            return;
        }
        let next = (radius * (1.0 - amount * self.zoom_speed * 0.1))
            .clamp(MIN_ORBIT_RADIUS, MAX_ORBIT_RADIUS);
        camera.position = self.target + rel / radius * next;
    }

    /// Slide the target and camera together across the view plane. Gated by
    /// `pan_enabled`.
    pub fn pan(&mut self, camera: &mut Camera, dx: f32, dy: f32) {
        if !self.pan_enabled {
            return;
        }
        let forward = (self.target - camera.position).normalize_or(Vec3::NEG_Z);
        let right = forward.cross(camera.up).normalize_or(Vec3::X);
        let up = right.cross(forward);
        let offset = (right * -dx + up * dy) * self.pan_speed;
        self.target += offset;
        camera.position += offset;
        camera.target = self.target;
    }

    /// Advance the slow auto-rotate by `dt` time units and re-aim the camera.
    /// No-op unless `auto_rotate` is on.
    pub fn apply_auto_rotate(&self, camera: &mut Camera, dt: f64) {
        if !self.auto_rotate {
            return;
        }
        let angle = self.auto_rotate_speed * dt as f32;
        let rel = camera.position - self.target;
        camera.position = self.target + Quat::from_rotation_y(angle) * rel;
        camera.target = self.target;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lock_closes_gates_and_release_reopens() {
        let mut controls = OrbitControls::new();
        assert!(controls.zoom_enabled && controls.pan_enabled);
        assert!(!controls.auto_rotate);

        controls.lock();
        assert!(!controls.zoom_enabled);
        assert!(!controls.pan_enabled);
        assert!(controls.auto_rotate);

        controls.release();
        assert!(controls.zoom_enabled);
        assert!(controls.pan_enabled);
        assert!(!controls.auto_rotate);
    }

    #[test]
    fn test_orbit_preserves_radius() {
        let controls = OrbitControls::new();
        let mut camera = Camera::overview(1.0);
        let radius = (camera.position - controls.target).length();
        controls.orbit(&mut camera, 0.3, -0.2);
        let after = (camera.position - controls.target).length();
        assert!(
            (radius - after).abs() < 1e-3,
            "Orbit changed the radius: {radius} -> {after}"
        );
        assert_eq!(camera.target, controls.target);
    }

    #[test]
    fn test_orbit_pitch_is_clamped_at_the_poles() {
        let controls = OrbitControls::new();
        let mut camera = Camera::overview(1.0);
        for _ in 0..100 {
            controls.orbit(&mut camera, 0.0, 0.5);
        }
        let rel = camera.position - controls.target;
        assert!(
            rel.y < rel.length(),
            "Camera pushed through the pole: {rel:?}"
        );
    }

    #[test]
    fn test_zoom_moves_along_the_view_ray() {
        let controls = OrbitControls::new();
        let mut camera = Camera::overview(1.0);
        let before = (camera.position - controls.target).length();
        controls.zoom(&mut camera, 1.0);
        let after = (camera.position - controls.target).length();
        assert!(after < before, "Positive zoom must dolly in: {before} -> {after}");
    }

    #[test]
    fn test_zoom_respects_radius_limits() {
        let controls = OrbitControls::new();
        let mut camera = Camera::overview(1.0);
        for _ in 0..500 {
            controls.zoom(&mut camera, 1.0);
        }
        let radius = (camera.position - controls.target).length();
        assert!(radius >= MIN_ORBIT_RADIUS - 1e-3, "Dollied inside the minimum: {radius}");
    }

    #[test]
    fn test_zoom_gate_blocks_dolly() {
        let mut controls = OrbitControls::new();
        controls.lock();
        let mut camera = Camera::overview(1.0);
        let before = camera.position;
        controls.zoom(&mut camera, 1.0);
        assert_eq!(camera.position, before, "Locked controls must ignore zoom");
    }

    #[test]
    fn test_pan_moves_target_and_camera_together() {
        let mut controls = OrbitControls::new();
        let mut camera = Camera::overview(1.0);
        let rel = camera.position - controls.target;
        controls.pan(&mut camera, 2.0, -1.0);
        let rel_after = camera.position - controls.target;
        assert!(
            (rel - rel_after).length() < 1e-4,
            "Pan must not change the camera-target offset"
        );
        assert_ne!(controls.target, Vec3::ZERO);
    }

    #[test]
    fn test_auto_rotate_keeps_height_and_radius() {
        let mut controls = OrbitControls::new();
        controls.lock();
        controls.target = Vec3::new(12.0, 0.0, -3.0);
        let mut camera = Camera::overview(1.0);
        let rel = camera.position - controls.target;
        controls.apply_auto_rotate(&mut camera, 1.0);
        let after = camera.position - controls.target;
        assert!((rel.length() - after.length()).abs() < 1e-3);
        assert!((rel.y - after.y).abs() < 1e-4, "Auto-rotate must stay horizontal");
        assert!(rel != after, "Auto-rotate must actually move the camera");
    }

    #[test]
    fn test_auto_rotate_off_is_a_no_op() {
        let controls = OrbitControls::new();
        let mut camera = Camera::overview(1.0);
        let before = camera.position;
        controls.apply_auto_rotate(&mut camera, 10.0);
        assert_eq!(camera.position, before);
    }
}
