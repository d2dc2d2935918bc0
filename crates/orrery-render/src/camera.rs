//! Look-at camera with perspective projection.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};

/// A camera defined by a position and a look-at target.
///
/// Free-orbit controls and the lock-on transition both steer the camera by
/// writing `position` and `target`; matrices are derived on demand.
#[derive(Debug, Clone)]
pub struct Camera {
    /// World-space position.
    pub position: Vec3,
    /// World-space point the camera aims at.
    pub target: Vec3,
    /// Up reference, normally +Y.
    pub up: Vec3,
    /// Vertical field of view in radians.
    pub fov_y: f32,
    /// Width / height.
    pub aspect_ratio: f32,
    /// Near clip plane distance.
    pub near: f32,
    /// Far clip plane distance.
    pub far: f32,
}

impl Camera {
    /// The fixed overview pose the scene starts from and returns to.
    pub fn overview(aspect_ratio: f32) -> Self {
        Self {
            position: Vec3::new(30.0, 50.0, 30.0),
            target: Vec3::ZERO,
            up: Vec3::Y,
            fov_y: 40.0_f32.to_radians(),
            aspect_ratio,
            near: 1.0,
            far: 200.0,
        }
    }

    /// View matrix looking from `position` toward `target`.
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, self.up)
    }

    /// Perspective projection matrix.
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y, self.aspect_ratio, self.near, self.far)
    }

    /// Combined view-projection matrix.
    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// Update the aspect ratio from new viewport dimensions.
    pub fn set_aspect_ratio(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.aspect_ratio = width as f32 / height as f32;
        }
    }

    /// Pack the camera into a GPU uniform.
    pub fn to_uniform(&self) -> CameraUniform {
        CameraUniform {
            view_proj: self.view_projection_matrix().to_cols_array_2d(),
            camera_pos: [self.position.x, self.position.y, self.position.z, 0.0],
        }
    }
}

/// GPU uniform carrying the camera matrices.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct CameraUniform {
    /// Column-major view-projection matrix.
    pub view_proj: [[f32; 4]; 4],
    /// Camera world position (w unused).
    pub camera_pos: [f32; 4],
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec4;

    #[test]
    fn test_overview_pose_matches_scene_defaults() {
        let camera = Camera::overview(16.0 / 9.0);
        assert_eq!(camera.position, Vec3::new(30.0, 50.0, 30.0));
        assert_eq!(camera.target, Vec3::ZERO);
        assert_eq!(camera.near, 1.0);
        assert_eq!(camera.far, 200.0);
        assert!((camera.fov_y - 40.0_f32.to_radians()).abs() < 1e-6);
    }

    #[test]
    fn test_view_matrix_centers_the_target() {
        let camera = Camera::overview(1.0);
        let view = camera.view_matrix();
        let target_view = view * Vec4::new(0.0, 0.0, 0.0, 1.0);
        // The look-at target projects onto the view axis: x = y = 0.
        assert!(target_view.x.abs() < 1e-4, "target x: {}", target_view.x);
        assert!(target_view.y.abs() < 1e-4, "target y: {}", target_view.y);
        assert!(target_view.z < 0.0, "target must be in front of the camera");
    }

    #[test]
    fn test_set_aspect_ratio() {
        let mut camera = Camera::overview(1.0);
        camera.set_aspect_ratio(1920, 1080);
        assert!((camera.aspect_ratio - 16.0 / 9.0).abs() < 1e-6);
    }

    #[test]
    fn test_set_aspect_ratio_ignores_zero_dimensions() {
        let mut camera = Camera::overview(2.0);
        camera.set_aspect_ratio(0, 1080);
        assert_eq!(camera.aspect_ratio, 2.0, "Zero width must not poison the aspect");
        camera.set_aspect_ratio(800, 0);
        assert_eq!(camera.aspect_ratio, 2.0, "Zero height must not poison the aspect");
    }

    #[test]
    fn test_uniform_packs_position() {
        let camera = Camera::overview(1.5);
        let uniform = camera.to_uniform();
        assert_eq!(uniform.camera_pos[0], 30.0);
        assert_eq!(uniform.camera_pos[1], 50.0);
        assert_eq!(uniform.camera_pos[2], 30.0);
    }

    #[test]
    fn test_camera_uniform_is_16_byte_aligned() {
        assert_eq!(std::mem::size_of::<CameraUniform>() % 16, 0);
    }
}
