use glam::{Mat4, Vec3};

/// Session default vertical field of view, in degrees.
pub const DEFAULT_FOV_DEG: f32 = 75.0;
/// Session default near plane.
pub const DEFAULT_NEAR: f32 = 0.1;
/// Session default far plane.
pub const DEFAULT_FAR: f32 = 1000.0;

/// Perspective projection camera.
///
/// Sessions construct this with the fixed 75° / 0.1 / 1000 parameters and
/// recompute the aspect on every resize. Visualizations may build additional
/// cameras (e.g. for frustum inspection) with [`PerspectiveCamera::with_params`].
#[derive(Debug, Clone)]
pub struct PerspectiveCamera {
    position: Vec3,
    target: Vec3,
    up: Vec3,
    fov_y: f32,
    aspect: f32,
    near: f32,
    far: f32,
    projection: Mat4,
}

impl PerspectiveCamera {
    /// Camera with session defaults, eye at (5, 5, 5) looking at the origin.
    pub fn new(aspect: f32) -> Self {
        let mut camera = Self::with_params(DEFAULT_FOV_DEG, aspect, DEFAULT_NEAR, DEFAULT_FAR);
        camera.position = Vec3::splat(5.0);
        camera
    }

    /// Camera with explicit projection parameters (fov in degrees).
    pub fn with_params(fov_deg: f32, aspect: f32, near: f32, far: f32) -> Self {
        let mut camera = Self {
            position: Vec3::ZERO,
            target: Vec3::ZERO,
            up: Vec3::Y,
            fov_y: fov_deg.to_radians(),
            aspect: aspect.max(f32::EPSILON),
            near,
            far,
            projection: Mat4::IDENTITY,
        };
        camera.update_projection();
        camera
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    pub fn target(&self) -> Vec3 {
        self.target
    }

    /// Points the camera at `target` (world space).
    pub fn look_at(&mut self, target: Vec3) {
        self.target = target;
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    /// Updates the aspect ratio and recomputes the projection matrix.
    pub fn set_aspect(&mut self, aspect: f32) {
        self.aspect = aspect.max(f32::EPSILON);
        self.update_projection();
    }

    pub fn fov_deg(&self) -> f32 {
        self.fov_y.to_degrees()
    }

    pub fn set_fov_deg(&mut self, fov_deg: f32) {
        self.fov_y = fov_deg.to_radians();
        self.update_projection();
    }

    pub fn near(&self) -> f32 {
        self.near
    }

    pub fn far(&self) -> f32 {
        self.far
    }

    pub fn view_matrix(&self) -> Mat4 {
        // Degenerate eye/target pairs fall back to looking down -Z.
        let forward = self.target - self.position;
        if forward.length_squared() < f32::EPSILON {
            return Mat4::look_to_rh(self.position, Vec3::NEG_Z, self.up);
        }
        Mat4::look_at_rh(self.position, self.target, self.up)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        self.projection
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection * self.view_matrix()
    }

    fn update_projection(&mut self) {
        self.projection = Mat4::perspective_rh(self.fov_y, self.aspect, self.near, self.far);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aspect_updates_projection() {
        let mut camera = PerspectiveCamera::new(1.0);
        let before = camera.projection_matrix();
        camera.set_aspect(2.0);
        assert!((camera.aspect() - 2.0).abs() < 1e-6);
        assert_ne!(before, camera.projection_matrix());
    }

    #[test]
    fn view_projection_is_finite_for_defaults() {
        let camera = PerspectiveCamera::new(800.0 / 600.0);
        let vp = camera.view_projection();
        assert!(vp.to_cols_array().iter().all(|v| v.is_finite()));
    }

    #[test]
    fn zero_aspect_is_clamped() {
        let camera = PerspectiveCamera::new(0.0);
        assert!(camera.aspect() > 0.0);
    }
}
