use std::f32::consts::PI;

use glam::{Vec2, Vec3};

use crate::camera::PerspectiveCamera;

/// Distance range the controller keeps the camera inside, in world units.
pub const MIN_DISTANCE: f32 = 1.0;
pub const MAX_DISTANCE: f32 = 50.0;

const DAMPING_FACTOR: f32 = 0.05;
const MIN_PITCH: f32 = 0.01;

/// Interactive camera manipulator.
///
/// Orbits the camera around a target point from pointer and wheel input,
/// with inertial damping. Panning moves the target parallel to the ground
/// plane (screen-space panning stays off), and the orbit distance is clamped
/// to [`MIN_DISTANCE`]..[`MAX_DISTANCE`].
///
/// Input methods only accumulate deltas; [`OrbitControls::update`] applies
/// them to the camera once per frame, reading the camera's current position
/// so hooks that reposition the camera directly are picked up rather than
/// overwritten.
#[derive(Debug, Clone)]
pub struct OrbitControls {
    target: Vec3,
    rot_pending: Vec2,
    pan_pending: Vec2,
    zoom_pending: f32,
}

impl OrbitControls {
    /// Controller orbiting the camera's current target.
    pub fn new(camera: &PerspectiveCamera) -> Self {
        Self {
            target: camera.target(),
            rot_pending: Vec2::ZERO,
            pan_pending: Vec2::ZERO,
            zoom_pending: 0.0,
        }
    }

    pub fn target(&self) -> Vec3 {
        self.target
    }

    pub fn set_target(&mut self, target: Vec3) {
        self.target = target;
    }

    /// Accumulates an orbit rotation, in radians of yaw/pitch.
    pub fn rotate(&mut self, yaw: f32, pitch: f32) {
        self.rot_pending += Vec2::new(yaw, pitch);
    }

    /// Accumulates a ground-plane pan, in logical pixels of pointer motion.
    pub fn pan(&mut self, dx: f32, dy: f32) {
        self.pan_pending += Vec2::new(dx, dy);
    }

    /// Accumulates a zoom step. Positive moves the camera closer.
    pub fn zoom(&mut self, amount: f32) {
        self.zoom_pending -= amount;
    }

    /// Applies pending input with damping and repositions the camera.
    pub fn update(&mut self, dt: f32, camera: &mut PerspectiveCamera) {
        // Damping consumes a fixed fraction of the pending deltas per 60 Hz
        // step; `gain` converts that to the actual tick length.
        let steps = (dt * 60.0).clamp(0.0, 4.0);
        let gain = 1.0 - (1.0 - DAMPING_FACTOR).powf(steps);

        let mut offset = camera.position() - self.target;
        if offset.length_squared() < 1e-8 {
            offset = Vec3::new(0.0, 0.0, MIN_DISTANCE);
        }

        let mut radius = offset.length();
        let mut yaw = offset.x.atan2(offset.z);
        let mut pitch = (offset.y / radius).clamp(-1.0, 1.0).acos();

        yaw -= self.rot_pending.x * gain;
        pitch = (pitch - self.rot_pending.y * gain).clamp(MIN_PITCH, PI - MIN_PITCH);
        radius = (radius * (1.0 + self.zoom_pending * gain)).clamp(MIN_DISTANCE, MAX_DISTANCE);

        if self.pan_pending != Vec2::ZERO {
            let right = Vec3::new(yaw.cos(), 0.0, -yaw.sin());
            let forward = Vec3::new(-yaw.sin(), 0.0, -yaw.cos());
            let scale = radius * 0.002 * gain;
            self.target += right * (self.pan_pending.x * scale)
                + forward * (self.pan_pending.y * scale);
        }

        self.rot_pending *= 1.0 - gain;
        self.pan_pending *= 1.0 - gain;
        self.zoom_pending *= 1.0 - gain;

        let sp = pitch.sin();
        let position =
            self.target + radius * Vec3::new(sp * yaw.sin(), pitch.cos(), sp * yaw.cos());
        camera.set_position(position);
        camera.look_at(self.target);
    }
}
