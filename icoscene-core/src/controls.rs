//! Orbit controls: pointer and wheel input orbit, dolly and pan the camera
//! around a target point, with optional exponential damping.

use std::f32::consts::PI;

use nalgebra::{Point3, Vector3};

use crate::projection::Camera;

/// Below this the pending motion counts as settled.
const EPS: f32 = 1e-6;

/// Spherical coordinates around the target, Y up.
/// `theta` is the azimuth from +Z toward +X, `phi` the polar angle from +Y.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spherical {
    pub radius: f32,
    pub theta: f32,
    pub phi: f32,
}

impl Spherical {
    pub fn from_offset(offset: &Vector3<f32>) -> Self {
        let radius = offset.norm();
        if radius == 0.0 {
            return Self {
                radius,
                theta: 0.0,
                phi: 0.0,
            };
        }
        Self {
            radius,
            theta: offset.x.atan2(offset.z),
            phi: (offset.y / radius).clamp(-1.0, 1.0).acos(),
        }
    }

    pub fn to_offset(&self) -> Vector3<f32> {
        let sin_phi_radius = self.phi.sin() * self.radius;
        Vector3::new(
            sin_phi_radius * self.theta.sin(),
            self.phi.cos() * self.radius,
            sin_phi_radius * self.theta.cos(),
        )
    }

    /// Keep phi away from the poles, where the azimuth degenerates.
    fn make_safe(&mut self) {
        self.phi = self.phi.clamp(EPS, PI - EPS);
    }
}

/// Pending input and damping state for an orbiting camera
#[derive(Debug, Clone)]
pub struct OrbitControls {
    pub target: Point3<f32>,
    pub enable_damping: bool,
    pub damping_factor: f32,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub pan_speed: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    pub min_polar_angle: f32,
    pub max_polar_angle: f32,
    delta_theta: f32,
    delta_phi: f32,
    scale: f32,
    pan_offset: Vector3<f32>,
}

impl OrbitControls {
    /// Attach to a camera, orbiting its current target.
    pub fn new(camera: &Camera) -> Self {
        Self {
            target: camera.target,
            enable_damping: false,
            damping_factor: 0.05,
            rotate_speed: 1.0,
            zoom_speed: 1.0,
            pan_speed: 1.0,
            min_distance: camera.near,
            max_distance: f32::INFINITY,
            min_polar_angle: 0.0,
            max_polar_angle: PI,
            delta_theta: 0.0,
            delta_phi: 0.0,
            scale: 1.0,
            pan_offset: Vector3::zeros(),
        }
    }

    /// Toggle damping. A non-finite `factor` keeps the current one.
    pub fn set_damping(&mut self, enabled: bool, factor: f32) {
        self.enable_damping = enabled;
        if factor.is_finite() {
            self.damping_factor = factor.clamp(EPS, 1.0);
        } else {
            tracing::warn!(factor, "ignoring non-finite damping factor");
        }
        tracing::debug!(enabled, factor = self.damping_factor, "orbit damping changed");
    }

    pub fn rotate_left(&mut self, angle: f32) {
        self.delta_theta -= angle;
    }

    pub fn rotate_up(&mut self, angle: f32) {
        self.delta_phi -= angle;
    }

    /// Move toward the target by `factor` (< 1 zooms in).
    pub fn dolly_in(&mut self, factor: f32) {
        self.scale *= factor;
    }

    pub fn dolly_out(&mut self, factor: f32) {
        self.scale /= factor;
    }

    /// Pointer drag of `dx`, `dy` cells on a surface `height` cells tall.
    /// A drag across the full height orbits one full turn.
    pub fn pointer_drag(&mut self, dx: f32, dy: f32, height: f32) {
        if height <= 0.0 {
            return;
        }
        self.rotate_left(2.0 * PI * dx / height * self.rotate_speed);
        self.rotate_up(2.0 * PI * dy / height * self.rotate_speed);
    }

    /// Wheel notches; negative values zoom in.
    pub fn wheel(&mut self, delta: f32) {
        let step = 0.95_f32.powf(self.zoom_speed);
        if delta < 0.0 {
            self.dolly_in(step.powf(-delta));
        } else if delta > 0.0 {
            self.dolly_out(step.powf(delta));
        }
    }

    /// Pan by a pointer motion of `dx`, `dy` cells, keeping the point under
    /// the pointer fixed at the target's depth.
    pub fn pan(&mut self, dx: f32, dy: f32, camera: &Camera, height: f32) {
        if height <= 0.0 {
            return;
        }
        let offset = camera.position - camera.target;
        let target_distance = offset.norm() * (camera.fov / 2.0).tan();

        let forward = -offset.normalize();
        let right = forward.cross(&camera.up);
        if right.norm() < EPS {
            return;
        }
        let right = right.normalize();
        let up = right.cross(&forward);

        let scale = 2.0 * target_distance / height * self.pan_speed;
        self.pan_offset += -right * (dx * scale) + up * (dy * scale);
    }

    /// True when no input is pending.
    pub fn is_idle(&self) -> bool {
        self.delta_theta.abs() < EPS
            && self.delta_phi.abs() < EPS
            && (self.scale - 1.0).abs() < EPS
            && self.pan_offset.norm() < EPS
    }

    /// Integrate pending input into the camera. Returns whether it moved.
    pub fn update(&mut self, camera: &mut Camera) -> bool {
        if self.is_idle() {
            self.settle();
            return false;
        }

        let previous = camera.position;
        let mut spherical = Spherical::from_offset(&(camera.position - self.target));

        let gain = if self.enable_damping {
            self.damping_factor
        } else {
            1.0
        };
        spherical.theta += self.delta_theta * gain;
        spherical.phi += self.delta_phi * gain;
        spherical.phi = spherical
            .phi
            .clamp(self.min_polar_angle, self.max_polar_angle);
        spherical.make_safe();

        spherical.radius = (spherical.radius * self.scale).clamp(self.min_distance, self.max_distance);

        self.target += self.pan_offset * gain;

        camera.position = self.target + spherical.to_offset();
        camera.target = self.target;

        if self.enable_damping {
            let decay = 1.0 - self.damping_factor;
            self.delta_theta *= decay;
            self.delta_phi *= decay;
            self.pan_offset *= decay;
        } else {
            self.delta_theta = 0.0;
            self.delta_phi = 0.0;
            self.pan_offset = Vector3::zeros();
        }
        self.scale = 1.0;

        let moved = (camera.position - previous).norm_squared() > EPS * EPS;
        tracing::trace!(moved, theta = spherical.theta, phi = spherical.phi, "orbit update");
        moved
    }

    fn settle(&mut self) {
        self.delta_theta = 0.0;
        self.delta_phi = 0.0;
        self.scale = 1.0;
        self.pan_offset = Vector3::zeros();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera() -> Camera {
        Camera::default()
    }

    #[test]
    fn test_idle_update_is_noop() {
        let mut cam = camera();
        let mut controls = OrbitControls::new(&cam);
        controls.set_damping(false, 0.05);
        let start = cam.position;
        for _ in 0..10 {
            assert!(!controls.update(&mut cam));
        }
        assert_eq!(cam.position, start);
    }

    #[test]
    fn test_rotation_applied_once_without_damping() {
        let mut cam = camera();
        let mut controls = OrbitControls::new(&cam);
        controls.rotate_left(-PI / 2.0);
        assert!(controls.update(&mut cam));

        // Azimuth +90 degrees from +Z lands on +X
        assert!((cam.position - Point3::new(2.0, 0.0, 0.0)).norm() < 1e-4);
        let after = cam.position;
        assert!(!controls.update(&mut cam));
        assert_eq!(cam.position, after);
    }

    #[test]
    fn test_damping_spreads_motion_over_frames() {
        let mut cam = camera();
        let mut controls = OrbitControls::new(&cam);
        controls.set_damping(true, 0.1);
        controls.rotate_left(-1.0);

        controls.update(&mut cam);
        let first = Spherical::from_offset(&(cam.position - controls.target)).theta;
        assert!((first - 0.1).abs() < 1e-4);

        let mut last_step = first;
        let mut theta = first;
        for _ in 0..20 {
            controls.update(&mut cam);
            let next = Spherical::from_offset(&(cam.position - controls.target)).theta;
            let step = next - theta;
            assert!(step > 0.0 && step < last_step);
            last_step = step;
            theta = next;
        }
        assert!(theta < 1.0);
    }

    #[test]
    fn test_damping_comes_to_rest() {
        let mut cam = camera();
        let mut controls = OrbitControls::new(&cam);
        controls.set_damping(true, 0.5);
        controls.rotate_left(0.3);
        for _ in 0..200 {
            controls.update(&mut cam);
        }
        assert!(controls.is_idle());
        let theta = Spherical::from_offset(&(cam.position - controls.target)).theta;
        assert!((theta + 0.3).abs() < 1e-3);
    }

    #[test]
    fn test_polar_angle_clamped() {
        let mut cam = camera();
        let mut controls = OrbitControls::new(&cam);
        controls.rotate_up(10.0);
        controls.update(&mut cam);
        // Stops just short of the pole instead of flipping over it
        assert!(cam.position.coords.iter().all(|c| c.is_finite()));
        assert!((cam.position.y - 2.0).abs() < 1e-3);
        assert!((cam.distance_to_target() - 2.0).abs() < 1e-4);
    }

    #[test]
    fn test_wheel_dollies_within_limits() {
        let mut cam = camera();
        let mut controls = OrbitControls::new(&cam);
        controls.min_distance = 1.5;
        controls.max_distance = 3.0;

        controls.wheel(-1.0);
        controls.update(&mut cam);
        assert!((cam.distance_to_target() - 1.9).abs() < 1e-4);

        controls.wheel(-50.0);
        controls.update(&mut cam);
        assert!((cam.distance_to_target() - 1.5).abs() < 1e-4);

        controls.wheel(50.0);
        controls.update(&mut cam);
        assert!((cam.distance_to_target() - 3.0).abs() < 1e-4);
    }

    #[test]
    fn test_pan_moves_target_and_camera_together() {
        let mut cam = camera();
        let mut controls = OrbitControls::new(&cam);
        let offset_before = cam.position - cam.target;
        controls.pan(4.0, 0.0, &cam, 24.0);
        controls.update(&mut cam);

        assert!(controls.target.x < 0.0);
        assert_eq!(cam.target, controls.target);
        assert!(((cam.position - cam.target) - offset_before).norm() < 1e-4);
    }

    #[test]
    fn test_drag_full_height_is_full_turn() {
        let mut cam = camera();
        let start = cam.position;
        let mut controls = OrbitControls::new(&cam);
        controls.pointer_drag(24.0, 0.0, 24.0);
        controls.update(&mut cam);
        assert!((cam.position - start).norm() < 1e-4);
    }

    #[test]
    fn test_non_finite_damping_factor_is_ignored() {
        let mut cam = camera();
        let mut controls = OrbitControls::new(&cam);
        controls.set_damping(true, 0.2);
        controls.set_damping(true, f32::NAN);
        controls.set_damping(true, f32::INFINITY);
        assert_eq!(controls.damping_factor, 0.2);

        controls.rotate_left(0.1);
        for _ in 0..5 {
            controls.update(&mut cam);
        }
        assert!(cam.position.coords.iter().all(|c| c.is_finite()));
    }

    #[test]
    fn test_dolly_in_stops_at_near_plane() {
        let mut cam = camera();
        let mut controls = OrbitControls::new(&cam);
        for _ in 0..100 {
            controls.wheel(-20.0);
            controls.update(&mut cam);
        }
        assert!((cam.distance_to_target() - cam.near).abs() < 1e-4);

        controls.wheel(1.0);
        assert!(controls.update(&mut cam));
        assert!(cam.distance_to_target() > cam.near);
    }
}
