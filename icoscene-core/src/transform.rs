//! 3D transformation matrices and rotation state

use nalgebra::{Matrix4, Vector3};

/// Rotation state around three axes (in radians)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotationState {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl RotationState {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn zero() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            z: 0.0,
        }
    }

    /// Rotate by delta amounts (in radians)
    pub fn rotate(&mut self, dx: f32, dy: f32, dz: f32) {
        self.x += dx;
        self.y += dy;
        self.z += dz;
    }

    pub fn matrix(&self) -> Matrix4<f32> {
        let rx = Matrix4::new_rotation(Vector3::new(self.x, 0.0, 0.0));
        let ry = Matrix4::new_rotation(Vector3::new(0.0, self.y, 0.0));
        let rz = Matrix4::new_rotation(Vector3::new(0.0, 0.0, self.z));

        // Apply rotations in order: Z, Y, X
        rz * ry * rx
    }
}

impl Default for RotationState {
    fn default() -> Self {
        Self::zero()
    }
}

/// Position, rotation and scale of a scene node relative to its parent
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vector3<f32>,
    pub rotation: RotationState,
    pub scale: Vector3<f32>,
}

impl Transform {
    pub fn identity() -> Self {
        Self {
            position: Vector3::zeros(),
            rotation: RotationState::zero(),
            scale: Vector3::new(1.0, 1.0, 1.0),
        }
    }

    /// Same factor on all three axes
    pub fn set_scalar_scale(&mut self, s: f32) {
        self.scale = Vector3::new(s, s, s);
    }

    /// Local matrix, T * R * S
    pub fn matrix(&self) -> Matrix4<f32> {
        Matrix4::new_translation(&self.position)
            * self.rotation.matrix()
            * Matrix4::new_nonuniform_scaling(&self.scale)
    }

    /// World matrix for a node under `parent`
    pub fn compose(&self, parent: &Matrix4<f32>) -> Matrix4<f32> {
        parent * self.matrix()
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point3;

    #[test]
    fn test_rotation_state() {
        let mut state = RotationState::zero();
        assert_eq!(state.x, 0.0);
        assert_eq!(state.y, 0.0);
        assert_eq!(state.z, 0.0);

        state.rotate(0.1, 0.2, 0.3);
        assert!((state.x - 0.1).abs() < 1e-6);
        assert!((state.y - 0.2).abs() < 1e-6);
        assert!((state.z - 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_identity_transform() {
        let matrix = Transform::identity().matrix();
        assert!((matrix - Matrix4::identity()).norm() < 1e-6);
    }

    #[test]
    fn test_yaw_quarter_turn() {
        let mut t = Transform::identity();
        t.rotation.y = std::f32::consts::FRAC_PI_2;
        let p = t.matrix().transform_point(&Point3::new(1.0, 0.0, 0.0));
        assert!((p - Point3::new(0.0, 0.0, -1.0)).norm() < 1e-6);
    }

    #[test]
    fn test_child_scale_composes() {
        let mut parent = Transform::identity();
        parent.set_scalar_scale(2.0);
        let mut child = Transform::identity();
        child.set_scalar_scale(1.5);

        let world = child.compose(&parent.matrix());
        let p = world.transform_point(&Point3::new(1.0, 0.0, 0.0));
        assert!((p.x - 3.0).abs() < 1e-6);
    }
}
