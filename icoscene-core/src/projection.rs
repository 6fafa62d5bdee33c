//! Camera and projection utilities

use nalgebra::{Matrix4, Point3, Vector3, Vector4};

use crate::config::SceneConfig;

/// Perspective camera. Projection parameters are fixed after creation
/// apart from `aspect`, which follows the surface size.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    pub position: Point3<f32>,
    pub target: Point3<f32>,
    pub up: Vector3<f32>,
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

/// A vertex after projection: cell coordinates plus view-space distance
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenPoint {
    pub x: f32,
    pub y: f32,
    pub depth: f32,
}

impl Camera {
    pub fn perspective(fov: f32, aspect: f32, near: f32, far: f32) -> Self {
        Self {
            position: Point3::new(0.0, 0.0, 5.0),
            target: Point3::origin(),
            up: Vector3::y(),
            fov,
            aspect,
            near,
            far,
        }
    }

    pub fn from_config(config: &SceneConfig, aspect: f32) -> Self {
        let mut camera = Self::perspective(config.fov_radians(), aspect, config.near, config.far);
        camera.position = Point3::new(0.0, 0.0, config.camera_distance);
        camera
    }

    /// Create the view matrix (camera transformation)
    pub fn view_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(&self.position, &self.target, &self.up)
    }

    /// Create the projection matrix
    pub fn projection_matrix(&self) -> Matrix4<f32> {
        Matrix4::new_perspective(self.aspect, self.fov, self.near, self.far)
    }

    pub fn view_projection(&self) -> Matrix4<f32> {
        self.projection_matrix() * self.view_matrix()
    }

    /// Project a world-space point through `view_projection` into a
    /// `width` x `height` grid.
    ///
    /// Points behind the camera or outside the near/far range give `None`;
    /// points off the sides of the grid are still returned so the rasterizer
    /// can clip partially visible triangles.
    pub fn project(
        view_projection: &Matrix4<f32>,
        point: &Point3<f32>,
        width: usize,
        height: usize,
    ) -> Option<ScreenPoint> {
        let clip: Vector4<f32> = view_projection * point.to_homogeneous();

        // Prevent division by near-zero depth values
        if clip.w <= 1e-6 {
            return None;
        }

        let ndc = clip.xyz() / clip.w;
        if ndc.z < -1.0 || ndc.z > 1.0 {
            return None;
        }

        Some(ScreenPoint {
            x: (ndc.x + 1.0) * 0.5 * width as f32,
            y: (1.0 - ndc.y) * 0.5 * height as f32,
            depth: clip.w,
        })
    }

    /// Project a model-space point to screen space
    pub fn project_to_screen(
        &self,
        point: &Point3<f32>,
        model_matrix: &Matrix4<f32>,
        width: usize,
        height: usize,
    ) -> Option<ScreenPoint> {
        let mvp = self.view_projection() * model_matrix;
        Self::project(&mvp, point, width, height)
    }

    pub fn distance_to_target(&self) -> f32 {
        (self.position - self.target).norm()
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::from_config(&SceneConfig::default(), 800.0 / 600.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_camera_creation() {
        let camera = Camera::default();
        assert!((camera.aspect - 800.0 / 600.0).abs() < 1e-6);
        assert!((camera.fov - 75.0_f32.to_radians()).abs() < 1e-6);
        assert_eq!(camera.position, Point3::new(0.0, 0.0, 2.0));
    }

    #[test]
    fn test_view_matrix() {
        let camera = Camera::default();
        let view = camera.view_matrix();
        // View matrix should be non-zero
        assert!(view.norm() > 0.0);
    }

    #[test]
    fn test_target_projects_to_centre() {
        let camera = Camera::default();
        let p = camera
            .project_to_screen(&Point3::origin(), &Matrix4::identity(), 80, 24)
            .unwrap();
        assert!((p.x - 40.0).abs() < 1e-4);
        assert!((p.y - 12.0).abs() < 1e-4);
        assert!((p.depth - 2.0).abs() < 1e-4);
    }

    #[test]
    fn test_points_behind_camera_rejected() {
        let camera = Camera::default();
        let behind = Point3::new(0.0, 0.0, 3.0);
        assert!(camera
            .project_to_screen(&behind, &Matrix4::identity(), 80, 24)
            .is_none());
        let beyond_far = Point3::new(0.0, 0.0, -20.0);
        assert!(camera
            .project_to_screen(&beyond_far, &Matrix4::identity(), 80, 24)
            .is_none());
    }

    #[test]
    fn test_nearer_points_have_smaller_depth() {
        let camera = Camera::default();
        let vp = camera.view_projection();
        let near = Camera::project(&vp, &Point3::new(0.0, 0.0, 1.0), 80, 24).unwrap();
        let far = Camera::project(&vp, &Point3::new(0.0, 0.0, -1.0), 80, 24).unwrap();
        assert!(near.depth < far.depth);
    }
}
