//! Scene graph: renderable nodes and lights

use nalgebra::{Matrix4, Vector3};

use crate::config::SceneConfig;
use crate::error::Result;
use crate::geometry::{Edge, Mesh};
use crate::material::{Color, Material};
use crate::transform::Transform;

/// Scale of the wireframe overlay relative to the solid mesh it sits on.
///
/// Keeps the edges just outside the faces so the depth test does not let
/// the two surfaces fight over the same cells.
pub const WIREFRAME_SCALE: f32 = 1.001;

/// Largest allowed distance of the overlay scale from 1.0.
pub const WIREFRAME_SCALE_EPSILON: f32 = 0.01;

/// A drawable node: mesh, material, local transform and children
#[derive(Debug, Clone)]
pub struct SceneNode {
    pub mesh: Mesh,
    pub material: Material,
    pub transform: Transform,
    pub children: Vec<SceneNode>,
    /// Unique mesh edges, built once for wireframe nodes and empty otherwise.
    pub edges: Vec<Edge>,
}

impl SceneNode {
    pub fn new(mesh: Mesh, material: Material) -> Self {
        let edges = if material.is_wireframe() {
            mesh.edges()
        } else {
            Vec::new()
        };
        Self {
            mesh,
            material,
            transform: Transform::identity(),
            children: Vec::new(),
            edges,
        }
    }

    pub fn add_child(&mut self, child: SceneNode) -> &mut SceneNode {
        self.children.push(child);
        let last = self.children.len() - 1;
        &mut self.children[last]
    }

    /// Visit this node and all descendants with their world matrices, parents first.
    pub fn walk<F>(&self, parent: &Matrix4<f32>, visit: &mut F)
    where
        F: FnMut(&SceneNode, &Matrix4<f32>),
    {
        let world = self.transform.compose(parent);
        visit(self, &world);
        for child in &self.children {
            child.walk(&world, visit);
        }
    }

    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(SceneNode::node_count).sum::<usize>()
    }
}

/// Light sources
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Light {
    /// Sky colour from above blending into ground colour from below
    Hemisphere {
        sky: Color,
        ground: Color,
        intensity: f32,
    },
    /// Parallel light travelling along `direction`
    Directional {
        color: Color,
        direction: Vector3<f32>,
        intensity: f32,
    },
    Ambient {
        color: Color,
        intensity: f32,
    },
}

impl Light {
    /// Irradiance arriving at a surface with world-space normal `normal`.
    pub fn irradiance(&self, normal: &Vector3<f32>) -> Color {
        match *self {
            Light::Hemisphere {
                sky,
                ground,
                intensity,
            } => {
                let weight = 0.5 * normal.y + 0.5;
                ground.lerp(sky, weight).scale(intensity)
            }
            Light::Directional {
                color,
                direction,
                intensity,
            } => {
                let towards_light = -direction.normalize();
                color.scale(normal.dot(&towards_light).max(0.0) * intensity)
            }
            Light::Ambient { color, intensity } => color.scale(intensity),
        }
    }
}

/// Root node plus the lights that shade it
#[derive(Debug, Clone)]
pub struct Scene {
    pub root: SceneNode,
    pub lights: Vec<Light>,
}

impl Scene {
    pub fn new(root: SceneNode) -> Self {
        Self {
            root,
            lights: Vec::new(),
        }
    }

    pub fn add_light(&mut self, light: Light) {
        self.lights.push(light);
    }

    /// Flat-shaded icosahedron with a wireframe overlay and a hemisphere light.
    pub fn icosahedron(config: &SceneConfig) -> Result<Self> {
        let geometry = Mesh::icosahedron(config.radius, config.detail)?;

        let mut wire = SceneNode::new(geometry.clone(), Material::wireframe(config.wire_color));
        wire.transform.set_scalar_scale(WIREFRAME_SCALE);

        let mut solid = geometry;
        if !config.flat_shading {
            solid.smooth_normals();
        }
        let mut root = SceneNode::new(
            solid,
            Material::standard(config.mesh_color, config.flat_shading),
        );
        root.add_child(wire);

        let mut scene = Self::new(root);
        scene.add_light(Light::Hemisphere {
            sky: config.sky_color,
            ground: config.ground_color,
            intensity: config.light_intensity,
        });

        tracing::info!(
            faces = scene.root.mesh.triangles.len(),
            detail = config.detail,
            radius = config.radius,
            "built icosahedron scene"
        );
        Ok(scene)
    }

    /// Scale of the first wireframe child of the root, if there is one.
    pub fn wireframe_scale(&self) -> Option<f32> {
        self.root
            .children
            .iter()
            .find(|child| child.material.is_wireframe())
            .map(|child| child.transform.scale.x)
    }

    /// Sum of all lights for a world-space normal.
    pub fn irradiance(&self, normal: &Vector3<f32>) -> Color {
        self.lights
            .iter()
            .fold(Color::new(0.0, 0.0, 0.0), |acc, light| acc + light.irradiance(normal))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_scene_layout() {
        let scene = Scene::icosahedron(&SceneConfig::default()).unwrap();
        assert_eq!(scene.root.node_count(), 2);
        assert_eq!(scene.lights.len(), 1);
        assert!(!scene.root.material.is_wireframe());
        assert_eq!(scene.root.mesh.triangles.len(), 180);
    }

    #[test]
    fn test_wireframe_scale_slightly_larger() {
        let scene = Scene::icosahedron(&SceneConfig::default()).unwrap();
        let scale = scene.wireframe_scale().unwrap();
        assert!(scale > 1.0);
        assert!(scale - 1.0 < WIREFRAME_SCALE_EPSILON);
    }

    #[test]
    fn test_wireframe_follows_parent_rotation() {
        let mut scene = Scene::icosahedron(&SceneConfig::default()).unwrap();
        scene.root.transform.rotation.y = 1.0;

        let mut worlds = Vec::new();
        scene
            .root
            .walk(&Matrix4::identity(), &mut |_: &SceneNode, world: &Matrix4<f32>| {
                worlds.push(*world)
            });

        let expected = scene.root.transform.matrix() * scene.root.children[0].transform.matrix();
        assert_eq!(worlds.len(), 2);
        assert!((worlds[1] - expected).norm() < 1e-6);
    }

    #[test]
    fn test_edges_built_for_wireframe_only() {
        let scene = Scene::icosahedron(&SceneConfig::default()).unwrap();
        assert!(scene.root.edges.is_empty());
        // 30 base edges, each face split into (detail + 1)^2 triangles
        assert_eq!(scene.root.children[0].edges.len(), 30 * 9);
    }

    #[test]
    fn test_smooth_shading_scene() {
        let mut config = SceneConfig::default();
        config.flat_shading = false;
        let scene = Scene::icosahedron(&config).unwrap();
        let tri = &scene.root.mesh.triangles[0];
        assert!(tri.vertices[0].normal != tri.vertices[1].normal);
    }

    #[test]
    fn test_hemisphere_light_blends() {
        let sky = Color::from_hex(0x0000ff);
        let ground = Color::from_hex(0xff0000);
        let light = Light::Hemisphere {
            sky,
            ground,
            intensity: 1.0,
        };
        assert_eq!(light.irradiance(&Vector3::y()), sky);
        assert_eq!(light.irradiance(&-Vector3::y()), ground);
    }

    #[test]
    fn test_directional_light_faces_away() {
        let light = Light::Directional {
            color: Color::WHITE,
            direction: Vector3::new(0.0, 0.0, -1.0),
            intensity: 1.0,
        };
        assert_eq!(light.irradiance(&Vector3::z()), Color::WHITE);
        assert_eq!(light.irradiance(&-Vector3::z()).luminance(), 0.0);
    }
}
