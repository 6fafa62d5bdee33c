//! Geometry primitives and polyhedron tessellation

use std::collections::{HashMap, HashSet};

use nalgebra::{Point3, Vector3};

use crate::error::{Error, Result};

/// A 3D vertex with position and normal
#[derive(Debug, Clone, Copy)]
pub struct Vertex {
    pub position: Point3<f32>,
    pub normal: Vector3<f32>,
}

impl Vertex {
    pub fn new(x: f32, y: f32, z: f32, nx: f32, ny: f32, nz: f32) -> Self {
        Self {
            position: Point3::new(x, y, z),
            normal: Vector3::new(nx, ny, nz),
        }
    }

    fn flat(position: Point3<f32>, normal: Vector3<f32>) -> Self {
        Self { position, normal }
    }
}

/// A triangle face defined by three vertices
#[derive(Debug, Clone)]
pub struct Triangle {
    pub vertices: [Vertex; 3],
}

impl Triangle {
    pub fn new(v0: Vertex, v1: Vertex, v2: Vertex) -> Self {
        Self {
            vertices: [v0, v1, v2],
        }
    }

    /// Calculate the face normal from the triangle's vertices
    pub fn calculate_normal(&self) -> Vector3<f32> {
        let v0 = self.vertices[0].position;
        let v1 = self.vertices[1].position;
        let v2 = self.vertices[2].position;

        let edge1 = v1 - v0;
        let edge2 = v2 - v0;

        edge1.cross(&edge2).normalize()
    }

    pub fn centroid(&self) -> Point3<f32> {
        let sum = self.vertices[0].position.coords
            + self.vertices[1].position.coords
            + self.vertices[2].position.coords;
        Point3::from(sum / 3.0)
    }
}

/// An undirected mesh edge, used for wireframe drawing
#[derive(Debug, Clone, Copy)]
pub struct Edge {
    pub a: Point3<f32>,
    pub b: Point3<f32>,
}

/// A 3D mesh composed of triangles
#[derive(Debug, Clone)]
pub struct Mesh {
    pub triangles: Vec<Triangle>,
}

/// Base icosahedron, twelve vertices on three orthogonal golden rectangles.
const ICO_T: f32 = 1.618_034;

const ICO_VERTICES: [[f32; 3]; 12] = [
    [-1.0, ICO_T, 0.0],
    [1.0, ICO_T, 0.0],
    [-1.0, -ICO_T, 0.0],
    [1.0, -ICO_T, 0.0],
    [0.0, -1.0, ICO_T],
    [0.0, 1.0, ICO_T],
    [0.0, -1.0, -ICO_T],
    [0.0, 1.0, -ICO_T],
    [ICO_T, 0.0, -1.0],
    [ICO_T, 0.0, 1.0],
    [-ICO_T, 0.0, -1.0],
    [-ICO_T, 0.0, 1.0],
];

const ICO_FACES: [[usize; 3]; 20] = [
    // 5 faces around point 0
    [0, 11, 5],
    [0, 5, 1],
    [0, 1, 7],
    [0, 7, 10],
    [0, 10, 11],
    // 5 adjacent faces
    [1, 5, 9],
    [5, 11, 4],
    [11, 10, 2],
    [10, 7, 6],
    [7, 1, 8],
    // 5 faces around point 3
    [3, 9, 4],
    [3, 4, 2],
    [3, 2, 6],
    [3, 6, 8],
    [3, 8, 9],
    // 5 adjacent faces
    [4, 9, 5],
    [2, 4, 11],
    [6, 2, 10],
    [8, 6, 7],
    [9, 8, 1],
];

/// Detail levels above this produce more faces than a character grid can show.
pub const MAX_DETAIL: u32 = 16;

impl Mesh {
    pub fn new() -> Self {
        Self {
            triangles: Vec::new(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            triangles: Vec::with_capacity(capacity),
        }
    }

    pub fn add_triangle(&mut self, triangle: Triangle) {
        self.triangles.push(triangle);
    }

    /// Build a flat-shaded icosahedron of the given circumradius.
    ///
    /// Each of the 20 base faces is split into `(detail + 1)^2` triangles
    /// and every new vertex is pushed out onto the sphere, so `detail = 0`
    /// is the plain icosahedron and higher levels approach a sphere.
    pub fn icosahedron(radius: f32, detail: u32) -> Result<Self> {
        if !radius.is_finite() || radius <= 0.0 {
            return Err(Error::InvalidGeometry(format!(
                "icosahedron radius must be positive, got {radius}"
            )));
        }
        if detail > MAX_DETAIL {
            return Err(Error::InvalidGeometry(format!(
                "icosahedron detail {detail} exceeds {MAX_DETAIL}"
            )));
        }

        let cols = detail as usize + 1;
        let mut mesh = Self::with_capacity(ICO_FACES.len() * cols * cols);

        for &face in &ICO_FACES {
            let [a, b, c] = face.map(|i| {
                let [x, y, z] = ICO_VERTICES[i];
                Point3::new(x, y, z)
            });
            subdivide_face(&mut mesh, a, b, c, cols, radius);
        }

        Ok(mesh)
    }

    /// Replace per-face normals with the average of the faces meeting at
    /// each vertex position.
    pub fn smooth_normals(&mut self) {
        let mut welder = Welder::default();
        let mut sums: Vec<Vector3<f32>> = Vec::new();
        let mut indices = Vec::with_capacity(self.triangles.len());

        for triangle in &self.triangles {
            let face_normal = triangle.calculate_normal();
            let corner = triangle.vertices.map(|v| {
                let i = welder.index(v.position);
                if i == sums.len() {
                    sums.push(Vector3::zeros());
                }
                sums[i] += face_normal;
                i
            });
            indices.push(corner);
        }

        for (triangle, corner) in self.triangles.iter_mut().zip(indices) {
            for (vertex, i) in triangle.vertices.iter_mut().zip(corner) {
                vertex.normal = sums[i].normalize();
            }
        }
    }

    /// Unique undirected edges, with shared vertices merged by position.
    pub fn edges(&self) -> Vec<Edge> {
        let mut welder = Welder::default();
        let mut seen = HashSet::new();
        let mut edges = Vec::new();

        for triangle in &self.triangles {
            for i in 0..3 {
                let a = triangle.vertices[i].position;
                let b = triangle.vertices[(i + 1) % 3].position;
                let (ia, ib) = (welder.index(a), welder.index(b));
                if seen.insert((ia.min(ib), ia.max(ib))) {
                    edges.push(Edge { a, b });
                }
            }
        }

        edges
    }
}

impl Default for Mesh {
    fn default() -> Self {
        Self::new()
    }
}

fn subdivide_face(
    mesh: &mut Mesh,
    a: Point3<f32>,
    b: Point3<f32>,
    c: Point3<f32>,
    cols: usize,
    radius: f32,
) {
    // Rows of lattice points, row i holds cols - i + 1 points from the a-b side toward c.
    let mut grid: Vec<Vec<Point3<f32>>> = Vec::with_capacity(cols + 1);
    for i in 0..=cols {
        let f = i as f32 / cols as f32;
        let aj = a + (c - a) * f;
        let bj = b + (c - b) * f;
        let rows = cols - i;
        let row = (0..=rows)
            .map(|j| {
                if j == 0 && i == cols {
                    aj
                } else {
                    aj + (bj - aj) * (j as f32 / rows as f32)
                }
            })
            .collect();
        grid.push(row);
    }

    for i in 0..cols {
        for j in 0..(2 * (cols - i) - 1) {
            let k = j / 2;
            let corners = if j % 2 == 0 {
                [grid[i][k + 1], grid[i + 1][k], grid[i][k]]
            } else {
                [grid[i][k + 1], grid[i + 1][k + 1], grid[i + 1][k]]
            };
            mesh.add_triangle(spherical_triangle(corners, radius));
        }
    }
}

fn spherical_triangle(corners: [Point3<f32>; 3], radius: f32) -> Triangle {
    let [p0, p1, p2] = corners.map(|p| Point3::from(p.coords.normalize() * radius));

    let mut normal = (p1 - p0).cross(&(p2 - p0)).normalize();
    let centroid = (p0.coords + p1.coords + p2.coords) / 3.0;
    if normal.dot(&centroid) < 0.0 {
        normal = -normal;
        return Triangle::new(
            Vertex::flat(p0, normal),
            Vertex::flat(p2, normal),
            Vertex::flat(p1, normal),
        );
    }

    Triangle::new(
        Vertex::flat(p0, normal),
        Vertex::flat(p1, normal),
        Vertex::flat(p2, normal),
    )
}

/// Merges positions closer than `WELD_TOLERANCE` into one index.
#[derive(Default)]
struct Welder {
    cells: HashMap<(i32, i32, i32), Vec<usize>>,
    points: Vec<Point3<f32>>,
}

const WELD_CELL: f32 = 1.0e-3;
const WELD_TOLERANCE: f32 = 1.0e-4;

impl Welder {
    fn cell(p: &Point3<f32>) -> (i32, i32, i32) {
        (
            (p.x / WELD_CELL).floor() as i32,
            (p.y / WELD_CELL).floor() as i32,
            (p.z / WELD_CELL).floor() as i32,
        )
    }

    fn index(&mut self, p: Point3<f32>) -> usize {
        let (cx, cy, cz) = Self::cell(&p);
        for dx in -1..=1 {
            for dy in -1..=1 {
                for dz in -1..=1 {
                    if let Some(candidates) = self.cells.get(&(cx + dx, cy + dy, cz + dz)) {
                        for &i in candidates {
                            if (self.points[i] - p).norm() < WELD_TOLERANCE {
                                return i;
                            }
                        }
                    }
                }
            }
        }

        let i = self.points.len();
        self.points.push(p);
        self.cells.entry((cx, cy, cz)).or_default().push(i);
        i
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_icosahedron() {
        let mesh = Mesh::icosahedron(1.0, 0).unwrap();
        assert_eq!(mesh.triangles.len(), 20);
        assert_eq!(mesh.edges().len(), 30);
    }

    #[test]
    fn test_face_count_grows_with_detail() {
        for detail in 0..4 {
            let mesh = Mesh::icosahedron(1.0, detail).unwrap();
            let cols = (detail + 1) as usize;
            assert_eq!(mesh.triangles.len(), 20 * cols * cols);
        }
    }

    #[test]
    fn test_vertices_lie_on_sphere() {
        let mesh = Mesh::icosahedron(2.5, 2).unwrap();
        for triangle in &mesh.triangles {
            for vertex in &triangle.vertices {
                assert!((vertex.position.coords.norm() - 2.5).abs() < 1e-4);
            }
        }
    }

    #[test]
    fn test_normals_point_outward() {
        let mesh = Mesh::icosahedron(1.0, 2).unwrap();
        for triangle in &mesh.triangles {
            let centroid = triangle.centroid();
            assert!(triangle.calculate_normal().dot(&centroid.coords) > 0.0);
            assert!(triangle.vertices[0].normal.dot(&centroid.coords) > 0.0);
        }
    }

    #[test]
    fn test_subdivided_edge_count() {
        // Euler: V - E + F = 2 with F = 320 gives E = 480 for detail 3.
        let mesh = Mesh::icosahedron(1.0, 3).unwrap();
        assert_eq!(mesh.edges().len(), 480);
    }

    #[test]
    fn test_smooth_normals_follow_sphere() {
        let mut mesh = Mesh::icosahedron(1.0, 2).unwrap();
        mesh.smooth_normals();
        for triangle in &mesh.triangles {
            for vertex in &triangle.vertices {
                let radial = vertex.position.coords.normalize();
                assert!(vertex.normal.dot(&radial) > 0.99);
            }
        }
    }

    #[test]
    fn test_rejects_bad_radius() {
        assert!(Mesh::icosahedron(0.0, 1).is_err());
        assert!(Mesh::icosahedron(-1.0, 1).is_err());
        assert!(Mesh::icosahedron(f32::NAN, 1).is_err());
        assert!(Mesh::icosahedron(1.0, MAX_DETAIL + 1).is_err());
    }
}
