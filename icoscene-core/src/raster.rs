//! Character-cell rasterizer: the drawable surface scenes are rendered into

use nalgebra::{Matrix4, Vector3};

use crate::error::{Error, Result};
use crate::geometry::{Edge, Triangle};
use crate::material::{Color, Material};
use crate::projection::{Camera, ScreenPoint};
use crate::scene::{Scene, SceneNode};

/// Character luminosity ramp for depth/shading (darkest to lightest)
const LUMINOSITY_RAMP: &[char] = &[' ', '.', ':', '-', '=', '+', '*', '#', '%', '@'];

/// Character cells are about twice as tall as they are wide.
pub const CELL_ASPECT: f32 = 2.0;

/// Scales scene luminance before it is mapped onto the ramp.
const EXPOSURE: f32 = 2.0;

/// How far behind a surface an edge may sit and still be drawn, in
/// view-space units. Covers the depth error of sampling a face at cell
/// centres rather than on the edge itself.
const WIRE_DEPTH_BIAS: f32 = 0.05;

const SAMPLES_ALIASED: &[(f32, f32)] = &[(0.5, 0.5)];
const SAMPLES_2X2: &[(f32, f32)] = &[(0.25, 0.25), (0.75, 0.25), (0.25, 0.75), (0.75, 0.75)];

/// One character cell of the surface
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cell {
    pub ch: char,
    pub color: Color,
}

impl Cell {
    pub const BLANK: Cell = Cell {
        ch: ' ',
        color: Color::new(0.0, 0.0, 0.0),
    };
}

/// Counters from one `draw` call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrawStats {
    pub triangles: usize,
    pub culled: usize,
    pub edges: usize,
}

/// Cell, colour and depth buffers sized to the viewport
pub struct Surface {
    width: usize,
    height: usize,
    antialias: bool,
    depth_buffer: Vec<f32>,
    cells: Vec<Cell>,
}

impl Surface {
    pub fn new(width: usize, height: usize, antialias: bool) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::Surface(format!(
                "surface must have a non-zero size, got {width}x{height}"
            )));
        }
        let size = width * height;
        Ok(Self {
            width,
            height,
            antialias,
            depth_buffer: vec![f32::INFINITY; size],
            cells: vec![Cell::BLANK; size],
        })
    }

    pub fn resize(&mut self, width: usize, height: usize) -> Result<()> {
        if width == 0 || height == 0 {
            return Err(Error::Surface(format!(
                "surface must have a non-zero size, got {width}x{height}"
            )));
        }
        self.width = width;
        self.height = height;
        self.depth_buffer = vec![f32::INFINITY; width * height];
        self.cells = vec![Cell::BLANK; width * height];
        tracing::debug!(width, height, "surface resized");
        Ok(())
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn antialias(&self) -> bool {
        self.antialias
    }

    /// Camera aspect ratio that makes the surface's cells look square
    pub fn aspect(&self) -> f32 {
        self.width as f32 / (self.height as f32 * CELL_ASPECT)
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn cell(&self, x: usize, y: usize) -> Option<Cell> {
        if x < self.width && y < self.height {
            Some(self.cells[y * self.width + x])
        } else {
            None
        }
    }

    pub fn rows(&self) -> impl Iterator<Item = &[Cell]> {
        self.cells.chunks(self.width)
    }

    /// Plain text of the surface, one line per row
    pub fn to_text(&self) -> String {
        let mut text = String::with_capacity((self.width + 1) * self.height);
        for (i, row) in self.rows().enumerate() {
            if i > 0 {
                text.push('\n');
            }
            text.extend(row.iter().map(|cell| cell.ch));
        }
        text
    }

    pub fn clear(&mut self) {
        self.depth_buffer.fill(f32::INFINITY);
        self.cells.fill(Cell::BLANK);
    }

    /// Render the scene graph as seen from `camera`.
    pub fn draw(&mut self, scene: &Scene, camera: &Camera) -> DrawStats {
        self.clear();

        let view_projection = camera.view_projection();
        let mut stats = DrawStats::default();

        // Solid nodes first so edges can be depth tested against them.
        scene
            .root
            .walk(&Matrix4::identity(), &mut |node: &SceneNode, world: &Matrix4<f32>| {
                if node.material.is_wireframe() {
                    return;
                }
                self.render_mesh(node, world, &view_projection, camera, scene, &mut stats);
            });
        let mut wireframes = Vec::new();
        collect_wireframes(&scene.root, &Matrix4::identity(), &mut wireframes);
        for (node, world) in wireframes {
            self.render_edges(&node.edges, node.material.color(), &world, &view_projection, &mut stats);
        }

        tracing::trace!(
            triangles = stats.triangles,
            culled = stats.culled,
            edges = stats.edges,
            "surface drawn"
        );
        stats
    }

    fn render_mesh(
        &mut self,
        node: &SceneNode,
        world: &Matrix4<f32>,
        view_projection: &Matrix4<f32>,
        camera: &Camera,
        scene: &Scene,
        stats: &mut DrawStats,
    ) {
        let Material::Standard {
            color,
            flat_shading,
        } = node.material
        else {
            return;
        };
        let mvp = view_projection * world;

        for triangle in &node.mesh.triangles {
            let world_centroid = world.transform_point(&triangle.centroid());
            let face_normal = world.transform_vector(&triangle.calculate_normal()).normalize();
            if face_normal.dot(&(camera.position - world_centroid)) <= 0.0 {
                stats.culled += 1;
                continue;
            }

            let Some(coords) = project_triangle(triangle, &mvp, self.width, self.height) else {
                continue;
            };

            let normals = if flat_shading {
                [face_normal; 3]
            } else {
                triangle
                    .vertices
                    .map(|v| world.transform_vector(&v.normal).normalize())
            };

            self.rasterize_triangle(&coords, &normals, color, scene);
            stats.triangles += 1;
        }
    }

    fn rasterize_triangle(
        &mut self,
        coords: &[ScreenPoint; 3],
        normals: &[Vector3<f32>; 3],
        albedo: Color,
        scene: &Scene,
    ) {
        let [v0, v1, v2] = *coords;
        let samples = if self.antialias {
            SAMPLES_2X2
        } else {
            SAMPLES_ALIASED
        };

        // Bounding box
        let min_x = v0.x.min(v1.x).min(v2.x).floor() as i32;
        let max_x = v0.x.max(v1.x).max(v2.x).ceil() as i32;
        let min_y = v0.y.min(v1.y).min(v2.y).floor() as i32;
        let max_y = v0.y.max(v1.y).max(v2.y).ceil() as i32;

        // Clip to screen bounds
        let min_x = min_x.max(0);
        let max_x = max_x.min(self.width as i32 - 1);
        let min_y = min_y.max(0);
        let max_y = max_y.min(self.height as i32 - 1);

        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let mut covered = 0usize;
                let mut nearest = f32::INFINITY;
                let mut normal = Vector3::zeros();

                for &(sx, sy) in samples {
                    let p = (x as f32 + sx, y as f32 + sy);
                    let Some((w0, w1, w2)) =
                        barycentric((v0.x, v0.y), (v1.x, v1.y), (v2.x, v2.y), p)
                    else {
                        continue;
                    };
                    if w0 < 0.0 || w1 < 0.0 || w2 < 0.0 {
                        continue;
                    }
                    covered += 1;
                    nearest = nearest.min(w0 * v0.depth + w1 * v1.depth + w2 * v2.depth);
                    normal += normals[0] * w0 + normals[1] * w1 + normals[2] * w2;
                }

                if covered == 0 {
                    continue;
                }

                let idx = y as usize * self.width + x as usize;
                if nearest >= self.depth_buffer[idx] {
                    continue;
                }

                let normal = normal.normalize();
                let coverage = covered as f32 / samples.len() as f32;
                let shaded = albedo * scene.irradiance(&normal);
                let brightness = (shaded.luminance() * EXPOSURE * coverage).clamp(0.0, 1.0);

                self.depth_buffer[idx] = nearest;
                self.cells[idx] = Cell {
                    ch: ramp_char(brightness),
                    color: shaded,
                };
            }
        }
    }

    fn render_edges(
        &mut self,
        edges: &[Edge],
        color: Color,
        world: &Matrix4<f32>,
        view_projection: &Matrix4<f32>,
        stats: &mut DrawStats,
    ) {
        let mvp = view_projection * world;
        for edge in edges {
            let a = Camera::project(&mvp, &edge.a, self.width, self.height);
            let b = Camera::project(&mvp, &edge.b, self.width, self.height);
            if let (Some(a), Some(b)) = (a, b) {
                if self.rasterize_line(a, b, color) {
                    stats.edges += 1;
                }
            }
        }
    }

    /// DDA line with a per-cell depth test. Returns whether any cell was written.
    fn rasterize_line(&mut self, a: ScreenPoint, b: ScreenPoint, color: Color) -> bool {
        let dx = b.x - a.x;
        let dy = b.y - a.y;
        let ch = edge_char(dx, dy);
        let steps = dx.abs().max(dy.abs()).ceil().max(1.0) as usize;
        let mut wrote = false;

        for i in 0..=steps {
            let t = i as f32 / steps as f32;
            let x = (a.x + dx * t).floor();
            let y = (a.y + dy * t).floor();
            if x < 0.0 || y < 0.0 || x >= self.width as f32 || y >= self.height as f32 {
                continue;
            }
            let depth = a.depth + (b.depth - a.depth) * t;
            let idx = y as usize * self.width + x as usize;
            if depth <= self.depth_buffer[idx] + WIRE_DEPTH_BIAS {
                self.depth_buffer[idx] = self.depth_buffer[idx].min(depth);
                self.cells[idx] = Cell { ch, color };
                wrote = true;
            }
        }

        wrote
    }
}

fn collect_wireframes<'a>(
    node: &'a SceneNode,
    parent: &Matrix4<f32>,
    out: &mut Vec<(&'a SceneNode, Matrix4<f32>)>,
) {
    let world = node.transform.compose(parent);
    if node.material.is_wireframe() {
        out.push((node, world));
    }
    for child in &node.children {
        collect_wireframes(child, &world, out);
    }
}

fn project_triangle(
    triangle: &Triangle,
    mvp: &Matrix4<f32>,
    width: usize,
    height: usize,
) -> Option<[ScreenPoint; 3]> {
    let [a, b, c] = &triangle.vertices;
    Some([
        Camera::project(mvp, &a.position, width, height)?,
        Camera::project(mvp, &b.position, width, height)?,
        Camera::project(mvp, &c.position, width, height)?,
    ])
}

/// Map brightness in `[0, 1]` onto the ramp, never blank for a covered cell
fn ramp_char(brightness: f32) -> char {
    let char_index = (brightness * (LUMINOSITY_RAMP.len() - 1) as f32) as usize;
    let char_index = char_index.clamp(1, LUMINOSITY_RAMP.len() - 1);
    LUMINOSITY_RAMP[char_index]
}

/// Pick a line glyph from the on-screen slope; rows grow downward.
fn edge_char(dx: f32, dy: f32) -> char {
    let (adx, ady) = (dx.abs(), (dy * CELL_ASPECT).abs());
    if ady < adx * 0.4 {
        '-'
    } else if adx < ady * 0.4 {
        '|'
    } else if (dx > 0.0) == (dy > 0.0) {
        '\\'
    } else {
        '/'
    }
}

/// Calculate barycentric coordinates for a point in a triangle
fn barycentric(
    v0: (f32, f32),
    v1: (f32, f32),
    v2: (f32, f32),
    p: (f32, f32),
) -> Option<(f32, f32, f32)> {
    let denom = (v1.1 - v2.1) * (v0.0 - v2.0) + (v2.0 - v1.0) * (v0.1 - v2.1);

    if denom.abs() < 1e-6 {
        return None;
    }

    let w0 = ((v1.1 - v2.1) * (p.0 - v2.0) + (v2.0 - v1.0) * (p.1 - v2.1)) / denom;
    let w1 = ((v2.1 - v0.1) * (p.0 - v2.0) + (v0.0 - v2.0) * (p.1 - v2.1)) / denom;
    let w2 = 1.0 - w0 - w1;

    Some((w0, w1, w2))
}

/// Presents a drawn surface somewhere: a terminal, a web page, a test buffer
pub trait OutputSink {
    fn present(&mut self, surface: &Surface) -> Result<()>;
}

/// Sink that keeps the text of the last presented frame
#[derive(Debug, Default)]
pub struct HeadlessSink {
    pub frames: u64,
    pub last_frame: String,
}

impl OutputSink for HeadlessSink {
    fn present(&mut self, surface: &Surface) -> Result<()> {
        self.frames += 1;
        self.last_frame = surface.to_text();
        Ok(())
    }
}
