/// ASCII rasterizer for terminal rendering
use crossterm::{
    style::{Color, Print, ResetColor, SetForegroundColor},
    QueueableCommand,
};
use meshkit_core::geometry::face_normal;
use meshkit_core::transform::mvp_matrix;
use meshkit_core::RenderMesh;
use nalgebra::{Matrix4, Point3, Vector3};
use std::io::Write;

/// Character luminosity ramp for depth/shading (darkest to lightest)
const LUMINOSITY_RAMP: &[char] = &[' ', '.', ':', '-', '=', '+', '*', '#', '%', '@'];

/// Model, view and projection for one draw
pub struct DrawParams<'a> {
    pub model: &'a Matrix4<f32>,
    pub view: &'a Matrix4<f32>,
    pub projection: &'a Matrix4<f32>,
    /// World-space direction the light travels towards the scene from
    pub light: Vector3<f32>,
}

/// ASCII renderer that turns interleaved vertex buffers into terminal characters
pub struct AsciiRenderer {
    width: usize,
    height: usize,
    depth_buffer: Vec<f32>,
    char_buffer: Vec<char>,
}

impl AsciiRenderer {
    pub fn new(width: usize, height: usize) -> Self {
        let size = width * height;
        Self {
            width,
            height,
            depth_buffer: vec![f32::INFINITY; size],
            char_buffer: vec![' '; size],
        }
    }

    pub fn clear(&mut self) {
        self.depth_buffer.fill(f32::INFINITY);
        self.char_buffer.fill(' ');
    }

    pub fn render_mesh(&mut self, mesh: &RenderMesh, params: &DrawParams<'_>) {
        let mvp = mvp_matrix(params.model, params.view, params.projection);
        for triangle in mesh.indices.chunks_exact(3) {
            self.render_triangle(mesh, [triangle[0], triangle[1], triangle[2]], &mvp, params);
        }
    }

    fn render_triangle(
        &mut self,
        mesh: &RenderMesh,
        indices: [u32; 3],
        mvp: &Matrix4<f32>,
        params: &DrawParams<'_>,
    ) {
        // Project vertices to screen space
        let mut screen_coords = [(0.0, 0.0, 0.0); 3];
        for (coord, &index) in screen_coords.iter_mut().zip(&indices) {
            let position = Point3::from(mesh.position(index as usize));
            match project_to_screen(&position, mvp, self.width, self.height) {
                Some(projected) => *coord = projected,
                None => return, // Triangle is clipped
            }
        }

        let brightness = self.shade(mesh, indices, params);

        // Map brightness to character
        let char_index = (brightness * (LUMINOSITY_RAMP.len() - 1) as f32) as usize;
        let char_index = char_index.min(LUMINOSITY_RAMP.len() - 1);
        let character = LUMINOSITY_RAMP[char_index];

        self.rasterize_triangle(&screen_coords, character);
    }

    /// Lambert term from the averaged vertex normals, or the face normal when
    /// the mesh carries zero normals
    fn shade(&self, mesh: &RenderMesh, indices: [u32; 3], params: &DrawParams<'_>) -> f32 {
        let normal: Vector3<f32> = indices
            .iter()
            .map(|&i| Vector3::from(mesh.normal(i as usize)))
            .sum();

        let local_normal = if normal.norm_squared() > f32::EPSILON {
            normal
        } else {
            let [a, b, c] = indices.map(|i| Point3::from(mesh.position(i as usize)));
            face_normal(&a, &b, &c)
        };

        let world_normal = params.model.transform_vector(&local_normal);
        match world_normal.try_normalize(f32::EPSILON) {
            Some(n) => n.dot(&-params.light.normalize()).max(0.0),
            None => 0.0,
        }
    }

    fn rasterize_triangle(&mut self, coords: &[(f32, f32, f32); 3], character: char) {
        let [v0, v1, v2] = *coords;

        // Bounding box
        let min_x = v0.0.min(v1.0).min(v2.0).floor() as i32;
        let max_x = v0.0.max(v1.0).max(v2.0).ceil() as i32;
        let min_y = v0.1.min(v1.1).min(v2.1).floor() as i32;
        let max_y = v0.1.max(v1.1).max(v2.1).ceil() as i32;

        // Clip to screen bounds
        let min_x = min_x.max(0);
        let max_x = max_x.min(self.width as i32 - 1);
        let min_y = min_y.max(0);
        let max_y = max_y.min(self.height as i32 - 1);

        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let px = x as f32 + 0.5;
                let py = y as f32 + 0.5;

                if let Some((w0, w1, w2)) = barycentric(
                    (v0.0, v0.1),
                    (v1.0, v1.1),
                    (v2.0, v2.1),
                    (px, py),
                ) {
                    if w0 >= 0.0 && w1 >= 0.0 && w2 >= 0.0 {
                        // Interpolate depth
                        let depth = w0 * v0.2 + w1 * v1.2 + w2 * v2.2;

                        let idx = y as usize * self.width + x as usize;
                        if depth < self.depth_buffer[idx] {
                            self.depth_buffer[idx] = depth;
                            self.char_buffer[idx] = character;
                        }
                    }
                }
            }
        }
    }

    /// Number of cells covered by geometry
    pub fn covered(&self) -> usize {
        self.depth_buffer.iter().filter(|d| d.is_finite()).count()
    }

    pub fn draw<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        for row in self.char_buffer.chunks(self.width.max(1)) {
            for &c in row {
                // Color based on character intensity
                let color = match c {
                    ' ' | '.' | ':' => Color::DarkGrey,
                    '-' | '=' => Color::Grey,
                    '+' | '*' => Color::White,
                    '#' | '%' | '@' => Color::Cyan,
                    _ => Color::White,
                };

                writer.queue(SetForegroundColor(color))?;
                writer.queue(Print(c))?;
            }
            writer.queue(Print("\r\n"))?;
        }
        writer.queue(ResetColor)?;
        Ok(())
    }
}

/// Project a point through `mvp` into screen space
///
/// Returns `(x, y, depth)` with depth in NDC, or `None` for points outside
/// the clip volume or behind the camera.
pub fn project_to_screen(
    point: &Point3<f32>,
    mvp: &Matrix4<f32>,
    width: usize,
    height: usize,
) -> Option<(f32, f32, f32)> {
    let clip = mvp * point.to_homogeneous();

    // Prevent division by near-zero depth values
    if clip.w <= 1e-6 {
        return None;
    }

    let ndc = clip.xyz() / clip.w;
    if ndc.iter().any(|c| !(-1.0..=1.0).contains(c)) {
        return None;
    }

    // Convert to screen space
    let screen_x = (ndc.x + 1.0) * 0.5 * width as f32;
    let screen_y = (1.0 - ndc.y) * 0.5 * height as f32;

    Some((screen_x, screen_y, ndc.z))
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

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use meshkit_core::{Camera, Mesh, Transform, Triangle, Vertex};

    #[test]
    fn test_project_center() {
        let (x, y, _) = project_to_screen(&Point3::origin(), &Matrix4::identity(), 80, 40).unwrap();
        assert_relative_eq!(x, 40.0);
        assert_relative_eq!(y, 20.0);
    }

    #[test]
    fn test_project_outside_clip_volume() {
        assert!(project_to_screen(&Point3::new(2.0, 0.0, 0.0), &Matrix4::identity(), 80, 40).is_none());
    }

    #[test]
    fn test_barycentric_vertices() {
        let w = barycentric((0.0, 0.0), (4.0, 0.0), (0.0, 4.0), (0.0, 0.0)).unwrap();
        assert_relative_eq!(w.0, 1.0);
        assert!(barycentric((0.0, 0.0), (1.0, 1.0), (2.0, 2.0), (0.5, 0.5)).is_none());
    }

    #[test]
    fn test_cube_covers_cells() {
        let mesh = RenderMesh::from_mesh(&Mesh::cube(1.0));
        let eye = Transform::new(Vector3::new(0.0, 0.0, 3.0), Vector3::new(0.0, 180.0, 0.0), Vector3::repeat(1.0));
        let camera = Camera::new(1.0, 45.0, 0.1, 100.0);
        let params = DrawParams {
            model: &Matrix4::identity(),
            view: &camera.view_matrix(&eye),
            projection: &camera.perspective_matrix(),
            light: Vector3::new(0.0, 0.0, -1.0),
        };

        let mut renderer = AsciiRenderer::new(40, 40);
        renderer.render_mesh(&mesh, &params);
        assert!(renderer.covered() > 0);

        renderer.clear();
        assert_eq!(renderer.covered(), 0);
    }

    #[test]
    fn test_shade_falls_back_to_face_normal() {
        let vertices = vec![
            Vertex::at(Point3::origin()),
            Vertex::at(Point3::new(1.0, 0.0, 0.0)),
            Vertex::at(Point3::new(0.0, 1.0, 0.0)),
        ];
        let mesh = RenderMesh::from_mesh(&Mesh::new(vertices, vec![Triangle::new(0, 1, 2)]).unwrap());
        let identity = Matrix4::identity();
        let params = DrawParams {
            model: &identity,
            view: &identity,
            projection: &identity,
            light: Vector3::new(0.0, 0.0, -1.0),
        };

        let renderer = AsciiRenderer::new(10, 10);
        assert_relative_eq!(renderer.shade(&mesh, [0, 1, 2], &params), 1.0);
    }
}
