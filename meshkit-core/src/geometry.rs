/// Geometry primitives shared by the flattener, normalizer and interleaver
use nalgebra::{Point3, Vector3};
use thiserror::Error;

/// A 3D vertex with position and normal
///
/// Positions and normals live in one record so a mesh can never hold more of
/// one than the other.
#[derive(Debug, Clone, Copy, PartialEq)]
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

    /// A vertex without a meaningful normal
    pub fn at(position: Point3<f32>) -> Self {
        Self {
            position,
            normal: Vector3::zeros(),
        }
    }
}

/// A triangle face defined by three indices into its mesh's vertices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Triangle {
    pub indices: [u32; 3],
}

impl Triangle {
    pub fn new(a: u32, b: u32, c: u32) -> Self {
        Self { indices: [a, b, c] }
    }

}

/// Unnormalized normal of the face `a, b, c`, following its winding
///
/// The length is twice the face area, so summing these gives area-weighted
/// vertex normals. Degenerate faces give the zero vector.
pub fn face_normal(a: &Point3<f32>, b: &Point3<f32>, c: &Point3<f32>) -> Vector3<f32> {
    (b - a).cross(&(c - a))
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MeshError {
    #[error("triangle {triangle} references vertex {index}, but the mesh has {vertex_count} vertices")]
    IndexOutOfRange {
        triangle: usize,
        index: u32,
        vertex_count: usize,
    },
}

/// A triangle mesh: a vertex arena plus triangles indexing into it
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    vertices: Vec<Vertex>,
    triangles: Vec<Triangle>,
}

impl Mesh {
    /// Build a mesh, checking that every triangle index is in range
    pub fn new(vertices: Vec<Vertex>, triangles: Vec<Triangle>) -> Result<Self, MeshError> {
        let vertex_count = vertices.len();
        for (triangle, face) in triangles.iter().enumerate() {
            if let Some(&index) = face.indices.iter().find(|&&i| i as usize >= vertex_count) {
                return Err(MeshError::IndexOutOfRange {
                    triangle,
                    index,
                    vertex_count,
                });
            }
        }

        Ok(Self {
            vertices,
            triangles,
        })
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    pub fn positions(&self) -> impl ExactSizeIterator<Item = &Point3<f32>> + '_ {
        self.vertices.iter().map(|v| &v.position)
    }

    pub fn normals(&self) -> impl ExactSizeIterator<Item = &Vector3<f32>> + '_ {
        self.vertices.iter().map(|v| &v.normal)
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Same triangles, positions replaced one-for-one
    ///
    /// Only used by transforms that keep the vertex count, so indices stay valid.
    pub(crate) fn map_positions<F>(&self, mut f: F) -> Self
    where
        F: FnMut(&Point3<f32>) -> Point3<f32>,
    {
        Self {
            vertices: self
                .vertices
                .iter()
                .map(|v| Vertex {
                    position: f(&v.position),
                    normal: v.normal,
                })
                .collect(),
            triangles: self.triangles.clone(),
        }
    }

    /// Create a simple cube mesh for testing
    ///
    /// Four vertices per face so every face keeps its own flat normal.
    pub fn cube(size: f32) -> Self {
        let half = size / 2.0;
        let faces: [([f32; 3], [[f32; 3]; 4]); 6] = [
            // Front
            ([0.0, 0.0, 1.0], [[-1.0, -1.0, 1.0], [1.0, -1.0, 1.0], [1.0, 1.0, 1.0], [-1.0, 1.0, 1.0]]),
            // Back
            ([0.0, 0.0, -1.0], [[1.0, -1.0, -1.0], [-1.0, -1.0, -1.0], [-1.0, 1.0, -1.0], [1.0, 1.0, -1.0]]),
            // Top
            ([0.0, 1.0, 0.0], [[-1.0, 1.0, 1.0], [1.0, 1.0, 1.0], [1.0, 1.0, -1.0], [-1.0, 1.0, -1.0]]),
            // Bottom
            ([0.0, -1.0, 0.0], [[-1.0, -1.0, -1.0], [1.0, -1.0, -1.0], [1.0, -1.0, 1.0], [-1.0, -1.0, 1.0]]),
            // Right
            ([1.0, 0.0, 0.0], [[1.0, -1.0, 1.0], [1.0, -1.0, -1.0], [1.0, 1.0, -1.0], [1.0, 1.0, 1.0]]),
            // Left
            ([-1.0, 0.0, 0.0], [[-1.0, -1.0, -1.0], [-1.0, -1.0, 1.0], [-1.0, 1.0, 1.0], [-1.0, 1.0, -1.0]]),
        ];

        let mut vertices = Vec::with_capacity(24);
        let mut triangles = Vec::with_capacity(12);
        for (normal, corners) in faces {
            let base = vertices.len() as u32;
            for [x, y, z] in corners {
                vertices.push(Vertex::new(
                    x * half,
                    y * half,
                    z * half,
                    normal[0],
                    normal[1],
                    normal[2],
                ));
            }
            triangles.push(Triangle::new(base, base + 1, base + 2));
            triangles.push(Triangle::new(base, base + 2, base + 3));
        }

        Self {
            vertices,
            triangles,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_mesh_rejects_out_of_range_index() {
        let vertices = vec![Vertex::at(Point3::origin()); 3];
        let result = Mesh::new(vertices, vec![Triangle::new(0, 1, 3)]);
        assert_eq!(
            result,
            Err(MeshError::IndexOutOfRange {
                triangle: 0,
                index: 3,
                vertex_count: 3
            })
        );
    }

    #[test]
    fn test_cube_indices_in_range() {
        let cube = Mesh::cube(2.0);
        assert_eq!(cube.vertices().len(), 24);
        assert_eq!(cube.triangles().len(), 12);
        for triangle in cube.triangles() {
            assert!(triangle.indices.iter().all(|&i| (i as usize) < 24));
        }
    }

    #[test]
    fn test_cube_winding_matches_normals() {
        let cube = Mesh::cube(2.0);
        for triangle in cube.triangles() {
            let [a, b, c] = triangle.indices.map(|i| cube.vertices()[i as usize].position);
            let stored = cube.vertices()[triangle.indices[0] as usize].normal;
            assert_relative_eq!(face_normal(&a, &b, &c).normalize(), stored, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_degenerate_face_normal_is_zero() {
        let p = Point3::new(1.0, 1.0, 1.0);
        assert_eq!(face_normal(&p, &p, &p), Vector3::zeros());
        let collinear = face_normal(&Point3::origin(), &Point3::new(1.0, 0.0, 0.0), &Point3::new(2.0, 0.0, 0.0));
        assert_eq!(collinear, Vector3::zeros());
    }

    #[test]
    fn test_face_normal_length_is_twice_area() {
        let normal = face_normal(&Point3::origin(), &Point3::new(2.0, 0.0, 0.0), &Point3::new(0.0, 3.0, 0.0));
        assert_relative_eq!(normal, Vector3::new(0.0, 0.0, 6.0));
    }
}
