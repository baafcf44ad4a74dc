/// Vertex attribute layout for the renderer
use crate::geometry::Mesh;

/// Floats per vertex: position xyz followed by normal xyz
pub const VERTEX_STRIDE: usize = 6;

/// Lay out `x, y, z, nx, ny, nz` for every vertex, in vertex order
pub fn interleave(mesh: &Mesh) -> Vec<f32> {
    let mut attributes = Vec::with_capacity(mesh.vertices().len() * VERTEX_STRIDE);
    for vertex in mesh.vertices() {
        attributes.extend_from_slice(vertex.position.coords.as_slice());
        attributes.extend_from_slice(vertex.normal.as_slice());
    }
    attributes
}

/// Triangle indices as one flat list, three per triangle
pub fn index_buffer(mesh: &Mesh) -> Vec<u32> {
    mesh.triangles().iter().flat_map(|t| t.indices).collect()
}

/// Everything the renderer needs to upload one mesh
#[derive(Debug, Clone, PartialEq)]
pub struct RenderMesh {
    pub attributes: Vec<f32>,
    pub indices: Vec<u32>,
}

impl RenderMesh {
    pub fn from_mesh(mesh: &Mesh) -> Self {
        Self {
            attributes: interleave(mesh),
            indices: index_buffer(mesh),
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.attributes.len() / VERTEX_STRIDE
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Position of vertex `i`
    pub fn position(&self, i: usize) -> [f32; 3] {
        let base = i * VERTEX_STRIDE;
        [self.attributes[base], self.attributes[base + 1], self.attributes[base + 2]]
    }

    /// Normal of vertex `i`
    pub fn normal(&self, i: usize) -> [f32; 3] {
        let base = i * VERTEX_STRIDE + 3;
        [self.attributes[base], self.attributes[base + 1], self.attributes[base + 2]]
    }
}
