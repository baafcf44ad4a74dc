/// Bounding boxes and unit-cube normalization
use nalgebra::{Point3, Vector3};
use thiserror::Error;

use crate::geometry::Mesh;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum NormalizeError {
    #[error("mesh has a degenerate extent ({0}), cannot rescale")]
    DegenerateExtent(f32),
}

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Point3<f32>,
    pub max: Point3<f32>,
}

impl Aabb {
    /// Component-wise min/max over `points`, `None` when there are none
    pub fn from_points<'a, I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a Point3<f32>>,
    {
        let mut points = points.into_iter();
        let first = *points.next()?;

        Some(points.fold(Self { min: first, max: first }, |aabb, p| Self {
            min: aabb.min.inf(p),
            max: aabb.max.sup(p),
        }))
    }

    pub fn extent(&self) -> Vector3<f32> {
        self.max - self.min
    }

    /// Length of the longest axis
    pub fn largest_span(&self) -> f32 {
        self.extent().max()
    }
}

/// Bounding box of a mesh's positions
pub fn bounds(mesh: &Mesh) -> Option<Aabb> {
    Aabb::from_points(mesh.positions())
}

/// Rescale a mesh so its longest axis spans exactly [0, 1]
///
/// Translation plus uniform scale, so normals are left as they are. An empty
/// mesh comes back unchanged. A mesh whose vertices all coincide has nothing
/// to scale by and is an error.
pub fn normalize(mesh: &Mesh) -> Result<Mesh, NormalizeError> {
    let Some(aabb) = bounds(mesh) else {
        return Ok(mesh.clone());
    };

    let scale = aabb.largest_span();
    if scale <= 0.0 || !scale.is_finite() {
        return Err(NormalizeError::DegenerateExtent(scale));
    }

    Ok(mesh.map_positions(|p| Point3::from((p - aabb.min) / scale)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Triangle, Vertex};
    use approx::assert_relative_eq;

    fn mesh_from(points: &[[f32; 3]]) -> Mesh {
        let vertices = points
            .iter()
            .map(|&[x, y, z]| Vertex::new(x, y, z, 0.0, 1.0, 0.0))
            .collect();
        Mesh::new(vertices, vec![]).unwrap()
    }

    #[test]
    fn test_cube_maps_to_unit_cube() {
        let mesh = Mesh::cube(2.0);
        let normalized = normalize(&mesh).unwrap();

        for p in normalized.positions() {
            assert!(p.iter().all(|&c| (0.0..=1.0).contains(&c)));
        }

        let aabb = bounds(&normalized).unwrap();
        assert_relative_eq!(aabb.min, Point3::new(0.0, 0.0, 0.0));
        assert_relative_eq!(aabb.max, Point3::new(1.0, 1.0, 1.0));
    }

    #[test]
    fn test_corners_map_exactly() {
        let mesh = mesh_from(&[[-1.0, -1.0, -1.0], [1.0, 1.0, 1.0], [0.0, 0.5, -0.5]]);
        let normalized = normalize(&mesh).unwrap();
        let positions: Vec<_> = normalized.positions().copied().collect();

        assert_relative_eq!(positions[0], Point3::new(0.0, 0.0, 0.0));
        assert_relative_eq!(positions[1], Point3::new(1.0, 1.0, 1.0));
        assert_relative_eq!(positions[2], Point3::new(0.5, 0.75, 0.25));
    }

    #[test]
    fn test_aspect_ratio_preserved() {
        let mesh = mesh_from(&[[0.0, 0.0, 0.0], [4.0, 2.0, 1.0]]);
        let normalized = normalize(&mesh).unwrap();
        let aabb = bounds(&normalized).unwrap();
        assert_relative_eq!(aabb.max, Point3::new(1.0, 0.5, 0.25));
    }

    #[test]
    fn test_input_untouched_and_normals_kept() {
        let mesh = Mesh::cube(4.0);
        let normalized = normalize(&mesh).unwrap();

        assert_eq!(mesh, Mesh::cube(4.0));
        assert_eq!(normalized.triangles(), mesh.triangles());
        assert!(normalized.normals().eq(mesh.normals()));
    }

    #[test]
    fn test_empty_mesh_unchanged() {
        let mesh = Mesh::default();
        assert_eq!(normalize(&mesh), Ok(Mesh::default()));
        assert!(bounds(&mesh).is_none());
    }

    #[test]
    fn test_coincident_vertices_rejected() {
        let vertices = vec![Vertex::new(2.0, 2.0, 2.0, 0.0, 0.0, 0.0); 3];
        let mesh = Mesh::new(vertices, vec![Triangle::new(0, 1, 2)]).unwrap();
        assert_eq!(normalize(&mesh), Err(NormalizeError::DegenerateExtent(0.0)));
    }
}
