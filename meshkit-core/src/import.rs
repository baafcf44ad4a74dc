/// Scene importers and the post-processing they share
///
/// An importer turns file bytes into an [`ImportedScene`]. Afterwards
/// [`postprocess`] can fan-triangulate polygons and generate normals, which
/// is what the flattener expects a well-behaved importer to have done.
use std::path::Path;

use log::debug;
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geometry::face_normal;
use crate::obj::ObjImporter;
use crate::scene::{Face, ImportedMesh, ImportedScene};
use crate::stl::StlImporter;

#[derive(Error, Debug)]
pub enum ImportError {
    #[error("parse error: {0}")]
    Parse(String),
    #[error("unexpected end of data: expected {expected} bytes, got {actual}")]
    Truncated { expected: usize, actual: usize },
    #[error("line {line}: index {index} is out of range")]
    InvalidIndex { line: usize, index: i64 },
    #[error("invalid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),
}

/// Post-processing applied after parsing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportOptions {
    /// Fan-triangulate faces with more than three corners
    pub triangulate: bool,
    /// Compute smooth normals for meshes that came without any
    pub generate_normals: bool,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            triangulate: true,
            generate_normals: true,
        }
    }
}

/// A file format that can be read into an [`ImportedScene`]
pub trait SceneImporter {
    fn name(&self) -> &'static str;

    /// Lower-case file extensions this importer handles, without the dot
    fn extensions(&self) -> &'static [&'static str];

    /// Parse raw file contents, without post-processing
    fn parse(&self, data: &[u8]) -> Result<ImportedScene, ImportError>;

    fn import(&self, data: &[u8], options: &ImportOptions) -> Result<ImportedScene, ImportError> {
        let mut scene = self.parse(data)?;
        postprocess(&mut scene, options);
        Ok(scene)
    }
}

/// All importers shipped with the crate
pub fn default_importers() -> Vec<Box<dyn SceneImporter>> {
    vec![Box::new(StlImporter), Box::new(ObjImporter)]
}

/// Pick the importer whose extensions match `path`, case-insensitively
pub fn importer_for<'a>(
    path: &Path,
    importers: &'a [Box<dyn SceneImporter>],
) -> Option<&'a dyn SceneImporter> {
    let extension = path.extension()?.to_str()?.to_ascii_lowercase();
    importers
        .iter()
        .find(|importer| importer.extensions().contains(&extension.as_str()))
        .map(|importer| importer.as_ref())
}

pub fn postprocess(scene: &mut ImportedScene, options: &ImportOptions) {
    for mesh in scene.meshes_mut() {
        if options.triangulate {
            triangulate(mesh);
        }
        if options.generate_normals && mesh.normals.is_none() {
            if let Some(normals) = smooth_normals(mesh) {
                mesh.normals = Some(normals);
            }
        }
    }
}

/// Split every polygon with more than three corners into a triangle fan
///
/// Faces with fewer than three corners are left for the flattener to reject.
pub fn triangulate(mesh: &mut ImportedMesh) {
    if mesh.faces.iter().all(|f| f.len() <= 3) {
        return;
    }

    let before = mesh.faces.len();
    let faces: Vec<Face> = mesh
        .faces
        .drain(..)
        .flat_map(|face| fan(&face))
        .collect();
    debug!("Triangulated {} faces into {}", before, faces.len());
    mesh.faces = faces;
}

fn fan(face: &[u32]) -> Vec<Face> {
    if face.len() <= 3 {
        return vec![face.to_vec()];
    }
    face[1..]
        .windows(2)
        .map(|pair| vec![face[0], pair[0], pair[1]])
        .collect()
}

/// Area-weighted vertex normals
///
/// Returns `None` unless every face is an in-range triangle.
pub fn smooth_normals(mesh: &ImportedMesh) -> Option<Vec<Vector3<f32>>> {
    let count = mesh.positions.len();
    let mut normals = vec![Vector3::zeros(); count];

    for face in &mesh.faces {
        let &[a, b, c] = face.as_slice() else {
            return None;
        };
        let [a, b, c] = [a as usize, b as usize, c as usize];
        if a >= count || b >= count || c >= count {
            return None;
        }

        let p = &mesh.positions;
        let weighted = face_normal(&p[a], &p[b], &p[c]);
        normals[a] += weighted;
        normals[b] += weighted;
        normals[c] += weighted;
    }

    Some(
        normals
            .into_iter()
            .map(|n| n.try_normalize(f32::EPSILON).unwrap_or_else(Vector3::zeros))
            .collect(),
    )
}
