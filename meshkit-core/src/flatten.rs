/// Scene flattening: hierarchy in, ordered mesh list out
///
/// The output order is the traversal order: for every node, the flattened
/// subtrees of its children (in child order) come first, followed by the
/// meshes the node owns directly (in the node's mesh order).
use std::collections::HashSet;

use log::{debug, trace};
use nalgebra::Vector3;
use thiserror::Error;

use crate::geometry::{Mesh, MeshError, Triangle, Vertex};
use crate::scene::{NodeId, SceneGraph, SourceMesh};

/// Hierarchies deeper than this are rejected unless configured otherwise
pub const DEFAULT_MAX_DEPTH: usize = 256;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FlattenError {
    #[error("scene has no root node")]
    MissingRoot,
    #[error("node {0} does not exist in the scene")]
    MissingNode(NodeId),
    #[error("node {node} references mesh {mesh}, which does not exist")]
    MissingMesh { node: NodeId, mesh: usize },
    #[error("only triangles are supported, mesh {mesh} face {face} is a {sides}-sided polygon")]
    NonTriangularFace { mesh: usize, face: usize, sides: usize },
    #[error("mesh {mesh} has {positions} positions but {normals} normals")]
    NormalCountMismatch {
        mesh: usize,
        positions: usize,
        normals: usize,
    },
    #[error("mesh {mesh}: {source}")]
    InvalidIndices {
        mesh: usize,
        #[source]
        source: MeshError,
    },
    #[error("scene hierarchy is deeper than {max_depth} levels")]
    DepthLimitExceeded { max_depth: usize },
    #[error("node {0} is reached more than once, the hierarchy is shared or cyclic")]
    RevisitedNode(NodeId),
}

/// Flatten the whole scene, starting at its root
pub fn flatten<S>(scene: &S, max_depth: usize) -> Result<Vec<Mesh>, FlattenError>
where
    S: SceneGraph + ?Sized,
{
    let root = scene.root().ok_or(FlattenError::MissingRoot)?;
    let meshes = flatten_node(scene, root, max_depth)?;
    debug!("Flattened scene into {} meshes", meshes.len());
    Ok(meshes)
}

/// Flatten the subtree rooted at `node`
pub fn flatten_node<S>(scene: &S, node: NodeId, max_depth: usize) -> Result<Vec<Mesh>, FlattenError>
where
    S: SceneGraph + ?Sized,
{
    let mut visited = HashSet::new();
    collect(scene, node, 0, max_depth, &mut visited)
}

/// Each node is entered at most once, so the walk is linear in the node count
fn collect<S>(
    scene: &S,
    node: NodeId,
    depth: usize,
    max_depth: usize,
    visited: &mut HashSet<NodeId>,
) -> Result<Vec<Mesh>, FlattenError>
where
    S: SceneGraph + ?Sized,
{
    if depth > max_depth {
        return Err(FlattenError::DepthLimitExceeded { max_depth });
    }
    if !visited.insert(node) {
        return Err(FlattenError::RevisitedNode(node));
    }

    let mesh_indices = scene.node_meshes(node).ok_or(FlattenError::MissingNode(node))?;
    let children = scene.node_children(node).ok_or(FlattenError::MissingNode(node))?;
    trace!(
        "Node {} at depth {}: {} meshes, {} children",
        node,
        depth,
        mesh_indices.len(),
        children.len()
    );

    let mut own = Vec::with_capacity(mesh_indices.len());
    for &index in mesh_indices {
        let source = scene
            .mesh(index)
            .ok_or(FlattenError::MissingMesh { node, mesh: index })?;
        own.push(convert_mesh(index, source)?);
    }

    let mut subtrees = Vec::with_capacity(children.len());
    for &child in children {
        subtrees.push(collect(scene, child, depth + 1, max_depth, visited)?);
    }

    Ok(merge_subtrees(subtrees, own))
}

/// Child subtrees in visitation order, then the node's own meshes
pub fn merge_subtrees(subtrees: Vec<Vec<Mesh>>, own: Vec<Mesh>) -> Vec<Mesh> {
    let total = subtrees.iter().map(Vec::len).sum::<usize>() + own.len();
    let mut merged = Vec::with_capacity(total);
    for subtree in subtrees {
        merged.extend(subtree);
    }
    merged.extend(own);
    merged
}

/// Convert one importer mesh into a [`Mesh`]
///
/// Missing normals become zero vectors. Any face that is not a triangle fails
/// the whole conversion.
pub fn convert_mesh(index: usize, source: SourceMesh<'_>) -> Result<Mesh, FlattenError> {
    if let Some(normals) = source.normals {
        if normals.len() != source.positions.len() {
            return Err(FlattenError::NormalCountMismatch {
                mesh: index,
                positions: source.positions.len(),
                normals: normals.len(),
            });
        }
    }

    let vertices = source
        .positions
        .iter()
        .enumerate()
        .map(|(i, &position)| Vertex {
            position,
            normal: source
                .normals
                .map_or_else(Vector3::zeros, |normals| normals[i]),
        })
        .collect();

    let triangles = source
        .faces
        .iter()
        .enumerate()
        .map(|(face, indices)| match indices.as_slice() {
            &[a, b, c] => Ok(Triangle::new(a, b, c)),
            other => Err(FlattenError::NonTriangularFace {
                mesh: index,
                face,
                sides: other.len(),
            }),
        })
        .collect::<Result<Vec<_>, _>>()?;

    Mesh::new(vertices, triangles).map_err(|source| FlattenError::InvalidIndices { mesh: index, source })
}
