/// In-memory scene graph handed over by an importer
///
/// The flattener only needs to walk nodes and read raw mesh data, so it is
/// written against [`SceneGraph`]. [`ImportedScene`] is the owned
/// implementation every bundled importer produces; other importers can
/// implement the trait over their own node storage.
use nalgebra::{Point3, Vector3};

/// Index of a node inside a scene
pub type NodeId = usize;

/// A polygon as listed by the importer, before any topology validation
pub type Face = Vec<u32>;

/// Read-only view of one importer mesh
#[derive(Debug, Clone, Copy)]
pub struct SourceMesh<'a> {
    pub positions: &'a [Point3<f32>],
    /// `None` when the file carried no normals
    pub normals: Option<&'a [Vector3<f32>]>,
    pub faces: &'a [Face],
}

/// Traversal capability an importer must expose
pub trait SceneGraph {
    /// Root node, `None` if the importer produced no hierarchy
    fn root(&self) -> Option<NodeId>;

    /// Mesh indices owned directly by `node`, in importer order
    fn node_meshes(&self, node: NodeId) -> Option<&[usize]>;

    /// Children of `node`, in importer order
    fn node_children(&self, node: NodeId) -> Option<&[NodeId]>;

    fn mesh(&self, index: usize) -> Option<SourceMesh<'_>>;

    /// False when the importer gave up part-way through the file
    fn is_complete(&self) -> bool {
        true
    }
}

/// Mesh data as delivered by an importer
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportedMesh {
    pub positions: Vec<Point3<f32>>,
    pub normals: Option<Vec<Vector3<f32>>>,
    pub faces: Vec<Face>,
}

impl ImportedMesh {
    pub fn new(positions: Vec<Point3<f32>>, faces: Vec<Face>) -> Self {
        Self {
            positions,
            normals: None,
            faces,
        }
    }

    pub fn with_normals(mut self, normals: Vec<Vector3<f32>>) -> Self {
        self.normals = Some(normals);
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportedNode {
    pub name: Option<String>,
    pub meshes: Vec<usize>,
    pub children: Vec<NodeId>,
}

/// Owned scene: a node arena plus a mesh table
///
/// Node 0 is the root once [`ImportedScene::with_root`] has been called.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportedScene {
    nodes: Vec<ImportedNode>,
    meshes: Vec<ImportedMesh>,
    complete: bool,
}

impl Default for ImportedScene {
    fn default() -> Self {
        Self::new()
    }
}

impl ImportedScene {
    /// A scene with no nodes at all
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            meshes: Vec::new(),
            complete: true,
        }
    }

    /// A scene holding only an empty root node
    pub fn with_root() -> Self {
        let mut scene = Self::new();
        scene.nodes.push(ImportedNode::default());
        scene
    }

    /// Add a mesh to the mesh table, returning its index
    pub fn add_mesh(&mut self, mesh: ImportedMesh) -> usize {
        self.meshes.push(mesh);
        self.meshes.len() - 1
    }

    /// Add a node under `parent`, returning its id
    ///
    /// # Panics
    ///
    /// Panics if `parent` is not a node of this scene.
    pub fn add_node(&mut self, parent: NodeId, name: Option<String>) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(ImportedNode {
            name,
            ..Default::default()
        });
        self.nodes[parent].children.push(id);
        id
    }

    /// Make `node` own `mesh`
    ///
    /// # Panics
    ///
    /// Panics if `node` is not a node of this scene.
    pub fn attach_mesh(&mut self, node: NodeId, mesh: usize) {
        self.nodes[node].meshes.push(mesh);
    }

    /// Link an existing node as a child of `parent`
    ///
    /// The graph is not checked here. The flattener rejects any node that is
    /// reached twice, so shared children and cycles fail at flatten time.
    ///
    /// # Panics
    ///
    /// Panics if `parent` is not a node of this scene.
    pub fn link(&mut self, parent: NodeId, child: NodeId) {
        self.nodes[parent].children.push(child);
    }

    pub fn mark_incomplete(&mut self) {
        self.complete = false;
    }

    pub fn nodes(&self) -> &[ImportedNode] {
        &self.nodes
    }

    pub fn meshes(&self) -> &[ImportedMesh] {
        &self.meshes
    }

    pub fn meshes_mut(&mut self) -> &mut [ImportedMesh] {
        &mut self.meshes
    }
}

impl SceneGraph for ImportedScene {
    fn root(&self) -> Option<NodeId> {
        (!self.nodes.is_empty()).then_some(0)
    }

    fn node_meshes(&self, node: NodeId) -> Option<&[usize]> {
        self.nodes.get(node).map(|n| n.meshes.as_slice())
    }

    fn node_children(&self, node: NodeId) -> Option<&[NodeId]> {
        self.nodes.get(node).map(|n| n.children.as_slice())
    }

    fn mesh(&self, index: usize) -> Option<SourceMesh<'_>> {
        self.meshes.get(index).map(|m| SourceMesh {
            positions: &m.positions,
            normals: m.normals.as_deref(),
            faces: &m.faces,
        })
    }

    fn is_complete(&self) -> bool {
        self.complete
    }
}
