/// meshkit Core Library - Scene flattening and mesh preparation
///
/// Turns an imported scene graph into a flat list of triangle meshes,
/// rescales them into the unit cube and lays out their attributes for a
/// renderer. Also provides the model/view/projection math used to place and
/// look at those meshes.

pub mod config;
pub mod flatten;
pub mod geometry;
pub mod import;
pub mod interleave;
pub mod loader;
pub mod normalize;
pub mod obj;
pub mod projection;
pub mod scene;
pub mod stl;
pub mod transform;

// Re-export commonly used types
pub use config::{ConfigError, LoaderConfig};
pub use flatten::{flatten, FlattenError};
pub use geometry::{Mesh, MeshError, Triangle, Vertex};
pub use import::{ImportError, ImportOptions, SceneImporter};
pub use interleave::{interleave, RenderMesh, VERTEX_STRIDE};
pub use loader::{load, try_load, LoadError};
pub use normalize::{normalize, Aabb, NormalizeError};
pub use projection::Camera;
pub use scene::{ImportedMesh, ImportedScene, NodeId, SceneGraph};
pub use transform::Transform;
