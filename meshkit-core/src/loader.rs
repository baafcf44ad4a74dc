/// Path-based entry point: read, import, flatten, optionally normalize
///
/// [`try_load`] stops at the first problem and says what it was. [`load`] is
/// the fail-soft wrapper: it logs the error and hands back an empty list, so
/// callers should treat an empty result as "check the logs" rather than
/// "empty scene".
use std::io;
use std::path::{Path, PathBuf};

use log::{debug, error, info, warn};
use thiserror::Error;

use crate::config::LoaderConfig;
use crate::flatten::{flatten, FlattenError};
use crate::geometry::Mesh;
use crate::import::{default_importers, importer_for, ImportError, SceneImporter};
use crate::normalize::normalize;
use crate::scene::SceneGraph;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("file \"{0}\" does not exist")]
    NotFound(PathBuf),
    #[error("could not read \"{path}\": {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("no importer handles \"{0}\"")]
    UnsupportedFormat(PathBuf),
    #[error("import failed: {0}")]
    Import(#[from] ImportError),
    #[error("importer returned an incomplete scene")]
    IncompleteScene,
    #[error(transparent)]
    Flatten(#[from] FlattenError),
}

/// Load every mesh in the scene at `path`, or an empty list on failure
pub fn load(path: impl AsRef<Path>, config: &LoaderConfig) -> Vec<Mesh> {
    let path = path.as_ref();
    match try_load(path, config) {
        Ok(meshes) => meshes,
        Err(e) => {
            error!("Failed to load \"{}\": {}", path.display(), e);
            Vec::new()
        }
    }
}

/// Load with the bundled importers
pub fn try_load(path: impl AsRef<Path>, config: &LoaderConfig) -> Result<Vec<Mesh>, LoadError> {
    try_load_with(path.as_ref(), config, &default_importers())
}

/// Load with a caller-supplied set of importers
pub fn try_load_with(
    path: &Path,
    config: &LoaderConfig,
    importers: &[Box<dyn SceneImporter>],
) -> Result<Vec<Mesh>, LoadError> {
    if !path.exists() {
        return Err(LoadError::NotFound(path.to_path_buf()));
    }

    let importer =
        importer_for(path, importers).ok_or_else(|| LoadError::UnsupportedFormat(path.to_path_buf()))?;
    let data = std::fs::read(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(
        "Importing \"{}\" ({} bytes) with the {} importer",
        path.display(),
        data.len(),
        importer.name()
    );

    let scene = importer.import(&data, &config.import)?;
    let meshes = from_scene(&scene, config)?;
    info!("Loaded {} meshes from \"{}\"", meshes.len(), path.display());
    Ok(meshes)
}

/// Flatten an already-imported scene, normalizing if configured
pub fn from_scene<S>(scene: &S, config: &LoaderConfig) -> Result<Vec<Mesh>, LoadError>
where
    S: SceneGraph + ?Sized,
{
    if !scene.is_complete() || scene.root().is_none() {
        return Err(LoadError::IncompleteScene);
    }

    let meshes = flatten(scene, config.max_depth)?;
    if !config.normalize {
        return Ok(meshes);
    }

    Ok(meshes
        .into_iter()
        .enumerate()
        .map(|(i, mesh)| match normalize(&mesh) {
            Ok(normalized) => normalized,
            Err(e) => {
                warn!("Mesh {} left unnormalized: {}", i, e);
                mesh
            }
        })
        .collect())
}
