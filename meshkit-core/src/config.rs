/// Loader configuration
///
/// Every field has a default, so a config file only needs the keys it
/// changes:
///
/// ```toml
/// max_depth = 64
/// normalize = true
///
/// [import]
/// triangulate = false
/// ```
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::flatten::DEFAULT_MAX_DEPTH;
use crate::import::ImportOptions;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Deepest node level the flattener will descend to
    pub max_depth: usize,
    /// Rescale every mesh into the unit cube after flattening
    pub normalize: bool,
    pub import: ImportOptions,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            normalize: false,
            import: ImportOptions::default(),
        }
    }
}

impl LoaderConfig {
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    /// Load configuration from a TOML file
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn with_normalize(mut self, normalize: bool) -> Self {
        self.normalize = normalize;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_gives_defaults() {
        assert_eq!(LoaderConfig::from_toml_str("").unwrap(), LoaderConfig::default());
    }

    #[test]
    fn test_partial_override() {
        let config = LoaderConfig::from_toml_str(
            "max_depth = 8\nnormalize = true\n[import]\ntriangulate = false\n",
        )
        .unwrap();

        assert_eq!(config.max_depth, 8);
        assert!(config.normalize);
        assert!(!config.import.triangulate);
        assert!(config.import.generate_normals);
    }

    #[test]
    fn test_bad_type_is_parse_error() {
        assert!(matches!(
            LoaderConfig::from_toml_str("max_depth = \"deep\""),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("meshkit.toml");
        std::fs::write(&path, "normalize = true\n").unwrap();

        let config = LoaderConfig::load_from_file(&path).unwrap();
        assert!(config.normalize);
        assert!(matches!(
            LoaderConfig::load_from_file(dir.path().join("missing.toml")),
            Err(ConfigError::Io(_))
        ));
    }
}
