//! YAML file loading with source-annotated errors

pub mod diagnostics;

pub use diagnostics::{YamlError, YamlSyntaxError};

use serde::de::DeserializeOwned;
use std::fs;
use std::path::Path;

/// Read and deserialize a YAML file
pub fn read_yaml_file<T: DeserializeOwned>(path: &Path) -> Result<T, YamlError> {
    let source = fs::read_to_string(path).map_err(|source| YamlError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_yaml(&source, &path.display().to_string())
}

/// Deserialize YAML text; `filename` is used in diagnostics only
pub fn parse_yaml<T: DeserializeOwned>(source: &str, filename: &str) -> Result<T, YamlError> {
    serde_yml::from_str(source)
        .map_err(|e| YamlSyntaxError::from_serde_error(&e, source, filename).into())
}
