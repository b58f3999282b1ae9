//! Error types for manifest handling

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading or saving a service manifest
#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("Failed to read manifest file {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse service manifest: {0}")]
    Parse(#[source] serde_yaml::Error),

    #[error("Failed to serialize service manifest: {0}")]
    Serialize(#[source] serde_yaml::Error),

    #[error("Failed to write manifest file {path:?}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
