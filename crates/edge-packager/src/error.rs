//! Error types for packaging runs

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while archiving a single directory
#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("Packaging: No files found in {0:?}")]
    EmptyDirectory(PathBuf),

    #[error("Failed to write archive {path:?}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors that abort a packaging run
#[derive(Error, Debug)]
pub enum PackagingError {
    #[error("Packaging unit {index} ({directory:?}) failed: {source}")]
    Archive {
        index: usize,
        directory: PathBuf,
        #[source]
        source: ArchiveError,
    },

    #[error("Function '{0}' is not defined in the service manifest")]
    UnknownFunction(String),

    #[error("Compiled output for {unit} not found at {path:?}")]
    MissingOutput { unit: String, path: PathBuf },

    #[error("Invalid host version '{version}': {source}")]
    InvalidHostVersion {
        version: String,
        #[source]
        source: semver::Error,
    },
}

impl PackagingError {
    /// Index of the compiled unit that caused the failure, if any
    pub fn unit_index(&self) -> Option<usize> {
        match self {
            PackagingError::Archive { index, .. } => Some(*index),
            _ => None,
        }
    }
}
