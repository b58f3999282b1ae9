//! Edge Packager - Turns compiled function outputs into deployable zip artifacts
//!
//! The packager:
//! - Archives each compiled unit's output directory into the staging directory
//! - Records the produced artifact paths in the service manifest
//! - Picks the manifest shape the host tool version expects

pub mod archive;
pub mod binding;
pub mod config;
pub mod discovery;
pub mod error;
pub mod packager;

pub use archive::ArchiveWriter;
pub use binding::{ArtifactBinding, HostVersion};
pub use config::AppConfig;
pub use discovery::discover_units;
pub use error::{ArchiveError, PackagingError};
pub use packager::{Artifact, Packager, PackagerOptions};
