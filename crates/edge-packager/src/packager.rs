//! Packaging orchestration
//!
//! Drives one packaging run:
//! 1. Archive every compiled unit, one at a time and in order
//! 2. In `individually` mode, bind each function unit's artifact as soon as it exists
//! 3. Otherwise bind the first artifact to every function in the manifest
//!
//! Units are never archived concurrently. Two units may resolve to the same
//! archive name, and the manifest is mutated between archive jobs.

use std::io;
use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::{DateTime, Utc};
use edge_packager_model::{CompiledUnit, ServiceManifest};
use tokio::task;

use crate::archive::ArchiveWriter;
use crate::binding::{bind_artifact, HostVersion};
use crate::error::{ArchiveError, PackagingError};

/// Provider that also reads the shared artifact from the service `package` section
pub const SERVICE_ARTIFACT_PROVIDER: &str = "google";

/// Options for a packaging run
#[derive(Debug, Clone)]
pub struct PackagerOptions {
    /// Absolute path of the service (project) root
    pub service_path: PathBuf,

    /// Staging directory name, relative to `service_path`
    pub staging_dir: String,

    /// Report per-unit zip timings at info level
    pub verbose: bool,
}

/// A zip archive produced from one compiled unit
#[derive(Debug, Clone)]
pub struct Artifact {
    /// Index of the compiled unit this was built from
    pub unit_index: usize,

    /// Absolute path of the archive
    pub path: PathBuf,

    /// Path relative to the service root, as written into the manifest
    pub relative_path: String,

    pub created_at: DateTime<Utc>,
}

/// Packages compiled units and records the results in the manifest
pub struct Packager {
    options: PackagerOptions,
    writer: ArchiveWriter,
    host_version: HostVersion,
}

impl Packager {
    pub fn new(options: PackagerOptions, host_version: HostVersion) -> Self {
        let writer = ArchiveWriter::new(&options.service_path, &options.staging_dir);
        Self {
            options,
            writer,
            host_version,
        }
    }

    pub fn staging_root(&self) -> &Path {
        self.writer.staging_root()
    }

    /// Package `units` and bind the produced artifacts into `manifest`
    ///
    /// Stops at the first unit that fails. Archives written before the failure
    /// stay on disk.
    pub async fn run(
        &self,
        units: &[CompiledUnit],
        manifest: &mut ServiceManifest,
    ) -> Result<Vec<Artifact>, PackagingError> {
        let individually = manifest.package_individually();
        let service_name = manifest.service_name().to_string();

        tracing::info!(
            "Packaging {} compiled unit(s) for service {} (individually: {})",
            units.len(),
            service_name,
            individually
        );

        let mut artifacts = Vec::with_capacity(units.len());

        for unit in units {
            let artifact = self.package_unit(unit, &service_name).await?;

            if individually {
                if let Some(entry) = &unit.entry_function {
                    let function = manifest
                        .function_mut(&entry.name)
                        .ok_or_else(|| PackagingError::UnknownFunction(entry.name.clone()))?;
                    bind_artifact(&entry.name, function, &artifact.relative_path, &self.host_version);
                }
            }

            artifacts.push(artifact);
        }

        if !individually {
            if let Some(shared) = artifacts.first() {
                self.bind_shared(shared, manifest);
            }
        }

        Ok(artifacts)
    }

    async fn package_unit(
        &self,
        unit: &CompiledUnit,
        service_name: &str,
    ) -> Result<Artifact, PackagingError> {
        let archive_name = unit.archive_name(service_name);
        let destination = self.writer.destination(&archive_name);
        let writer = self.writer.clone();
        let directory = unit.output_path.clone();
        let started = Instant::now();

        // Run the archive job in a blocking task, but wait for it before moving on
        let result = task::spawn_blocking(move || writer.archive(&directory, &archive_name))
            .await
            .unwrap_or_else(|e| {
                Err(ArchiveError::Write {
                    path: destination,
                    source: io::Error::other(e),
                })
            });

        let path = result.map_err(|source| PackagingError::Archive {
            index: unit.index,
            directory: unit.output_path.clone(),
            source,
        })?;

        let line = format!(
            "{} Zip {}: {:?} [{} ms]",
            Utc::now().to_rfc2822(),
            unit.kind(),
            unit.output_path,
            started.elapsed().as_millis()
        );
        if self.options.verbose {
            tracing::info!("{}", line);
        } else {
            tracing::debug!("{}", line);
        }

        let relative_path = self.relative_to_service(&path);
        Ok(Artifact {
            unit_index: unit.index,
            path,
            relative_path,
            created_at: Utc::now(),
        })
    }

    /// Point every function (and the service itself where the provider wants it)
    /// at a single shared artifact
    fn bind_shared(&self, shared: &Artifact, manifest: &mut ServiceManifest) {
        tracing::debug!(
            "Binding shared artifact {} to {} function(s)",
            shared.relative_path,
            manifest.functions.len()
        );

        for (name, function) in manifest.functions.iter_mut() {
            bind_artifact(name, function, &shared.relative_path, &self.host_version);
        }

        if manifest.provider_name() == Some(SERVICE_ARTIFACT_PROVIDER) {
            manifest.set_service_artifact(shared.relative_path.clone());
        }
    }

    fn relative_to_service(&self, path: &Path) -> String {
        path.strip_prefix(&self.options.service_path)
            .unwrap_or(path)
            .to_string_lossy()
            .into_owned()
    }
}
