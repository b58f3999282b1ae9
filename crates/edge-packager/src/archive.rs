//! Archive writer
//!
//! Zips the contents of a compiled output directory into the staging
//! directory under the service root:
//! ```text
//! <service_path>/
//! └── .serverless/
//!     ├── orders.zip      # whole-service unit
//!     └── create.zip      # unit compiled for function "create"
//! ```
//!
//! Entries are stored relative to the source directory, so the archive never
//! carries the directory's own path prefix.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::ArchiveError;

/// Default staging directory name, relative to the service path
pub const DEFAULT_STAGING_DIR: &str = ".serverless";

/// Writes zip archives into a fixed staging directory
#[derive(Debug, Clone)]
pub struct ArchiveWriter {
    staging_root: PathBuf,
}

/// A file or directory found under the source directory
struct ArchiveEntry {
    /// Name inside the archive, always `/`-separated
    name: String,
    path: PathBuf,
    is_dir: bool,
    mode: Option<u32>,
}

impl ArchiveWriter {
    pub fn new(service_path: &Path, staging_dir: &str) -> Self {
        Self {
            staging_root: service_path.join(staging_dir),
        }
    }

    pub fn staging_root(&self) -> &Path {
        &self.staging_root
    }

    /// Where an archive with the given name ends up
    pub fn destination(&self, archive_name: &str) -> PathBuf {
        self.staging_root.join(archive_name)
    }

    /// Archive everything under `directory` into `<staging>/<archive_name>`
    ///
    /// Hidden files are included and symbolic links are followed. Fails with
    /// [`ArchiveError::EmptyDirectory`] without touching the disk when there
    /// is nothing to archive.
    pub fn archive(&self, directory: &Path, archive_name: &str) -> Result<PathBuf, ArchiveError> {
        let destination = self.destination(archive_name);
        let write_err = |source| ArchiveError::Write {
            path: destination.clone(),
            source,
        };

        let entries = list_entries(directory).map_err(write_err)?;
        if entries.is_empty() {
            return Err(ArchiveError::EmptyDirectory(directory.to_path_buf()));
        }

        fs::create_dir_all(&self.staging_root).map_err(write_err)?;
        write_zip(&entries, &destination).map_err(write_err)?;

        tracing::debug!(
            "Archived {} entries from {:?} into {:?}",
            entries.len(),
            directory,
            destination
        );

        Ok(destination)
    }
}

/// Recursively list every entry below `directory`, in a stable order
fn list_entries(directory: &Path) -> io::Result<Vec<ArchiveEntry>> {
    let root = fs::metadata(directory)?;
    if !root.is_dir() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{:?} is not a directory", directory),
        ));
    }

    let mut entries = Vec::new();
    for entry in WalkDir::new(directory)
        .min_depth(1)
        .follow_links(true)
        .sort_by_file_name()
    {
        let entry = entry?;
        let relative = entry.path().strip_prefix(directory).map_err(io::Error::other)?;
        let name = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        let metadata = entry.metadata()?;

        entries.push(ArchiveEntry {
            name,
            path: entry.path().to_path_buf(),
            is_dir: metadata.is_dir(),
            mode: unix_mode(&metadata),
        });
    }

    Ok(entries)
}

fn write_zip(entries: &[ArchiveEntry], destination: &Path) -> io::Result<()> {
    let file = fs::File::create(destination)?;
    let mut zip = ZipWriter::new(file);
    let base_options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for entry in entries {
        let options = match entry.mode {
            Some(mode) => base_options.unix_permissions(mode),
            None => base_options,
        };

        if entry.is_dir {
            zip.add_directory(entry.name.as_str(), options)
                .map_err(io::Error::other)?;
        } else {
            zip.start_file(entry.name.as_str(), options)
                .map_err(io::Error::other)?;
            let mut source = fs::File::open(&entry.path)?;
            io::copy(&mut source, &mut zip)?;
        }
    }

    zip.finish().map_err(io::Error::other)?;
    Ok(())
}

#[cfg(unix)]
fn unix_mode(metadata: &fs::Metadata) -> Option<u32> {
    use std::os::unix::fs::PermissionsExt;
    Some(metadata.permissions().mode())
}

#[cfg(not(unix))]
fn unix_mode(_metadata: &fs::Metadata) -> Option<u32> {
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use zip::ZipArchive;

    fn archive_names(path: &Path) -> Vec<String> {
        let archive = ZipArchive::new(fs::File::open(path).unwrap()).unwrap();
        archive.file_names().map(str::to_string).collect()
    }

    #[test]
    fn test_archive_writes_into_staging_dir() {
        let service = tempfile::tempdir().unwrap();
        let source = tempfile::tempdir().unwrap();
        fs::write(source.path().join("handler.js"), "exports.handler = () => {}").unwrap();
        fs::create_dir_all(source.path().join("lib")).unwrap();
        fs::write(source.path().join("lib").join("util.js"), "module.exports = {}").unwrap();

        let writer = ArchiveWriter::new(service.path(), DEFAULT_STAGING_DIR);
        let artifact = writer.archive(source.path(), "orders.zip").unwrap();

        assert_eq!(artifact, service.path().join(".serverless").join("orders.zip"));
        let mut names = archive_names(&artifact);
        names.sort();
        assert_eq!(names, vec!["handler.js", "lib/", "lib/util.js"]);
    }

    #[test]
    fn test_archive_single_dotfile() {
        let service = tempfile::tempdir().unwrap();
        let source = tempfile::tempdir().unwrap();
        fs::write(source.path().join(".env"), "STAGE=dev").unwrap();

        let writer = ArchiveWriter::new(service.path(), DEFAULT_STAGING_DIR);
        let artifact = writer.archive(source.path(), "svc.zip").unwrap();

        let mut archive = ZipArchive::new(fs::File::open(&artifact).unwrap()).unwrap();
        assert_eq!(archive.len(), 1);
        let mut content = String::new();
        archive.by_name(".env").unwrap().read_to_string(&mut content).unwrap();
        assert_eq!(content, "STAGE=dev");
    }

    #[test]
    fn test_archive_empty_directory_fails_and_writes_nothing() {
        let service = tempfile::tempdir().unwrap();
        let source = tempfile::tempdir().unwrap();

        let writer = ArchiveWriter::new(service.path(), DEFAULT_STAGING_DIR);
        let err = writer.archive(source.path(), "svc.zip").unwrap_err();

        match err {
            ArchiveError::EmptyDirectory(dir) => assert_eq!(dir, source.path()),
            other => panic!("unexpected error: {other}"),
        }
        assert!(!writer.staging_root().exists());
    }

    #[test]
    fn test_archive_missing_directory_is_write_error() {
        let service = tempfile::tempdir().unwrap();
        let writer = ArchiveWriter::new(service.path(), DEFAULT_STAGING_DIR);

        let err = writer
            .archive(&service.path().join("does-not-exist"), "svc.zip")
            .unwrap_err();
        assert!(matches!(err, ArchiveError::Write { .. }));
    }

    #[test]
    fn test_archive_overwrites_existing_file() {
        let service = tempfile::tempdir().unwrap();
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        fs::write(first.path().join("old.js"), "old").unwrap();
        fs::write(second.path().join("new.js"), "new").unwrap();

        let writer = ArchiveWriter::new(service.path(), DEFAULT_STAGING_DIR);
        writer.archive(first.path(), "svc.zip").unwrap();
        let artifact = writer.archive(second.path(), "svc.zip").unwrap();

        assert_eq!(archive_names(&artifact), vec!["new.js"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_archive_follows_symlinks() {
        let service = tempfile::tempdir().unwrap();
        let shared = tempfile::tempdir().unwrap();
        let source = tempfile::tempdir().unwrap();
        fs::write(shared.path().join("dep.js"), "dep").unwrap();
        std::os::unix::fs::symlink(shared.path(), source.path().join("node_modules")).unwrap();

        let writer = ArchiveWriter::new(service.path(), DEFAULT_STAGING_DIR);
        let artifact = writer.archive(source.path(), "svc.zip").unwrap();

        let names = archive_names(&artifact);
        assert!(names.contains(&"node_modules/dep.js".to_string()));
    }
}
