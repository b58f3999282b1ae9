//! Compiled unit discovery
//!
//! Locates the bundler's output directories under the build directory:
//! ```text
//! .webpack/
//! ├── service/      # whole-service build
//! ├── create/       # per-function builds (individually mode)
//! └── cancel/
//! ```

use std::path::Path;

use edge_packager_model::{CompiledUnit, EntryFunction, ServiceManifest};

use crate::error::PackagingError;

/// Output directory of a whole-service build, relative to the build directory
pub const SERVICE_OUTPUT_DIR: &str = "service";

/// Build the ordered list of compiled units for `manifest`
pub fn discover_units(
    build_dir: &Path,
    manifest: &ServiceManifest,
) -> Result<Vec<CompiledUnit>, PackagingError> {
    if !manifest.package_individually() {
        let path = build_dir.join(SERVICE_OUTPUT_DIR);
        if !path.is_dir() {
            return Err(PackagingError::MissingOutput {
                unit: format!("service {}", manifest.service_name()),
                path,
            });
        }
        return Ok(vec![CompiledUnit::new(0, path)]);
    }

    let mut units = Vec::with_capacity(manifest.functions.len());
    for (index, (name, function)) in manifest.functions.iter().enumerate() {
        let path = build_dir.join(name);
        if !path.is_dir() {
            return Err(PackagingError::MissingOutput {
                unit: format!("function {}", name),
                path,
            });
        }

        let mut entry = EntryFunction::new(name.as_str());
        entry.handler = function.handler.clone();
        units.push(CompiledUnit::new(index, path).with_entry_function(entry));
    }

    tracing::debug!("Discovered {} function build(s) in {:?}", units.len(), build_dir);
    Ok(units)
}
