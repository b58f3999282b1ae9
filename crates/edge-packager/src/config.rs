//! Application configuration

use std::env;
use std::path::PathBuf;

use crate::archive::DEFAULT_STAGING_DIR;

/// Host tool version assumed when none is configured
pub const DEFAULT_HOST_VERSION: &str = "3.38.0";

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Root of the service (project) being packaged
    pub service_path: PathBuf,

    /// Service manifest, relative to the service path unless absolute
    pub manifest_path: PathBuf,

    /// Directory holding the bundler's output, relative to the service path unless absolute
    pub build_dir: PathBuf,

    /// Staging directory name for produced archives
    pub staging_dir: String,

    /// Version of the host tool the manifest is written for
    pub host_version: String,

    /// Where to write the updated manifest (defaults into the staging directory)
    pub manifest_out: Option<PathBuf>,

    /// Report packaging timings at info level
    pub verbose: bool,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            service_path: lookup("EDGE_PACKAGER_SERVICE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(".")),

            manifest_path: lookup("EDGE_PACKAGER_MANIFEST")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("serverless.yml")),

            build_dir: lookup("EDGE_PACKAGER_BUILD_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(".webpack")),

            staging_dir: lookup("EDGE_PACKAGER_STAGING_DIR")
                .unwrap_or_else(|| DEFAULT_STAGING_DIR.to_string()),

            host_version: lookup("EDGE_PACKAGER_HOST_VERSION")
                .unwrap_or_else(|| DEFAULT_HOST_VERSION.to_string()),

            manifest_out: lookup("EDGE_PACKAGER_MANIFEST_OUT").map(PathBuf::from),

            verbose: lookup("EDGE_PACKAGER_VERBOSE")
                .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(false),
        }
    }

    /// Manifest location resolved against the service path
    pub fn manifest_file(&self) -> PathBuf {
        self.service_path.join(&self.manifest_path)
    }

    /// Build directory resolved against the service path
    pub fn build_root(&self) -> PathBuf {
        self.service_path.join(&self.build_dir)
    }

    /// Output location for the updated manifest
    pub fn manifest_out_file(&self) -> PathBuf {
        match &self.manifest_out {
            Some(path) => self.service_path.join(path),
            None => self
                .service_path
                .join(&self.staging_dir)
                .join("packaged-manifest.yml"),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> AppConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config(&[]);
        assert_eq!(config.service_path, PathBuf::from("."));
        assert_eq!(config.manifest_file(), PathBuf::from("./serverless.yml"));
        assert_eq!(config.build_root(), PathBuf::from("./.webpack"));
        assert_eq!(config.staging_dir, ".serverless");
        assert_eq!(config.host_version, DEFAULT_HOST_VERSION);
        assert_eq!(
            config.manifest_out_file(),
            PathBuf::from("./.serverless/packaged-manifest.yml")
        );
        assert!(!config.verbose);
    }

    #[test]
    fn test_overrides() {
        let config = config(&[
            ("EDGE_PACKAGER_SERVICE_PATH", "/srv/orders"),
            ("EDGE_PACKAGER_BUILD_DIR", "/tmp/build"),
            ("EDGE_PACKAGER_STAGING_DIR", ".package"),
            ("EDGE_PACKAGER_HOST_VERSION", "1.17.0"),
            ("EDGE_PACKAGER_MANIFEST_OUT", "out.yml"),
            ("EDGE_PACKAGER_VERBOSE", "TRUE"),
        ]);

        assert_eq!(config.build_root(), PathBuf::from("/tmp/build"));
        assert_eq!(config.staging_dir, ".package");
        assert_eq!(config.host_version, "1.17.0");
        assert_eq!(config.manifest_out_file(), PathBuf::from("/srv/orders/out.yml"));
        assert!(config.verbose);
    }

    #[test]
    fn test_verbose_rejects_other_values() {
        assert!(!config(&[("EDGE_PACKAGER_VERBOSE", "0")]).verbose);
        assert!(!config(&[("EDGE_PACKAGER_VERBOSE", "off")]).verbose);
        assert!(config(&[("EDGE_PACKAGER_VERBOSE", "yes")]).verbose);
    }
}
