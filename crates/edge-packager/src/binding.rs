//! Artifact binding
//!
//! Records an artifact path on a function in the service manifest. Host tool
//! versions before 1.18.0 read the artifact from the function itself and need
//! their own packaging switched off; later versions read it from the
//! function's `package` section.

use std::fmt;
use std::str::FromStr;

use edge_packager_model::{FunctionDefinition, FunctionPackage};
use semver::Version;

use crate::error::PackagingError;

/// First host version that reads `package.artifact`
pub const PACKAGE_ARTIFACT_SINCE: Version = Version::new(1, 18, 0);

/// Semantic version of the host tool
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct HostVersion(Version);

impl HostVersion {
    pub fn parse(version: &str) -> Result<Self, PackagingError> {
        Version::parse(version.trim())
            .map(Self)
            .map_err(|source| PackagingError::InvalidHostVersion {
                version: version.to_string(),
                source,
            })
    }

    pub fn as_semver(&self) -> &Version {
        &self.0
    }
}

impl FromStr for HostVersion {
    type Err = PackagingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for HostVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Manifest shape used to record an artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactBinding {
    /// `artifact: <path>` plus `package.disable: true`
    Legacy,
    /// `package: { artifact: <path> }`
    Current,
}

impl ArtifactBinding {
    /// Select the shape the given host version understands
    pub fn for_version(version: &HostVersion) -> Self {
        if version.0 < PACKAGE_ARTIFACT_SINCE {
            ArtifactBinding::Legacy
        } else {
            ArtifactBinding::Current
        }
    }

    /// Write `artifact_path` onto `function`. Safe to repeat; later calls overwrite.
    pub fn apply(self, function_name: &str, function: &mut FunctionDefinition, artifact_path: &str) {
        match self {
            ArtifactBinding::Legacy => {
                function.artifact = Some(artifact_path.to_string());
                function.package.get_or_insert_with(Default::default).disable = Some(true);
                tracing::info!(
                    "{} is packaged by the edge packager. Ignore messages from the host tool.",
                    function_name
                );
            }
            ArtifactBinding::Current => {
                function.package = Some(FunctionPackage {
                    artifact: Some(artifact_path.to_string()),
                    ..Default::default()
                });
            }
        }
    }
}

/// Bind `artifact_path` to a function using the shape `version` expects
pub fn bind_artifact(
    function_name: &str,
    function: &mut FunctionDefinition,
    artifact_path: &str,
    version: &HostVersion,
) {
    ArtifactBinding::for_version(version).apply(function_name, function, artifact_path);
}

#[cfg(test)]
mod tests {
    use super::*;
    use edge_packager_model::manifest::ExtraValue;

    fn version(v: &str) -> HostVersion {
        HostVersion::parse(v).unwrap()
    }

    #[test]
    fn test_version_gate_boundary() {
        assert_eq!(ArtifactBinding::for_version(&version("1.17.9")), ArtifactBinding::Legacy);
        assert_eq!(ArtifactBinding::for_version(&version("1.18.0")), ArtifactBinding::Current);
        assert_eq!(ArtifactBinding::for_version(&version("1.18.1")), ArtifactBinding::Current);
        assert_eq!(ArtifactBinding::for_version(&version("3.38.0")), ArtifactBinding::Current);
        assert_eq!(ArtifactBinding::for_version(&version("0.5.6")), ArtifactBinding::Legacy);
    }

    #[test]
    fn test_prerelease_sorts_before_release() {
        assert_eq!(
            ArtifactBinding::for_version(&version("1.18.0-beta.1")),
            ArtifactBinding::Legacy
        );
    }

    #[test]
    fn test_invalid_host_version() {
        let err = HostVersion::parse("1.18").unwrap_err();
        assert!(matches!(err, PackagingError::InvalidHostVersion { .. }));
        assert!("not-a-version".parse::<HostVersion>().is_err());
    }

    #[test]
    fn test_legacy_binding_keeps_existing_package_settings() {
        let mut function = FunctionDefinition::default();
        let mut package = FunctionPackage::default();
        package.extra.insert("include".into(), yaml_string("assets/**"));
        function.package = Some(package);

        bind_artifact("create", &mut function, ".serverless/create.zip", &version("1.17.9"));

        assert_eq!(function.artifact.as_deref(), Some(".serverless/create.zip"));
        let package = function.package.unwrap();
        assert_eq!(package.disable, Some(true));
        assert_eq!(package.artifact, None);
        assert!(package.extra.contains_key("include"));
    }

    #[test]
    fn test_current_binding_replaces_package_section() {
        let mut function = FunctionDefinition::default();
        let mut package = FunctionPackage::default();
        package.disable = Some(true);
        package.extra.insert("include".into(), yaml_string("assets/**"));
        function.package = Some(package);

        bind_artifact("create", &mut function, ".serverless/create.zip", &version("1.18.0"));

        assert_eq!(function.artifact, None);
        assert_eq!(
            function.package,
            Some(FunctionPackage {
                artifact: Some(".serverless/create.zip".into()),
                ..Default::default()
            })
        );
    }

    #[test]
    fn test_binding_is_idempotent() {
        let mut function = FunctionDefinition::default();
        let v = version("2.0.0");

        bind_artifact("create", &mut function, "a.zip", &v);
        let first = function.package.clone();
        bind_artifact("create", &mut function, "a.zip", &v);
        assert_eq!(function.package, first);

        bind_artifact("create", &mut function, "b.zip", &v);
        assert_eq!(function.package.unwrap().artifact.as_deref(), Some("b.zip"));
    }

    fn yaml_string(s: &str) -> ExtraValue {
        ExtraValue::String(s.to_string())
    }
}
