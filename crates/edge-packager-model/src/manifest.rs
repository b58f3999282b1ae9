//! Service manifest parsing
//!
//! Parses the host tool's service description (`serverless.yml` style) with
//! environment variable substitution. The packager mutates the parsed manifest
//! in place to record where the produced artifacts live.
//!
//! Keys the packager does not know about are kept in `extra` maps so a
//! load/save cycle does not lose anything.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::OnceLock;

use crate::error::ManifestError;

/// Value of an unmodelled manifest key
pub type ExtraValue = serde_yaml::Value;

/// Unmodelled manifest keys, kept verbatim
pub type ExtraFields = BTreeMap<String, ExtraValue>;

/// The service manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceManifest {
    /// Service name, either `service: orders` or `service: { name: orders }`
    pub service: ServiceName,

    /// Target platform
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<ProviderConfig>,

    /// Service-level packaging configuration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package: Option<ServicePackage>,

    /// Functions (logical units) keyed by name
    #[serde(default)]
    pub functions: BTreeMap<String, FunctionDefinition>,

    #[serde(flatten)]
    pub extra: ExtraFields,
}

/// The two accepted shapes of the `service` key
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ServiceName {
    Plain(String),
    Detailed {
        name: String,
        #[serde(flatten)]
        extra: ExtraFields,
    },
}

/// Provider section
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Platform name: aws, google, azure, ...
    #[serde(default)]
    pub name: String,

    #[serde(flatten)]
    pub extra: ExtraFields,
}

/// Service-level `package` section
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServicePackage {
    /// Package every function on its own
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub individually: Option<bool>,

    /// Shared service artifact (only consulted by some platforms)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact: Option<String>,

    #[serde(flatten)]
    pub extra: ExtraFields,
}

/// A single function entry
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FunctionDefinition {
    /// Handler reference, e.g. `src/orders.create`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub handler: Option<String>,

    /// Artifact location used by host versions before 1.18
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact: Option<String>,

    /// Per-function packaging configuration
    #[serde(skip_serializing_if = "Option::is_none")]
    pub package: Option<FunctionPackage>,

    #[serde(flatten)]
    pub extra: ExtraFields,
}

/// Per-function `package` section
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FunctionPackage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact: Option<String>,

    /// Tells the host tool not to run its own packaging
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disable: Option<bool>,

    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl ServiceName {
    pub fn as_str(&self) -> &str {
        match self {
            ServiceName::Plain(name) => name,
            ServiceName::Detailed { name, .. } => name,
        }
    }
}

impl ServiceManifest {
    /// Parse a manifest from YAML content
    pub fn parse(yaml: &str) -> Result<Self, ManifestError> {
        let expanded = expand_env_vars(yaml);
        serde_yaml::from_str(&expanded).map_err(ManifestError::Parse)
    }

    /// Load a manifest from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ManifestError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ManifestError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content)
    }

    /// Serialize the manifest back to YAML
    pub fn to_yaml(&self) -> Result<String, ManifestError> {
        serde_yaml::to_string(self).map_err(ManifestError::Serialize)
    }

    /// Write the manifest to a file, creating parent directories as needed
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ManifestError> {
        let path = path.as_ref();
        let yaml = self.to_yaml()?;
        let write_err = |source| ManifestError::Write {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }
        std::fs::write(path, yaml).map_err(write_err)
    }

    /// Display name of the service
    pub fn service_name(&self) -> &str {
        self.service.as_str()
    }

    /// `package.individually`, false when absent
    pub fn package_individually(&self) -> bool {
        self.package
            .as_ref()
            .and_then(|p| p.individually)
            .unwrap_or(false)
    }

    /// Provider name, if a provider section exists
    pub fn provider_name(&self) -> Option<&str> {
        self.provider.as_ref().map(|p| p.name.as_str())
    }

    /// Names of all functions, in stable (sorted) order
    pub fn function_names(&self) -> Vec<String> {
        self.functions.keys().cloned().collect()
    }

    pub fn function(&self, name: &str) -> Option<&FunctionDefinition> {
        self.functions.get(name)
    }

    pub fn function_mut(&mut self, name: &str) -> Option<&mut FunctionDefinition> {
        self.functions.get_mut(name)
    }

    /// Set the service-level `package.artifact`
    pub fn set_service_artifact(&mut self, artifact: impl Into<String>) {
        self.package.get_or_insert_with(Default::default).artifact = Some(artifact.into());
    }

    /// Service-level `package.artifact`, if set
    pub fn service_artifact(&self) -> Option<&str> {
        self.package.as_ref().and_then(|p| p.artifact.as_deref())
    }
}

/// Expand environment variables in a string
/// Supports: ${VAR}, ${VAR:-default}
///
/// Host variable syntax like `${env:VAR}` or `${self:custom.x}` does not match
/// and is passed through untouched.
fn expand_env_vars(input: &str) -> String {
    static PATTERN: OnceLock<regex_lite::Regex> = OnceLock::new();
    let re = PATTERN.get_or_init(|| {
        regex_lite::Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)(?::-([^}]*))?\}")
            .expect("env var pattern is valid")
    });

    re.replace_all(input, |caps: &regex_lite::Captures<'_>| {
        let var_name = &caps[1];
        let default = caps.get(2).map(|m| m.as_str());

        std::env::var(var_name).unwrap_or_else(|_| default.unwrap_or("").to_string())
    })
    .to_string()
}
