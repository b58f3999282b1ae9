//! Compiled units handed over by the bundling step

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Function a compiled unit was built for
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryFunction {
    /// Function name, as keyed in the manifest's `functions` section
    pub name: String,

    /// Handler reference the unit was bundled from (if known)
    #[serde(default)]
    pub handler: Option<String>,
}

/// One compilation result: a directory of files ready to be archived
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompiledUnit {
    /// Position in the compilation sequence
    pub index: usize,

    /// Directory the bundler wrote its output to
    pub output_path: PathBuf,

    /// Set when the unit belongs to a single function; `None` means the
    /// unit represents the whole service
    #[serde(default)]
    pub entry_function: Option<EntryFunction>,
}

impl EntryFunction {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            handler: None,
        }
    }

    pub fn with_handler(mut self, handler: impl Into<String>) -> Self {
        self.handler = Some(handler.into());
        self
    }
}

impl CompiledUnit {
    /// A whole-service unit
    pub fn new(index: usize, output_path: impl Into<PathBuf>) -> Self {
        Self {
            index,
            output_path: output_path.into(),
            entry_function: None,
        }
    }

    /// Attach the function this unit was compiled for
    pub fn with_entry_function(mut self, entry: EntryFunction) -> Self {
        self.entry_function = Some(entry);
        self
    }

    /// Archive file name: `<function>.zip`, or `<service>.zip` for a whole-service unit
    pub fn archive_name(&self, service_name: &str) -> String {
        let stem = self
            .entry_function
            .as_ref()
            .map(|f| f.name.as_str())
            .unwrap_or(service_name);
        format!("{}.zip", stem)
    }

    /// "function" or "service", used in diagnostics
    pub fn kind(&self) -> &'static str {
        if self.entry_function.is_some() {
            "function"
        } else {
            "service"
        }
    }
}
