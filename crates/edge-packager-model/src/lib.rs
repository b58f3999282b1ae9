//! Edge Packager model - Types shared between the packager and its callers
//!
//! This crate describes the two things the packager works on:
//! - The service manifest it reads packaging settings from and writes artifact paths into
//! - The compiled units handed over by the bundling step

pub mod error;
pub mod manifest;
pub mod unit;

pub use error::ManifestError;
pub use manifest::{FunctionDefinition, FunctionPackage, ProviderConfig, ServiceManifest, ServicePackage};
pub use unit::{CompiledUnit, EntryFunction};
