//! Edge Packager - Main entry point
//!
//! Packages the bundler's output for one service:
//! - Reads the service manifest and packaging mode
//! - Zips each compiled unit into the staging directory
//! - Writes the manifest back with the artifact locations filled in

use anyhow::{Context, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use edge_packager::{discover_units, AppConfig, HostVersion, Packager, PackagerOptions};
use edge_packager_model::ServiceManifest;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "info,edge_packager=debug".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let mut config = AppConfig::from_env();
    config.service_path = std::fs::canonicalize(&config.service_path)
        .with_context(|| format!("Service path not found: {:?}", config.service_path))?;
    tracing::info!("Configuration loaded: {:?}", config);

    let host_version = HostVersion::parse(&config.host_version)?;

    let manifest_file = config.manifest_file();
    let mut manifest = ServiceManifest::load(&manifest_file)
        .with_context(|| format!("Failed to load manifest {:?}", manifest_file))?;

    let units = discover_units(&config.build_root(), &manifest)?;

    let packager = Packager::new(
        PackagerOptions {
            service_path: config.service_path.clone(),
            staging_dir: config.staging_dir.clone(),
            verbose: config.verbose,
        },
        host_version,
    );
    let artifacts = packager
        .run(&units, &mut manifest)
        .await
        .context("Packaging failed")?;

    let manifest_out = config.manifest_out_file();
    manifest
        .save(&manifest_out)
        .with_context(|| format!("Failed to write manifest {:?}", manifest_out))?;

    tracing::info!(
        "Packaged {} artifact(s) for {}, manifest written to {:?}",
        artifacts.len(),
        manifest.service_name(),
        manifest_out
    );

    let summary = serde_json::json!({
        "service": manifest.service_name(),
        "manifest": manifest_out,
        "artifacts": artifacts
            .iter()
            .map(|a| serde_json::json!({
                "unit": a.unit_index,
                "path": a.relative_path,
                "created_at": a.created_at.to_rfc3339(),
            }))
            .collect::<Vec<_>>(),
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);

    Ok(())
}
