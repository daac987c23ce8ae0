pub mod artifact;
pub mod batch;
pub mod compare;
mod config;
pub mod crop;
pub mod error;
pub mod export;
pub mod geometry;
pub mod history;
pub mod ingest;
pub mod logging;
pub mod mask;
pub mod service;
pub mod session;
pub mod viewport;
pub mod workspace;

use std::path::PathBuf;

use export::FileExporter;

pub use error::{AppError, AppResult};
pub use workspace::Workspace;

/// Everything a front end needs to drive one editing session.
#[derive(Debug)]
pub struct App {
    pub workspace: Workspace,
    pub exporter: FileExporter,
    pub service_api_key: Option<String>,
}

/// Entrypoint used by higher-level integrations and CLI bindings: wires
/// logging and configuration into a ready workspace.
pub fn run() -> AppResult<App> {
    logging::init();
    tracing::info!("starting atelier");

    let config = config::load_app_config();
    if config.service_api_key.is_none() {
        tracing::warn!("no image service API key configured; external calls will fail");
    }
    let export_dir = config.export_dir.unwrap_or_else(default_export_dir);
    tracing::info!(export_dir = %export_dir.display(), "exports will be written here");

    let workspace = Workspace::new();
    tracing::info!("startup complete with mode={:?}", workspace.mode());
    Ok(App {
        workspace,
        exporter: FileExporter::with_dir(export_dir),
        service_api_key: config.service_api_key,
    })
}

fn default_export_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .map(|home| home.join("Pictures"))
        .unwrap_or_else(|| PathBuf::from("/tmp/atelier"))
}
