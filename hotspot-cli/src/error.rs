//! Error types emitted by the hotspots CLI.
//!
//! Keep this error type reasonably small, as every command helper returns
//! `Result<_, CliError>` and the workspace enables `clippy::result_large_err`.

use std::sync::Arc;

use camino::Utf8PathBuf;
use hotspot_core::{ConfigError, PhotoSourceError, RegionError};
use hotspot_data::SqliteGatewayError;
use hotspot_data::flickr::FlickrBuildError;
use thiserror::Error;

/// Errors emitted by the hotspots CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// Provided arguments failed Clap validation.
    #[error(transparent)]
    ArgumentParsing(#[from] clap::Error),
    /// Configuration layering failed (files, env, CLI).
    #[error("failed to load configuration: {0}")]
    Configuration(#[from] Arc<ortho_config::OrthoError>),
    /// A required option is missing after configuration merging.
    #[error("missing {field} (set --{field} or {env})")]
    MissingArgument {
        /// Flag name without dashes.
        field: &'static str,
        /// Environment variable that can supply the value.
        env: &'static str,
    },
    /// A referenced input path does not exist on disk.
    #[error("{field} path {path:?} does not exist")]
    MissingSourceFile {
        /// Flag naming the path.
        field: &'static str,
        /// Path as configured.
        path: Utf8PathBuf,
    },
    /// A referenced input path exists but is not a file.
    #[error("{field} path {path:?} exists but is not a file")]
    SourcePathNotFile {
        /// Flag naming the path.
        field: &'static str,
        /// Path as configured.
        path: Utf8PathBuf,
    },
    /// A referenced input path could not be inspected due to an IO error.
    #[error("failed to inspect {field} path {path:?}: {source}")]
    InspectSourcePath {
        /// Flag naming the path.
        field: &'static str,
        /// Path as configured.
        path: Utf8PathBuf,
        /// Underlying failure.
        #[source]
        source: std::io::Error,
    },
    /// The search centre or radius is unusable.
    #[error(transparent)]
    InvalidRegion(#[from] RegionError),
    /// Pipeline settings failed validation.
    #[error("invalid pipeline settings: {0}")]
    InvalidPipelineConfig(#[from] ConfigError),
    /// The Flickr client could not be configured.
    #[error("failed to configure the Flickr photo source: {0}")]
    BuildFlickr(#[from] FlickrBuildError),
    /// The SQLite store could not be opened.
    #[error("failed to open hotspot store at {path:?}: {source}")]
    OpenStore {
        /// Database path.
        path: Utf8PathBuf,
        /// Underlying failure.
        #[source]
        source: Box<SqliteGatewayError>,
    },
    /// The async runtime could not be started.
    #[error("failed to start async runtime: {0}")]
    Runtime(#[source] std::io::Error),
    /// A photo snapshot could not be read.
    #[error("failed to load photo snapshot: {0}")]
    LoadSnapshot(#[source] PhotoSourceError),
    /// The photo source failed, so nothing was seeded.
    #[error("photo source failed; nothing was seeded")]
    PhotoSourceFailed,
    /// Some landmarks could not be persisted.
    #[error("{failed} landmark(s) failed to persist")]
    LandmarksFailed {
        /// Landmarks whose persistence failed.
        failed: usize,
    },
    /// Serialising command output failed.
    #[error("failed to serialise output: {0}")]
    SerialiseOutput(#[source] serde_json::Error),
    /// Writing command output failed.
    #[error("failed to write output: {0}")]
    WriteOutput(#[source] std::io::Error),
}
