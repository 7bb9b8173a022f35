//! Command-line interface for seeding and inspecting photography hotspots.
//!
//! Two subcommands are provided:
//!
//! - `seed` fetches photos around a centre point, runs the pipeline and
//!   persists landmarks, hotspots and photo links into SQLite.
//! - `cluster` analyses a JSON snapshot of photo records offline and prints
//!   the ranked landmarks with their hotspots, without touching a store.
//!
//! Every option may also come from a configuration file or a `HOTSPOTS_*`
//! environment variable; `ortho_config` merges the layers with the command
//! line taking precedence.
#![forbid(unsafe_code)]

use clap::{Parser, Subcommand};

mod cluster;
mod error;
mod files;
mod knobs;
mod seed;

pub use error::CliError;

use cluster::{ClusterArgs, run_cluster};
use seed::{SeedArgs, run_seed};

pub(crate) const ARG_LATITUDE: &str = "lat";
pub(crate) const ARG_LONGITUDE: &str = "lng";
pub(crate) const ARG_RADIUS: &str = "radius";
pub(crate) const ARG_PHOTOS: &str = "photos";
pub(crate) const ARG_FLICKR_API_KEY: &str = "flickr-api-key";
pub(crate) const ARG_FLICKR_BASE_URL: &str = "flickr-base-url";
pub(crate) const ARG_FLICKR_PER_PAGE: &str = "flickr-per-page";
pub(crate) const ARG_FLICKR_MAX_PAGES: &str = "flickr-max-pages";
pub(crate) const ARG_DATABASE: &str = "database";
pub(crate) const ARG_OUTPUT: &str = "output";
pub(crate) const ARG_SNAPSHOT: &str = "snapshot";
pub(crate) const ARG_AS_OF: &str = "as-of";
pub(crate) const ARG_MIN_LANDMARK_PHOTOS: &str = "min-landmark-photos";
pub(crate) const ARG_MIN_HOTSPOT_PHOTOS: &str = "min-hotspot-photos";
pub(crate) const ARG_PRECISION: &str = "precision";
pub(crate) const ARG_RECENCY_DAYS: &str = "recency-days";
pub(crate) const ARG_CONCURRENCY: &str = "concurrency";
pub(crate) const ARG_MAX_LANDMARKS: &str = "max-landmarks";
pub(crate) const ARG_STRICT_TAGS: &str = "strict-tags";
pub(crate) const ARG_STOP_WORDS: &str = "stop-words";
pub(crate) const ARG_SOURCE_NAME: &str = "source-name";
pub(crate) const ARG_WEIGHT_COUNT: &str = "weight-count";
pub(crate) const ARG_WEIGHT_FAVORITES: &str = "weight-favorites";
pub(crate) const ARG_WEIGHT_VIEWS: &str = "weight-views";
pub(crate) const ARG_WEIGHT_RECENCY: &str = "weight-recency";
pub(crate) const ARG_WEIGHT_DUPLICATE: &str = "weight-duplicate";

pub(crate) const ENV_SEED_LATITUDE: &str = "HOTSPOTS_CMDS_SEED_LATITUDE";
pub(crate) const ENV_SEED_LONGITUDE: &str = "HOTSPOTS_CMDS_SEED_LONGITUDE";
pub(crate) const ENV_SEED_FLICKR_API_KEY: &str = "HOTSPOTS_CMDS_SEED_FLICKR_API_KEY";
pub(crate) const ENV_CLUSTER_SNAPSHOT: &str = "HOTSPOTS_CMDS_CLUSTER_SNAPSHOT";

/// Database written by `seed` when no path is configured.
pub const DEFAULT_DATABASE: &str = "hotspots.db";
/// Search radius used by `seed` when none is configured.
pub const DEFAULT_RADIUS_METERS: f64 = 1_500.0;

/// Run the CLI with the current process arguments and environment.
///
/// # Errors
///
/// Returns [`CliError`] when arguments or configuration are invalid, when a
/// collaborator cannot be built, or when a run completes only partially.
pub fn run() -> Result<(), CliError> {
    let cli = Cli::try_parse().map_err(CliError::ArgumentParsing)?;
    match cli.command {
        Command::Seed(args) => run_seed(args),
        Command::Cluster(args) => run_cluster(args),
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "hotspots",
    about = "Find and store the places photographers shoot landmarks from",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Fetch photos for a region and persist landmarks and hotspots.
    Seed(SeedArgs),
    /// Analyse a photo snapshot offline and print the ranked landmarks.
    Cluster(ClusterArgs),
}

#[cfg(test)]
mod tests;
