//! Seed command: fetch photos for a region and persist hotspots.

use std::convert::Infallible;
use std::fmt;
use std::io::Write;
use std::str::FromStr;

use async_trait::async_trait;
use camino::Utf8PathBuf;
use chrono::{DateTime, Utc};
use clap::Parser;
use hotspot_core::{
    FetchedPhotos, PhotoRecord, PhotoSource, PhotoSourceError, Pipeline, PipelineConfig, Region,
    RunReport,
};
use hotspot_data::{FlickrConfig, FlickrPhotoSource, JsonFilePhotoSource, SqliteGateway};
use hotspot_scorer::ScoringEngine;
use log::info;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};

use crate::files::{require_existing, write_json};
use crate::knobs::{PipelineKnobs, WeightKnobs};
use crate::{
    ARG_CONCURRENCY, ARG_DATABASE, ARG_FLICKR_API_KEY, ARG_FLICKR_BASE_URL, ARG_FLICKR_MAX_PAGES,
    ARG_FLICKR_PER_PAGE, ARG_LATITUDE, ARG_LONGITUDE, ARG_MAX_LANDMARKS, ARG_MIN_HOTSPOT_PHOTOS,
    ARG_MIN_LANDMARK_PHOTOS, ARG_OUTPUT, ARG_PHOTOS, ARG_PRECISION, ARG_RADIUS, ARG_RECENCY_DAYS,
    ARG_SOURCE_NAME, ARG_STOP_WORDS, ARG_STRICT_TAGS, ARG_WEIGHT_COUNT, ARG_WEIGHT_DUPLICATE,
    ARG_WEIGHT_FAVORITES, ARG_WEIGHT_RECENCY, ARG_WEIGHT_VIEWS, CliError, DEFAULT_DATABASE,
    DEFAULT_RADIUS_METERS, ENV_SEED_FLICKR_API_KEY, ENV_SEED_LATITUDE, ENV_SEED_LONGITUDE,
};

/// A Flickr API key that never shows up in debug output.
#[derive(Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(transparent)]
pub(crate) struct ApiKey(String);

impl ApiKey {
    pub(crate) fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(<redacted>)")
    }
}

impl FromStr for ApiKey {
    type Err = Infallible;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Ok(Self(value.to_owned()))
    }
}

/// CLI arguments for the `seed` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Fetch geotagged photos around a centre point, identify the \
                 landmarks they show, group each landmark's photos into \
                 shooting positions and store the result in SQLite. Photos \
                 come from a JSON snapshot when --photos is given and from \
                 the Flickr API otherwise.",
    about = "Seed the hotspot store for one region",
    allow_negative_numbers = true
)]
#[ortho_config(prefix = "HOTSPOTS")]
pub(crate) struct SeedArgs {
    /// Latitude of the search centre in degrees.
    #[arg(long = ARG_LATITUDE, value_name = "degrees")]
    #[serde(default)]
    pub(crate) latitude: Option<f64>,
    /// Longitude of the search centre in degrees.
    #[arg(long = ARG_LONGITUDE, value_name = "degrees")]
    #[serde(default)]
    pub(crate) longitude: Option<f64>,
    /// Search radius in metres (default 1500).
    #[arg(long = ARG_RADIUS, value_name = "metres")]
    #[serde(default)]
    pub(crate) radius_meters: Option<f64>,
    /// JSON snapshot of photo records to use instead of Flickr.
    #[arg(long = ARG_PHOTOS, value_name = "path")]
    #[serde(default)]
    pub(crate) photos: Option<Utf8PathBuf>,
    /// Flickr API key.
    #[arg(long = ARG_FLICKR_API_KEY, value_name = "key")]
    #[serde(default)]
    pub(crate) flickr_api_key: Option<ApiKey>,
    /// Override the Flickr REST endpoint.
    #[arg(long = ARG_FLICKR_BASE_URL, value_name = "url")]
    #[serde(default)]
    pub(crate) flickr_base_url: Option<String>,
    /// Photos requested per Flickr page.
    #[arg(long = ARG_FLICKR_PER_PAGE, value_name = "count")]
    #[serde(default)]
    pub(crate) flickr_per_page: Option<u32>,
    /// Maximum Flickr pages fetched.
    #[arg(long = ARG_FLICKR_MAX_PAGES, value_name = "count")]
    #[serde(default)]
    pub(crate) flickr_max_pages: Option<u32>,
    /// SQLite database to seed (default `hotspots.db`).
    #[arg(long = ARG_DATABASE, value_name = "path")]
    #[serde(default)]
    pub(crate) database: Option<Utf8PathBuf>,
    /// Write the run report here instead of stdout.
    #[arg(long = ARG_OUTPUT, value_name = "path")]
    #[serde(default)]
    pub(crate) output: Option<Utf8PathBuf>,
    /// Photos a tag needs before it becomes a landmark.
    #[arg(long = ARG_MIN_LANDMARK_PHOTOS, value_name = "count")]
    #[serde(default)]
    pub(crate) min_landmark_photos: Option<usize>,
    /// Photos a grid cell needs before it becomes a hotspot.
    #[arg(long = ARG_MIN_HOTSPOT_PHOTOS, value_name = "count")]
    #[serde(default)]
    pub(crate) min_hotspot_photos: Option<usize>,
    /// Decimal places of the grid used to group shooting positions.
    #[arg(long = ARG_PRECISION, value_name = "decimals")]
    #[serde(default)]
    pub(crate) precision: Option<u8>,
    /// Age in days under which photos earn the recency bonus.
    #[arg(long = ARG_RECENCY_DAYS, value_name = "days")]
    #[serde(default)]
    pub(crate) recency_days: Option<u32>,
    /// Landmarks processed at the same time.
    #[arg(long = ARG_CONCURRENCY, value_name = "count")]
    #[serde(default)]
    pub(crate) concurrency: Option<usize>,
    /// Keep only this many of the top-ranked landmarks.
    #[arg(long = ARG_MAX_LANDMARKS, value_name = "count")]
    #[serde(default)]
    pub(crate) max_landmarks: Option<usize>,
    /// Enable the stricter tag heuristics.
    #[arg(long = ARG_STRICT_TAGS, value_name = "bool")]
    #[serde(default)]
    pub(crate) strict_tags: Option<bool>,
    /// Extra tags to ignore, comma separated.
    #[arg(long = ARG_STOP_WORDS, value_name = "tags", value_delimiter = ',')]
    #[serde(default)]
    pub(crate) stop_words: Option<Vec<String>>,
    /// Label stored with every seeded spot (default `flickr`).
    #[arg(long = ARG_SOURCE_NAME, value_name = "name")]
    #[serde(default)]
    pub(crate) source_name: Option<String>,
    /// Weight of the photo count signal.
    #[arg(long = ARG_WEIGHT_COUNT, value_name = "weight")]
    #[serde(default)]
    pub(crate) weight_count: Option<f64>,
    /// Weight of the favourites signal.
    #[arg(long = ARG_WEIGHT_FAVORITES, value_name = "weight")]
    #[serde(default)]
    pub(crate) weight_favorites: Option<f64>,
    /// Weight of the views signal.
    #[arg(long = ARG_WEIGHT_VIEWS, value_name = "weight")]
    #[serde(default)]
    pub(crate) weight_views: Option<f64>,
    /// Weight of the recent-upload bonus.
    #[arg(long = ARG_WEIGHT_RECENCY, value_name = "weight")]
    #[serde(default)]
    pub(crate) weight_recency: Option<f64>,
    /// Weight of the penalty for repeat photos from one owner.
    #[arg(long = ARG_WEIGHT_DUPLICATE, value_name = "weight")]
    #[serde(default)]
    pub(crate) weight_duplicate: Option<f64>,
}

impl SeedArgs {
    pub(crate) fn into_config(self) -> Result<SeedConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        SeedConfig::try_from(merged)
    }
}

/// Where `seed` reads photos from.
#[derive(Debug, Clone)]
pub(crate) enum SeedSourceConfig {
    /// A JSON snapshot on disk.
    Snapshot(Utf8PathBuf),
    /// The Flickr search API.
    Flickr(FlickrConfig),
}

/// Resolved `seed` command configuration.
#[derive(Debug, Clone)]
pub(crate) struct SeedConfig {
    pub(crate) region: Region,
    pub(crate) source: SeedSourceConfig,
    pub(crate) database: Utf8PathBuf,
    pub(crate) output: Option<Utf8PathBuf>,
    pub(crate) pipeline: PipelineConfig,
}

impl SeedConfig {
    pub(crate) fn validate_sources(&self) -> Result<(), CliError> {
        match &self.source {
            SeedSourceConfig::Snapshot(path) => require_existing(path, ARG_PHOTOS),
            SeedSourceConfig::Flickr(_) => Ok(()),
        }
    }
}

impl TryFrom<SeedArgs> for SeedConfig {
    type Error = CliError;

    fn try_from(args: SeedArgs) -> Result<Self, Self::Error> {
        let latitude = args.latitude.ok_or(CliError::MissingArgument {
            field: ARG_LATITUDE,
            env: ENV_SEED_LATITUDE,
        })?;
        let longitude = args.longitude.ok_or(CliError::MissingArgument {
            field: ARG_LONGITUDE,
            env: ENV_SEED_LONGITUDE,
        })?;
        let radius = args.radius_meters.unwrap_or(DEFAULT_RADIUS_METERS);
        let region = Region::new(latitude, longitude, radius)?;

        let source = match (args.photos, args.flickr_api_key) {
            (Some(path), _) => SeedSourceConfig::Snapshot(path),
            (None, Some(key)) => {
                let mut flickr = FlickrConfig::new(key.expose());
                if let Some(base_url) = args.flickr_base_url {
                    flickr = flickr.with_base_url(base_url);
                }
                if let Some(per_page) = args.flickr_per_page {
                    flickr = flickr.with_per_page(per_page);
                }
                if let Some(max_pages) = args.flickr_max_pages {
                    flickr = flickr.with_max_pages(max_pages);
                }
                SeedSourceConfig::Flickr(flickr)
            }
            (None, None) => {
                return Err(CliError::MissingArgument {
                    field: ARG_FLICKR_API_KEY,
                    env: ENV_SEED_FLICKR_API_KEY,
                });
            }
        };

        let pipeline = PipelineKnobs {
            min_landmark_photos: args.min_landmark_photos,
            min_hotspot_photos: args.min_hotspot_photos,
            precision: args.precision,
            recency_days: args.recency_days,
            concurrency: args.concurrency,
            max_landmarks: args.max_landmarks,
            strict_tags: args.strict_tags,
            stop_words: args.stop_words,
            source_name: args.source_name,
            weights: WeightKnobs {
                count: args.weight_count,
                favorites: args.weight_favorites,
                views: args.weight_views,
                recency: args.weight_recency,
                duplicate: args.weight_duplicate,
            },
        }
        .into_pipeline_config()?;

        Ok(Self {
            region,
            source,
            database: args
                .database
                .unwrap_or_else(|| Utf8PathBuf::from(DEFAULT_DATABASE)),
            output: args.output,
            pipeline,
        })
    }
}

/// The photo source chosen for one seeding run.
#[derive(Debug)]
pub(crate) enum SeedSource {
    Snapshot(JsonFilePhotoSource),
    Flickr(FlickrPhotoSource),
}

impl SeedSource {
    pub(crate) fn build(config: &SeedSourceConfig) -> Result<Self, CliError> {
        Ok(match config {
            SeedSourceConfig::Snapshot(path) => {
                Self::Snapshot(JsonFilePhotoSource::new(path.clone()))
            }
            SeedSourceConfig::Flickr(flickr) => {
                Self::Flickr(FlickrPhotoSource::new(flickr.clone())?)
            }
        })
    }
}

#[async_trait(?Send)]
impl PhotoSource for SeedSource {
    async fn fetch(&self, region: &Region) -> Result<Vec<PhotoRecord>, PhotoSourceError> {
        match self {
            Self::Snapshot(source) => source.fetch(region).await,
            Self::Flickr(source) => source.fetch(region).await,
        }
    }

    async fn fetch_batch(&self, region: &Region) -> Result<FetchedPhotos, PhotoSourceError> {
        match self {
            Self::Snapshot(source) => source.fetch_batch(region).await,
            Self::Flickr(source) => source.fetch_batch(region).await,
        }
    }
}

pub(crate) fn run_seed(args: SeedArgs) -> Result<(), CliError> {
    let mut stdout = std::io::stdout().lock();
    run_seed_with(args, Utc::now(), &mut stdout)
}

/// Seed the store and write the run report.
///
/// The report is written even when the run is incomplete so callers can see
/// which landmarks failed; the error is returned afterwards.
pub(crate) fn run_seed_with(
    args: SeedArgs,
    now: DateTime<Utc>,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    let config = resolve_seed_config(args)?;
    let report = execute_seed(&config, now)?;
    write_json(writer, config.output.as_deref(), &report)?;
    check_report(&report)
}

fn resolve_seed_config(args: SeedArgs) -> Result<SeedConfig, CliError> {
    let config = args.into_config()?;
    config.validate_sources()?;
    Ok(config)
}

fn execute_seed(config: &SeedConfig, now: DateTime<Utc>) -> Result<RunReport, CliError> {
    let source = SeedSource::build(&config.source)?;
    let gateway = SqliteGateway::open(&config.database).map_err(|source| CliError::OpenStore {
        path: config.database.clone(),
        source: Box::new(source),
    })?;
    let scorer = ScoringEngine::from_config(&config.pipeline)?;
    let pipeline = Pipeline::new(config.pipeline.clone(), source, gateway, scorer)?;
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(CliError::Runtime)?;

    info!(
        "seeding {} within {} m of ({}, {})",
        config.database,
        config.region.radius_meters,
        config.region.latitude(),
        config.region.longitude()
    );
    let report = runtime.block_on(pipeline.run(&config.region, now));
    info!(
        "seeded {} landmark(s), {} hotspot(s), {} new photo link(s)",
        report.landmarks_processed, report.hotspots_created, report.photos_inserted
    );
    Ok(report)
}

fn check_report(report: &RunReport) -> Result<(), CliError> {
    if report.photo_source_failed {
        return Err(CliError::PhotoSourceFailed);
    }
    if report.landmarks_failed > 0 {
        return Err(CliError::LandmarksFailed {
            failed: report.landmarks_failed,
        });
    }
    Ok(())
}

#[cfg(test)]
pub(crate) fn config_from_layers_for_test(
    layers: Vec<ortho_config::MergeLayer<'static>>,
) -> Result<SeedConfig, CliError> {
    let merged = SeedArgs::merge_from_layers(layers).map_err(CliError::from)?;
    SeedConfig::try_from(merged)
}
