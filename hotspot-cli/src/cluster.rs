//! Cluster command: offline analysis of a photo snapshot.

use std::io::Write;

use camino::Utf8PathBuf;
use chrono::{DateTime, Utc};
use clap::Parser;
use hotspot_core::{
    HotspotAnalyser, PhotoRecord, PipelineConfig, ScoredHotspot, ScoredLandmark, validate_batch,
};
use hotspot_data::JsonFilePhotoSource;
use hotspot_scorer::ScoringEngine;
use hotspot_scorer::presentation::PresentationScale;
use log::info;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};

use crate::files::{require_existing, write_json};
use crate::knobs::{PipelineKnobs, WeightKnobs};
use crate::{
    ARG_AS_OF, ARG_MAX_LANDMARKS, ARG_MIN_HOTSPOT_PHOTOS, ARG_MIN_LANDMARK_PHOTOS, ARG_OUTPUT,
    ARG_PRECISION, ARG_RECENCY_DAYS, ARG_SNAPSHOT, ARG_STOP_WORDS, ARG_STRICT_TAGS,
    ARG_WEIGHT_COUNT, ARG_WEIGHT_DUPLICATE, ARG_WEIGHT_FAVORITES, ARG_WEIGHT_RECENCY,
    ARG_WEIGHT_VIEWS, CliError, ENV_CLUSTER_SNAPSHOT,
};

/// CLI arguments for the `cluster` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Run landmark identification, grouping and scoring over a \
                 JSON snapshot of photo records and print the ranked result. \
                 Nothing is persisted, which makes this useful for tuning \
                 thresholds before seeding.",
    about = "Analyse a photo snapshot without persisting"
)]
#[ortho_config(prefix = "HOTSPOTS")]
pub(crate) struct ClusterArgs {
    /// JSON snapshot of photo records.
    #[arg(value_name = "path")]
    #[serde(default)]
    pub(crate) snapshot: Option<Utf8PathBuf>,
    /// Score recency against this instant instead of now (RFC 3339).
    #[arg(long = ARG_AS_OF, value_name = "timestamp")]
    #[serde(default)]
    pub(crate) as_of: Option<DateTime<Utc>>,
    /// Write the summary here instead of stdout.
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

impl ClusterArgs {
    pub(crate) fn into_config(self) -> Result<ClusterConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        ClusterConfig::try_from(merged)
    }
}

/// Resolved `cluster` command configuration.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ClusterConfig {
    pub(crate) snapshot: Utf8PathBuf,
    pub(crate) as_of: Option<DateTime<Utc>>,
    pub(crate) output: Option<Utf8PathBuf>,
    pub(crate) pipeline: PipelineConfig,
}

impl ClusterConfig {
    pub(crate) fn validate_sources(&self) -> Result<(), CliError> {
        require_existing(&self.snapshot, ARG_SNAPSHOT)
    }
}

impl TryFrom<ClusterArgs> for ClusterConfig {
    type Error = CliError;

    fn try_from(args: ClusterArgs) -> Result<Self, Self::Error> {
        let snapshot = args.snapshot.ok_or(CliError::MissingArgument {
            field: ARG_SNAPSHOT,
            env: ENV_CLUSTER_SNAPSHOT,
        })?;
        let pipeline = PipelineKnobs {
            min_landmark_photos: args.min_landmark_photos,
            min_hotspot_photos: args.min_hotspot_photos,
            precision: args.precision,
            recency_days: args.recency_days,
            max_landmarks: args.max_landmarks,
            strict_tags: args.strict_tags,
            stop_words: args.stop_words,
            weights: WeightKnobs {
                count: args.weight_count,
                favorites: args.weight_favorites,
                views: args.weight_views,
                recency: args.weight_recency,
                duplicate: args.weight_duplicate,
            },
            ..PipelineKnobs::default()
        }
        .into_pipeline_config()?;
        Ok(Self {
            snapshot,
            as_of: args.as_of,
            output: args.output,
            pipeline,
        })
    }
}

/// Ranked analysis of one snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct ClusterSummary {
    /// Instant recency was measured against.
    pub(crate) as_of: DateTime<Utc>,
    /// Records read from the snapshot.
    pub(crate) photos_loaded: usize,
    /// Records dropped as malformed.
    pub(crate) records_dropped: usize,
    /// Landmarks in rank order.
    pub(crate) landmarks: Vec<LandmarkSummary>,
}

/// One landmark in a [`ClusterSummary`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct LandmarkSummary {
    pub(crate) name: String,
    pub(crate) display_name: String,
    pub(crate) photo_count: usize,
    pub(crate) score: f64,
    pub(crate) display_score: f64,
    pub(crate) latitude: Option<f64>,
    pub(crate) longitude: Option<f64>,
    pub(crate) cover_photo: Option<String>,
    pub(crate) hotspots: Vec<HotspotSummary>,
}

/// One hotspot in a [`LandmarkSummary`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct HotspotSummary {
    pub(crate) latitude: f64,
    pub(crate) longitude: f64,
    pub(crate) photo_count: usize,
    pub(crate) score: f64,
    pub(crate) display_score: f64,
    pub(crate) cover_photo: Option<String>,
}

fn cover_url(photo: Option<&PhotoRecord>) -> Option<String> {
    photo.and_then(|photo| photo.image_url.clone())
}

impl LandmarkSummary {
    fn from_scored(scored: ScoredLandmark, scale: PresentationScale) -> Self {
        let position = scored.landmark.representative_position();
        let photo_count = scored.landmark.photo_count();
        Self {
            display_name: scored.landmark.display_name(),
            photo_count,
            score: scored.score,
            display_score: scale.landmark(photo_count),
            latitude: position.map(|coord| coord.y),
            longitude: position.map(|coord| coord.x),
            cover_photo: cover_url(scored.landmark.cover_photo()),
            hotspots: scored
                .hotspots
                .into_iter()
                .map(|hotspot| HotspotSummary::from_scored(&hotspot, scale))
                .collect(),
            name: scored.landmark.name,
        }
    }
}

impl HotspotSummary {
    fn from_scored(scored: &ScoredHotspot, scale: PresentationScale) -> Self {
        let position = scored.hotspot.position();
        let photo_count = scored.hotspot.photo_count();
        Self {
            latitude: position.y,
            longitude: position.x,
            photo_count,
            score: scored.score,
            display_score: scale.hotspot(photo_count),
            cover_photo: cover_url(scored.hotspot.cover_photo()),
        }
    }
}

pub(crate) fn run_cluster(args: ClusterArgs) -> Result<(), CliError> {
    let mut stdout = std::io::stdout().lock();
    run_cluster_with(args, Utc::now(), &mut stdout)
}

/// Analyse the configured snapshot and write the summary.
///
/// `now` is used unless the configuration pins `as_of`.
pub(crate) fn run_cluster_with(
    args: ClusterArgs,
    now: DateTime<Utc>,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    let config = args.into_config()?;
    config.validate_sources()?;
    let summary = execute_cluster(&config, config.as_of.unwrap_or(now))?;
    write_json(writer, config.output.as_deref(), &summary)
}

fn execute_cluster(config: &ClusterConfig, now: DateTime<Utc>) -> Result<ClusterSummary, CliError> {
    let fetched = JsonFilePhotoSource::new(config.snapshot.clone())
        .load()
        .map_err(CliError::LoadSnapshot)?;
    let photos_loaded = fetched.photos.len() + fetched.rejected;
    let batch = validate_batch(fetched.photos);
    let scorer = ScoringEngine::from_config(&config.pipeline)?;
    let analyser = HotspotAnalyser::from_config(&config.pipeline);
    let scale = PresentationScale::default();

    let landmarks: Vec<_> = analyser
        .analyse(&batch.photos, &scorer, now)
        .into_iter()
        .map(|scored| LandmarkSummary::from_scored(scored, scale))
        .collect();
    info!(
        "{} landmark(s) found in {photos_loaded} photo(s) from {}",
        landmarks.len(),
        config.snapshot
    );
    Ok(ClusterSummary {
        as_of: now,
        photos_loaded,
        records_dropped: batch.dropped + fetched.rejected,
        landmarks,
    })
}

#[cfg(test)]
pub(crate) fn config_from_layers_for_test(
    layers: Vec<ortho_config::MergeLayer<'static>>,
) -> Result<ClusterConfig, CliError> {
    let merged = ClusterArgs::merge_from_layers(layers).map_err(CliError::from)?;
    ClusterConfig::try_from(merged)
}
