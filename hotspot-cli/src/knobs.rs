//! Pipeline tuning shared by the `seed` and `cluster` commands.

use hotspot_core::{PipelineConfig, ScoringWeights};

use crate::CliError;

/// Optional overrides of individual scoring weights.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub(crate) struct WeightKnobs {
    pub(crate) count: Option<f64>,
    pub(crate) favorites: Option<f64>,
    pub(crate) views: Option<f64>,
    pub(crate) recency: Option<f64>,
    pub(crate) duplicate: Option<f64>,
}

/// Optional overrides on top of [`PipelineConfig::default`].
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct PipelineKnobs {
    pub(crate) min_landmark_photos: Option<usize>,
    pub(crate) min_hotspot_photos: Option<usize>,
    pub(crate) precision: Option<u8>,
    pub(crate) recency_days: Option<u32>,
    pub(crate) concurrency: Option<usize>,
    pub(crate) max_landmarks: Option<usize>,
    pub(crate) strict_tags: Option<bool>,
    pub(crate) stop_words: Option<Vec<String>>,
    pub(crate) source_name: Option<String>,
    pub(crate) weights: WeightKnobs,
}

impl PipelineKnobs {
    /// Apply the overrides and validate the result.
    pub(crate) fn into_pipeline_config(self) -> Result<PipelineConfig, CliError> {
        let defaults = PipelineConfig::default();
        let base = defaults.scoring_weights;
        let scoring_weights = ScoringWeights {
            count: self.weights.count.unwrap_or(base.count),
            favorites: self.weights.favorites.unwrap_or(base.favorites),
            views: self.weights.views.unwrap_or(base.views),
            recency: self.weights.recency.unwrap_or(base.recency),
            duplicate: self.weights.duplicate.unwrap_or(base.duplicate),
        };
        let config = PipelineConfig {
            min_landmark_photo_count: self
                .min_landmark_photos
                .unwrap_or(defaults.min_landmark_photo_count),
            min_hotspot_photo_count: self
                .min_hotspot_photos
                .unwrap_or(defaults.min_hotspot_photo_count),
            coordinate_precision_decimals: self
                .precision
                .unwrap_or(defaults.coordinate_precision_decimals),
            recency_window_days: self.recency_days.unwrap_or(defaults.recency_window_days),
            scoring_weights,
            clustering_concurrency: self
                .concurrency
                .unwrap_or(defaults.clustering_concurrency),
            max_landmarks: self.max_landmarks.or(defaults.max_landmarks),
            strict_tag_heuristics: self
                .strict_tags
                .unwrap_or(defaults.strict_tag_heuristics),
            extra_stop_words: self.stop_words.unwrap_or(defaults.extra_stop_words),
            source_name: self.source_name.unwrap_or(defaults.source_name),
        };
        config.validate()?;
        Ok(config)
    }
}
