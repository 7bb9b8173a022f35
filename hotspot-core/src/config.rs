//! Pipeline tuning knobs and their validation.

use chrono::TimeDelta;
use thiserror::Error;

use crate::grouping::MAX_PRECISION;

/// Relative weights of the scoring signals.
///
/// Every weight defaults to `1.0` and must be finite and non-negative.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct ScoringWeights {
    /// Weight of `ln(1 + photo_count)`.
    pub count: f64,
    /// Weight of `ln(1 + total favourites)`.
    pub favorites: f64,
    /// Weight of `ln(1 + total views)`.
    pub views: f64,
    /// Weight per photo uploaded inside the recency window.
    pub recency: f64,
    /// Weight per photo beyond the first from the same owner.
    pub duplicate: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            count: 1.0,
            favorites: 1.0,
            views: 1.0,
            recency: 1.0,
            duplicate: 1.0,
        }
    }
}

impl ScoringWeights {
    /// Reject non-finite or negative weights.
    ///
    /// # Errors
    /// Returns [`ConfigError::InvalidWeight`] naming the first offending
    /// weight.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let named = [
            ("count", self.count),
            ("favorites", self.favorites),
            ("views", self.views),
            ("recency", self.recency),
            ("duplicate", self.duplicate),
        ];
        match named
            .into_iter()
            .find(|(_, value)| !value.is_finite() || *value < 0.0)
        {
            Some((field, value)) => Err(ConfigError::InvalidWeight { field, value }),
            None => Ok(()),
        }
    }
}

/// Configuration for a pipeline run.
///
/// # Examples
///
/// ```
/// use hotspot_core::PipelineConfig;
///
/// let config = PipelineConfig {
///     min_landmark_photo_count: 5,
///     ..PipelineConfig::default()
/// };
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct PipelineConfig {
    /// Photos a tag needs before it becomes a landmark.
    pub min_landmark_photo_count: usize,
    /// Photos a grid cell needs before it becomes a hotspot.
    pub min_hotspot_photo_count: usize,
    /// Decimal places of the precision grid, `0..=9`.
    pub coordinate_precision_decimals: u8,
    /// Age in days under which a photo earns the recency bonus.
    pub recency_window_days: u32,
    /// Scoring weights.
    pub scoring_weights: ScoringWeights,
    /// Landmarks processed at the same time.
    pub clustering_concurrency: usize,
    /// Keep only this many of the top-ranked landmarks.
    pub max_landmarks: Option<usize>,
    /// Enable the stricter tag heuristics.
    pub strict_tag_heuristics: bool,
    /// Stop words added to the default list.
    pub extra_stop_words: Vec<String>,
    /// Label stored with every persisted spot and photo key.
    pub source_name: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            min_landmark_photo_count: 10,
            min_hotspot_photo_count: 3,
            coordinate_precision_decimals: 4,
            recency_window_days: 365,
            scoring_weights: ScoringWeights::default(),
            clustering_concurrency: 4,
            max_landmarks: None,
            strict_tag_heuristics: false,
            extra_stop_words: Vec::new(),
            source_name: "flickr".to_owned(),
        }
    }
}

impl PipelineConfig {
    /// Check every value before a run starts.
    ///
    /// # Errors
    /// Returns the first [`ConfigError`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_landmark_photo_count == 0 {
            return Err(ConfigError::ZeroThreshold {
                field: "min_landmark_photo_count",
            });
        }
        if self.min_hotspot_photo_count == 0 {
            return Err(ConfigError::ZeroThreshold {
                field: "min_hotspot_photo_count",
            });
        }
        if self.coordinate_precision_decimals > MAX_PRECISION {
            return Err(ConfigError::PrecisionOutOfRange {
                precision: self.coordinate_precision_decimals,
                max: MAX_PRECISION,
            });
        }
        if self.recency_window_days == 0 {
            return Err(ConfigError::ZeroRecencyWindow);
        }
        if self.clustering_concurrency == 0 {
            return Err(ConfigError::ZeroConcurrency);
        }
        if self.max_landmarks == Some(0) {
            return Err(ConfigError::ZeroMaxLandmarks);
        }
        if self.source_name.trim().is_empty() {
            return Err(ConfigError::EmptySourceName);
        }
        self.scoring_weights.validate()
    }

    /// The recency window as a duration.
    #[must_use]
    pub fn recency_window(&self) -> TimeDelta {
        TimeDelta::days(i64::from(self.recency_window_days))
    }
}

/// Invalid configuration detected before any photo is processed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// A photo-count threshold is zero.
    #[error("{field} must be at least 1")]
    ZeroThreshold {
        /// Name of the offending setting.
        field: &'static str,
    },
    /// Grid precision exceeds the supported range.
    #[error("coordinate precision {precision} exceeds the maximum of {max}")]
    PrecisionOutOfRange {
        /// Requested decimal places.
        precision: u8,
        /// Largest supported decimal places.
        max: u8,
    },
    /// The recency window is empty or negative.
    #[error("recency window must be positive")]
    ZeroRecencyWindow,
    /// A scoring weight is negative or not finite.
    #[error("scoring weight {field} must be finite and non-negative, got {value}")]
    InvalidWeight {
        /// Name of the offending weight.
        field: &'static str,
        /// Value supplied.
        value: f64,
    },
    /// Concurrency is zero.
    #[error("clustering concurrency must be at least 1")]
    ZeroConcurrency,
    /// A landmark cap of zero would discard everything.
    #[error("max landmarks must be at least 1 when set")]
    ZeroMaxLandmarks,
    /// The source label is blank.
    #[error("source name must not be empty")]
    EmptySourceName,
}
