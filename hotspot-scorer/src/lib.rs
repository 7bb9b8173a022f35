//! Spot scoring for the photography hotspot engine.
//!
//! [`ScoringEngine`] ranks a landmark or hotspot from the photos attached to
//! it:
//!
//! ```text
//! score = w_count     * ln(1 + photo_count)
//!       + w_favorites * ln(1 + favourites)
//!       + w_views     * ln(1 + views)
//!       + w_recency   * recent_photos
//!       - w_duplicate * duplicate_photos
//! ```
//!
//! Logarithms damp viral outliers. The duplicate term counts photos beyond
//! the first from each owner, so one prolific contributor cannot inflate a
//! spot. Scores are not normalised and may be negative; the
//! [`presentation`] module derives the bounded display value stored
//! alongside.
//!
//! # Examples
//!
//! ```
//! use chrono::{TimeDelta, Utc};
//! use hotspot_core::{PhotoRecord, ScoringWeights};
//! use hotspot_scorer::ScoringEngine;
//!
//! let engine = ScoringEngine::new(ScoringWeights::default(), TimeDelta::days(365))?;
//! let now = Utc::now();
//! let photos = vec![PhotoRecord::new("p1", "alice", now)];
//! let score = engine.score_photos(&photos, now);
//! assert!(score > 0.0);
//! # Ok::<(), hotspot_core::ConfigError>(())
//! ```

#![forbid(unsafe_code)]

use chrono::{DateTime, TimeDelta, Utc};
use hotspot_core::{ConfigError, PhotoRecord, PipelineConfig, SpotScorer};
use log::trace;

pub mod presentation;
mod signals;

pub use hotspot_core::ScoringWeights;
pub use signals::SpotSignals;

/// Weighted, log-scaled scoring of photo collections.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringEngine {
    weights: ScoringWeights,
    recency_window: TimeDelta,
}

impl ScoringEngine {
    /// Build an engine.
    ///
    /// # Errors
    /// Returns [`ConfigError::InvalidWeight`] for a negative or non-finite
    /// weight and [`ConfigError::ZeroRecencyWindow`] when the window is not
    /// positive.
    pub fn new(weights: ScoringWeights, recency_window: TimeDelta) -> Result<Self, ConfigError> {
        weights.validate()?;
        if recency_window <= TimeDelta::zero() {
            return Err(ConfigError::ZeroRecencyWindow);
        }
        Ok(Self {
            weights,
            recency_window,
        })
    }

    /// Build an engine from pipeline configuration.
    ///
    /// # Errors
    /// Propagates the errors of [`ScoringEngine::new`].
    pub fn from_config(config: &PipelineConfig) -> Result<Self, ConfigError> {
        Self::new(config.scoring_weights, config.recency_window())
    }

    /// The configured weights.
    #[must_use]
    pub const fn weights(&self) -> ScoringWeights {
        self.weights
    }

    /// Extract the raw signals for `photos`.
    #[must_use]
    pub fn signals(&self, photos: &[PhotoRecord], now: DateTime<Utc>) -> SpotSignals {
        SpotSignals::from_photos(photos, now, self.recency_window)
    }

    /// Score `photos` as of `now`.
    #[must_use]
    pub fn score_photos(&self, photos: &[PhotoRecord], now: DateTime<Utc>) -> f64 {
        let signals = self.signals(photos, now);
        let score = self.score_signals(&signals);
        trace!("scored {signals:?} as {score}");
        score
    }

    /// Combine pre-extracted signals into a score.
    #[must_use]
    #[expect(
        clippy::float_arithmetic,
        clippy::cast_precision_loss,
        reason = "the scoring formula is defined over floats"
    )]
    pub fn score_signals(&self, signals: &SpotSignals) -> f64 {
        let w = &self.weights;
        w.count * (signals.photo_count as f64).ln_1p()
            + w.favorites * (signals.favorites as f64).ln_1p()
            + w.views * (signals.views as f64).ln_1p()
            + w.recency * signals.recent as f64
            - w.duplicate * signals.duplicates as f64
    }
}

impl Default for ScoringEngine {
    fn default() -> Self {
        Self {
            weights: ScoringWeights::default(),
            recency_window: PipelineConfig::default().recency_window(),
        }
    }
}

impl SpotScorer for ScoringEngine {
    fn score(&self, photos: &[PhotoRecord], now: DateTime<Utc>) -> f64 {
        self.score_photos(photos, now)
    }
}

#[cfg(test)]
mod tests;
