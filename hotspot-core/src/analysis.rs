//! Pure identification, grouping and scoring without persistence.

use chrono::{DateTime, Utc};
use log::debug;

use crate::{
    Hotspot, LandmarkCandidate, LandmarkIdentifier, PhotoRecord, PipelineConfig, SpatialGrouper,
    SpotScorer,
};

/// A hotspot with its engine score.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredHotspot {
    /// The grouped photos.
    pub hotspot: Hotspot,
    /// Score of the hotspot's photos.
    pub score: f64,
}

/// A landmark with its engine score and scored hotspots.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredLandmark {
    /// The landmark and all of its photos.
    pub landmark: LandmarkCandidate,
    /// Score of the landmark's photos.
    pub score: f64,
    /// Hotspots in grouper order.
    pub hotspots: Vec<ScoredHotspot>,
}

/// Identification and grouping stages bundled together.
#[derive(Debug, Clone)]
pub struct HotspotAnalyser {
    identifier: LandmarkIdentifier,
    grouper: SpatialGrouper,
}

impl HotspotAnalyser {
    /// Combine an identifier and a grouper.
    #[must_use]
    pub const fn new(identifier: LandmarkIdentifier, grouper: SpatialGrouper) -> Self {
        Self {
            identifier,
            grouper,
        }
    }

    /// Build both stages from pipeline configuration.
    #[must_use]
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(
            LandmarkIdentifier::from_config(config),
            SpatialGrouper::from_config(config),
        )
    }

    /// Ranked landmark candidates for `photos`.
    #[must_use]
    pub fn landmarks(&self, photos: &[PhotoRecord]) -> Vec<LandmarkCandidate> {
        self.identifier.identify(photos)
    }

    /// Group and score one landmark.
    #[must_use]
    pub fn score_landmark<C>(
        &self,
        landmark: LandmarkCandidate,
        scorer: &C,
        now: DateTime<Utc>,
    ) -> ScoredLandmark
    where
        C: SpotScorer + ?Sized,
    {
        let hotspots: Vec<ScoredHotspot> = self
            .grouper
            .group(&landmark)
            .into_iter()
            .map(|hotspot| {
                let score = scorer.score(&hotspot.photos, now);
                ScoredHotspot { hotspot, score }
            })
            .collect();
        debug!(
            "landmark {} has {} photos and {} hotspots",
            landmark.name,
            landmark.photo_count(),
            hotspots.len()
        );
        let score = scorer.score(&landmark.photos, now);
        ScoredLandmark {
            landmark,
            score,
            hotspots,
        }
    }

    /// Identify, group and score every landmark in `photos`.
    #[must_use]
    pub fn analyse<C>(
        &self,
        photos: &[PhotoRecord],
        scorer: &C,
        now: DateTime<Utc>,
    ) -> Vec<ScoredLandmark>
    where
        C: SpotScorer + ?Sized,
    {
        self.landmarks(photos)
            .into_iter()
            .map(|landmark| self.score_landmark(landmark, scorer, now))
            .collect()
    }
}

impl Default for HotspotAnalyser {
    fn default() -> Self {
        Self::from_config(&PipelineConfig::default())
    }
}
