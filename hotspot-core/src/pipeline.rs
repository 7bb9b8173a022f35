//! End-to-end pipeline: fetch, validate, identify, group, score, persist.
//!
//! Landmarks are processed independently, at most
//! [`PipelineConfig::clustering_concurrency`] at a time. A persistence failure
//! for one landmark is recorded in the [`RunReport`] and never aborts the
//! others.

use chrono::{DateTime, Utc};
use futures_util::stream::{self, StreamExt};
use log::{info, warn};

use crate::{
    ConfigError, GatewayError, HotspotAnalyser, HotspotUpsert, LandmarkCandidate, LandmarkId,
    LandmarkUpsert, PersistenceGateway, PhotoRecord, PhotoSource, PipelineConfig, Region,
    ScoredLandmark, SpotScorer, validate_batch,
};

/// What happened to one landmark during a run.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize),
    serde(tag = "status", rename_all = "snake_case")
)]
pub enum LandmarkOutcome {
    /// The landmark, its hotspots and their photos were stored.
    Persisted {
        /// Landmark name.
        name: String,
        /// Identifier assigned by the gateway.
        landmark_id: LandmarkId,
        /// Landmark score.
        score: f64,
        /// Hotspots stored.
        hotspots: usize,
        /// Photos newly linked to those hotspots.
        photos_inserted: usize,
    },
    /// Persistence failed part-way through.
    Failed {
        /// Landmark name.
        name: String,
        /// Error text.
        error: String,
        /// Hotspots stored before the failure.
        hotspots_persisted: usize,
        /// Photos linked before the failure.
        photos_inserted: usize,
    },
}

impl LandmarkOutcome {
    /// Landmark name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Persisted { name, .. } | Self::Failed { name, .. } => name,
        }
    }

    /// Report whether persistence failed.
    #[must_use]
    pub const fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }

    const fn hotspot_count(&self) -> usize {
        match self {
            Self::Persisted { hotspots, .. }
            | Self::Failed {
                hotspots_persisted: hotspots,
                ..
            } => *hotspots,
        }
    }

    const fn photo_count(&self) -> usize {
        match self {
            Self::Persisted {
                photos_inserted, ..
            }
            | Self::Failed {
                photos_inserted, ..
            } => *photos_inserted,
        }
    }
}

/// Summary of a pipeline run.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct RunReport {
    /// Landmarks fully persisted.
    pub landmarks_processed: usize,
    /// Landmarks whose persistence failed.
    pub landmarks_failed: usize,
    /// Hotspots stored, including those stored before a failure.
    pub hotspots_created: usize,
    /// Photos newly linked to hotspots.
    pub photos_inserted: usize,
    /// Malformed records dropped by the source or at validation.
    pub records_dropped: usize,
    /// The photo source failed and nothing was processed.
    pub photo_source_failed: bool,
    /// Per-landmark outcomes in rank order.
    pub outcomes: Vec<LandmarkOutcome>,
}

impl RunReport {
    fn from_outcomes(outcomes: Vec<LandmarkOutcome>, records_dropped: usize) -> Self {
        let landmarks_failed = outcomes.iter().filter(|o| o.is_failed()).count();
        Self {
            landmarks_processed: outcomes.len() - landmarks_failed,
            landmarks_failed,
            hotspots_created: outcomes.iter().map(LandmarkOutcome::hotspot_count).sum(),
            photos_inserted: outcomes.iter().map(LandmarkOutcome::photo_count).sum(),
            records_dropped,
            photo_source_failed: false,
            outcomes,
        }
    }

    fn source_failed() -> Self {
        Self {
            photo_source_failed: true,
            ..Self::default()
        }
    }
}

/// Orchestrates a single seeding pass.
///
/// The pipeline is generic over its three collaborators: a photo source, a
/// persistence gateway and a spot scorer.
pub struct Pipeline<S, G, C>
where
    S: PhotoSource,
    G: PersistenceGateway,
    C: SpotScorer,
{
    config: PipelineConfig,
    analyser: HotspotAnalyser,
    source: S,
    gateway: G,
    scorer: C,
}

impl<S, G, C> Pipeline<S, G, C>
where
    S: PhotoSource,
    G: PersistenceGateway,
    C: SpotScorer,
{
    /// Validate `config` and assemble a pipeline.
    ///
    /// # Errors
    /// Returns [`ConfigError`] when any setting is invalid.
    pub fn new(
        config: PipelineConfig,
        source: S,
        gateway: G,
        scorer: C,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let analyser = HotspotAnalyser::from_config(&config);
        Ok(Self {
            config,
            analyser,
            source,
            gateway,
            scorer,
        })
    }

    /// The validated configuration.
    #[must_use]
    pub const fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// The persistence gateway.
    #[must_use]
    pub const fn gateway(&self) -> &G {
        &self.gateway
    }

    /// Validate, identify, group and score `photos` without persisting.
    #[must_use]
    pub fn analyse(&self, photos: Vec<PhotoRecord>, now: DateTime<Utc>) -> Vec<ScoredLandmark> {
        let batch = validate_batch(photos);
        self.analyser.analyse(&batch.photos, &self.scorer, now)
    }

    /// Run one pass over `region`.
    ///
    /// Source failures are logged and reported, not returned. Each landmark's
    /// persistence failure is recorded in its [`LandmarkOutcome`].
    pub async fn run(&self, region: &Region, now: DateTime<Utc>) -> RunReport {
        let fetched = match self.source.fetch_batch(region).await {
            Ok(fetched) => fetched,
            Err(err) => {
                warn!("photo source failed: {err}");
                return RunReport::source_failed();
            }
        };
        info!(
            "fetched {} photos ({} rejected by the source)",
            fetched.photos.len(),
            fetched.rejected
        );

        let batch = validate_batch(fetched.photos);
        let landmarks = self.analyser.landmarks(&batch.photos);
        info!("identified {} landmarks", landmarks.len());

        let mut ranked: Vec<(usize, LandmarkOutcome)> =
            stream::iter(landmarks.into_iter().enumerate())
                .map(|(rank, landmark)| async move { (rank, self.process(landmark, now).await) })
                .buffer_unordered(self.config.clustering_concurrency)
                .collect()
                .await;
        ranked.sort_by_key(|(rank, _)| *rank);

        let report = RunReport::from_outcomes(
            ranked.into_iter().map(|(_, outcome)| outcome).collect(),
            batch.dropped + fetched.rejected,
        );
        info!(
            "run complete: {} landmarks, {} failed, {} hotspots, {} photos",
            report.landmarks_processed,
            report.landmarks_failed,
            report.hotspots_created,
            report.photos_inserted
        );
        report
    }

    async fn process(&self, landmark: LandmarkCandidate, now: DateTime<Utc>) -> LandmarkOutcome {
        let scored = self.analyser.score_landmark(landmark, &self.scorer, now);
        let mut progress = Progress::default();
        match self.persist(&scored, &mut progress).await {
            Ok(landmark_id) => LandmarkOutcome::Persisted {
                name: scored.landmark.name,
                landmark_id,
                score: scored.score,
                hotspots: progress.hotspots,
                photos_inserted: progress.photos,
            },
            Err(err) => {
                warn!("failed to persist landmark {}: {err}", scored.landmark.name);
                LandmarkOutcome::Failed {
                    name: scored.landmark.name,
                    error: err.to_string(),
                    hotspots_persisted: progress.hotspots,
                    photos_inserted: progress.photos,
                }
            }
        }
    }

    async fn persist(
        &self,
        scored: &ScoredLandmark,
        progress: &mut Progress,
    ) -> Result<LandmarkId, GatewayError> {
        let source = self.config.source_name.as_str();
        let landmark_id = self
            .gateway
            .upsert_landmark(&LandmarkUpsert {
                landmark: &scored.landmark,
                source,
                representative_position: scored.landmark.representative_position(),
                cover_photo: scored.landmark.cover_photo(),
                score: scored.score,
            })
            .await?;

        for entry in &scored.hotspots {
            let hotspot_id = self
                .gateway
                .upsert_hotspot(
                    &landmark_id,
                    &HotspotUpsert {
                        hotspot: &entry.hotspot,
                        source,
                        cover_photo: entry.hotspot.cover_photo(),
                        score: entry.score,
                    },
                )
                .await?;
            progress.hotspots += 1;
            progress.photos += self
                .gateway
                .insert_photos(&hotspot_id, source, &entry.hotspot.photos)
                .await?;
        }
        Ok(landmark_id)
    }
}

#[derive(Debug, Default)]
struct Progress {
    hotspots: usize,
    photos: usize,
}

#[cfg(test)]
#[expect(clippy::expect_used, reason = "tests should fail fast when setup breaks")]
mod tests {
    use super::*;
    use crate::test_support::{
        CountScorer, FailingPhotoSource, MemoryGateway, MemoryPhotoSource, photo_at,
    };
    use chrono::TimeZone;
    use rstest::{fixture, rstest};

    #[fixture]
    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0)
            .single()
            .expect("valid timestamp")
    }

    #[fixture]
    fn region() -> Region {
        Region::new(43.6677, -79.3947, 5_000.0).expect("region")
    }

    fn config() -> PipelineConfig {
        PipelineConfig {
            min_landmark_photo_count: 3,
            ..PipelineConfig::default()
        }
    }

    fn photos(now: DateTime<Utc>) -> Vec<PhotoRecord> {
        let mut photos: Vec<_> = (0..4)
            .map(|i| photo_at(&format!("rom{i}"), "rom", 43.6677, -79.3947, now))
            .collect();
        photos.extend(
            (0..3).map(|i| photo_at(&format!("cas{i}"), "casaloma", 43.678, -79.409, now)),
        );
        photos
    }

    #[rstest]
    fn rejects_invalid_configuration() {
        let config = PipelineConfig {
            clustering_concurrency: 0,
            ..PipelineConfig::default()
        };
        let result = Pipeline::new(
            config,
            MemoryPhotoSource::default(),
            MemoryGateway::default(),
            CountScorer,
        );
        assert!(matches!(result, Err(ConfigError::ZeroConcurrency)));
    }

    #[rstest]
    #[tokio::test]
    async fn persists_landmarks_hotspots_and_photos(now: DateTime<Utc>, region: Region) {
        let pipeline = Pipeline::new(
            config(),
            MemoryPhotoSource::new(photos(now)),
            MemoryGateway::default(),
            CountScorer,
        )
        .expect("pipeline");

        let report = pipeline.run(&region, now).await;

        assert_eq!(report.landmarks_processed, 2);
        assert_eq!(report.landmarks_failed, 0);
        assert_eq!(report.hotspots_created, 2);
        assert_eq!(report.photos_inserted, 7);
        let names: Vec<_> = report.outcomes.iter().map(LandmarkOutcome::name).collect();
        assert_eq!(names, ["rom", "casaloma"]);
        assert_eq!(pipeline.gateway().landmark_names(), ["casaloma", "rom"]);
    }

    #[rstest]
    #[tokio::test]
    async fn rerun_inserts_no_duplicate_photos(now: DateTime<Utc>, region: Region) {
        let pipeline = Pipeline::new(
            config(),
            MemoryPhotoSource::new(photos(now)),
            MemoryGateway::default(),
            CountScorer,
        )
        .expect("pipeline");

        let first = pipeline.run(&region, now).await;
        let second = pipeline.run(&region, now).await;

        assert_eq!(first.photos_inserted, 7);
        assert_eq!(second.photos_inserted, 0);
        assert_eq!(second.landmarks_processed, 2);
        assert_eq!(pipeline.gateway().landmark_names().len(), 2);
    }

    #[rstest]
    #[tokio::test]
    async fn landmark_failure_does_not_stop_others(now: DateTime<Utc>, region: Region) {
        let pipeline = Pipeline::new(
            config(),
            MemoryPhotoSource::new(photos(now)),
            MemoryGateway::failing_on("rom"),
            CountScorer,
        )
        .expect("pipeline");

        let report = pipeline.run(&region, now).await;

        assert_eq!(report.landmarks_processed, 1);
        assert_eq!(report.landmarks_failed, 1);
        assert!(report.outcomes.first().is_some_and(LandmarkOutcome::is_failed));
        assert_eq!(pipeline.gateway().landmark_names(), ["casaloma"]);
    }

    #[rstest]
    #[tokio::test]
    async fn source_failure_is_reported(now: DateTime<Utc>, region: Region) {
        let pipeline = Pipeline::new(
            config(),
            FailingPhotoSource,
            MemoryGateway::default(),
            CountScorer,
        )
        .expect("pipeline");

        let report = pipeline.run(&region, now).await;

        assert!(report.photo_source_failed);
        assert_eq!(report.landmarks_processed, 0);
        assert!(report.outcomes.is_empty());
    }

    #[rstest]
    #[tokio::test]
    async fn malformed_records_are_counted(now: DateTime<Utc>, region: Region) {
        let mut input = photos(now);
        input.push(PhotoRecord::new("bad", "o", now).with_position(95.0, 0.0));
        let pipeline = Pipeline::new(
            config(),
            MemoryPhotoSource::new(input),
            MemoryGateway::default(),
            CountScorer,
        )
        .expect("pipeline");

        let report = pipeline.run(&region, now).await;

        assert_eq!(report.records_dropped, 1);
        assert_eq!(report.landmarks_processed, 2);
    }

    #[rstest]
    #[tokio::test]
    async fn source_rejections_add_to_dropped_records(now: DateTime<Utc>, region: Region) {
        let mut input = photos(now);
        input.push(PhotoRecord::new("bad", "o", now).with_position(95.0, 0.0));
        let pipeline = Pipeline::new(
            config(),
            MemoryPhotoSource::new(input).with_rejected(2),
            MemoryGateway::default(),
            CountScorer,
        )
        .expect("pipeline");

        let report = pipeline.run(&region, now).await;

        assert_eq!(report.records_dropped, 3);
        assert!(!report.photo_source_failed);
        assert_eq!(report.landmarks_processed, 2);
    }

    #[rstest]
    #[tokio::test]
    async fn tag_spellings_persist_as_one_landmark(now: DateTime<Utc>, region: Region) {
        let mut input: Vec<_> = (0..3)
            .map(|i| photo_at(&format!("upper{i}"), "CasaLoma", 43.678, -79.409, now))
            .collect();
        input.extend(
            (0..3).map(|i| photo_at(&format!("lower{i}"), "casaloma", 43.678, -79.409, now)),
        );
        let pipeline = Pipeline::new(
            config(),
            MemoryPhotoSource::new(input),
            MemoryGateway::default(),
            CountScorer,
        )
        .expect("pipeline");

        let report = pipeline.run(&region, now).await;

        assert_eq!(report.landmarks_processed, 1);
        assert_eq!(report.photos_inserted, 6);
        assert_eq!(pipeline.gateway().landmark_names(), ["CasaLoma"]);
    }

    #[rstest]
    fn analyse_skips_persistence(now: DateTime<Utc>) {
        let pipeline = Pipeline::new(
            config(),
            MemoryPhotoSource::default(),
            MemoryGateway::default(),
            CountScorer,
        )
        .expect("pipeline");

        let analysed = pipeline.analyse(photos(now), now);

        assert_eq!(analysed.len(), 2);
        assert!(pipeline.gateway().landmark_names().is_empty());
    }
}
