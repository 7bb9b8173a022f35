//! In-memory collaborators used by unit and behaviour tests.

use std::cell::RefCell;
use std::collections::{BTreeSet, HashSet};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::{
    FetchedPhotos, GatewayError, GridKey, HotspotId, HotspotUpsert, LandmarkId, LandmarkUpsert,
    PersistenceGateway, PhotoRecord, PhotoSource, PhotoSourceError, Region, SpotScorer,
};

/// Build a geolocated photo with a single tag and its own owner.
#[must_use]
pub fn photo_at(
    id: &str,
    tag: &str,
    latitude: f64,
    longitude: f64,
    uploaded_at: DateTime<Utc>,
) -> PhotoRecord {
    PhotoRecord::new(id, format!("owner-{id}"), uploaded_at)
        .with_position(latitude, longitude)
        .with_tags([tag])
}

/// `PhotoSource` returning a fixed list regardless of region.
#[derive(Debug, Default, Clone)]
pub struct MemoryPhotoSource {
    photos: Vec<PhotoRecord>,
    rejected: usize,
}

impl MemoryPhotoSource {
    /// Serve `photos` on every fetch.
    #[must_use]
    pub const fn new(photos: Vec<PhotoRecord>) -> Self {
        Self {
            photos,
            rejected: 0,
        }
    }

    /// Report `rejected` undecodable records alongside the photos.
    #[must_use]
    pub const fn with_rejected(mut self, rejected: usize) -> Self {
        self.rejected = rejected;
        self
    }
}

#[async_trait(?Send)]
impl PhotoSource for MemoryPhotoSource {
    async fn fetch(&self, _region: &Region) -> Result<Vec<PhotoRecord>, PhotoSourceError> {
        Ok(self.photos.clone())
    }

    async fn fetch_batch(&self, _region: &Region) -> Result<FetchedPhotos, PhotoSourceError> {
        Ok(FetchedPhotos {
            photos: self.photos.clone(),
            rejected: self.rejected,
        })
    }
}

/// `PhotoSource` that always fails with a network error.
#[derive(Debug, Default, Clone, Copy)]
pub struct FailingPhotoSource;

#[async_trait(?Send)]
impl PhotoSource for FailingPhotoSource {
    async fn fetch(&self, _region: &Region) -> Result<Vec<PhotoRecord>, PhotoSourceError> {
        Err(PhotoSourceError::Network {
            url: "memory://photos".to_owned(),
            message: "connection refused".to_owned(),
        })
    }
}

/// `SpotScorer` returning the photo count.
#[derive(Debug, Default, Clone, Copy)]
pub struct CountScorer;

impl SpotScorer for CountScorer {
    #[expect(
        clippy::cast_precision_loss,
        reason = "test photo counts are tiny"
    )]
    fn score(&self, photos: &[PhotoRecord], _now: DateTime<Utc>) -> f64 {
        photos.len() as f64
    }
}

#[derive(Debug, Default)]
struct StoredLandmark {
    key: String,
    name: String,
    source: String,
    score: f64,
}

#[derive(Debug, Default)]
struct MemoryState {
    landmarks: Vec<StoredLandmark>,
    hotspots: Vec<(GridKey, String, LandmarkId, f64)>,
    photo_links: HashSet<(HotspotId, String)>,
}

/// `PersistenceGateway` keeping rows in memory with the same uniqueness
/// rules as a real store.
#[derive(Debug, Default)]
pub struct MemoryGateway {
    state: RefCell<MemoryState>,
    failing_landmark: Option<String>,
}

impl MemoryGateway {
    /// Reject every upsert of the landmark called `name`.
    #[must_use]
    pub fn failing_on(name: &str) -> Self {
        Self {
            state: RefCell::default(),
            failing_landmark: Some(name.to_owned()),
        }
    }

    /// Names of stored landmarks, sorted.
    #[must_use]
    pub fn landmark_names(&self) -> Vec<String> {
        self.state
            .borrow()
            .landmarks
            .iter()
            .map(|stored| stored.name.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Number of stored landmark rows.
    #[must_use]
    pub fn landmark_count(&self) -> usize {
        self.state.borrow().landmarks.len()
    }

    /// Stored score of the landmark called `name`.
    #[must_use]
    pub fn landmark_score(&self, name: &str) -> Option<f64> {
        self.state
            .borrow()
            .landmarks
            .iter()
            .find(|stored| stored.name == name)
            .map(|stored| stored.score)
    }

    /// Number of stored hotspots.
    #[must_use]
    pub fn hotspot_count(&self) -> usize {
        self.state.borrow().hotspots.len()
    }

    /// Number of stored photo links.
    #[must_use]
    pub fn photo_count(&self) -> usize {
        self.state.borrow().photo_links.len()
    }
}

#[async_trait(?Send)]
impl PersistenceGateway for MemoryGateway {
    async fn upsert_landmark(
        &self,
        landmark: &LandmarkUpsert<'_>,
    ) -> Result<LandmarkId, GatewayError> {
        let candidate = landmark.landmark;
        if self.failing_landmark.as_ref() == Some(&candidate.name) {
            return Err(GatewayError::Rejected {
                reason: format!("landmark {} is blocked", candidate.name),
            });
        }
        let mut state = self.state.borrow_mut();
        let existing = state
            .landmarks
            .iter()
            .position(|stored| stored.key == candidate.key && stored.source == landmark.source);
        let index = match existing {
            Some(index) => {
                if let Some(entry) = state.landmarks.get_mut(index) {
                    entry.name.clone_from(&candidate.name);
                    entry.score = landmark.score;
                }
                index
            }
            None => {
                state.landmarks.push(StoredLandmark {
                    key: candidate.key.clone(),
                    name: candidate.name.clone(),
                    source: landmark.source.to_owned(),
                    score: landmark.score,
                });
                state.landmarks.len() - 1
            }
        };
        Ok(LandmarkId(format!("landmark-{index}")))
    }

    async fn upsert_hotspot(
        &self,
        landmark_id: &LandmarkId,
        hotspot: &HotspotUpsert<'_>,
    ) -> Result<HotspotId, GatewayError> {
        let mut state = self.state.borrow_mut();
        let key = hotspot.hotspot.key;
        let existing = state
            .hotspots
            .iter()
            .position(|(stored, source, parent, _)| {
                *stored == key && source == hotspot.source && parent == landmark_id
            });
        let index = match existing {
            Some(index) => {
                if let Some(entry) = state.hotspots.get_mut(index) {
                    entry.3 = hotspot.score;
                }
                index
            }
            None => {
                state.hotspots.push((
                    key,
                    hotspot.source.to_owned(),
                    landmark_id.clone(),
                    hotspot.score,
                ));
                state.hotspots.len() - 1
            }
        };
        Ok(HotspotId(format!("hotspot-{index}")))
    }

    async fn insert_photos(
        &self,
        hotspot_id: &HotspotId,
        source: &str,
        photos: &[PhotoRecord],
    ) -> Result<usize, GatewayError> {
        let mut state = self.state.borrow_mut();
        Ok(photos
            .iter()
            .filter(|photo| {
                state
                    .photo_links
                    .insert((hotspot_id.clone(), format!("{source}:{}", photo.id)))
            })
            .count())
    }
}
