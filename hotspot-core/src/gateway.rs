//! Persistence of scored landmarks, hotspots and their photos.
//!
//! Gateways own deduplication: landmarks are unique per `(key, source)`,
//! hotspots per `(position, source)` and photos per `(hotspot, external key)`.
//! Re-running the pipeline over the same input must not create duplicates.

use std::fmt;

use async_trait::async_trait;
use geo::Coord;
use thiserror::Error;

use crate::{Hotspot, LandmarkCandidate, PhotoRecord};

/// Identifier assigned to a persisted landmark.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(transparent)
)]
pub struct LandmarkId(pub String);

/// Identifier assigned to a persisted hotspot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(transparent)
)]
pub struct HotspotId(pub String);

impl fmt::Display for LandmarkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for HotspotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A scored landmark ready to persist.
#[derive(Debug, Clone, Copy)]
pub struct LandmarkUpsert<'a> {
    /// The landmark and its photos.
    pub landmark: &'a LandmarkCandidate,
    /// Label of the photo source.
    pub source: &'a str,
    /// Mean photographer position, when any photo is geolocated.
    pub representative_position: Option<Coord<f64>>,
    /// Photo used as the landmark's cover.
    pub cover_photo: Option<&'a PhotoRecord>,
    /// Engine score.
    pub score: f64,
}

/// A scored hotspot ready to persist.
#[derive(Debug, Clone, Copy)]
pub struct HotspotUpsert<'a> {
    /// The hotspot and its photos.
    pub hotspot: &'a Hotspot,
    /// Label of the photo source.
    pub source: &'a str,
    /// Photo used as the hotspot's cover.
    pub cover_photo: Option<&'a PhotoRecord>,
    /// Engine score.
    pub score: f64,
}

/// Storage failures reported by a [`PersistenceGateway`].
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The backing store failed.
    #[error("{operation} failed: {source}")]
    Storage {
        /// Operation that failed, e.g. `upsert landmark`.
        operation: &'static str,
        /// Underlying storage error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// The store refused the record.
    #[error("record rejected: {reason}")]
    Rejected {
        /// Description of the refusal.
        reason: String,
    },
}

impl GatewayError {
    /// Wrap a storage error with the operation that raised it.
    #[must_use]
    pub fn storage(
        operation: &'static str,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::Storage {
            operation,
            source: source.into(),
        }
    }
}

/// Writes pipeline output to durable storage.
#[async_trait(?Send)]
pub trait PersistenceGateway {
    /// Create or update the landmark keyed by `(key, source)`.
    async fn upsert_landmark(
        &self,
        landmark: &LandmarkUpsert<'_>,
    ) -> Result<LandmarkId, GatewayError>;

    /// Create or update the hotspot keyed by `(position, source)` beneath
    /// `landmark_id`.
    ///
    /// The key is scoped to the landmark: two landmarks photographed from the
    /// same grid cell own separate hotspots.
    async fn upsert_hotspot(
        &self,
        landmark_id: &LandmarkId,
        hotspot: &HotspotUpsert<'_>,
    ) -> Result<HotspotId, GatewayError>;

    /// Link photos to a hotspot, skipping those already linked.
    ///
    /// Returns the number of newly inserted photos.
    async fn insert_photos(
        &self,
        hotspot_id: &HotspotId,
        source: &str,
        photos: &[PhotoRecord],
    ) -> Result<usize, GatewayError>;
}
