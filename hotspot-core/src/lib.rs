//! Core domain and pipeline for the photography hotspot engine.
//!
//! Photos are grouped twice. Tags name landmarks: a tag carried by enough
//! photos, and not on the stop-list, becomes a [`LandmarkCandidate`]. Each
//! landmark's photos are then snapped to a coordinate precision grid and
//! every sufficiently populated cell becomes a [`Hotspot`], a vantage point
//! from which several photographers captured the same subject.
//!
//! The crate owns the rules and defines the seams:
//! - [`PhotoSource`] supplies photos for a [`Region`].
//! - [`PersistenceGateway`] stores scored landmarks, hotspots and photos.
//! - [`SpotScorer`] ranks a spot from its photos.
//!
//! [`Pipeline`] wires the three together and returns a [`RunReport`].
//! The core is runtime-agnostic; hosts drive it on the executor of their
//! choice.

#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

mod analysis;
mod config;
mod gateway;
mod grouping;
mod landmark;
mod photo;
mod pipeline;
mod scorer;
mod source;
mod tags;

#[cfg(any(test, feature = "test-support"))]
#[cfg_attr(docsrs, doc(cfg(feature = "test-support")))]
pub mod test_support;

pub use analysis::{HotspotAnalyser, ScoredHotspot, ScoredLandmark};
pub use config::{ConfigError, PipelineConfig, ScoringWeights};
pub use gateway::{
    GatewayError, HotspotId, HotspotUpsert, LandmarkId, LandmarkUpsert, PersistenceGateway,
};
pub use grouping::{GridKey, Hotspot, MAX_PRECISION, SpatialGrouper};
pub use landmark::{LandmarkCandidate, LandmarkIdentifier, display_name};
pub use photo::{
    Engagement, PhotoRecord, PhotoRecordError, ValidatedBatch, validate_batch, validated_coord,
};
pub use pipeline::{LandmarkOutcome, Pipeline, RunReport};
pub use scorer::SpotScorer;
pub use source::{FetchedPhotos, PhotoSource, PhotoSourceError, Region, RegionError};
pub use tags::{DEFAULT_STOP_WORDS, MIN_TAG_CHARS, TagFilter};
