//! Facade crate for the photography hotspot engine.
//!
//! This crate re-exports the core domain types and the scoring engine, and
//! exposes the Flickr, JSON snapshot and SQLite adapters behind the
//! `adapters` feature.
//!
//! # Examples
//!
//! ```
//! use hotspot_engine::{HotspotAnalyser, PipelineConfig, ScoringEngine};
//!
//! let config = PipelineConfig::default();
//! let scorer = ScoringEngine::from_config(&config)?;
//! let analyser = HotspotAnalyser::from_config(&config);
//! let ranked = analyser.analyse(&[], &scorer, chrono::Utc::now());
//! assert!(ranked.is_empty());
//! # Ok::<(), hotspot_engine::ConfigError>(())
//! ```

#![forbid(unsafe_code)]

pub use hotspot_core::{
    ConfigError, FetchedPhotos, GatewayError, GridKey, Hotspot, HotspotAnalyser, HotspotId,
    HotspotUpsert, LandmarkCandidate, LandmarkId, LandmarkIdentifier, LandmarkOutcome,
    LandmarkUpsert, PersistenceGateway, PhotoRecord, PhotoRecordError, PhotoSource,
    PhotoSourceError, Pipeline, PipelineConfig, Region, RegionError, RunReport, ScoredHotspot,
    ScoredLandmark, ScoringWeights, SpatialGrouper, SpotScorer, TagFilter, ValidatedBatch,
    validate_batch,
};
pub use hotspot_scorer::{ScoringEngine, presentation::PresentationScale};

#[cfg(feature = "adapters")]
pub use hotspot_data::{
    FlickrConfig, FlickrPhotoSource, JsonFilePhotoSource, SqliteGateway, SqliteGatewayError,
    StoreSummary, StoredSpot,
};
