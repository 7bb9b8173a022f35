//! Adapters connecting the hotspot pipeline to the outside world.
//!
//! Responsibilities:
//! - Fetch photos from Flickr ([`flickr::FlickrPhotoSource`]) or from a JSON
//!   snapshot on disk ([`JsonFilePhotoSource`]).
//! - Persist landmarks, hotspots and photos to SQLite
//!   ([`sqlite::SqliteGateway`]).
//!
//! Boundaries:
//! - Do not encode clustering or scoring rules (live in `hotspot-core` and
//!   `hotspot-scorer`).
//! - Deduplication of stored rows is owned by the gateway, not the pipeline.
//!
//! Invariants:
//! - No global mutable state.
//! - API keys never appear in errors or logs.
#![forbid(unsafe_code)]

pub mod flickr;
mod json_file;
pub mod sqlite;

pub use flickr::{FlickrConfig, FlickrPhotoSource};
pub use json_file::JsonFilePhotoSource;
pub use sqlite::{SqliteGateway, SqliteGatewayError, StoreSummary, StoredSpot};
