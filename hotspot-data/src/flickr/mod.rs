//! Flickr photo search adapter.
//!
//! [`FlickrPhotoSource`] implements [`hotspot_core::PhotoSource`] over the
//! `flickr.photos.search` REST method. Each call searches a circle around the
//! region centre for geotagged photos at street-level accuracy and converts
//! the listing into [`hotspot_core::PhotoRecord`] values. Records are not
//! validated here; the pipeline drops malformed ones at its boundary.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use hotspot_data::flickr::{FlickrConfig, FlickrPhotoSource};
//!
//! let config = FlickrConfig::new("api-key")
//!     .with_per_page(100)
//!     .with_timeout(Duration::from_secs(60));
//! let source = FlickrPhotoSource::new(config)?;
//! # Ok::<(), hotspot_data::flickr::FlickrBuildError>(())
//! ```

mod response;
mod source;

pub use response::{FlickrPhoto, NumberOrString, PhotoPage, SearchResponse};
pub use source::{
    DEFAULT_BASE_URL, DEFAULT_MAX_PAGES, DEFAULT_PER_PAGE, DEFAULT_USER_AGENT, FlickrBuildError,
    FlickrConfig, FlickrPhotoSource, MAX_PER_PAGE, MAX_RADIUS_KM,
};
