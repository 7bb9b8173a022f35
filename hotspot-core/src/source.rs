//! Where photos come from.
//!
//! A [`PhotoSource`] returns every photo it knows about inside a circular
//! [`Region`]. Implementations talk to remote APIs or read local files; the
//! pipeline treats them as opaque and never retries a failed fetch.

use async_trait::async_trait;
use geo::{Coord, Distance, Haversine, Point};
use thiserror::Error;

use crate::{PhotoRecord, validated_coord};

/// A circular search area.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Region {
    /// Centre with `x = longitude` and `y = latitude`.
    pub center: Coord<f64>,
    /// Search radius in metres.
    pub radius_meters: f64,
}

impl Region {
    /// Build a region from a centre and a radius in metres.
    ///
    /// # Errors
    /// Returns [`RegionError`] when the centre is out of range or the radius
    /// is not a positive finite number.
    ///
    /// # Examples
    ///
    /// ```
    /// use hotspot_core::Region;
    ///
    /// let region = Region::new(43.6532, -79.3832, 5_000.0)?;
    /// assert_eq!(region.latitude(), 43.6532);
    /// # Ok::<(), hotspot_core::RegionError>(())
    /// ```
    pub fn new(latitude: f64, longitude: f64, radius_meters: f64) -> Result<Self, RegionError> {
        let center = validated_coord(latitude, longitude).ok_or(RegionError::InvalidCenter {
            latitude,
            longitude,
        })?;
        if !radius_meters.is_finite() || radius_meters <= 0.0 {
            return Err(RegionError::InvalidRadius { radius_meters });
        }
        Ok(Self {
            center,
            radius_meters,
        })
    }

    /// Latitude of the centre.
    #[must_use]
    pub const fn latitude(&self) -> f64 {
        self.center.y
    }

    /// Longitude of the centre.
    #[must_use]
    pub const fn longitude(&self) -> f64 {
        self.center.x
    }

    /// Radius converted to kilometres.
    #[must_use]
    #[expect(clippy::float_arithmetic, reason = "unit conversion")]
    pub fn radius_km(&self) -> f64 {
        self.radius_meters / 1_000.0
    }

    /// Great-circle distance in metres from the centre to `coord`.
    #[must_use]
    pub fn distance_to(&self, coord: Coord<f64>) -> f64 {
        Haversine.distance(Point::from(self.center), Point::from(coord))
    }

    /// Report whether `coord` lies within the radius.
    #[must_use]
    pub fn contains(&self, coord: Coord<f64>) -> bool {
        self.distance_to(coord) <= self.radius_meters
    }
}

/// Reasons a [`Region`] cannot be built.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RegionError {
    /// The centre is not a valid WGS84 position.
    #[error("region centre ({latitude}, {longitude}) is out of range")]
    InvalidCenter {
        /// Latitude as supplied.
        latitude: f64,
        /// Longitude as supplied.
        longitude: f64,
    },
    /// The radius is zero, negative or not finite.
    #[error("region radius must be a positive number of metres, got {radius_meters}")]
    InvalidRadius {
        /// Radius as supplied.
        radius_meters: f64,
    },
}

/// Errors surfaced by a [`PhotoSource`].
#[derive(Debug, Error)]
pub enum PhotoSourceError {
    /// The request could not be sent or the connection dropped.
    #[error("network error calling {url}: {message}")]
    Network {
        /// Endpoint that failed.
        url: String,
        /// Transport error text.
        message: String,
    },
    /// The request timed out.
    #[error("request to {url} timed out")]
    Timeout {
        /// Endpoint that timed out.
        url: String,
    },
    /// The remote answered with a non-success HTTP status.
    #[error("{url} returned HTTP {status}: {message}")]
    Http {
        /// Endpoint that failed.
        url: String,
        /// HTTP status code.
        status: u16,
        /// Status text or body excerpt.
        message: String,
    },
    /// The remote reported an application-level failure.
    #[error("photo service error {code}: {message}")]
    Service {
        /// Service error code.
        code: i64,
        /// Service error message.
        message: String,
    },
    /// The payload could not be decoded.
    #[error("failed to decode photo payload: {message}")]
    Decode {
        /// Decoder error text.
        message: String,
    },
    /// A local file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// Path that failed.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The source was constructed with unusable settings.
    #[error("photo source misconfigured: {message}")]
    Configuration {
        /// Description of the problem.
        message: String,
    },
}

/// Supplies photo records for a region.
///
/// # Examples
///
/// ```
/// use async_trait::async_trait;
/// use hotspot_core::{PhotoRecord, PhotoSource, PhotoSourceError, Region};
///
/// struct Empty;
///
/// #[async_trait(?Send)]
/// impl PhotoSource for Empty {
///     async fn fetch(&self, _region: &Region) -> Result<Vec<PhotoRecord>, PhotoSourceError> {
///         Ok(Vec::new())
///     }
/// }
/// ```
#[async_trait(?Send)]
pub trait PhotoSource {
    /// Fetch every known photo inside `region`.
    async fn fetch(&self, region: &Region) -> Result<Vec<PhotoRecord>, PhotoSourceError>;

    /// Fetch photos together with the number of records the source had to
    /// reject before they became [`PhotoRecord`]s.
    ///
    /// The default reports no rejections. Sources that decode records one by
    /// one override this so undecodable records are counted, not fatal.
    async fn fetch_batch(&self, region: &Region) -> Result<FetchedPhotos, PhotoSourceError> {
        self.fetch(region).await.map(FetchedPhotos::from)
    }
}

/// Photos returned by [`PhotoSource::fetch_batch`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchedPhotos {
    /// Decoded photos.
    pub photos: Vec<PhotoRecord>,
    /// Records skipped because they could not be decoded.
    pub rejected: usize,
}

impl From<Vec<PhotoRecord>> for FetchedPhotos {
    fn from(photos: Vec<PhotoRecord>) -> Self {
        Self {
            photos,
            rejected: 0,
        }
    }
}
