//! Photo records supplied by a [`PhotoSource`](crate::PhotoSource).
//!
//! A record carries the photographer's position, not the subject's. Records
//! are plain data; [`validate_batch`] enforces coordinate ranges at the
//! pipeline boundary and drops anything malformed.

use chrono::{DateTime, Utc};
use geo::Coord;
use log::warn;
use thiserror::Error;

/// Engagement counters attached to a photo.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct Engagement {
    /// Number of times the photo was marked as a favourite.
    pub favorites: u64,
    /// Number of recorded views.
    pub views: u64,
}

impl Engagement {
    /// Build engagement counters from favourite and view totals.
    #[must_use]
    pub const fn new(favorites: u64, views: u64) -> Self {
        Self { favorites, views }
    }
}

/// A single geotagged photo.
///
/// `position` uses WGS84 with `x = longitude` and `y = latitude`. When
/// serialised, it is written as `{"latitude": .., "longitude": ..}`.
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use hotspot_core::PhotoRecord;
///
/// let uploaded = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
/// let photo = PhotoRecord::new("p1", "alice", uploaded)
///     .with_position(43.6677, -79.3947)
///     .with_tags(["rom", "museum"]);
///
/// assert_eq!(photo.latitude(), Some(43.6677));
/// assert_eq!(photo.tags.len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PhotoRecord {
    /// Opaque identifier assigned by the source.
    pub id: String,
    /// Identifier of the contributor.
    pub owner_id: String,
    /// Photographer position at capture time.
    #[cfg_attr(feature = "serde", serde(default, with = "lat_lng"))]
    pub position: Option<Coord<f64>>,
    /// Free-text tags as ingested.
    #[cfg_attr(feature = "serde", serde(default))]
    pub tags: Vec<String>,
    /// Favourite and view counters.
    #[cfg_attr(feature = "serde", serde(default))]
    pub engagement: Engagement,
    /// Upload timestamp.
    pub uploaded_at: DateTime<Utc>,
    /// Optional title.
    #[cfg_attr(feature = "serde", serde(default))]
    pub title: Option<String>,
    /// URL of a displayable rendition, when the source provides one.
    #[cfg_attr(feature = "serde", serde(default))]
    pub image_url: Option<String>,
}

impl PhotoRecord {
    /// Construct an untagged record without a position.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        owner_id: impl Into<String>,
        uploaded_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            owner_id: owner_id.into(),
            position: None,
            tags: Vec::new(),
            engagement: Engagement::default(),
            uploaded_at,
            title: None,
            image_url: None,
        }
    }

    /// Attach a photographer position given as latitude then longitude.
    #[must_use]
    pub const fn with_position(mut self, latitude: f64, longitude: f64) -> Self {
        self.position = Some(Coord {
            x: longitude,
            y: latitude,
        });
        self
    }

    /// Replace the tag list.
    #[must_use]
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Replace the engagement counters.
    #[must_use]
    pub const fn with_engagement(mut self, engagement: Engagement) -> Self {
        self.engagement = engagement;
        self
    }

    /// Set the title.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the image URL.
    #[must_use]
    pub fn with_image_url(mut self, url: impl Into<String>) -> Self {
        self.image_url = Some(url.into());
        self
    }

    /// Latitude of the photographer position, if known.
    #[must_use]
    pub fn latitude(&self) -> Option<f64> {
        self.position.map(|coord| coord.y)
    }

    /// Longitude of the photographer position, if known.
    #[must_use]
    pub fn longitude(&self) -> Option<f64> {
        self.position.map(|coord| coord.x)
    }

    /// Check identifier presence and coordinate ranges.
    ///
    /// # Errors
    /// Returns [`PhotoRecordError::MissingId`] for a blank identifier and
    /// [`PhotoRecordError::InvalidPosition`] when a position is present but
    /// non-finite or outside `[-90, 90]` / `[-180, 180]`.
    pub fn validate(&self) -> Result<(), PhotoRecordError> {
        if self.id.trim().is_empty() {
            return Err(PhotoRecordError::MissingId);
        }
        if let Some(coord) = self.position
            && validated_coord(coord.y, coord.x).is_none()
        {
            return Err(PhotoRecordError::InvalidPosition {
                id: self.id.clone(),
                latitude: coord.y,
                longitude: coord.x,
            });
        }
        Ok(())
    }
}

/// Reasons a [`PhotoRecord`] is rejected at the pipeline boundary.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PhotoRecordError {
    /// The record has an empty identifier.
    #[error("photo record has an empty identifier")]
    MissingId,
    /// The position is non-finite or out of range.
    #[error("photo {id} has an invalid position ({latitude}, {longitude})")]
    InvalidPosition {
        /// Identifier of the offending record.
        id: String,
        /// Latitude as supplied.
        latitude: f64,
        /// Longitude as supplied.
        longitude: f64,
    },
}

/// Records that passed validation plus the number dropped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidatedBatch {
    /// Records safe to feed into identification and grouping.
    pub photos: Vec<PhotoRecord>,
    /// Count of records dropped for failing [`PhotoRecord::validate`].
    pub dropped: usize,
}

/// Drop malformed records, logging each one.
///
/// Processing never aborts on a bad record; the count of dropped records is
/// returned alongside the survivors.
#[must_use]
pub fn validate_batch(records: Vec<PhotoRecord>) -> ValidatedBatch {
    let mut batch = ValidatedBatch {
        photos: Vec::with_capacity(records.len()),
        dropped: 0,
    };
    for record in records {
        match record.validate() {
            Ok(()) => batch.photos.push(record),
            Err(err) => {
                warn!("dropping photo record: {err}");
                batch.dropped += 1;
            }
        }
    }
    batch
}

/// Return a coordinate when latitude and longitude are finite and in range.
#[must_use]
pub fn validated_coord(latitude: f64, longitude: f64) -> Option<Coord<f64>> {
    (latitude.is_finite()
        && longitude.is_finite()
        && (-90.0..=90.0).contains(&latitude)
        && (-180.0..=180.0).contains(&longitude))
    .then_some(Coord {
        x: longitude,
        y: latitude,
    })
}

#[cfg(feature = "serde")]
mod lat_lng {
    use geo::Coord;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Serialize, Deserialize)]
    struct LatLng {
        latitude: f64,
        longitude: f64,
    }

    pub(super) fn serialize<S>(value: &Option<Coord<f64>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        value
            .map(|coord| LatLng {
                latitude: coord.y,
                longitude: coord.x,
            })
            .serialize(serializer)
    }

    pub(super) fn deserialize<'de, D>(deserializer: D) -> Result<Option<Coord<f64>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<LatLng>::deserialize(deserializer)?;
        Ok(raw.map(|pair| Coord {
            x: pair.longitude,
            y: pair.latitude,
        }))
    }
}

#[cfg(test)]
#[expect(
    clippy::expect_used,
    clippy::indexing_slicing,
    reason = "tests index known fixtures and fail fast when setup breaks"
)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rstest::{fixture, rstest};

    #[fixture]
    fn uploaded() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
            .single()
            .expect("valid timestamp")
    }

    #[rstest]
    fn accepts_record_without_position(uploaded: DateTime<Utc>) {
        let photo = PhotoRecord::new("p1", "owner", uploaded);
        assert_eq!(photo.validate(), Ok(()));
    }

    #[rstest]
    #[case(90.0, 180.0)]
    #[case(-90.0, -180.0)]
    #[case(43.6677, -79.3947)]
    fn accepts_in_range_positions(
        uploaded: DateTime<Utc>,
        #[case] latitude: f64,
        #[case] longitude: f64,
    ) {
        let photo = PhotoRecord::new("p1", "owner", uploaded).with_position(latitude, longitude);
        assert!(photo.validate().is_ok());
    }

    #[rstest]
    #[case(90.0001, 0.0)]
    #[case(0.0, -180.5)]
    #[case(f64::NAN, 0.0)]
    #[case(0.0, f64::INFINITY)]
    fn rejects_out_of_range_positions(
        uploaded: DateTime<Utc>,
        #[case] latitude: f64,
        #[case] longitude: f64,
    ) {
        let photo = PhotoRecord::new("p1", "owner", uploaded).with_position(latitude, longitude);
        assert!(matches!(
            photo.validate(),
            Err(PhotoRecordError::InvalidPosition { .. })
        ));
    }

    #[rstest]
    fn rejects_blank_identifier(uploaded: DateTime<Utc>) {
        let photo = PhotoRecord::new("  ", "owner", uploaded);
        assert_eq!(photo.validate(), Err(PhotoRecordError::MissingId));
    }

    #[rstest]
    fn batch_drops_only_malformed_records(uploaded: DateTime<Utc>) {
        let records = vec![
            PhotoRecord::new("ok", "owner", uploaded).with_position(10.0, 10.0),
            PhotoRecord::new("bad", "owner", uploaded).with_position(120.0, 10.0),
            PhotoRecord::new("nogeo", "owner", uploaded),
        ];
        let batch = validate_batch(records);
        assert_eq!(batch.dropped, 1);
        let ids: Vec<_> = batch.photos.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, ["ok", "nogeo"]);
    }

    #[cfg(feature = "serde")]
    #[rstest]
    fn position_serialises_as_latitude_and_longitude(uploaded: DateTime<Utc>) {
        let photo = PhotoRecord::new("p1", "owner", uploaded).with_position(43.5, -79.25);
        let json = serde_json::to_value(&photo).expect("serialise photo");
        assert_eq!(json["position"]["latitude"], 43.5);
        assert_eq!(json["position"]["longitude"], -79.25);

        let decoded: PhotoRecord = serde_json::from_value(json).expect("deserialise photo");
        assert_eq!(decoded, photo);
    }

    #[cfg(feature = "serde")]
    #[rstest]
    fn missing_optional_fields_take_defaults() {
        let json = r#"{"id":"p9","owner_id":"o","uploaded_at":"2024-03-01T00:00:00Z"}"#;
        let photo: PhotoRecord = serde_json::from_str(json).expect("decode minimal photo");
        assert!(photo.position.is_none());
        assert!(photo.tags.is_empty());
        assert_eq!(photo.engagement, Engagement::default());
    }
}
