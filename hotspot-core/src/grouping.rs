//! Split a landmark's photos into hotspots on a coordinate precision grid.
//!
//! Positions are snapped to a fixed number of decimal places and photos that
//! share a snapped position form one group. Neighbouring positions either
//! side of a cell boundary are never merged.

use std::collections::BTreeMap;

use geo::Coord;

use crate::landmark::cover_photo;
use crate::{LandmarkCandidate, PhotoRecord, PipelineConfig};

/// Largest supported number of decimal places.
pub const MAX_PRECISION: u8 = 9;

/// Integer cell of the precision grid.
///
/// Latitude and longitude are scaled by `10^precision` and rounded half away
/// from zero. Ordering is by latitude, then longitude.
///
/// # Examples
///
/// ```
/// use geo::Coord;
/// use hotspot_core::GridKey;
///
/// let key = GridKey::from_coord(Coord { x: -79.39468, y: 43.66774 }, 4).unwrap();
/// assert_eq!((key.lat, key.lng), (436_677, -793_947));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GridKey {
    /// Scaled, rounded latitude.
    pub lat: i64,
    /// Scaled, rounded longitude.
    pub lng: i64,
    /// Decimal places used for scaling.
    pub precision: u8,
}

impl GridKey {
    /// Snap `coord` onto the grid.
    ///
    /// Returns `None` for non-finite coordinates or a precision above
    /// [`MAX_PRECISION`].
    #[must_use]
    #[expect(
        clippy::float_arithmetic,
        clippy::cast_possible_truncation,
        reason = "validated coordinates scaled by at most 1e9 fit in i64"
    )]
    pub fn from_coord(coord: Coord<f64>, precision: u8) -> Option<Self> {
        if precision > MAX_PRECISION || !coord.x.is_finite() || !coord.y.is_finite() {
            return None;
        }
        let scale = scale(precision);
        Some(Self {
            lat: (coord.y * scale).round() as i64,
            lng: (coord.x * scale).round() as i64,
            precision,
        })
    }

    /// Convert the cell back to degrees.
    #[must_use]
    #[expect(
        clippy::float_arithmetic,
        clippy::cast_precision_loss,
        reason = "grid units stay well inside the f64 mantissa"
    )]
    pub fn position(&self) -> Coord<f64> {
        let scale = scale(self.precision);
        Coord {
            x: self.lng as f64 / scale,
            y: self.lat as f64 / scale,
        }
    }
}

fn scale(precision: u8) -> f64 {
    10_f64.powi(i32::from(precision))
}

/// A vantage point shared by several photos of one landmark.
#[derive(Debug, Clone, PartialEq)]
pub struct Hotspot {
    /// Name of the landmark this hotspot was derived from.
    pub landmark_name: String,
    /// Grid cell shared by every photo.
    pub key: GridKey,
    /// Photos whose snapped position equals `key`.
    pub photos: Vec<PhotoRecord>,
}

impl Hotspot {
    /// The grid cell converted back to degrees.
    #[must_use]
    pub fn position(&self) -> Coord<f64> {
        self.key.position()
    }

    /// Number of photos taken from this position.
    #[must_use]
    pub fn photo_count(&self) -> usize {
        self.photos.len()
    }

    /// First photo with an image URL, or the first photo.
    #[must_use]
    pub fn cover_photo(&self) -> Option<&PhotoRecord> {
        cover_photo(&self.photos)
    }
}

/// Groups geolocated photos by snapped position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpatialGrouper {
    precision: u8,
    min_photos_per_hotspot: usize,
}

impl SpatialGrouper {
    /// Build a grouper.
    ///
    /// Precision is clamped to [`MAX_PRECISION`]; configuration validation
    /// rejects larger values before this point.
    #[must_use]
    pub fn new(precision: u8, min_photos_per_hotspot: usize) -> Self {
        Self {
            precision: precision.min(MAX_PRECISION),
            min_photos_per_hotspot,
        }
    }

    /// Build a grouper from pipeline configuration.
    #[must_use]
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(
            config.coordinate_precision_decimals,
            config.min_hotspot_photo_count,
        )
    }

    /// Decimal places used for snapping.
    #[must_use]
    pub const fn precision(&self) -> u8 {
        self.precision
    }

    /// Group a landmark's photos into hotspots.
    #[must_use]
    pub fn group(&self, landmark: &LandmarkCandidate) -> Vec<Hotspot> {
        self.group_photos(&landmark.name, &landmark.photos)
    }

    /// Group `photos` into hotspots attributed to `landmark_name`.
    ///
    /// Photos without a position are ignored. Cells holding fewer than the
    /// minimum are discarded. The result is ordered by photo count, highest
    /// first, with ties in grid key order.
    ///
    /// # Examples
    ///
    /// ```
    /// use chrono::Utc;
    /// use hotspot_core::{PhotoRecord, SpatialGrouper};
    ///
    /// let now = Utc::now();
    /// let photos: Vec<_> = (0..3)
    ///     .map(|i| PhotoRecord::new(format!("p{i}"), "o", now).with_position(43.6677, -79.3947))
    ///     .collect();
    /// let hotspots = SpatialGrouper::new(4, 3).group_photos("rom", &photos);
    /// assert_eq!(hotspots.len(), 1);
    /// ```
    #[must_use]
    pub fn group_photos(&self, landmark_name: &str, photos: &[PhotoRecord]) -> Vec<Hotspot> {
        let mut cells: BTreeMap<GridKey, Vec<PhotoRecord>> = BTreeMap::new();
        for photo in photos {
            let Some(key) = photo
                .position
                .and_then(|coord| GridKey::from_coord(coord, self.precision))
            else {
                continue;
            };
            cells.entry(key).or_default().push(photo.clone());
        }

        let mut hotspots: Vec<Hotspot> = cells
            .into_iter()
            .filter(|(_, members)| members.len() >= self.min_photos_per_hotspot)
            .map(|(key, members)| Hotspot {
                landmark_name: landmark_name.to_owned(),
                key,
                photos: members,
            })
            .collect();
        hotspots.sort_by(|left, right| right.photo_count().cmp(&left.photo_count()));
        hotspots
    }
}

impl Default for SpatialGrouper {
    fn default() -> Self {
        Self::from_config(&PipelineConfig::default())
    }
}

#[cfg(test)]
#[expect(clippy::expect_used, reason = "tests should fail fast when setup breaks")]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};
    use rstest::{fixture, rstest};

    #[fixture]
    fn uploaded() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0)
            .single()
            .expect("valid timestamp")
    }

    fn at(id: &str, lat: f64, lng: f64, uploaded: DateTime<Utc>) -> PhotoRecord {
        PhotoRecord::new(id, "owner", uploaded).with_position(lat, lng)
    }

    #[rstest]
    #[case(0.5, 4, 5_000)]
    #[case(-0.5, 0, -1)]
    #[case(2.5, 0, 3)]
    #[case(43.667_74, 4, 436_677)]
    #[case(43.667_74, 0, 44)]
    fn rounds_half_away_from_zero(#[case] lat: f64, #[case] precision: u8, #[case] expected: i64) {
        let key = GridKey::from_coord(Coord { x: 0.0, y: lat }, precision).expect("key");
        assert_eq!(key.lat, expected);
    }

    #[rstest]
    fn rejects_unsupported_precision() {
        assert!(GridKey::from_coord(Coord { x: 0.0, y: 0.0 }, 10).is_none());
    }

    #[rstest]
    #[expect(clippy::float_arithmetic, reason = "test compares float coordinates")]
    fn key_converts_back_to_snapped_degrees() {
        let key = GridKey::from_coord(Coord { x: -79.394_68, y: 43.667_74 }, 4).expect("key");
        let position = key.position();
        assert!((position.y - 43.6677).abs() < 1e-9);
        assert!((position.x + 79.3947).abs() < 1e-9);
    }

    #[rstest]
    fn drops_sparse_cells_and_ungeolocated_photos(uploaded: DateTime<Utc>) {
        let photos = vec![
            at("a", 43.667_74, -79.394_68, uploaded),
            at("b", 43.667_71, -79.394_71, uploaded),
            at("c", 43.667_69, -79.394_66, uploaded),
            at("d", 43.670_00, -79.390_00, uploaded),
            PhotoRecord::new("e", "owner", uploaded),
        ];
        let hotspots = SpatialGrouper::new(4, 3).group_photos("rom", &photos);
        assert_eq!(hotspots.len(), 1);
        let ids: Vec<_> = hotspots
            .iter()
            .flat_map(|h| h.photos.iter().map(|p| p.id.as_str()))
            .collect();
        assert_eq!(ids, ["a", "b", "c"]);
        assert_eq!(hotspots.first().map(|h| h.landmark_name.as_str()), Some("rom"));
    }

    #[rstest]
    fn orders_by_count_then_key(uploaded: DateTime<Utc>) {
        let mut photos = Vec::new();
        for i in 0..2 {
            photos.push(at(&format!("n{i}"), 10.0, 10.0, uploaded));
            photos.push(at(&format!("s{i}"), -10.0, 10.0, uploaded));
        }
        for i in 0..3 {
            photos.push(at(&format!("m{i}"), 5.0, 5.0, uploaded));
        }
        let hotspots = SpatialGrouper::new(2, 2).group_photos("x", &photos);
        let lats: Vec<_> = hotspots.iter().map(|h| h.key.lat).collect();
        assert_eq!(lats, [500, -1_000, 1_000]);
    }

    #[rstest]
    fn cell_boundaries_are_not_merged(uploaded: DateTime<Utc>) {
        let photos = vec![
            at("a", 0.000_04, 0.0, uploaded),
            at("b", 0.000_06, 0.0, uploaded),
        ];
        assert!(SpatialGrouper::new(4, 2).group_photos("x", &photos).is_empty());
    }

    #[rstest]
    fn landmark_without_geodata_yields_nothing(uploaded: DateTime<Utc>) {
        let landmark = LandmarkCandidate::new("rom", vec![PhotoRecord::new("a", "o", uploaded)]);
        assert!(SpatialGrouper::new(4, 1).group(&landmark).is_empty());
    }
}
