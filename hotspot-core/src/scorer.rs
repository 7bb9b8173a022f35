//! Rank landmarks and hotspots by their photos.
//!
//! The `SpotScorer` trait turns the photos attached to a spot into a single
//! ranking value. Higher is better. Scores are not normalised and may be
//! negative.

use chrono::{DateTime, Utc};

use crate::PhotoRecord;

/// Calculate a ranking score for a set of photos.
///
/// Implementations must be pure: the same photos and `now` give the same
/// score. `now` is supplied by the caller so runs are reproducible.
///
/// # Examples
///
/// ```rust
/// use chrono::{DateTime, Utc};
/// use hotspot_core::{PhotoRecord, SpotScorer};
///
/// struct CountOnly;
///
/// impl SpotScorer for CountOnly {
///     fn score(&self, photos: &[PhotoRecord], _now: DateTime<Utc>) -> f64 {
///         f64::from(u32::try_from(photos.len()).unwrap_or(u32::MAX))
///     }
/// }
///
/// let now = Utc::now();
/// let photos = vec![PhotoRecord::new("p1", "o", now)];
/// assert_eq!(CountOnly.score(&photos, now), 1.0);
/// ```
pub trait SpotScorer: Send + Sync {
    /// Return a score for `photos` as of `now`.
    fn score(&self, photos: &[PhotoRecord], now: DateTime<Utc>) -> f64;
}
