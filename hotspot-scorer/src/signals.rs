//! Raw signals extracted from a spot's photos.
#![forbid(unsafe_code)]

use std::collections::HashSet;

use chrono::{DateTime, TimeDelta, Utc};
use hotspot_core::PhotoRecord;

/// Counts feeding the scoring formula.
///
/// Totals saturate rather than overflow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SpotSignals {
    /// Number of photos.
    pub photo_count: u64,
    /// Sum of favourites across photos.
    pub favorites: u64,
    /// Sum of views across photos.
    pub views: u64,
    /// Photos uploaded inside the recency window.
    pub recent: u64,
    /// Photos beyond the first from each owner.
    pub duplicates: u64,
}

impl SpotSignals {
    /// Extract signals from `photos` as of `now`.
    ///
    /// A photo counts as recent when `uploaded_at >= now - window`.
    #[must_use]
    pub fn from_photos(photos: &[PhotoRecord], now: DateTime<Utc>, window: TimeDelta) -> Self {
        let cutoff = now
            .checked_sub_signed(window)
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        let owners: HashSet<&str> = photos.iter().map(|photo| photo.owner_id.as_str()).collect();
        let photo_count = to_u64(photos.len());

        Self {
            photo_count,
            favorites: photos
                .iter()
                .fold(0, |total, photo| total.saturating_add(photo.engagement.favorites)),
            views: photos
                .iter()
                .fold(0, |total, photo| total.saturating_add(photo.engagement.views)),
            recent: to_u64(
                photos
                    .iter()
                    .filter(|photo| photo.uploaded_at >= cutoff)
                    .count(),
            ),
            duplicates: photo_count.saturating_sub(to_u64(owners.len())),
        }
    }
}

fn to_u64(count: usize) -> u64 {
    u64::try_from(count).unwrap_or(u64::MAX)
}
