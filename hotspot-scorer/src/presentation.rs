//! Display rescaling for stored spots.
//!
//! The engine score is unbounded. Front ends instead show a `0.0..=1.0`
//! popularity bar derived from the photo count alone.
#![forbid(unsafe_code)]

/// Photo count at which a landmark shows as fully popular.
pub const LANDMARK_DIVISOR: f64 = 50.0;
/// Photo count at which a hotspot shows as fully popular.
pub const HOTSPOT_DIVISOR: f64 = 10.0;

/// Maps photo counts onto `0.0..=1.0` as `min(count / divisor, 1)`.
///
/// # Examples
///
/// ```
/// use hotspot_scorer::presentation::PresentationScale;
///
/// let scale = PresentationScale::default();
/// assert_eq!(scale.landmark(25), 0.5);
/// assert_eq!(scale.hotspot(40), 1.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PresentationScale {
    landmark_divisor: f64,
    hotspot_divisor: f64,
}

impl Default for PresentationScale {
    fn default() -> Self {
        Self {
            landmark_divisor: LANDMARK_DIVISOR,
            hotspot_divisor: HOTSPOT_DIVISOR,
        }
    }
}

impl PresentationScale {
    /// Build a scale with custom divisors.
    ///
    /// Non-positive or non-finite divisors fall back to the defaults.
    #[must_use]
    pub fn new(landmark_divisor: f64, hotspot_divisor: f64) -> Self {
        Self {
            landmark_divisor: usable_or(landmark_divisor, LANDMARK_DIVISOR),
            hotspot_divisor: usable_or(hotspot_divisor, HOTSPOT_DIVISOR),
        }
    }

    /// Display score of a landmark with `photo_count` photos.
    #[must_use]
    pub fn landmark(&self, photo_count: usize) -> f64 {
        rescale(photo_count, self.landmark_divisor)
    }

    /// Display score of a hotspot with `photo_count` photos.
    #[must_use]
    pub fn hotspot(&self, photo_count: usize) -> f64 {
        rescale(photo_count, self.hotspot_divisor)
    }
}

fn usable_or(divisor: f64, fallback: f64) -> f64 {
    if divisor.is_finite() && divisor > 0.0 {
        divisor
    } else {
        fallback
    }
}

#[expect(
    clippy::float_arithmetic,
    clippy::cast_precision_loss,
    reason = "photo counts are small and the result is display-only"
)]
fn rescale(photo_count: usize, divisor: f64) -> f64 {
    (photo_count as f64 / divisor).min(1.0)
}
