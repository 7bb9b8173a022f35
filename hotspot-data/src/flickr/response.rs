//! Deserialisation types for `flickr.photos.search` responses.
//!
//! Flickr is loose with JSON types: numeric fields arrive as numbers or as
//! strings depending on the field and the API version, so every numeric field
//! goes through [`NumberOrString`].
//!
//! See: <https://www.flickr.com/services/api/flickr.photos.search.html>

use chrono::{DateTime, Utc};
use hotspot_core::{Engagement, PhotoRecord};
use serde::Deserialize;

/// Envelope returned by every Flickr REST call.
#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    /// `"ok"` on success, `"fail"` otherwise.
    pub stat: String,
    /// Error code when `stat` is `"fail"`.
    #[serde(default)]
    pub code: Option<i64>,
    /// Error message when `stat` is `"fail"`.
    #[serde(default)]
    pub message: Option<String>,
    /// Result page on success.
    #[serde(default)]
    pub photos: Option<PhotoPage>,
}

impl SearchResponse {
    /// Check if the response indicates success.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.stat == "ok"
    }
}

/// One page of search results.
#[derive(Debug, Default, Deserialize)]
pub struct PhotoPage {
    /// One-based page number.
    #[serde(default)]
    pub page: Option<NumberOrString>,
    /// Total number of pages available.
    #[serde(default)]
    pub pages: Option<NumberOrString>,
    /// Photos on this page.
    #[serde(default)]
    pub photo: Vec<FlickrPhoto>,
}

impl PhotoPage {
    /// Total pages reported by Flickr, defaulting to one.
    #[must_use]
    pub fn total_pages(&self) -> u64 {
        self.pages
            .as_ref()
            .and_then(NumberOrString::as_u64)
            .unwrap_or(1)
    }
}

/// A JSON value that may be encoded as a number or a string.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum NumberOrString {
    /// A JSON number.
    Number(serde_json::Number),
    /// A JSON string holding a number.
    Text(String),
}

impl NumberOrString {
    /// Interpret the value as a float.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(number) => number.as_f64(),
            Self::Text(text) => text.trim().parse().ok(),
        }
    }

    /// Interpret the value as a non-negative integer.
    #[must_use]
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Self::Number(number) => number.as_u64(),
            Self::Text(text) => text.trim().parse().ok(),
        }
    }

    /// Interpret the value as a signed integer.
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Number(number) => number.as_i64(),
            Self::Text(text) => text.trim().parse().ok(),
        }
    }
}

/// A photo as listed by `flickr.photos.search` with the extras this crate
/// requests.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FlickrPhoto {
    /// Flickr photo identifier.
    pub id: String,
    /// NSID of the owner.
    #[serde(default)]
    pub owner: String,
    /// Display name of the owner.
    #[serde(default)]
    pub ownername: Option<String>,
    /// Image secret used to build static URLs.
    #[serde(default)]
    pub secret: Option<String>,
    /// Image server used to build static URLs.
    #[serde(default)]
    pub server: Option<String>,
    /// Image farm used to build static URLs.
    #[serde(default)]
    pub farm: Option<NumberOrString>,
    /// Photo title.
    #[serde(default)]
    pub title: Option<String>,
    /// Latitude, `0` when the photo has no location.
    #[serde(default)]
    pub latitude: Option<NumberOrString>,
    /// Longitude, `0` when the photo has no location.
    #[serde(default)]
    pub longitude: Option<NumberOrString>,
    /// Space-separated, already normalised tags.
    #[serde(default)]
    pub tags: String,
    /// Large rendition URL.
    #[serde(default)]
    pub url_b: Option<String>,
    /// Upload time as Unix seconds.
    #[serde(default)]
    pub dateupload: Option<NumberOrString>,
    /// View count.
    #[serde(default)]
    pub views: Option<NumberOrString>,
    /// Favourite count.
    #[serde(default)]
    pub count_faves: Option<NumberOrString>,
}

impl FlickrPhoto {
    /// Upload time, when present and representable.
    #[must_use]
    pub fn uploaded_at(&self) -> Option<DateTime<Utc>> {
        let seconds = self.dateupload.as_ref()?.as_i64()?;
        DateTime::from_timestamp(seconds, 0)
    }

    /// Photographer position as `(latitude, longitude)`.
    ///
    /// Flickr reports `0, 0` for photos without a location; that pair maps
    /// to `None`.
    #[must_use]
    #[expect(
        clippy::float_cmp,
        reason = "Flickr encodes a missing location as exact zeros"
    )]
    pub fn position(&self) -> Option<(f64, f64)> {
        let latitude = self.latitude.as_ref()?.as_f64()?;
        let longitude = self.longitude.as_ref()?.as_f64()?;
        if latitude == 0.0 && longitude == 0.0 {
            return None;
        }
        Some((latitude, longitude))
    }

    /// Displayable image URL.
    ///
    /// Prefers `url_b` and falls back to the static farm URL when the server
    /// and secret are known.
    #[must_use]
    pub fn image_url(&self) -> Option<String> {
        if let Some(url) = self.url_b.as_deref().filter(|url| !url.is_empty()) {
            return Some(url.to_owned());
        }
        let server = self.server.as_deref()?;
        let secret = self.secret.as_deref()?;
        let farm = self.farm.as_ref().and_then(NumberOrString::as_u64)?;
        Some(format!(
            "https://farm{farm}.staticflickr.com/{server}/{}_{secret}_b.jpg",
            self.id
        ))
    }

    /// Convert into a [`PhotoRecord`].
    ///
    /// Returns `None` when the upload time is missing, since records are
    /// scored by recency.
    #[must_use]
    pub fn into_record(self) -> Option<PhotoRecord> {
        let uploaded_at = self.uploaded_at()?;
        let engagement = Engagement::new(
            self.count_faves
                .as_ref()
                .and_then(NumberOrString::as_u64)
                .unwrap_or_default(),
            self.views
                .as_ref()
                .and_then(NumberOrString::as_u64)
                .unwrap_or_default(),
        );
        let image_url = self.image_url();
        let position = self.position();
        let mut record = PhotoRecord::new(self.id, self.owner, uploaded_at)
            .with_tags(self.tags.split_whitespace())
            .with_engagement(engagement);
        if let Some((latitude, longitude)) = position {
            record = record.with_position(latitude, longitude);
        }
        if let Some(title) = self.title.filter(|title| !title.trim().is_empty()) {
            record = record.with_title(title);
        }
        if let Some(url) = image_url {
            record = record.with_image_url(url);
        }
        Some(record)
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
    use rstest::rstest;

    const PAGE: &str = r#"{
        "photos": {
            "page": 1, "pages": "3", "perpage": 250, "total": "612",
            "photo": [
                {
                    "id": "5301", "owner": "12@N01", "ownername": "alice",
                    "secret": "abc", "server": "65535", "farm": 66,
                    "title": "Rotunda",
                    "latitude": "43.667712", "longitude": -79.394712,
                    "accuracy": "16",
                    "tags": "rom museum toronto",
                    "dateupload": "1714564800",
                    "views": "120", "count_faves": 4
                },
                {
                    "id": "5302", "owner": "13@N01",
                    "latitude": 0, "longitude": 0,
                    "tags": "",
                    "url_b": "https://live.staticflickr.com/1/5302_b.jpg",
                    "dateupload": 1714564801
                }
            ]
        },
        "stat": "ok"
    }"#;

    #[rstest]
    fn deserialises_mixed_number_encodings() {
        let response: SearchResponse = serde_json::from_str(PAGE).expect("should deserialise");

        assert!(response.is_ok());
        let page = response.photos.expect("page");
        assert_eq!(page.total_pages(), 3);
        assert_eq!(page.photo.len(), 2);
    }

    #[rstest]
    fn converts_photos_to_records() {
        let response: SearchResponse = serde_json::from_str(PAGE).expect("should deserialise");
        let records: Vec<_> = response
            .photos
            .expect("page")
            .photo
            .into_iter()
            .filter_map(FlickrPhoto::into_record)
            .collect();

        let first = &records[0];
        assert_eq!(first.owner_id, "12@N01");
        assert_eq!(first.latitude(), Some(43.667_712));
        assert_eq!(first.longitude(), Some(-79.394_712));
        assert_eq!(first.tags, vec!["rom", "museum", "toronto"]);
        assert_eq!(first.engagement, Engagement::new(4, 120));
        assert_eq!(first.title.as_deref(), Some("Rotunda"));
        assert_eq!(
            first.image_url.as_deref(),
            Some("https://farm66.staticflickr.com/65535/5301_abc_b.jpg")
        );
        assert_eq!(first.uploaded_at.timestamp(), 1_714_564_800);

        let second = &records[1];
        assert_eq!(second.position, None);
        assert!(second.tags.is_empty());
        assert_eq!(
            second.image_url.as_deref(),
            Some("https://live.staticflickr.com/1/5302_b.jpg")
        );
    }

    #[rstest]
    fn deserialises_failure_envelope() {
        let json = r#"{"stat": "fail", "code": 100, "message": "Invalid API Key"}"#;

        let response: SearchResponse = serde_json::from_str(json).expect("should deserialise");

        assert!(!response.is_ok());
        assert_eq!(response.code, Some(100));
        assert_eq!(response.message.as_deref(), Some("Invalid API Key"));
        assert!(response.photos.is_none());
    }

    #[rstest]
    fn photos_without_upload_time_are_skipped() {
        let photo = FlickrPhoto {
            id: "9".to_owned(),
            owner: "o".to_owned(),
            ..FlickrPhoto::default()
        };
        assert!(photo.into_record().is_none());
    }

    #[rstest]
    #[case(NumberOrString::Text(" 42 ".to_owned()), Some(42))]
    #[case(NumberOrString::Text("n/a".to_owned()), None)]
    #[case(NumberOrString::Number(7.into()), Some(7))]
    fn parses_lenient_integers(#[case] value: NumberOrString, #[case] expected: Option<u64>) {
        assert_eq!(value.as_u64(), expected);
    }

    #[rstest]
    fn missing_image_parts_yield_no_url() {
        let photo = FlickrPhoto {
            id: "1".to_owned(),
            server: Some("2".to_owned()),
            ..FlickrPhoto::default()
        };
        assert_eq!(photo.image_url(), None);
    }
}
