//! Landmark identification by tag frequency.

use std::collections::{HashMap, HashSet};

use geo::Coord;
use log::debug;

use crate::{PhotoRecord, PipelineConfig, TagFilter};

/// A tag treated as a place name, with every photo that carries it.
#[derive(Debug, Clone, PartialEq)]
pub struct LandmarkCandidate {
    /// Lowercased tag identifying the landmark across spellings.
    pub key: String,
    /// Most common spelling of the tag, used for display.
    pub name: String,
    /// Photos carrying the tag, in discovery order.
    pub photos: Vec<PhotoRecord>,
}

impl LandmarkCandidate {
    /// Build a candidate whose key is the lowercased `name`.
    #[must_use]
    pub fn new(name: impl Into<String>, photos: Vec<PhotoRecord>) -> Self {
        let name = name.into();
        Self {
            key: name.to_lowercase(),
            name,
            photos,
        }
    }

    /// Number of photos carrying the tag.
    #[must_use]
    pub fn photo_count(&self) -> usize {
        self.photos.len()
    }

    /// Human-readable name with CamelCase tags split into words.
    #[must_use]
    pub fn display_name(&self) -> String {
        display_name(&self.name)
    }

    /// Photos that carry a photographer position.
    pub fn geolocated_photos(&self) -> impl Iterator<Item = &PhotoRecord> {
        self.photos.iter().filter(|photo| photo.position.is_some())
    }

    /// Mean position of the geolocated photos.
    ///
    /// Returns `None` when no photo carries a position.
    #[must_use]
    #[expect(
        clippy::float_arithmetic,
        clippy::cast_precision_loss,
        reason = "averaging coordinates needs float sums over small photo counts"
    )]
    pub fn representative_position(&self) -> Option<Coord<f64>> {
        let (sum, count) = self
            .geolocated_photos()
            .filter_map(|photo| photo.position)
            .fold((Coord { x: 0.0, y: 0.0 }, 0_usize), |(sum, count), coord| {
                (sum + coord, count + 1)
            });
        (count > 0).then(|| {
            let divisor = count as f64;
            Coord {
                x: sum.x / divisor,
                y: sum.y / divisor,
            }
        })
    }

    /// First photo with an image URL, or the first photo.
    #[must_use]
    pub fn cover_photo(&self) -> Option<&PhotoRecord> {
        cover_photo(&self.photos)
    }
}

/// Split a CamelCase tag into words.
///
/// A space is inserted only where a lowercase letter is followed by an
/// uppercase one, so acronyms such as `ROM` stay intact.
///
/// # Examples
///
/// ```
/// use hotspot_core::display_name;
///
/// assert_eq!(display_name("RoyalOntarioMuseum"), "Royal Ontario Museum");
/// assert_eq!(display_name("ROM"), "ROM");
/// assert_eq!(display_name("cntower"), "cntower");
/// ```
#[must_use]
pub fn display_name(tag: &str) -> String {
    let mut name = String::with_capacity(tag.len() + 4);
    let mut previous: Option<char> = None;
    for ch in tag.chars() {
        if previous.is_some_and(char::is_lowercase) && ch.is_uppercase() {
            name.push(' ');
        }
        name.push(ch);
        previous = Some(ch);
    }
    name.trim().to_owned()
}

pub(crate) fn cover_photo(photos: &[PhotoRecord]) -> Option<&PhotoRecord> {
    photos
        .iter()
        .find(|photo| photo.image_url.is_some())
        .or_else(|| photos.first())
}

/// Turns a flat photo collection into ranked landmark candidates.
///
/// Tag occurrences are collapsed per photo before counting, comparing tags
/// case-insensitively, so a photo contributes at most once to each tag. A
/// photo with several distinct tags contributes to several candidates.
///
/// Spellings of one tag share a candidate. Its name is the spelling carried
/// by the most photos, ties going to the smallest spelling, and the tag
/// filter accepts it when any spelling passes. Neither depends on photo
/// order.
///
/// # Examples
///
/// ```
/// use chrono::Utc;
/// use hotspot_core::{LandmarkIdentifier, PhotoRecord, TagFilter};
///
/// let now = Utc::now();
/// let photos: Vec<_> = (0..3)
///     .map(|i| PhotoRecord::new(format!("p{i}"), "owner", now).with_tags(["casaloma"]))
///     .collect();
/// let identifier = LandmarkIdentifier::new(TagFilter::default(), 3);
/// let landmarks = identifier.identify(&photos);
///
/// assert_eq!(landmarks.len(), 1);
/// assert_eq!(landmarks[0].photo_count(), 3);
/// ```
#[derive(Debug, Clone)]
pub struct LandmarkIdentifier {
    filter: TagFilter,
    min_photo_count: usize,
    max_landmarks: Option<usize>,
}

impl LandmarkIdentifier {
    /// Build an identifier with a tag filter and minimum photo count.
    #[must_use]
    pub const fn new(filter: TagFilter, min_photo_count: usize) -> Self {
        Self {
            filter,
            min_photo_count,
            max_landmarks: None,
        }
    }

    /// Build an identifier from pipeline configuration.
    #[must_use]
    pub fn from_config(config: &PipelineConfig) -> Self {
        let filter = TagFilter::default()
            .with_extra_stop_words(&config.extra_stop_words)
            .with_strict_heuristics(config.strict_tag_heuristics);
        Self::new(filter, config.min_landmark_photo_count).with_max_landmarks(config.max_landmarks)
    }

    /// Keep at most `limit` landmarks after ranking.
    #[must_use]
    pub const fn with_max_landmarks(mut self, limit: Option<usize>) -> Self {
        self.max_landmarks = limit;
        self
    }

    /// Minimum number of photos a tag needs to become a landmark.
    #[must_use]
    pub const fn min_photo_count(&self) -> usize {
        self.min_photo_count
    }

    /// Rank candidate landmarks by photo count, highest first.
    ///
    /// Ties keep the order in which tags were first seen. Photos without
    /// tags are skipped.
    #[must_use]
    pub fn identify(&self, photos: &[PhotoRecord]) -> Vec<LandmarkCandidate> {
        let buckets = bucket_by_tag(photos);
        debug!("found {} unique tags in {} photos", buckets.len(), photos.len());

        let mut landmarks: Vec<LandmarkCandidate> = buckets
            .into_iter()
            .filter(|bucket| {
                bucket.members.len() >= self.min_photo_count
                    && bucket
                        .spellings
                        .iter()
                        .any(|(spelling, _)| self.filter.accepts(spelling))
            })
            .map(|bucket| LandmarkCandidate {
                name: bucket.preferred_spelling().to_owned(),
                key: bucket.key,
                photos: bucket
                    .members
                    .iter()
                    .filter_map(|&index| photos.get(index))
                    .cloned()
                    .collect(),
            })
            .collect();

        landmarks.sort_by(|left, right| right.photo_count().cmp(&left.photo_count()));
        if let Some(limit) = self.max_landmarks {
            landmarks.truncate(limit);
        }
        landmarks
    }
}

impl Default for LandmarkIdentifier {
    fn default() -> Self {
        Self::from_config(&PipelineConfig::default())
    }
}

struct TagBucket {
    key: String,
    spellings: Vec<(String, usize)>,
    members: Vec<usize>,
}

impl TagBucket {
    fn record(&mut self, spelling: &str, position: usize) {
        self.members.push(position);
        match self.spellings.iter_mut().find(|(seen, _)| seen.as_str() == spelling) {
            Some((_, count)) => *count += 1,
            None => self.spellings.push((spelling.to_owned(), 1)),
        }
    }

    fn preferred_spelling(&self) -> &str {
        self.spellings
            .iter()
            .max_by(|(left, left_count), (right, right_count)| {
                left_count.cmp(right_count).then_with(|| right.cmp(left))
            })
            .map_or(self.key.as_str(), |(spelling, _)| spelling.as_str())
    }
}

fn bucket_by_tag(photos: &[PhotoRecord]) -> Vec<TagBucket> {
    let mut buckets: Vec<TagBucket> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for (position, photo) in photos.iter().enumerate() {
        let mut seen = HashSet::new();
        for tag in photo.tags.iter().filter(|tag| !tag.is_empty()) {
            let key = tag.to_lowercase();
            if !seen.insert(key.clone()) {
                continue;
            }
            let slot = *index.entry(key.clone()).or_insert_with(|| {
                buckets.push(TagBucket {
                    key,
                    spellings: Vec::new(),
                    members: Vec::new(),
                });
                buckets.len() - 1
            });
            if let Some(bucket) = buckets.get_mut(slot) {
                bucket.record(tag, position);
            }
        }
    }
    buckets
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

    fn tagged(count: usize, tags: &[&str], uploaded: DateTime<Utc>) -> Vec<PhotoRecord> {
        (0..count)
            .map(|i| {
                PhotoRecord::new(format!("{}-{i}", tags.join("+")), format!("o{i}"), uploaded)
                    .with_tags(tags.iter().copied())
            })
            .collect()
    }

    #[rstest]
    fn empty_input_yields_no_landmarks() {
        let identifier = LandmarkIdentifier::default();
        assert!(identifier.identify(&[]).is_empty());
    }

    #[rstest]
    fn tag_below_threshold_is_dropped(uploaded: DateTime<Utc>) {
        let photos = tagged(5, &["casaloma"], uploaded);
        let identifier = LandmarkIdentifier::new(TagFilter::default(), 10);
        assert!(identifier.identify(&photos).is_empty());
    }

    #[rstest]
    fn stop_words_never_become_landmarks(uploaded: DateTime<Utc>) {
        let photos = tagged(20, &["toronto", "rom"], uploaded);
        let identifier = LandmarkIdentifier::new(TagFilter::default(), 10);
        let names: Vec<_> = identifier
            .identify(&photos)
            .into_iter()
            .map(|landmark| landmark.name)
            .collect();
        assert_eq!(names, ["rom"]);
    }

    #[rstest]
    fn ranks_by_photo_count_with_first_seen_ties(uploaded: DateTime<Utc>) {
        let mut photos = tagged(3, &["alpha"], uploaded);
        photos.extend(tagged(5, &["bravo"], uploaded));
        photos.extend(tagged(3, &["charlie"], uploaded));
        let identifier = LandmarkIdentifier::new(TagFilter::new(Vec::<String>::new()), 3);
        let ranked: Vec<_> = identifier
            .identify(&photos)
            .into_iter()
            .map(|landmark| (landmark.name, landmark.photos.len()))
            .collect();
        assert_eq!(
            ranked,
            [
                ("bravo".to_owned(), 5),
                ("alpha".to_owned(), 3),
                ("charlie".to_owned(), 3)
            ]
        );
    }

    #[rstest]
    fn photo_counts_once_per_tag(uploaded: DateTime<Utc>) {
        let photos = tagged(2, &["rom", "rom", "ROM"], uploaded);
        let identifier = LandmarkIdentifier::new(TagFilter::default(), 1);
        let landmarks = identifier.identify(&photos);
        assert_eq!(landmarks.len(), 1);
        assert_eq!(landmarks.first().map(LandmarkCandidate::photo_count), Some(2));
    }

    #[rstest]
    fn photo_contributes_to_every_distinct_tag(uploaded: DateTime<Utc>) {
        let photos = tagged(4, &["rom", "museum"], uploaded);
        let identifier = LandmarkIdentifier::new(TagFilter::default(), 4);
        let landmarks = identifier.identify(&photos);
        assert_eq!(landmarks.len(), 2);
        assert!(landmarks.iter().all(|landmark| landmark.photo_count() == 4));
    }

    #[rstest]
    fn untagged_photos_are_skipped(uploaded: DateTime<Utc>) {
        let mut photos = tagged(3, &["rom"], uploaded);
        photos.push(PhotoRecord::new("bare", "o", uploaded));
        let identifier = LandmarkIdentifier::new(TagFilter::default(), 3);
        let landmarks = identifier.identify(&photos);
        assert_eq!(landmarks.first().map(LandmarkCandidate::photo_count), Some(3));
    }

    #[rstest]
    fn max_landmarks_truncates_after_ranking(uploaded: DateTime<Utc>) {
        let mut photos = tagged(4, &["alpha"], uploaded);
        photos.extend(tagged(6, &["bravo"], uploaded));
        let identifier =
            LandmarkIdentifier::new(TagFilter::default(), 1).with_max_landmarks(Some(1));
        let landmarks = identifier.identify(&photos);
        assert_eq!(landmarks.len(), 1);
        assert_eq!(landmarks.first().map(|l| l.name.as_str()), Some("bravo"));
    }

    #[rstest]
    #[expect(clippy::float_arithmetic, reason = "test compares float coordinates")]
    fn representative_position_averages_geolocated_photos(uploaded: DateTime<Utc>) {
        let landmark = LandmarkCandidate::new(
            "rom",
            vec![
                PhotoRecord::new("a", "o", uploaded).with_position(10.0, 20.0),
                PhotoRecord::new("b", "o", uploaded).with_position(12.0, 22.0),
                PhotoRecord::new("c", "o", uploaded),
            ],
        );
        let centre = landmark.representative_position().expect("centre");
        assert!((centre.y - 11.0).abs() < 1e-9);
        assert!((centre.x - 21.0).abs() < 1e-9);
    }

    #[rstest]
    fn representative_position_is_none_without_geodata(uploaded: DateTime<Utc>) {
        let landmark = LandmarkCandidate::new("rom", vec![PhotoRecord::new("a", "o", uploaded)]);
        assert!(landmark.representative_position().is_none());
    }

    #[rstest]
    fn cover_photo_prefers_one_with_an_image(uploaded: DateTime<Utc>) {
        let landmark = LandmarkCandidate::new(
            "rom",
            vec![
                PhotoRecord::new("a", "o", uploaded),
                PhotoRecord::new("b", "o", uploaded).with_image_url("https://img/b.jpg"),
            ],
        );
        assert_eq!(landmark.cover_photo().map(|p| p.id.as_str()), Some("b"));
    }

    fn spelled(count: usize, tag: &str, uploaded: DateTime<Utc>) -> Vec<PhotoRecord> {
        (0..count)
            .map(|i| {
                PhotoRecord::new(format!("{tag}-{i}"), format!("o{i}"), uploaded).with_tags([tag])
            })
            .collect()
    }

    #[rstest]
    fn spellings_share_a_key_and_a_stable_name(uploaded: DateTime<Utc>) {
        let mut upper_first = spelled(3, "CasaLoma", uploaded);
        upper_first.extend(spelled(3, "casaloma", uploaded));
        let mut lower_first = spelled(3, "casaloma", uploaded);
        lower_first.extend(spelled(3, "CasaLoma", uploaded));
        let identifier = LandmarkIdentifier::new(TagFilter::default(), 3);

        let named = |photos: &[PhotoRecord]| -> Vec<(String, String, usize)> {
            identifier
                .identify(photos)
                .into_iter()
                .map(|l| (l.key.clone(), l.name.clone(), l.photo_count()))
                .collect()
        };

        let expected = vec![("casaloma".to_owned(), "CasaLoma".to_owned(), 6)];
        assert_eq!(named(&upper_first), expected);
        assert_eq!(named(&lower_first), expected);
    }

    #[rstest]
    fn most_common_spelling_names_the_landmark(uploaded: DateTime<Utc>) {
        let mut photos = spelled(1, "HighPark", uploaded);
        photos.extend(spelled(3, "highpark", uploaded));
        let identifier = LandmarkIdentifier::new(TagFilter::default(), 3);

        let landmarks = identifier.identify(&photos);

        assert_eq!(landmarks.first().map(|l| l.name.as_str()), Some("highpark"));
    }

    #[rstest]
    #[case(true)]
    #[case(false)]
    fn strict_filter_accepts_when_any_spelling_passes(
        uploaded: DateTime<Utc>,
        #[case] upper_first: bool,
    ) {
        let (first, second) = if upper_first {
            ("CNTowerTO", "cntowerto")
        } else {
            ("cntowerto", "CNTowerTO")
        };
        let mut photos = spelled(3, first, uploaded);
        photos.extend(spelled(3, second, uploaded));
        let identifier =
            LandmarkIdentifier::new(TagFilter::default().with_strict_heuristics(true), 3);

        let landmarks = identifier.identify(&photos);

        assert_eq!(landmarks.len(), 1);
        assert_eq!(landmarks.first().map(|l| l.key.as_str()), Some("cntowerto"));
    }

    #[rstest]
    fn strict_filter_rejects_when_every_spelling_fails(uploaded: DateTime<Utc>) {
        let mut photos = spelled(3, "CNTowerTO", uploaded);
        photos.extend(spelled(3, "CnTowerTO", uploaded));
        let identifier =
            LandmarkIdentifier::new(TagFilter::default().with_strict_heuristics(true), 3);

        assert!(identifier.identify(&photos).is_empty());
    }

    #[rstest]
    #[case("RoyalOntarioMuseum", "Royal Ontario Museum")]
    #[case("HighPark", "High Park")]
    #[case("CNTower", "CNTower")]
    #[case("nathanphillipssquare", "nathanphillipssquare")]
    fn splits_camel_case(#[case] tag: &str, #[case] expected: &str) {
        assert_eq!(display_name(tag), expected);
    }
}
