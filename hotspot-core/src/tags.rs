//! Decide which photo tags can name a landmark.
//!
//! Filtering is deliberately crude: exact, case-insensitive membership in a
//! stop-list plus a minimum length. Generic tags that slip through are caught
//! later by the landmark photo-count threshold.

use std::collections::HashSet;

/// Tags shorter than this many characters are rejected.
pub const MIN_TAG_CHARS: usize = 3;

const MAX_STRICT_TAG_CHARS: usize = 30;
const MAX_STRICT_UPPERCASE: usize = 2;
const MAX_STRICT_DIGIT_RUN: usize = 3;

/// Generic vocabulary rejected by [`TagFilter::default`].
pub const DEFAULT_STOP_WORDS: &[&str] = &[
    // locale names
    "toronto", "ontario", "canada", "scarborough", "scarboroughontario", "torontoontario",
    "northyork", "etobicoke", "mississauga", "markham", "vaughan", "torontocanada",
    // photography and devices
    "photo", "image", "picture", "photooftheday", "photography", "photographer", "phone",
    "iphone", "samsung", "mobile", "cellphone", "smartphone", "camera", "canon", "nikon",
    "sony", "pentax", "fuji", "fujifilm", "olympus", "lens", "dslr", "mirrorless", "pro",
    "promax",
    // years and months
    "2016", "2017", "2018", "2019", "2020", "2021", "2022", "2023", "2024", "2025",
    "january", "february", "march", "april", "may", "june", "july", "august", "september",
    "october", "november", "december",
    // articles and prepositions
    "the", "a", "an", "and", "or", "in", "at", "on", "of", "for", "with",
    // urban scene
    "streetphotography", "street", "urban", "city", "downtown", "uptown", "midtown",
    "outdoor", "outdoors", "indoor", "indoors", "outside", "inside", "building", "buildings",
    "architecture", "construction", "torontoconstruction", "skyscraper", "highrise", "tower",
    "towers", "supertall", "supertallskyscraper", "supertallbuilding", "skygrid", "condo",
    "condos", "apartment", "apartments",
    // activities and objects
    "food", "drink", "coffee", "restaurant", "cafe", "dining", "shopping", "shop", "store",
    "shops", "stores", "retail", "window", "windowdisplay", "display", "sign", "signage", "art",
    "mural", "graffiti", "sculpture", "statue", "people", "person", "crowd", "crowds", "man",
    "woman", "child",
    // events and times
    "fair", "festival", "event", "concert", "show", "exhibition", "protest", "rally",
    "demonstration", "parade", "night", "day", "morning", "afternoon", "evening", "sunset",
    "sunrise", "summer", "winter", "spring", "fall", "autumn",
    // transit
    "transit", "ttc", "subway", "bus", "streetcar", "train", "tram", "torontotransit",
    "metrolinx", "gotransit", "line1", "line2", "flexity", "bombardier", "ttcflexity", "lrv",
    "fleet",
    // street names
    "bloor", "yonge", "queen", "king", "dundas", "college", "wellesley", "bay", "university",
    "spadina", "bathurst",
    // developers
    "tridel", "mizrahi", "mizrahidevelopments", "cadillacfairview",
    // colours and descriptors
    "red", "blue", "green", "yellow", "black", "white", "grey", "gray", "new", "old", "modern",
    "historic", "contemporary", "vintage",
    // generic subjects
    "selfportrait", "selfie", "portrait", "pattern", "light", "shadow", "reflection",
    "abstract", "detail", "texture", "perspective",
];

/// Classifies tags as landmark candidates or generic noise.
///
/// # Examples
///
/// ```
/// use hotspot_core::TagFilter;
///
/// let filter = TagFilter::default();
/// assert!(!filter.accepts("toronto"));
/// assert!(filter.accepts("cntower"));
/// assert!(!filter.accepts("ab"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagFilter {
    stop_words: HashSet<String>,
    strict: bool,
}

impl TagFilter {
    /// Build a filter from an explicit stop-list.
    ///
    /// Entries are lowercased so membership is case-insensitive.
    #[must_use]
    pub fn new<I, S>(stop_words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            stop_words: stop_words
                .into_iter()
                .map(|word| word.as_ref().to_lowercase())
                .collect(),
            strict: false,
        }
    }

    /// Extend the stop-list.
    #[must_use]
    pub fn with_extra_stop_words<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.stop_words
            .extend(words.into_iter().map(|word| word.as_ref().to_lowercase()));
        self
    }

    /// Toggle the stricter heuristics: reject tags over 30 characters, tags
    /// containing a run of three or more digits, and tags with more than two
    /// uppercase letters.
    #[must_use]
    pub fn with_strict_heuristics(mut self, enabled: bool) -> Self {
        self.strict = enabled;
        self
    }

    /// Report whether `tag` is an exact stop-list member.
    #[must_use]
    pub fn is_stop_word(&self, tag: &str) -> bool {
        self.stop_words.contains(&tag.to_lowercase())
    }

    /// Decide whether `tag` is a plausible landmark name.
    ///
    /// Callers normally pass a lowercased tag. Passing the original spelling
    /// is also safe and lets the strict uppercase heuristic see it.
    #[must_use]
    pub fn accepts(&self, tag: &str) -> bool {
        let length = tag.chars().count();
        if length < MIN_TAG_CHARS || self.is_stop_word(tag) {
            return false;
        }
        !(self.strict && fails_strict_heuristics(tag, length))
    }
}

impl Default for TagFilter {
    fn default() -> Self {
        Self::new(DEFAULT_STOP_WORDS)
    }
}

fn fails_strict_heuristics(tag: &str, length: usize) -> bool {
    length > MAX_STRICT_TAG_CHARS
        || longest_digit_run(tag) >= MAX_STRICT_DIGIT_RUN
        || tag.chars().filter(|ch| ch.is_uppercase()).count() > MAX_STRICT_UPPERCASE
}

fn longest_digit_run(tag: &str) -> usize {
    let (longest, _) = tag.chars().fold((0, 0), |(longest, current), ch| {
        if ch.is_ascii_digit() {
            (longest.max(current + 1), current + 1)
        } else {
            (longest, 0)
        }
    });
    longest
}
