//! Unit coverage for the scoring engine.
#![expect(clippy::expect_used, reason = "tests should fail fast when setup breaks")]
#![forbid(unsafe_code)]

use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use hotspot_core::{ConfigError, Engagement, PhotoRecord, ScoringWeights, SpotScorer};
use rstest::{fixture, rstest};

use crate::presentation::PresentationScale;
use crate::{ScoringEngine, SpotSignals};

#[fixture]
fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0)
        .single()
        .expect("valid timestamp")
}

#[fixture]
fn engine() -> ScoringEngine {
    ScoringEngine::new(ScoringWeights::default(), TimeDelta::days(365)).expect("valid engine")
}

fn photo(id: &str, owner: &str, uploaded_at: DateTime<Utc>) -> PhotoRecord {
    PhotoRecord::new(id, owner, uploaded_at)
}

fn weights_only(field: &str) -> ScoringWeights {
    let mut weights = ScoringWeights {
        count: 0.0,
        favorites: 0.0,
        views: 0.0,
        recency: 0.0,
        duplicate: 0.0,
    };
    match field {
        "count" => weights.count = 1.0,
        "favorites" => weights.favorites = 1.0,
        "views" => weights.views = 1.0,
        "recency" => weights.recency = 1.0,
        _ => weights.duplicate = 1.0,
    }
    weights
}

#[rstest]
fn empty_collection_scores_zero(engine: ScoringEngine, now: DateTime<Utc>) {
    assert_eq!(engine.score_photos(&[], now), 0.0);
}

#[rstest]
fn extracts_signals(engine: ScoringEngine, now: DateTime<Utc>) {
    let old = now - TimeDelta::days(400);
    let photos = vec![
        photo("a", "alice", now).with_engagement(Engagement::new(2, 100)),
        photo("b", "alice", old).with_engagement(Engagement::new(3, 50)),
        photo("c", "bob", now),
    ];

    let signals = engine.signals(&photos, now);

    assert_eq!(
        signals,
        SpotSignals {
            photo_count: 3,
            favorites: 5,
            views: 150,
            recent: 2,
            duplicates: 1,
        }
    );
}

#[rstest]
fn recency_boundary_is_inclusive(now: DateTime<Utc>) {
    let engine = ScoringEngine::new(weights_only("recency"), TimeDelta::days(30)).expect("engine");
    let photos = vec![
        photo("edge", "a", now - TimeDelta::days(30)),
        photo("stale", "b", now - TimeDelta::days(31)),
    ];
    assert_eq!(engine.score_photos(&photos, now), 1.0);
}

#[rstest]
#[expect(clippy::float_arithmetic, reason = "test compares float scores")]
fn count_term_is_log_scaled(now: DateTime<Utc>) {
    let engine = ScoringEngine::new(weights_only("count"), TimeDelta::days(1)).expect("engine");
    let photos: Vec<_> = (0..9)
        .map(|i| photo(&format!("p{i}"), &format!("o{i}"), now))
        .collect();
    let score = engine.score_photos(&photos, now);
    assert!((score - 10_f64.ln()).abs() < 1e-12);
}

#[rstest]
#[expect(clippy::float_arithmetic, reason = "test compares float scores")]
fn engagement_terms_use_totals(now: DateTime<Utc>) {
    let favorites =
        ScoringEngine::new(weights_only("favorites"), TimeDelta::days(1)).expect("engine");
    let views = ScoringEngine::new(weights_only("views"), TimeDelta::days(1)).expect("engine");
    let photos = vec![
        photo("a", "o1", now).with_engagement(Engagement::new(4, 10)),
        photo("b", "o2", now).with_engagement(Engagement::new(5, 20)),
    ];
    assert!((favorites.score_photos(&photos, now) - 10_f64.ln()).abs() < 1e-12);
    assert!((views.score_photos(&photos, now) - 31_f64.ln()).abs() < 1e-12);
}

#[rstest]
#[expect(clippy::float_arithmetic, reason = "test compares float scores")]
fn duplicate_owner_lowers_score(engine: ScoringEngine, now: DateTime<Utc>) {
    let distinct: Vec<_> = (0..10)
        .map(|i| photo(&format!("p{i}"), &format!("o{i}"), now))
        .collect();
    let mut repeated = distinct.clone();
    for photo in repeated.iter_mut().take(3) {
        photo.owner_id = "prolific".to_owned();
    }

    let delta = engine.score_photos(&distinct, now) - engine.score_photos(&repeated, now);

    assert!((delta - 2.0).abs() < 1e-12);
}

#[rstest]
fn negative_scores_are_not_clamped(now: DateTime<Utc>) {
    let engine = ScoringEngine::new(weights_only("duplicate"), TimeDelta::days(1)).expect("engine");
    let photos: Vec<_> = (0..4).map(|i| photo(&format!("p{i}"), "same", now)).collect();
    assert_eq!(engine.score_photos(&photos, now), -3.0);
}

#[rstest]
fn scoring_is_idempotent(engine: ScoringEngine, now: DateTime<Utc>) {
    let photos = vec![photo("a", "o", now).with_engagement(Engagement::new(1, 7))];
    let first = engine.score_photos(&photos, now);
    let second = engine.score_photos(&photos, now);
    assert_eq!(first.to_bits(), second.to_bits());
    assert_eq!(SpotScorer::score(&engine, &photos, now).to_bits(), first.to_bits());
}

#[rstest]
fn rejects_negative_weight() {
    let weights = ScoringWeights {
        recency: -1.0,
        ..ScoringWeights::default()
    };
    assert!(matches!(
        ScoringEngine::new(weights, TimeDelta::days(1)),
        Err(ConfigError::InvalidWeight {
            field: "recency",
            ..
        })
    ));
}

#[rstest]
#[case(TimeDelta::zero())]
#[case(TimeDelta::days(-1))]
fn rejects_non_positive_window(#[case] window: TimeDelta) {
    assert_eq!(
        ScoringEngine::new(ScoringWeights::default(), window),
        Err(ConfigError::ZeroRecencyWindow)
    );
}

#[rstest]
fn handles_extreme_windows(now: DateTime<Utc>) {
    let engine = ScoringEngine::new(weights_only("recency"), TimeDelta::MAX).expect("engine");
    let photos = vec![photo("ancient", "o", DateTime::<Utc>::MIN_UTC)];
    assert_eq!(engine.score_photos(&photos, now), 1.0);
}

#[rstest]
#[case(0, 0.0)]
#[case(25, 0.5)]
#[case(50, 1.0)]
#[case(120, 1.0)]
fn landmark_presentation_scale(#[case] count: usize, #[case] expected: f64) {
    assert_eq!(PresentationScale::default().landmark(count), expected);
}

#[rstest]
#[case(3, 0.3)]
#[case(10, 1.0)]
#[case(11, 1.0)]
#[expect(clippy::float_arithmetic, reason = "test compares float scores")]
fn hotspot_presentation_scale(#[case] count: usize, #[case] expected: f64) {
    assert!((PresentationScale::default().hotspot(count) - expected).abs() < 1e-12);
}

#[rstest]
fn presentation_ignores_unusable_divisors() {
    let scale = PresentationScale::new(0.0, f64::NAN);
    assert_eq!(scale, PresentationScale::default());
}
