//! Behavioural tests seeding a SQLite store from a JSON photo snapshot.
#![expect(clippy::expect_used, reason = "tests should fail fast when setup breaks")]

use std::cell::RefCell;

use camino::Utf8PathBuf;
use chrono::{DateTime, TimeZone, Utc};
use hotspot_core::test_support::photo_at;
use hotspot_core::{PhotoRecord, Pipeline, PipelineConfig, Region, RunReport};
use hotspot_data::{JsonFilePhotoSource, SqliteGateway, StoreSummary, StoredSpot};
use hotspot_scorer::ScoringEngine;
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use tempfile::TempDir;

/// Snapshot file kept alive for the scenario.
struct Snapshot {
    _dir: TempDir,
    path: Utf8PathBuf,
}

#[derive(Debug, Default)]
struct SeedOutcome {
    summary: StoreSummary,
    last_report: RunReport,
    hotspots: Vec<StoredSpot>,
}

#[fixture]
fn snapshot() -> RefCell<Option<Snapshot>> {
    RefCell::new(None)
}

#[fixture]
fn outcome() -> RefCell<SeedOutcome> {
    RefCell::new(SeedOutcome::default())
}

fn uploaded() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 9, 1, 12, 0, 0)
        .single()
        .expect("valid timestamp")
}

#[expect(clippy::float_arithmetic, reason = "test builds float coordinates")]
fn rom_photos(latitude_shift: f64) -> Vec<PhotoRecord> {
    let near = [
        (43.667_71, -79.394_71),
        (43.667_74, -79.394_68),
        (43.667_69, -79.394_66),
        (43.667_66, -79.394_74),
    ];
    let mut photos: Vec<_> = near
        .into_iter()
        .enumerate()
        .map(|(i, (lat, lng))| {
            photo_at(&format!("rom-h{i}"), "rom", lat + latitude_shift, lng, uploaded())
        })
        .collect();
    for i in 0..8_u32 {
        let offset = f64::from(i) * 0.001;
        photos.push(photo_at(
            &format!("rom-s{i}"),
            "rom",
            43.660 + offset + latitude_shift,
            -79.390 - offset,
            uploaded(),
        ));
    }
    photos
}

fn write_snapshot(cell: &RefCell<Option<Snapshot>>, photos: &[PhotoRecord]) {
    let dir = TempDir::new().expect("temp dir");
    let path = Utf8PathBuf::from_path_buf(dir.path().join("photos.json")).expect("utf-8 path");
    let json = serde_json::to_string(photos).expect("serialise photos");
    hotspot_fs::write_utf8_file(&path, &json).expect("write snapshot");
    cell.replace(Some(Snapshot { _dir: dir, path }));
}

#[given("a snapshot of twelve photos tagged \"rom\" with four taken from one spot")]
fn given_rom(#[from(snapshot)] snapshot: &RefCell<Option<Snapshot>>) {
    write_snapshot(snapshot, &rom_photos(0.0));
}

#[given("a snapshot of twelve photos tagged \"rom\" taken far from the region")]
fn given_far_rom(#[from(snapshot)] snapshot: &RefCell<Option<Snapshot>>) {
    write_snapshot(snapshot, &rom_photos(1.0));
}

fn seed(snapshot: &RefCell<Option<Snapshot>>, runs: usize) -> SeedOutcome {
    let guard = snapshot.borrow();
    let path = guard.as_ref().expect("snapshot written").path.clone();
    let config = PipelineConfig::default();
    let scorer = ScoringEngine::from_config(&config).expect("valid scorer");
    let gateway = SqliteGateway::open_in_memory().expect("store");
    let pipeline = Pipeline::new(config, JsonFilePhotoSource::new(path), gateway, scorer)
        .expect("valid pipeline");
    let region = Region::new(43.6677, -79.3947, 5_000.0).expect("valid region");
    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .expect("build runtime");

    let mut last_report = RunReport::default();
    for _ in 0..runs {
        last_report = runtime.block_on(pipeline.run(&region, uploaded()));
    }

    let store = pipeline.gateway();
    let hotspots = store
        .landmarks()
        .expect("landmarks")
        .iter()
        .flat_map(|landmark| {
            store
                .hotspots(&hotspot_core::LandmarkId(landmark.id.to_string()))
                .expect("hotspots")
        })
        .collect();
    SeedOutcome {
        summary: store.summary().expect("summary"),
        last_report,
        hotspots,
    }
}

#[when("the pipeline seeds a fresh store once")]
fn when_seed_once(
    #[from(snapshot)] snapshot: &RefCell<Option<Snapshot>>,
    #[from(outcome)] outcome: &RefCell<SeedOutcome>,
) {
    outcome.replace(seed(snapshot, 1));
}

#[when("the pipeline seeds a fresh store twice")]
fn when_seed_twice(
    #[from(snapshot)] snapshot: &RefCell<Option<Snapshot>>,
    #[from(outcome)] outcome: &RefCell<SeedOutcome>,
) {
    outcome.replace(seed(snapshot, 2));
}

#[then("the store holds 1 landmark, 1 hotspot and 4 photos")]
fn then_one_of_each(#[from(outcome)] outcome: &RefCell<SeedOutcome>) {
    assert_eq!(
        outcome.borrow().summary,
        StoreSummary {
            landmarks: 1,
            hotspots: 1,
            photos: 4,
        }
    );
}

#[then("the store holds 0 landmarks, 0 hotspots and 0 photos")]
fn then_empty(#[from(outcome)] outcome: &RefCell<SeedOutcome>) {
    assert_eq!(outcome.borrow().summary, StoreSummary::default());
}

#[then("the hotspot is titled \"Photo spot for rom\"")]
fn then_titled(#[from(outcome)] outcome: &RefCell<SeedOutcome>) {
    let outcome = outcome.borrow();
    let hotspot = outcome.hotspots.first().expect("hotspot");
    assert_eq!(hotspot.name, "Photo spot for rom");
    assert_eq!(hotspot.photo_count, 4);
}

#[then("the last run inserted no photos")]
fn then_no_new_photos(#[from(outcome)] outcome: &RefCell<SeedOutcome>) {
    let outcome = outcome.borrow();
    assert_eq!(outcome.last_report.landmarks_processed, 1);
    assert_eq!(outcome.last_report.hotspots_created, 1);
    assert_eq!(outcome.last_report.photos_inserted, 0);
}

#[scenario(path = "tests/features/seeding.feature", index = 0)]
fn single_vantage_point(snapshot: RefCell<Option<Snapshot>>, outcome: RefCell<SeedOutcome>) {
    let _ = (snapshot, outcome);
}

#[scenario(path = "tests/features/seeding.feature", index = 1)]
fn reseeding(snapshot: RefCell<Option<Snapshot>>, outcome: RefCell<SeedOutcome>) {
    let _ = (snapshot, outcome);
}

#[scenario(path = "tests/features/seeding.feature", index = 2)]
fn outside_region(snapshot: RefCell<Option<Snapshot>>, outcome: RefCell<SeedOutcome>) {
    let _ = (snapshot, outcome);
}
