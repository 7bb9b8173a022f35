//! Behaviour-driven step definitions driving the seed CLI scenarios.
#![expect(
    clippy::expect_used,
    clippy::indexing_slicing,
    reason = "tests index known fixtures and fail fast when setup breaks"
)]

use super::helpers::{Workspace, now, rom_photos, write_snapshot};
use super::*;
use crate::seed::run_seed_with;
use camino::Utf8PathBuf;
use hotspot_data::{SqliteGateway, StoreSummary};
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use std::cell::RefCell;

#[derive(Debug)]
struct SeedWorld {
    _workspace: Workspace,
    snapshot_path: Utf8PathBuf,
    database_path: Utf8PathBuf,
    include_snapshot: RefCell<bool>,
    include_latitude: RefCell<bool>,
    stdout: RefCell<Vec<u8>>,
    result: RefCell<Option<Result<(), CliError>>>,
}

impl SeedWorld {
    fn new() -> Self {
        let workspace = Workspace::new();
        let snapshot_path = workspace.path("photos.json");
        let database_path = workspace.path("hotspots.db");
        Self {
            _workspace: workspace,
            snapshot_path,
            database_path,
            include_snapshot: RefCell::new(true),
            include_latitude: RefCell::new(true),
            stdout: RefCell::new(Vec::new()),
            result: RefCell::new(None),
        }
    }

    fn build_command_line(&self) -> Vec<String> {
        let mut argv = vec!["hotspots".to_owned(), "seed".to_owned()];
        if *self.include_latitude.borrow() {
            argv.extend([format!("--{ARG_LATITUDE}"), "43.6677".to_owned()]);
        }
        argv.extend([
            format!("--{ARG_LONGITUDE}"),
            "-79.3947".to_owned(),
            format!("--{ARG_RADIUS}"),
            "5000".to_owned(),
            format!("--{ARG_DATABASE}"),
            self.database_path.as_str().to_owned(),
        ]);
        if *self.include_snapshot.borrow() {
            argv.extend([
                format!("--{ARG_PHOTOS}"),
                self.snapshot_path.as_str().to_owned(),
            ]);
        }
        argv
    }

    fn run_once(&self) {
        let invocation = self.build_command_line();
        let parsed = Cli::try_parse_from(invocation).map_err(CliError::from);
        let mut buffer = self.stdout.borrow_mut();
        buffer.clear();
        let outcome = parsed.and_then(|cli| match cli.command {
            Command::Seed(args) => run_seed_with(args, now(), &mut *buffer),
            Command::Cluster(_) => panic!("expected seed command"),
        });
        self.result.replace(Some(outcome));
    }

    fn error(&self) -> std::cell::Ref<'_, CliError> {
        std::cell::Ref::map(self.result.borrow(), |result| {
            result
                .as_ref()
                .expect("result recorded")
                .as_ref()
                .expect_err("expected error")
        })
    }

    fn report(&self) -> serde_json::Value {
        let borrowed = self.result.borrow();
        let result = borrowed.as_ref().expect("result recorded");
        result.as_ref().expect("expected success");
        serde_json::from_slice(&self.stdout.borrow()).expect("output should be a JSON report")
    }
}

#[fixture]
fn world() -> SeedWorld {
    SeedWorld::new()
}

#[given("a snapshot of twelve \"rom\" photos exists on disk")]
fn rom_snapshot_exists(#[from(world)] world: &SeedWorld) {
    write_snapshot(&world.snapshot_path, &rom_photos());
}

#[given("I omit the latitude")]
fn omit_latitude(#[from(world)] world: &SeedWorld) {
    *world.include_latitude.borrow_mut() = false;
}

#[given("I do not supply a photo snapshot")]
fn omit_snapshot(#[from(world)] world: &SeedWorld) {
    *world.include_snapshot.borrow_mut() = false;
}

#[when("I run the seed command")]
fn run_seed_command(#[from(world)] world: &SeedWorld) {
    world.run_once();
}

#[when("I run the seed command twice")]
fn run_seed_command_twice(#[from(world)] world: &SeedWorld) {
    world.run_once();
    world.run_once();
}

#[then("the command succeeds and reports 1 landmark, 1 hotspot and 4 photos")]
fn reports_first_run(#[from(world)] world: &SeedWorld) {
    let report = world.report();
    assert_eq!(report["landmarks_processed"], 1);
    assert_eq!(report["hotspots_created"], 1);
    assert_eq!(report["photos_inserted"], 4);
}

#[then("the command succeeds and reports 1 landmark, 1 hotspot and 0 photos")]
fn reports_rerun(#[from(world)] world: &SeedWorld) {
    let report = world.report();
    assert_eq!(report["landmarks_processed"], 1);
    assert_eq!(report["hotspots_created"], 1);
    assert_eq!(report["photos_inserted"], 0);
}

#[then("the database holds 1 landmark, 1 hotspot and 4 photos")]
fn database_holds_rows(#[from(world)] world: &SeedWorld) {
    let summary = SqliteGateway::open(&world.database_path)
        .expect("open store")
        .summary()
        .expect("summary");
    assert_eq!(
        summary,
        StoreSummary {
            landmarks: 1,
            hotspots: 1,
            photos: 4,
        }
    );
}

#[then("the command fails because the lat option is missing")]
fn fails_without_latitude(#[from(world)] world: &SeedWorld) {
    match &*world.error() {
        CliError::MissingArgument { field, .. } => assert_eq!(*field, ARG_LATITUDE),
        other => panic!("expected MissingArgument, found {other:?}"),
    }
}

#[then("the command fails because the flickr-api-key option is missing")]
fn fails_without_source(#[from(world)] world: &SeedWorld) {
    match &*world.error() {
        CliError::MissingArgument { field, env } => {
            assert_eq!(*field, ARG_FLICKR_API_KEY);
            assert_eq!(*env, ENV_SEED_FLICKR_API_KEY);
        }
        other => panic!("expected MissingArgument, found {other:?}"),
    }
}

#[then("the command fails because the snapshot does not exist")]
fn fails_with_missing_snapshot(#[from(world)] world: &SeedWorld) {
    match &*world.error() {
        CliError::MissingSourceFile { field, path } => {
            assert_eq!(*field, ARG_PHOTOS);
            assert_eq!(path, &world.snapshot_path);
        }
        other => panic!("expected MissingSourceFile, found {other:?}"),
    }
}

macro_rules! register_seed_scenario {
    ($fn_name:ident, $scenario_title:literal) => {
        #[scenario(path = "tests/features/seed_command.feature", name = $scenario_title)]
        fn $fn_name(#[from(world)] world: SeedWorld) {
            let _ = world;
        }
    };
}

register_seed_scenario!(seed_from_snapshot, "seeding from a photo snapshot");
register_seed_scenario!(reseed_from_snapshot, "reseeding leaves the store unchanged");
register_seed_scenario!(seed_missing_latitude, "rejecting a missing latitude");
register_seed_scenario!(seed_without_source, "rejecting a run without any photo source");
register_seed_scenario!(seed_missing_snapshot, "rejecting a snapshot that does not exist");
