//! Snapshot fixtures shared by the CLI tests.
#![expect(clippy::expect_used, reason = "tests should fail fast when setup breaks")]

use camino::{Utf8Path, Utf8PathBuf};
use chrono::{DateTime, TimeZone, Utc};
use hotspot_core::PhotoRecord;
use hotspot_core::test_support::photo_at;
use tempfile::TempDir;

/// Temporary directory with a UTF-8 root.
#[derive(Debug)]
pub(super) struct Workspace {
    _dir: TempDir,
    root: Utf8PathBuf,
}

impl Workspace {
    pub(super) fn new() -> Self {
        let dir = TempDir::new().expect("tempdir");
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 workspace");
        Self { _dir: dir, root }
    }

    pub(super) fn path(&self, name: &str) -> Utf8PathBuf {
        self.root.join(name)
    }
}

pub(super) fn write_utf8(path: &Utf8Path, contents: &str) {
    hotspot_fs::write_utf8_file(path, contents).expect("write test file");
}

pub(super) fn uploaded() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 9, 1, 12, 0, 0)
        .single()
        .expect("valid timestamp")
}

pub(super) fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0)
        .single()
        .expect("valid timestamp")
}

/// Twelve `rom` photos: four from one grid cell, eight scattered.
#[expect(clippy::float_arithmetic, reason = "test builds float coordinates")]
pub(super) fn rom_photos() -> Vec<PhotoRecord> {
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
            photo_at(&format!("rom-h{i}"), "rom", lat, lng, uploaded())
                .with_image_url(format!("https://img.example/rom-h{i}.jpg"))
        })
        .collect();
    for i in 0..8_u32 {
        let offset = f64::from(i) * 0.001;
        photos.push(photo_at(
            &format!("rom-s{i}"),
            "rom",
            43.660 + offset,
            -79.390 - offset,
            uploaded(),
        ));
    }
    photos
}

pub(super) fn write_snapshot(path: &Utf8Path, photos: &[PhotoRecord]) {
    let json = serde_json::to_string(photos).expect("serialise photos");
    write_utf8(path, &json);
}
