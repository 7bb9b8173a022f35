//! Table layout for the SQLite gateway.
#![forbid(unsafe_code)]

use rusqlite::Connection;

/// `kind` value of landmark rows.
pub(super) const LANDMARK: &str = "landmark";
/// `kind` value of hotspot rows.
pub(super) const HOTSPOT: &str = "hotspot";

// Landmarks and hotspots share `spots`; hotspots point at their landmark via
// `parent_id`. Landmarks are unique per `(source, landmark_key)`, the
// lowercased tag. Photos belong to exactly one spot and are unique per spot by
// their `source:id` key.
const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS spots (
    id INTEGER PRIMARY KEY,
    kind TEXT NOT NULL CHECK (kind IN ('landmark', 'hotspot')),
    parent_id INTEGER REFERENCES spots(id) ON DELETE CASCADE,
    landmark_key TEXT,
    name TEXT NOT NULL,
    display_name TEXT NOT NULL,
    source TEXT NOT NULL,
    lat REAL,
    lng REAL,
    grid_lat INTEGER,
    grid_lng INTEGER,
    grid_precision INTEGER,
    photo_count INTEGER NOT NULL,
    score REAL NOT NULL,
    display_score REAL NOT NULL,
    cover_photo TEXT,
    description TEXT
);
CREATE INDEX IF NOT EXISTS spots_by_parent ON spots(parent_id);
CREATE UNIQUE INDEX IF NOT EXISTS landmarks_by_key ON spots(source, landmark_key)
    WHERE kind = 'landmark';
CREATE TABLE IF NOT EXISTS photos (
    id INTEGER PRIMARY KEY,
    spot_id INTEGER NOT NULL REFERENCES spots(id) ON DELETE CASCADE,
    original_key TEXT NOT NULL,
    owner_id TEXT NOT NULL,
    title TEXT,
    image_url TEXT,
    lat REAL,
    lng REAL,
    favorites INTEGER NOT NULL,
    views INTEGER NOT NULL,
    uploaded_at TEXT NOT NULL,
    UNIQUE (spot_id, original_key)
);
";

/// Create any missing tables and indexes.
pub(super) fn create(connection: &Connection) -> rusqlite::Result<()> {
    connection.execute_batch(SCHEMA)
}
