//! SQLite persistence for landmarks, hotspots and their photos.
//!
//! [`SqliteGateway`] implements [`PersistenceGateway`] over a single
//! connection. Landmarks are identified by `(key, source)`, hotspots by
//! `(landmark, grid cell, source)` and photos by `(hotspot, "source:id")`, so
//! rerunning the pipeline over the same input updates rows in place and
//! inserts no duplicate photos.
//!
//! Each spot carries the raw engine score and a bounded display score from
//! [`PresentationScale`].
#![forbid(unsafe_code)]

use std::cell::{RefCell, RefMut};

use async_trait::async_trait;
use camino::{Utf8Path, Utf8PathBuf};
use hotspot_core::{
    GatewayError, HotspotId, HotspotUpsert, LandmarkId, LandmarkUpsert, PersistenceGateway,
    PhotoRecord, display_name,
};
use hotspot_scorer::presentation::PresentationScale;
use log::debug;
use rusqlite::{Connection, OptionalExtension, Row, params};
use thiserror::Error;

mod schema;

use schema::{HOTSPOT, LANDMARK};

/// Errors raised while opening or inspecting the store.
#[derive(Debug, Error)]
pub enum SqliteGatewayError {
    /// Failed to create the parent directory for the database file.
    #[error("failed to create parent directory for {path}")]
    CreateDirectory {
        /// Database path.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// Opening the SQLite database failed.
    #[error("failed to open SQLite database at {path}")]
    Open {
        /// Database path.
        path: Utf8PathBuf,
        /// Source error returned by `rusqlite`.
        #[source]
        source: rusqlite::Error,
    },
    /// Enabling SQLite foreign keys failed.
    #[error("failed to enable SQLite foreign keys")]
    ForeignKeys {
        /// Source error returned by `rusqlite`.
        #[source]
        source: rusqlite::Error,
    },
    /// Creating the tables failed.
    #[error("failed to create spot tables")]
    CreateSchema {
        /// Source error returned by `rusqlite`.
        #[source]
        source: rusqlite::Error,
    },
    /// A read query failed.
    #[error("failed to query stored spots")]
    Query {
        /// Source error returned by `rusqlite`.
        #[source]
        source: rusqlite::Error,
    },
    /// The connection is in use by another operation.
    #[error("SQLite connection is busy")]
    Busy,
}

/// Row counts of a store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreSummary {
    /// Landmark rows.
    pub landmarks: u64,
    /// Hotspot rows.
    pub hotspots: u64,
    /// Photo rows.
    pub photos: u64,
}

/// A landmark or hotspot row as stored.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredSpot {
    /// Row identifier.
    pub id: i64,
    /// Landmark tag, or the generated hotspot title.
    pub name: String,
    /// Human-readable name.
    pub display_name: String,
    /// Latitude, when known.
    pub latitude: Option<f64>,
    /// Longitude, when known.
    pub longitude: Option<f64>,
    /// Photos attributed to the spot at the last upsert.
    pub photo_count: i64,
    /// Raw engine score.
    pub score: f64,
    /// Display score in `0.0..=1.0`.
    pub display_score: f64,
    /// Cover image URL.
    pub cover_photo: Option<String>,
    /// Generated description, hotspots only.
    pub description: Option<String>,
}

impl StoredSpot {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            display_name: row.get(2)?,
            latitude: row.get(3)?,
            longitude: row.get(4)?,
            photo_count: row.get(5)?,
            score: row.get(6)?,
            display_score: row.get(7)?,
            cover_photo: row.get(8)?,
            description: row.get(9)?,
        })
    }
}

const SPOT_COLUMNS: &str = "id, name, display_name, lat, lng, photo_count, score, \
                            display_score, cover_photo, description";

/// [`PersistenceGateway`] writing to a SQLite database.
///
/// # Example
///
/// ```
/// use hotspot_data::sqlite::SqliteGateway;
///
/// let gateway = SqliteGateway::open_in_memory()?;
/// assert_eq!(gateway.summary()?.landmarks, 0);
/// # Ok::<(), hotspot_data::sqlite::SqliteGatewayError>(())
/// ```
#[derive(Debug)]
pub struct SqliteGateway {
    connection: RefCell<Connection>,
    scale: PresentationScale,
}

impl SqliteGateway {
    /// Open or create the database at `path`.
    ///
    /// Parent directories are created automatically and missing tables are
    /// initialised.
    ///
    /// # Errors
    ///
    /// Returns an error when the directory, connection or schema cannot be
    /// set up.
    pub fn open(path: &Utf8Path) -> Result<Self, SqliteGatewayError> {
        hotspot_fs::ensure_parent_dir(path).map_err(|source| {
            SqliteGatewayError::CreateDirectory {
                path: path.to_path_buf(),
                source,
            }
        })?;
        let connection =
            Connection::open(path.as_std_path()).map_err(|source| SqliteGatewayError::Open {
                path: path.to_path_buf(),
                source,
            })?;
        Self::initialise(connection)
    }

    /// Open a private in-memory database.
    ///
    /// # Errors
    ///
    /// Returns an error when the connection or schema cannot be set up.
    pub fn open_in_memory() -> Result<Self, SqliteGatewayError> {
        let connection =
            Connection::open_in_memory().map_err(|source| SqliteGatewayError::Open {
                path: Utf8PathBuf::from(":memory:"),
                source,
            })?;
        Self::initialise(connection)
    }

    fn initialise(connection: Connection) -> Result<Self, SqliteGatewayError> {
        connection
            .pragma_update(None, "foreign_keys", true)
            .map_err(|source| SqliteGatewayError::ForeignKeys { source })?;
        schema::create(&connection).map_err(|source| SqliteGatewayError::CreateSchema { source })?;
        Ok(Self {
            connection: RefCell::new(connection),
            scale: PresentationScale::default(),
        })
    }

    /// Replace the display-score scale.
    #[must_use]
    pub const fn with_scale(mut self, scale: PresentationScale) -> Self {
        self.scale = scale;
        self
    }

    /// Count stored rows.
    ///
    /// # Errors
    ///
    /// Returns an error when the query fails or the connection is busy.
    pub fn summary(&self) -> Result<StoreSummary, SqliteGatewayError> {
        let connection = self
            .connection
            .try_borrow()
            .map_err(|_| SqliteGatewayError::Busy)?;
        let count = |sql: &str| -> Result<u64, SqliteGatewayError> {
            let value: i64 = connection
                .query_row(sql, [], |row| row.get(0))
                .map_err(|source| SqliteGatewayError::Query { source })?;
            Ok(u64::try_from(value).unwrap_or_default())
        };
        Ok(StoreSummary {
            landmarks: count("SELECT COUNT(*) FROM spots WHERE kind = 'landmark'")?,
            hotspots: count("SELECT COUNT(*) FROM spots WHERE kind = 'hotspot'")?,
            photos: count("SELECT COUNT(*) FROM photos")?,
        })
    }

    /// Stored landmarks, highest score first.
    ///
    /// # Errors
    ///
    /// Returns an error when the query fails or the connection is busy.
    pub fn landmarks(&self) -> Result<Vec<StoredSpot>, SqliteGatewayError> {
        self.spots(
            &format!(
                "SELECT {SPOT_COLUMNS} FROM spots WHERE kind = 'landmark' \
                 ORDER BY score DESC, id"
            ),
            [],
        )
    }

    /// Hotspots stored beneath `landmark_id`, highest score first.
    ///
    /// # Errors
    ///
    /// Returns an error when the query fails or the connection is busy.
    pub fn hotspots(
        &self,
        landmark_id: &LandmarkId,
    ) -> Result<Vec<StoredSpot>, SqliteGatewayError> {
        let Ok(parent) = landmark_id.0.parse::<i64>() else {
            return Ok(Vec::new());
        };
        self.spots(
            &format!(
                "SELECT {SPOT_COLUMNS} FROM spots WHERE kind = 'hotspot' AND parent_id = ?1 \
                 ORDER BY score DESC, id"
            ),
            [parent],
        )
    }

    fn spots<P: rusqlite::Params>(
        &self,
        sql: &str,
        params: P,
    ) -> Result<Vec<StoredSpot>, SqliteGatewayError> {
        let connection = self
            .connection
            .try_borrow()
            .map_err(|_| SqliteGatewayError::Busy)?;
        let mut statement = connection
            .prepare(sql)
            .map_err(|source| SqliteGatewayError::Query { source })?;
        let rows = statement
            .query_map(params, StoredSpot::from_row)
            .map_err(|source| SqliteGatewayError::Query { source })?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|source| SqliteGatewayError::Query { source })
    }

    fn connection(&self, operation: &'static str) -> Result<RefMut<'_, Connection>, GatewayError> {
        self.connection
            .try_borrow_mut()
            .map_err(|err| GatewayError::storage(operation, err))
    }
}

fn storage(operation: &'static str) -> impl Fn(rusqlite::Error) -> GatewayError {
    move |err| GatewayError::storage(operation, err)
}

fn parse_row_id(raw: &str, what: &str) -> Result<i64, GatewayError> {
    raw.parse().map_err(|_| GatewayError::Rejected {
        reason: format!("{what} id {raw} was not issued by this store"),
    })
}

fn to_i64(value: impl TryInto<i64>) -> i64 {
    value.try_into().unwrap_or(i64::MAX)
}

fn cover_url(photo: Option<&PhotoRecord>) -> Option<&str> {
    photo.and_then(|photo| photo.image_url.as_deref())
}

#[async_trait(?Send)]
impl PersistenceGateway for SqliteGateway {
    async fn upsert_landmark(
        &self,
        upsert: &LandmarkUpsert<'_>,
    ) -> Result<LandmarkId, GatewayError> {
        const OPERATION: &str = "upsert landmark";
        let connection = self.connection(OPERATION)?;
        let landmark = upsert.landmark;
        let photo_count = landmark.photo_count();
        let (lat, lng) = upsert
            .representative_position
            .map(|coord| (coord.y, coord.x))
            .unzip();
        let display_score = self.scale.landmark(photo_count);
        let cover = cover_url(upsert.cover_photo);

        let existing: Option<i64> = connection
            .query_row(
                "SELECT id FROM spots WHERE kind = ?1 AND source = ?2 AND landmark_key = ?3",
                params![LANDMARK, upsert.source, landmark.key],
                |row| row.get(0),
            )
            .optional()
            .map_err(storage(OPERATION))?;

        let id = match existing {
            Some(id) => {
                connection
                    .execute(
                        "UPDATE spots SET name = ?2, display_name = ?3, lat = ?4, lng = ?5, \
                         photo_count = ?6, score = ?7, display_score = ?8, cover_photo = ?9 \
                         WHERE id = ?1",
                        params![
                            id,
                            landmark.name,
                            landmark.display_name(),
                            lat,
                            lng,
                            to_i64(photo_count),
                            upsert.score,
                            display_score,
                            cover,
                        ],
                    )
                    .map_err(storage(OPERATION))?;
                id
            }
            None => {
                connection
                    .execute(
                        "INSERT INTO spots (kind, landmark_key, name, display_name, source, \
                         lat, lng, photo_count, score, display_score, cover_photo) \
                         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                        params![
                            LANDMARK,
                            landmark.key,
                            landmark.name,
                            landmark.display_name(),
                            upsert.source,
                            lat,
                            lng,
                            to_i64(photo_count),
                            upsert.score,
                            display_score,
                            cover,
                        ],
                    )
                    .map_err(storage(OPERATION))?;
                connection.last_insert_rowid()
            }
        };
        debug!("stored landmark {} as spot {id}", landmark.name);
        Ok(LandmarkId(id.to_string()))
    }

    async fn upsert_hotspot(
        &self,
        landmark_id: &LandmarkId,
        upsert: &HotspotUpsert<'_>,
    ) -> Result<HotspotId, GatewayError> {
        const OPERATION: &str = "upsert hotspot";
        let parent = parse_row_id(&landmark_id.0, "landmark")?;
        let connection = self.connection(OPERATION)?;
        let hotspot = upsert.hotspot;
        let key = hotspot.key;
        let position = hotspot.position();
        let photo_count = hotspot.photo_count();
        let landmark_display = display_name(&hotspot.landmark_name);
        let title = format!("Photo spot for {landmark_display}");
        let description = format!("{photo_count} photos of {landmark_display} taken from here");
        let display_score = self.scale.hotspot(photo_count);
        let cover = cover_url(upsert.cover_photo);

        let existing: Option<i64> = connection
            .query_row(
                "SELECT id FROM spots WHERE kind = ?1 AND source = ?2 AND parent_id = ?3 \
                 AND grid_lat = ?4 AND grid_lng = ?5 AND grid_precision = ?6",
                params![
                    HOTSPOT,
                    upsert.source,
                    parent,
                    key.lat,
                    key.lng,
                    i64::from(key.precision)
                ],
                |row| row.get(0),
            )
            .optional()
            .map_err(storage(OPERATION))?;

        let id = match existing {
            Some(id) => {
                connection
                    .execute(
                        "UPDATE spots SET name = ?2, display_name = ?2, photo_count = ?3, \
                         score = ?4, display_score = ?5, cover_photo = ?6, description = ?7 \
                         WHERE id = ?1",
                        params![
                            id,
                            title,
                            to_i64(photo_count),
                            upsert.score,
                            display_score,
                            cover,
                            description,
                        ],
                    )
                    .map_err(storage(OPERATION))?;
                id
            }
            None => {
                connection
                    .execute(
                        "INSERT INTO spots (kind, parent_id, name, display_name, source, lat, lng, \
                         grid_lat, grid_lng, grid_precision, photo_count, score, display_score, \
                         cover_photo, description) \
                         VALUES (?1, ?2, ?3, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
                        params![
                            HOTSPOT,
                            parent,
                            title,
                            upsert.source,
                            position.y,
                            position.x,
                            key.lat,
                            key.lng,
                            i64::from(key.precision),
                            to_i64(photo_count),
                            upsert.score,
                            display_score,
                            cover,
                            description,
                        ],
                    )
                    .map_err(storage(OPERATION))?;
                connection.last_insert_rowid()
            }
        };
        Ok(HotspotId(id.to_string()))
    }

    async fn insert_photos(
        &self,
        hotspot_id: &HotspotId,
        source: &str,
        photos: &[PhotoRecord],
    ) -> Result<usize, GatewayError> {
        const OPERATION: &str = "insert photos";
        let spot = parse_row_id(&hotspot_id.0, "hotspot")?;
        let mut connection = self.connection(OPERATION)?;
        let transaction = connection.transaction().map_err(storage(OPERATION))?;
        let mut inserted = 0_usize;
        {
            let mut statement = transaction
                .prepare(
                    "INSERT OR IGNORE INTO photos (spot_id, original_key, owner_id, title, \
                     image_url, lat, lng, favorites, views, uploaded_at) \
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                )
                .map_err(storage(OPERATION))?;
            for photo in photos {
                let changed = statement
                    .execute(params![
                        spot,
                        format!("{source}:{}", photo.id),
                        photo.owner_id,
                        photo.title,
                        photo.image_url,
                        photo.latitude(),
                        photo.longitude(),
                        to_i64(photo.engagement.favorites),
                        to_i64(photo.engagement.views),
                        photo.uploaded_at.to_rfc3339(),
                    ])
                    .map_err(storage(OPERATION))?;
                inserted = inserted.saturating_add(changed);
            }
        }
        transaction.commit().map_err(storage(OPERATION))?;
        Ok(inserted)
    }
}
