//! [`PhotoSource`] reading a JSON snapshot of photo records.
//!
//! The file holds a JSON array of records in the serialised form of
//! [`PhotoRecord`]. Only photos inside the requested region are returned.
//! Records without a position are kept because they still count towards tag
//! frequency, and records with out-of-range coordinates are passed through so
//! the pipeline can count them as dropped. Elements that do not decode as a
//! record are skipped with a warning and reported as rejected.

use async_trait::async_trait;
use camino::{Utf8Path, Utf8PathBuf};
use hotspot_core::{
    FetchedPhotos, PhotoRecord, PhotoSource, PhotoSourceError, Region, validated_coord,
};
use log::{debug, warn};
use serde_json::Value;

/// Serves photos from a JSON file on disk.
#[derive(Debug, Clone)]
pub struct JsonFilePhotoSource {
    path: Utf8PathBuf,
}

impl JsonFilePhotoSource {
    /// Read photos from `path` on every fetch.
    #[must_use]
    pub fn new(path: impl Into<Utf8PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the snapshot.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// Read the snapshot and decode each record on its own.
    ///
    /// # Errors
    ///
    /// Returns [`PhotoSourceError::Io`] when the file cannot be read and
    /// [`PhotoSourceError::Decode`] when it is not a JSON array.
    pub fn load(&self) -> Result<FetchedPhotos, PhotoSourceError> {
        let contents =
            hotspot_fs::read_utf8_file(&self.path).map_err(|source| PhotoSourceError::Io {
                path: self.path.to_string(),
                source,
            })?;
        let elements: Vec<Value> =
            serde_json::from_str(&contents).map_err(|err| PhotoSourceError::Decode {
                message: format!("{}: {err}", self.path),
            })?;

        let mut fetched = FetchedPhotos::default();
        for (index, element) in elements.into_iter().enumerate() {
            match serde_json::from_value::<PhotoRecord>(element) {
                Ok(photo) => fetched.photos.push(photo),
                Err(err) => {
                    warn!("skipping record {index} in {}: {err}", self.path);
                    fetched.rejected += 1;
                }
            }
        }
        Ok(fetched)
    }
}

fn in_region(region: &Region, photo: &PhotoRecord) -> bool {
    let Some(position) = photo.position else {
        return true;
    };
    validated_coord(position.y, position.x).is_none_or(|coord| region.contains(coord))
}

#[async_trait(?Send)]
impl PhotoSource for JsonFilePhotoSource {
    async fn fetch(&self, region: &Region) -> Result<Vec<PhotoRecord>, PhotoSourceError> {
        self.fetch_batch(region).await.map(|fetched| fetched.photos)
    }

    async fn fetch_batch(&self, region: &Region) -> Result<FetchedPhotos, PhotoSourceError> {
        let FetchedPhotos { photos, rejected } = self.load()?;
        let total = photos.len();
        let photos: Vec<_> = photos
            .into_iter()
            .filter(|photo| in_region(region, photo))
            .collect();
        debug!(
            "{} of {total} photos in {} fall inside the region",
            photos.len(),
            self.path
        );
        Ok(FetchedPhotos { photos, rejected })
    }
}
