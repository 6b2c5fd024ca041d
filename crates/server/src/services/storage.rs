//! Image storage on the local filesystem.
//!
//! Images are written to `<root>/<department>/<millis>[.<ext>]` and served
//! back under `/uploads/<department>/<file>`.

use std::io;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use chrono::Utc;
use thiserror::Error;
use tracing::{debug, instrument};

use photobooth_core::Department;

/// URL prefix the uploads root is served under.
pub const PUBLIC_PREFIX: &str = "uploads";

/// Longest file extension carried over from the uploaded file name.
const MAX_EXTENSION_LENGTH: usize = 10;

/// Errors that can occur while writing an image.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The department directory could not be created.
    #[error("failed to create directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The image bytes could not be written.
    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// An image that has been written to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredImage {
    /// Location on the local filesystem.
    pub file_path: PathBuf,
    /// Path relative to the server root, e.g. `uploads/Engineering/1700000000000.png`.
    pub public_path: String,
}

/// Writes uploaded images under a root directory, one subdirectory per
/// department.
#[derive(Debug, Clone)]
pub struct ImageStorage {
    root: PathBuf,
}

impl ImageStorage {
    /// Create a storage rooted at `root`. Nothing is created until the first
    /// write.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The uploads root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Store an image named after the current time.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the directory cannot be created or the file
    /// cannot be written.
    pub async fn store(
        &self,
        department: &Department,
        original_name: Option<&str>,
        data: Bytes,
    ) -> Result<StoredImage, StorageError> {
        self.store_at(department, original_name, data, Utc::now().timestamp_millis())
            .await
    }

    /// Store an image named after `timestamp_millis`.
    ///
    /// An existing file with the same name is overwritten.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the directory cannot be created or the file
    /// cannot be written.
    #[instrument(skip(self, data), fields(department = %department, bytes = data.len()))]
    pub async fn store_at(
        &self,
        department: &Department,
        original_name: Option<&str>,
        data: Bytes,
        timestamp_millis: i64,
    ) -> Result<StoredImage, StorageError> {
        let dir = self.root.join(department.as_str());
        // Succeeds when the directory already exists, including when another
        // request created it a moment ago.
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|source| StorageError::CreateDir {
                path: dir.clone(),
                source,
            })?;

        let file_name = file_name_for(timestamp_millis, original_name);
        let file_path = dir.join(&file_name);

        tokio::fs::write(&file_path, &data)
            .await
            .map_err(|source| StorageError::Write {
                path: file_path.clone(),
                source,
            })?;

        debug!(path = %file_path.display(), "Image written");

        Ok(StoredImage {
            public_path: format!("{PUBLIC_PREFIX}/{}/{file_name}", department.as_str()),
            file_path,
        })
    }
}

/// Build `<millis>.<ext>` from the upload's original name.
///
/// The extension is dropped unless it is 1-10 ASCII alphanumerics.
fn file_name_for(timestamp_millis: i64, original_name: Option<&str>) -> String {
    match original_name.and_then(extension_of) {
        Some(ext) => format!("{timestamp_millis}.{ext}"),
        None => timestamp_millis.to_string(),
    }
}

fn extension_of(name: &str) -> Option<&str> {
    let (stem, ext) = name.rsplit_once('.')?;
    let valid = !stem.is_empty()
        && !ext.is_empty()
        && ext.len() <= MAX_EXTENSION_LENGTH
        && ext.chars().all(|c| c.is_ascii_alphanumeric());
    valid.then_some(ext)
}
