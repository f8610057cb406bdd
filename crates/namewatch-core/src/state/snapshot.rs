// # Snapshot File
//
// Whole-document JSON persistence shared by the result cache and the
// watchlist.
//
// ## Semantics
//
// - Every write replaces the entire document (no journaling)
// - Atomic writes: the new document goes to a `.tmp` sibling, then is renamed
// - Missing file: treated as an empty document
// - Malformed file: treated as an empty document (logged, never fatal)
//
// ## File Format
//
// Pretty-printed JSON with no version field. The cache writes an object keyed
// by case-folded name; the watchlist writes an array of names:
//
// ```json
// [
//   "steve",
//   "alex"
// ]
// ```

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::Error;

/// A JSON document on disk that is always read and written whole
#[derive(Debug, Clone)]
pub struct SnapshotFile {
    path: PathBuf,
}

impl SnapshotFile {
    /// Create a handle for the snapshot at `path`
    ///
    /// Nothing is touched on disk until the first load or write.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Path of the snapshot document
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the snapshot, falling back to `T::default()`
    ///
    /// Missing, unreadable and malformed documents all yield the default
    /// value; only the latter two are logged.
    pub async fn load_or_default<T>(&self) -> T
    where
        T: DeserializeOwned + Default,
    {
        match self.load().await {
            Ok(Some(value)) => value,
            Ok(None) => {
                tracing::debug!("Snapshot does not exist: {}", self.path.display());
                T::default()
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to load snapshot {}: {}. Starting empty.",
                    self.path.display(),
                    e
                );
                T::default()
            }
        }
    }

    /// Load the snapshot
    ///
    /// # Returns
    ///
    /// - `Ok(Some(T))`: Document parsed
    /// - `Ok(None)`: No document on disk
    /// - `Err(Error::Io)`: Document unreadable
    /// - `Err(Error::Json)`: Document malformed
    pub async fn load<T>(&self) -> Result<Option<T>, Error>
    where
        T: DeserializeOwned,
    {
        if !fs::try_exists(&self.path).await.unwrap_or(false) {
            return Ok(None);
        }

        let content = fs::read_to_string(&self.path).await?;
        let value = serde_json::from_str(&content)?;

        Ok(Some(value))
    }

    /// Replace the snapshot with `value`, atomically
    pub async fn write<T>(&self, value: &T) -> Result<(), Error>
    where
        T: Serialize + ?Sized,
    {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).await.map_err(|e| {
                Error::persistence(format!(
                    "Failed to create snapshot directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let json = serde_json::to_string_pretty(value)?;

        // Write to temporary file first
        let temp_path = self.temp_path();
        {
            let mut file = fs::File::create(&temp_path).await?;
            file.write_all(json.as_bytes()).await?;
            file.flush().await?;
        }

        fs::rename(&temp_path, &self.path).await.map_err(|e| {
            Error::persistence(format!(
                "Failed to rename {} to {}: {}",
                temp_path.display(),
                self.path.display(),
                e
            ))
        })?;

        tracing::trace!("Snapshot written: {}", self.path.display());
        Ok(())
    }

    /// Get path to temporary file for atomic writes
    fn temp_path(&self) -> PathBuf {
        let mut temp = self.path.clone();
        temp.set_extension("tmp");
        temp
    }
}
