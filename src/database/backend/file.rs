//! File-based backing medium.
//!
//! Stores each key as `<data_dir>/<key>.json`, with:
//! - Parent directory created on first write
//! - Atomic writes via temp file + rename
//! - File permissions set to 0600 on Unix (owner read/write only)

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::instrument;

use super::BackingStore;
use crate::database::{StoreError, StoreResult};

/// File permissions for stored data (Unix only): owner read/write.
#[cfg(unix)]
const FILE_MODE: u32 = 0o600;

/// File-based key-value medium rooted at a data directory.
#[derive(Debug, Clone)]
pub struct FileBackingStore {
    dir: PathBuf,
}

impl FileBackingStore {
    /// Create a medium rooted at `dir`. The directory is created lazily.
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// Directory holding the stored files.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file backing `key`.
    pub fn path_for(&self, key: &str) -> StoreResult<PathBuf> {
        if key.is_empty() || key.starts_with('.') || key.contains(|c: char| c == '/' || c == '\\') {
            return Err(StoreError::config(format!("Invalid storage key '{}'", key)));
        }
        Ok(self.dir.join(format!("{}.json", key)))
    }

    async fn ensure_dir(&self) -> StoreResult<()> {
        if !self.dir.exists() {
            tokio::fs::create_dir_all(&self.dir).await.map_err(|e| {
                StoreError::backend(format!(
                    "Failed to create directory '{}': {}",
                    self.dir.display(),
                    e
                ))
            })?;
        }
        Ok(())
    }
}

#[async_trait]
impl BackingStore for FileBackingStore {
    #[instrument(skip(self))]
    async fn load(&self, key: &str) -> StoreResult<Option<String>> {
        let path = self.path_for(key)?;
        match tokio::fs::read_to_string(&path).await {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::backend(format!(
                "Failed to read '{}': {}",
                path.display(),
                e
            ))),
        }
    }

    #[instrument(skip(self, contents))]
    async fn save(&self, key: &str, contents: &str) -> StoreResult<()> {
        let path = self.path_for(key)?;
        self.ensure_dir().await?;

        // Write to temp file first, then rename for atomicity
        let temp_path = path.with_extension("json.tmp");
        tokio::fs::write(&temp_path, contents).await.map_err(|e| {
            StoreError::backend(format!(
                "Failed to write temp file '{}': {}",
                temp_path.display(),
                e
            ))
        })?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(FILE_MODE);
            tokio::fs::set_permissions(&temp_path, perms).await?;
        }

        if let Err(e) = tokio::fs::rename(&temp_path, &path).await {
            let _ = tokio::fs::remove_file(&temp_path).await;
            return Err(StoreError::backend(format!(
                "Failed to rename '{}' to '{}': {}",
                temp_path.display(),
                path.display(),
                e
            )));
        }

        Ok(())
    }

    #[instrument(skip(self))]
    async fn remove(&self, key: &str) -> StoreResult<()> {
        let path = self.path_for(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::backend(format!(
                "Failed to remove '{}': {}",
                path.display(),
                e
            ))),
        }
    }

    fn name(&self) -> &str {
        "file"
    }
}
