// # File Slot
//
// File-based implementation of SlotStore.
//
// ## Purpose
//
// Persists one small text payload across invocations of the client. The file
// holds the payload verbatim with no trailing newline, so records written by
// earlier versions of the client (or by hand) are read back unchanged.
//
// ## Crash Safety
//
// - Atomic writes: payload written to a `.tmp` sibling, flushed, then renamed
//   over the target
// - A crash mid-write leaves either the previous payload or the new one
// - A stale `.tmp` from an interrupted write is overwritten by the next write

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::Error;
use crate::traits::state_store::SlotStore;

/// File-backed single-value slot
///
/// # Example
///
/// ```rust,no_run
/// use noip_core::state::FileSlot;
/// use noip_core::traits::SlotStore;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let slot = FileSlot::new("/var/lib/noipd/ip");
///
///     slot.store("203.0.113.5").await?;
///     assert_eq!(slot.load().await?, Some("203.0.113.5".to_string()));
///
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct FileSlot {
    path: PathBuf,
}

impl FileSlot {
    /// Create a slot backed by `path`
    ///
    /// Nothing is touched on disk until the first write.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get path to temporary file for atomic writes
    fn temp_path(&self) -> PathBuf {
        let mut temp = self.path.clone().into_os_string();
        temp.push(".tmp");
        PathBuf::from(temp)
    }

    /// Create parent directory if it doesn't exist
    async fn ensure_parent(&self) -> Result<(), Error> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            fs::create_dir_all(parent).await.map_err(|e| {
                Error::state_store(format!(
                    "Failed to create directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }
        Ok(())
    }
}

#[async_trait]
impl SlotStore for FileSlot {
    async fn load(&self) -> Result<Option<String>, Error> {
        match fs::read(&self.path).await {
            Ok(bytes) => String::from_utf8(bytes).map(Some).map_err(|e| {
                Error::corrupt_state(format!(
                    "{} is not valid UTF-8: {}",
                    self.path.display(),
                    e
                ))
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::trace!("Slot file does not exist: {}", self.path.display());
                Ok(None)
            }
            Err(e) => Err(Error::state_store(format!(
                "Failed to read {}: {}",
                self.path.display(),
                e
            ))),
        }
    }

    async fn store(&self, value: &str) -> Result<(), Error> {
        self.ensure_parent().await?;

        // Write to temporary file first
        let temp_path = self.temp_path();
        {
            let mut file = fs::File::create(&temp_path).await.map_err(|e| {
                Error::state_store(format!(
                    "Failed to create temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;

            file.write_all(value.as_bytes()).await.map_err(|e| {
                Error::state_store(format!(
                    "Failed to write to temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;

            file.sync_all().await.map_err(|e| {
                Error::state_store(format!(
                    "Failed to flush temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;
        }

        // Atomic rename (temp -> actual)
        fs::rename(&temp_path, &self.path).await.map_err(|e| {
            Error::state_store(format!(
                "Failed to rename {} to {}: {}",
                temp_path.display(),
                self.path.display(),
                e
            ))
        })?;

        tracing::trace!("Slot written: {}", self.path.display());
        Ok(())
    }

    async fn delete(&self) -> Result<(), Error> {
        match fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::state_store(format!(
                "Failed to remove {}: {}",
                self.path.display(),
                e
            ))),
        }
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}
