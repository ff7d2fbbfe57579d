//! Scoped temporary directory for one conversion request.

use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use uuid::Uuid;

use super::error::ConversionError;

/// Prefix of every workspace directory name.
pub const WORKSPACE_PREFIX: &str = "fileconv_";

/// Name of the copy kept of a pre-existing output file.
const STASH_NAME: &str = "previous_output";

/// A pre-existing output file copied aside before the final step.
#[derive(Debug)]
struct Stash {
    backup: PathBuf,
    original: PathBuf,
}

/// A uniquely named directory removed when the scope ends.
///
/// [`Workspace::finish`] removes the directory asynchronously. If the guard
/// is dropped first (early return, panic, cancelled future) `Drop` removes
/// it instead. A preserved workspace is left on disk and handed to the
/// caller.
///
/// A stashed output file is copied back over its original path unless the
/// stash was committed.
#[derive(Debug)]
pub struct Workspace {
    path: PathBuf,
    preserve: bool,
    stash: Option<Stash>,
    closed: bool,
}

impl Workspace {
    /// Creates a fresh workspace under `root`.
    pub async fn create(root: &Path, preserve: bool) -> Result<Self, ConversionError> {
        let path = root.join(format!("{}{}", WORKSPACE_PREFIX, Uuid::new_v4().simple()));
        tokio::fs::create_dir_all(&path)
            .await
            .map_err(|source| ConversionError::Workspace {
                path: path.clone(),
                source,
            })?;

        debug!("Created workspace {}", path.display());
        Ok(Self {
            path,
            preserve,
            stash: None,
            closed: false,
        })
    }

    /// Path of the workspace directory.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the directory outlives the guard.
    pub fn is_preserved(&self) -> bool {
        self.preserve
    }

    /// Path of the intermediate file written by a step.
    pub fn step_path(&self, index: usize, extension: &str) -> PathBuf {
        self.path.join(format!("step_{}.{}", index, extension))
    }

    /// Copies an existing output file into the workspace so it can be restored.
    pub async fn stash_output(&mut self, output: &Path) -> Result<(), ConversionError> {
        let backup = self.path.join(STASH_NAME);
        tokio::fs::copy(output, &backup)
            .await
            .map_err(|source| ConversionError::Workspace {
                path: backup.clone(),
                source,
            })?;

        debug!("Stashed {} as {}", output.display(), backup.display());
        self.stash = Some(Stash {
            backup,
            original: output.to_path_buf(),
        });
        Ok(())
    }

    /// Copies the stashed output back over its original path.
    pub async fn restore_output(&mut self) {
        let Some(stash) = self.stash.take() else {
            return;
        };

        match tokio::fs::copy(&stash.backup, &stash.original).await {
            Ok(_) => debug!("Restored previous {}", stash.original.display()),
            Err(e) => warn!(
                "Failed to restore {} from {}: {}",
                stash.original.display(),
                stash.backup.display(),
                e
            ),
        }
    }

    /// Ends the scope, returning the directory if it was preserved.
    ///
    /// A stash still held at this point is restored first.
    pub async fn finish(mut self) -> Option<PathBuf> {
        self.restore_output().await;
        self.closed = true;

        if self.preserve {
            debug!("Preserving workspace {}", self.path.display());
            return Some(self.path.clone());
        }

        match tokio::fs::remove_dir_all(&self.path).await {
            Ok(()) => debug!("Removed workspace {}", self.path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to remove workspace {}: {}", self.path.display(), e),
        }
        None
    }

    /// Ends the scope after a successful final step, dropping any stash.
    pub async fn commit(mut self) -> Option<PathBuf> {
        self.stash = None;
        self.finish().await
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        if self.closed {
            return;
        }

        if let Some(stash) = self.stash.take() {
            if let Err(e) = std::fs::copy(&stash.backup, &stash.original) {
                warn!(
                    "Failed to restore {} from {}: {}",
                    stash.original.display(),
                    stash.backup.display(),
                    e
                );
            }
        }

        if self.preserve {
            debug!("Preserving workspace {}", self.path.display());
            return;
        }

        match std::fs::remove_dir_all(&self.path) {
            Ok(()) => debug!("Removed workspace {}", self.path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to remove workspace {}: {}", self.path.display(), e),
        }
    }
}
