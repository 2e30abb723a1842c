//! Workspace management for job execution.
//!
//! A [`Workspace`] owns one temporary directory for the lifetime of a job.
//! Every intermediate file (extracted audio, shifted audio, staged outputs)
//! lives inside it, and dropping the workspace removes them all, whichever
//! way the job ends.

use crate::{Error, Result};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Scoped temporary directory for one job.
///
/// # Example
///
/// ```no_run
/// use repitch_av::Workspace;
/// use std::path::Path;
///
/// let workspace = Workspace::new()?;
/// let staged = workspace.stage(Path::new("/music/song_shift.wav"));
/// // ... write the finished file to `staged` ...
/// workspace.finalize(&staged, Path::new("/music/song_shift.wav"))?;
/// # Ok::<(), repitch_av::Error>(())
/// ```
#[derive(Debug)]
pub struct Workspace {
    temp_dir: TempDir,
}

impl Workspace {
    /// Create a workspace in the system temp directory.
    pub fn new() -> Result<Self> {
        let temp_dir = tempfile::Builder::new()
            .prefix("repitch-")
            .tempdir()
            .map_err(|e| Error::Workspace(format!("failed to create temp dir: {e}")))?;
        Ok(Self { temp_dir })
    }

    /// Create a workspace under a specific parent directory.
    pub fn new_in(root: &Path) -> Result<Self> {
        let temp_dir = tempfile::Builder::new()
            .prefix("repitch-")
            .tempdir_in(root)
            .map_err(|e| {
                Error::Workspace(format!("failed to create temp dir in {:?}: {e}", root))
            })?;
        Ok(Self { temp_dir })
    }

    /// Path to the temporary directory.
    pub fn temp_dir(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Create a path for a named temporary file inside the workspace.
    pub fn temp_file(&self, name: &str) -> PathBuf {
        self.temp_dir.path().join(name)
    }

    /// Staging path for a file that will end up at `destination`.
    ///
    /// The staged name keeps the destination's extension so tools that pick
    /// a format from the file name behave the same on both paths.
    pub fn stage(&self, destination: &Path) -> PathBuf {
        let file_name = destination
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "output".to_string());
        self.temp_file(&format!("staged-{}", file_name))
    }

    /// Move a finished file from the workspace to its destination.
    ///
    /// Tries a rename first (same filesystem), then falls back to copy and
    /// remove. If the copy fails, whatever reached the destination is removed
    /// so no truncated file is left behind.
    ///
    /// # Errors
    ///
    /// Returns an error if the staged file does not exist or cannot be moved.
    pub fn finalize(&self, staged: &Path, destination: &Path) -> Result<PathBuf> {
        if !staged.exists() {
            return Err(Error::Workspace(format!(
                "staged file does not exist: {}",
                staged.display()
            )));
        }

        if let Err(_rename_err) = std::fs::rename(staged, destination) {
            if let Err(e) = std::fs::copy(staged, destination) {
                let _ = std::fs::remove_file(destination);
                return Err(Error::Workspace(format!(
                    "failed to move output to {}: {e}",
                    destination.display()
                )));
            }
            let _ = std::fs::remove_file(staged);
        }

        #[cfg(feature = "tracing")]
        tracing::debug!("Finalized {:?} -> {:?}", staged, destination);

        Ok(destination.to_path_buf())
    }

    /// Clean up explicitly (also happens on drop).
    pub fn cleanup(self) -> Result<()> {
        self.temp_dir
            .close()
            .map_err(|e| Error::Workspace(format!("failed to remove temp dir: {e}")))
    }
}
