//! Per-run staging directories

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tempfile::TempDir;

/// What happens to a staging directory when its owner goes away
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CleanupPolicy {
    /// Leave the directory for the test harness or the OS to reap
    #[default]
    Retain,
    /// Delete the directory when the owner is dropped
    RemoveOnDrop,
}

/// A freshly created, exclusively owned temporary directory
#[derive(Debug)]
pub struct StagingDirectory {
    path: PathBuf,
    // Present only under `RemoveOnDrop`; dropping it removes the directory.
    guard: Option<TempDir>,
}

impl StagingDirectory {
    /// Create a new directory named `<prefix><random>` under `parent`, or under
    /// the system temp directory when no parent is given
    pub fn create(parent: Option<&Path>, prefix: &str, policy: CleanupPolicy) -> io::Result<Self> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(prefix);

        let dir = match parent {
            Some(parent) => {
                fs::create_dir_all(parent)?;
                builder.tempdir_in(parent)?
            }
            None => builder.tempdir()?,
        };
        let path = dir.path().to_path_buf();

        let guard = match policy {
            CleanupPolicy::RemoveOnDrop => Some(dir),
            CleanupPolicy::Retain => {
                #[allow(deprecated)]
                let _ = dir.into_path();
                None
            }
        };

        Ok(Self { path, guard })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Remove the directory now, regardless of policy
    pub fn cleanup(mut self) -> io::Result<()> {
        match self.guard.take() {
            Some(dir) => dir.close(),
            None => fs::remove_dir_all(&self.path),
        }
    }
}
