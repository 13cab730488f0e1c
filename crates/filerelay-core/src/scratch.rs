//! Per-call local scratch directories
//!
//! Uploads and downloads stage bytes in a local file before handing them
//! to the transport. Every call gets its own uniquely named directory,
//! removed when the returned [`ScratchDir`] is dropped, on success and on
//! every error path alike.

use std::io;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::debug;

const SCRATCH_PREFIX: &str = "filerelay-";

/// Factory for scratch directories under an optional base directory
#[derive(Debug, Clone, Default)]
pub struct ScratchArea {
    base: Option<PathBuf>,
}

impl ScratchArea {
    /// Scratch directories under the system temporary directory.
    pub fn system() -> Self {
        Self { base: None }
    }

    /// Scratch directories under `base`, which must exist.
    pub fn in_dir(base: impl Into<PathBuf>) -> Self {
        Self {
            base: Some(base.into()),
        }
    }

    pub fn base(&self) -> Option<&Path> {
        self.base.as_deref()
    }

    /// Creates a fresh directory exclusive to the caller.
    pub fn acquire(&self) -> io::Result<ScratchDir> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(SCRATCH_PREFIX);
        let dir = match &self.base {
            Some(base) => builder.tempdir_in(base)?,
            None => builder.tempdir()?,
        };
        debug!(path = %dir.path().display(), "Acquired scratch directory");
        Ok(ScratchDir { dir })
    }
}

/// RAII guard for one scratch directory
///
/// Dropping the guard deletes the directory and everything in it.
#[derive(Debug)]
pub struct ScratchDir {
    dir: TempDir,
}

impl ScratchDir {
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Path of a file named `name` inside the directory.
    pub fn file(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }
}
