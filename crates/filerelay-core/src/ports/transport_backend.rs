//! Transport backend port (driven/secondary port)
//!
//! This module defines the interface a wire protocol adapter implements so
//! the use cases can move files without knowing whether they talk to an
//! SFTP server, a mounted share, or an in-process store.
//!
//! ## Design Notes
//!
//! - Errors are categorised by the adapter into [`BackendError`]; the use
//!   cases map those categories to the transfer error taxonomy.
//! - A session is scoped to one boundary call. Dropping the boxed session
//!   closes the connection, so release happens on every exit path.
//! - All paths are remote paths using `/` separators, already joined with
//!   the configured root folder.

use std::path::Path;

use thiserror::Error;

// ============================================================================
// BackendError
// ============================================================================

/// Categorised failure reported by a transport adapter
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// The server refused access to the path
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// The path (or its parent folder) does not exist
    #[error("No such file or directory: {0}")]
    NotFound(String),

    /// Any other remote failure, with the server's message
    #[error("Remote error: {0}")]
    Other(String),

    /// The connection could not be established or local I/O failed
    #[error("Transport unavailable: {0}")]
    Unavailable(String),

    /// The backend cannot be opened with its current settings
    #[error("Transport configuration error: {0}")]
    Configuration(String),
}

impl BackendError {
    /// Returns true for the "no such file" category.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

// ============================================================================
// RemoteEntry
// ============================================================================

/// One entry of a remote directory listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteEntry {
    /// Entry name without folder
    pub name: String,
    /// True for sub-directories (never delivered by a poll)
    pub is_directory: bool,
}

impl RemoteEntry {
    pub fn file(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_directory: false,
        }
    }

    pub fn directory(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_directory: true,
        }
    }

    /// True for the `.` and `..` pseudo entries some servers return.
    pub fn is_special(&self) -> bool {
        self.name == "." || self.name == ".."
    }
}

// ============================================================================
// ITransportBackend / ITransportSession
// ============================================================================

/// A configured remote store that can be connected to
///
/// Implementations hold read-only connection settings only. Every call to
/// [`connect`](ITransportBackend::connect) opens an independent session.
#[async_trait::async_trait]
pub trait ITransportBackend: Send + Sync {
    /// Address reported in every FileDescriptor built from this backend
    fn server_address(&self) -> &str;

    /// Opens a new session
    ///
    /// Fails with [`BackendError::Configuration`] when the settings are
    /// invalid, identically on every attempt, and with
    /// [`BackendError::Unavailable`] when the server cannot be reached.
    async fn connect(&self) -> Result<Box<dyn ITransportSession>, BackendError>;
}

/// Remote file operations inside one open session
#[async_trait::async_trait]
pub trait ITransportSession: Send + Sync {
    /// Returns whether a file exists at `path`
    async fn exists(&self, path: &str) -> Result<bool, BackendError>;

    /// Copies a local file to `remote`
    ///
    /// With `overwrite` false an existing remote file is an error.
    async fn upload(&self, local: &Path, remote: &str, overwrite: bool)
        -> Result<(), BackendError>;

    /// Copies `remote` into the local file at `local`, replacing it
    async fn download(&self, remote: &str, local: &Path) -> Result<(), BackendError>;

    /// Deletes a remote file
    async fn delete(&self, path: &str) -> Result<(), BackendError>;

    /// Renames `from` to `to`; the destination must not exist
    async fn rename(&self, from: &str, to: &str) -> Result<(), BackendError>;

    /// Lists a remote folder in the order the server returns it
    async fn list_directory(&self, path: &str) -> Result<Vec<RemoteEntry>, BackendError>;
}
