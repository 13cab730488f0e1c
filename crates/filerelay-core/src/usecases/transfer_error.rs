//! Transfer error taxonomy
//!
//! Every boundary operation of the orchestrator fails with a
//! [`TransferError`]. Validation and content problems are detected locally
//! and never reach a backend; remote failures arrive as
//! [`BackendError`] categories and are mapped here.

use serde::Serialize;
use thiserror::Error;

use crate::domain::{ContentError, DomainError};
use crate::ports::BackendError;

/// Coarse failure category for RPC framings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    Validation,
    Content,
    Forbidden,
    NotFound,
    ServiceUnavailable,
    Configuration,
}

impl ErrorCategory {
    /// HTTP-style status code for the category.
    pub fn status_code(self) -> u16 {
        match self {
            ErrorCategory::Validation | ErrorCategory::Content | ErrorCategory::Configuration => 400,
            ErrorCategory::Forbidden => 403,
            ErrorCategory::NotFound => 404,
            ErrorCategory::ServiceUnavailable => 503,
        }
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ErrorCategory::Validation => "validation",
            ErrorCategory::Content => "content",
            ErrorCategory::Forbidden => "forbidden",
            ErrorCategory::NotFound => "not_found",
            ErrorCategory::ServiceUnavailable => "service_unavailable",
            ErrorCategory::Configuration => "configuration",
        };
        write!(f, "{s}")
    }
}

/// Failure of an upload, download, delete, list or poll
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransferError {
    /// Bad parameter, bad mask or conflicting options
    #[error(transparent)]
    Validation(#[from] DomainError),

    /// Null or malformed payload
    #[error(transparent)]
    Content(#[from] ContentError),

    /// The server refused access
    #[error("Access to '{path}' is forbidden: {detail}")]
    Forbidden { path: String, detail: String },

    /// The file or folder does not exist, or the server reported another error
    #[error("'{path}' was not found: {detail}")]
    NotFound { path: String, detail: String },

    /// Connectivity or local I/O failure
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// The backend cannot be opened with its current settings
    #[error("Transport is misconfigured: {0}")]
    Configuration(String),
}

impl TransferError {
    /// Maps a backend failure on `path` into the taxonomy.
    ///
    /// Uncategorised remote errors become `NotFound` carrying the server's
    /// message.
    pub fn from_backend(err: BackendError, path: &str) -> Self {
        match err {
            BackendError::PermissionDenied(detail) => Self::Forbidden {
                path: path.to_string(),
                detail,
            },
            BackendError::NotFound(detail) | BackendError::Other(detail) => Self::NotFound {
                path: path.to_string(),
                detail,
            },
            BackendError::Unavailable(detail) => Self::ServiceUnavailable(detail),
            BackendError::Configuration(detail) => Self::Configuration(detail),
        }
    }

    /// Maps a local filesystem failure (scratch directory, scratch file).
    pub fn local_io(err: std::io::Error) -> Self {
        Self::ServiceUnavailable(format!("local I/O failure: {err}"))
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Validation(_) => ErrorCategory::Validation,
            Self::Content(_) => ErrorCategory::Content,
            Self::Forbidden { .. } => ErrorCategory::Forbidden,
            Self::NotFound { .. } => ErrorCategory::NotFound,
            Self::ServiceUnavailable(_) => ErrorCategory::ServiceUnavailable,
            Self::Configuration(_) => ErrorCategory::Configuration,
        }
    }

    pub fn status_code(&self) -> u16 {
        self.category().status_code()
    }
}
