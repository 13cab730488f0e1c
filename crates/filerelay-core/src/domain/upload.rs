//! Upload requests

use super::content::PayloadEnvelope;
use super::errors::DomainError;
use super::remote_path;

/// One file to place on the remote store
///
/// `append_if_exists` and a non-empty `staging_folder` are mutually
/// exclusive; [`UploadRequest::validate`] rejects the combination before
/// anything touches the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRequest {
    pub payload: PayloadEnvelope,
    pub destination_folder: String,
    pub file_name: String,
    pub append_if_exists: bool,
    pub staging_folder: Option<String>,
}

impl UploadRequest {
    /// Creates a replace-mode upload with no staging folder.
    pub fn new(
        destination_folder: impl Into<String>,
        file_name: impl Into<String>,
        payload: PayloadEnvelope,
    ) -> Self {
        Self {
            payload,
            destination_folder: destination_folder.into(),
            file_name: file_name.into(),
            append_if_exists: false,
            staging_folder: None,
        }
    }

    pub fn with_append(mut self, append_if_exists: bool) -> Self {
        self.append_if_exists = append_if_exists;
        self
    }

    pub fn with_staging_folder(mut self, staging_folder: impl Into<String>) -> Self {
        self.staging_folder = Some(staging_folder.into());
        self
    }

    /// The staging folder, if one was given and is not blank.
    pub fn staging(&self) -> Option<&str> {
        self.staging_folder
            .as_deref()
            .filter(|folder| !remote_path::is_blank(folder))
    }

    /// Checks parameters and option compatibility.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.append_if_exists && self.staging().is_some() {
            return Err(DomainError::InvalidOperation(
                "a staging folder can only be used when append-if-exists is disabled".to_string(),
            ));
        }
        remote_path::validate_parameter(&self.destination_folder, "folder")?;
        remote_path::validate_parameter(&self.file_name, "fileName")?;
        Ok(())
    }
}
