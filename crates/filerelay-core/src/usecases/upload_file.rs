//! Atomic upload use case
//!
//! Places one payload on the remote store, either by overwriting the
//! destination directly (optionally appending to what is already there) or
//! by uploading to a staging folder and renaming into place.
//!
//! Direct mode has no rollback: a failure after the remote write can leave
//! the destination fully overwritten. Staged mode leaves the destination
//! either unchanged or fully updated because its last step is one rename.

use std::path::Path;
use std::sync::Arc;

use tokio::io::AsyncWriteExt;
use tracing::{debug, info, instrument, warn};

use crate::domain::{remote_path, FileDescriptor, UploadRequest};
use crate::ports::{ITransportBackend, ITransportSession};
use crate::scratch::ScratchArea;

use super::transfer_error::TransferError;

/// Name of the single scratch file used per upload
const SCRATCH_FILE: &str = "payload";

/// Use case for uploading a payload to a remote folder
pub struct UploadFileUseCase {
    backend: Arc<dyn ITransportBackend + Send + Sync>,
    scratch: ScratchArea,
}

impl UploadFileUseCase {
    /// Creates a new UploadFileUseCase
    ///
    /// # Arguments
    ///
    /// * `backend` - Transport used to open one session per upload
    /// * `scratch` - Where per-call scratch directories are created
    pub fn new(backend: Arc<dyn ITransportBackend + Send + Sync>, scratch: ScratchArea) -> Self {
        Self { backend, scratch }
    }

    /// Uploads the request's payload
    ///
    /// Option conflicts and payload problems are reported before any
    /// connection is opened. The scratch directory is removed on every exit
    /// path when its guard goes out of scope.
    ///
    /// # Returns
    ///
    /// The descriptor of the file now at `destination_folder/file_name`
    ///
    /// # Errors
    ///
    /// - `Validation` when append and staging are combined or a path is blank
    /// - `Content` when the payload is null or not valid for its encoding
    /// - `Forbidden` / `NotFound` / `ServiceUnavailable` from the transport
    #[instrument(
        skip(self, request),
        fields(
            folder = %request.destination_folder,
            file_name = %request.file_name,
            append = request.append_if_exists,
            staging = ?request.staging(),
        )
    )]
    pub async fn execute(&self, request: &UploadRequest) -> Result<FileDescriptor, TransferError> {
        request.validate()?;
        let bytes = request.payload.to_bytes()?;

        let destination = remote_path::combine(&request.destination_folder, &request.file_name);
        let scratch = self.scratch.acquire().map_err(TransferError::local_io)?;
        let local = scratch.file(SCRATCH_FILE);

        let session = self
            .backend
            .connect()
            .await
            .map_err(|e| TransferError::from_backend(e, &destination))?;

        match request.staging() {
            None => {
                self.upload_direct(
                    session.as_ref(),
                    &local,
                    &destination,
                    &bytes,
                    request.append_if_exists,
                )
                .await?
            }
            Some(staging) => {
                let staged = remote_path::combine(staging, &request.file_name);
                self.upload_staged(session.as_ref(), &local, &staged, &destination, &bytes)
                    .await?
            }
        }

        info!(
            remote_path = %destination,
            size_bytes = bytes.len(),
            "Upload complete"
        );

        Ok(FileDescriptor::new(
            self.backend.server_address(),
            &request.destination_folder,
            &request.file_name,
        ))
    }

    async fn upload_direct(
        &self,
        session: &dyn ITransportSession,
        local: &Path,
        destination: &str,
        bytes: &[u8],
        append: bool,
    ) -> Result<(), TransferError> {
        if append {
            let exists = session
                .exists(destination)
                .await
                .map_err(|e| TransferError::from_backend(e, destination))?;
            if exists {
                debug!(remote_path = %destination, "Fetching existing file to append to");
                session
                    .download(destination, local)
                    .await
                    .map_err(|e| TransferError::from_backend(e, destination))?;
            }
        }

        append_to_file(local, bytes)
            .await
            .map_err(TransferError::local_io)?;

        session
            .upload(local, destination, true)
            .await
            .map_err(|e| TransferError::from_backend(e, destination))?;

        if let Err(e) = tokio::fs::remove_file(local).await {
            debug!(error = %e, "Scratch file already gone after upload");
        }
        Ok(())
    }

    async fn upload_staged(
        &self,
        session: &dyn ITransportSession,
        local: &Path,
        staged: &str,
        destination: &str,
        bytes: &[u8],
    ) -> Result<(), TransferError> {
        append_to_file(local, bytes)
            .await
            .map_err(TransferError::local_io)?;

        session
            .upload(local, staged, true)
            .await
            .map_err(|e| TransferError::from_backend(e, staged))?;
        debug!(staged = %staged, "Uploaded to staging folder");

        if let Err(e) = Self::replace_with_staged(session, staged, destination).await {
            warn!(
                staged = %staged,
                remote_path = %destination,
                error = %e,
                "Could not move staged copy into place, removing it"
            );
            if let Err(cleanup) = session.delete(staged).await {
                warn!(staged = %staged, error = %cleanup, "Could not remove staged copy");
            }
            return Err(e);
        }
        Ok(())
    }

    /// Deletes any existing destination and renames the staged copy over it.
    async fn replace_with_staged(
        session: &dyn ITransportSession,
        staged: &str,
        destination: &str,
    ) -> Result<(), TransferError> {
        let exists = session
            .exists(destination)
            .await
            .map_err(|e| TransferError::from_backend(e, destination))?;
        if exists {
            session
                .delete(destination)
                .await
                .map_err(|e| TransferError::from_backend(e, destination))?;
        }
        session
            .rename(staged, destination)
            .await
            .map_err(|e| TransferError::from_backend(e, destination))
    }
}

/// Appends `bytes` to `path`, creating the file if needed.
async fn append_to_file(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = tokio::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await?;
    file.write_all(bytes).await?;
    file.flush().await?;
    Ok(())
}
