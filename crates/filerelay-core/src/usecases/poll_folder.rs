//! Polling trigger use case
//!
//! Turns folder listings into a stream of "new file arrived" events with
//! at-least-once delivery. The engine keeps no state between calls: the
//! caller passes back the [`ResumptionToken`](crate::domain::ResumptionToken)
//! it received, and the file named by that token is deleted at the start of
//! the next poll. A delivered file is never deleted in the call that
//! delivers it, so a caller that loses the outcome gets the same file again.
//!
//! Polls on the same folder must not overlap; the orchestrator serialises
//! them with a [`PollGate`](crate::poll_gate::PollGate).

use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use crate::domain::{remote_path, NameFilter, PollOutcome, PollRequest};
use crate::ports::{ITransportBackend, ITransportSession};
use crate::scratch::ScratchArea;

use super::fetch::fetch_document;
use super::transfer_error::TransferError;

/// Use case for polling a remote folder for the next matching file
pub struct PollFolderUseCase {
    backend: Arc<dyn ITransportBackend + Send + Sync>,
    scratch: ScratchArea,
}

impl PollFolderUseCase {
    pub fn new(backend: Arc<dyn ITransportBackend + Send + Sync>, scratch: ScratchArea) -> Self {
        Self { backend, scratch }
    }

    /// Runs one poll
    ///
    /// 1. Compiles the masks (a bad mask fails before anything remote happens)
    /// 2. Deletes the file named by the token, if any; "not found" is success
    /// 3. Lists the folder
    /// 4. Returns the first matching file in listing order, skipping `.`,
    ///    `..`, directories and files that cannot be fetched. A lost
    ///    connection ends the scan with `ServiceUnavailable`.
    ///
    /// # Errors
    ///
    /// - `Validation` when a mask does not compile
    /// - any delete failure other than "not found", as reported
    /// - `NotFound` when the folder does not exist
    /// - `ServiceUnavailable` when the connection drops during a fetch
    #[instrument(
        skip(self, request),
        fields(folder = %request.folder, token = %request.token)
    )]
    pub async fn execute(&self, request: &PollRequest) -> Result<PollOutcome, TransferError> {
        let filter = NameFilter::compile(&request.include_mask, request.exclude_mask.as_deref())?;

        let session = self
            .backend
            .connect()
            .await
            .map_err(|e| TransferError::from_backend(e, &request.folder))?;

        if let Some(pending) = request.token.pending_file() {
            self.acknowledge(session.as_ref(), &request.folder, pending)
                .await?;
        }

        let entries = session
            .list_directory(&request.folder)
            .await
            .map_err(|e| TransferError::from_backend(e, &request.folder))?;
        debug!(entries = entries.len(), "Listed folder");

        let scratch = self.scratch.acquire().map_err(TransferError::local_io)?;
        for entry in entries {
            if entry.is_special() || entry.is_directory || !filter.matches(&entry.name) {
                continue;
            }

            match fetch_document(
                session.as_ref(),
                &scratch,
                self.backend.server_address(),
                &request.folder,
                &entry.name,
                request.file_type.transfer_encoding(),
            )
            .await
            {
                Ok(document) => {
                    info!(file_name = %entry.name, "Delivering file");
                    return Ok(PollOutcome::delivered(document));
                }
                Err(e @ TransferError::ServiceUnavailable(_)) => {
                    warn!(file_name = %entry.name, error = %e, "Connection lost while fetching");
                    return Err(e);
                }
                Err(e) => {
                    warn!(file_name = %entry.name, error = %e, "Skipping file that could not be fetched");
                }
            }
        }

        debug!("No matching file");
        Ok(PollOutcome::no_event())
    }

    /// Deletes the previously delivered file.
    async fn acknowledge(
        &self,
        session: &dyn ITransportSession,
        folder: &str,
        pending: &str,
    ) -> Result<(), TransferError> {
        let path = remote_path::combine(folder, pending);
        match session.delete(&path).await {
            Ok(()) => {
                info!(remote_path = %path, "Deleted acknowledged file");
                Ok(())
            }
            Err(e) if e.is_not_found() => {
                debug!(remote_path = %path, "Acknowledged file already gone");
                Ok(())
            }
            Err(e) => Err(TransferError::from_backend(e, &path)),
        }
    }
}
