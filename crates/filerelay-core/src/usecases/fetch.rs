//! Download of one remote file into a [`FileDocument`]

use tracing::debug;

use crate::domain::{remote_path, FileDescriptor, FileDocument, PayloadEnvelope, TransferEncoding};
use crate::ports::ITransportSession;
use crate::scratch::ScratchDir;

use super::transfer_error::TransferError;

/// Downloads `folder/file_name` through the scratch directory and encodes it.
pub(crate) async fn fetch_document(
    session: &dyn ITransportSession,
    scratch: &ScratchDir,
    server_address: &str,
    folder: &str,
    file_name: &str,
    encoding: TransferEncoding,
) -> Result<FileDocument, TransferError> {
    let remote = remote_path::combine(folder, file_name);
    let local = scratch.file("download");

    session
        .download(&remote, &local)
        .await
        .map_err(|e| TransferError::from_backend(e, &remote))?;

    let bytes = tokio::fs::read(&local)
        .await
        .map_err(TransferError::local_io)?;
    if let Err(e) = tokio::fs::remove_file(&local).await {
        debug!(error = %e, "Scratch file already gone after download");
    }

    let payload = PayloadEnvelope::from_bytes(&bytes, encoding)?;
    debug!(remote_path = %remote, size_bytes = bytes.len(), "Fetched remote file");

    Ok(FileDocument {
        descriptor: FileDescriptor::new(server_address, folder, file_name),
        payload,
    })
}
