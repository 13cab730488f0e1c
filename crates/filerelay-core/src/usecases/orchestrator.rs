//! Transport orchestrator
//!
//! The transport-agnostic entry point for every boundary operation:
//! upload, delete, download, list and poll. It validates path parameters,
//! prefixes them with the configured root folder, dispatches to the use
//! cases or straight to a backend session, and maps failures to
//! [`TransferError`]. Nothing is retried here.

use std::sync::Arc;

use tracing::{info, instrument};

use crate::domain::{
    remote_path, FileDescriptor, FileDocument, PayloadEnvelope, PollOutcome, PollRequest,
    TransferEncoding, UploadRequest,
};
use crate::poll_gate::PollGate;
use crate::ports::ITransportBackend;
use crate::scratch::ScratchArea;

use super::fetch::fetch_document;
use super::poll_folder::PollFolderUseCase;
use super::transfer_error::TransferError;
use super::upload_file::UploadFileUseCase;

/// Options of an upload beyond folder, name and payload
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadOptions {
    /// Append to an existing destination instead of replacing it
    pub append_if_exists: bool,
    /// Upload here first, then rename into the destination folder
    pub staging_folder: Option<String>,
}

/// Entry point for all operations against one configured backend
///
/// Cheap to share behind an `Arc`; calls on different folders run fully
/// concurrently, polls on the same folder are serialised.
pub struct TransportOrchestrator {
    backend: Arc<dyn ITransportBackend + Send + Sync>,
    root_folder: String,
    scratch: ScratchArea,
    gate: PollGate,
    uploader: UploadFileUseCase,
    poller: PollFolderUseCase,
}

impl TransportOrchestrator {
    /// Creates a new orchestrator
    ///
    /// # Arguments
    ///
    /// * `backend` - Transport for every call
    /// * `root_folder` - Prefix joined to every caller path (may be empty)
    /// * `scratch` - Where per-call scratch directories are created
    pub fn new(
        backend: Arc<dyn ITransportBackend + Send + Sync>,
        root_folder: impl Into<String>,
        scratch: ScratchArea,
    ) -> Self {
        Self {
            uploader: UploadFileUseCase::new(Arc::clone(&backend), scratch.clone()),
            poller: PollFolderUseCase::new(Arc::clone(&backend), scratch.clone()),
            backend,
            root_folder: root_folder.into(),
            scratch,
            gate: PollGate::new(),
        }
    }

    pub fn server_address(&self) -> &str {
        self.backend.server_address()
    }

    pub fn root_folder(&self) -> &str {
        &self.root_folder
    }

    /// Joins the root folder with a caller-relative path.
    pub fn resolve(&self, relative: &str) -> String {
        remote_path::join_root(&self.root_folder, relative)
    }

    /// Uploads `payload` to `folder/file_name`
    #[instrument(skip(self, payload, options))]
    pub async fn upload(
        &self,
        folder: &str,
        file_name: &str,
        payload: PayloadEnvelope,
        options: UploadOptions,
    ) -> Result<FileDescriptor, TransferError> {
        remote_path::validate_parameter(folder, "folder")?;
        remote_path::validate_parameter(file_name, "fileName")?;

        let mut request = UploadRequest::new(self.resolve(folder), file_name, payload)
            .with_append(options.append_if_exists);
        if let Some(staging) = options
            .staging_folder
            .as_deref()
            .filter(|s| !remote_path::is_blank(s))
        {
            request = request.with_staging_folder(self.resolve(staging));
        }

        self.uploader.execute(&request).await
    }

    /// Deletes `folder/file_name`
    #[instrument(skip(self))]
    pub async fn delete(&self, folder: &str, file_name: &str) -> Result<(), TransferError> {
        remote_path::validate_parameter(folder, "folder")?;
        remote_path::validate_parameter(file_name, "fileName")?;

        let path = remote_path::combine(&self.resolve(folder), file_name);
        let session = self
            .backend
            .connect()
            .await
            .map_err(|e| TransferError::from_backend(e, &path))?;
        session
            .delete(&path)
            .await
            .map_err(|e| TransferError::from_backend(e, &path))?;

        info!(remote_path = %path, "Deleted file");
        Ok(())
    }

    /// Downloads `folder/file_name` in the requested encoding
    #[instrument(skip(self))]
    pub async fn download(
        &self,
        folder: &str,
        file_name: &str,
        encoding: TransferEncoding,
    ) -> Result<FileDocument, TransferError> {
        remote_path::validate_parameter(folder, "folder")?;
        remote_path::validate_parameter(file_name, "fileName")?;

        let resolved = self.resolve(folder);
        let scratch = self.scratch.acquire().map_err(TransferError::local_io)?;
        let session = self.backend.connect().await.map_err(|e| {
            TransferError::from_backend(e, &remote_path::combine(&resolved, file_name))
        })?;

        fetch_document(
            session.as_ref(),
            &scratch,
            self.backend.server_address(),
            &resolved,
            file_name,
            encoding,
        )
        .await
    }

    /// Lists `folder`, omitting the `.` and `..` entries
    #[instrument(skip(self))]
    pub async fn list(&self, folder: &str) -> Result<Vec<FileDescriptor>, TransferError> {
        remote_path::validate_parameter(folder, "folder")?;

        let resolved = self.resolve(folder);
        let session = self
            .backend
            .connect()
            .await
            .map_err(|e| TransferError::from_backend(e, &resolved))?;
        let entries = session
            .list_directory(&resolved)
            .await
            .map_err(|e| TransferError::from_backend(e, &resolved))?;

        Ok(entries
            .into_iter()
            .filter(|entry| !entry.is_special())
            .map(|entry| FileDescriptor::new(self.backend.server_address(), &resolved, entry.name))
            .collect())
    }

    /// Polls a folder for the next matching file
    ///
    /// At most one poll per folder is in flight through this orchestrator.
    #[instrument(skip(self, request), fields(folder = %request.folder, token = %request.token))]
    pub async fn poll(&self, request: PollRequest) -> Result<PollOutcome, TransferError> {
        remote_path::validate_parameter(&request.folder, "folder")?;

        let resolved = PollRequest {
            folder: self.resolve(&request.folder),
            ..request
        };
        let _permit = self
            .gate
            .enter(self.backend.server_address(), &resolved.folder)
            .await;

        self.poller.execute(&resolved).await
    }
}
