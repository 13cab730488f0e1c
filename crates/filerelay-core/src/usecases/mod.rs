//! Use cases (interactors) for filerelay
//!
//! This module contains the application use cases that orchestrate
//! domain values and the transport port. Use cases are thin coordinators
//! that delegate rules to domain types and I/O to backend sessions.
//!
//! ## Use Cases
//!
//! - [`UploadFileUseCase`] - Direct, appending or staged uploads
//! - [`PollFolderUseCase`] - Token-driven "next new file" polling
//! - [`TransportOrchestrator`] - Boundary entry point for all operations

mod fetch;
pub mod orchestrator;
pub mod poll_folder;
pub mod transfer_error;
pub mod upload_file;

#[cfg(test)]
mod test_support;

pub use orchestrator::{TransportOrchestrator, UploadOptions};
pub use poll_folder::PollFolderUseCase;
pub use transfer_error::{ErrorCategory, TransferError};
pub use upload_file::UploadFileUseCase;
