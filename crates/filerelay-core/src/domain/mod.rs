//! Domain types and pure logic
//!
//! This module contains the core domain types for filerelay:
//! - Content envelopes and the transfer-encoding codec
//! - Include/exclude name filters compiled from shell-style masks
//! - Remote path joining and validation
//! - File descriptors, upload requests and poll outcomes
//! - Domain-specific error types

pub mod content;
pub mod errors;
pub mod file_descriptor;
pub mod name_filter;
pub mod poll;
pub mod remote_path;
pub mod upload;

// Re-export commonly used types
pub use content::{FileType, PayloadEnvelope, TransferEncoding};
pub use errors::{ContentError, DomainError};
pub use file_descriptor::{FileDescriptor, FileDocument};
pub use name_filter::NameFilter;
pub use poll::{PollOutcome, PollRequest, ResumptionToken};
pub use upload::UploadRequest;
