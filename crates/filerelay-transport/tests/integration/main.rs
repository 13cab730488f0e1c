//! Integration tests for filerelay-transport
//!
//! Drive the orchestrator end to end against the in-memory and local
//! folder backends and verify the polling protocol, upload modes and
//! error mapping.

mod common;

mod test_errors;
mod test_local_folder;
mod test_poll;
mod test_upload;
