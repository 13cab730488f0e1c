//! Shared helpers for orchestrator integration tests

use std::path::Path;
use std::sync::Arc;

use filerelay_core::domain::{FileType, PollOutcome, PollRequest, ResumptionToken};
use filerelay_core::scratch::ScratchArea;
use filerelay_core::usecases::TransportOrchestrator;
use filerelay_transport::{LocalFolderBackend, MemoryBackend};

pub const SERVER: &str = "sftp.test";

/// Orchestrator over a fresh in-memory store with no root folder.
///
/// Returns the store handle for seeding and inspection.
pub fn memory_orchestrator() -> (MemoryBackend, TransportOrchestrator) {
    memory_orchestrator_with_root("")
}

pub fn memory_orchestrator_with_root(root: &str) -> (MemoryBackend, TransportOrchestrator) {
    let backend = MemoryBackend::new(SERVER);
    let orchestrator =
        TransportOrchestrator::new(Arc::new(backend.clone()), root, ScratchArea::system());
    (backend, orchestrator)
}

/// Orchestrator over a local directory, with scratch directories under
/// `scratch` so tests can check they are cleaned up.
pub fn local_orchestrator(base: &Path, scratch: &Path) -> TransportOrchestrator {
    TransportOrchestrator::new(
        Arc::new(LocalFolderBackend::new(SERVER, base)),
        "",
        ScratchArea::in_dir(scratch),
    )
}

pub fn poll_request(folder: &str, token: &ResumptionToken) -> PollRequest {
    PollRequest::new(folder, token.clone())
}

pub fn masked_poll(folder: &str, token: &ResumptionToken, include: &str, exclude: &str) -> PollRequest {
    let exclude = (!exclude.is_empty()).then(|| exclude.to_string());
    PollRequest::new(folder, token.clone())
        .with_masks(include, exclude)
        .with_file_type(FileType::Text)
}

/// Name of the delivered file, panicking on `NoEvent`.
pub fn delivered_name(outcome: &PollOutcome) -> String {
    match outcome.document() {
        Some(doc) => doc.descriptor.file_name().to_string(),
        None => panic!("expected a delivery, got {outcome:?}"),
    }
}

pub fn entries_in(dir: &Path) -> usize {
    std::fs::read_dir(dir).map(|r| r.count()).unwrap_or(0)
}
