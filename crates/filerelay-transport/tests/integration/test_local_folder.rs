//! Orchestrator over a local directory tree

use filerelay_core::domain::{PayloadEnvelope, ResumptionToken, TransferEncoding};
use filerelay_core::usecases::{TransferError, UploadOptions};

use crate::common::*;

#[tokio::test]
async fn staged_upload_then_poll_and_acknowledge() {
    let base = tempfile::tempdir().unwrap();
    let scratch = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(base.path().join("inbound")).unwrap();
    std::fs::create_dir_all(base.path().join("tmp")).unwrap();
    let orch = local_orchestrator(base.path(), scratch.path());

    orch.upload(
        "inbound",
        "po-1.xml",
        PayloadEnvelope::text("<po/>"),
        UploadOptions {
            append_if_exists: false,
            staging_folder: Some("tmp".into()),
        },
    )
    .await
    .unwrap();
    assert!(base.path().join("inbound/po-1.xml").exists());
    assert_eq!(entries_in(&base.path().join("tmp")), 0);

    let delivered = orch
        .poll(masked_poll("inbound", &ResumptionToken::empty(), "*.xml", ""))
        .await
        .unwrap();
    assert_eq!(delivered_name(&delivered), "po-1.xml");
    assert!(base.path().join("inbound/po-1.xml").exists());

    let drained = orch
        .poll(masked_poll("inbound", delivered.next_token(), "*.xml", ""))
        .await
        .unwrap();
    assert!(!drained.is_delivered());
    assert!(!base.path().join("inbound/po-1.xml").exists());

    assert_eq!(entries_in(scratch.path()), 0);
}

#[tokio::test]
async fn append_on_disk() {
    let base = tempfile::tempdir().unwrap();
    let scratch = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(base.path().join("d")).unwrap();
    std::fs::write(base.path().join("d/f"), "HI").unwrap();
    let orch = local_orchestrator(base.path(), scratch.path());

    orch.upload(
        "d",
        "f",
        PayloadEnvelope::text("HELLO"),
        UploadOptions {
            append_if_exists: true,
            staging_folder: None,
        },
    )
    .await
    .unwrap();

    assert_eq!(std::fs::read(base.path().join("d/f")).unwrap(), b"HIHELLO");
    assert_eq!(entries_in(scratch.path()), 0);
}

#[tokio::test]
async fn staged_upload_into_missing_folder_cleans_up() {
    let base = tempfile::tempdir().unwrap();
    let scratch = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(base.path().join("tmp")).unwrap();
    let orch = local_orchestrator(base.path(), scratch.path());

    let err = orch
        .upload(
            "d_missing",
            "f",
            PayloadEnvelope::text("content"),
            UploadOptions {
                append_if_exists: false,
                staging_folder: Some("tmp".into()),
            },
        )
        .await
        .unwrap_err();

    assert!(matches!(err, TransferError::NotFound { .. }));
    assert!(!base.path().join("tmp/f").exists());
    assert_eq!(entries_in(scratch.path()), 0);
}

#[tokio::test]
async fn failed_download_still_cleans_scratch() {
    let base = tempfile::tempdir().unwrap();
    let scratch = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(base.path().join("d")).unwrap();
    let orch = local_orchestrator(base.path(), scratch.path());

    let err = orch
        .download("d", "missing.txt", TransferEncoding::None)
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), 404);
    assert_eq!(entries_in(scratch.path()), 0);
}

#[tokio::test]
async fn list_reports_files_and_folders() {
    let base = tempfile::tempdir().unwrap();
    let scratch = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(base.path().join("d/sub")).unwrap();
    std::fs::write(base.path().join("d/a.txt"), "a").unwrap();
    let orch = local_orchestrator(base.path(), scratch.path());

    let mut names: Vec<_> = orch
        .list("d")
        .await
        .unwrap()
        .into_iter()
        .map(|d| d.file_name().to_string())
        .collect();
    names.sort();
    assert_eq!(names, vec!["a.txt", "sub"]);
}
