//! Upload modes: replace, append and staged

use filerelay_core::domain::{DomainError, PayloadEnvelope, TransferEncoding};
use filerelay_core::usecases::{TransferError, UploadOptions};

use crate::common::*;

fn append() -> UploadOptions {
    UploadOptions {
        append_if_exists: true,
        staging_folder: None,
    }
}

fn staged(folder: &str) -> UploadOptions {
    UploadOptions {
        append_if_exists: false,
        staging_folder: Some(folder.to_string()),
    }
}

#[tokio::test]
async fn direct_upload_replaces_existing_file() {
    let (store, orch) = memory_orchestrator();
    store.put_file("d/f", "old content");

    let descriptor = orch
        .upload("d", "f", PayloadEnvelope::text("new"), UploadOptions::default())
        .await
        .unwrap();

    assert_eq!(descriptor.file_path(), "d/f");
    assert_eq!(descriptor.server_address(), SERVER);
    assert_eq!(store.read_file("d/f").unwrap(), b"new");
}

#[tokio::test]
async fn append_concatenates_existing_content() {
    let (store, orch) = memory_orchestrator();
    store.put_file("d/f", "HI");

    orch.upload("d", "f", PayloadEnvelope::text("HELLO"), append())
        .await
        .unwrap();

    assert_eq!(store.read_file("d/f").unwrap(), b"HIHELLO");
}

#[tokio::test]
async fn append_to_missing_file_creates_it() {
    let (store, orch) = memory_orchestrator();
    store.create_folder("d");

    orch.upload("d", "f", PayloadEnvelope::text("first"), append())
        .await
        .unwrap();

    assert_eq!(store.read_file("d/f").unwrap(), b"first");
}

#[tokio::test]
async fn base64_payload_is_decoded_before_upload() {
    let (store, orch) = memory_orchestrator();
    store.create_folder("d");

    orch.upload(
        "d",
        "blob.bin",
        PayloadEnvelope::base64("/wAQ"),
        UploadOptions::default(),
    )
    .await
    .unwrap();

    assert_eq!(store.read_file("d/blob.bin").unwrap(), vec![0xff, 0x00, 0x10]);

    let doc = orch
        .download("d", "blob.bin", TransferEncoding::Base64)
        .await
        .unwrap();
    assert_eq!(doc.payload.content.as_deref(), Some("/wAQ"));
}

#[tokio::test]
async fn append_with_staging_makes_no_remote_call() {
    let (store, orch) = memory_orchestrator();
    store.put_file("d/f", "HI");

    let options = UploadOptions {
        append_if_exists: true,
        staging_folder: Some("tmp".into()),
    };
    let err = orch
        .upload("d", "f", PayloadEnvelope::text("x"), options)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        TransferError::Validation(DomainError::InvalidOperation(_))
    ));
    assert_eq!(store.connects(), 0);
    assert_eq!(store.remote_calls(), 0);
}

#[tokio::test]
async fn staged_upload_replaces_destination() {
    let (store, orch) = memory_orchestrator();
    store.create_folder("tmp");
    store.put_file("d/f", "old");

    orch.upload("d", "f", PayloadEnvelope::text("new"), staged("tmp"))
        .await
        .unwrap();

    assert_eq!(store.read_file("d/f").unwrap(), b"new");
    assert!(!store.file_exists("tmp/f"));
}

#[tokio::test]
async fn staged_upload_into_missing_folder_leaves_nothing_behind() {
    let (store, orch) = memory_orchestrator();
    store.create_folder("tmp");

    let err = orch
        .upload(
            "d_missing",
            "f",
            PayloadEnvelope::text("content"),
            staged("tmp"),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, TransferError::NotFound { ref path, .. } if path == "d_missing/f"));
    assert!(!store.file_exists("tmp/f"));
    assert!(!store.file_exists("d_missing/f"));
}

#[tokio::test]
async fn staged_copy_removed_when_destination_cannot_be_replaced() {
    let (store, orch) = memory_orchestrator();
    store.create_folder("tmp");
    store.put_file("d/f", "old");
    store.deny("d/f");

    let err = orch
        .upload("d", "f", PayloadEnvelope::text("new"), staged("tmp"))
        .await
        .unwrap_err();

    assert!(matches!(err, TransferError::Forbidden { ref path, .. } if path == "d/f"));
    assert!(!store.file_exists("tmp/f"));
    assert_eq!(store.read_file("d/f").unwrap(), b"old");
}

#[tokio::test]
async fn blank_staging_folder_means_direct_mode() {
    let (store, orch) = memory_orchestrator();
    store.put_file("d/f", "HI");

    let options = UploadOptions {
        append_if_exists: true,
        staging_folder: Some("   ".into()),
    };
    orch.upload("d", "f", PayloadEnvelope::text("!"), options)
        .await
        .unwrap();
    assert_eq!(store.read_file("d/f").unwrap(), b"HI!");
}

#[tokio::test]
async fn staging_folder_is_under_root() {
    let (store, orch) = memory_orchestrator_with_root("data");
    store.create_folder("data/tmp");
    store.create_folder("data/out");

    let descriptor = orch
        .upload("out", "r.csv", PayloadEnvelope::text("a,b"), staged("tmp"))
        .await
        .unwrap();

    assert_eq!(descriptor.folder_path(), "data/out");
    assert_eq!(store.read_file("data/out/r.csv").unwrap(), b"a,b");
    assert!(store.file_names("data/tmp").is_empty());
}

#[tokio::test]
async fn null_payload_is_rejected_locally() {
    let (store, orch) = memory_orchestrator();
    let err = orch
        .upload("d", "f", PayloadEnvelope::default(), UploadOptions::default())
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), 400);
    assert_eq!(store.connects(), 0);
}

#[tokio::test]
async fn empty_payload_uploads_empty_file() {
    let (store, orch) = memory_orchestrator();
    store.create_folder("d");
    orch.upload("d", "empty", PayloadEnvelope::text(""), UploadOptions::default())
        .await
        .unwrap();
    assert_eq!(store.read_file("d/empty").unwrap(), b"");
}
