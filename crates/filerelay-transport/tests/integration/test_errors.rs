//! Error mapping for delete, download and list

use filerelay_core::domain::TransferEncoding;
use filerelay_core::usecases::{ErrorCategory, TransferError};

use crate::common::*;

#[tokio::test]
async fn delete_missing_file_is_not_found() {
    let (store, orch) = memory_orchestrator();
    store.create_folder("d");

    let err = orch.delete("d", "ghost.txt").await.unwrap_err();
    assert_eq!(err.category(), ErrorCategory::NotFound);
    assert_eq!(err.status_code(), 404);
}

#[tokio::test]
async fn delete_denied_is_forbidden() {
    let (store, orch) = memory_orchestrator();
    store.put_file("secure/a.txt", "x");
    store.deny("secure");

    let err = orch.delete("secure", "a.txt").await.unwrap_err();
    assert!(matches!(err, TransferError::Forbidden { ref path, .. } if path == "secure/a.txt"));
    assert!(store.file_exists("secure/a.txt"));
}

#[tokio::test]
async fn upload_denied_is_forbidden() {
    let (store, orch) = memory_orchestrator();
    store.create_folder("secure");
    store.deny("secure");

    let err = orch
        .upload(
            "secure",
            "a.txt",
            filerelay_core::domain::PayloadEnvelope::text("x"),
            Default::default(),
        )
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), 403);
}

#[tokio::test]
async fn download_missing_file_is_not_found() {
    let (store, orch) = memory_orchestrator();
    store.create_folder("d");

    let err = orch
        .download("d", "nope", TransferEncoding::None)
        .await
        .unwrap_err();
    assert!(matches!(err, TransferError::NotFound { ref path, .. } if path == "d/nope"));
}

#[tokio::test]
async fn download_binary_as_text_is_content_error() {
    let (store, orch) = memory_orchestrator();
    store.put_file("d/bin", vec![0xc3, 0x28]);

    let err = orch
        .download("d", "bin", TransferEncoding::None)
        .await
        .unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Content);
}

#[tokio::test]
async fn list_skips_special_entries_and_keeps_order() {
    let (store, orch) = memory_orchestrator();
    store.put_file("d/z.txt", "z");
    store.put_file("d/a.txt", "a");

    let names: Vec<_> = orch
        .list("d")
        .await
        .unwrap()
        .into_iter()
        .map(|d| d.file_name().to_string())
        .collect();
    assert_eq!(names, vec!["z.txt", "a.txt"]);
}

#[tokio::test]
async fn list_missing_folder_is_not_found() {
    let (_store, orch) = memory_orchestrator();
    let err = orch.list("missing").await.unwrap_err();
    assert_eq!(err.category(), ErrorCategory::NotFound);
}

#[tokio::test]
async fn delete_then_download_round_trip() {
    let (store, orch) = memory_orchestrator();
    store.put_file("d/note.txt", "hello");

    let doc = orch
        .download("d", "note.txt", TransferEncoding::None)
        .await
        .unwrap();
    assert_eq!(doc.payload.content.as_deref(), Some("hello"));
    assert_eq!(doc.descriptor.file_path(), "d/note.txt");

    orch.delete("d", "note.txt").await.unwrap();
    assert!(!store.file_exists("d/note.txt"));
}
