//! Polling protocol: delivery, redelivery, acknowledgement and ordering

use filerelay_core::domain::{DomainError, FileType, ResumptionToken, TransferEncoding};
use filerelay_core::usecases::TransferError;

use crate::common::*;

#[tokio::test]
async fn redelivers_until_acknowledged() {
    let (store, orch) = memory_orchestrator();
    store.put_file("d/f", "payload");

    let first = orch
        .poll(poll_request("d", &ResumptionToken::empty()))
        .await
        .unwrap();
    assert_eq!(delivered_name(&first), "f");
    assert_eq!(first.next_token().as_str(), "f");

    // Caller lost the outcome and retries from the empty token.
    let retried = orch
        .poll(poll_request("d", &ResumptionToken::empty()))
        .await
        .unwrap();
    assert_eq!(retried, first);
    assert!(store.file_exists("d/f"));
}

#[tokio::test]
async fn acknowledgement_deletes_and_drains() {
    let (store, orch) = memory_orchestrator();
    store.put_file("d/f", "payload");

    let first = orch
        .poll(poll_request("d", &ResumptionToken::empty()))
        .await
        .unwrap();
    assert_eq!(delivered_name(&first), "f");

    let second = orch
        .poll(poll_request("d", first.next_token()))
        .await
        .unwrap();
    assert!(!second.is_delivered());
    assert!(second.next_token().is_empty());
    assert!(!store.file_exists("d/f"));

    let third = orch
        .poll(poll_request("d", &ResumptionToken::empty()))
        .await
        .unwrap();
    assert!(!third.is_delivered());
}

#[tokio::test]
async fn replaying_an_acknowledged_token_is_harmless() {
    let (store, orch) = memory_orchestrator();
    store.put_file("d/a", "1");
    store.put_file("d/b", "2");

    let first = orch
        .poll(poll_request("d", &ResumptionToken::empty()))
        .await
        .unwrap();
    let second = orch
        .poll(poll_request("d", first.next_token()))
        .await
        .unwrap();
    assert_eq!(delivered_name(&second), "b");

    // Same acknowledgement again: "a" is already gone, "b" is redelivered.
    let replay = orch
        .poll(poll_request("d", first.next_token()))
        .await
        .unwrap();
    assert_eq!(delivered_name(&replay), "b");
    assert!(store.file_exists("d/b"));
}

#[tokio::test]
async fn walks_files_in_backend_order() {
    let (store, orch) = memory_orchestrator();
    for name in ["c.xml", "a.xml", "b.xml"] {
        store.put_file(&format!("d/{name}"), name);
    }

    let mut token = ResumptionToken::empty();
    let mut seen = Vec::new();
    loop {
        let outcome = orch.poll(poll_request("d", &token)).await.unwrap();
        token = outcome.next_token().clone();
        match outcome.document() {
            Some(doc) => seen.push(doc.descriptor.file_name().to_string()),
            None => break,
        }
    }
    assert_eq!(seen, vec!["c.xml", "a.xml", "b.xml"]);
    assert!(store.file_names("d").is_empty());
}

#[tokio::test]
async fn masks_select_and_exclude() {
    let (store, orch) = memory_orchestrator();
    store.put_file("d/a.txt", "t");
    store.put_file("d/a.tar.gz", "z");
    store.put_file("d/A.XML", "<a/>");

    let outcome = orch
        .poll(masked_poll("d", &ResumptionToken::empty(), "*.xml", "*.txt"))
        .await
        .unwrap();
    assert_eq!(delivered_name(&outcome), "A.XML");
    let doc = outcome.document().unwrap();
    assert_eq!(doc.payload.content.as_deref(), Some("<a/>"));
    assert_eq!(doc.payload.transfer_encoding, TransferEncoding::None);
    assert_eq!(doc.descriptor.file_path(), "d/A.XML");
    assert_eq!(doc.descriptor.server_address(), SERVER);

    let none = orch
        .poll(masked_poll("d", &ResumptionToken::empty(), "*.csv", ""))
        .await
        .unwrap();
    assert!(!none.is_delivered());
}

#[tokio::test]
async fn directories_are_never_delivered() {
    let (store, orch) = memory_orchestrator();
    store.create_folder("d/archive");
    store.put_file("d/report.pdf", "pdf");

    let outcome = orch
        .poll(poll_request("d", &ResumptionToken::empty()))
        .await
        .unwrap();
    assert_eq!(delivered_name(&outcome), "report.pdf");
}

#[tokio::test]
async fn unreadable_match_is_skipped() {
    let (store, orch) = memory_orchestrator();
    store.put_file("d/broken.xml", "x");
    store.put_file("d/good.xml", "y");
    store.break_download("d/broken.xml");

    let outcome = orch
        .poll(poll_request("d", &ResumptionToken::empty()))
        .await
        .unwrap();
    assert_eq!(delivered_name(&outcome), "good.xml");
    assert!(store.file_exists("d/broken.xml"));
}

#[tokio::test]
async fn dropped_connection_during_fetch_is_reported() {
    let (store, orch) = memory_orchestrator();
    store.put_file("d/a.xml", "x");
    store.put_file("d/b.xml", "y");
    store.drop_connection_on_download("d/a.xml");

    let err = orch
        .poll(poll_request("d", &ResumptionToken::empty()))
        .await
        .unwrap_err();
    assert!(matches!(err, TransferError::ServiceUnavailable(_)));
    assert!(store.file_exists("d/a.xml"));
    assert!(store.file_exists("d/b.xml"));
}

#[tokio::test]
async fn binary_trigger_delivers_base64() {
    let (store, orch) = memory_orchestrator();
    store.put_file("d/blob.bin", vec![0xff, 0x00, 0x10]);

    let request = poll_request("d", &ResumptionToken::empty()).with_file_type(FileType::Binary);
    let outcome = orch.poll(request).await.unwrap();
    let doc = outcome.document().unwrap();
    assert_eq!(doc.payload.transfer_encoding, TransferEncoding::Base64);
    assert_eq!(doc.payload.to_bytes().unwrap(), vec![0xff, 0x00, 0x10]);
}

#[tokio::test]
async fn invalid_mask_has_no_remote_side_effect() {
    let (store, orch) = memory_orchestrator();
    store.put_file("d/pending.xml", "x");

    let err = orch
        .poll(masked_poll("d", &ResumptionToken::from("pending.xml"), "[abc", ""))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        TransferError::Validation(DomainError::InvalidMask { .. })
    ));
    assert!(store.file_exists("d/pending.xml"));
    assert_eq!(store.remote_calls(), 0);
}

#[tokio::test]
async fn missing_folder_is_not_found() {
    let (_store, orch) = memory_orchestrator();
    let err = orch
        .poll(poll_request("missing", &ResumptionToken::empty()))
        .await
        .unwrap_err();
    assert!(matches!(err, TransferError::NotFound { ref path, .. } if path == "missing"));
}

#[tokio::test]
async fn failed_acknowledgement_aborts_before_listing() {
    let (store, orch) = memory_orchestrator();
    store.put_file("d/locked.xml", "x");
    store.put_file("d/next.xml", "y");
    store.deny("d/locked.xml");

    let err = orch
        .poll(poll_request("d", &ResumptionToken::from("locked.xml")))
        .await
        .unwrap_err();
    assert!(matches!(err, TransferError::Forbidden { ref path, .. } if path == "d/locked.xml"));
    // delete attempt only; no listing
    assert_eq!(store.remote_calls(), 1);
}

#[tokio::test]
async fn root_folder_prefixes_poll_paths() {
    let (store, orch) = memory_orchestrator_with_root("data");
    store.put_file("data/in/a.xml", "a");

    let outcome = orch
        .poll(poll_request("in", &ResumptionToken::empty()))
        .await
        .unwrap();
    let doc = outcome.document().unwrap();
    assert_eq!(doc.descriptor.folder_path(), "data/in");

    orch.poll(poll_request("in", outcome.next_token()))
        .await
        .unwrap();
    assert!(!store.file_exists("data/in/a.xml"));
}

#[tokio::test]
async fn concurrent_polls_on_one_folder_deliver_consistently() {
    let (store, orch) = memory_orchestrator();
    store.put_file("d/only.xml", "x");
    let orch = std::sync::Arc::new(orch);

    let mut handles = Vec::new();
    for _ in 0..8 {
        let orch = std::sync::Arc::clone(&orch);
        handles.push(tokio::spawn(async move {
            orch.poll(poll_request("d", &ResumptionToken::empty()))
                .await
                .unwrap()
        }));
    }
    for handle in handles {
        assert_eq!(delivered_name(&handle.await.unwrap()), "only.xml");
    }
    assert!(store.file_exists("d/only.xml"));
}
