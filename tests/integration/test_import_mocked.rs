//! Import orchestration against a mocked RIS backend

mod common;

use std::sync::Arc;

use common::create_mock_backend;
use pubmed_import_rs::pubmed::normalize_summary;
use pubmed_import_rs::{FilingStatus, ImportError, ImportOrchestrator, NoticeLevel, Publication};
use serde_json::json;
use tracing_test::traced_test;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn publication(pmid: &str, title: &str) -> Publication {
    normalize_summary(
        pmid,
        &json!({"uid": pmid, "title": title, "pubdate": "2021", "source": "BMJ"}),
    )
}

async fn mount_persist(server: &MockServer, title: &str, response: ResponseTemplate) {
    Mock::given(method("POST"))
        .and(path("/publications"))
        .and(body_partial_json(json!({"publication": {"title": title}})))
        .respond_with(response)
        .mount(server)
        .await;
}

#[tokio::test]
#[traced_test]
async fn test_import_many_counts_partial_failure() {
    let server = MockServer::start().await;
    mount_persist(
        &server,
        "First",
        ResponseTemplate::new(201).set_body_json(json!({"success": true, "publication": {"id": "srv-1"}})),
    )
    .await;
    mount_persist(
        &server,
        "Second",
        ResponseTemplate::new(500).set_body_json(json!({"success": false, "error": "database locked"})),
    )
    .await;
    mount_persist(
        &server,
        "Third",
        ResponseTemplate::new(201).set_body_json(json!({"success": true, "publication": {"id": 3}})),
    )
    .await;

    let backend = Arc::new(create_mock_backend(&server));
    let orchestrator = ImportOrchestrator::new(Arc::clone(&backend), backend);

    let batch = vec![
        publication("1", "First"),
        publication("2", "Second"),
        publication("3", "Third"),
    ];
    let summary = orchestrator.import_many(&batch, None).await;

    assert_eq!(summary.success_count, 2);
    assert_eq!(summary.fail_count, 1);
    assert_eq!(summary.failures[0].index, 1);
    assert!(summary.failures[0].message.contains("database locked"));
    assert_eq!(summary.message(), "2 imported / 1 failed");
    assert_eq!(summary.notice().level, NoticeLevel::Warning);
}

#[tokio::test]
#[traced_test]
async fn test_import_one_files_into_folder() {
    let server = MockServer::start().await;
    mount_persist(
        &server,
        "Filed",
        ResponseTemplate::new(200).set_body_json(json!({"success": true, "publication": {"id": "srv-9"}})),
    )
    .await;

    Mock::given(method("POST"))
        .and(path("/library"))
        .and(header("authorization", "Bearer test-token"))
        .and(body_partial_json(json!({
            "action": "addPublication",
            "folderId": "folder-1",
            "publicationId": "srv-9"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .expect(1)
        .mount(&server)
        .await;

    let backend = Arc::new(create_mock_backend(&server));
    let orchestrator = ImportOrchestrator::new(Arc::clone(&backend), backend);

    let source = publication("42", "Filed");
    let outcome = orchestrator
        .import_one(&source, Some("folder-1"))
        .await
        .unwrap();

    assert_eq!(outcome.persisted.id, "srv-9");
    assert_eq!(outcome.persisted.publication.id, "srv-9");
    assert_eq!(outcome.persisted.synthetic_id, source.id);
    assert_eq!(
        outcome.filing,
        FilingStatus::Filed {
            folder_id: "folder-1".to_string()
        }
    );
}

#[tokio::test]
#[traced_test]
async fn test_filing_failure_keeps_persisted_record() {
    let server = MockServer::start().await;
    mount_persist(
        &server,
        "Orphan",
        ResponseTemplate::new(200).set_body_json(json!({"success": true, "publication": {"id": "srv-5"}})),
    )
    .await;
    Mock::given(method("POST"))
        .and(path("/library"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": false, "error": "folder is locked"})))
        .mount(&server)
        .await;

    let backend = Arc::new(create_mock_backend(&server));
    let orchestrator = ImportOrchestrator::new(Arc::clone(&backend), backend);

    let summary = orchestrator
        .import_many(&[publication("5", "Orphan")], Some("folder-1"))
        .await;
    assert_eq!(summary.success_count, 1);
    assert_eq!(summary.filing_failed_count, 1);
    assert!(summary.message().contains("library filing failed"));

    let retry = orchestrator.retry_filing("srv-5", "folder-1").await;
    assert!(matches!(retry, Err(ImportError::LibraryFilingFailure { .. })));
}

#[tokio::test]
#[traced_test]
async fn test_missing_server_id_is_persistence_failure() {
    let server = MockServer::start().await;
    mount_persist(
        &server,
        "Nameless",
        ResponseTemplate::new(200).set_body_json(json!({"success": true})),
    )
    .await;

    let backend = Arc::new(create_mock_backend(&server));
    let orchestrator = ImportOrchestrator::new(Arc::clone(&backend), backend);

    let result = orchestrator
        .import_one(&publication("7", "Nameless"), None)
        .await;
    assert!(matches!(result, Err(ImportError::PersistenceFailure { title, .. }) if title == "Nameless"));
}

#[tokio::test]
#[traced_test]
async fn test_persist_wraps_record_in_publication_envelope() {
    let server = MockServer::start().await;
    mount_persist(
        &server,
        "Wrapped",
        ResponseTemplate::new(201).set_body_json(json!({"success": true, "publication": {"id": "srv-2"}})),
    )
    .await;

    let backend = Arc::new(create_mock_backend(&server));
    let orchestrator = ImportOrchestrator::new(Arc::clone(&backend), backend);
    orchestrator
        .import_one(&publication("8", "Wrapped"), None)
        .await
        .unwrap();

    let requests = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    let object = body.as_object().unwrap();
    assert_eq!(object.keys().collect::<Vec<_>>(), vec!["publication"]);
    assert_eq!(body["publication"]["pubmedId"], "8");
    assert_eq!(body["publication"]["source"], "PubMed");
}
