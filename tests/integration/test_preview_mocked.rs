//! Preview summaries against a mocked summarization endpoint

use pubmed_import_rs::pubmed::normalize_summary;
use pubmed_import_rs::{BackendConfig, Modal, PreviewManager, Publication, SummaryClient, SummaryState};
use serde_json::json;
use std::time::Duration;
use tracing_test::traced_test;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn publication() -> Publication {
    normalize_summary(
        "31978945",
        &json!({"uid": "31978945", "title": "A pneumonia outbreak", "pubdate": "2020"}),
    )
}

fn summary_state(manager: &PreviewManager) -> &SummaryState {
    match manager.modal() {
        Modal::Single(single) => &single.summary,
        other => panic!("expected single preview, got {:?}", other),
    }
}

#[tokio::test]
#[traced_test]
async fn test_summary_ready() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/ai/summarize"))
        .and(body_partial_json(json!({"publications": [{"title": "A pneumonia outbreak"}]})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [{"success": true, "summary": "Novel coronavirus cluster.", "keywords": ["covid"]}]
        })))
        .mount(&server)
        .await;

    let summarizer = SummaryClient::new(BackendConfig::new(server.uri()));
    let mut manager = PreviewManager::new();
    manager.preview_one(publication(), &summarizer).await;

    match summary_state(&manager) {
        SummaryState::Ready(summary) => {
            assert_eq!(summary.summary, "Novel coronavirus cluster.");
            assert_eq!(summary.keywords, vec!["covid"]);
        }
        other => panic!("unexpected state {:?}", other),
    }
}

#[tokio::test]
#[traced_test]
async fn test_summary_failure_degrades() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/ai/summarize"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [{"success": false, "error": "model overloaded"}]
        })))
        .mount(&server)
        .await;

    let summarizer = SummaryClient::new(BackendConfig::new(server.uri()));
    let mut manager = PreviewManager::new();
    manager.preview_one(publication(), &summarizer).await;

    assert!(matches!(summary_state(&manager), SummaryState::Unavailable(_)));
    assert!(manager.import_request().is_some());
}

#[tokio::test]
#[traced_test]
async fn test_summary_timeout_degrades() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/ai/summarize"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"results": []}))
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&server)
        .await;

    let config = BackendConfig::new(server.uri()).with_summary_timeout(Duration::from_millis(50));
    let summarizer = SummaryClient::new(config);
    let mut manager = PreviewManager::new();
    manager.preview_one(publication(), &summarizer).await;

    assert!(matches!(summary_state(&manager), SummaryState::Unavailable(_)));
}
