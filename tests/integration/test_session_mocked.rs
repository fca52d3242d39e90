//! Search session behavior against a mocked PubMed

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{create_mock_client, esearch_json, esummary_doc, esummary_json};
use pubmed_import_rs::{
    LoadMoreOutcome, NoticeLevel, ResultView, SearchCriteria, SearchOutcome, SearchSession,
    SessionState,
};
use tracing_test::traced_test;
use wiremock::matchers::{method, path_regex, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn page_ids(start: usize, len: usize) -> Vec<String> {
    (start..start + len).map(|i| (1000 + i).to_string()).collect()
}

/// Mount one esearch/esummary pair for the page starting at `start`
async fn mount_page(server: &MockServer, total: usize, start: usize, len: usize, delay: Duration) {
    let ids = page_ids(start, len);
    let id_refs: Vec<&str> = ids.iter().map(String::as_str).collect();

    Mock::given(method("GET"))
        .and(path_regex(r"/esearch\.fcgi.*"))
        .and(query_param("retstart", start.to_string()))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(esearch_json(total, start, &id_refs))
                .set_delay(delay),
        )
        .mount(server)
        .await;

    let docs: Vec<(&str, serde_json::Value)> = id_refs
        .iter()
        .map(|id| (*id, esummary_doc(id, &format!("Record {}", id))))
        .collect();
    Mock::given(method("GET"))
        .and(path_regex(r"/esummary\.fcgi.*"))
        .and(query_param("id", ids.join(",")))
        .respond_with(ResponseTemplate::new(200).set_body_json(esummary_json(&docs)))
        .mount(server)
        .await;
}

#[tokio::test]
#[traced_test]
async fn test_search_then_load_more_until_exhausted() {
    let server = MockServer::start().await;
    mount_page(&server, 25, 0, 10, Duration::ZERO).await;
    mount_page(&server, 25, 10, 10, Duration::ZERO).await;
    mount_page(&server, 25, 20, 5, Duration::ZERO).await;

    let session = SearchSession::with_page_size(create_mock_client(&server), 10);
    let outcome = session
        .start_search(&SearchCriteria::new().title("diabetes"))
        .await;
    assert_eq!(
        outcome,
        SearchOutcome::Results {
            fetched: 10,
            total_count: 25
        }
    );
    assert_eq!(session.query(), "diabetes[Title]");

    assert!(matches!(session.load_more().await, LoadMoreOutcome::Appended { added: 10, .. }));
    assert!(matches!(session.load_more().await, LoadMoreOutcome::Appended { added: 5, loaded: 25 }));
    assert_eq!(session.load_more().await, LoadMoreOutcome::Exhausted);

    let results = session.results();
    assert_eq!(results.len(), 25);
    assert_eq!(results[24].pubmed_id, "1024");
    assert!(results.len() <= session.total_count());
}

#[tokio::test]
#[traced_test]
async fn test_overlapping_load_more_issues_one_request() {
    let server = MockServer::start().await;
    mount_page(&server, 40, 0, 10, Duration::ZERO).await;
    mount_page(&server, 40, 10, 10, Duration::from_millis(100)).await;

    let session = Arc::new(SearchSession::with_page_size(create_mock_client(&server), 10));
    session
        .start_search(&SearchCriteria::new().keywords("insulin"))
        .await;

    let (a, b) = tokio::join!(session.load_more(), session.load_more());
    let outcomes = [a, b];
    assert!(outcomes.contains(&LoadMoreOutcome::Ignored));
    assert_eq!(session.offset(), 20);

    let esearch_calls = server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|r| r.url.path().ends_with("esearch.fcgi"))
        .count();
    assert_eq!(esearch_calls, 2);
}

#[tokio::test]
#[traced_test]
async fn test_no_results_notice() {
    let server = MockServer::start().await;
    common::mount_esearch(&server, 0, esearch_json(0, 0, &[])).await;

    let session = SearchSession::new(create_mock_client(&server));
    let outcome = session
        .start_search(&SearchCriteria::new().author("Nobody Q"))
        .await;

    assert_eq!(outcome, SearchOutcome::NoResults);
    assert_eq!(session.state(), SessionState::Idle);
    let notices = session.take_notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].level, NoticeLevel::Info);
}

#[tokio::test]
#[traced_test]
async fn test_provider_outage_sets_error_state() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path_regex(r"/esearch\.fcgi.*"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let session = SearchSession::new(create_mock_client(&server));
    let outcome = session
        .start_search(&SearchCriteria::new().journal("Lancet"))
        .await;

    assert!(matches!(outcome, SearchOutcome::Failed { .. }));
    assert!(matches!(session.state(), SessionState::Error(msg) if msg.contains("unavailable")));
}

#[tokio::test]
#[traced_test]
async fn test_lookup_by_pmid_and_select() {
    let server = MockServer::start().await;
    common::mount_esummary(
        &server,
        "31978945",
        esummary_json(&[("31978945", esummary_doc("31978945", "A pneumonia outbreak"))]),
    )
    .await;

    let session = SearchSession::new(create_mock_client(&server));
    let outcome = session.lookup("31978945").await;
    assert!(matches!(outcome, SearchOutcome::Results { fetched: 1, .. }));

    let view = ResultView::default();
    let id = session.results()[0].id.clone();
    assert!(session.toggle_selection(&id, &view));
    assert_eq!(session.selected().len(), 1);

    session.close();
    assert!(session.results().is_empty());
    assert_eq!(session.selection_len(), 0);
}
