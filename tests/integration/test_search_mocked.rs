//! Integration tests for the PubMed adapter using mocked E-utilities

mod common;

use common::{create_mock_client, esearch_json, esummary_doc, esummary_json};
use pubmed_import_rs::{BibliographicSource, ClientConfig, ImportError, PubMedClient, PublicationYear, RetryConfig};
use std::time::Duration;
use tracing_test::traced_test;
use wiremock::matchers::{method, path_regex, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
#[traced_test]
async fn test_search_returns_normalized_publications() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path_regex(r"/esearch\.fcgi.*"))
        .and(query_param("term", "diabetes[Title]"))
        .and(query_param("retmax", "10"))
        .and(query_param("retstart", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(esearch_json(2, 0, &["111", "222"])))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path_regex(r"/esummary\.fcgi.*"))
        .and(query_param("id", "111,222"))
        .respond_with(ResponseTemplate::new(200).set_body_json(esummary_json(&[
            ("111", esummary_doc("111", "Diabetes in adults")),
            ("222", esummary_doc("222", "Diabetes in children")),
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let client = create_mock_client(&server);
    let page = client
        .search("diabetes[Title]", 10, 0)
        .await
        .expect("search should succeed");

    assert_eq!(page.total_count, 2);
    assert_eq!(page.publications.len(), 2);
    assert_eq!(page.query_translation.as_deref(), Some("diabetes[Title]"));

    let first = &page.publications[0];
    assert_eq!(first.pubmed_id, "111");
    assert_eq!(first.source, "PubMed");
    assert_eq!(first.publication_type, "article");
    assert_eq!(first.year, PublicationYear::Year(2020));
    assert_eq!(first.journal, "Diabetes care");
    assert_eq!(first.doi, "10.2337/dc111");
    assert_eq!(first.url, "https://pubmed.ncbi.nlm.nih.gov/111/");
    assert!(first.id.starts_with("pubmed_111_"));

    assert_ne!(page.publications[0].id, page.publications[1].id);
}

#[tokio::test]
#[traced_test]
async fn test_search_without_hits_is_no_results() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path_regex(r"/esearch\.fcgi.*"))
        .respond_with(ResponseTemplate::new(200).set_body_json(esearch_json(0, 0, &[])))
        .mount(&server)
        .await;

    let client = create_mock_client(&server);
    let result = client.search("zzzz_nothing", 10, 0).await;

    let error = result.unwrap_err();
    assert!(matches!(error, ImportError::NoResults { .. }));
    assert!(error.is_informational());

    // No esummary call for an empty id list
    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
}

#[tokio::test]
#[traced_test]
async fn test_provider_error_status_is_unavailable() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path_regex(r"/esearch\.fcgi.*"))
        .respond_with(ResponseTemplate::new(503).set_body_string("Service Unavailable"))
        .mount(&server)
        .await;

    let client = create_mock_client(&server);
    let error = client.search("diabetes", 10, 0).await.unwrap_err();

    match &error {
        ImportError::ProviderUnavailable { status, message } => {
            assert_eq!(*status, 503);
            assert_eq!(message, "Service Unavailable");
        }
        other => panic!("expected ProviderUnavailable, got {:?}", other),
    }
    assert!(error.user_message().contains("unavailable"));
}

#[tokio::test]
#[traced_test]
async fn test_transient_failure_is_retried() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path_regex(r"/esearch\.fcgi.*"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path_regex(r"/esearch\.fcgi.*"))
        .respond_with(ResponseTemplate::new(200).set_body_json(esearch_json(1, 0, &["111"])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path_regex(r"/esummary\.fcgi.*"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(esummary_json(&[("111", esummary_doc("111", "Retried"))])),
        )
        .mount(&server)
        .await;

    let config = ClientConfig::new()
        .with_base_url(server.uri())
        .with_rate_limit(100.0)
        .with_retry_config(
            RetryConfig::new()
                .with_max_retries(2)
                .with_initial_delay(Duration::from_millis(10))
                .without_jitter(),
        );
    let client = PubMedClient::with_config(config);

    let page = client.search("diabetes", 10, 0).await.expect("retry should recover");
    assert_eq!(page.publications[0].title, "Retried");
}

#[tokio::test]
#[traced_test]
async fn test_esearch_error_field_is_unavailable() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path_regex(r"/esearch\.fcgi.*"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "esearchresult": {"ERROR": "Invalid query syntax"}
        })))
        .mount(&server)
        .await;

    let client = create_mock_client(&server);
    let error = client.search("((", 10, 0).await.unwrap_err();
    assert!(matches!(error, ImportError::ProviderUnavailable { status: 200, .. }));
}

#[tokio::test]
#[traced_test]
async fn test_partial_summary_skips_records() {
    let server = MockServer::start().await;
    common::mount_esearch(&server, 0, esearch_json(3, 0, &["1", "2", "3"])).await;
    common::mount_esummary(
        &server,
        "1,2,3",
        esummary_json(&[
            ("1", esummary_doc("1", "Kept")),
            ("2", serde_json::json!({"uid": "2", "error": "cannot get document summary"})),
            ("3", esummary_doc("3", "Also kept")),
        ]),
    )
    .await;

    let client = create_mock_client(&server);
    let page = client.search("diabetes", 10, 0).await.unwrap();
    assert_eq!(page.publications.len(), 2);
    assert_eq!(page.ids_returned, 3);
    assert_eq!(page.skipped(), 1);
}

#[tokio::test]
#[traced_test]
async fn test_fetch_by_id() {
    let server = MockServer::start().await;
    common::mount_esummary(
        &server,
        "31978945",
        esummary_json(&[("31978945", esummary_doc("31978945", "A pneumonia outbreak"))]),
    )
    .await;

    let client = create_mock_client(&server);
    let publication = client.fetch_by_id(" 31978945 ").await.unwrap();
    assert_eq!(publication.title, "A pneumonia outbreak");
    assert_eq!(publication.authors, vec!["Smith J", "Doe A"]);
}

#[tokio::test]
#[traced_test]
async fn test_fetch_by_id_not_found() {
    let server = MockServer::start().await;
    common::mount_esummary(
        &server,
        "99999999",
        esummary_json(&[("99999999", serde_json::json!({"uid": "99999999", "error": "invalid uid"}))]),
    )
    .await;

    let client = create_mock_client(&server);
    let error = client.fetch_by_id("99999999").await.unwrap_err();
    assert!(matches!(error, ImportError::NotFound { .. }));
}

#[tokio::test]
#[traced_test]
async fn test_invalid_id_makes_no_request() {
    let server = MockServer::start().await;
    let client = create_mock_client(&server);

    let error = client.fetch_by_id("PMC123").await.unwrap_err();
    assert!(matches!(error, ImportError::InvalidIdFormat { .. }));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
#[traced_test]
async fn test_api_parameters_are_sent() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path_regex(r"/esearch\.fcgi.*"))
        .and(query_param("api_key", "secret"))
        .and(query_param("email", "researcher@hospital.org"))
        .and(query_param("tool", "ris-import"))
        .respond_with(ResponseTemplate::new(200).set_body_json(esearch_json(0, 0, &[])))
        .expect(1)
        .mount(&server)
        .await;

    let config = ClientConfig::new()
        .with_base_url(server.uri())
        .with_api_key("secret")
        .with_email("researcher@hospital.org")
        .with_tool("ris-import")
        .with_rate_limit(100.0)
        .with_retry_config(RetryConfig::disabled());
    let client = PubMedClient::with_config(config);

    let result = client.search("diabetes", 10, 0).await;
    assert!(matches!(result, Err(ImportError::NoResults { .. })));
}
