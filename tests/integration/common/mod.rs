//! Shared helpers for the mocked integration tests

#![allow(dead_code)]

use pubmed_import_rs::{BackendConfig, ClientConfig, PubMedClient, RestBackend, RetryConfig};
use serde_json::{Value, json};
use wiremock::matchers::{method, path_regex, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// ESearch JSON body for a list of ids
pub fn esearch_json(count: usize, retstart: usize, ids: &[&str]) -> Value {
    json!({
        "header": {"type": "esearch", "version": "0.3"},
        "esearchresult": {
            "count": count.to_string(),
            "retmax": ids.len().to_string(),
            "retstart": retstart.to_string(),
            "idlist": ids,
            "querytranslation": "diabetes[Title]"
        }
    })
}

/// One ESummary document with the fields the normalizer reads
pub fn esummary_doc(pmid: &str, title: &str) -> Value {
    json!({
        "uid": pmid,
        "pubdate": "2020 Feb",
        "epubdate": "2020 Jan 15",
        "source": "Diabetes Care",
        "fulljournalname": "Diabetes care",
        "authors": [
            {"name": "Smith J", "authtype": "Author"},
            {"name": "Doe A", "authtype": "Author"}
        ],
        "title": title,
        "volume": "43",
        "issue": "2",
        "pages": "100-110",
        "articleids": [
            {"idtype": "pubmed", "value": pmid},
            {"idtype": "doi", "value": format!("10.2337/dc{}", pmid)}
        ],
        "pubtype": ["Journal Article"],
        "lang": ["eng"]
    })
}

/// ESummary JSON body wrapping `docs` keyed by uid
pub fn esummary_json(docs: &[(&str, Value)]) -> Value {
    let mut result = serde_json::Map::new();
    let uids: Vec<&str> = docs.iter().map(|(id, _)| *id).collect();
    result.insert("uids".to_string(), json!(uids));
    for (id, doc) in docs {
        result.insert(id.to_string(), doc.clone());
    }
    json!({"header": {"type": "esummary"}, "result": result})
}

pub async fn mount_esearch(server: &MockServer, retstart: usize, body: Value) {
    Mock::given(method("GET"))
        .and(path_regex(r"/esearch\.fcgi.*"))
        .and(query_param("retstart", retstart.to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

pub async fn mount_esummary(server: &MockServer, ids: &str, body: Value) {
    Mock::given(method("GET"))
        .and(path_regex(r"/esummary\.fcgi.*"))
        .and(query_param("id", ids))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

/// Client pointed at the mock server, fast and without retries
pub fn create_mock_client(server: &MockServer) -> PubMedClient {
    let config = ClientConfig::new()
        .with_base_url(server.uri())
        .with_rate_limit(100.0)
        .with_retry_config(RetryConfig::disabled());

    PubMedClient::with_config(config)
}

pub fn create_mock_backend(server: &MockServer) -> RestBackend {
    RestBackend::new(BackendConfig::new(server.uri()).with_auth_token("test-token"))
        .expect("backend client should build")
        .with_retry_config(RetryConfig::disabled())
}

#[cfg(feature = "integration-tests")]
pub mod integration_test_utils {
    use pubmed_import_rs::{ClientConfig, PubMedClient};

    /// Real API tests also need `PUBMED_REAL_API_TESTS` set
    pub fn should_run_real_api_tests() -> bool {
        std::env::var("PUBMED_REAL_API_TESTS").is_ok()
    }

    pub fn create_test_pubmed_client() -> PubMedClient {
        let mut config = ClientConfig::new().with_tool("pubmed-import-rs-tests");
        if let Ok(api_key) = std::env::var("NCBI_API_KEY") {
            config = config.with_api_key(api_key);
        }
        if let Ok(email) = std::env::var("NCBI_EMAIL") {
            config = config.with_email(email);
        }
        PubMedClient::with_config(config)
    }
}
