//! AI summary collaborator used by the single-record preview

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::backend::check_envelope;
use crate::config::BackendConfig;
use crate::error::{ImportError, Result};
use crate::publication::Publication;

/// Generated summary for one publication
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub summary: String,
    #[serde(default)]
    pub keywords: Vec<String>,
}

/// Something that can summarize a publication
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, publication: &Publication) -> Result<Summary>;
}

#[derive(Serialize)]
struct SummaryRequest<'a> {
    publications: Vec<SummaryInput<'a>>,
}

#[derive(Serialize)]
struct SummaryInput<'a> {
    id: &'a str,
    title: &'a str,
    #[serde(rename = "abstract")]
    abstract_text: &'a str,
}

#[derive(Debug, Deserialize)]
struct SummaryResponse {
    #[serde(default)]
    results: Vec<SummaryResult>,
}

#[derive(Debug, Deserialize)]
struct SummaryResult {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    keywords: Vec<String>,
    #[serde(default)]
    error: Option<String>,
}

/// HTTP client for `POST /ai/summarize`
#[derive(Clone)]
pub struct SummaryClient {
    client: Client,
    config: BackendConfig,
}

impl SummaryClient {
    pub fn new(config: BackendConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    pub fn with_client(client: Client, config: BackendConfig) -> Self {
        Self { client, config }
    }
}

#[async_trait]
impl Summarizer for SummaryClient {
    #[instrument(skip(self, publication), fields(publication_id = %publication.id))]
    async fn summarize(&self, publication: &Publication) -> Result<Summary> {
        let body = SummaryRequest {
            publications: vec![SummaryInput {
                id: &publication.id,
                title: &publication.title,
                abstract_text: &publication.abstract_text,
            }],
        };

        let mut request = self
            .client
            .post(self.config.url("/ai/summarize"))
            .timeout(self.config.summary_timeout)
            .json(&body);
        if let Some(token) = &self.config.auth_token {
            request = request.bearer_auth(token);
        }

        debug!("Requesting AI summary");
        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        let value = check_envelope(status, &text).map_err(|e| ImportError::SummaryFailure {
            message: e.to_string(),
        })?;
        let parsed: SummaryResponse = serde_json::from_value(value)?;

        let Some(result) = parsed.results.into_iter().next() else {
            warn!("Summary response carried no results");
            return Err(ImportError::SummaryFailure {
                message: "empty summary response".to_string(),
            });
        };

        match result.summary {
            Some(summary) if result.success && !summary.trim().is_empty() => Ok(Summary {
                summary,
                keywords: result.keywords,
            }),
            _ => Err(ImportError::SummaryFailure {
                message: result
                    .error
                    .unwrap_or_else(|| "summary not generated".to_string()),
            }),
        }
    }
}
