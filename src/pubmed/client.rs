use async_trait::async_trait;
use reqwest::{Client, Response};
use tracing::{debug, info, instrument, warn};

use crate::config::ClientConfig;
use crate::error::{ImportError, Result};
use crate::publication::Publication;
use crate::pubmed::normalize::normalize_summary;
use crate::pubmed::responses::{ESearchData, ESearchResult, ESummaryResponse};
use crate::pubmed::{BibliographicSource, MAX_RETRIEVABLE, SearchPage, is_numeric_id};
use crate::rate_limit::RateLimiter;
use crate::retry::with_retry;

/// Client for the PubMed E-utilities search and summary endpoints
#[derive(Clone)]
pub struct PubMedClient {
    client: Client,
    base_url: String,
    rate_limiter: RateLimiter,
    config: ClientConfig,
}

impl PubMedClient {
    /// Create a client with default configuration
    ///
    /// Uses the NCBI default rate limit (3 requests/second) and no API key.
    ///
    /// # Example
    ///
    /// ```
    /// use pubmed_import_rs::PubMedClient;
    ///
    /// let client = PubMedClient::new();
    /// ```
    pub fn new() -> Self {
        Self::with_config(ClientConfig::new())
    }

    /// Create a client with custom configuration
    ///
    /// # Example
    ///
    /// ```
    /// use pubmed_import_rs::{ClientConfig, PubMedClient};
    ///
    /// let config = ClientConfig::new()
    ///     .with_api_key("your_api_key_here")
    ///     .with_email("researcher@hospital.org");
    ///
    /// let client = PubMedClient::with_config(config);
    /// ```
    pub fn with_config(config: ClientConfig) -> Self {
        let client = Client::builder()
            .user_agent(config.effective_user_agent())
            .timeout(config.timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self::with_client(client, config)
    }

    /// Create a client around an existing reqwest client
    pub fn with_client(client: Client, config: ClientConfig) -> Self {
        Self {
            client,
            base_url: config.effective_base_url().to_string(),
            rate_limiter: config.create_rate_limiter(),
            config,
        }
    }

    /// Phase one: ranked PMIDs and the total count for `query`
    #[instrument(skip(self), fields(query = %query))]
    pub(crate) async fn search_ids(
        &self,
        query: &str,
        max_results: usize,
        start_index: usize,
    ) -> Result<ESearchData> {
        if max_results > MAX_RETRIEVABLE || start_index >= MAX_RETRIEVABLE {
            return Err(ImportError::SearchLimitExceeded {
                requested: start_index + max_results,
                maximum: MAX_RETRIEVABLE,
            });
        }

        let url = format!(
            "{}/esearch.fcgi?db=pubmed&term={}&retmode=json&retmax={}&retstart={}",
            self.base_url,
            urlencoding::encode(query),
            max_results,
            start_index
        );

        debug!("Making ESearch API request");
        let response = self.make_request(&url).await?;
        let text = response.text().await?;
        let result: ESearchResult = serde_json::from_str(&text)?;

        if let Some(error) = result.esearchresult.error {
            warn!(error = %error, "ESearch reported an error in a successful response");
            return Err(ImportError::ProviderUnavailable {
                status: 200,
                message: format!("NCBI ESearch API error: {}", error),
            });
        }

        info!(
            ids = result.esearchresult.idlist.len(),
            total = result.esearchresult.total_count(),
            "ESearch completed"
        );

        Ok(result.esearchresult)
    }

    /// Phase two: one batched esummary call for exactly `ids`, normalized
    ///
    /// Output follows the order of `ids`. Records the provider could not
    /// summarize are skipped with a warning.
    #[instrument(skip(self), fields(ids_count = ids.len()))]
    pub async fn fetch_summaries(&self, ids: &[String]) -> Result<Vec<Publication>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!(
            "{}/esummary.fcgi?db=pubmed&id={}&retmode=json",
            self.base_url,
            ids.join(",")
        );

        debug!("Making ESummary API request");
        let response = self.make_request(&url).await?;
        let text = response.text().await?;

        if text.trim().is_empty() {
            warn!("ESummary returned an empty body");
            return Ok(Vec::new());
        }

        let publications = Self::parse_esummary_response(&text, ids)?;
        info!(
            requested = ids.len(),
            parsed = publications.len(),
            "ESummary completed"
        );

        Ok(publications)
    }

    pub(crate) fn parse_esummary_response(json_text: &str, ids: &[String]) -> Result<Vec<Publication>> {
        let response: ESummaryResponse = serde_json::from_str(json_text)?;
        let result = &response.result;

        let mut publications = Vec::with_capacity(ids.len());
        for id in ids {
            let Some(doc) = result.get(id.as_str()) else {
                warn!(uid = %id, "UID missing from ESummary response");
                continue;
            };

            if let Some(error) = doc.get("error") {
                warn!(uid = %id, error = %error, "ESummary returned an error for UID");
                continue;
            }

            publications.push(normalize_summary(id, doc));
        }

        Ok(publications)
    }

    /// GET with rate limiting, API parameters and retry of transient failures
    ///
    /// Any non-success status becomes `ProviderUnavailable` carrying the
    /// status code and the response body (or the canonical reason when the
    /// body is empty).
    pub(crate) async fn make_request(&self, url: &str) -> Result<Response> {
        let mut final_url = url.to_string();
        for (key, value) in self.config.build_api_params() {
            let separator = if final_url.contains('?') { '&' } else { '?' };
            final_url.push(separator);
            final_url.push_str(&key);
            final_url.push('=');
            final_url.push_str(&urlencoding::encode(&value));
        }

        with_retry(
            || async {
                self.rate_limiter.acquire().await?;
                debug!(url = %final_url, "Sending provider request");
                let response = self
                    .client
                    .get(&final_url)
                    .send()
                    .await
                    .map_err(ImportError::from)?;

                let status = response.status();
                if status.is_success() {
                    return Ok(response);
                }

                let body = response.text().await.unwrap_or_default();
                let message = if body.trim().is_empty() {
                    status.canonical_reason().unwrap_or("Unknown error").to_string()
                } else {
                    body.trim().to_string()
                };
                warn!(status = status.as_u16(), "Provider request failed");

                Err(ImportError::ProviderUnavailable {
                    status: status.as_u16(),
                    message,
                })
            },
            &self.config.retry_config,
            "PubMed eUtils request",
        )
        .await
    }
}

impl Default for PubMedClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BibliographicSource for PubMedClient {
    #[instrument(skip(self))]
    async fn search(
        &self,
        query: &str,
        max_results: usize,
        start_index: usize,
    ) -> Result<SearchPage> {
        if query.trim().is_empty() {
            return Err(ImportError::EmptyQuery);
        }

        let data = self.search_ids(query, max_results, start_index).await?;

        if data.idlist.is_empty() {
            info!("Search returned no ids");
            return Err(ImportError::NoResults {
                query: query.to_string(),
            });
        }

        let publications = self.fetch_summaries(&data.idlist).await?;

        // A malformed count must not break results.len() <= total_count
        let total_count = data
            .total_count()
            .max(start_index + data.idlist.len());

        Ok(SearchPage {
            publications,
            total_count,
            ids_returned: data.idlist.len(),
            query_translation: data.querytranslation,
        })
    }

    #[instrument(skip(self), fields(id = %id))]
    async fn fetch_by_id(&self, id: &str) -> Result<Publication> {
        if !is_numeric_id(id) {
            warn!("Invalid PMID format provided");
            return Err(ImportError::InvalidIdFormat { id: id.to_string() });
        }

        let pmid = id.trim().to_string();
        let mut publications = self.fetch_summaries(std::slice::from_ref(&pmid)).await?;

        match publications.pop() {
            Some(publication) => Ok(publication),
            None => Err(ImportError::NotFound { id: pmid }),
        }
    }
}
