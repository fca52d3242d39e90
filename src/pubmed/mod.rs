//! Bibliographic source adapter for PubMed E-utilities
//!
//! Searching is a two-phase exchange: `esearch` returns ranked PMIDs and the
//! total hit count, then a single batched `esummary` call returns the raw
//! records, which are normalized into canonical [`Publication`]s.

pub mod client;
pub mod normalize;
pub mod query;
pub(crate) mod responses;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::publication::Publication;

pub use client::PubMedClient;
pub use normalize::{extract_doi, extract_year, normalize_summary, synthetic_id};
pub use query::SearchCriteria;

/// esearch cannot page past the first 9,999 hits
pub const MAX_RETRIEVABLE: usize = 9999;

/// One page of normalized search results
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchPage {
    pub publications: Vec<Publication>,
    /// Total hits reported by the provider for the query
    pub total_count: usize,
    /// Ids the provider returned for this page. Can exceed
    /// `publications.len()` when records had to be skipped.
    pub ids_returned: usize,
    /// How the provider interpreted the query, when reported
    pub query_translation: Option<String>,
}

impl SearchPage {
    /// Records listed by esearch but missing from esummary
    pub fn skipped(&self) -> usize {
        self.ids_returned.saturating_sub(self.publications.len())
    }
}

/// A provider of bibliographic records
#[async_trait]
pub trait BibliographicSource: Send + Sync {
    /// Search `query` and return `max_results` records starting at `start_index`
    ///
    /// # Errors
    ///
    /// * `ImportError::EmptyQuery` - blank query
    /// * `ImportError::NoResults` - the provider found nothing
    /// * `ImportError::ProviderUnavailable` - non-success HTTP status
    async fn search(&self, query: &str, max_results: usize, start_index: usize)
    -> Result<SearchPage>;

    /// Fetch a single record by provider id
    ///
    /// # Errors
    ///
    /// * `ImportError::InvalidIdFormat` - id is not numeric
    /// * `ImportError::NotFound` - no record for the id
    async fn fetch_by_id(&self, id: &str) -> Result<Publication>;
}

/// How a single input box should be routed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    /// Direct lookup by PMID
    Id,
    /// Free-text search
    Query,
}

/// Numeric input is a PMID, anything else a search
///
/// # Example
///
/// ```
/// use pubmed_import_rs::pubmed::{classify_input, InputKind};
///
/// assert_eq!(classify_input(" 31978945 "), InputKind::Id);
/// assert_eq!(classify_input("covid-19"), InputKind::Query);
/// ```
pub fn classify_input(input: &str) -> InputKind {
    if is_numeric_id(input) {
        InputKind::Id
    } else {
        InputKind::Query
    }
}

pub(crate) fn is_numeric_id(input: &str) -> bool {
    let trimmed = input.trim();
    !trimmed.is_empty() && trimmed.chars().all(|c| c.is_ascii_digit())
}
