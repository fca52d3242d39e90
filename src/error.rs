use std::result;

use crate::retry::RetryableError;
use thiserror::Error;

/// Error types for the publication import pipeline
#[derive(Error, Debug)]
pub enum ImportError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    /// JSON parsing failed
    #[error("JSON parsing failed: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Search was attempted without any query text
    #[error("Search query is empty")]
    EmptyQuery,

    /// The provider found nothing for the query. Informational, not fatal.
    #[error("No publications found for query: {query}")]
    NoResults { query: String },

    /// The bibliographic provider answered with a non-success status
    #[error("Bibliographic provider unavailable (HTTP {status}): {message}")]
    ProviderUnavailable { status: u16, message: String },

    /// Input routed to direct lookup is not a numeric PMID
    #[error("Invalid PMID format: {id}")]
    InvalidIdFormat { id: String },

    /// The provider has no record for the PMID
    #[error("Publication not found: PMID {id}")]
    NotFound { id: String },

    /// Search window beyond what esearch can page through
    #[error("Search limit exceeded: requested {requested}, maximum is {maximum}")]
    SearchLimitExceeded { requested: usize, maximum: usize },

    /// API rate limit exceeded
    #[error("API rate limit exceeded")]
    RateLimitExceeded,

    /// Persisting a publication failed
    #[error("Failed to persist publication \"{title}\": {message}")]
    PersistenceFailure { title: String, message: String },

    /// The publication was persisted but could not be filed into a folder
    #[error("Failed to file publication {publication_id} into folder {folder_id}: {message}")]
    LibraryFilingFailure {
        publication_id: String,
        folder_id: String,
        message: String,
    },

    /// Library or persistence collaborator rejected a request
    #[error("Backend error {status}: {message}")]
    BackendError { status: u16, message: String },

    /// The summarization collaborator failed
    #[error("Summary generation failed: {message}")]
    SummaryFailure { message: String },

    /// Folder name blank after trimming
    #[error("Folder name must not be empty")]
    EmptyName,

    /// Folder id unknown to the local tree
    #[error("Folder not found: {folder_id}")]
    FolderNotFound { folder_id: String },

    /// Move would make a folder its own ancestor
    #[error("Cannot move folder {folder_id} under {target_id}: target is the folder itself or one of its descendants")]
    FolderCycleViolation {
        folder_id: String,
        target_id: String,
    },

    /// Move that changes nothing
    #[error("Invalid folder move: {message}")]
    InvalidMove { message: String },

    /// Publication already present in the folder
    #[error("Publication {publication_id} is already filed in folder {folder_id}")]
    AlreadyFiled {
        publication_id: String,
        folder_id: String,
    },

    /// Publication absent from the folder
    #[error("Publication {publication_id} is not filed in folder {folder_id}")]
    NotFiled {
        publication_id: String,
        folder_id: String,
    },
}

pub type Result<T> = result::Result<T, ImportError>;

impl ImportError {
    /// `NoResults` is surfaced as a notice rather than an error banner
    pub fn is_informational(&self) -> bool {
        matches!(self, ImportError::NoResults { .. })
    }

    /// Message shown to the user for a failed search or lookup
    ///
    /// Errors are bucketed by cause: no results, service unavailable,
    /// network trouble, or a generic failure.
    pub fn user_message(&self) -> String {
        match self {
            ImportError::NoResults { .. } => {
                "No publications matched your search. Try broadening the criteria.".to_string()
            }
            ImportError::EmptyQuery => "Enter at least one search field.".to_string(),
            ImportError::InvalidIdFormat { id } => format!("\"{}\" is not a valid PMID.", id),
            ImportError::NotFound { id } => format!("No publication found for PMID {}.", id),
            ImportError::ProviderUnavailable { .. } | ImportError::RateLimitExceeded => {
                "PubMed is currently unavailable. Please try again later.".to_string()
            }
            ImportError::RequestError(_) => {
                "Network error while contacting PubMed. Check your connection and try again."
                    .to_string()
            }
            _ => "Search failed. Please try again.".to_string(),
        }
    }
}

impl RetryableError for ImportError {
    fn is_retryable(&self) -> bool {
        match self {
            ImportError::RequestError(err) => {
                if err.is_timeout() || err.is_connect() {
                    return true;
                }

                if let Some(status) = err.status() {
                    return status.is_server_error() || status.as_u16() == 429;
                }

                !err.is_builder() && !err.is_redirect() && !err.is_decode()
            }

            ImportError::RateLimitExceeded => true,

            ImportError::ProviderUnavailable { status, .. }
            | ImportError::BackendError { status, .. } => {
                (500..600).contains(status) || *status == 429
            }

            _ => false,
        }
    }

    fn retry_reason(&self) -> &str {
        if self.is_retryable() {
            match self {
                ImportError::RequestError(err) if err.is_timeout() => "Request timeout",
                ImportError::RequestError(err) if err.is_connect() => "Connection error",
                ImportError::RequestError(_) => "Network error",
                ImportError::RateLimitExceeded => "Rate limit exceeded",
                ImportError::ProviderUnavailable { status, .. }
                | ImportError::BackendError { status, .. } => match status {
                    429 => "Rate limit exceeded",
                    _ => "Server error",
                },
                _ => "Transient error",
            }
        } else {
            match self {
                ImportError::JsonError(_) => "Invalid JSON response",
                ImportError::InvalidIdFormat { .. } | ImportError::EmptyQuery => "Invalid input",
                ImportError::NotFound { .. } | ImportError::NoResults { .. } => {
                    "Nothing to fetch"
                }
                _ => "Non-transient error",
            }
        }
    }
}
