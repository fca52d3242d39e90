//! # PubMed Import
//!
//! Publication import pipeline for a hospital research information system.
//! Researchers search PubMed, pick records, preview them (optionally with an
//! AI summary), persist them as canonical publications and file them into
//! their library folder hierarchy.
//!
//! ## Features
//!
//! - **PubMed adapter**: esearch/esummary exchange with normalization into a
//!   canonical [`Publication`], rate limiting and retry of transient failures
//! - **Search sessions**: pagination with single-flight "load more"
//! - **Selection and preview**: filtered, paged selection and single/bulk previews
//! - **Import orchestration**: sequential batches with partial-failure reporting
//! - **Library folders**: create, rename, move and delete with cycle prevention
//!
//! ## Quick Start
//!
//! ```no_run
//! use pubmed_import_rs::{ImportClient, ClientConfig, BackendConfig, SearchCriteria};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = ImportClient::new(
//!         ClientConfig::new().with_email("researcher@hospital.org"),
//!         BackendConfig::new("https://ris.example.org/api").with_auth_token("token"),
//!     )?;
//!
//!     let session = client.session();
//!     session
//!         .start_search(&SearchCriteria::new().title("diabetes"))
//!         .await;
//!
//!     let summary = client
//!         .orchestrator()
//!         .import_many(&session.results(), None)
//!         .await;
//!     println!("{}", summary.message());
//!
//!     Ok(())
//! }
//! ```

pub mod backend;
pub mod config;
pub mod error;
pub mod import;
pub mod library;
pub mod notice;
pub mod preview;
pub mod publication;
pub mod pubmed;
pub mod rate_limit;
pub mod retry;
pub mod selection;
pub mod session;
pub mod summarize;

use std::sync::Arc;

// Re-export main types for convenience
pub use backend::{LibraryStore, PublicationStore, RestBackend};
pub use config::{BackendConfig, ClientConfig};
pub use error::{ImportError, Result};
pub use import::{FilingStatus, ImportOrchestrator, ImportOutcome, ImportSummary, ItemOutcome};
pub use library::{FolderTree, LibraryFolder, LibraryManager};
pub use notice::{Notice, NoticeLevel};
pub use preview::{Modal, PreviewManager, SummaryState};
pub use publication::{PersistedPublication, Publication, PublicationYear};
pub use pubmed::{BibliographicSource, InputKind, PubMedClient, SearchCriteria, SearchPage, classify_input};
pub use rate_limit::RateLimiter;
pub use retry::RetryConfig;
pub use selection::{ResultView, SelectionSet};
pub use session::{LoadMoreOutcome, SearchOutcome, SearchSession, SessionState};
pub use summarize::{Summarizer, SummaryClient};

/// Convenience client wiring the PubMed adapter to the RIS backend
#[derive(Clone)]
pub struct ImportClient {
    /// Bibliographic source
    pub pubmed: PubMedClient,
    /// Persistence and library collaborator
    pub backend: Arc<RestBackend>,
    backend_config: BackendConfig,
}

impl ImportClient {
    /// Create a client from provider and backend settings
    ///
    /// # Example
    ///
    /// ```
    /// use pubmed_import_rs::{BackendConfig, ClientConfig, ImportClient};
    ///
    /// let client = ImportClient::new(ClientConfig::new(), BackendConfig::default()).unwrap();
    /// ```
    pub fn new(client_config: ClientConfig, backend_config: BackendConfig) -> Result<Self> {
        Ok(Self {
            pubmed: PubMedClient::with_config(client_config),
            backend: Arc::new(RestBackend::new(backend_config.clone())?),
            backend_config,
        })
    }

    /// A fresh search session over PubMed
    pub fn session(&self) -> SearchSession<PubMedClient> {
        SearchSession::new(self.pubmed.clone())
    }

    pub fn orchestrator(&self) -> ImportOrchestrator<Arc<RestBackend>, Arc<RestBackend>> {
        ImportOrchestrator::new(Arc::clone(&self.backend), Arc::clone(&self.backend))
    }

    /// Library manager with an empty tree; call `load` before use
    pub fn library(&self) -> LibraryManager<RestBackend> {
        LibraryManager::new(Arc::clone(&self.backend))
    }

    pub fn summarizer(&self) -> SummaryClient {
        SummaryClient::new(self.backend_config.clone())
    }
}
