//! Import orchestrator
//!
//! Persists normalized publications one at a time and files each into the
//! chosen library folder. A failed item never aborts the batch, and a
//! filing failure after a successful persist is reported as a partial
//! success rather than rolled back.

use std::collections::HashSet;
use std::pin::pin;
use std::sync::Mutex;

use futures_util::{Stream, StreamExt, stream};
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::backend::{LibraryStore, PublicationStore};
use crate::error::{ImportError, Result};
use crate::notice::Notice;
use crate::publication::{PersistedPublication, Publication};

/// What happened to the library filing step of one import
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum FilingStatus {
    NotRequested,
    Filed { folder_id: String },
    Failed { folder_id: String, message: String },
}

impl FilingStatus {
    pub fn is_failed(&self) -> bool {
        matches!(self, FilingStatus::Failed { .. })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImportOutcome {
    pub persisted: PersistedPublication,
    pub filing: FilingStatus,
    /// The same PMID was already imported by this orchestrator
    pub duplicate_of_earlier: bool,
}

/// Result for one item of a batch, in input order
#[derive(Debug)]
pub struct ItemOutcome {
    pub index: usize,
    pub title: String,
    pub result: Result<ImportOutcome>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportFailure {
    pub index: usize,
    pub title: String,
    pub message: String,
}

/// Aggregate of a batch import
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    pub success_count: usize,
    pub fail_count: usize,
    pub filed_count: usize,
    pub filing_failed_count: usize,
    pub duplicate_count: usize,
    pub failures: Vec<ImportFailure>,
    pub filing_failures: Vec<ImportFailure>,
}

impl ImportSummary {
    pub fn total(&self) -> usize {
        self.success_count + self.fail_count
    }

    pub fn record(&mut self, item: ItemOutcome) {
        match item.result {
            Ok(outcome) => {
                self.success_count += 1;
                if outcome.duplicate_of_earlier {
                    self.duplicate_count += 1;
                }
                match outcome.filing {
                    FilingStatus::NotRequested => {}
                    FilingStatus::Filed { .. } => self.filed_count += 1,
                    FilingStatus::Failed { message, .. } => {
                        self.filing_failed_count += 1;
                        self.filing_failures.push(ImportFailure {
                            index: item.index,
                            title: item.title,
                            message,
                        });
                    }
                }
            }
            Err(e) => {
                self.fail_count += 1;
                self.failures.push(ImportFailure {
                    index: item.index,
                    title: item.title,
                    message: e.to_string(),
                });
            }
        }
    }

    /// One-line outcome for the user
    ///
    /// Plain failures read "N imported / M failed"; a batch where every
    /// persist worked but some filings did not says so explicitly.
    pub fn message(&self) -> String {
        let plural = |n: usize| if n == 1 { "publication" } else { "publications" };

        let mut message = if self.fail_count == 0 {
            format!("Imported {} {}", self.success_count, plural(self.success_count))
        } else {
            format!("{} imported / {} failed", self.success_count, self.fail_count)
        };

        if self.filing_failed_count > 0 {
            message.push_str(&format!(
                "; imported but library filing failed for {} {}",
                self.filing_failed_count,
                plural(self.filing_failed_count)
            ));
        } else if self.filed_count > 0 && self.fail_count == 0 {
            message.push_str(" into the selected folder");
        }
        message
    }

    pub fn notice(&self) -> Notice {
        if self.success_count == 0 && self.fail_count > 0 {
            Notice::error(self.message())
        } else if self.fail_count > 0 || self.filing_failed_count > 0 {
            Notice::warning(self.message())
        } else {
            Notice::success(self.message())
        }
    }
}

/// Sequential persist-then-file pipeline
pub struct ImportOrchestrator<P, L> {
    publications: P,
    library: L,
    imported_pmids: Mutex<HashSet<String>>,
}

impl<P: PublicationStore, L: LibraryStore> ImportOrchestrator<P, L> {
    pub fn new(publications: P, library: L) -> Self {
        Self {
            publications,
            library,
            imported_pmids: Mutex::new(HashSet::new()),
        }
    }

    /// Persist one publication and optionally file it
    ///
    /// # Errors
    ///
    /// * `ImportError::PersistenceFailure` - the store rejected the record.
    ///   Filing problems are reported in [`ImportOutcome::filing`] instead.
    #[instrument(skip(self, publication), fields(pmid = %publication.pubmed_id))]
    pub async fn import_one(
        &self,
        publication: &Publication,
        folder_id: Option<&str>,
    ) -> Result<ImportOutcome> {
        let persisted = self
            .publications
            .persist(publication)
            .await
            .map_err(|e| ImportError::PersistenceFailure {
                title: publication.title.clone(),
                message: e.to_string(),
            })?;

        let duplicate_of_earlier = self.remember(&publication.pubmed_id);
        if duplicate_of_earlier {
            warn!("Publication was already imported in this session; persisted again");
        }

        let filing = match folder_id {
            None => FilingStatus::NotRequested,
            Some(folder_id) => match self.library.add_publication(folder_id, &persisted.id).await {
                Ok(()) => FilingStatus::Filed {
                    folder_id: folder_id.to_string(),
                },
                Err(e) => {
                    warn!(folder_id, error = %e, "Persisted publication could not be filed");
                    FilingStatus::Failed {
                        folder_id: folder_id.to_string(),
                        message: e.to_string(),
                    }
                }
            },
        };

        Ok(ImportOutcome {
            persisted,
            filing,
            duplicate_of_earlier,
        })
    }

    /// Returns true when `pmid` was seen before
    fn remember(&self, pmid: &str) -> bool {
        if pmid.is_empty() {
            return false;
        }
        let mut seen = self
            .imported_pmids
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        !seen.insert(pmid.to_string())
    }

    /// Import `publications` strictly one after another, yielding each outcome
    pub fn import_stream<'a>(
        &'a self,
        publications: &'a [Publication],
        folder_id: Option<&'a str>,
    ) -> impl Stream<Item = ItemOutcome> + 'a {
        stream::iter(publications.iter().enumerate()).then(move |(index, publication)| async move {
            ItemOutcome {
                index,
                title: publication.title.clone(),
                result: self.import_one(publication, folder_id).await,
            }
        })
    }

    /// Import a batch and tally the outcomes
    #[instrument(skip(self, publications), fields(count = publications.len()))]
    pub async fn import_many(
        &self,
        publications: &[Publication],
        folder_id: Option<&str>,
    ) -> ImportSummary {
        let mut summary = ImportSummary::default();
        let mut outcomes = pin!(self.import_stream(publications, folder_id));

        while let Some(item) = outcomes.next().await {
            if let Err(e) = &item.result {
                warn!(index = item.index, error = %e, "Import failed");
            }
            summary.record(item);
        }

        info!(
            success = summary.success_count,
            failed = summary.fail_count,
            filing_failed = summary.filing_failed_count,
            "Batch import finished"
        );
        summary
    }

    /// Retry the filing step for an already persisted publication
    #[instrument(skip(self))]
    pub async fn retry_filing(&self, publication_id: &str, folder_id: &str) -> Result<()> {
        self.library
            .add_publication(folder_id, publication_id)
            .await
            .map_err(|e| ImportError::LibraryFilingFailure {
                publication_id: publication_id.to_string(),
                folder_id: folder_id.to_string(),
                message: e.to_string(),
            })
    }
}
