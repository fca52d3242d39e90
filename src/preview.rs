//! Single and bulk import previews
//!
//! At most one preview is open at a time; opening another replaces it.

use tracing::{debug, warn};

use crate::notice::Notice;
use crate::publication::Publication;
use crate::summarize::{Summarizer, Summary};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SummaryState {
    /// Record has neither abstract nor title, so nothing was requested
    NotRequested,
    Pending,
    Ready(Summary),
    /// Summary failed; the bibliographic fields are still shown
    Unavailable(Notice),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SinglePreview {
    pub publication: Publication,
    pub summary: SummaryState,
    pub folder_id: Option<String>,
    /// Bulk listing this preview was promoted from
    pub origin: Option<BulkPreview>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BulkPreview {
    pub publications: Vec<Publication>,
    pub folder_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum Modal {
    #[default]
    None,
    Single(SinglePreview),
    Bulk(BulkPreview),
}

/// What to hand to the import orchestrator
#[derive(Debug, Clone, PartialEq)]
pub struct ImportRequest {
    pub publications: Vec<Publication>,
    pub folder_id: Option<String>,
}

#[derive(Debug, Default)]
pub struct PreviewManager {
    modal: Modal,
}

impl PreviewManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn modal(&self) -> &Modal {
        &self.modal
    }

    pub fn is_open(&self) -> bool {
        !matches!(self.modal, Modal::None)
    }

    /// Open the single preview without requesting a summary
    pub fn open_one(&mut self, publication: Publication) {
        self.open_single(publication, None, None);
    }

    fn open_single(
        &mut self,
        publication: Publication,
        folder_id: Option<String>,
        origin: Option<BulkPreview>,
    ) {
        let summary = if publication.has_abstract() || publication.has_title() {
            SummaryState::Pending
        } else {
            SummaryState::NotRequested
        };
        self.modal = Modal::Single(SinglePreview {
            publication,
            summary,
            folder_id,
            origin,
        });
    }

    /// Open the single preview and fetch its summary
    pub async fn preview_one<S: Summarizer + ?Sized>(&mut self, publication: Publication, summarizer: &S) {
        self.open_one(publication);
        self.resolve_summary(summarizer).await;
    }

    /// Fill a pending summary on the open single preview
    pub async fn resolve_summary<S: Summarizer + ?Sized>(&mut self, summarizer: &S) {
        let Modal::Single(preview) = &mut self.modal else {
            return;
        };
        if preview.summary != SummaryState::Pending {
            return;
        }

        preview.summary = match summarizer.summarize(&preview.publication).await {
            Ok(summary) => {
                debug!(publication_id = %preview.publication.id, "Summary ready");
                SummaryState::Ready(summary)
            }
            Err(e) => {
                warn!(publication_id = %preview.publication.id, error = %e, "Summary unavailable");
                SummaryState::Unavailable(Notice::warning(
                    "AI summary is unavailable for this publication.",
                ))
            }
        };
    }

    pub fn preview_many(&mut self, publications: Vec<Publication>) {
        self.modal = Modal::Bulk(BulkPreview {
            publications,
            folder_id: None,
        });
    }

    /// Turn entry `index` of the bulk listing into a single preview
    ///
    /// The folder binding carries over. Returns false when no bulk preview
    /// is open or the index is out of range.
    pub async fn promote<S: Summarizer + ?Sized>(&mut self, index: usize, summarizer: &S) -> bool {
        let Modal::Bulk(bulk) = &self.modal else {
            return false;
        };
        let Some(publication) = bulk.publications.get(index).cloned() else {
            return false;
        };

        let bulk = bulk.clone();
        self.open_single(publication, bulk.folder_id.clone(), Some(bulk));
        self.resolve_summary(summarizer).await;
        true
    }

    /// Return from a promoted single preview to its bulk listing
    pub fn back(&mut self) -> bool {
        let Modal::Single(single) = &mut self.modal else {
            return false;
        };
        let Some(mut bulk) = single.origin.take() else {
            return false;
        };
        bulk.folder_id = single.folder_id.clone();
        self.modal = Modal::Bulk(bulk);
        true
    }

    /// Choose (or clear) the destination folder of the open preview
    pub fn bind_folder(&mut self, folder_id: Option<String>) -> bool {
        match &mut self.modal {
            Modal::None => false,
            Modal::Single(single) => {
                single.folder_id = folder_id;
                true
            }
            Modal::Bulk(bulk) => {
                bulk.folder_id = folder_id;
                true
            }
        }
    }

    pub fn import_request(&self) -> Option<ImportRequest> {
        match &self.modal {
            Modal::None => None,
            Modal::Single(single) => Some(ImportRequest {
                publications: vec![single.publication.clone()],
                folder_id: single.folder_id.clone(),
            }),
            Modal::Bulk(bulk) if bulk.publications.is_empty() => None,
            Modal::Bulk(bulk) => Some(ImportRequest {
                publications: bulk.publications.clone(),
                folder_id: bulk.folder_id.clone(),
            }),
        }
    }

    pub fn close(&mut self) {
        self.modal = Modal::None;
    }
}
