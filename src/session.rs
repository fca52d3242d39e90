//! Search session controller
//!
//! Owns the lifecycle of one import dialog: the query, the accumulated
//! results, pagination, the selection and the notices produced along the
//! way. All methods take `&self` so a session can be shared between a
//! rendering loop and the tasks driving it.
//!
//! ```text
//! Idle --start_search--> Searching --ok--> HasResults --load_more--> LoadingMore
//!                            |                 ^                          |
//!                            +--err--> Error   +--------------------------+
//! ```

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

use tracing::{debug, info, instrument, warn};

use crate::error::ImportError;
use crate::notice::Notice;
use crate::publication::Publication;
use crate::pubmed::{
    BibliographicSource, InputKind, MAX_RETRIEVABLE, SearchCriteria, SearchPage, classify_input,
};
use crate::selection::{ResultView, SelectionSet};

/// Records requested per provider round trip
pub const DEFAULT_PAGE_SIZE: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Searching,
    HasResults,
    LoadingMore,
    /// Last search failed; carries the user-facing message
    Error(String),
}

/// Result of [`SearchSession::start_search`] and [`SearchSession::lookup`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    Results { fetched: usize, total_count: usize },
    NoResults,
    Failed { message: String },
    /// The session was closed or restarted while the request was in flight
    Superseded,
}

/// Result of [`SearchSession::load_more`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadMoreOutcome {
    Appended { added: usize, loaded: usize },
    /// Everything the provider reported has been loaded
    Exhausted,
    /// Another load is in flight, or there are no results to extend
    Ignored,
    Failed { message: String },
    Superseded,
}

#[derive(Debug)]
struct SessionData {
    state: SessionState,
    query: String,
    results: Vec<Publication>,
    total_count: usize,
    /// Provider offset of the next page. Runs ahead of `results.len()`
    /// when records were skipped during normalization.
    cursor: usize,
    skipped: usize,
    results_open: bool,
    selection: SelectionSet,
    notices: Vec<Notice>,
}

impl SessionData {
    fn new() -> Self {
        Self {
            state: SessionState::Idle,
            query: String::new(),
            results: Vec::new(),
            total_count: 0,
            cursor: 0,
            skipped: 0,
            results_open: false,
            selection: SelectionSet::new(),
            notices: Vec::new(),
        }
    }

    fn reset_results(&mut self) {
        self.results.clear();
        self.total_count = 0;
        self.cursor = 0;
        self.skipped = 0;
        self.results_open = false;
        self.selection.reset();
    }

    /// More records exist and the provider can still page to them
    fn has_more(&self) -> bool {
        self.results.len() < self.total_count && self.cursor < MAX_RETRIEVABLE
    }
}

/// Clears the in-flight flag even if the load future is dropped
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Search session over a [`BibliographicSource`]
pub struct SearchSession<S> {
    source: S,
    page_size: usize,
    data: Mutex<SessionData>,
    loading: AtomicBool,
    generation: AtomicU64,
}

impl<S: BibliographicSource> SearchSession<S> {
    pub fn new(source: S) -> Self {
        Self::with_page_size(source, DEFAULT_PAGE_SIZE)
    }

    pub fn with_page_size(source: S, page_size: usize) -> Self {
        Self {
            source,
            page_size: page_size.max(1),
            data: Mutex::new(SessionData::new()),
            loading: AtomicBool::new(false),
            generation: AtomicU64::new(0),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SessionData> {
        // State stays consistent across a poisoned lock: every mutation is
        // a plain field assignment.
        self.data.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Begin a new search; previous results and selection are discarded
    #[instrument(skip(self, criteria))]
    pub async fn start_search(&self, criteria: &SearchCriteria) -> SearchOutcome {
        let query = criteria.build_query();
        if query.is_empty() {
            let error = ImportError::EmptyQuery;
            let mut data = self.lock();
            data.reset_results();
            return Self::record_failure(&mut data, &error);
        }

        self.run_search(query).await
    }

    /// Route a single input box: numeric input is fetched by id, anything
    /// else is searched as keywords
    #[instrument(skip(self))]
    pub async fn lookup(&self, input: &str) -> SearchOutcome {
        match classify_input(input) {
            InputKind::Query => {
                self.start_search(&SearchCriteria::new().keywords(input.trim()))
                    .await
            }
            InputKind::Id => {
                let generation = self.begin(input.trim().to_string());
                let result = self.source.fetch_by_id(input.trim()).await;

                let mut data = self.lock();
                if self.is_stale(generation) {
                    debug!("Discarding lookup response for a superseded session");
                    return SearchOutcome::Superseded;
                }

                match result {
                    Ok(publication) => {
                        data.results = vec![publication];
                        data.total_count = 1;
                        data.cursor = 1;
                        data.results_open = true;
                        data.state = SessionState::HasResults;
                        data.notices.push(Notice::success("Found 1 publication"));
                        SearchOutcome::Results {
                            fetched: 1,
                            total_count: 1,
                        }
                    }
                    Err(e) => Self::record_failure(&mut data, &e),
                }
            }
        }
    }

    async fn run_search(&self, query: String) -> SearchOutcome {
        let generation = self.begin(query.clone());
        let result = self.source.search(&query, self.page_size, 0).await;

        let mut data = self.lock();
        if self.is_stale(generation) {
            debug!("Discarding search response for a superseded session");
            return SearchOutcome::Superseded;
        }

        match result {
            Ok(page) => {
                let fetched = page.publications.len();
                Self::apply_first_page(&mut data, page);
                let total = data.total_count;
                info!(fetched, total, "Search completed");
                data.notices.push(Notice::success(format!(
                    "Found {} publication{}",
                    total,
                    if total == 1 { "" } else { "s" }
                )));
                SearchOutcome::Results {
                    fetched,
                    total_count: total,
                }
            }
            Err(e) => Self::record_failure(&mut data, &e),
        }
    }

    /// Reset for a new request and return its generation
    fn begin(&self, query: String) -> u64 {
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        let mut data = self.lock();
        data.reset_results();
        data.query = query;
        data.state = SessionState::Searching;
        generation
    }

    fn is_stale(&self, generation: u64) -> bool {
        self.generation.load(Ordering::Acquire) != generation
    }

    fn apply_first_page(data: &mut SessionData, page: SearchPage) {
        data.skipped = page.skipped();
        data.cursor = page.ids_returned;
        data.results = page.publications;
        data.total_count = page
            .total_count
            .saturating_sub(data.skipped)
            .max(data.results.len());
        data.results_open = true;
        data.state = SessionState::HasResults;
    }

    fn record_failure(data: &mut SessionData, error: &ImportError) -> SearchOutcome {
        let message = error.user_message();
        if error.is_informational() {
            info!("Search returned no results");
            data.state = SessionState::Idle;
            data.notices.push(Notice::info(message));
            SearchOutcome::NoResults
        } else {
            warn!(error = %error, "Search failed");
            data.state = SessionState::Error(message.clone());
            data.notices.push(Notice::error(message.clone()));
            SearchOutcome::Failed { message }
        }
    }

    /// Fetch the next page and append it
    ///
    /// Single-flight: while a load is running, further calls return
    /// [`LoadMoreOutcome::Ignored`] without touching the provider.
    #[instrument(skip(self))]
    pub async fn load_more(&self) -> LoadMoreOutcome {
        if self
            .loading
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("load_more ignored: another load is in flight");
            return LoadMoreOutcome::Ignored;
        }
        let _in_flight = InFlight(&self.loading);

        let (query, cursor, generation) = {
            let mut data = self.lock();
            if data.state != SessionState::HasResults {
                return LoadMoreOutcome::Ignored;
            }
            if !data.has_more() {
                return LoadMoreOutcome::Exhausted;
            }
            data.state = SessionState::LoadingMore;
            (
                data.query.clone(),
                data.cursor,
                self.generation.load(Ordering::Acquire),
            )
        };

        let result = self.source.search(&query, self.page_size, cursor).await;

        let mut data = self.lock();
        if self.is_stale(generation) {
            debug!("Discarding load_more response for a superseded session");
            return LoadMoreOutcome::Superseded;
        }
        data.state = SessionState::HasResults;

        match result {
            Ok(page) => {
                let added = page.publications.len();
                data.skipped += page.skipped();
                data.cursor += page.ids_returned;
                data.results.extend(page.publications);
                data.total_count = page
                    .total_count
                    .saturating_sub(data.skipped)
                    .max(data.results.len());
                info!(added, loaded = data.results.len(), "Loaded more results");
                LoadMoreOutcome::Appended {
                    added,
                    loaded: data.results.len(),
                }
            }
            Err(ImportError::NoResults { .. }) => {
                data.total_count = data.results.len();
                LoadMoreOutcome::Exhausted
            }
            Err(ImportError::SearchLimitExceeded { maximum, .. }) => {
                info!(maximum, "Provider paging window reached");
                data.cursor = data.cursor.max(MAX_RETRIEVABLE);
                LoadMoreOutcome::Exhausted
            }
            Err(e) => {
                warn!(error = %e, "Loading more results failed");
                let message = e.user_message();
                data.notices.push(Notice::error(message.clone()));
                LoadMoreOutcome::Failed { message }
            }
        }
    }

    /// Close the dialog; responses still in flight will be discarded
    pub fn close(&self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
        let mut data = self.lock();
        data.reset_results();
        data.query.clear();
        data.state = SessionState::Idle;
    }

    pub fn state(&self) -> SessionState {
        self.lock().state.clone()
    }

    pub fn query(&self) -> String {
        self.lock().query.clone()
    }

    pub fn results(&self) -> Vec<Publication> {
        self.lock().results.clone()
    }

    pub fn total_count(&self) -> usize {
        self.lock().total_count
    }

    /// Number of records loaded so far
    pub fn offset(&self) -> usize {
        self.lock().results.len()
    }

    pub fn can_load_more(&self) -> bool {
        let data = self.lock();
        data.state == SessionState::HasResults && data.has_more()
    }

    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::Acquire)
    }

    pub fn results_open(&self) -> bool {
        self.lock().results_open
    }

    /// Drain pending notices
    pub fn take_notices(&self) -> Vec<Notice> {
        std::mem::take(&mut self.lock().notices)
    }

    /// Records on screen for `view`
    pub fn visible(&self, view: &ResultView) -> Vec<Publication> {
        let data = self.lock();
        view.visible(&data.results).into_iter().cloned().collect()
    }

    /// Toggle one visible record; returns whether it is now selected
    pub fn toggle_selection(&self, id: &str, view: &ResultView) -> bool {
        let mut data = self.lock();
        let data = &mut *data;
        let visible = view.visible(&data.results);
        data.selection.toggle(id, &visible)
    }

    pub fn select_all(&self, view: &ResultView) {
        let mut data = self.lock();
        let data = &mut *data;
        let visible = view.visible(&data.results);
        data.selection.select_all(&visible);
    }

    pub fn clear_selection(&self, view: &ResultView) {
        let mut data = self.lock();
        let data = &mut *data;
        let visible = view.visible(&data.results);
        data.selection.clear(&visible);
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.lock().selection.contains(id)
    }

    pub fn selection_len(&self) -> usize {
        self.lock().selection.len()
    }

    /// Selected records in result order
    pub fn selected(&self) -> Vec<Publication> {
        let data = self.lock();
        data.selection
            .selected_in(&data.results)
            .into_iter()
            .cloned()
            .collect()
    }
}
