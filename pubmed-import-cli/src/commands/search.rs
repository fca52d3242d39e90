use std::path::PathBuf;

use anyhow::{Result, bail};
use clap::Args;
use pubmed_import_rs::session::DEFAULT_PAGE_SIZE;
use pubmed_import_rs::{LoadMoreOutcome, Publication, SearchOutcome, SearchSession};
use serde::Serialize;
use tracing::info;

use super::{CriteriaArgs, GlobalConfig, create_pubmed_client, output_results, report_notices};

#[derive(Args, Debug)]
pub struct Search {
    #[command(flatten)]
    criteria: CriteriaArgs,

    /// Records per page
    #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
    page_size: usize,

    /// Number of pages to fetch ("load more" after the first)
    #[arg(long, default_value_t = 1)]
    pages: usize,

    /// Print only PMIDs, one per line
    #[arg(long)]
    ids_only: bool,

    /// Write the JSON output to a file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Serialize)]
struct SearchReport<'a> {
    query: String,
    total_count: usize,
    loaded: usize,
    results: &'a [Publication],
}

impl Search {
    pub async fn execute(&self, config: &GlobalConfig) -> Result<()> {
        let criteria = self.criteria.to_criteria();
        if criteria.is_empty() {
            bail!("Provide at least one of --keywords, --title, --author, --journal or --year");
        }

        let session = SearchSession::with_page_size(create_pubmed_client(config), self.page_size);
        let outcome = session.start_search(&criteria).await;
        report_notices(session.take_notices());

        match outcome {
            SearchOutcome::Results { .. } => {}
            SearchOutcome::NoResults => return Ok(()),
            SearchOutcome::Failed { message } => bail!(message),
            SearchOutcome::Superseded => return Ok(()),
        }

        for _ in 1..self.pages {
            match session.load_more().await {
                LoadMoreOutcome::Appended { added, loaded } => {
                    info!(added, loaded, "Loaded more results");
                }
                LoadMoreOutcome::Exhausted => break,
                LoadMoreOutcome::Failed { .. } => {
                    report_notices(session.take_notices());
                    break;
                }
                LoadMoreOutcome::Ignored | LoadMoreOutcome::Superseded => break,
            }
        }

        let results = session.results();
        let output = if self.ids_only {
            results
                .iter()
                .map(|p| p.pubmed_id.as_str())
                .collect::<Vec<_>>()
                .join("\n")
        } else {
            serde_json::to_string_pretty(&SearchReport {
                query: session.query(),
                total_count: session.total_count(),
                loaded: results.len(),
                results: &results,
            })?
        };

        output_results(&output, self.output.as_deref())
    }
}
