use anyhow::{Result, bail};
use clap::Args;
use pubmed_import_rs::{
    BibliographicSource, ImportClient, Modal, PreviewManager, Publication, ResultView, SearchOutcome,
    SummaryState,
};
use tracing::{info, warn};

use super::{CriteriaArgs, GlobalConfig, create_import_client, report_notices};

#[derive(Args, Debug)]
pub struct Import {
    #[command(flatten)]
    criteria: CriteriaArgs,

    /// PMIDs to import; filters the search results when criteria are given
    #[arg(long = "pmid", value_delimiter = ',')]
    pmids: Vec<String>,

    /// Import every record on the first page of results
    #[arg(long, conflicts_with = "pmids")]
    all: bool,

    /// Library folder to file the imported records into
    #[arg(long)]
    folder: Option<String>,

    /// Show the preview (with AI summary for a single record) before importing
    #[arg(long)]
    preview: bool,

    /// Stop after the preview without importing
    #[arg(long, requires = "preview")]
    dry_run: bool,

    /// Print the full import summary as JSON
    #[arg(long)]
    json: bool,
}

impl Import {
    pub async fn execute(&self, config: &GlobalConfig) -> Result<()> {
        let client = create_import_client(config)?;
        let selected = self.select(&client).await?;

        if selected.is_empty() {
            bail!("No publications selected for import");
        }

        if let Some(folder) = &self.folder {
            let mut library = client.library();
            library.load().await?;
            if !library.tree().contains(folder) {
                bail!("Folder {} does not exist in the library", folder);
            }
        }

        let mut preview = PreviewManager::new();
        if self.preview && selected.len() == 1 {
            preview
                .preview_one(selected[0].clone(), &client.summarizer())
                .await;
        } else {
            preview.preview_many(selected);
        }
        preview.bind_folder(self.folder.clone());

        if self.preview {
            print_preview(preview.modal());
        }
        if self.dry_run {
            return Ok(());
        }

        let Some(request) = preview.import_request() else {
            bail!("Nothing to import");
        };
        preview.close();

        let summary = client
            .orchestrator()
            .import_many(&request.publications, request.folder_id.as_deref())
            .await;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        report_notices(vec![summary.notice()]);
        for failure in &summary.failures {
            warn!(index = failure.index, title = %failure.title, "{}", failure.message);
        }

        if summary.success_count == 0 {
            bail!(summary.message());
        }
        Ok(())
    }

    async fn select(&self, client: &ImportClient) -> Result<Vec<Publication>> {
        let criteria = self.criteria.to_criteria();

        if criteria.is_empty() {
            if self.pmids.is_empty() {
                bail!("Provide search criteria or at least one --pmid");
            }
            let mut records = Vec::with_capacity(self.pmids.len());
            for pmid in &self.pmids {
                records.push(client.pubmed.fetch_by_id(pmid.trim()).await?);
            }
            return Ok(records);
        }

        let session = client.session();
        let outcome = session.start_search(&criteria).await;
        report_notices(session.take_notices());
        match outcome {
            SearchOutcome::Results { fetched, total_count } => {
                info!(fetched, total_count, "Search finished");
            }
            SearchOutcome::Failed { message } => bail!(message),
            SearchOutcome::NoResults | SearchOutcome::Superseded => return Ok(Vec::new()),
        }

        let view = ResultView::new(session.results().len().max(1));
        if self.all {
            session.select_all(&view);
        } else {
            for pmid in &self.pmids {
                let id = session
                    .visible(&view)
                    .into_iter()
                    .find(|p| p.pubmed_id == *pmid)
                    .map(|p| p.id);
                match id {
                    Some(id) => {
                        session.toggle_selection(&id, &view);
                    }
                    None => warn!(pmid = %pmid, "PMID not among the search results"),
                }
            }
        }

        Ok(session.selected())
    }
}

/// Render the open preview to stdout
pub fn print_preview(modal: &Modal) {
    match modal {
        Modal::None => {}
        Modal::Single(single) => {
            let publication = &single.publication;
            println!("{}", publication.title);
            println!("{}", publication.citation());
            if publication.has_abstract() {
                println!("\n{}", publication.abstract_text);
            }
            match &single.summary {
                SummaryState::Ready(summary) => {
                    println!("\nSummary: {}", summary.summary);
                    if !summary.keywords.is_empty() {
                        println!("Keywords: {}", summary.keywords.join(", "));
                    }
                }
                SummaryState::Unavailable(notice) => println!("\n{}", notice),
                SummaryState::NotRequested | SummaryState::Pending => {}
            }
            if let Some(folder) = &single.folder_id {
                println!("\nFolder: {}", folder);
            }
        }
        Modal::Bulk(bulk) => {
            println!("{} publications selected", bulk.publications.len());
            for (i, publication) in bulk.publications.iter().enumerate() {
                println!("{:>3}. {}", i + 1, publication.citation());
            }
            if let Some(folder) = &bulk.folder_id {
                println!("Folder: {}", folder);
            }
        }
    }
}
