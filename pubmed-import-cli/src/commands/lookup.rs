use anyhow::{Result, bail};
use clap::Args;
use pubmed_import_rs::{InputKind, PreviewManager, SearchOutcome, classify_input};
use tracing::debug;

use super::{GlobalConfig, create_import_client, report_notices};

#[derive(Args, Debug)]
pub struct Lookup {
    /// A PMID, or free text treated as keywords
    input: String,

    /// Also request an AI summary for a single match
    #[arg(long)]
    summarize: bool,
}

impl Lookup {
    pub async fn execute(&self, config: &GlobalConfig) -> Result<()> {
        let kind = classify_input(&self.input);
        debug!(?kind, "Classified lookup input");

        let client = create_import_client(config)?;
        let session = client.session();
        let outcome = session.lookup(&self.input).await;
        report_notices(session.take_notices());

        if let SearchOutcome::Failed { message } = outcome {
            bail!(message);
        }

        let results = session.results();
        if self.summarize && kind == InputKind::Id {
            if let Some(publication) = results.first() {
                let mut preview = PreviewManager::new();
                preview.preview_one(publication.clone(), &client.summarizer()).await;
                super::import::print_preview(preview.modal());
                return Ok(());
            }
        }

        println!("{}", serde_json::to_string_pretty(&results)?);
        Ok(())
    }
}
