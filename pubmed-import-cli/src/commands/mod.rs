pub mod import;
pub mod library;
pub mod lookup;
pub mod search;

use std::io::Write;
use std::path::Path;

use anyhow::Result;
use clap::Args;
use pubmed_import_rs::{
    BackendConfig, ClientConfig, ImportClient, Notice, NoticeLevel, PubMedClient, SearchCriteria,
};
use tracing::{error, info, warn};

/// Settings shared by every subcommand
#[derive(Debug, Clone)]
pub struct GlobalConfig {
    pub api_key: Option<String>,
    pub email: Option<String>,
    pub tool: String,
    pub backend_url: String,
    pub auth_token: Option<String>,
}

impl GlobalConfig {
    pub fn client_config(&self) -> ClientConfig {
        let mut config = ClientConfig::new().with_tool(&self.tool);

        if let Some(key) = &self.api_key {
            config = config.with_api_key(key);
        }

        if let Some(email) = &self.email {
            config = config.with_email(email);
        }

        config
    }

    pub fn backend_config(&self) -> BackendConfig {
        let mut config = BackendConfig::new(&self.backend_url);
        if let Some(token) = &self.auth_token {
            config = config.with_auth_token(token);
        }
        config
    }
}

pub fn create_pubmed_client(config: &GlobalConfig) -> PubMedClient {
    PubMedClient::with_config(config.client_config())
}

pub fn create_import_client(config: &GlobalConfig) -> Result<ImportClient> {
    Ok(ImportClient::new(
        config.client_config(),
        config.backend_config(),
    )?)
}

/// Structured search fields, combined with AND
#[derive(Args, Debug, Clone, Default)]
pub struct CriteriaArgs {
    /// Keywords matched against title and abstract
    #[arg(short, long)]
    pub keywords: Option<String>,

    /// Words in the title
    #[arg(long)]
    pub title: Option<String>,

    /// Author name, e.g. "Smith J"
    #[arg(long)]
    pub author: Option<String>,

    /// Journal name
    #[arg(long)]
    pub journal: Option<String>,

    /// Publication year
    #[arg(long)]
    pub year: Option<String>,
}

impl CriteriaArgs {
    pub fn to_criteria(&self) -> SearchCriteria {
        let mut criteria = SearchCriteria::new();
        if let Some(keywords) = &self.keywords {
            criteria = criteria.keywords(keywords);
        }
        if let Some(title) = &self.title {
            criteria = criteria.title(title);
        }
        if let Some(author) = &self.author {
            criteria = criteria.author(author);
        }
        if let Some(journal) = &self.journal {
            criteria = criteria.journal(journal);
        }
        if let Some(year) = &self.year {
            criteria = criteria.year(year);
        }
        criteria
    }
}

/// Log notices at the matching level
pub fn report_notices(notices: Vec<Notice>) {
    for notice in notices {
        match notice.level {
            NoticeLevel::Info | NoticeLevel::Success => info!("{}", notice.message),
            NoticeLevel::Warning => warn!("{}", notice.message),
            NoticeLevel::Error => error!("{}", notice.message),
        }
    }
}

/// Write to `path`, or stdout when absent
pub fn output_results(output: &str, path: Option<&Path>) -> Result<()> {
    match path {
        Some(path) => {
            std::fs::write(path, output)?;
            info!(path = %path.display(), "Results written");
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{}", output)?;
        }
    }
    Ok(())
}
