use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

mod commands;

use commands::GlobalConfig;

#[derive(Parser)]
#[command(
    name = "pubmed-import",
    about = "Search PubMed and import publications into the research library",
    long_about = "A CLI for the RIS publication import pipeline: search PubMed, preview records, \
                  import them and manage library folders"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// API key for NCBI E-utilities (increases rate limit)
    #[arg(long, env = "NCBI_API_KEY", global = true)]
    api_key: Option<String>,

    /// Email for NCBI requests (recommended)
    #[arg(long, env = "NCBI_EMAIL", global = true)]
    email: Option<String>,

    /// Tool name for NCBI requests
    #[arg(long, env = "NCBI_TOOL", default_value = "pubmed-import", global = true)]
    tool: String,

    /// Base URL of the RIS backend API
    #[arg(
        long,
        env = "RIS_BACKEND_URL",
        default_value = "http://localhost:3000/api",
        global = true
    )]
    backend_url: String,

    /// Bearer token for the RIS backend
    #[arg(long, env = "RIS_AUTH_TOKEN", global = true, hide_env_values = true)]
    auth_token: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Search PubMed with structured criteria
    Search(commands::search::Search),
    /// Look up a PMID, or run a keyword search for anything else
    Lookup(commands::lookup::Lookup),
    /// Search, select and import publications into the library
    Import(Box<commands::import::Import>),
    /// Manage library folders and filings
    Library(commands::library::Library),
}

impl Cli {
    fn global_config(&self) -> GlobalConfig {
        GlobalConfig {
            api_key: self.api_key.clone(),
            email: self.email.clone(),
            tool: self.tool.clone(),
            backend_url: self.backend_url.clone(),
            auth_token: self.auth_token.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .without_time()
                .with_writer(std::io::stderr),
        )
        .with(tracing_subscriber::EnvFilter::new(filter))
        .init();

    let config = cli.global_config();
    match &cli.command {
        Commands::Search(cmd) => cmd.execute(&config).await,
        Commands::Lookup(cmd) => cmd.execute(&config).await,
        Commands::Import(cmd) => cmd.execute(&config).await,
        Commands::Library(cmd) => cmd.execute(&config).await,
    }
}
