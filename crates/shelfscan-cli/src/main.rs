mod inspect;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "shelfscan")]
#[command(about = "Extract canonical product records from storefront pages")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Fetch a page, run the applicability gate and the extraction pipeline
    Extract {
        url: String,
        /// Run the pipeline even when the gate says the page is not worth it
        #[arg(long)]
        force: bool,
        /// Print single-line JSON
        #[arg(long)]
        compact: bool,
    },
    /// Fetch a page and print the applicability gate's verdicts
    Check { url: String },
    /// Run the pipeline over a saved HTML file
    Parse {
        file: PathBuf,
        /// URL the page was saved from; relative links resolve against it
        #[arg(long)]
        url: String,
        #[arg(long)]
        compact: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = shelfscan_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Extract {
            url,
            force,
            compact,
        } => inspect::run_extract(&config, &url, force, compact).await,
        Commands::Check { url } => inspect::run_check(&config, &url).await,
        Commands::Parse { file, url, compact } => inspect::run_parse(&file, &url, compact),
    }
}
