use anyhow::Result;
use clap::{Parser, Subcommand};
use pagedex_indexer::{DocumentSource, IngestRequest, TextController, TuningArgs};
use std::path::PathBuf;
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "indexer")]
#[command(about = "Index a paged text document and query it", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    #[command(flatten)]
    tuning: TuningArgs,
}

#[derive(Subcommand)]
enum Commands {
    /// Index a range of pages, then optionally run queries against them
    Ingest {
        /// Document path (UTF-8 text, pages separated by form feeds)
        #[arg(long)]
        input: PathBuf,
        #[arg(long, default_value_t = 1)]
        start_page: u32,
        /// Last page to consider (defaults to the end of the document)
        #[arg(long)]
        end_page: Option<u32>,
        /// Maximum number of pages to index
        #[arg(long)]
        batch_size: Option<u32>,
        /// Query to run once indexing finishes; may be repeated
        #[arg(long = "query")]
        queries: Vec<String>,
    },
    /// Print the raw text of specific pages
    Pages {
        #[arg(long)]
        input: PathBuf,
        /// Page number to load; may be repeated
        #[arg(long = "page", required = true)]
        pages: Vec<u32>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();
    let controller = TextController::for_text(cli.tuning.into());

    match cli.command {
        Commands::Ingest { input, start_page, end_page, batch_size, queries } => {
            let mut progress = controller.subscribe();
            let reporter = tokio::spawn(async move {
                loop {
                    match progress.recv().await {
                        Ok(p) => tracing::info!(
                            page = p.page_number,
                            done = p.processed_count,
                            of = p.total_to_process,
                            "{}%",
                            p.percentage
                        ),
                        Err(RecvError::Lagged(skipped)) => {
                            tracing::debug!(skipped, "progress lagged")
                        }
                        Err(RecvError::Closed) => break,
                    }
                }
            });

            let source = DocumentSource::Path(input);
            let request = IngestRequest { source, start_page, end_page, batch_size };
            let summary = controller.ingest(request).await?;
            println!("{}", serde_json::to_string_pretty(&summary)?);

            for query in queries {
                let response = controller.search(&query)?;
                println!("{}", serde_json::to_string_pretty(&response)?);
            }

            drop(controller);
            reporter.await?;
        }
        Commands::Pages { input, pages } => {
            let loaded = controller.load_pages(DocumentSource::Path(input), pages).await?;
            println!("{}", serde_json::to_string_pretty(&serde_json::json!({ "pages": loaded }))?);
        }
    }
    Ok(())
}
