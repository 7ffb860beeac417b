use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use grabfood_scraper::{EventSink, MemorySink, SessionOptions, TracingSink};
use tracing_subscriber::EnvFilter;

const DEFAULT_LOCATION: &str = "Choa Chu Kang North 6, Singapore, 689577";

#[derive(Debug, Parser)]
#[command(name = "grabfood")]
#[command(about = "Scrape restaurant listings from the GrabFood storefront")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Search one delivery location and archive the joined listing.
    Scrape {
        /// Delivery address typed into the storefront's search box.
        #[arg(long, env = "GRABFOOD_LOCATION", default_value = DEFAULT_LOCATION)]
        location: String,
        /// Route browser traffic through `GRABFOOD_PROXY_SERVER`.
        #[arg(long)]
        proxy: bool,
        /// Archive destination; overrides `GRABFOOD_OUTPUT_PATH`.
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Print the records stored in an archive.
    Inspect { path: PathBuf },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    match cli.command {
        Some(Commands::Scrape {
            location,
            proxy,
            output,
        }) => run_scrape(&location, proxy, output).await,
        Some(Commands::Inspect { path }) => {
            let level = std::env::var("GRABFOOD_LOG_LEVEL").unwrap_or_else(|_| "info".into());
            init_tracing(&level, false)?;
            run_inspect(&path).await
        }
        None => {
            println!("grabfood: run `grabfood scrape` or `grabfood inspect <path>`");
            Ok(())
        }
    }
}

fn init_tracing(default_level: &str, json: bool) -> anyhow::Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(default_level))?;
    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }
    Ok(())
}

async fn run_scrape(location: &str, proxy: bool, output: Option<PathBuf>) -> anyhow::Result<()> {
    let config = grabfood_core::load_app_config()?;
    init_tracing(&config.log_level, config.env.json_logs())?;
    tracing::debug!(?config, env = %config.env, "configuration loaded");

    let selectors = grabfood_core::load_selectors(config.selectors_path.as_deref())?;
    let output = output.unwrap_or_else(|| config.output_path.clone());

    let sink = Arc::new(MemorySink::forwarding(TracingSink));
    let options = SessionOptions {
        config: &config,
        selectors: &selectors,
        location,
        use_proxy: proxy,
        output: &output,
    };
    let outcome =
        grabfood_scraper::scrape_location(options, Arc::clone(&sink) as Arc<dyn EventSink>)
            .await?;

    tracing::info!(
        location,
        output = %outcome.output.display(),
        records = outcome.records.len(),
        merchants = outcome.stats.merchants,
        cards = outcome.stats.cards,
        dropped = outcome.stats.dropped,
        response_captured = outcome.response_captured,
        stage_errors = sink.error_count(),
        "scrape complete"
    );
    println!(
        "wrote {} records to {}",
        outcome.records.len(),
        outcome.output.display()
    );
    Ok(())
}

async fn run_inspect(path: &std::path::Path) -> anyhow::Result<()> {
    let records = grabfood_scraper::read_archive(path).await?;
    println!("{} records in {}", records.len(), path.display());
    for record in &records {
        println!("{}", serde_json::to_string(record)?);
    }
    Ok(())
}

#[cfg(test)]
mod tests;
