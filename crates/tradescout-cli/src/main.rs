use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use tradescout_core::ListingFallback;
use tradescout_detail::{
    enrich_batch, Clock, DetailMemo, DetailService, EnrichItem, InMemoryListingStore,
    ListingRecord, SystemClock,
};
use tradescout_scraper::{normalize, parse_detail, PageFetcher};

#[derive(Debug, Parser)]
#[command(name = "tradescout")]
#[command(about = "B2B marketplace detail scraping pipeline")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Fetch one detail page and print the normalized record as JSON.
    Fetch {
        url: String,
    },
    /// Enrich a JSON file of listing entries with bounded concurrency.
    Enrich {
        /// Path to a JSON array of {listing_id, source_url, fallback?}.
        file: String,
        #[arg(long)]
        concurrency: Option<usize>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = tradescout_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Fetch { url } => fetch_one(&config, &url).await,
        Commands::Enrich { file, concurrency } => {
            let concurrency = concurrency.unwrap_or(config.batch_concurrency);
            enrich_file(&config, &file, concurrency).await
        }
    }
}

async fn fetch_one(config: &tradescout_core::AppConfig, url: &str) -> anyhow::Result<()> {
    let fetcher = PageFetcher::new(config.fetch_timeout_secs, &config.user_agent)?;
    let html = fetcher.fetch_html(url).await?;
    let draft = parse_detail(&html, url);
    if draft.is_none() {
        tracing::warn!(url, "no parser matched this host, using fallback only");
    }
    let detail = normalize(draft, &ListingFallback::default(), url);
    println!("{}", serde_json::to_string_pretty(&detail)?);
    Ok(())
}

async fn enrich_file(
    config: &tradescout_core::AppConfig,
    file: &str,
    concurrency: usize,
) -> anyhow::Result<()> {
    let raw = std::fs::read_to_string(file)?;
    let items: Vec<EnrichItem> = serde_json::from_str(&raw)?;

    let records: Vec<ListingRecord> = items
        .iter()
        .map(|item| ListingRecord::new(&item.listing_id, &item.source_url))
        .collect();
    let store = Arc::new(InMemoryListingStore::new(records));

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let fetcher = PageFetcher::new(config.fetch_timeout_secs, &config.user_agent)?;
    let memo = DetailMemo::new(config.memo_ttl_secs, clock.clone());
    let service = DetailService::new(
        fetcher,
        memo,
        store,
        config.freshness_window_secs,
        clock,
    );

    let total = items.len();
    let outcome = enrich_batch(&service, items, concurrency).await;
    tracing::info!(
        enriched = outcome.details.len(),
        failed = outcome.failed,
        total,
        "batch enrichment finished"
    );
    println!("{}", serde_json::to_string_pretty(&outcome.details)?);
    Ok(())
}
