//! # Article Harvest
//!
//! Turns article URLs into structured records (title, body text, authors,
//! publication date, lead image) and stores one outcome per URL.
//!
//! ## Pipeline
//!
//! 1. **Primary**: plain HTTP fetch and structural parse
//! 2. **Gate**: heuristic check that the primary result is a real article
//! 3. **Rendering**: headless Chromium fallback for pages the primary
//!    extractor could not fetch or the gate rejected
//! 4. **Store**: the record or the failure reasons are appended to the store
//!
//! ## Usage
//!
//! ```sh
//! article_harvest -s ./store sites
//! article_harvest -s ./store scrape https://example.com/news/harbor
//! article_harvest -s ./store scrape-all
//! ```

use clap::Parser;
use serde_json::json;
use std::error::Error;
use std::time::Instant;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod batch;
mod cli;
mod config;
mod dates;
mod errors;
mod models;
mod orchestrator;
mod quality;
mod scrapers;
mod store;
mod utils;

use cli::{Cli, Command};
use config::{HarvestConfig, load_config};
use orchestrator::Orchestrator;
use scrapers::primary::PrimaryExtractor;
use scrapers::rendered::RenderingExtractor;
use store::{JsonStore, UrlSource};
use utils::truncate_for_log;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .with_writer(std::io::stderr)
        .init();

    let start_time = Instant::now();
    info!("article_harvest starting up");

    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    let config = match &args.config {
        Some(path) => {
            let config = load_config(path)?;
            info!(path = %path.display(), "Loaded configuration");
            config
        }
        None => HarvestConfig::default(),
    }
    .with_overrides(args.chromium_path.clone(), args.headed);

    let store = JsonStore::new(&args.store_dir);
    debug!(store = %store.root().display(), "Using JSON store");

    let result = run(args.command, &config, &store).await;

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Execution complete"
    );
    result
}

async fn run(
    command: Command,
    config: &HarvestConfig,
    store: &JsonStore,
) -> Result<(), Box<dyn Error>> {
    match command {
        Command::Sites => {
            let sites = store.list_pending().await?;
            println!("{}", serde_json::to_string_pretty(&json!({ "sites": sites }))?);
        }
        Command::Scrape { url } => {
            let orchestrator = build_orchestrator(config)?;
            match batch::scrape_one(&orchestrator, store, &url).await {
                Ok(record) => println!("{}", serde_json::to_string_pretty(&record)?),
                Err(e) => {
                    error!(%url, detail = %truncate_for_log(&e.to_string(), 500), "Scrape failed");
                    return Err(e.into());
                }
            }
        }
        Command::ScrapeAll => {
            let orchestrator = build_orchestrator(config)?;
            let summary = batch::run_all(&orchestrator, store).await?;
            println!(
                "{}",
                serde_json::to_string_pretty(&json!({
                    "status": "Scraping process completed",
                    "summary": summary,
                }))?
            );
        }
    }
    Ok(())
}

fn build_orchestrator(
    config: &HarvestConfig,
) -> Result<Orchestrator<PrimaryExtractor, RenderingExtractor>, Box<dyn Error>> {
    Ok(Orchestrator::new(
        PrimaryExtractor::new(config)?,
        RenderingExtractor::new(config),
    ))
}
