//! # Tech News Digest
//!
//! Scrapes the technology section of a news site, analyzes each article with
//! an LLM, stores the results in SQLite, and reports keyword trends grouped
//! by category.
//!
//! ## Features
//!
//! - Scrapes recent articles from Fox News Tech
//! - Extracts a summary, tech level, keyword counts and impact scope per
//!   article through an OpenAI-compatible LLM API
//! - Aggregates keyword counts across all stored articles and classifies
//!   keywords into categories, asking the LLM only about keywords it has
//!   never classified before
//! - Search, export and housekeeping commands for the article store
//! - Podcast-style dialogue scripts from the most technical article of a day
//!
//! ## Usage
//!
//! ```sh
//! tech_news_digest fetch
//! tech_news_digest report
//! ```
//!
//! ## Architecture
//!
//! - **Ingest**: [`ingest`] drives [`scrapers`] and [`analysis`] into the [`store`]
//! - **Keywords**: [`keywords`] folds stored counts, diffs against the
//!   category ledger, classifies new keywords in one batch and prints the report
//! - **Outputs**: [`outputs`] exports the article table; [`podcast`] prints scripts

use clap::Parser;
use std::error::Error;
use tracing::{debug, info, instrument, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod analysis;
mod api;
mod cli;
mod config;
mod ingest;
mod keywords;
mod models;
mod outputs;
mod podcast;
mod scrapers;
mod store;
mod utils;

use cli::{Cli, Command};
use config::AppConfig;
use store::Database;
use store::articles::ArticleQuery;
use utils::{ensure_parent_dir, truncate_for_log};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    let args = Cli::parse();
    let app = AppConfig::from(&args);
    debug!(?app, command = ?args.command, "Parsed CLI arguments");

    ensure_parent_dir(&app.database_path).await?;
    let db = Database::open(&app.database_path).await?;

    let result = run(&app, &db, args.command).await;
    db.close().await;

    let elapsed = start_time.elapsed();
    info!(?elapsed, "Execution complete");
    result
}

#[instrument(level = "info", skip(app, db))]
async fn run(app: &AppConfig, db: &Database, command: Command) -> Result<(), Box<dyn Error>> {
    match command {
        Command::Fetch => {
            let task = app.llm_task(&app.analysis_template).await?;
            println!("Starting tech news scraper...");
            let summary = ingest::run_fetch(db, &task).await?;
            println!(
                "Indexed {} | Already stored {} | Fetched {} | Analyzed {} | Saved {} | Duplicates {} | Failed {}",
                summary.indexed,
                summary.already_stored,
                summary.fetched,
                summary.analyzed,
                summary.saved,
                summary.duplicates,
                summary.failed
            );
        }
        Command::Report => {
            let task = app.llm_task(&app.classifier_template).await;
            keywords::run_report(db, task).await?;
        }
        Command::Stats => {
            let stats = db.stats().await?;
            println!("Database status:");
            println!(" • Total articles: {}", stats.articles);
            println!(" • Categorized keywords: {}", stats.keywords);
        }
        Command::Search { date, title } => {
            let query = match (date, title) {
                (Some(date), _) => ArticleQuery::Date(date),
                (None, Some(title)) if !title.trim().is_empty() => {
                    ArticleQuery::Title(title.trim().to_string())
                }
                _ => ArticleQuery::Latest,
            };
            let results = db.search_articles(&query).await?;
            println!("Found {} matches:", results.len());
            for row in results {
                println!(
                    "   [{}] {} (Level: {})",
                    row.published_date,
                    row.title,
                    row.tech_level.unwrap_or_default()
                );
                println!("      {}", row.url);
                if let Some(summary) = &row.summary {
                    println!("      {}", truncate_for_log(summary, 160));
                }
            }
        }
        Command::Delete { url } => {
            if db.delete_article(&url).await? {
                println!("Deleted article: {}", url);
            } else {
                println!("No article stored under: {}", url);
            }
        }
        Command::Export { output } => {
            let count = outputs::json::export_articles(db, &output).await?;
            println!("Export successful: {} articles saved to {}", count, output.display());
        }
        Command::ClearCategories { yes } => {
            if !yes {
                warn!("Refusing to clear keyword categories without confirmation");
                println!("WARNING: This deletes every keyword category mapping.");
                println!("   The next report will send all keywords to the classifier again.");
                println!("   Re-run with --yes to proceed.");
                return Ok(());
            }
            let deleted = db.clear_categories().await?;
            println!("Database cleaned: removed {} keyword categories.", deleted);
        }
        Command::Podcast { date } => {
            let task = app.llm_task(&app.podcast_template).await?;
            podcast::produce_script(db, &task, date).await?;
        }
    }
    Ok(())
}
