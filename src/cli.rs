//! Command-line interface definitions.
//!
//! Global options select the database and the LLM configuration; each
//! subcommand is one operation on the stored news. Options can also be
//! provided through environment variables.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Command-line arguments.
///
/// # Examples
///
/// ```sh
/// # Scrape and analyze today's tech news
/// tech_news_digest fetch
///
/// # Keyword trend report, classifying only keywords not seen before
/// tech_news_digest report
///
/// # Forget every keyword category (reclassified on the next report)
/// tech_news_digest clear-categories --yes
///
/// # Podcast script from the most technical article of a day
/// tech_news_digest podcast --date 2026-02-07
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// SQLite database file
    #[arg(short, long, global = true, env = "TECH_NEWS_DB", default_value = "tech_news.db")]
    pub database: PathBuf,

    /// Path to the awful_aj config.yaml (defaults to the awful_aj config directory)
    #[arg(short, long, global = true, env = "TECH_NEWS_LLM_CONFIG")]
    pub config: Option<PathBuf>,

    /// Template used to analyze article bodies
    #[arg(long, global = true, default_value = "tech_news_analyzer")]
    pub analysis_template: String,

    /// Template used to classify keywords
    #[arg(long, global = true, default_value = "keyword_classifier")]
    pub classifier_template: String,

    /// Template used to write podcast scripts
    #[arg(long, global = true, default_value = "podcast_script")]
    pub podcast_template: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Scrape recent tech articles, analyze them, and store new ones
    Fetch,

    /// Aggregate keywords, classify new ones, and print the grouped report
    Report,

    /// Show article and categorized keyword counts
    Stats,

    /// Search stored articles (latest 20 when no filter is given)
    Search {
        /// Exact publication date (YYYY-MM-DD)
        #[arg(long, value_parser = parse_date, conflicts_with = "title")]
        date: Option<NaiveDate>,

        /// Text contained in the title, case-insensitive
        #[arg(long)]
        title: Option<String>,
    },

    /// Delete one stored article by URL
    Delete {
        url: String,
    },

    /// Export every stored article to a JSON file
    Export {
        #[arg(short, long, default_value = "tech_news_export.json")]
        output: PathBuf,
    },

    /// Delete every keyword category so the next report reclassifies
    ClearCategories {
        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },

    /// Generate a podcast script from the most technical article of a day
    Podcast {
        /// Publication date (YYYY-MM-DD)
        #[arg(long, value_parser = parse_date)]
        date: NaiveDate,
    },
}

/// Strict `YYYY-MM-DD` parsing; rejects impossible dates like 2026-02-30.
pub fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| {
        format!(
            "invalid date or format: '{}' (use YYYY-MM-DD, e.g. 2026-02-07)",
            s
        )
    })
}
