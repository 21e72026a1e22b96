//! Data models for scraped articles, their LLM analysis, and stored rows.
//!
//! This module defines the core data structures used throughout the application:
//! - [`NewsArticle`]: Raw scraped article data from the technology section
//! - [`ArticleAnalysis`]: The LLM's structured reading of one article
//! - [`Article`]: A row of the `articles` table, as persisted and exported
//! - [`ArticleSummary`], [`DbStats`]: Read models for the database commands
//! - [`PodcastLine`]: One line of a generated podcast dialogue

use chrono::{Local, NaiveDate};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Per-article keyword occurrence counts as produced by the analysis step.
///
/// Keys keep the order the model emitted them in.
pub type KeywordCounts = IndexMap<String, u64>;

/// A raw news article as scraped from the technology section.
#[derive(Debug, Clone)]
pub struct NewsArticle {
    /// The canonical URL of the article.
    pub source: String,
    /// The headline as shown on the section page.
    pub title: String,
    /// Publication date read from the article page.
    pub published_date: NaiveDate,
    /// The paragraph text of the article body, newline separated.
    pub content: String,
}

/// The LLM's structured analysis of a single article.
///
/// Field names match the JSON the analysis template asks for. Missing
/// fields fall back to empty values; fields of the wrong shape (for example
/// a negative or fractional keyword count) make the whole response malformed.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct ArticleAnalysis {
    /// A short summary of the article.
    #[serde(default = "default_summary")]
    pub summary: String,
    /// How technical the article is, on the template's 1-10 scale.
    #[serde(default)]
    pub tech_level: i64,
    /// Occurrence count of each technical keyword in the article.
    #[serde(default)]
    pub keyword_counts: KeywordCounts,
    /// Sectors or audiences affected by the story.
    #[serde(default)]
    pub impact_scope: Vec<String>,
}

fn default_summary() -> String {
    "N/A".to_string()
}

/// A row of the `articles` table.
///
/// JSON-valued columns (`keyword_counts`, `impact_scope`, `ai_full_json`)
/// are kept as the serialized text that was stored, so exports reproduce the
/// table verbatim and readers decide for themselves how to treat bad payloads.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct Article {
    pub url: String,
    pub title: String,
    /// ISO `YYYY-MM-DD`.
    pub published_date: String,
    /// Local time the article was crawled, `YYYY-MM-DD HH:MM:SS`.
    pub crawled_at: String,
    pub summary: Option<String>,
    pub content: Option<String>,
    pub tech_level: Option<i64>,
    pub keyword_counts: Option<String>,
    pub impact_scope: Option<String>,
    pub ai_full_json: Option<String>,
}

impl Article {
    /// Build the row for a freshly analyzed article.
    ///
    /// `raw_analysis` is the full JSON value the model returned, kept as a
    /// backup alongside the flattened columns.
    pub fn from_analysis(
        article: &NewsArticle,
        analysis: &ArticleAnalysis,
        raw_analysis: &serde_json::Value,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self {
            url: article.source.clone(),
            title: article.title.clone(),
            published_date: article.published_date.format("%Y-%m-%d").to_string(),
            crawled_at: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            summary: Some(analysis.summary.clone()),
            content: Some(article.content.clone()),
            tech_level: Some(analysis.tech_level),
            keyword_counts: Some(serde_json::to_string(&analysis.keyword_counts)?),
            impact_scope: Some(serde_json::to_string(&analysis.impact_scope)?),
            ai_full_json: Some(serde_json::to_string(raw_analysis)?),
        })
    }
}

/// One row of a search result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArticleSummary {
    pub title: String,
    pub published_date: String,
    pub tech_level: Option<i64>,
    pub url: String,
    pub summary: Option<String>,
}

/// Row counts of the two durable tables.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DbStats {
    /// Number of stored articles.
    pub articles: i64,
    /// Number of keywords with a category in the ledger.
    pub keywords: i64,
}

/// One spoken line of a podcast script.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct PodcastLine {
    #[serde(default = "unknown_speaker")]
    pub speaker: String,
    #[serde(default = "neutral_emotion")]
    pub emotion: String,
    #[serde(default)]
    pub text: String,
}

fn unknown_speaker() -> String {
    "Unknown".to_string()
}

fn neutral_emotion() -> String {
    "neutral".to_string()
}
