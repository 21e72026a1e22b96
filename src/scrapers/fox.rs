//! Fox News technology section scraper.
//!
//! Scrapes [foxnews.com/tech](https://www.foxnews.com/tech). The section page
//! lists `<article>` cards whose meta line carries a section label and a
//! relative age ("5 mins ago", "3 hours ago", "1 day ago"). Only cards from
//! roughly the last day that are not videos are kept.
//!
//! # URL Pattern
//!
//! Card links are usually site-relative (`/tech/some-slug`) and are resolved
//! against `https://www.foxnews.com`.

use crate::models::NewsArticle;
use chrono::{Local, NaiveDate};
use futures::stream::{self, StreamExt};
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use scraper::{Html, Selector};
use std::error::Error;
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};
use url::Url;

pub const SECTION_URL: &str = "https://www.foxnews.com/tech";
pub const SITE_URL: &str = "https://www.foxnews.com";

const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7)";

/// Pause between article page requests.
const POLITENESS_DELAY: Duration = Duration::from_secs(1);

static ARTICLE_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("article").unwrap());
static META_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("div.meta").unwrap());
static TITLE_LINK_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".title a[href]").unwrap());
static DATE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("span.article-date time").unwrap());
static BODY_PARAGRAPH_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("div.article-body p").unwrap());

static RECENT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(\d+\s*(mins?|minutes?|hours?|hrs?)\s+ago|1\s+day\s+ago)\b").unwrap()
});
static DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([A-Za-z]+)\.?\s+(\d{1,2}),\s*(\d{4})").unwrap());

/// A card from the section page that passed the recency filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedArticle {
    pub url: String,
    pub title: String,
    /// Section label from the card's meta line, e.g. "Artificial Intelligence".
    pub section: String,
}

/// HTTP client shared by the index and fetch phases.
pub fn http_client() -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(10))
        .build()
}

/// Whether a card's meta line marks it as published within about a day.
///
/// Video cards never qualify.
pub fn is_recent(meta_text: &str) -> bool {
    let meta = meta_text.to_lowercase();
    !meta.contains("video") && RECENT_RE.is_match(&meta)
}

/// The section label that precedes the age in a card's meta line.
pub fn section_label(meta_text: &str) -> String {
    meta_text
        .split_whitespace()
        .take_while(|word| !word.starts_with(|c: char| c.is_ascii_digit()))
        .map(|word| {
            let lower = word.to_lowercase();
            let mut chars = lower.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Parse the first "Month D, YYYY" date in `text`.
pub fn parse_published_date(text: &str) -> Option<NaiveDate> {
    let caps = DATE_RE.captures(text)?;
    let normalized = format!("{} {}, {}", &caps[1], &caps[2], &caps[3]);
    NaiveDate::parse_from_str(&normalized, "%B %d, %Y").ok()
}

/// Extract recent article cards from the section page HTML.
pub fn parse_section_page(html: &str, base: &Url) -> Vec<IndexedArticle> {
    let document = Html::parse_document(html);
    let mut articles = Vec::new();

    for card in document.select(&ARTICLE_SELECTOR) {
        let Some(meta) = card.select(&META_SELECTOR).next() else {
            continue;
        };
        let meta_text = meta.text().collect::<Vec<_>>().join(" ");
        if !is_recent(&meta_text) {
            debug!(meta = %meta_text.trim(), "Skipping card that is not recent");
            continue;
        }

        let Some(link) = card.select(&TITLE_LINK_SELECTOR).next() else {
            continue;
        };
        let title = link.text().collect::<String>().trim().to_string();
        let Some(href) = link.value().attr("href") else {
            continue;
        };
        let Ok(resolved) = base.join(href) else {
            warn!(%href, "Could not resolve article link");
            continue;
        };

        if title.is_empty() || articles.iter().any(|a: &IndexedArticle| a.url == resolved.as_str()) {
            continue;
        }
        articles.push(IndexedArticle {
            url: resolved.to_string(),
            title,
            section: section_label(&meta_text),
        });
    }
    articles
}

/// Extract the article body and publication date from an article page.
///
/// Returns `None` when the page has no body paragraphs. When the page has no
/// readable date, `fallback_date` is used.
pub fn parse_article_page(
    html: &str,
    item: &IndexedArticle,
    fallback_date: NaiveDate,
) -> Option<NewsArticle> {
    let document = Html::parse_document(html);

    let content = document
        .select(&BODY_PARAGRAPH_SELECTOR)
        .map(|p| p.text().collect::<String>().trim().to_string())
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join("\n");
    if content.is_empty() {
        return None;
    }

    let published_date = document
        .select(&DATE_SELECTOR)
        .next()
        .map(|t| t.text().collect::<String>())
        .and_then(|t| parse_published_date(&t))
        .unwrap_or_else(|| {
            warn!(url = %item.url, "No publication date found; using crawl date");
            fallback_date
        });

    Some(NewsArticle {
        source: item.url.clone(),
        title: item.title.clone(),
        published_date,
        content,
    })
}

/// Index the technology section page.
#[instrument(level = "info", skip_all)]
pub async fn index_articles(client: &Client) -> Result<Vec<IndexedArticle>, Box<dyn Error>> {
    let base = Url::parse(SITE_URL)?;
    let html = client
        .get(SECTION_URL)
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;

    let articles = parse_section_page(&html, &base);
    info!(count = articles.len(), source = SECTION_URL, "Indexed recent tech articles");
    debug!(urls = ?articles.iter().map(|a| &a.url).collect::<Vec<_>>(), "Tech URLs");
    Ok(articles)
}

/// Fetch article pages one at a time, pausing between requests.
///
/// Failed fetches are logged and skipped without failing the batch.
#[instrument(level = "info", skip_all, fields(count = items.len()))]
pub async fn fetch_articles(client: &Client, items: Vec<IndexedArticle>) -> Vec<NewsArticle> {
    let articles: Vec<NewsArticle> = stream::iter(items)
        .then(|item| async move {
            let result = fetch_article(client, &item).await;
            tokio::time::sleep(POLITENESS_DELAY).await;
            match result {
                Ok(Some(article)) => {
                    debug!(url = %item.url, section = %item.section, "Fetched tech article");
                    Some(article)
                }
                Ok(None) => {
                    warn!(url = %item.url, "Article page had no body");
                    None
                }
                Err(e) => {
                    error!(error = %e, url = %item.url, "Article fetch failed");
                    None
                }
            }
        })
        .filter_map(std::future::ready)
        .collect()
        .await;

    info!(count = articles.len(), "Fetched tech article contents");
    articles
}

#[instrument(level = "info", skip_all, fields(url = %item.url))]
async fn fetch_article(
    client: &Client,
    item: &IndexedArticle,
) -> Result<Option<NewsArticle>, Box<dyn Error>> {
    let body = client
        .get(&item.url)
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;
    let article = parse_article_page(&body, item, Local::now().date_naive());
    if let Some(a) = &article {
        info!(words = a.content.split_whitespace().count(), "Parsed tech article");
    }
    Ok(article)
}
