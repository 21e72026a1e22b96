//! The fetch command: scrape, analyze, store.
//!
//! 1. **Indexing**: recent cards from the tech section page
//! 2. **Filtering**: drop URLs that are already stored
//! 3. **Fetching**: download article pages one at a time
//! 4. **Processing**: LLM analysis, a few articles in flight at once
//! 5. **Storing**: insert-or-ignore by URL

use crate::analysis::analyze_article;
use crate::config::LlmTask;
use crate::models::{Article, NewsArticle};
use crate::scrapers::fox;
use crate::store::Database;
use futures::stream::{self, StreamExt};
use std::error::Error;
use tracing::{error, info, instrument};

/// Articles analyzed concurrently.
const PARALLEL_ANALYSIS: usize = 4;

/// Counts reported at the end of a fetch run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestSummary {
    pub indexed: usize,
    pub already_stored: usize,
    pub fetched: usize,
    pub analyzed: usize,
    pub saved: usize,
    pub duplicates: usize,
    pub failed: usize,
}

/// Scrape, analyze and store today's tech articles.
#[instrument(level = "info", skip_all)]
pub async fn run_fetch(db: &Database, task: &LlmTask) -> Result<IngestSummary, Box<dyn Error>> {
    let client = fox::http_client()?;
    let mut summary = IngestSummary::default();

    let indexed = fox::index_articles(&client).await?;
    summary.indexed = indexed.len();

    let mut fresh = Vec::with_capacity(indexed.len());
    for item in indexed {
        if db.article_exists(&item.url).await? {
            summary.already_stored += 1;
        } else {
            fresh.push(item);
        }
    }
    info!(new = fresh.len(), already_stored = summary.already_stored, "Filtered known URLs");

    let articles = fox::fetch_articles(&client, fresh).await;
    summary.fetched = articles.len();

    let analyzed: Vec<Article> = stream::iter(articles.iter())
        .map(|article| async move { analyze_to_row(task, article).await })
        .buffer_unordered(PARALLEL_ANALYSIS)
        .filter_map(std::future::ready)
        .collect()
        .await;
    summary.analyzed = analyzed.len();

    let (saved, duplicates, failed) = store_articles(db, &analyzed).await;
    summary.saved = saved;
    summary.duplicates = duplicates;
    summary.failed = failed + (summary.fetched - summary.analyzed);

    info!(?summary, "Fetch run complete");
    Ok(summary)
}

async fn analyze_to_row(task: &LlmTask, article: &NewsArticle) -> Option<Article> {
    match analyze_article(task, article).await {
        Ok((analysis, raw)) => match Article::from_analysis(article, &analysis, &raw) {
            Ok(row) => Some(row),
            Err(e) => {
                error!(url = %article.source, error = %e, "Could not serialize analysis");
                None
            }
        },
        Err(e) => {
            error!(url = %article.source, error = %e, "Analysis failed; skipping article");
            None
        }
    }
}

/// Insert each article, returning `(saved, duplicates, failed)`.
///
/// A failed insert is logged and does not stop the remaining ones.
pub async fn store_articles(db: &Database, articles: &[Article]) -> (usize, usize, usize) {
    let (mut saved, mut duplicates, mut failed) = (0, 0, 0);
    for article in articles {
        match db.insert_article(article).await {
            Ok(true) => {
                saved += 1;
                info!(title = %article.title, "Saved article");
            }
            Ok(false) => {
                duplicates += 1;
                info!(title = %article.title, "Skipped duplicate article");
            }
            Err(e) => {
                failed += 1;
                error!(url = %article.url, error = %e, "Insert failed");
            }
        }
    }
    (saved, duplicates, failed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::articles::tests::article;

    #[tokio::test]
    async fn test_store_articles_counts_duplicates() {
        let db = Database::in_memory().await.unwrap();
        let rows = vec![
            article("https://a", "A", "2026-02-07", Some(r#"{"AI":1}"#)),
            article("https://b", "B", "2026-02-07", None),
            article("https://a", "A again", "2026-02-07", None),
        ];
        assert_eq!(store_articles(&db, &rows).await, (2, 1, 0));
        assert_eq!(store_articles(&db, &rows[..1]).await, (0, 1, 0));
    }

    #[tokio::test]
    async fn test_store_articles_counts_failures() {
        let db = Database::in_memory().await.unwrap();
        db.close().await;
        let rows = vec![article("https://a", "A", "2026-02-07", None)];
        assert_eq!(store_articles(&db, &rows).await, (0, 0, 1));
    }
}
