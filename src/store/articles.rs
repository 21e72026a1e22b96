//! Article table access.

use super::Database;
use crate::models::{Article, ArticleSummary, DbStats};
use chrono::NaiveDate;
use sqlx::Row;
use sqlx::sqlite::SqliteRow;
use tracing::{debug, instrument};

/// Number of rows returned by [`ArticleQuery::Latest`].
pub const LATEST_LIMIT: i64 = 20;

/// Search modes for [`Database::search_articles`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArticleQuery {
    /// The most recently published articles.
    Latest,
    /// Articles published on exactly this date.
    Date(NaiveDate),
    /// Articles whose title contains this text, ignoring ASCII case.
    Title(String),
}

const ARTICLE_COLUMNS: &str = "url, title, published_date, crawled_at, summary, content, \
     tech_level, keyword_counts, impact_scope, ai_full_json";

fn article_from_row(row: &SqliteRow) -> Result<Article, sqlx::Error> {
    Ok(Article {
        url: row.try_get("url")?,
        title: row.try_get("title")?,
        published_date: row.try_get("published_date")?,
        crawled_at: row.try_get("crawled_at")?,
        summary: row.try_get("summary")?,
        content: row.try_get("content")?,
        tech_level: row.try_get("tech_level")?,
        keyword_counts: row.try_get("keyword_counts")?,
        impact_scope: row.try_get("impact_scope")?,
        ai_full_json: row.try_get("ai_full_json")?,
    })
}

fn summary_from_row(row: &SqliteRow) -> Result<ArticleSummary, sqlx::Error> {
    Ok(ArticleSummary {
        title: row.try_get("title")?,
        published_date: row.try_get("published_date")?,
        tech_level: row.try_get("tech_level")?,
        url: row.try_get("url")?,
        summary: row.try_get("summary")?,
    })
}

impl Database {
    /// Insert an article unless its URL is already stored.
    ///
    /// Returns `true` when a row was written and `false` for a duplicate.
    /// An existing row is never modified.
    #[instrument(level = "info", skip_all, fields(url = %article.url))]
    pub async fn insert_article(&self, article: &Article) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO articles
                (url, title, published_date, crawled_at, summary, content,
                 tech_level, keyword_counts, impact_scope, ai_full_json)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            ON CONFLICT(url) DO NOTHING
            "#,
        )
        .bind(&article.url)
        .bind(&article.title)
        .bind(&article.published_date)
        .bind(&article.crawled_at)
        .bind(&article.summary)
        .bind(&article.content)
        .bind(article.tech_level)
        .bind(&article.keyword_counts)
        .bind(&article.impact_scope)
        .bind(&article.ai_full_json)
        .execute(self.pool())
        .await?;

        let inserted = result.rows_affected() > 0;
        debug!(inserted, "Article insert finished");
        Ok(inserted)
    }

    pub async fn article_exists(&self, url: &str) -> Result<bool, sqlx::Error> {
        let row = sqlx::query("SELECT 1 FROM articles WHERE url = ?1")
            .bind(url)
            .fetch_optional(self.pool())
            .await?;
        Ok(row.is_some())
    }

    /// Every article's raw `keyword_counts` payload, in insertion order.
    ///
    /// Payloads are returned unparsed; `None` means the column is NULL.
    #[instrument(level = "info", skip_all)]
    pub async fn keyword_payloads(&self) -> Result<Vec<Option<String>>, sqlx::Error> {
        let rows = sqlx::query("SELECT keyword_counts FROM articles ORDER BY rowid")
            .fetch_all(self.pool())
            .await?;
        rows.iter()
            .map(|row| row.try_get::<Option<String>, _>("keyword_counts"))
            .collect()
    }

    #[instrument(level = "info", skip(self))]
    pub async fn search_articles(
        &self,
        query: &ArticleQuery,
    ) -> Result<Vec<ArticleSummary>, sqlx::Error> {
        let rows = match query {
            ArticleQuery::Latest => {
                sqlx::query(
                    "SELECT title, published_date, tech_level, url, summary FROM articles \
                     ORDER BY published_date DESC, rowid DESC LIMIT ?1",
                )
                .bind(LATEST_LIMIT)
                .fetch_all(self.pool())
                .await?
            }
            ArticleQuery::Date(date) => {
                sqlx::query(
                    "SELECT title, published_date, tech_level, url, summary FROM articles \
                     WHERE published_date = ?1 ORDER BY rowid",
                )
                .bind(date.format("%Y-%m-%d").to_string())
                .fetch_all(self.pool())
                .await?
            }
            ArticleQuery::Title(text) => {
                sqlx::query(
                    "SELECT title, published_date, tech_level, url, summary FROM articles \
                     WHERE title LIKE ?1 ORDER BY rowid",
                )
                .bind(format!("%{}%", text))
                .fetch_all(self.pool())
                .await?
            }
        };
        rows.iter().map(summary_from_row).collect()
    }

    /// Delete one article. Returns whether a row was removed.
    #[instrument(level = "info", skip(self))]
    pub async fn delete_article(&self, url: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM articles WHERE url = ?1")
            .bind(url)
            .execute(self.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn stats(&self) -> Result<DbStats, sqlx::Error> {
        let articles: i64 = sqlx::query("SELECT COUNT(*) AS n FROM articles")
            .fetch_one(self.pool())
            .await?
            .try_get("n")?;
        let keywords: i64 = sqlx::query("SELECT COUNT(*) AS n FROM keyword_metadata")
            .fetch_one(self.pool())
            .await?
            .try_get("n")?;
        Ok(DbStats { articles, keywords })
    }

    /// Every stored article, in insertion order.
    #[instrument(level = "info", skip_all)]
    pub async fn all_articles(&self) -> Result<Vec<Article>, sqlx::Error> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM articles ORDER BY rowid",
            ARTICLE_COLUMNS
        ))
        .fetch_all(self.pool())
        .await?;
        rows.iter().map(article_from_row).collect()
    }

    /// The article with the highest tech level published on `date`.
    ///
    /// Ties go to the article stored first.
    #[instrument(level = "info", skip(self))]
    pub async fn best_article_of_day(
        &self,
        date: NaiveDate,
    ) -> Result<Option<Article>, sqlx::Error> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM articles WHERE published_date = ?1 \
             ORDER BY tech_level DESC, rowid ASC LIMIT 1",
            ARTICLE_COLUMNS
        ))
        .bind(date.format("%Y-%m-%d").to_string())
        .fetch_optional(self.pool())
        .await?;
        row.as_ref().map(article_from_row).transpose()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn article(url: &str, title: &str, date: &str, keyword_counts: Option<&str>) -> Article {
        Article {
            url: url.to_string(),
            title: title.to_string(),
            published_date: date.to_string(),
            crawled_at: format!("{} 09:00:00", date),
            summary: Some(format!("Summary of {}", title)),
            content: Some("Body text".to_string()),
            tech_level: Some(5),
            keyword_counts: keyword_counts.map(str::to_string),
            impact_scope: Some("[]".to_string()),
            ai_full_json: Some("{}".to_string()),
        }
    }

    #[tokio::test]
    async fn test_duplicate_url_is_ignored_not_overwritten() {
        let db = Database::in_memory().await.unwrap();
        let first = article("https://a", "Original title", "2026-02-07", Some(r#"{"AI":1}"#));
        let second = article("https://a", "Replacement title", "2026-02-08", Some(r#"{"GPU":9}"#));

        assert!(db.insert_article(&first).await.unwrap());
        assert!(!db.insert_article(&second).await.unwrap());

        let stored = db.all_articles().await.unwrap();
        assert_eq!(stored, vec![first]);
    }

    #[tokio::test]
    async fn test_article_exists() {
        let db = Database::in_memory().await.unwrap();
        assert!(!db.article_exists("https://a").await.unwrap());
        db.insert_article(&article("https://a", "A", "2026-02-07", None))
            .await
            .unwrap();
        assert!(db.article_exists("https://a").await.unwrap());
    }

    #[tokio::test]
    async fn test_keyword_payloads_keep_insertion_order_and_nulls() {
        let db = Database::in_memory().await.unwrap();
        db.insert_article(&article("https://b", "B", "2026-02-07", Some(r#"{"AI":3}"#)))
            .await
            .unwrap();
        db.insert_article(&article("https://a", "A", "2026-02-07", None))
            .await
            .unwrap();

        let payloads = db.keyword_payloads().await.unwrap();
        assert_eq!(payloads, vec![Some(r#"{"AI":3}"#.to_string()), None]);
    }

    #[tokio::test]
    async fn test_search_modes() {
        let db = Database::in_memory().await.unwrap();
        db.insert_article(&article("https://1", "Quantum chips arrive", "2026-02-06", None))
            .await
            .unwrap();
        db.insert_article(&article("https://2", "New GPU launch", "2026-02-07", None))
            .await
            .unwrap();
        db.insert_article(&article("https://3", "QUANTUM networking", "2026-02-07", None))
            .await
            .unwrap();

        let latest = db.search_articles(&ArticleQuery::Latest).await.unwrap();
        let urls: Vec<_> = latest.iter().map(|a| a.url.as_str()).collect();
        assert_eq!(urls, vec!["https://3", "https://2", "https://1"]);

        let by_date = db
            .search_articles(&ArticleQuery::Date(NaiveDate::from_ymd_opt(2026, 2, 7).unwrap()))
            .await
            .unwrap();
        assert_eq!(by_date.len(), 2);

        let by_title = db
            .search_articles(&ArticleQuery::Title("quantum".to_string()))
            .await
            .unwrap();
        let titles: Vec<_> = by_title.iter().map(|a| a.title.as_str()).collect();
        assert_eq!(titles, vec!["Quantum chips arrive", "QUANTUM networking"]);
    }

    #[tokio::test]
    async fn test_latest_is_capped() {
        let db = Database::in_memory().await.unwrap();
        for i in 0..25 {
            db.insert_article(&article(&format!("https://{}", i), "T", "2026-02-07", None))
                .await
                .unwrap();
        }
        let latest = db.search_articles(&ArticleQuery::Latest).await.unwrap();
        assert_eq!(latest.len(), LATEST_LIMIT as usize);
    }

    #[tokio::test]
    async fn test_delete_article() {
        let db = Database::in_memory().await.unwrap();
        db.insert_article(&article("https://a", "A", "2026-02-07", None))
            .await
            .unwrap();
        assert!(db.delete_article("https://a").await.unwrap());
        assert!(!db.delete_article("https://a").await.unwrap());
        assert_eq!(db.stats().await.unwrap().articles, 0);
    }

    #[tokio::test]
    async fn test_best_article_of_day() {
        let db = Database::in_memory().await.unwrap();
        let mut low = article("https://low", "Low", "2026-02-07", None);
        low.tech_level = Some(3);
        let mut high = article("https://high", "High", "2026-02-07", None);
        high.tech_level = Some(9);
        let mut tie = article("https://tie", "Tie", "2026-02-07", None);
        tie.tech_level = Some(9);
        let mut other_day = article("https://other", "Other", "2026-02-08", None);
        other_day.tech_level = Some(10);
        for a in [&low, &high, &tie, &other_day] {
            db.insert_article(a).await.unwrap();
        }

        let best = db
            .best_article_of_day(NaiveDate::from_ymd_opt(2026, 2, 7).unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(best.url, "https://high");

        let none = db
            .best_article_of_day(NaiveDate::from_ymd_opt(2026, 1, 1).unwrap())
            .await
            .unwrap();
        assert!(none.is_none());
    }
}
